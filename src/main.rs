use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use vault_recovery::crypto::mnemonic;
use vault_recovery::{export, recover, ui, BackupFile, Overrides};

#[derive(Parser)]
#[command(name = "vault-recovery")]
#[command(about = "Recover private keys from TSS vault backup files", long_about = None)]
struct Cli {
    /// The vault ID to recover keys for; omit to list available vaults
    #[arg(long = "vault-id")]
    vault_id: Option<String>,

    /// Reshare nonce override. Try it if the tool advises you to do so
    #[arg(long)]
    nonce: Option<u32>,

    /// Vault quorum (threshold) override. Try it if the tool advises you to do so
    #[arg(long = "threshold")]
    quorum: Option<usize>,

    /// Filename to export an Ethereum/MetaMask wallet v3 JSON file to
    #[arg(long, default_value = "wallet.json")]
    export: PathBuf,

    /// Encryption password for the wallet v3 file; use with --export
    #[arg(long, default_value = "")]
    password: String,

    /// 24-word recovery phrase per input file, in file order (prompted when omitted)
    #[arg(long = "mnemonic")]
    mnemonics: Vec<String>,

    /// Disable ANSI colors
    #[arg(long)]
    no_color: bool,

    /// Backup files to recover from
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color;
    if let Err(err) = run(cli, color) {
        eprint!("{}", ui::error_box(&format!("{err:#}"), color));
        std::process::exit(1);
    }
}

fn run(cli: Cli, color: bool) -> Result<()> {
    print!("{}", ui::banner(color));

    for file in &cli.files {
        if !file.is_file() {
            bail!("cannot read input file `{}`", file.display());
        }
    }

    if let Some(nonce) = cli.nonce {
        println!(
            "{}\n",
            ui::warning_line(&format!(
                "Using reshare nonce override: {nonce}. Be sure to set the quorum of the vault \
                 at this reshare point with --threshold, or recovery will produce incorrect data."
            ))
        );
    }
    if let Some(quorum) = cli.quorum {
        println!(
            "{}\n",
            ui::warning_line(&format!("Using vault quorum override: {quorum}."))
        );
    }

    let mnemonics = collect_mnemonics(&cli)?;
    let files: Vec<BackupFile> = cli
        .files
        .iter()
        .zip(mnemonics)
        .map(|(path, mnemonic)| BackupFile {
            path: path.clone(),
            mnemonic,
        })
        .collect();
    let overrides = Overrides {
        nonce: cli.nonce,
        quorum: cli.quorum,
    };

    match &cli.vault_id {
        None => list(&files, &overrides, color),
        Some(vault_id) => recover_one(&cli, &files, vault_id, &overrides, color),
    }
}

fn list(files: &[BackupFile], overrides: &Overrides, color: bool) -> Result<()> {
    let outcome = recover::list_vaults(files, overrides)?;
    for warning in &outcome.warnings {
        println!("{}", ui::warning_line(warning));
    }

    if outcome.listing.is_empty() {
        println!("No vaults were found in the provided files.");
        return Ok(());
    }

    println!("{}", ui::bold("Available vaults:", color));
    for item in &outcome.listing {
        println!(
            "  {}  \"{}\"  quorum={} shares={}",
            item.vault_id, item.name, item.quorum, item.share_count
        );
    }
    println!("\nRe-run with --vault-id <id> to recover one of these vaults.");
    Ok(())
}

fn recover_one(
    cli: &Cli,
    files: &[BackupFile],
    vault_id: &str,
    overrides: &Overrides,
    color: bool,
) -> Result<()> {
    let outcome = recover::recover_vault(files, vault_id, overrides)?;
    for warning in &outcome.warnings {
        println!("{}", ui::warning_line(warning));
    }

    let name = outcome
        .listing
        .iter()
        .find(|item| item.vault_id == vault_id)
        .map(|item| item.name.as_str())
        .unwrap_or(vault_id);
    println!(
        "{}\n",
        ui::bold(&format!("RECOVERING VAULT {name} WITH ID {vault_id}"), color)
    );
    for note in &outcome.notes {
        println!("{note}");
    }

    let recovered = outcome
        .recovered
        .context("internal error: recover mode produced no key")?;
    // Secret bytes live inside this scope only; the RecoveredKey zeroizes
    // them when it drops at the end of this function.
    let secret = recovered.key.secret_bytes();

    println!("\n{}\n", ui::success_box(color));
    println!(
        "Your vault has been recovered. Make sure the following address matches your vault's Ethereum address:"
    );
    println!("{}", ui::bold(&recovered.address, color));

    println!("\nHere is your private key for Ethereum and Tron assets. Keep safe and do not share with anyone.");
    println!(
        "Recovered private key (for ETH/MetaMask, TronLink): {}",
        ui::bold(&hex::encode(secret), color)
    );

    println!("\nHere are your private keys for Bitcoin assets. Keep safe and do not share with anyone.");
    println!(
        "Recovered testnet WIF (for Electrum Wallet): {}",
        ui::bold(&export::to_bitcoin_wif(secret, true)?, color)
    );
    println!(
        "Recovered mainnet WIF (for Electrum Wallet): {}",
        ui::bold(&export::to_bitcoin_wif(secret, false)?, color)
    );

    if !cli.export.as_os_str().is_empty() {
        if cli.password.is_empty() {
            println!(
                "\nNOTE: --password is required to export wallet v3 file `{}`. A wallet v3 file will not be created this time.",
                cli.export.display()
            );
        } else {
            let written = export::export_keystore(&cli.export, secret, &cli.password)?;
            println!("\nWrote a MetaMask wallet v3 file to: {}.", written.display());
        }
    }

    Ok(())
}

fn collect_mnemonics(cli: &Cli) -> Result<Vec<String>> {
    if cli.mnemonics.len() > cli.files.len() {
        bail!(
            "got {} --mnemonic flags for {} input files",
            cli.mnemonics.len(),
            cli.files.len()
        );
    }

    let mut mnemonics = cli.mnemonics.clone();
    let stdin = std::io::stdin();
    for file in &cli.files[mnemonics.len()..] {
        print!("Enter the 24 words for `{}`:\n> ", file.display());
        std::io::stdout().flush()?;

        let mut line = String::new();
        stdin.lock().read_line(&mut line)?;
        let words = line.trim();
        if words.is_empty() {
            bail!("no recovery phrase entered for `{}`", file.display());
        }
        mnemonics.push(words.to_string());
    }

    for (words, file) in mnemonics.iter().zip(&cli.files) {
        if !mnemonic::validate_mnemonic(words) {
            bail!(
                "the recovery phrase for `{}` is not a valid 24-word mnemonic",
                file.display()
            );
        }
    }
    Ok(mnemonics)
}

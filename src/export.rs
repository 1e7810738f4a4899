//! Key export collaborators: Bitcoin WIF strings and encrypted Ethereum
//! wallet v3 (keystore) files. Both wrap external formats that must stay
//! byte-for-byte compatible with their consumers, so the heavy lifting is
//! delegated to the `bitcoin` and `eth-keystore` crates.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Encode a private key as a compressed-pubkey WIF string.
pub fn to_bitcoin_wif(secret: &[u8; 32], testnet: bool) -> Result<String> {
    let network = if testnet {
        bitcoin::Network::Testnet
    } else {
        bitcoin::Network::Bitcoin
    };
    let key = bitcoin::PrivateKey::from_slice(secret, network)
        .context("private key bytes are not WIF-encodable")?;
    Ok(key.to_wif())
}

/// Write an encrypted wallet v3 JSON file for the recovered key.
///
/// `path` names the output file; its parent directory must exist.
pub fn export_keystore(path: &Path, secret: &[u8; 32], password: &str) -> Result<PathBuf> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .context("export path has no usable file name")?;

    let mut rng = rand::thread_rng();
    eth_keystore::encrypt_key(dir, &mut rng, secret, password, Some(name))
        .context("could not create the wallet v3 json file")?;
    Ok(dir.join(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wif_known_vector_mainnet() {
        // Compressed WIF of private key 0x...01 on mainnet
        let mut sk = [0u8; 32];
        sk[31] = 1;
        assert_eq!(
            to_bitcoin_wif(&sk, false).unwrap(),
            "KwDiBf89QgGbjEhKnhXJuH7LrciVrZi3qYjgd9M7rFU73sVHnoWn"
        );
    }

    #[test]
    fn test_wif_testnet_prefix() {
        let mut sk = [0u8; 32];
        sk[31] = 1;
        let wif = to_bitcoin_wif(&sk, true).unwrap();
        assert!(wif.starts_with('c'), "testnet compressed WIF starts with c: {wif}");
    }

    #[test]
    fn test_wif_rejects_zero_key() {
        assert!(to_bitcoin_wif(&[0u8; 32], false).is_err());
    }

    #[test]
    fn test_export_keystore_roundtrip() {
        let dir =
            std::env::temp_dir().join(format!("vault-recovery-ks-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("wallet.json");

        let mut sk = [0u8; 32];
        sk[31] = 7;
        let written = export_keystore(&path, &sk, "hunter2").unwrap();
        assert_eq!(written, path);

        let decrypted = eth_keystore::decrypt_key(&written, "hunter2").unwrap();
        assert_eq!(decrypted, sk);
    }
}

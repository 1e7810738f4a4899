//! Ingestion Reconciler
//!
//! Walks every backup file, decrypts the selected reshare state of each
//! vault, decodes its shares, and accumulates them per vault. Files may
//! disagree about which reshare nonce is current; shares from two different
//! nonces are never mixed in one aggregate, because interpolating points
//! from different polynomials yields garbage rather than a wrong-but-obvious
//! key.
//!
//! Recency policy: within a file the highest nonce wins (tracked by an
//! explicit running maximum). Across files, a file selecting a higher nonce
//! supersedes the aggregate built so far (with a warning recommending the
//! operator pin the earlier nonce via overrides); a file selecting a lower
//! nonce is warned about and skipped.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::crypto::mnemonic;
use crate::error::{RecoveryError, Result};
use crate::share::{self, ShareGeneration, ShareRecord};
use crate::vault::{self, CipheredVault, SavedData};

/// One input file paired with its decryption passphrase.
#[derive(Debug, Clone)]
pub struct BackupFile {
    pub path: PathBuf,
    pub mnemonic: String,
}

/// Optional global overrides bypassing automatic recency/threshold detection.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    /// Pin ingestion to exactly this reshare nonce (recover mode only).
    pub nonce: Option<u32>,
    /// Quorum (required share count) override, applied to the whole run.
    pub quorum: Option<usize>,
}

/// Accumulated shares for one vault, all from a single resolved nonce.
#[derive(Debug)]
pub struct VaultAggregate {
    pub vault_id: String,
    pub name: String,
    /// Shares required to reconstruct (stored threshold + 1, or override).
    pub quorum: usize,
    pub resolved_nonce: u32,
    pub shares: Vec<ShareRecord>,
}

/// Listing row, ordered by vault ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultSummary {
    pub vault_id: String,
    pub name: String,
    pub quorum: usize,
    pub share_count: usize,
}

/// Everything ingestion produced: per-vault aggregates plus operator-facing
/// warnings and (in recover mode) share processing notes.
#[derive(Debug, Default)]
pub struct IngestOutcome {
    pub vaults: BTreeMap<String, VaultAggregate>,
    pub warnings: Vec<String>,
    pub notes: Vec<String>,
}

impl IngestOutcome {
    /// Ordered-by-identifier listing for presentation.
    pub fn listing(&self) -> Vec<VaultSummary> {
        self.vaults
            .values()
            .map(|agg| VaultSummary {
                vault_id: agg.vault_id.clone(),
                name: agg.name.clone(),
                quorum: agg.quorum,
                share_count: agg.shares.len(),
            })
            .collect()
    }
}

/// Ingest all files, restricted to `target` when recovering a single vault.
///
/// With no target (listing mode) per-vault failures are downgraded to
/// warnings and the vault is omitted; file-level failures (unreadable file,
/// bad mnemonic) always abort.
pub fn ingest(
    files: &[BackupFile],
    target: Option<&str>,
    overrides: &Overrides,
) -> Result<IngestOutcome> {
    let listing_only = target.is_none();
    let mut outcome = IngestOutcome::default();

    for file in files {
        let content = std::fs::read(&file.path).map_err(|source| RecoveryError::Io {
            path: file.path.display().to_string(),
            source,
        })?;
        let saved: SavedData = serde_json::from_slice(&content)
            .map_err(|e| RecoveryError::format(format!("{e} (code: 1)")))?;

        // Zeroized when it goes out of scope at the end of this file.
        let key = mnemonic::key_from_mnemonic(&file.mnemonic)?;

        for (vault_id, reshares) in &saved.vaults {
            if target.is_some_and(|t| t != vault_id) {
                continue;
            }

            // Take the highest reshare nonce present, or exactly the pinned
            // one. A vault with no usable entry in this file is skipped.
            let mut selected: Option<u32> = None;
            for &nonce in reshares.keys() {
                if !listing_only && overrides.nonce.is_some_and(|pin| pin != nonce) {
                    continue;
                }
                selected = Some(selected.map_or(nonce, |best| best.max(nonce)));
            }
            let Some(nonce) = selected else { continue };

            let result =
                ingest_vault_entry(&mut outcome, vault_id, nonce, &reshares[&nonce], &key, overrides, listing_only);
            match result {
                Ok(()) => {}
                Err(err) if listing_only => {
                    outcome.vaults.remove(vault_id);
                    outcome
                        .warnings
                        .push(format!("skipping vault `{vault_id}` in listing: {err}"));
                }
                Err(err) => return Err(err),
            }
        }
    }

    Ok(outcome)
}

fn ingest_vault_entry(
    outcome: &mut IngestOutcome,
    vault_id: &str,
    nonce: u32,
    ciphered: &CipheredVault,
    key: &[u8; 32],
    overrides: &Overrides,
    listing_only: bool,
) -> Result<()> {
    if let Some(existing) = outcome.vaults.get(vault_id) {
        if existing.resolved_nonce != nonce {
            let earlier = existing.resolved_nonce.min(nonce);
            outcome.warnings.push(format!(
                "non-matching reshare nonce for vault `{vault_id}` (have {}, this file selects {nonce}). \
                 If you have problems recovering that vault, try: --vault-id {vault_id} --nonce {earlier} --threshold <quorum at that reshare point>",
                existing.resolved_nonce
            ));
            if nonce < existing.resolved_nonce {
                // Stale reshare state; its shares cannot be combined with
                // the ones already aggregated.
                return Ok(());
            }
            // Newer reshare state supersedes everything gathered so far.
            outcome.vaults.remove(vault_id);
        }
    }

    let clear = vault::decrypt_vault(vault_id, ciphered, key)?;
    let share_strings = clear.share_strings(vault_id)?;
    let quorum = overrides.quorum.unwrap_or_else(|| clear.quorum());

    let mut decoded = Vec::with_capacity(share_strings.len());
    for raw in share_strings {
        let (record, generation) = share::decode(raw)?;
        if !listing_only {
            outcome.notes.push(match generation {
                ShareGeneration::V2 {
                    compressed,
                    expanded,
                } => format!(
                    "Processing V2 share {}.\t {:.1} KB -> {:.1} KB",
                    record.share_id_hex,
                    compressed as f64 / 1024.0,
                    expanded as f64 / 1024.0
                ),
                ShareGeneration::V1 { len } => format!(
                    "Processing V1 share {}.\t {:.1} KB",
                    record.share_id_hex,
                    len as f64 / 1024.0
                ),
            });
        }
        decoded.push(record);
    }

    let aggregate = outcome
        .vaults
        .entry(vault_id.to_string())
        .or_insert_with(|| VaultAggregate {
            vault_id: vault_id.to_string(),
            name: clear.name.clone(),
            quorum,
            resolved_nonce: nonce,
            shares: Vec::new(),
        });
    aggregate.name.clone_from(&clear.name);
    aggregate.quorum = quorum;

    for record in decoded {
        if aggregate
            .shares
            .iter()
            .any(|s| s.share_id_hex == record.share_id_hex)
        {
            return Err(RecoveryError::format(format!(
                "duplicate share ID `{}` for vault `{vault_id}` - are two input files copies of the same backup?",
                record.share_id_hex
            )));
        }
        aggregate.shares.push(record);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::primitives::{self, GCM_IV_LEN};
    use crate::share::tests::{encode_v2, share_json};
    use crate::vault::tests::seal_vault;
    use secp256kfun::prelude::*;
    use std::path::Path;

    // 24-word phrase for all-zero entropy; the vault key is therefore [0; 32]
    const MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon \
         abandon abandon abandon abandon abandon abandon abandon abandon \
         abandon abandon abandon abandon abandon abandon abandon art";
    const KEY: [u8; 32] = [0u8; 32];

    fn pubkey_hex() -> String {
        let sk = Scalar::<Secret, Zero>::from(5u32).non_zero().unwrap();
        hex::encode(primitives::point_to_uncompressed(
            &primitives::scalar_mul_base(&sk),
        ))
    }

    fn vault_plaintext(name: &str, threshold: usize, shares: &[String]) -> String {
        serde_json::json!({
            "name": name,
            "threshold": threshold,
            "curves": [{"algorithm": "ECDSA", "shares": shares}],
        })
        .to_string()
    }

    /// Write a backup file holding `vault_id` at the given nonces.
    fn write_backup(
        dir: &Path,
        file_name: &str,
        vault_id: &str,
        entries: &[(u32, String)],
    ) -> BackupFile {
        let mut reshares = serde_json::Map::new();
        for (i, (nonce, plaintext)) in entries.iter().enumerate() {
            let iv = [i as u8 + 1; GCM_IV_LEN];
            let ciphered = seal_vault(plaintext.as_bytes(), &KEY, &iv);
            reshares.insert(
                nonce.to_string(),
                serde_json::json!({
                    "ciphertext": ciphered.ciphertext_b64,
                    "cipherparams": {"iv": ciphered.cipherparams.iv, "tag": ciphered.cipherparams.tag},
                    "cipher": ciphered.cipher,
                    "hash": ciphered.hash,
                }),
            );
        }
        let mut vaults = serde_json::Map::new();
        vaults.insert(vault_id.to_string(), serde_json::Value::Object(reshares));
        let doc = serde_json::json!({ "vaults": vaults });
        let path = dir.join(file_name);
        std::fs::write(&path, doc.to_string()).unwrap();
        BackupFile {
            path,
            mnemonic: MNEMONIC.to_string(),
        }
    }

    fn test_dir(tag: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("vault-recovery-ingest-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_single_file_listing() {
        let dir = test_dir("single");
        let pk = pubkey_hex();
        let shares = vec![
            share_json("01", "11", Some(&pk)),
            encode_v2("02", &share_json("02", "22", Some(&pk))),
        ];
        let plaintext = vault_plaintext("Treasury", 1, &shares);
        let file = write_backup(&dir, "a.json", "v1", &[(0, plaintext)]);

        let outcome = ingest(&[file], None, &Overrides::default()).unwrap();
        let listing = outcome.listing();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].vault_id, "v1");
        assert_eq!(listing[0].name, "Treasury");
        assert_eq!(listing[0].quorum, 2);
        assert_eq!(listing[0].share_count, 2);
        // size notes are suppressed while listing
        assert!(outcome.notes.is_empty());
    }

    #[test]
    fn test_highest_nonce_wins_within_file() {
        let dir = test_dir("highest");
        let pk = pubkey_hex();
        let old = vault_plaintext("T", 1, &[share_json("01", "11", Some(&pk))]);
        let new = vault_plaintext("T", 1, &[share_json("03", "33", Some(&pk))]);
        let file = write_backup(&dir, "a.json", "v1", &[(0, old), (2, new)]);

        let outcome = ingest(&[file], Some("v1"), &Overrides::default()).unwrap();
        let agg = &outcome.vaults["v1"];
        assert_eq!(agg.resolved_nonce, 2);
        assert_eq!(agg.shares[0].share_id_hex, "03");
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_nonce_disagreement_across_files_warns_and_keeps_higher() {
        let dir = test_dir("disagree");
        let pk = pubkey_hex();
        let at1 = vault_plaintext("T", 1, &[share_json("01", "11", Some(&pk))]);
        let at2 = vault_plaintext("T", 1, &[share_json("02", "22", Some(&pk))]);
        let file_a = write_backup(&dir, "a.json", "v1", &[(1, at1)]);
        let file_b = write_backup(&dir, "b.json", "v1", &[(2, at2)]);

        let outcome = ingest(&[file_a, file_b], Some("v1"), &Overrides::default()).unwrap();
        let agg = &outcome.vaults["v1"];
        assert_eq!(agg.resolved_nonce, 2);
        // the nonce-1 share was superseded, never mixed in
        assert_eq!(agg.shares.len(), 1);
        assert_eq!(agg.shares[0].share_id_hex, "02");
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("non-matching reshare nonce"));
    }

    #[test]
    fn test_nonce_override_pins_selection() {
        let dir = test_dir("pin");
        let pk = pubkey_hex();
        let at1 = vault_plaintext("T", 1, &[share_json("01", "11", Some(&pk))]);
        let at2 = vault_plaintext("T", 1, &[share_json("02", "22", Some(&pk))]);
        let file_a = write_backup(&dir, "a.json", "v1", &[(1, at1)]);
        let file_b = write_backup(&dir, "b.json", "v1", &[(2, at2)]);

        let overrides = Overrides {
            nonce: Some(1),
            quorum: None,
        };
        let outcome = ingest(&[file_a, file_b], Some("v1"), &overrides).unwrap();
        let agg = &outcome.vaults["v1"];
        assert_eq!(agg.resolved_nonce, 1);
        assert_eq!(agg.shares[0].share_id_hex, "01");
        // file B has no entry at the pinned nonce: skipped without warning
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_shares_merge_across_files_at_matching_nonce() {
        let dir = test_dir("merge");
        let pk = pubkey_hex();
        let part_a = vault_plaintext("T", 2, &[share_json("01", "11", Some(&pk)), share_json("02", "22", Some(&pk))]);
        let part_b = vault_plaintext("T", 2, &[share_json("03", "33", Some(&pk))]);
        let file_a = write_backup(&dir, "a.json", "v1", &[(0, part_a)]);
        let file_b = write_backup(&dir, "b.json", "v1", &[(0, part_b)]);

        let outcome = ingest(&[file_a, file_b], Some("v1"), &Overrides::default()).unwrap();
        let agg = &outcome.vaults["v1"];
        assert_eq!(agg.shares.len(), 3);
        assert_eq!(agg.quorum, 3);
    }

    #[test]
    fn test_duplicate_share_id_is_rejected() {
        let dir = test_dir("dup");
        let pk = pubkey_hex();
        let part = vault_plaintext("T", 1, &[share_json("01", "11", Some(&pk))]);
        let file_a = write_backup(&dir, "a.json", "v1", &[(0, part.clone())]);
        let file_b = write_backup(&dir, "b.json", "v1", &[(0, part)]);

        let err = ingest(&[file_a, file_b], Some("v1"), &Overrides::default()).unwrap_err();
        assert!(matches!(err, RecoveryError::Format { .. }));
        assert!(err.to_string().contains("duplicate share ID"));
    }

    #[test]
    fn test_quorum_override_takes_precedence() {
        let dir = test_dir("quorum");
        let pk = pubkey_hex();
        let part = vault_plaintext("T", 1, &[share_json("01", "11", Some(&pk))]);
        let file = write_backup(&dir, "a.json", "v1", &[(0, part)]);

        let overrides = Overrides {
            nonce: None,
            quorum: Some(5),
        };
        let outcome = ingest(&[file], Some("v1"), &overrides).unwrap();
        assert_eq!(outcome.vaults["v1"].quorum, 5);
    }

    #[test]
    fn test_listing_survives_undecryptable_vault() {
        let dir = test_dir("badvault");
        let pk = pubkey_hex();
        let good = vault_plaintext("T", 1, &[share_json("01", "11", Some(&pk))]);
        let file = write_backup(&dir, "a.json", "v1", &[(0, good)]);

        // second file encrypted under a different key: undecryptable with ours
        let other_key = [7u8; 32];
        let bad = seal_vault(b"{}", &other_key, &[9u8; GCM_IV_LEN]);
        let doc = serde_json::json!({"vaults": {"v2": {"0": {
            "ciphertext": bad.ciphertext_b64,
            "cipherparams": {"iv": bad.cipherparams.iv, "tag": bad.cipherparams.tag},
            "cipher": bad.cipher,
            "hash": bad.hash,
        }}}});
        let bad_path = dir.join("b.json");
        std::fs::write(&bad_path, doc.to_string()).unwrap();
        let bad_file = BackupFile {
            path: bad_path,
            mnemonic: MNEMONIC.to_string(),
        };

        let outcome = ingest(&[file, bad_file], None, &Overrides::default()).unwrap();
        assert_eq!(outcome.listing().len(), 1);
        assert_eq!(outcome.listing()[0].vault_id, "v1");
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[test]
    fn test_bad_mnemonic_is_fatal() {
        let dir = test_dir("badwords");
        let pk = pubkey_hex();
        let part = vault_plaintext("T", 1, &[share_json("01", "11", Some(&pk))]);
        let mut file = write_backup(&dir, "a.json", "v1", &[(0, part)]);
        file.mnemonic = "wrong words".to_string();

        let err = ingest(&[file], None, &Overrides::default()).unwrap_err();
        assert!(matches!(err, RecoveryError::InvalidMnemonic { .. }));
    }
}

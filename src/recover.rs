//! Recovery Orchestrator
//!
//! Two modes over the same ingestion pipeline: list every vault found in the
//! input files, or recover one vault end to end (ingest, reconstruct, derive
//! the Ethereum address). Never returns a key that failed the public-key
//! cross-check.

use crate::address;
use crate::error::{RecoveryError, Result};
use crate::ingest::{self, BackupFile, Overrides, VaultSummary};
use crate::reconstruct::{self, RecoveredKey};

/// Result of a recover-mode run.
#[derive(Debug)]
pub struct RecoveredVault {
    pub key: RecoveredKey,
    pub address: String,
}

/// Outcome of either mode; `recovered` is set only in recover mode.
#[derive(Debug)]
pub struct RunOutcome {
    pub listing: Vec<VaultSummary>,
    pub recovered: Option<RecoveredVault>,
    pub warnings: Vec<String>,
    pub notes: Vec<String>,
}

/// List every vault the input files contain. Performs no reconstruction and
/// never needs a quorum of shares.
pub fn list_vaults(files: &[BackupFile], overrides: &Overrides) -> Result<RunOutcome> {
    let outcome = ingest::ingest(files, None, overrides)?;
    Ok(RunOutcome {
        listing: outcome.listing(),
        recovered: None,
        warnings: outcome.warnings,
        notes: outcome.notes,
    })
}

/// Recover the private key and address for one vault.
pub fn recover_vault(
    files: &[BackupFile],
    vault_id: &str,
    overrides: &Overrides,
) -> Result<RunOutcome> {
    let outcome = ingest::ingest(files, Some(vault_id), overrides)?;

    let aggregate = outcome.vaults.get(vault_id).ok_or_else(|| {
        RecoveryError::format(format!(
            "provided files do not contain data for vault `{vault_id}` with the expected reshare nonce"
        ))
    })?;

    let key = reconstruct::reconstruct(vault_id, &aggregate.shares, aggregate.quorum)?;
    let address = address::derive_address(&key.public_key);

    Ok(RunOutcome {
        listing: outcome.listing(),
        recovered: Some(RecoveredVault { key, address }),
        warnings: outcome.warnings,
        notes: outcome.notes,
    })
}

//! Recover a secp256k1 private key from threshold-signature wallet backups.
//!
//! The pipeline is strictly one-directional and single-threaded: backup
//! files are decrypted into clear vaults, their shares decoded and
//! reconciled per vault and reshare nonce, and the secret reconstructed by
//! Lagrange interpolation and cross-checked against the recorded public key.

pub mod address;
pub mod crypto;
pub mod error;
pub mod export;
pub mod ingest;
pub mod reconstruct;
pub mod recover;
pub mod share;
pub mod ui;
pub mod vault;

pub use error::RecoveryError;
pub use ingest::{BackupFile, Overrides, VaultSummary};
pub use reconstruct::RecoveredKey;
pub use recover::{list_vaults, recover_vault, RecoveredVault, RunOutcome};

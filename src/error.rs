//! Error taxonomy for the recovery pipeline.
//!
//! Every failure carries enough context (vault ID, decode stage) for an
//! operator to tell a wrong mnemonic apart from a wrong threshold or a
//! corrupted backup file.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecoveryError {
    /// Malformed hex/base64 in a ciphered vault record.
    #[error("vault `{vault_id}`: malformed {field} encoding: {reason}")]
    Decode {
        vault_id: String,
        field: &'static str,
        reason: String,
    },

    /// AES-GCM rejected the ciphertext. Wrong mnemonic or tampered backup.
    #[error(
        "vault `{vault_id}`: authenticated decryption failed - are the mnemonic words for this file correct?"
    )]
    AuthenticationFailed { vault_id: String },

    /// Post-decryption SHA-512 check failed. The ciphertext authenticated,
    /// so this signals corruption of the stored hash, not a wrong key.
    #[error("vault `{vault_id}`: plaintext hash does not match the stored integrity hash - the backup file may be corrupted")]
    IntegrityMismatch { vault_id: String },

    /// Structurally invalid decrypted or decoded content.
    #[error("invalid data format - is this an old backup file? ({context})")]
    Format { context: String },

    /// V2 share payload parsed to a different share ID than it declared.
    #[error("share ID mismatch in V2 share data: declared `{declared}`, payload contains `{parsed}`")]
    ShareIdMismatch { declared: String, parsed: String },

    /// Fewer shares available than the vault quorum requires.
    #[error("not enough shares to recover the key for vault `{vault_id}` (need {needed}, have {have})")]
    InsufficientShares {
        vault_id: String,
        needed: usize,
        have: usize,
    },

    /// The reconstructed key does not match the expected public key.
    #[error("vault `{vault_id}`: recovered public key did not match the expected share public key - did you input the right threshold?")]
    ReconstructionMismatch { vault_id: String },

    /// Mnemonic failed BIP-39 checksum/wordlist validation.
    #[error("failed to derive a key from the mnemonic, are your words correct? ({reason})")]
    InvalidMnemonic { reason: String },

    /// Public key coordinates do not lie on the curve.
    #[error("invalid public key coordinates")]
    InvalidPublicKey,

    #[error("failed to read backup file `{path}`: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

impl RecoveryError {
    pub fn format(context: impl Into<String>) -> Self {
        RecoveryError::Format {
            context: context.into(),
        }
    }
}

pub type Result<T, E = RecoveryError> = std::result::Result<T, E>;

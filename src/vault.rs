//! Backup file data model and vault decryption.
//!
//! A backup file maps vault IDs to their reshare history: one AES-256-GCM
//! ciphered record per reshare nonce. Decryption walks four distinct failure
//! points (encoding, authentication, integrity hash, structure) and reports
//! each one separately so an operator can tell a wrong mnemonic from a
//! corrupted file.

use std::collections::BTreeMap;

use base64::Engine;
use serde::Deserialize;

use crate::crypto::primitives::{self, GCM_IV_LEN};
use crate::error::{RecoveryError, Result};

/// Signature algorithm whose share group this tool recovers.
pub const ECDSA_ALGORITHM: &str = "ECDSA";

/// Top-level layout of a backup JSON file.
#[derive(Debug, Deserialize)]
pub struct SavedData {
    /// vault ID -> reshare nonce -> ciphered record. Nonce keys are decimal
    /// strings in JSON; `BTreeMap` keeps iteration deterministic.
    pub vaults: BTreeMap<String, BTreeMap<u32, CipheredVault>>,
}

/// One historical state of a vault, encrypted under the file's mnemonic key.
#[derive(Debug, Deserialize)]
pub struct CipheredVault {
    #[serde(rename = "ciphertext")]
    pub ciphertext_b64: String,
    pub cipherparams: CipherParams,
    pub cipher: String,
    /// SHA-512 of the plaintext, a legacy belt-and-suspenders check on top
    /// of the GCM tag.
    pub hash: String,
}

#[derive(Debug, Deserialize)]
pub struct CipherParams {
    pub iv: String,
    pub tag: String,
}

/// Decrypted vault contents, shares still in their encoded textual form.
#[derive(Debug, Deserialize)]
pub struct ClearVault {
    pub name: String,
    /// Stored threshold `t`; `t + 1` shares reconstruct the secret.
    pub threshold: usize,
    #[serde(rename = "shares")]
    pub shares_legacy: Option<Vec<String>>,
    #[serde(default)]
    pub curves: Vec<ClearVaultCurve>,
}

#[derive(Debug, Deserialize)]
pub struct ClearVaultCurve {
    pub algorithm: String,
    pub shares: Vec<String>,
}

impl ClearVault {
    /// Quorum: the number of shares actually required for reconstruction.
    pub fn quorum(&self) -> usize {
        self.threshold + 1
    }

    /// The share strings to decode: the legacy list when present, otherwise
    /// the ECDSA curve group. A vault with neither has no usable key material.
    pub fn share_strings(&self, vault_id: &str) -> Result<&[String]> {
        if let Some(legacy) = &self.shares_legacy {
            return Ok(legacy);
        }
        self.curves
            .iter()
            .find(|curve| curve.algorithm == ECDSA_ALGORITHM)
            .map(|curve| curve.shares.as_slice())
            .ok_or_else(|| {
                RecoveryError::format(format!(
                    "no legacy or {ECDSA_ALGORITHM} shares found for vault `{vault_id}` ({})",
                    self.name
                ))
            })
    }
}

/// Decrypt one ciphered vault record with the mnemonic-derived key.
///
/// Steps, each its own failure point: decode IV/tag/ciphertext, authenticated
/// decryption (tag appended to the ciphertext, matching the encryption side),
/// SHA-512 integrity recheck, JSON parse.
pub fn decrypt_vault(vault_id: &str, ciphered: &CipheredVault, key: &[u8; 32]) -> Result<ClearVault> {
    let decode_err = |field: &'static str, reason: String| RecoveryError::Decode {
        vault_id: vault_id.to_string(),
        field,
        reason,
    };

    let iv_bytes = hex::decode(&ciphered.cipherparams.iv)
        .map_err(|e| decode_err("iv", e.to_string()))?;
    let iv: [u8; GCM_IV_LEN] = iv_bytes.try_into().map_err(|v: Vec<u8>| {
        decode_err("iv", format!("expected {GCM_IV_LEN} bytes, got {}", v.len()))
    })?;

    let tag = hex::decode(&ciphered.cipherparams.tag)
        .map_err(|e| decode_err("tag", e.to_string()))?;

    let mut ciphertext = base64::engine::general_purpose::STANDARD
        .decode(&ciphered.ciphertext_b64)
        .map_err(|e| decode_err("ciphertext", e.to_string()))?;
    ciphertext.extend_from_slice(&tag);

    let plaintext = primitives::decrypt_authenticated(key, &iv, &ciphertext).ok_or_else(|| {
        RecoveryError::AuthenticationFailed {
            vault_id: vault_id.to_string(),
        }
    })?;

    // GCM already authenticated the bytes; this recheck guards the stored
    // hash itself and gets its own dedicated error.
    let plaintext_hash = hex::encode(primitives::hash512(&plaintext));
    if !plaintext_hash.eq_ignore_ascii_case(&ciphered.hash) {
        return Err(RecoveryError::IntegrityMismatch {
            vault_id: vault_id.to_string(),
        });
    }

    serde_json::from_slice(&plaintext)
        .map_err(|e| RecoveryError::format(format!("vault `{vault_id}` plaintext: {e}")))
}

//! Low-level cryptographic operations.
//!
//! No business logic lives here; every function is a thin, deterministic
//! wrapper that the pipeline modules compose. Scalar and point arithmetic is
//! modulo the secp256k1 group order throughout.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use secp256kfun::prelude::*;
use sha2::{Digest, Sha512};
use sha3::Keccak256;

/// AES-GCM nonce length in bytes.
pub const GCM_IV_LEN: usize = 12;

/// Authenticated decryption with AES-256-GCM.
///
/// `ciphertext_and_tag` carries the 16-byte tag appended to the ciphertext,
/// matching the construction used by the encryption side. Returns `None` on
/// authentication failure (wrong key or tampered ciphertext).
pub fn decrypt_authenticated(
    key: &[u8; 32],
    iv: &[u8; GCM_IV_LEN],
    ciphertext_and_tag: &[u8],
) -> Option<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key).ok()?;
    let nonce = Nonce::from_slice(iv);
    cipher.decrypt(nonce, ciphertext_and_tag).ok()
}

/// SHA-512 digest, used for the vault plaintext integrity check.
pub fn hash512(data: &[u8]) -> [u8; 64] {
    let mut out = [0u8; 64];
    out.copy_from_slice(&Sha512::digest(data));
    out
}

/// Keccak-256 digest, used for Ethereum address derivation.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Keccak256::digest(data));
    out
}

/// Base-point scalar multiplication: `scalar * G`.
pub fn scalar_mul_base(scalar: &Scalar<Secret, NonZero>) -> Point {
    g!(scalar * G).normalize()
}

/// Serialize a point as 65 uncompressed bytes (`04 || X || Y`).
pub fn point_to_uncompressed(point: &Point) -> [u8; 65] {
    point.to_bytes_uncompressed()
}

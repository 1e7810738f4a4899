//! Ethereum address derivation.
//!
//! Standard construction: Keccak-256 over the 64 coordinate bytes of the
//! uncompressed public key (prefix byte excluded), low 20 bytes, hex with a
//! `0x` prefix.

use secp256kfun::Point;

use crate::crypto::primitives;

/// Derive the Ethereum address string for a public key. Deterministic, pure.
pub fn derive_address(public_key: &Point) -> String {
    let uncompressed = primitives::point_to_uncompressed(public_key);
    let digest = primitives::keccak256(&uncompressed[1..]);
    format!("0x{}", hex::encode(&digest[12..]))
}

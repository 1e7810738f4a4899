//! Cryptographic Primitives
//!
//! This module keeps all cryptographic building blocks behind narrow,
//! independently testable interfaces:
//!
//! - **primitives**: AES-256-GCM decryption, SHA-512/Keccak-256 digests,
//!   secp256k1 scalar/point helpers
//! - **mnemonic**: BIP-39 recovery phrase to 32-byte vault key

pub mod mnemonic;
pub mod primitives;

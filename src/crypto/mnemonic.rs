//! BIP-39 Mnemonic to Vault Key
//!
//! Each backup file is encrypted under a 32-byte AES key that is simply the
//! entropy behind the file's 24-word recovery phrase. Deriving the key is a
//! checksum-validated entropy extraction, not a PBKDF2 seed derivation.

use bip39::{Language, Mnemonic};
use zeroize::{Zeroize, Zeroizing};

use crate::error::{RecoveryError, Result};

/// Words expected in a backup file's recovery phrase.
pub const WORDS: usize = 24;

/// Derive the 32-byte vault decryption key from a 24-word mnemonic.
///
/// Fails on wordlist/checksum violations and on phrases of the wrong length.
/// The returned key is zeroized when dropped.
pub fn key_from_mnemonic(words: &str) -> Result<Zeroizing<[u8; 32]>> {
    let mnemonic = Mnemonic::parse_in(Language::English, words.trim()).map_err(|e| {
        RecoveryError::InvalidMnemonic {
            reason: e.to_string(),
        }
    })?;

    if mnemonic.word_count() != WORDS {
        return Err(RecoveryError::InvalidMnemonic {
            reason: format!("expected {} words, got {}", WORDS, mnemonic.word_count()),
        });
    }

    let mut entropy = Zeroizing::new(mnemonic.to_entropy());
    let mut key = Zeroizing::new([0u8; 32]);
    key.copy_from_slice(&entropy);
    entropy.zeroize();
    Ok(key)
}

/// Validate mnemonic words (checksum and wordlist) without deriving a key.
pub fn validate_mnemonic(words: &str) -> bool {
    key_from_mnemonic(words).is_ok()
}

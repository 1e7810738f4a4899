//! Secret Reconstructor
//!
//! Recovers the vault private key from >= quorum shares via Lagrange
//! interpolation at x = 0 over the secp256k1 scalar field, then re-derives
//! the public key and checks it against the one recorded with the shares.
//! That cross-check is the primary safety net: a wrong threshold or a
//! mismatched share set produces a clean error, never a plausible-looking
//! wrong key.

use secp256kfun::prelude::*;
use zeroize::Zeroizing;

use crate::crypto::primitives;
use crate::error::{RecoveryError, Result};
use crate::share::ShareRecord;

/// A successfully reconstructed private key. The secret bytes are zeroized
/// when this value is dropped, on every exit path of the consuming scope.
pub struct RecoveredKey {
    secret: Zeroizing<[u8; 32]>,
    pub public_key: Point,
}

impl RecoveredKey {
    /// Big-endian private scalar bytes. Do not copy these out of the scope
    /// that consumes them.
    pub fn secret_bytes(&self) -> &[u8; 32] {
        &self.secret
    }
}

impl std::fmt::Debug for RecoveredKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecoveredKey")
            .field("secret", &"<redacted>")
            .field("public_key", &self.public_key)
            .finish()
    }
}

/// Reconstruct the private key for `vault_id` from the aggregated shares.
///
/// Requires `shares.len() >= quorum`; extra shares beyond quorum are fine
/// (every quorum-sized subset of a consistent share set interpolates to the
/// same secret). The expected public key is taken from the first share that
/// recorded one.
pub fn reconstruct(vault_id: &str, shares: &[ShareRecord], quorum: usize) -> Result<RecoveredKey> {
    if shares.len() < quorum {
        return Err(RecoveryError::InsufficientShares {
            vault_id: vault_id.to_string(),
            needed: quorum,
            have: shares.len(),
        });
    }

    let expected_public_key = shares
        .iter()
        .find_map(|s| s.public_key)
        .ok_or_else(|| {
            RecoveryError::format(format!(
                "no public key recorded with the shares of vault `{vault_id}`"
            ))
        })?;

    let ids: Vec<Scalar<Public, NonZero>> = shares.iter().map(|s| s.share_id).collect();

    let mut secret: Scalar<Secret, Zero> = Scalar::zero();
    for (i, share) in shares.iter().enumerate() {
        let lambda = lagrange_coefficient_at_zero(i, &ids)?;
        let weighted = s!(lambda * { share.secret_value });
        secret = s!(secret + weighted);
    }

    // Move the secret into a self-scrubbing buffer and overwrite the
    // accumulator before any return can drop it with live bytes.
    let secret_bytes = Zeroizing::new(secret.to_bytes());
    let reconstructed = secret.non_zero();
    secret = Scalar::zero();
    debug_assert!(secret.is_zero());

    let secret_scalar = reconstructed.ok_or_else(|| RecoveryError::ReconstructionMismatch {
        vault_id: vault_id.to_string(),
    })?;

    let public_key = primitives::scalar_mul_base(&secret_scalar);
    if public_key != expected_public_key {
        return Err(RecoveryError::ReconstructionMismatch {
            vault_id: vault_id.to_string(),
        });
    }

    Ok(RecoveredKey {
        secret: secret_bytes,
        public_key,
    })
}

/// Lagrange coefficient for the share at `index` evaluated at x = 0:
/// lambda_i(0) = prod_{j != i} (0 - x_j) / (x_i - x_j)
///
/// All arithmetic stays in the scalar field; a zero denominator means two
/// shares carry the same ID.
fn lagrange_coefficient_at_zero(
    index: usize,
    all_ids: &[Scalar<Public, NonZero>],
) -> Result<Scalar<Secret, Zero>> {
    let share_id = all_ids[index];
    let mut numerator: Scalar<Secret, Zero> = Scalar::from(1u32);
    let mut denominator: Scalar<Secret, Zero> = Scalar::from(1u32);

    for (j, other) in all_ids.iter().enumerate() {
        if j == index {
            continue;
        }

        // numerator *= (0 - x_j)
        let neg_j = s!(-{ *other });
        numerator = s!(numerator * neg_j);

        // denominator *= (x_i - x_j)
        let i_minus_j = s!({ share_id } - { *other });
        denominator = s!(denominator * i_minus_j);
    }

    let denom_nonzero = denominator.non_zero().ok_or_else(|| {
        RecoveryError::format("duplicate share IDs in the interpolation set".to_string())
    })?;
    let denom_inv = denom_nonzero.invert();
    Ok(s!(numerator * denom_inv))
}

//! Share Codec
//!
//! Backup vaults store each party's share as an opaque string in one of two
//! generations:
//!
//! - **V1 (legacy)**: the string is the share JSON itself
//! - **V2 (compressed)**: `_V2_<shareID>_<base64(deflate(json))>`, where the
//!   declared share ID must match the ID inside the payload
//!
//! Both converge on one canonical [`ShareRecord`] before aggregation. The V2
//! ID check protects against payload substitution or corruption that survives
//! decompression.

use std::io::Read;

use base64::Engine;
use flate2::read::DeflateDecoder;
use secp256kfun::prelude::*;
use serde::Deserialize;

use crate::error::{RecoveryError, Result};

/// Textual marker prefixing compressed (V2) share strings.
pub const V2_MAGIC_PREFIX: &str = "_V2_";

/// Canonical decoded share: one Lagrange interpolation point plus the vault
/// public key recorded alongside it.
#[derive(Debug, Clone)]
pub struct ShareRecord {
    /// Interpolation x-coordinate, unique per vault.
    pub share_id: Scalar<Public, NonZero>,
    /// Canonical lowercase hex of `share_id`, kept for dedup and messages.
    pub share_id_hex: String,
    /// Interpolation y-coordinate: the share value mod the curve order.
    pub secret_value: Scalar<Secret, Zero>,
    /// Vault public key the reconstruction is checked against.
    pub public_key: Option<Point>,
}

/// Which serialization generation a share string used, with byte sizes for
/// operator visibility on the compressed path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareGeneration {
    V1 { len: usize },
    V2 { compressed: usize, expanded: usize },
}

/// Structured share encoding, shared by V1 strings and inflated V2 payloads.
#[derive(Deserialize)]
struct ShareJson {
    #[serde(rename = "shareID")]
    share_id: String,
    xi: String,
    #[serde(rename = "publicKey")]
    public_key: Option<String>,
}

/// Decode one raw share string into a canonical [`ShareRecord`].
pub fn decode(raw: &str) -> Result<(ShareRecord, ShareGeneration)> {
    match raw.strip_prefix(V2_MAGIC_PREFIX) {
        Some(rest) => decode_v2(rest),
        None => {
            let record = parse_share_json(raw)?;
            Ok((record, ShareGeneration::V1 { len: raw.len() }))
        }
    }
}

fn decode_v2(rest: &str) -> Result<(ShareRecord, ShareGeneration)> {
    let (declared_id, b64_part) = rest.split_once('_').ok_or_else(|| {
        RecoveryError::format("failed to split on share ID delimiter in V2 share data")
    })?;

    let deflated = base64::engine::general_purpose::STANDARD
        .decode(b64_part)
        .map_err(|e| RecoveryError::format(format!("bad base64 in V2 share data: {e}")))?;

    let mut inflated = Vec::new();
    DeflateDecoder::new(deflated.as_slice())
        .read_to_end(&mut inflated)
        .map_err(|e| RecoveryError::format(format!("corrupt compressed V2 share data: {e}")))?;

    let json = std::str::from_utf8(&inflated)
        .map_err(|_| RecoveryError::format("V2 share payload is not valid UTF-8"))?;
    let record = parse_share_json(json)?;

    // The declared ID rides outside the compressed payload; a mismatch means
    // the payload was substituted or corrupted in a way deflate didn't catch.
    // Both sides decode to fixed 32-byte integers so zero-padding and case
    // differences never matter.
    let declared_bytes = scalar_bytes_from_hex(declared_id, "declared shareID")?;
    if declared_bytes != record.share_id.to_bytes() {
        return Err(RecoveryError::ShareIdMismatch {
            declared: declared_id.to_string(),
            parsed: record.share_id_hex.clone(),
        });
    }

    Ok((
        record,
        ShareGeneration::V2 {
            compressed: deflated.len(),
            expanded: inflated.len(),
        },
    ))
}

fn parse_share_json(json: &str) -> Result<ShareRecord> {
    let share: ShareJson = serde_json::from_str(json)
        .map_err(|e| RecoveryError::format(format!("unparseable share record: {e}")))?;

    let id_bytes = scalar_bytes_from_hex(&share.share_id, "shareID")?;
    let share_id = Scalar::<Public, NonZero>::from_bytes(id_bytes)
        .ok_or_else(|| RecoveryError::format("share ID is zero or exceeds the curve order"))?;

    let value_bytes = scalar_bytes_from_hex(&share.xi, "xi")?;
    let secret_value = Scalar::<Secret, Zero>::from_bytes(value_bytes)
        .ok_or_else(|| RecoveryError::format("share value exceeds the curve order"))?;

    let public_key = match &share.public_key {
        Some(hex_str) => Some(parse_uncompressed_point(hex_str)?),
        None => None,
    };

    Ok(ShareRecord {
        share_id,
        share_id_hex: canonical_id_hex(&id_bytes),
        secret_value,
        public_key,
    })
}

/// Decode a hex scalar of up to 32 bytes, left-padded to a fixed array.
fn scalar_bytes_from_hex(hex_str: &str, field: &str) -> Result<[u8; 32]> {
    let padded;
    let even = if hex_str.len() % 2 == 1 {
        padded = format!("0{hex_str}");
        padded.as_str()
    } else {
        hex_str
    };
    let bytes = hex::decode(even)
        .map_err(|e| RecoveryError::format(format!("bad hex in share field `{field}`: {e}")))?;
    if bytes.len() > 32 {
        return Err(RecoveryError::format(format!(
            "share field `{field}` is {} bytes, expected at most 32",
            bytes.len()
        )));
    }
    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(&bytes);
    Ok(out)
}

fn parse_uncompressed_point(hex_str: &str) -> Result<Point> {
    let bytes = hex::decode(hex_str).map_err(|_| RecoveryError::InvalidPublicKey)?;
    let fixed: [u8; 65] = bytes.try_into().map_err(|_| RecoveryError::InvalidPublicKey)?;
    Point::from_bytes_uncompressed(fixed).ok_or(RecoveryError::InvalidPublicKey)
}

/// Lowercase hex of a 32-byte scalar with leading zero bytes stripped, the
/// form share IDs take both in share JSON and in the V2 string prefix.
fn canonical_id_hex(bytes: &[u8; 32]) -> String {
    let first = bytes.iter().position(|&b| b != 0).unwrap_or(31);
    hex::encode(&bytes[first..])
}

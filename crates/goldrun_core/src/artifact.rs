//! Define the binary artifact format: a flat run of 4-byte little-endian `i32` values.
//!
//! No header, no footer, no padding. The sorting benchmarks read and write this format.
//!
//! ## Notes
//! - A byte length that is not a multiple of 4 is rejected with [`ArtifactError::TrailingBytes`];
//!   a partial trailing group is never dropped.

use thiserror::Error;

/// Width in bytes of one encoded value.
pub const VALUE_WIDTH: usize = 4;

/// Errors produced while decoding an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArtifactError {
    /// The input ends in a partial value.
    #[error("artifact length {len} is not a multiple of 4 ({remainder} trailing byte(s))")]
    TrailingBytes { len: usize, remainder: usize },
}

/// Decode consecutive little-endian `i32` values, in order.
///
/// ## Parameters
/// - `bytes`: the full artifact contents.
///
/// ## Returns
/// - `Ok(Vec<i32>)`: one value per 4-byte group.
/// - `Err(ArtifactError::TrailingBytes)`: when `bytes.len() % 4 != 0`.
pub fn decode_i32_le(bytes: &[u8]) -> Result<Vec<i32>, ArtifactError> {
    let remainder = bytes.len() % VALUE_WIDTH;
    if remainder != 0 {
        return Err(ArtifactError::TrailingBytes {
            len: bytes.len(),
            remainder,
        });
    }

    Ok(bytes
        .chunks_exact(VALUE_WIDTH)
        .map(|chunk| i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Encode values in the artifact format.
pub fn encode_i32_le(values: &[i32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

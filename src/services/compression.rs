//! src/services/compression.rs
//!
//! Lossless content codec: LZ4 block format with the uncompressed length
//! prepended, so a stored artifact restores without side-channel metadata.
//! Compression is opportunistic; inputs that are tiny or that fail to
//! shrink are stored verbatim and flagged as such on the record.

use crate::errors::{MediaResult, MediaStoreError};
use bytes::Bytes;
use lz4::block::{self, CompressionMode};

/// Inputs below this size are stored verbatim. The frame overhead and the
/// extra decompression hop are not worth it for trivial payloads.
pub const MIN_COMPRESSIBLE_LEN: usize = 4096;

/// Highest level the high-compression mode accepts.
const MAX_HC_LEVEL: u32 = 12;

/// Compress `content` for storage.
///
/// Returns the bytes to store and whether the codec was applied. The codec
/// is skipped, returning the input unchanged and `false`, when the input is
/// smaller than [`MIN_COMPRESSIBLE_LEN`] or when the compressed form is not
/// strictly smaller than the original. Callers must record the flag; it is
/// the only way to tell the two representations apart later.
pub fn compress(content: &Bytes, level: u32) -> MediaResult<(Bytes, bool)> {
    if content.len() < MIN_COMPRESSIBLE_LEN {
        return Ok((content.clone(), false));
    }

    let compressed = block::compress(content, compression_mode(level), true)
        .map_err(MediaStoreError::Compression)?;

    if compressed.len() < content.len() {
        Ok((Bytes::from(compressed), true))
    } else {
        Ok((content.clone(), false))
    }
}

/// Restore bytes previously produced by [`compress`] with `applied = true`.
///
/// The original length is read back from the prepended frame header.
/// Feeding this function bytes that were stored verbatim is a caller
/// contract violation; the record's `content_compressed` flag is the
/// authority on which representation is on disk.
pub fn decompress(stored: &[u8]) -> MediaResult<Bytes> {
    let restored = block::decompress(stored, None).map_err(MediaStoreError::Decompression)?;
    Ok(Bytes::from(restored))
}

/// Map a configured level onto an LZ4 mode. Level 0 is the fast default;
/// anything above is clamped into the high-compression range.
fn compression_mode(level: u32) -> Option<CompressionMode> {
    if level == 0 {
        None
    } else {
        Some(CompressionMode::HIGHCOMPRESSION(
            level.min(MAX_HC_LEVEL) as i32
        ))
    }
}

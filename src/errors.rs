//! src/errors.rs
//!
//! Engine-wide error type. Every fallible operation in this crate returns
//! [`MediaResult`]; callers match on the variants to translate failures onto
//! their own surface (HTTP statuses, CLI messages, and so on). The engine
//! never retries internally, so each error reports the first failure as-is.

use crate::models::media::ContentKind;
use std::{io, path::PathBuf};
use thiserror::Error;

/// Failures surfaced by the storage and derivation engine.
#[derive(Debug, Error)]
pub enum MediaStoreError {
    #[error("media kind `{0}` does not support this operation")]
    UnsupportedMediaKind(ContentKind),
    #[error("media kind `{0}` is not allowed by configuration")]
    MediaKindDisallowed(ContentKind),
    #[error("name `{name}` invalid: {reason}")]
    InvalidName { name: String, reason: String },
    #[error("storage write failed for `{}`", .path.display())]
    StorageWriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("storage read failed for `{}`", .path.display())]
    StorageReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("placement `{}` is already occupied", .0.display())]
    PlacementCollision(PathBuf),
    #[error("thumbnail generation is disabled")]
    ThumbnailsDisabled,
    #[error("thumbnail derivation failed")]
    ThumbnailDerivationFailed(#[from] image::ImageError),
    #[error("compression failed")]
    Compression(#[source] io::Error),
    #[error("decompression failed")]
    Decompression(#[source] io::Error),
}

pub type MediaResult<T> = Result<T, MediaStoreError>;

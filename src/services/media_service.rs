//! src/services/media_service.rs
//!
//! MediaService — the engine's public surface. Coordinates classification,
//! the compression codec, on-disk placement, and thumbnail derivation into
//! the upload / read / thumbnail / delete lifecycle. Persisting records
//! between calls stays with the caller; the service hands back populated
//! `MediaRecord` values and mutates them when lazy derivation fills the
//! thumbnail cache.

use crate::config::MediaConfig;
use crate::errors::{MediaResult, MediaStoreError};
use crate::models::media::{ContentKind, MediaRecord};
use crate::services::{compression, content_store::ContentStore, thumbnails};
use bytes::Bytes;
use chrono::Utc;
use dashmap::DashMap;
use rand::{Rng, distributions::Alphanumeric};
use std::{
    io::{self, ErrorKind},
    path::PathBuf,
    sync::Arc,
};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// An upload: raw bytes plus the caller-facing identity of the item.
/// The engine generates the storage identifier itself.
#[derive(Clone, Debug)]
pub struct UploadRequest {
    /// Raw content exactly as received.
    pub content: Bytes,
    /// Display name, without its extension.
    pub name: String,
    /// File extension, without the leading dot.
    pub extension: String,
    /// Whether the item appears in public listings.
    pub public: bool,
}

/// Coordinates storage, compression, and derivation for media items.
///
/// Cheap to clone; clones share the placement root and the per-record
/// derivation locks. All methods are safe to call concurrently.
#[derive(Clone)]
pub struct MediaService {
    config: MediaConfig,
    store: ContentStore,
    /// One advisory lock per record id, created on demand for lazy
    /// derivation and dropped again when the locked access finishes,
    /// whether it published, reused a published file, or failed.
    derive_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl MediaService {
    /// Create a service storing artifacts beneath `base_path`.
    pub fn new(config: MediaConfig, base_path: impl Into<PathBuf>) -> Self {
        Self {
            config,
            store: ContentStore::new(base_path),
            derive_locks: Arc::new(DashMap::new()),
        }
    }

    /// The store managing this service's on-disk placements.
    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    /// The configuration this service was built with.
    pub fn config(&self) -> &MediaConfig {
        &self.config
    }

    /// Store new content and produce its media record.
    ///
    /// Classifies by extension, applies the codec when configured, and
    /// places the bytes under a freshly generated identifier. With eager
    /// derivation configured, a thumbnail is attempted from the raw bytes:
    /// failure is logged and leaves `thumbnail_path` unset while the upload
    /// itself still succeeds. Placement failures produce no record at all.
    pub async fn upload(&self, request: UploadRequest) -> MediaResult<MediaRecord> {
        let UploadRequest {
            content,
            name,
            extension,
            public,
        } = request;

        let kind = ContentKind::from_extension(&extension);
        self.ensure_kind_allowed(kind)?;

        let (stored, compressed) = if self.config.compression {
            compression::compress(&content, self.config.compression_level)?
        } else {
            (content.clone(), false)
        };

        let id = generate_id(self.config.id_length);
        let content_path = self
            .store
            .save_content(&stored, &id, &name, &extension, kind)
            .await?;

        let mut record = MediaRecord {
            id,
            name,
            extension,
            kind,
            content_path,
            thumbnail_path: None,
            content_compressed: compressed,
            content_size: stored.len() as i64,
            public,
            upload_date: Utc::now(),
        };

        if self.config.thumbnails
            && self.config.precompute_thumbnails
            && kind.supports_thumbnails()
        {
            match self.derive_and_store(&record, &content).await {
                Ok((path, _)) => record.thumbnail_path = Some(path),
                Err(err) => {
                    warn!(
                        "eager thumbnail derivation failed for `{}` ({}): {}",
                        record.file_name(),
                        record.id,
                        err
                    );
                }
            }
        }

        info!(
            "stored media `{}` ({}, {} bytes{})",
            record.file_name(),
            record.id,
            record.content_size,
            if record.content_compressed {
                ", compressed"
            } else {
                ""
            },
        );
        Ok(record)
    }

    /// Load the original content bytes for a record.
    ///
    /// Stored bytes pass back through the codec only when the record says
    /// they were compressed at upload.
    pub async fn get_content(&self, record: &MediaRecord) -> MediaResult<Bytes> {
        let stored = self.store.load(&record.content_path).await?;
        if record.content_compressed {
            compression::decompress(&stored)
        } else {
            Ok(stored)
        }
    }

    /// Serve the thumbnail for a record, deriving and caching it on first
    /// access.
    ///
    /// A cached `thumbnail_path` short-circuits every policy check. On a
    /// first access the service holds a per-record lock, so concurrent
    /// callers cost one derivation: whoever publishes first wins and the
    /// rest load the published file. On success the record's
    /// `thumbnail_path` is filled in; re-persisting the record is the
    /// caller's job.
    pub async fn get_thumbnail(&self, record: &mut MediaRecord) -> MediaResult<Bytes> {
        if let Some(path) = record.thumbnail_path.clone() {
            return self.store.load(&path).await;
        }
        if !self.config.thumbnails {
            return Err(MediaStoreError::ThumbnailsDisabled);
        }
        if !record.kind.supports_thumbnails() {
            return Err(MediaStoreError::UnsupportedMediaKind(record.kind));
        }

        let lock = self
            .derive_locks
            .entry(record.id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = lock.lock().await;
        let outcome = self.fill_thumbnail(record).await;

        // Entries exist only while an access is in flight; waiters keep
        // the mutex alive through their own clone.
        drop(guard);
        self.derive_locks.remove(&record.id);
        outcome
    }

    /// The locked half of `get_thumbnail`: reuse a thumbnail another
    /// caller published while this one waited, or derive and publish one.
    async fn fill_thumbnail(&self, record: &mut MediaRecord) -> MediaResult<Bytes> {
        let published = self.store.thumbnail_path(
            &record.id,
            &record.name,
            self.config.thumbnail_format,
            record.kind,
        );
        if self.store.exists(&published).await {
            let bytes = self.store.load(&published).await?;
            record.thumbnail_path = Some(published);
            return Ok(bytes);
        }

        let raw = self.get_content(record).await?;
        let (path, bytes) = self.derive_and_store(record, &raw).await?;
        record.thumbnail_path = Some(path);
        Ok(bytes)
    }

    /// Remove a record's stored artifacts.
    ///
    /// Idempotent end to end: already-missing files count as success, so a
    /// retry after a partial failure converges.
    pub async fn delete(&self, record: &MediaRecord) -> MediaResult<()> {
        self.store.delete(&record.content_path).await?;
        if let Some(thumbnail) = &record.thumbnail_path {
            self.store.delete(thumbnail).await?;
        }
        self.derive_locks.remove(&record.id);
        info!("deleted media `{}` ({})", record.file_name(), record.id);
        Ok(())
    }

    /// Apply the configured per-kind upload policy.
    fn ensure_kind_allowed(&self, kind: ContentKind) -> MediaResult<()> {
        let allowed = match kind {
            ContentKind::Image => self.config.allow_images,
            ContentKind::Video => self.config.allow_videos,
            ContentKind::Other => self.config.allow_other,
        };
        if allowed {
            Ok(())
        } else {
            Err(MediaStoreError::MediaKindDisallowed(kind))
        }
    }

    /// Derive a thumbnail from raw content bytes and publish it.
    ///
    /// The image work runs on the blocking pool so decoding and scaling
    /// never stall the async I/O path. Returns the placement and the
    /// derived bytes.
    async fn derive_and_store(
        &self,
        record: &MediaRecord,
        raw: &Bytes,
    ) -> MediaResult<(PathBuf, Bytes)> {
        let raw = raw.clone();
        let kind = record.kind;
        let max_width = self.config.thumbnail_width;
        let max_height = self.config.thumbnail_height;
        let format = self.config.thumbnail_format;

        let derived = tokio::task::spawn_blocking(move || {
            thumbnails::derive(&raw, max_width, max_height, kind, format)
        })
        .await
        .map_err(|err| {
            MediaStoreError::ThumbnailDerivationFailed(image::ImageError::IoError(io::Error::new(
                ErrorKind::Other,
                err,
            )))
        })??;

        let path = self
            .store
            .save_thumbnail(&derived, &record.id, &record.name, format, kind)
            .await?;
        Ok((path, derived))
    }
}

/// Random alphanumeric identifier of the requested length.
///
/// Uniqueness is probabilistic; the store's refusal to overwrite an
/// occupied placement backstops the unlucky case.
fn generate_id(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

//! src/services/content_store.rs
//!
//! ContentStore — deterministic on-disk placement for media content and
//! derived thumbnails. Artifacts live beneath
//! `base_path/{artifact}/{kind}/{shard}/{shard}/{id}/{file}` where the two
//! shard levels come from MD5 of the id/name pair. The store keeps no state
//! besides its base path; every placement is recomputable from record
//! fields alone.

use crate::errors::{MediaResult, MediaStoreError};
use crate::models::media::{ContentKind, ThumbnailFormat};
use bytes::Bytes;
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::debug;
use uuid::Uuid;

const MAX_COMPONENT_LEN: usize = 255;

/// Subtree holding stored content payloads.
const CONTENT_DIR: &str = "content";
/// Subtree holding derived thumbnails.
const THUMBNAIL_DIR: &str = "thumbnails";

/// Disk layout and file lifecycle for stored media.
///
/// All writes are atomic: bytes land in a hidden temp file which is fsynced
/// and then published into place, so readers can never observe a partial
/// artifact. Content publications refuse to replace an existing file;
/// thumbnail publications replace whole files only.
#[derive(Clone, Debug)]
pub struct ContentStore {
    /// Root directory managed by the store.
    base_path: PathBuf,
}

impl ContentStore {
    /// Create a store rooted at `base_path`. No I/O happens here;
    /// directories are created as artifacts arrive.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Root directory managed by this store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Reject values that cannot serve as a single path component.
    ///
    /// Identifiers, display names, and extensions all become path
    /// components, so they must not be empty, oversized, dot-prefixed, or
    /// carry separators, `..`, or control bytes.
    fn ensure_component_safe(&self, value: &str) -> MediaResult<()> {
        let invalid = |reason: &str| MediaStoreError::InvalidName {
            name: value.to_string(),
            reason: reason.to_string(),
        };
        if value.is_empty() {
            return Err(invalid("must not be empty"));
        }
        if value.len() > MAX_COMPONENT_LEN {
            return Err(invalid("must not exceed 255 bytes"));
        }
        if value.starts_with('.') {
            return Err(invalid("must not begin with a dot"));
        }
        if value.contains("..") || value.contains('/') || value.contains('\\') {
            return Err(invalid("must not contain path separators or `..`"));
        }
        if value.bytes().any(|b| b.is_ascii_control() || b == b'\0') {
            return Err(invalid("must not contain control characters"));
        }
        Ok(())
    }

    /// Generate two-level shard identifiers for an id/name pair.
    ///
    /// Uses MD5(id/name) and returns the first two bytes as lowercase
    /// hexadecimal strings (00-ff). Bounds the fan-out of any single
    /// directory regardless of library size.
    fn shards(id: &str, name: &str) -> (String, String) {
        let digest = md5::compute(format!("{}/{}", id, name));
        (format!("{:02x}", digest[0]), format!("{:02x}", digest[1]))
    }

    /// Placement of a content payload. Pure computation; nothing is
    /// created on disk.
    pub fn content_path(
        &self,
        id: &str,
        name: &str,
        extension: &str,
        kind: ContentKind,
    ) -> PathBuf {
        self.artifact_path(CONTENT_DIR, id, name, extension, kind)
    }

    /// Placement of the derived thumbnail for an id/name pair.
    pub fn thumbnail_path(
        &self,
        id: &str,
        name: &str,
        format: ThumbnailFormat,
        kind: ContentKind,
    ) -> PathBuf {
        self.artifact_path(THUMBNAIL_DIR, id, name, format.extension(), kind)
    }

    /// Combine base_path/{artifact}/{kind}/{shard}/{shard}/{id}/{name}.{ext}.
    /// Parent directories may not exist yet.
    fn artifact_path(
        &self,
        artifact: &str,
        id: &str,
        name: &str,
        extension: &str,
        kind: ContentKind,
    ) -> PathBuf {
        let (shard_a, shard_b) = Self::shards(id, name);
        let mut path = self.base_path.clone();
        path.push(artifact);
        path.push(kind.as_str());
        path.push(shard_a);
        path.push(shard_b);
        path.push(id);
        path.push(format!("{}.{}", name, extension));
        path
    }

    /// Store a content payload at its computed placement.
    ///
    /// The destination must be vacant: publication uses a hard link, which
    /// fails atomically if another writer got there first, so an occupied
    /// placement surfaces as `PlacementCollision` and never as an
    /// overwrite.
    pub async fn save_content(
        &self,
        bytes: &Bytes,
        id: &str,
        name: &str,
        extension: &str,
        kind: ContentKind,
    ) -> MediaResult<PathBuf> {
        self.ensure_component_safe(id)?;
        self.ensure_component_safe(name)?;
        self.ensure_component_safe(extension)?;

        let path = self.content_path(id, name, extension, kind);
        self.write_atomic(&path, bytes, false).await?;
        debug!("stored content at {}", path.display());
        Ok(path)
    }

    /// Store a derived thumbnail at its computed placement.
    ///
    /// Publication is a rename. Concurrent derivations of the same record
    /// produce identical bytes, so the last writer winning is harmless and
    /// readers still only ever see a complete file.
    pub async fn save_thumbnail(
        &self,
        bytes: &Bytes,
        id: &str,
        name: &str,
        format: ThumbnailFormat,
        kind: ContentKind,
    ) -> MediaResult<PathBuf> {
        self.ensure_component_safe(id)?;
        self.ensure_component_safe(name)?;

        let path = self.thumbnail_path(id, name, format, kind);
        self.write_atomic(&path, bytes, true).await?;
        debug!("stored thumbnail at {}", path.display());
        Ok(path)
    }

    /// Read a stored artifact in full.
    ///
    /// A missing or unreadable file is `StorageReadFailed`; the caller
    /// holding a record for it means the metadata and the disk disagree.
    pub async fn load(&self, path: &Path) -> MediaResult<Bytes> {
        match fs::read(path).await {
            Ok(bytes) => Ok(Bytes::from(bytes)),
            Err(source) => Err(MediaStoreError::StorageReadFailed {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Whether a published artifact exists at `path`.
    pub async fn exists(&self, path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    /// Remove a stored artifact.
    ///
    /// Idempotent: a missing file is success. After a removal, empty shard
    /// directories are pruned back toward the store root so abandoned
    /// placements do not accumulate.
    pub async fn delete(&self, path: &Path) -> MediaResult<()> {
        match fs::remove_file(path).await {
            Ok(()) => debug!("removed {}", path.display()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("{} already missing", path.display());
            }
            Err(source) => {
                return Err(MediaStoreError::StorageWriteFailed {
                    path: path.to_path_buf(),
                    source,
                });
            }
        }

        if let Some(parent) = path.parent() {
            self.prune_empty_dirs(parent).await;
        }
        Ok(())
    }

    /// Write `bytes` to `path` via a hidden temp file in the same
    /// directory.
    ///
    /// The temp file is flushed and fsynced before publication. With
    /// `replace` the publication is a rename; without it the publication is
    /// a hard link that reports `PlacementCollision` when the destination
    /// already exists. The temp file is removed on every failure path.
    async fn write_atomic(&self, path: &Path, bytes: &[u8], replace: bool) -> MediaResult<()> {
        let write_failed = |source: io::Error| MediaStoreError::StorageWriteFailed {
            path: path.to_path_buf(),
            source,
        };

        let parent = path.parent().map(Path::to_path_buf).ok_or_else(|| {
            write_failed(io::Error::new(
                ErrorKind::Other,
                "placement missing parent directory",
            ))
        })?;
        fs::create_dir_all(&parent).await.map_err(write_failed)?;

        let tmp_path = parent.join(format!(".tmp-{}", Uuid::new_v4()));
        let mut file = create_temp_file(&tmp_path).await.map_err(write_failed)?;
        if let Err(err) = file.write_all(bytes).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(write_failed(err));
        }
        if let Err(err) = file.flush().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(write_failed(err));
        }
        if let Err(err) = file.sync_all().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(write_failed(err));
        }
        drop(file);

        if replace {
            if let Err(err) = fs::rename(&tmp_path, path).await {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(write_failed(err));
            }
            return Ok(());
        }

        let linked = fs::hard_link(&tmp_path, path).await;
        let _ = fs::remove_file(&tmp_path).await;
        match linked {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                Err(MediaStoreError::PlacementCollision(path.to_path_buf()))
            }
            Err(err) => Err(write_failed(err)),
        }
    }

    /// Recursively remove empty directories up to the store root.
    ///
    /// Stops when:
    /// - directory not empty
    /// - directory not found
    /// - reached the root
    /// - encountered unexpected I/O errors
    async fn prune_empty_dirs(&self, start: &Path) {
        let mut current = start.to_path_buf();
        while current.starts_with(&self.base_path) && current != self.base_path {
            match fs::remove_dir(&current).await {
                Ok(()) => {
                    if let Some(parent) = current.parent() {
                        current = parent.to_path_buf();
                    } else {
                        break;
                    }
                }
                Err(err) if err.kind() == ErrorKind::NotFound => break,
                Err(err) if err.kind() == ErrorKind::DirectoryNotEmpty => break,
                Err(err) => {
                    debug!("failed to prune directory {}: {}", current.display(), err);
                    break;
                }
            }
        }
    }
}

/// Create a hidden temp file, restoring its parent directory when a delete
/// pruned it between `create_dir_all` and the creation. Once the temp file
/// lands the directory is non-empty and pruning can no longer touch it.
async fn create_temp_file(path: &Path) -> io::Result<File> {
    match File::create(path).await {
        Err(err) if err.kind() == ErrorKind::NotFound => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).await?;
            }
            File::create(path).await
        }
        result => result,
    }
}

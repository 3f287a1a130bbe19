//! Content storage and derivation engine for self-hosted media servers.
//!
//! This crate owns the byte-level side of a media server: where uploaded
//! content lives on disk, whether it is transparently compressed, and how
//! thumbnails are derived and cached. Request routing, authentication, and
//! record persistence belong to the embedding application; the engine takes
//! raw bytes plus a [`MediaConfig`] and hands back [`MediaRecord`] values
//! describing what it stored.
//!
//! # Features
//!
//! - **Deterministic placement**: artifacts live under a sharded,
//!   self-describing path computed from the record's identity alone
//! - **Transparent compression**: LZ4 with a skip-if-not-smaller policy,
//!   recorded per item so reads are unambiguous
//! - **Thumbnail caching**: lazy or eager derivation, one derivation per
//!   record even under concurrent first reads
//! - **Atomic writes**: temp-file publication throughout, so readers never
//!   observe partial artifacts and uploads never silently overwrite
//!
//! # Example
//!
//! ```rust
//! use bytes::Bytes;
//! use media_store::{MediaConfig, MediaService, UploadRequest};
//!
//! # async fn example() -> Result<(), media_store::MediaStoreError> {
//! let service = MediaService::new(MediaConfig::default(), "/srv/media");
//!
//! let record = service
//!     .upload(UploadRequest {
//!         content: Bytes::from_static(b"raw image bytes"),
//!         name: "sunset".into(),
//!         extension: "png".into(),
//!         public: true,
//!     })
//!     .await?;
//!
//! let original = service.get_content(&record).await?;
//! assert_eq!(original.len(), 15);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod errors;
pub mod models;
pub mod services;

pub use config::MediaConfig;
pub use errors::{MediaResult, MediaStoreError};
pub use models::media::{ContentKind, MediaRecord, ThumbnailFormat, mime_for_extension};
pub use services::content_store::ContentStore;
pub use services::media_service::{MediaService, UploadRequest};

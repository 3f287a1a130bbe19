//! Service layer: the compression codec, thumbnail derivation, the on-disk
//! content store, and the lifecycle coordinator tying them together.

pub mod compression;
pub mod content_store;
pub mod media_service;
pub mod thumbnails;

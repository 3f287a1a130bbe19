//! Core data models for the media storage engine.
//!
//! These entities describe stored media items and their classification.
//! They carry `serde` derives so callers can persist records in whatever
//! metadata store they own.

pub mod media;

//! Artefact identity, layout, download, and extraction.
//!
//! # Sub-modules
//!
//! - [`error`]: Validation errors for identifiers.
//! - [`identifier`]: Artifact, collection, and version newtypes.
//! - [`target`]: The closed set of platform targets (`PlatformTarget`).
//! - [`mapping`]: Archive-to-destination path resolution.
//! - [`download`]: Archive fetch trait and HTTP implementation.
//! - [`extraction`]: Zip extraction with path traversal protection.

pub mod download;
pub mod error;
pub mod extraction;
pub mod identifier;
pub mod mapping;
pub mod target;

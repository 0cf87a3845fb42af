//! Error types for artefact identifiers.
//!
//! Each variant names the rejected input and the constraint it violated so
//! configuration mistakes can be fixed without reading the source.

use thiserror::Error;

/// Errors arising from invalid artefact-related values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArtefactError {
    /// An identifier cannot be used as a URL path segment or file name.
    #[error("invalid {kind} \"{value}\": {reason}")]
    InvalidIdentifier {
        /// Which identifier was being constructed (artifact, collection, version).
        kind: &'static str,
        /// The rejected value.
        value: String,
        /// Description of the violated constraint.
        reason: &'static str,
    },
}

/// Result type alias using [`ArtefactError`].
pub type Result<T> = std::result::Result<T, ArtefactError>;

//! Error types for the provisioner CLI.
//!
//! Stage failures (fetch, extraction, installation) never reach this level:
//! the orchestrator folds them into per-request outcomes. What remains are
//! failures that stop the run before or after provisioning.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that abort a provisioner run.
#[derive(Debug, Error)]
pub enum ProvisionerError {
    /// An explicitly requested configuration file does not exist.
    #[error("configuration file {path} not found")]
    ConfigNotFound {
        /// The path that was requested.
        path: Utf8PathBuf,
    },

    /// The configuration file could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    ConfigRead {
        /// The configuration path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML or has unknown keys.
    #[error("invalid configuration file {path}: {source}")]
    ConfigParse {
        /// The configuration path.
        path: Utf8PathBuf,
        /// The parse error.
        #[source]
        source: Box<toml::de::Error>,
    },

    /// The configuration names no collections.
    #[error("configuration does not name any collection to provision")]
    NoCollections,

    /// The report could not be serialised.
    #[error("failed to render report: {0}")]
    Report(#[from] serde_json::Error),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// One or more requests could not be satisfied.
    #[error("{failed} of {total} collections could not be provisioned")]
    Unsatisfied {
        /// Number of failed requests.
        failed: usize,
        /// Number of requests.
        total: usize,
    },

    /// A `--check` run found missing files.
    #[error("{count} native libraries are missing")]
    Missing {
        /// Number of missing destination files.
        count: usize,
    },
}

/// Convenience result alias for provisioner operations.
pub type Result<T> = std::result::Result<T, ProvisionerError>;

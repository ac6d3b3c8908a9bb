//! Unified error types for the twinpack workspace.
//!
//! Every failure is raised at composition time and aborts the build: no
//! partial graph is ever handed to the bundler.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Neither or both of the service/view flags were set.
    #[error("ambiguous target: exactly one of service/view must be set (service={service}, view={view})")]
    AmbiguousTarget {
        /// Value of the service flag.
        service: bool,
        /// Value of the view flag.
        view: bool,
    },

    /// The main entry does not live under the input root.
    #[error("main entry {entry} is outside the input root {root}")]
    EntryOutsideRoot {
        /// Normalized main entry path.
        entry: PathBuf,
        /// Normalized input root.
        root: PathBuf,
    },

    /// Two provide bindings claim the same free identifier.
    #[error("duplicate provide binding for identifier \"{key}\"")]
    DuplicateProvideKey {
        /// Colliding identifier.
        key: String,
    },

    /// The main entry could not be resolved to a file.
    #[error("unresolved main entry: {message}")]
    UnresolvedMainEntry {
        /// Why the entry could not be resolved.
        message: String,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, ConfigError>;

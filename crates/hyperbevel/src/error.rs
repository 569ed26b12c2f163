//! Error types for bevel sessions, config and settings.

use std::path::PathBuf;

use hyperbevel_analyze::AnalyzeError;
use hyperbevel_cutter::CutterError;
use hyperbevel_mesh::MeshError;
use thiserror::Error;

/// Errors surfaced by the session crate.
#[derive(Error, Debug)]
pub enum HyperBevelError {
    /// Reading or writing a config or settings file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A config or settings file is not valid TOML for its record.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },

    /// TOML text without a backing file failed to parse.
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// Settings could not be serialized.
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// No cutter object with this name.
    #[error("no cutter named {0:?}")]
    UnknownCutter(String),

    /// The cutter has no host boolean to recover its polarity from.
    #[error("cutter {0:?} has no host boolean")]
    MissingBoolean(String),

    /// Mesh construction failed.
    #[error(transparent)]
    Mesh(#[from] MeshError),

    /// Sequence analysis failed.
    #[error(transparent)]
    Analyze(#[from] AnalyzeError),

    /// Cutter construction, reopen or editing failed.
    #[error(transparent)]
    Cutter(#[from] CutterError),
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, HyperBevelError>;

//! Error types for each pipeline stage.
//!
//! Every variant that concerns a file carries its path so a failed run can be
//! diagnosed from the message alone.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Directory enumeration failed.
#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("directory not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// A single file could not be turned into a feature record.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unrecognised audio format in {}: {source}", .path.display())]
    Probe {
        path: PathBuf,
        #[source]
        source: symphonia::core::errors::Error,
    },

    #[error("no audio track in {}", .0.display())]
    NoAudioTrack(PathBuf),

    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: symphonia::core::errors::Error,
    },

    #[error("no audio samples decoded from {}", .0.display())]
    Empty(PathBuf),

    #[error("invalid {field} value computed for {}", .path.display())]
    NonFinite { path: PathBuf, field: &'static str },

    #[error("extraction worker for {} panicked", .0.display())]
    Worker(PathBuf),
}

impl ExtractionError {
    /// The file this error refers to.
    pub fn path(&self) -> &std::path::Path {
        match self {
            ExtractionError::Open { path, .. }
            | ExtractionError::Probe { path, .. }
            | ExtractionError::Decode { path, .. }
            | ExtractionError::NonFinite { path, .. } => path,
            ExtractionError::NoAudioTrack(path)
            | ExtractionError::Empty(path)
            | ExtractionError::Worker(path) => path,
        }
    }
}

/// Two fingerprints of different lengths were compared.
#[derive(Debug, Clone, PartialEq, Error)]
#[error(
    "fingerprint length mismatch: {} has {from_len} values, {} has {to_len}",
    .from.display(),
    .to.display()
)]
pub struct DimensionMismatch {
    pub from: PathBuf,
    pub to: PathBuf,
    pub from_len: usize,
    pub to_len: usize,
}

/// Any failure that aborts a playlist run.
#[derive(Debug, Error)]
pub enum PlaylistError {
    #[error(transparent)]
    Collection(#[from] CollectionError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Sequencing(#[from] DimensionMismatch),
}

/// Loading, saving or resolving configuration failed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("HOME environment variable not set")]
    NoHome,

    #[error("config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialise config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

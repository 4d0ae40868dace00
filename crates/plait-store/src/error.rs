//! Error types for fragment storage operations.

use std::path::PathBuf;

/// Errors that can occur while storing or loading fragments.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An I/O error occurred.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The metadata file of an object does not exist.
    #[error("metadata not found: {}", .0.display())]
    MetaNotFound(PathBuf),

    /// The metadata file could not be parsed.
    #[error("invalid metadata: {0}")]
    MetaParse(#[from] toml::de::Error),

    /// The metadata could not be serialised.
    #[error("failed to serialise metadata: {0}")]
    MetaSerialize(#[from] toml::ser::Error),

    /// The object name has no usable file stem.
    #[error("invalid object name: {0:?}")]
    InvalidName(String),

    /// A fragment index is outside `0..k+m`.
    #[error("fragment {index} out of range for {count} fragments")]
    FragmentIndex { index: usize, count: usize },

    /// Data written for a fragment does not match the recorded digest.
    #[error("fragment {index} does not match its recorded digest")]
    DigestMismatch { index: usize },
}

//! Error types for base-code operations.

use plait_gf::GfError;

/// Errors that can occur while building a coding descriptor or while
/// encoding/decoding one stripe of blocks.
#[derive(Debug, thiserror::Error)]
pub enum CodeError {
    /// The technique exists but cannot be built by this library.
    #[error("unsupported technique: {0}")]
    UnsupportedTechnique(String),

    /// The (k, m, w, packetsize) combination is not valid for the technique.
    #[error("invalid coding parameters: {0}")]
    InvalidParameters(String),

    /// Blocks passed to a stripe operation have inconsistent sizes.
    #[error("invalid block layout: {0}")]
    BlockLayout(String),

    /// Too many erasures, or the surviving blocks do not determine the data.
    #[error("stripe is unrecoverable: {0}")]
    Unrecoverable(String),

    /// The GF(2^8) Reed-Solomon backend returned an error.
    #[error("reed-solomon error: {0}")]
    ReedSolomon(String),

    /// The GF(2^16) Reed-Solomon backend returned an error.
    #[error("reed-solomon-simd error: {0}")]
    Simd(#[from] reed_solomon_simd::Error),

    /// Field arithmetic was misused.
    #[error("field error: {0}")]
    Field(#[from] GfError),
}

impl CodeError {
    /// Whether this error describes bad configuration rather than bad data.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            CodeError::UnsupportedTechnique(_) | CodeError::InvalidParameters(_)
        )
    }
}

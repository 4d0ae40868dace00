//! Error types for the layered codec.

use plait_code::CodeError;
use plait_gf::GfError;
use plait_types::ObjectId;

/// Errors that can occur while encoding, decoding or repairing an object.
///
/// Every error is terminal for the object: no partial output is produced.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Parameters or geometry are invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The base code failed outside of a layer decode.
    #[error("base code error: {0}")]
    Code(CodeError),

    /// More fragments are erased than the code tolerates.
    #[error("insufficient fragments: {erased} erased, at most {tolerance} tolerated")]
    InsufficientFragments {
        /// Number of erased fragments.
        erased: usize,
        /// Number of coding fragments (m).
        tolerance: usize,
    },

    /// A coupled cell could not be resolved because its partner layer was
    /// not decoded yet.
    #[error("coupling unresolvable at layer {layer}, column {column}")]
    CouplingUnresolvable { layer: usize, column: usize },

    /// The base decoder rejected one layer.
    #[error("base decode failed at layer {layer}: {source}")]
    BaseDecodeFailure {
        layer: usize,
        #[source]
        source: CodeError,
    },

    /// The decoded object does not match its recorded digest.
    #[error("decoded object digest mismatch: expected {expected}, got {actual}")]
    Integrity { expected: ObjectId, actual: ObjectId },

    /// A repaired fragment does not match its recorded digest.
    #[error("repaired fragment {index} does not match its recorded digest")]
    RepairMismatch { index: usize },

    /// Field arithmetic failed during the coupling transform.
    #[error("field error: {0}")]
    Field(#[from] GfError),

    /// Reading a fragment failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CodeError> for CodecError {
    fn from(e: CodeError) -> Self {
        if e.is_config() {
            CodecError::Config(e.to_string())
        } else {
            CodecError::Code(e)
        }
    }
}

//! Error types for field arithmetic.

/// Errors that can occur when using GF(2^w) arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GfError {
    /// The word size is outside 1..=32.
    #[error("unsupported field width w={0}: expected 1..=32")]
    UnsupportedWidth(u32),

    /// Region operations only exist for byte-aligned words.
    #[error("region operations require w in {{8, 16, 32}}, got w={0}")]
    UnsupportedRegionWidth(u32),

    /// Division (or inversion) by the zero element.
    #[error("division by zero in GF(2^{0})")]
    DivideByZero(u32),

    /// Source and destination regions differ in length.
    #[error("region length mismatch: src={src}, dst={dst}")]
    LengthMismatch { src: usize, dst: usize },

    /// Region length is not a whole number of field words.
    #[error("region of {len} bytes is not a multiple of the {word}-byte word size")]
    Misaligned { len: usize, word: usize },
}

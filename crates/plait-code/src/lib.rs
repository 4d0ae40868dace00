//! Base erasure codes applied to one layer of blocks.
//!
//! This crate provides:
//! - [`build_descriptor`]: validates `(k, m, w, technique, packetsize)` and
//!   builds a [`CodingDescriptor`] for it.
//! - [`StripeCoder`]: the narrow interface the layer codec drives, with
//!   `encode_stripe` and `decode_stripe`.
//!
//! Backends: `reed-solomon-erasure` for GF(2^8) Reed-Solomon,
//! `reed-solomon-simd` for GF(2^16), a dense matrix engine for GF(2^32)
//! Vandermonde and RAID-6, and a packet bitmatrix engine with XOR schedules
//! for Cauchy, Liberation, Blaum-Roth and Liber8tion codes.

pub mod bitmatrix;
mod dense;
mod error;
pub mod matrix;
mod rs16;
mod rs8;
mod technique;

pub use error::CodeError;
pub use technique::{CodingDescriptor, WORD_ALIGNMENT, block_alignment, build_descriptor, validate};

use plait_types::CodeParams;

/// A systematic `(k, m)` erasure code over one stripe of `k + m` blocks.
///
/// All blocks of a call share one length, which must be a multiple of the
/// code's block alignment.
pub trait StripeCoder: Send + Sync {
    /// Parameters this coder was built for.
    fn params(&self) -> &CodeParams;

    /// Compute the `m` coding blocks from the `k` data blocks.
    fn encode_stripe(&self, data: &[&[u8]], coding: &mut [&mut [u8]]) -> Result<(), CodeError>;

    /// Restore every block listed in `erasures`, data and coding, in place.
    ///
    /// The contents of erased blocks on entry are ignored.
    fn decode_stripe(&self, blocks: &mut [&mut [u8]], erasures: &[usize]) -> Result<(), CodeError>;
}

/// Check block count, equal lengths and alignment.
pub(crate) fn check_blocks(
    lens: impl Iterator<Item = usize>,
    expected: usize,
    align: usize,
) -> Result<(), CodeError> {
    let mut count = 0;
    let mut size = None;
    for len in lens {
        count += 1;
        match size {
            None => size = Some(len),
            Some(s) if s != len => {
                return Err(CodeError::BlockLayout(format!(
                    "blocks differ in length: {s} vs {len}"
                )));
            }
            Some(_) => {}
        }
    }
    if count != expected {
        return Err(CodeError::BlockLayout(format!(
            "expected {expected} blocks, got {count}"
        )));
    }
    if let Some(len) = size
        && (len == 0 || !len.is_multiple_of(align))
    {
        return Err(CodeError::BlockLayout(format!(
            "block length {len} is not a positive multiple of {align}"
        )));
    }
    Ok(())
}

/// Check that erasure indices are in range, distinct and at most `m`.
pub(crate) fn check_erasures(erasures: &[usize], k: usize, m: usize) -> Result<(), CodeError> {
    if erasures.len() > m {
        return Err(CodeError::Unrecoverable(format!(
            "{} erasures exceed the {m} coding blocks",
            erasures.len()
        )));
    }
    for (i, &e) in erasures.iter().enumerate() {
        if e >= k + m {
            return Err(CodeError::BlockLayout(format!(
                "erasure index {e} out of range for {} blocks",
                k + m
            )));
        }
        if erasures[..i].contains(&e) {
            return Err(CodeError::BlockLayout(format!("erasure index {e} repeated")));
        }
    }
    Ok(())
}

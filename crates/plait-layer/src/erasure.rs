//! Erasure bookkeeping and per-stripe block assembly.

use tracing::warn;

use crate::arena::BlockArena;
use crate::error::CodecError;
use crate::layout::StripeLayout;
use crate::source::FragmentSource;

/// Sorted, duplicate-free list of erased fragment indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErasureList(Vec<usize>);

impl ErasureList {
    pub fn new(mut indices: Vec<usize>) -> Self {
        indices.sort_unstable();
        indices.dedup();
        Self(indices)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.0.binary_search(&index).is_ok()
    }

    /// Mark one more fragment as erased.
    pub fn insert(&mut self, index: usize) {
        if let Err(at) = self.0.binary_search(&index) {
            self.0.insert(at, index);
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Fail with [`CodecError::InsufficientFragments`] past `tolerance`.
    pub fn check(&self, tolerance: usize) -> Result<(), CodecError> {
        if self.len() > tolerance {
            return Err(CodecError::InsufficientFragments {
                erased: self.len(),
                tolerance,
            });
        }
        Ok(())
    }
}

/// Collect the erased indices of `presence`, rejecting more than `m`.
pub fn mark_erasures(presence: &[bool], m: usize) -> Result<ErasureList, CodecError> {
    let erased = presence
        .iter()
        .enumerate()
        .filter(|(_, present)| !**present)
        .map(|(i, _)| i)
        .collect();
    let list = ErasureList::new(erased);
    list.check(m)?;
    Ok(list)
}

/// Read stripe `stripe` of every non-erased fragment into a fresh arena.
///
/// Erased cells stay zero. A fragment whose read fails is added to
/// `erasures`.
pub fn assemble_layers<S: FragmentSource + ?Sized>(
    source: &S,
    layout: &StripeLayout,
    stripe: usize,
    erasures: &mut ErasureList,
) -> Result<BlockArena, CodecError> {
    let mut arena = BlockArena::new(layout.layers, layout.n(), layout.blocksize);
    let mut segment = vec![0u8; layout.segment_len()];
    let offset = layout.block_offset(stripe, 0);

    for fragment in 0..layout.n() {
        if erasures.contains(fragment) {
            continue;
        }
        match source.read_at(fragment, offset, &mut segment) {
            Ok(()) => arena.column_from(fragment, &segment),
            Err(e) => {
                warn!(fragment, stripe, error = %e, "fragment unreadable, treating as erased");
                erasures.insert(fragment);
            }
        }
    }
    erasures.check(layout.m)?;
    Ok(arena)
}

//! GF(2^8) Reed-Solomon backed by `reed-solomon-erasure`.

use std::fmt;

use reed_solomon_erasure::galois_8::ReedSolomon;

use crate::error::CodeError;
use crate::{check_blocks, check_erasures};

fn rs_error(e: reed_solomon_erasure::Error) -> CodeError {
    CodeError::ReedSolomon(format!("{e:?}"))
}

/// Vandermonde-derived Reed-Solomon over GF(2^8).
pub struct Rs8Coder {
    k: usize,
    m: usize,
    rs: ReedSolomon,
}

impl fmt::Debug for Rs8Coder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rs8Coder")
            .field("k", &self.k)
            .field("m", &self.m)
            .finish_non_exhaustive()
    }
}

impl Rs8Coder {
    pub fn new(k: usize, m: usize) -> Result<Self, CodeError> {
        let rs = ReedSolomon::new(k, m).map_err(rs_error)?;
        Ok(Self { k, m, rs })
    }

    pub fn encode(&self, data: &[&[u8]], coding: &mut [&mut [u8]]) -> Result<(), CodeError> {
        let lens = data.iter().map(|b| b.len()).chain(coding.iter().map(|b| b.len()));
        check_blocks(lens, self.k + self.m, 1)?;
        self.rs.encode_sep(data, coding).map_err(rs_error)
    }

    pub fn decode(&self, blocks: &mut [&mut [u8]], erasures: &[usize]) -> Result<(), CodeError> {
        check_blocks(blocks.iter().map(|b| b.len()), self.k + self.m, 1)?;
        check_erasures(erasures, self.k, self.m)?;
        if erasures.is_empty() {
            return Ok(());
        }

        let mut shards: Vec<Option<Vec<u8>>> = blocks
            .iter()
            .enumerate()
            .map(|(i, b)| (!erasures.contains(&i)).then(|| b.to_vec()))
            .collect();
        self.rs.reconstruct(&mut shards).map_err(rs_error)?;

        for &e in erasures {
            let restored = shards[e]
                .as_deref()
                .ok_or_else(|| CodeError::Unrecoverable(format!("block {e} not reconstructed")))?;
            blocks[e].copy_from_slice(restored);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_with_mixed_erasures() {
        let coder = Rs8Coder::new(3, 2).unwrap();
        let mut blocks: Vec<Vec<u8>> = (0..5u8).map(|i| vec![i.wrapping_mul(37); 24]).collect();
        {
            let (data, coding) = blocks.split_at_mut(3);
            let inputs: Vec<&[u8]> = data.iter().map(|b| b.as_slice()).collect();
            let mut outputs: Vec<&mut [u8]> = coding.iter_mut().map(|b| b.as_mut_slice()).collect();
            coder.encode(&inputs, &mut outputs).unwrap();
        }
        let original = blocks.clone();
        blocks[1].fill(0);
        blocks[4].fill(0);
        let mut refs: Vec<&mut [u8]> = blocks.iter_mut().map(|b| b.as_mut_slice()).collect();
        coder.decode(&mut refs, &[1, 4]).unwrap();
        assert_eq!(blocks, original);
    }

    #[test]
    fn test_rejects_too_many_fragments() {
        assert!(Rs8Coder::new(200, 100).is_err());
    }
}

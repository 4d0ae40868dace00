//! GF(2^16) Reed-Solomon backed by `reed-solomon-simd`.
//!
//! The library only restores original (data) shards, so lost coding
//! blocks are recomputed by re-encoding the repaired data.

use tracing::debug;

use crate::error::CodeError;
use crate::{check_blocks, check_erasures};

/// Reed-Solomon over GF(2^16). Blocks must have an even length.
#[derive(Debug, Clone)]
pub struct Rs16Coder {
    k: usize,
    m: usize,
}

impl Rs16Coder {
    pub fn new(k: usize, m: usize) -> Self {
        Self { k, m }
    }

    pub fn encode(&self, data: &[&[u8]], coding: &mut [&mut [u8]]) -> Result<(), CodeError> {
        let lens = data.iter().map(|b| b.len()).chain(coding.iter().map(|b| b.len()));
        check_blocks(lens, self.k + self.m, 2)?;
        let recovery = reed_solomon_simd::encode(self.k, self.m, data)?;
        for (out, rec) in coding.iter_mut().zip(&recovery) {
            out.copy_from_slice(rec);
        }
        Ok(())
    }

    pub fn decode(&self, blocks: &mut [&mut [u8]], erasures: &[usize]) -> Result<(), CodeError> {
        let k = self.k;
        check_blocks(blocks.iter().map(|b| b.len()), k + self.m, 2)?;
        check_erasures(erasures, k, self.m)?;

        let lost_data: Vec<usize> = erasures.iter().copied().filter(|&e| e < k).collect();
        if !lost_data.is_empty() {
            let restored = {
                let mut originals: Vec<(usize, &[u8])> = Vec::new();
                let mut recovery: Vec<(usize, &[u8])> = Vec::new();
                for (i, block) in blocks.iter().enumerate() {
                    if erasures.contains(&i) {
                        continue;
                    }
                    if i < k {
                        originals.push((i, &**block));
                    } else {
                        recovery.push((i - k, &**block));
                    }
                }
                debug!(
                    k,
                    m = self.m,
                    originals = originals.len(),
                    recovery = recovery.len(),
                    "restoring data blocks"
                );
                reed_solomon_simd::decode(k, self.m, originals, recovery)?
            };
            for &j in &lost_data {
                let block = restored
                    .get(&j)
                    .ok_or_else(|| CodeError::Unrecoverable(format!("block {j} not restored")))?;
                blocks[j].copy_from_slice(block);
            }
        }

        if erasures.iter().any(|&e| e >= k) {
            let recovery = {
                let data: Vec<&[u8]> = blocks[..k].iter().map(|b| &**b).collect();
                reed_solomon_simd::encode(k, self.m, &data)?
            };
            for &c in erasures.iter().filter(|&&e| e >= k) {
                blocks[c].copy_from_slice(&recovery[c - k]);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(k: usize, m: usize, blocksize: usize) -> Vec<Vec<u8>> {
        let mut blocks: Vec<Vec<u8>> = (0..k + m)
            .map(|i| (0..blocksize).map(|b| (b * 31 + i * 7) as u8).collect())
            .collect();
        let coder = Rs16Coder::new(k, m);
        let (data, coding) = blocks.split_at_mut(k);
        let inputs: Vec<&[u8]> = data.iter().map(|b| b.as_slice()).collect();
        let mut outputs: Vec<&mut [u8]> = coding.iter_mut().map(|b| b.as_mut_slice()).collect();
        coder.encode(&inputs, &mut outputs).unwrap();
        blocks
    }

    #[test]
    fn test_restores_data_and_coding() {
        let original = encoded(4, 2, 64);
        let coder = Rs16Coder::new(4, 2);
        let mut damaged = original.clone();
        damaged[0].fill(0);
        damaged[5].fill(0);
        let mut refs: Vec<&mut [u8]> = damaged.iter_mut().map(|b| b.as_mut_slice()).collect();
        coder.decode(&mut refs, &[0, 5]).unwrap();
        assert_eq!(damaged, original);
    }

    #[test]
    fn test_only_coding_lost() {
        let original = encoded(3, 3, 16);
        let coder = Rs16Coder::new(3, 3);
        let mut damaged = original.clone();
        for i in 3..6 {
            damaged[i].fill(0);
        }
        let mut refs: Vec<&mut [u8]> = damaged.iter_mut().map(|b| b.as_mut_slice()).collect();
        coder.decode(&mut refs, &[3, 4, 5]).unwrap();
        assert_eq!(damaged, original);
    }

    #[test]
    fn test_odd_blocks_rejected() {
        let coder = Rs16Coder::new(2, 1);
        let data = [&[1u8, 2, 3][..], &[4, 5, 6][..]];
        let mut parity = vec![0u8; 3];
        let mut coding = [parity.as_mut_slice()];
        assert!(matches!(
            coder.encode(&data, &mut coding),
            Err(CodeError::BlockLayout(_))
        ));
    }
}

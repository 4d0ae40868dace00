//! Word-oriented matrix codes over GF(2^w).

use plait_gf::Galois;

use crate::error::CodeError;
use crate::matrix::invert;
use crate::{check_blocks, check_erasures};

/// A systematic code defined by an `m x k` coding matrix over GF(2^w),
/// applied word by word with region multiplies.
#[derive(Debug, Clone)]
pub struct MatrixCoder {
    k: usize,
    m: usize,
    gf: Galois,
    matrix: Vec<u32>,
}

impl MatrixCoder {
    pub fn new(k: usize, m: usize, gf: Galois, matrix: Vec<u32>) -> Self {
        Self { k, m, gf, matrix }
    }

    fn word(&self) -> usize {
        (self.gf.width() / 8) as usize
    }

    /// `out = sum(row[j] * inputs[j])`.
    fn dot(&self, row: &[u32], inputs: &[&[u8]], out: &mut [u8]) -> Result<(), CodeError> {
        out.fill(0);
        for (&coef, input) in row.iter().zip(inputs) {
            self.gf.mul_region_xor(coef, input, out)?;
        }
        Ok(())
    }

    pub fn encode(&self, data: &[&[u8]], coding: &mut [&mut [u8]]) -> Result<(), CodeError> {
        let lens = data.iter().map(|b| b.len()).chain(coding.iter().map(|b| b.len()));
        check_blocks(lens, self.k + self.m, self.word())?;
        for (i, out) in coding.iter_mut().enumerate() {
            self.dot(&self.matrix[i * self.k..(i + 1) * self.k], data, out)?;
        }
        Ok(())
    }

    pub fn decode(&self, blocks: &mut [&mut [u8]], erasures: &[usize]) -> Result<(), CodeError> {
        let k = self.k;
        check_blocks(blocks.iter().map(|b| b.len()), k + self.m, self.word())?;
        check_erasures(erasures, k, self.m)?;
        let blocksize = blocks[0].len();

        let lost_data: Vec<usize> = erasures.iter().copied().filter(|&e| e < k).collect();
        if !lost_data.is_empty() {
            let survivors: Vec<usize> = (0..blocks.len())
                .filter(|i| !erasures.contains(i))
                .take(k)
                .collect();
            let mut decoding = vec![0u32; k * k];
            for (t, &s) in survivors.iter().enumerate() {
                let row = &mut decoding[t * k..(t + 1) * k];
                if s < k {
                    row[s] = 1;
                } else {
                    row.copy_from_slice(&self.matrix[(s - k) * k..(s - k + 1) * k]);
                }
            }
            let inverse = invert(&self.gf, &decoding, k)?;

            let mut restored = vec![vec![0u8; blocksize]; lost_data.len()];
            {
                let inputs: Vec<&[u8]> = survivors.iter().map(|&s| &*blocks[s]).collect();
                for (&j, out) in lost_data.iter().zip(restored.iter_mut()) {
                    self.dot(&inverse[j * k..(j + 1) * k], &inputs, out)?;
                }
            }
            for (&j, block) in lost_data.iter().zip(&restored) {
                blocks[j].copy_from_slice(block);
            }
        }

        let lost_coding: Vec<usize> = erasures.iter().copied().filter(|&e| e >= k).collect();
        if !lost_coding.is_empty() {
            let mut restored = vec![vec![0u8; blocksize]; lost_coding.len()];
            {
                let inputs: Vec<&[u8]> = blocks[..k].iter().map(|b| &**b).collect();
                for (&c, out) in lost_coding.iter().zip(restored.iter_mut()) {
                    self.dot(&self.matrix[(c - k) * k..(c - k + 1) * k], &inputs, out)?;
                }
            }
            for (&c, block) in lost_coding.iter().zip(&restored) {
                blocks[c].copy_from_slice(block);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{r6_coding_matrix, vandermonde_coding_matrix};

    fn stripe(k: usize, m: usize, blocksize: usize) -> Vec<Vec<u8>> {
        let mut state: u32 = 0xDEAD_BEEF;
        let mut blocks = vec![vec![0u8; blocksize]; k + m];
        for block in blocks.iter_mut().take(k) {
            for byte in block.iter_mut() {
                state = state.wrapping_mul(1103515245).wrapping_add(12345);
                *byte = (state >> 16) as u8;
            }
        }
        blocks
    }

    fn encode(coder: &MatrixCoder, blocks: &mut [Vec<u8>], k: usize) {
        let (data, coding) = blocks.split_at_mut(k);
        let inputs: Vec<&[u8]> = data.iter().map(|b| b.as_slice()).collect();
        let mut outputs: Vec<&mut [u8]> = coding.iter_mut().map(|b| b.as_mut_slice()).collect();
        coder.encode(&inputs, &mut outputs).unwrap();
    }

    #[test]
    fn test_vandermonde_w32_every_pair_of_erasures() {
        let gf = Galois::new(32).unwrap();
        let coder = MatrixCoder::new(4, 2, gf, vandermonde_coding_matrix(&gf, 4, 2).unwrap());
        let mut original = stripe(4, 2, 64);
        encode(&coder, &mut original, 4);

        for a in 0..6 {
            for b in a + 1..6 {
                let mut damaged = original.clone();
                damaged[a].fill(0xee);
                damaged[b].fill(0xee);
                let mut blocks: Vec<&mut [u8]> = damaged.iter_mut().map(|b| b.as_mut_slice()).collect();
                coder.decode(&mut blocks, &[a, b]).unwrap();
                assert_eq!(damaged, original, "erasures [{a}, {b}]");
            }
        }
    }

    #[test]
    fn test_r6_w16_p_is_xor_of_data() {
        let gf = Galois::new(16).unwrap();
        let coder = MatrixCoder::new(3, 2, gf, r6_coding_matrix(&gf, 3));
        let mut blocks = stripe(3, 2, 32);
        encode(&coder, &mut blocks, 3);
        let xor: Vec<u8> = (0..32).map(|i| blocks[0][i] ^ blocks[1][i] ^ blocks[2][i]).collect();
        assert_eq!(blocks[3], xor);
    }

    #[test]
    fn test_too_many_erasures() {
        let gf = Galois::new(8).unwrap();
        let coder = MatrixCoder::new(3, 2, gf, r6_coding_matrix(&gf, 3));
        let mut blocks = stripe(3, 2, 16);
        let mut refs: Vec<&mut [u8]> = blocks.iter_mut().map(|b| b.as_mut_slice()).collect();
        assert!(matches!(
            coder.decode(&mut refs, &[0, 1, 2]),
            Err(CodeError::Unrecoverable(_))
        ));
    }

    #[test]
    fn test_no_erasures_is_noop() {
        let gf = Galois::new(8).unwrap();
        let coder = MatrixCoder::new(2, 2, gf, r6_coding_matrix(&gf, 2));
        let mut blocks = stripe(2, 2, 8);
        encode(&coder, &mut blocks, 2);
        let before = blocks.clone();
        let mut refs: Vec<&mut [u8]> = blocks.iter_mut().map(|b| b.as_mut_slice()).collect();
        coder.decode(&mut refs, &[]).unwrap();
        assert_eq!(blocks, before);
    }
}

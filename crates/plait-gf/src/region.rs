//! Region (buffer-wide) operations.

use reed_solomon_erasure::Field as _;
use reed_solomon_erasure::galois_8;

use crate::error::GfError;
use crate::field::Galois;

/// `dst ^= src`, byte by byte.
pub fn xor_region(dst: &mut [u8], src: &[u8]) -> Result<(), GfError> {
    if dst.len() != src.len() {
        return Err(GfError::LengthMismatch {
            src: src.len(),
            dst: dst.len(),
        });
    }
    for (d, s) in dst.iter_mut().zip(src) {
        *d ^= *s;
    }
    Ok(())
}

/// Per-scalar lookup tables: one 256-entry table per byte of the word.
struct ScalarTable {
    bytes: usize,
    tables: Vec<[u32; 256]>,
}

impl ScalarTable {
    fn new(gf: &Galois, scalar: u32) -> Self {
        let bytes = (gf.width() / 8) as usize;
        let tables = (0..bytes)
            .map(|b| {
                let mut t = [0u32; 256];
                for (v, slot) in t.iter_mut().enumerate() {
                    *slot = gf.mul(scalar, (v as u32) << (8 * b));
                }
                t
            })
            .collect();
        Self { bytes, tables }
    }

    fn apply(&self, word: &[u8]) -> u32 {
        word.iter()
            .zip(&self.tables)
            .fold(0u32, |acc, (&byte, table)| acc ^ table[byte as usize])
    }

    fn store(&self, value: u32, out: &mut [u8]) {
        out.copy_from_slice(&value.to_le_bytes()[..self.bytes]);
    }
}

impl Galois {
    fn word_bytes(&self) -> Result<usize, GfError> {
        match self.width() {
            8 | 16 | 32 => Ok((self.width() / 8) as usize),
            w => Err(GfError::UnsupportedRegionWidth(w)),
        }
    }

    fn check_region(&self, src: usize, dst: usize) -> Result<usize, GfError> {
        let word = self.word_bytes()?;
        if src != dst {
            return Err(GfError::LengthMismatch { src, dst });
        }
        if !dst.is_multiple_of(word) {
            return Err(GfError::Misaligned { len: dst, word });
        }
        Ok(word)
    }

    /// `dst = scalar * src`, word by word.
    pub fn mul_region(&self, scalar: u32, src: &[u8], dst: &mut [u8]) -> Result<(), GfError> {
        let word = self.check_region(src.len(), dst.len())?;
        match scalar {
            0 => dst.fill(0),
            1 => dst.copy_from_slice(src),
            _ if word == 1 => galois_8::Field::mul_slice(scalar as u8, src, dst),
            _ => {
                let table = ScalarTable::new(self, scalar);
                for (s, d) in src.chunks_exact(word).zip(dst.chunks_exact_mut(word)) {
                    table.store(table.apply(s), d);
                }
            }
        }
        Ok(())
    }

    /// `dst ^= scalar * src`, word by word.
    pub fn mul_region_xor(&self, scalar: u32, src: &[u8], dst: &mut [u8]) -> Result<(), GfError> {
        let word = self.check_region(src.len(), dst.len())?;
        match scalar {
            0 => {}
            1 => xor_region(dst, src)?,
            _ if word == 1 => galois_8::Field::mul_slice_add(scalar as u8, src, dst),
            _ => {
                let table = ScalarTable::new(self, scalar);
                for (s, d) in src.chunks_exact(word).zip(dst.chunks_exact_mut(word)) {
                    let prev = table.apply(s) ^ read_word(d);
                    table.store(prev, d);
                }
            }
        }
        Ok(())
    }

    /// `buf = scalar * buf`.
    pub fn mul_region_in_place(&self, scalar: u32, buf: &mut [u8]) -> Result<(), GfError> {
        let word = self.check_region(buf.len(), buf.len())?;
        match scalar {
            0 => buf.fill(0),
            1 => {}
            _ => {
                let table = ScalarTable::new(self, scalar);
                for d in buf.chunks_exact_mut(word) {
                    let v = table.apply(d);
                    table.store(v, d);
                }
            }
        }
        Ok(())
    }
}

fn read_word(bytes: &[u8]) -> u32 {
    let mut le = [0u8; 4];
    le[..bytes.len()].copy_from_slice(bytes);
    u32::from_le_bytes(le)
}

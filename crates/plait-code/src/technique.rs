//! Parameter validation and coding-descriptor construction.

use plait_gf::Galois;
use plait_types::{CodeParams, Technique};
use tracing::debug;

use crate::StripeCoder;
use crate::bitmatrix::{
    BitmatrixCoder, blaum_roth_bitmatrix, liber8tion_bitmatrix, liberation_bitmatrix,
    matrix_to_bitmatrix,
};
use crate::dense::MatrixCoder;
use crate::error::CodeError;
use crate::matrix::{
    cauchy_good_matrix, cauchy_original_matrix, r6_coding_matrix, vandermonde_coding_matrix,
};
use crate::rs8::Rs8Coder;
use crate::rs16::Rs16Coder;

/// Byte alignment of blocks for word-oriented techniques.
pub const WORD_ALIGNMENT: usize = 8;

fn is_prime(n: usize) -> bool {
    n >= 2 && (2..).take_while(|d| d * d <= n).all(|d| !n.is_multiple_of(d))
}

fn gcd(a: usize, b: usize) -> usize {
    if b == 0 { a } else { gcd(b, a % b) }
}

fn invalid(msg: impl Into<String>) -> CodeError {
    CodeError::InvalidParameters(msg.into())
}

/// Check `params` against the constraints of its technique.
pub fn validate(params: &CodeParams) -> Result<(), CodeError> {
    let CodeParams {
        k,
        m,
        w,
        technique,
        packetsize,
    } = *params;

    if k == 0 {
        return Err(invalid("k must be greater than 0"));
    }
    if m == 0 {
        return Err(invalid("m must be greater than 0"));
    }
    if !(1..=32).contains(&w) {
        return Err(invalid(format!("w must be in 1..=32, got {w}")));
    }
    let fits_field = ((k + m) as u64) <= (1u64 << w);

    match technique {
        Technique::ReedSolVan => match w {
            8 if k + m > 256 => Err(invalid("k + m must be <= 256 for w=8")),
            16 if k > 32768 || m > 32768 => Err(invalid("k and m must be <= 32768 for w=16")),
            8 | 16 | 32 => Ok(()),
            _ => Err(invalid("w must be one of {8, 16, 32} for reed_sol_van")),
        },
        Technique::ReedSolR6Op => {
            if m != 2 {
                Err(invalid("m must be equal to 2 for reed_sol_r6_op"))
            } else if !matches!(w, 8 | 16 | 32) {
                Err(invalid("w must be one of {8, 16, 32} for reed_sol_r6_op"))
            } else if !fits_field {
                Err(invalid(format!("k + m must be <= 2^{w}")))
            } else {
                Ok(())
            }
        }
        Technique::CauchyOrig | Technique::CauchyGood => {
            if packetsize == 0 {
                Err(invalid(format!("must include packetsize for {technique}")))
            } else if !fits_field {
                Err(invalid(format!("k + m must be <= 2^{w}")))
            } else {
                Ok(())
            }
        }
        Technique::Liberation => {
            if m != 2 {
                Err(invalid("m must be equal to 2 for liberation"))
            } else if k > w as usize {
                Err(invalid("k must be less than or equal to w"))
            } else if w <= 2 || !is_prime(w as usize) {
                Err(invalid("w must be greater than two and w must be prime"))
            } else if packetsize == 0 || !packetsize.is_multiple_of(8) {
                Err(invalid("packetsize must be a non-zero multiple of 8"))
            } else {
                Ok(())
            }
        }
        Technique::BlaumRoth => {
            if m != 2 {
                Err(invalid("m must be equal to 2 for blaum_roth"))
            } else if k > w as usize {
                Err(invalid("k must be less than or equal to w"))
            } else if w <= 2 || !is_prime(w as usize + 1) {
                Err(invalid("w must be greater than two and w+1 must be prime"))
            } else if packetsize == 0 || !packetsize.is_multiple_of(8) {
                Err(invalid("packetsize must be a non-zero multiple of 8"))
            } else {
                Ok(())
            }
        }
        Technique::Liber8tion => {
            if packetsize == 0 {
                Err(invalid("must include packetsize for liber8tion"))
            } else if w != 8 {
                Err(invalid("w must equal 8 for liber8tion"))
            } else if m != 2 {
                Err(invalid("m must equal 2 for liber8tion"))
            } else if k > w as usize {
                Err(invalid("k must be less than or equal to w"))
            } else {
                Ok(())
            }
        }
    }
}

/// Required block alignment in bytes for `params`.
///
/// Word-oriented techniques use [`WORD_ALIGNMENT`]; bitmatrix techniques
/// need whole super-packets, `lcm(w * packetsize, 8)`.
pub fn block_alignment(params: &CodeParams) -> usize {
    if params.technique.is_bitmatrix() {
        let superpacket = params.w as usize * params.packetsize.max(1);
        superpacket / gcd(superpacket, WORD_ALIGNMENT) * WORD_ALIGNMENT
    } else {
        WORD_ALIGNMENT
    }
}

#[derive(Debug)]
enum Backend {
    Rs8(Rs8Coder),
    Rs16(Rs16Coder),
    Matrix(MatrixCoder),
    Bitmatrix(BitmatrixCoder),
}

/// A ready-to-use base code for one parameter set.
#[derive(Debug)]
pub struct CodingDescriptor {
    params: CodeParams,
    backend: Backend,
}

/// Validate `params` and build the coder for its technique.
pub fn build_descriptor(params: &CodeParams) -> Result<CodingDescriptor, CodeError> {
    validate(params)?;
    let CodeParams {
        k,
        m,
        w,
        technique,
        packetsize,
    } = *params;
    let wu = w as usize;

    let backend = match technique {
        Technique::ReedSolVan => match w {
            8 => Backend::Rs8(Rs8Coder::new(k, m)?),
            16 => Backend::Rs16(Rs16Coder::new(k, m)),
            _ => {
                let gf = Galois::new(w)?;
                Backend::Matrix(MatrixCoder::new(k, m, gf, vandermonde_coding_matrix(&gf, k, m)?))
            }
        },
        Technique::ReedSolR6Op => {
            let gf = Galois::new(w)?;
            Backend::Matrix(MatrixCoder::new(k, m, gf, r6_coding_matrix(&gf, k)))
        }
        Technique::CauchyOrig | Technique::CauchyGood => {
            let gf = Galois::new(w)?;
            let matrix = if technique == Technique::CauchyOrig {
                cauchy_original_matrix(&gf, k, m)?
            } else {
                cauchy_good_matrix(&gf, k, m)?
            };
            let bits = matrix_to_bitmatrix(&gf, &matrix, m, k);
            Backend::Bitmatrix(BitmatrixCoder::new(k, m, wu, packetsize, bits))
        }
        Technique::Liberation => Backend::Bitmatrix(BitmatrixCoder::new(
            k,
            m,
            wu,
            packetsize,
            liberation_bitmatrix(k, wu),
        )),
        Technique::BlaumRoth => Backend::Bitmatrix(BitmatrixCoder::new(
            k,
            m,
            wu,
            packetsize,
            blaum_roth_bitmatrix(k, wu),
        )),
        Technique::Liber8tion => Backend::Bitmatrix(BitmatrixCoder::new(
            k,
            m,
            wu,
            packetsize,
            liber8tion_bitmatrix(k),
        )),
    };

    let descriptor = CodingDescriptor {
        params: *params,
        backend,
    };
    debug!(
        %technique,
        k,
        m,
        w,
        packetsize,
        backend = descriptor.backend_name(),
        "built coding descriptor"
    );
    Ok(descriptor)
}

impl CodingDescriptor {
    /// Block alignment in bytes.
    pub fn alignment(&self) -> usize {
        block_alignment(&self.params)
    }

    /// Short name of the backend doing the arithmetic.
    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            Backend::Rs8(_) => "reed-solomon-erasure",
            Backend::Rs16(_) => "reed-solomon-simd",
            Backend::Matrix(_) => "matrix",
            Backend::Bitmatrix(_) => "bitmatrix",
        }
    }
}

impl StripeCoder for CodingDescriptor {
    fn params(&self) -> &CodeParams {
        &self.params
    }

    fn encode_stripe(&self, data: &[&[u8]], coding: &mut [&mut [u8]]) -> Result<(), CodeError> {
        match &self.backend {
            Backend::Rs8(c) => c.encode(data, coding),
            Backend::Rs16(c) => c.encode(data, coding),
            Backend::Matrix(c) => c.encode(data, coding),
            Backend::Bitmatrix(c) => c.encode(data, coding),
        }
    }

    fn decode_stripe(&self, blocks: &mut [&mut [u8]], erasures: &[usize]) -> Result<(), CodeError> {
        match &self.backend {
            Backend::Rs8(c) => c.decode(blocks, erasures),
            Backend::Rs16(c) => c.decode(blocks, erasures),
            Backend::Matrix(c) => c.decode(blocks, erasures),
            Backend::Bitmatrix(c) => c.decode(blocks, erasures),
        }
    }
}

//! Scalar arithmetic in GF(2^w).

use reed_solomon_erasure::Field as _;
use reed_solomon_erasure::galois_8;

use crate::error::GfError;

/// Primitive polynomials (including the x^w term) for w = 1..=32.
const PRIMITIVE_POLYS: [u64; 32] = [
    0x3,
    0x7,
    0xb,
    0x13,
    0x25,
    0x43,
    0x89,
    0x11d,
    0x211,
    0x409,
    0x805,
    0x1053,
    0x201b,
    0x4443,
    0x8003,
    0x1100b,
    0x20009,
    0x40081,
    0x80027,
    0x100009,
    0x200005,
    0x400003,
    0x800021,
    0x1000087,
    0x2000009,
    0x4000047,
    0x8000027,
    0x10000009,
    0x20000005,
    0x40800007,
    0x80000009,
    0x100400007,
];

/// Return the primitive polynomial used for GF(2^w).
pub fn primitive_polynomial(w: u32) -> Result<u64, GfError> {
    if !(1..=32).contains(&w) {
        return Err(GfError::UnsupportedWidth(w));
    }
    Ok(PRIMITIVE_POLYS[(w - 1) as usize])
}

/// The field GF(2^w).
///
/// Elements are carried in a `u32`; only the low `w` bits are significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Galois {
    w: u32,
    poly: u64,
}

impl Galois {
    /// Create the field of width `w`.
    pub fn new(w: u32) -> Result<Self, GfError> {
        let poly = primitive_polynomial(w)?;
        Ok(Self { w, poly })
    }

    /// Word size in bits.
    pub fn width(&self) -> u32 {
        self.w
    }

    /// Number of field elements, `2^w`.
    pub fn order(&self) -> u64 {
        1u64 << self.w
    }

    fn mask(&self) -> u64 {
        self.order() - 1
    }

    /// Addition (and subtraction): XOR.
    pub fn add(&self, a: u32, b: u32) -> u32 {
        a ^ b
    }

    /// Multiply two elements.
    pub fn mul(&self, a: u32, b: u32) -> u32 {
        if self.w == 8 {
            return u32::from(galois_8::Field::mul(a as u8, b as u8));
        }
        let top = self.order();
        let mut a = u64::from(a) & self.mask();
        let mut b = u64::from(b) & self.mask();
        let mut acc = 0u64;
        while b != 0 {
            if b & 1 == 1 {
                acc ^= a;
            }
            b >>= 1;
            a <<= 1;
            if a & top != 0 {
                a ^= self.poly;
            }
        }
        acc as u32
    }

    /// Raise `a` to the power `e`.
    pub fn pow(&self, a: u32, mut e: u64) -> u32 {
        let mut base = a;
        let mut acc = 1u32;
        while e != 0 {
            if e & 1 == 1 {
                acc = self.mul(acc, base);
            }
            base = self.mul(base, base);
            e >>= 1;
        }
        acc
    }

    /// Multiplicative inverse.
    pub fn inverse(&self, a: u32) -> Result<u32, GfError> {
        if u64::from(a) & self.mask() == 0 {
            return Err(GfError::DivideByZero(self.w));
        }
        // a^(2^w - 2) = a^-1 in a field of order 2^w.
        Ok(self.pow(a, self.order() - 2))
    }

    /// Divide `a` by `b`.
    pub fn div(&self, a: u32, b: u32) -> Result<u32, GfError> {
        if u64::from(b) & self.mask() == 0 {
            return Err(GfError::DivideByZero(self.w));
        }
        if self.w == 8 {
            return Ok(u32::from(galois_8::Field::div(a as u8, b as u8)));
        }
        Ok(self.mul(a, self.inverse(b)?))
    }
}

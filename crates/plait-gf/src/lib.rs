//! Arithmetic over GF(2^w).
//!
//! - [`Galois`]: scalar add/multiply/divide/inverse for any `1 <= w <= 32`,
//!   using the standard primitive polynomial for each width.
//! - Region operations ([`xor_region`], [`Galois::mul_region`],
//!   [`Galois::mul_region_xor`], [`Galois::mul_region_in_place`]) for
//!   `w ∈ {8, 16, 32}`. Words wider than a byte are little-endian.
//!
//! GF(2^8) delegates to `reed-solomon-erasure`'s table-driven field, which
//! uses the same polynomial (0x11d).

mod error;
mod field;
mod region;

pub use error::GfError;
pub use field::{Galois, primitive_polynomial};
pub use region::xor_region;

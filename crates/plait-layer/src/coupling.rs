//! Forward and inverse layer-coupling transform.
//!
//! For a coupled pair with uncoupled values `x = U(a, 2p+1)` and
//! `y = U(b, 2p)` the stored values are
//!
//! ```text
//! C(a, 2p+1) = x + y
//! C(b, 2p)   = theta * x + y
//! ```
//!
//! All arithmetic is in the schedule's coupling field.

use plait_gf::xor_region;

use crate::arena::BlockArena;
use crate::error::CodecError;
use crate::schedule::CouplingSchedule;

/// Couple one pair in place. `scratch` must be one block long.
pub fn couple_pair(
    arena: &mut BlockArena,
    schedule: &CouplingSchedule,
    pass: usize,
    lower: usize,
    scratch: &mut [u8],
) -> Result<(), CodecError> {
    let theta = schedule.coefficients(pass).theta;
    let (a, b) = schedule.coupled_cells(pass, lower);
    let (ca, cb) = arena.pair_mut(a, b);
    schedule.field().mul_region(theta, ca, scratch)?;
    xor_region(ca, cb)?;
    xor_region(cb, scratch)?;
    Ok(())
}

/// Recover the uncoupled values of one pair whose cells are both present.
pub fn decouple_pair(
    arena: &mut BlockArena,
    schedule: &CouplingSchedule,
    pass: usize,
    lower: usize,
) -> Result<(), CodecError> {
    let coef = schedule.coefficients(pass);
    let field = schedule.field();
    let (a, b) = schedule.coupled_cells(pass, lower);
    let (ca, cb) = arena.pair_mut(a, b);
    // ca = (1 + theta) x
    xor_region(ca, cb)?;
    field.mul_region_in_place(coef.inv_det, ca)?;
    // cb = theta x + y + theta x
    field.mul_region_xor(coef.theta, ca, cb)?;
    Ok(())
}

/// Apply the forward transform to every layer, passes ascending.
pub fn forward(
    arena: &mut BlockArena,
    schedule: &CouplingSchedule,
    scratch: &mut [u8],
) -> Result<(), CodecError> {
    for pass in 0..schedule.passes() {
        for (lower, _) in schedule.pairs(pass) {
            couple_pair(arena, schedule, pass, lower, scratch)?;
        }
    }
    Ok(())
}

/// Undo [`forward`] on a fully present arena.
pub fn inverse(arena: &mut BlockArena, schedule: &CouplingSchedule) -> Result<(), CodecError> {
    for pass in (0..schedule.passes()).rev() {
        decouple_pass(arena, schedule, pass, |_| true)?;
    }
    Ok(())
}

/// Decouple every pair of `pass` whose lower layer satisfies `keep`.
pub fn decouple_pass(
    arena: &mut BlockArena,
    schedule: &CouplingSchedule,
    pass: usize,
    keep: impl Fn(usize) -> bool,
) -> Result<(), CodecError> {
    for (lower, _) in schedule.pairs(pass) {
        if keep(lower) {
            decouple_pair(arena, schedule, pass, lower)?;
        }
    }
    Ok(())
}

/// Turn the stored value of a present coupled cell into its uncoupled value
/// using the already decoded partner cell.
///
/// - odd column (A): `x = C_A + y`
/// - even column (B): `y = C_B + theta * x`
///
/// Unpaired cells are left untouched.
pub fn resolve_cell(
    arena: &mut BlockArena,
    schedule: &CouplingSchedule,
    layer: usize,
    column: usize,
) -> Result<(), CodecError> {
    let Some(partner) = schedule.partner(layer, column) else {
        return Ok(());
    };
    let (cell, known) = arena.pair_mut((layer, column), partner);
    if column % 2 == 1 {
        xor_region(cell, known)?;
    } else {
        let theta = schedule.coefficients(column / 2).theta;
        schedule.field().mul_region_xor(theta, known, cell)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(layers: usize, columns: usize, blocksize: usize) -> BlockArena {
        let mut arena = BlockArena::new(layers, columns, blocksize);
        let mut state: u32 = 0xDEAD_BEEF;
        for layer in 0..layers {
            for column in 0..columns {
                for byte in arena.cell_mut(layer, column) {
                    state = state.wrapping_mul(1103515245).wrapping_add(12345);
                    *byte = (state >> 16) as u8;
                }
            }
        }
        arena
    }

    #[test]
    fn test_forward_then_inverse_is_identity() {
        for (columns, layers, w) in [(6, 8, 8), (14, 128, 8), (5, 4, 16), (6, 8, 32), (4, 2, 7)] {
            let schedule = CouplingSchedule::new(columns, layers, w).unwrap();
            let original = filled(layers, columns, 16);
            let mut arena = original.clone();
            let mut scratch = vec![0u8; 16];
            forward(&mut arena, &schedule, &mut scratch).unwrap();
            assert_ne!(arena, original, "forward must change coupled cells");
            inverse(&mut arena, &schedule).unwrap();
            assert_eq!(arena, original, "columns={columns} layers={layers} w={w}");
        }
    }

    #[test]
    fn test_dots_are_unchanged() {
        let schedule = CouplingSchedule::new(6, 8, 8).unwrap();
        let original = filled(8, 6, 8);
        let mut arena = original.clone();
        forward(&mut arena, &schedule, &mut [0u8; 8]).unwrap();
        for layer in 0..8 {
            for column in 0..6 {
                if schedule.is_dot(layer, column) {
                    assert_eq!(arena.cell(layer, column), original.cell(layer, column));
                }
            }
        }
    }

    #[test]
    fn test_coupled_values_match_definition() {
        let schedule = CouplingSchedule::new(4, 4, 8).unwrap();
        let original = filled(4, 4, 8);
        let mut arena = original.clone();
        forward(&mut arena, &schedule, &mut [0u8; 8]).unwrap();

        let gf = schedule.field();
        let theta = schedule.coefficients(1).theta;
        // Pass 1 couples (1, 3) with (3, 2).
        for i in 0..8 {
            let x = u32::from(original.cell(1, 3)[i]);
            let y = u32::from(original.cell(3, 2)[i]);
            assert_eq!(u32::from(arena.cell(1, 3)[i]), x ^ y);
            assert_eq!(u32::from(arena.cell(3, 2)[i]), gf.mul(theta, x) ^ y);
        }
    }

    #[test]
    fn test_resolve_from_known_partner() {
        let schedule = CouplingSchedule::new(2, 2, 8).unwrap();
        let original = filled(2, 2, 8);
        let mut coupled = original.clone();
        forward(&mut coupled, &schedule, &mut [0u8; 8]).unwrap();

        // A = (0, 1) present, partner (1, 0) known uncoupled.
        let mut arena = coupled.clone();
        arena.cell_mut(1, 0).copy_from_slice(original.cell(1, 0));
        resolve_cell(&mut arena, &schedule, 0, 1).unwrap();
        assert_eq!(arena.cell(0, 1), original.cell(0, 1));

        // B = (1, 0) present, partner (0, 1) known uncoupled.
        let mut arena = coupled;
        arena.cell_mut(0, 1).copy_from_slice(original.cell(0, 1));
        resolve_cell(&mut arena, &schedule, 1, 0).unwrap();
        assert_eq!(arena.cell(1, 0), original.cell(1, 0));
    }

    #[test]
    fn test_resolve_dot_is_noop() {
        let schedule = CouplingSchedule::new(2, 2, 8).unwrap();
        let mut arena = filled(2, 2, 8);
        let before = arena.clone();
        resolve_cell(&mut arena, &schedule, 0, 0).unwrap();
        assert_eq!(arena, before);
    }
}

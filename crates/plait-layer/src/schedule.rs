//! The power-of-two pairing schedule of the layer-coupling transform.
//!
//! Columns are grouped into pairs `(2p, 2p + 1)`. Pass `p` uses stride
//! `s = 2^p`: layer `a` with bit `p` clear ("lower") is paired with layer
//! `b = a + s` ("upper"), coupling cell `(a, 2p + 1)` with cell `(b, 2p)`.
//! The cells `(lower, 2p)` and `(upper, 2p + 1)` are left unpaired.

use plait_gf::Galois;

use crate::error::CodecError;

/// Width of the field the coupling runs in for a base code of width `w`.
pub fn coupling_width(w: u32) -> u32 {
    match w {
        16 | 32 => w,
        _ => 8,
    }
}

/// Field scalars used by one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassCoefficients {
    /// Coupling coefficient; never 0 or 1.
    pub theta: u32,
    /// `1 / theta`.
    pub inv_theta: u32,
    /// `1 / (1 + theta)`, the inverse determinant of `[[1, 1], [theta, 1]]`.
    pub inv_det: u32,
}

/// The fixed pairing schedule for `columns` fragments and `layers` layers.
#[derive(Debug, Clone)]
pub struct CouplingSchedule {
    columns: usize,
    layers: usize,
    field: Galois,
    passes: Vec<PassCoefficients>,
}

impl CouplingSchedule {
    pub fn new(columns: usize, layers: usize, base_w: u32) -> Result<Self, CodecError> {
        if layers == 0 || !layers.is_power_of_two() {
            return Err(CodecError::Config(format!(
                "layer count must be a power of two, got {layers}"
            )));
        }
        let field = Galois::new(coupling_width(base_w))?;
        let count = (columns / 2).min(layers.trailing_zeros() as usize);

        let mut passes = Vec::with_capacity(count);
        for p in 0..count {
            let theta = field.pow(2, p as u64 + 1);
            if theta <= 1 {
                return Err(CodecError::Config(format!(
                    "pass {p} has a degenerate coupling coefficient"
                )));
            }
            passes.push(PassCoefficients {
                theta,
                inv_theta: field.inverse(theta)?,
                inv_det: field.inverse(1 ^ theta)?,
            });
        }
        Ok(Self {
            columns,
            layers,
            field,
            passes,
        })
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn layers(&self) -> usize {
        self.layers
    }

    /// Number of coupling passes, `min(columns / 2, log2(layers))`.
    pub fn passes(&self) -> usize {
        self.passes.len()
    }

    /// Field the transform multiplies in.
    pub fn field(&self) -> &Galois {
        &self.field
    }

    pub fn stride(&self, pass: usize) -> usize {
        1 << pass
    }

    pub fn coefficients(&self, pass: usize) -> PassCoefficients {
        self.passes[pass]
    }

    /// The pass coupling `column`, if any.
    pub fn pass_of(&self, column: usize) -> Option<usize> {
        let p = column / 2;
        (p < self.passes() && column < self.columns).then_some(p)
    }

    /// Whether `layer` is in the lower half of its window for `pass`.
    pub fn is_lower(&self, layer: usize, pass: usize) -> bool {
        layer & self.stride(pass) == 0
    }

    /// Whether cell `(layer, column)` is unpaired.
    pub fn is_dot(&self, layer: usize, column: usize) -> bool {
        match self.pass_of(column) {
            None => true,
            Some(p) => self.is_lower(layer, p) == column.is_multiple_of(2),
        }
    }

    /// The cell coupled with `(layer, column)`, or `None` for a dot.
    pub fn partner(&self, layer: usize, column: usize) -> Option<(usize, usize)> {
        if self.is_dot(layer, column) {
            return None;
        }
        let p = column / 2;
        let s = self.stride(p);
        if column % 2 == 1 {
            Some((layer | s, 2 * p))
        } else {
            Some((layer & !s, 2 * p + 1))
        }
    }

    /// Lower/upper layer pairs `(a, a + s)` of `pass`.
    pub fn pairs(&self, pass: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        let s = self.stride(pass);
        (0..self.layers)
            .filter(move |a| a & s == 0)
            .map(move |a| (a, a | s))
    }

    /// Cells `(A, B)` coupled by `pass` for the lower layer `a`.
    pub fn coupled_cells(&self, pass: usize, a: usize) -> ((usize, usize), (usize, usize)) {
        ((a, 2 * pass + 1), (a | self.stride(pass), 2 * pass))
    }

    /// Layers in which the cell of `column` is unpaired: the repair planes
    /// of that column.
    pub fn repair_planes(&self, column: usize) -> Vec<usize> {
        (0..self.layers).filter(|&l| self.is_dot(l, column)).collect()
    }
}

//! Dense coding matrices over GF(2^w).
//!
//! Matrices are row-major `Vec<u32>`. A coding matrix has `m` rows and `k`
//! columns; the implied generator is the identity stacked on top of it.

use plait_gf::Galois;

use crate::error::CodeError;

/// Coding matrix of systematic Vandermonde Reed-Solomon.
///
/// Builds the `n x k` Vandermonde matrix `V[i][j] = i^j` and multiplies it
/// by the inverse of its top `k x k` block, so the top becomes the identity
/// and any `k` rows stay invertible. Returns the bottom `m` rows.
pub fn vandermonde_coding_matrix(gf: &Galois, k: usize, m: usize) -> Result<Vec<u32>, CodeError> {
    let n = k + m;
    let mut v = vec![0u32; n * k];
    for i in 0..n {
        for j in 0..k {
            v[i * k + j] = gf.pow(i as u32, j as u64);
        }
    }
    let top_inv = invert(gf, &v[..k * k], k)?;
    Ok(multiply(gf, &v[k * k..], &top_inv, m, k, k))
}

/// RAID-6 coding matrix: a row of ones (P) and a row of powers of two (Q).
pub fn r6_coding_matrix(gf: &Galois, k: usize) -> Vec<u32> {
    let mut mat = vec![1u32; 2 * k];
    for j in 0..k {
        mat[k + j] = gf.pow(2, j as u64);
    }
    mat
}

/// Cauchy coding matrix `M[i][j] = 1 / (i ^ (m + j))`.
pub fn cauchy_original_matrix(gf: &Galois, k: usize, m: usize) -> Result<Vec<u32>, CodeError> {
    let mut mat = vec![0u32; m * k];
    for i in 0..m {
        for j in 0..k {
            mat[i * k + j] = gf.inverse((i ^ (m + j)) as u32)?;
        }
    }
    Ok(mat)
}

/// Cauchy coding matrix scaled to reduce the number of ones in its
/// bitmatrix expansion.
///
/// Columns are divided by their first-row element so the first row is all
/// ones; every other row is divided by whichever of its elements yields the
/// fewest bitmatrix ones.
pub fn cauchy_good_matrix(gf: &Galois, k: usize, m: usize) -> Result<Vec<u32>, CodeError> {
    let mut mat = cauchy_original_matrix(gf, k, m)?;

    for j in 0..k {
        let d = mat[j];
        if d != 1 {
            for i in 0..m {
                mat[i * k + j] = gf.div(mat[i * k + j], d)?;
            }
        }
    }

    for i in 1..m {
        let row = &mat[i * k..(i + 1) * k];
        let mut best_ones: usize = row.iter().map(|&e| element_ones(gf, e)).sum();
        let mut best_div = 1u32;
        for &d in row {
            if d == 1 {
                continue;
            }
            let mut ones = 0;
            for &e in row {
                ones += element_ones(gf, gf.div(e, d)?);
            }
            if ones < best_ones {
                best_ones = ones;
                best_div = d;
            }
        }
        if best_div != 1 {
            for j in 0..k {
                mat[i * k + j] = gf.div(mat[i * k + j], best_div)?;
            }
        }
    }
    Ok(mat)
}

/// Number of ones in the `w x w` bitmatrix expansion of `e`.
pub fn element_ones(gf: &Galois, e: u32) -> usize {
    let mut elt = e;
    let mut ones = 0;
    for _ in 0..gf.width() {
        ones += elt.count_ones() as usize;
        elt = gf.mul(elt, 2);
    }
    ones
}

/// Invert an `n x n` matrix by Gauss-Jordan elimination.
pub fn invert(gf: &Galois, mat: &[u32], n: usize) -> Result<Vec<u32>, CodeError> {
    let mut a = mat.to_vec();
    let mut inv = vec![0u32; n * n];
    for i in 0..n {
        inv[i * n + i] = 1;
    }

    for col in 0..n {
        let pivot = (col..n)
            .find(|&r| a[r * n + col] != 0)
            .ok_or_else(|| CodeError::Unrecoverable("decoding matrix is singular".into()))?;
        if pivot != col {
            for c in 0..n {
                a.swap(pivot * n + c, col * n + c);
                inv.swap(pivot * n + c, col * n + c);
            }
        }

        let p = a[col * n + col];
        if p != 1 {
            let pinv = gf.inverse(p)?;
            for c in 0..n {
                a[col * n + c] = gf.mul(a[col * n + c], pinv);
                inv[col * n + c] = gf.mul(inv[col * n + c], pinv);
            }
        }

        for r in 0..n {
            let f = a[r * n + col];
            if r == col || f == 0 {
                continue;
            }
            for c in 0..n {
                a[r * n + c] ^= gf.mul(f, a[col * n + c]);
                inv[r * n + c] ^= gf.mul(f, inv[col * n + c]);
            }
        }
    }
    Ok(inv)
}

/// Multiply an `r x inner` matrix by an `inner x c` matrix.
pub fn multiply(gf: &Galois, a: &[u32], b: &[u32], r: usize, inner: usize, c: usize) -> Vec<u32> {
    let mut out = vec![0u32; r * c];
    for i in 0..r {
        for j in 0..c {
            out[i * c + j] = (0..inner).fold(0u32, |acc, x| {
                acc ^ gf.mul(a[i * inner + x], b[x * c + j])
            });
        }
    }
    out
}

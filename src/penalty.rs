//! Roughness penalties on basis coefficients.
//!
//! The penalty along one axis is `DᵀD`, where `D` takes finite differences
//! of neighbouring coefficients. Over the full tensor coefficient space,
//! axis `d` is penalized by `I ⊗ ... ⊗ P_d ⊗ ... ⊗ I`, so it only acts on
//! coefficient neighbours along that axis.
use crate::error::{Result, SmoothingError};
use crate::sparse::CooMatrix;

/// Difference order of the roughness penalty
pub const PENALTY_ORDER: usize = 2;

/// Finite-difference operator of the given order on `n` coefficients,
/// shape `(n - order) x n`.
pub fn difference_operator(n: usize, order: usize) -> CooMatrix {
    let rows = n.saturating_sub(order);
    let mut d = CooMatrix::zeros(rows, n);

    // Row i is sum_k (-1)^(order - k) C(order, k) e_{i + k}
    let mut weights = vec![0.0; order + 1];
    let mut binom = 1.0;
    for k in 0..=order {
        let sign = if (order - k) % 2 == 0 { 1.0 } else { -1.0 };
        weights[k] = sign * binom;
        binom = binom * (order - k) as f64 / (k + 1) as f64;
    }

    for i in 0..rows {
        for (k, &w) in weights.iter().enumerate() {
            d.push(i, i + k, w);
        }
    }
    d
}

/// Penalty matrix `DᵀD` for `n` coefficients.
///
/// With `n <= order` there are no differences to take,
/// and the identity (ridge) penalty is used instead.
pub fn difference_penalty(n: usize, order: usize) -> CooMatrix {
    if n <= order {
        return CooMatrix::identity(n);
    }
    difference_operator(n, order).gram()
}

/// Weighted sum of per-axis penalties over the full coefficient space,
/// `sum_d lambda_d (I ⊗ ... ⊗ P_d ⊗ ... ⊗ I)`, with duplicates merged.
///
/// # Errors
/// * If the three slices have different lengths or are empty
/// * If a penalty is not square with the matching basis count
pub fn tensor_penalty(
    penalties: &[CooMatrix],
    lambdas: &[f64],
    n_basis: &[usize],
) -> Result<CooMatrix> {
    let ndims = n_basis.len();
    if ndims == 0 || penalties.len() != ndims || lambdas.len() != ndims {
        return Err(SmoothingError::Shape(
            "penalty, lambda and basis counts must have one entry per axis".to_string(),
        ));
    }
    for (d, p) in penalties.iter().enumerate() {
        if p.nrows() != n_basis[d] || p.ncols() != n_basis[d] {
            return Err(SmoothingError::Shape(format!(
                "penalty for axis {d} is {}x{}, expected {}x{}",
                p.nrows(),
                p.ncols(),
                n_basis[d],
                n_basis[d]
            )));
        }
    }

    let total: usize = n_basis.iter().product();
    let mut acc = CooMatrix::zeros(total, total);
    for d in 0..ndims {
        let factors: Vec<CooMatrix> = (0..ndims)
            .map(|e| {
                if e == d {
                    penalties[d].clone()
                } else {
                    CooMatrix::identity(n_basis[e])
                }
            })
            .collect();
        let mut term = CooMatrix::kron_chain(&factors)?;
        term.scale(lambdas[d]);
        acc.add_assign(&term)?;
    }
    acc.compress();
    Ok(acc)
}

//! Coordinate-format sparse matrices with the handful of operations the
//! tensor-product system needs: Kronecker products, sums, matrix-vector
//! products, Gram matrices and a symmetric positive-definite solve.
//!
//! Entries are `(row, col, value)` triplets. Duplicates are allowed until
//! [`CooMatrix::compress`] merges them, so sums can be accumulated by
//! appending.
use faer::linalg::solvers::Solve;
use faer::sparse::{SparseColMat, Triplet};
use faer::{Mat, Side};

use crate::error::{Result, SmoothingError};

/// Sparse matrix in coordinate (triplet) format.
#[derive(Clone, Debug, PartialEq)]
pub struct CooMatrix {
    nrows: usize,
    ncols: usize,
    entries: Vec<(usize, usize, f64)>,
}

impl CooMatrix {
    /// Empty (all-zero) matrix of the given shape
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            nrows,
            ncols,
            entries: Vec::new(),
        }
    }

    /// Square identity matrix
    pub fn identity(n: usize) -> Self {
        Self {
            nrows: n,
            ncols: n,
            entries: (0..n).map(|i| (i, i, 1.0)).collect(),
        }
    }

    /// Build from a C-ordered dense matrix, dropping exact zeros.
    ///
    /// # Errors
    /// * If `data.len() != nrows * ncols`
    #[cfg(test)]
    pub(crate) fn from_dense(nrows: usize, ncols: usize, data: &[f64]) -> Result<Self> {
        if data.len() != nrows * ncols {
            return Err(SmoothingError::Shape(format!(
                "dense data has length {}, expected {nrows}x{ncols}",
                data.len()
            )));
        }
        let mut m = Self::zeros(nrows, ncols);
        for (i, &v) in data.iter().enumerate() {
            m.push(i / ncols, i % ncols, v);
        }
        Ok(m)
    }

    /// Append an entry. Zero values are skipped.
    ///
    /// Panics if the index is out of bounds, which is a programming error.
    #[inline]
    pub fn push(&mut self, row: usize, col: usize, value: f64) {
        assert!(row < self.nrows && col < self.ncols, "sparse index out of bounds");
        if value != 0.0 {
            self.entries.push((row, col, value));
        }
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Number of stored entries, which may include duplicates before compression
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[(usize, usize, f64)] {
        &self.entries
    }

    /// Sort entries by (row, col), summing duplicates and dropping zeros.
    pub fn compress(&mut self) {
        self.entries
            .sort_unstable_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        let mut merged: Vec<(usize, usize, f64)> = Vec::with_capacity(self.entries.len());
        for &(r, c, v) in &self.entries {
            match merged.last_mut() {
                Some(last) if last.0 == r && last.1 == c => last.2 += v,
                _ => merged.push((r, c, v)),
            }
        }
        merged.retain(|e| e.2 != 0.0);
        self.entries = merged;
    }

    /// Multiply every entry by `a`
    pub fn scale(&mut self, a: f64) {
        self.entries.iter_mut().for_each(|e| e.2 *= a);
    }

    /// Accumulate `other` into `self`.
    ///
    /// # Errors
    /// * If the shapes differ
    pub fn add_assign(&mut self, other: &CooMatrix) -> Result<()> {
        if self.nrows != other.nrows || self.ncols != other.ncols {
            return Err(SmoothingError::Shape(format!(
                "cannot add {}x{} to {}x{}",
                other.nrows, other.ncols, self.nrows, self.ncols
            )));
        }
        self.entries.extend_from_slice(&other.entries);
        Ok(())
    }

    /// Kronecker product `self ⊗ other`.
    ///
    /// Row `i * other.nrows + k` and column `j * other.ncols + l` hold
    /// `self[i, j] * other[k, l]`, which matches C-order flattening
    /// with `self`'s axis outermost.
    pub fn kron(&self, other: &CooMatrix) -> CooMatrix {
        let mut out = CooMatrix::zeros(self.nrows * other.nrows, self.ncols * other.ncols);
        out.entries.reserve(self.entries.len() * other.entries.len());
        for &(i, j, a) in &self.entries {
            for &(k, l, b) in &other.entries {
                out.entries
                    .push((i * other.nrows + k, j * other.ncols + l, a * b));
            }
        }
        out
    }

    /// Kronecker product of a chain of matrices, `m[0] ⊗ m[1] ⊗ ... ⊗ m[n-1]`,
    /// built left to right.
    ///
    /// # Errors
    /// * If the chain is empty
    pub fn kron_chain(mats: &[CooMatrix]) -> Result<CooMatrix> {
        let (first, rest) = mats.split_first().ok_or_else(|| {
            SmoothingError::Unexpected("Kronecker chain of zero matrices".to_string())
        })?;
        Ok(rest.iter().fold(first.clone(), |acc, m| acc.kron(m)))
    }

    /// `out = self * x`
    ///
    /// # Errors
    /// * If `x` or `out` lengths do not match the matrix shape
    pub fn matvec(&self, x: &[f64], out: &mut [f64]) -> Result<()> {
        if x.len() != self.ncols || out.len() != self.nrows {
            return Err(SmoothingError::Shape("matvec dimension mismatch".to_string()));
        }
        out.iter_mut().for_each(|v| *v = 0.0);
        for &(r, c, v) in &self.entries {
            out[r] += v * x[c];
        }
        Ok(())
    }

    /// `out = selfᵀ * x`
    ///
    /// # Errors
    /// * If `x` or `out` lengths do not match the matrix shape
    pub fn tr_matvec(&self, x: &[f64], out: &mut [f64]) -> Result<()> {
        if x.len() != self.nrows || out.len() != self.ncols {
            return Err(SmoothingError::Shape(
                "transposed matvec dimension mismatch".to_string(),
            ));
        }
        out.iter_mut().for_each(|v| *v = 0.0);
        for &(r, c, v) in &self.entries {
            out[c] += v * x[r];
        }
        Ok(())
    }

    /// Gram matrix `selfᵀ * self`.
    ///
    /// Accumulates densely in `ncols²` storage, so this is meant for
    /// per-axis matrices rather than full tensor systems.
    pub fn gram(&self) -> CooMatrix {
        let n = self.ncols;
        let mut by_row: Vec<Vec<(usize, f64)>> = vec![Vec::new(); self.nrows];
        for &(r, c, v) in &self.entries {
            by_row[r].push((c, v));
        }

        let mut dense = vec![0.0; n * n];
        for row in &by_row {
            for &(a, va) in row {
                for &(b, vb) in row {
                    dense[a * n + b] += va * vb;
                }
            }
        }

        let mut out = CooMatrix::zeros(n, n);
        for (i, &v) in dense.iter().enumerate() {
            out.push(i / n, i % n, v);
        }
        out
    }

    /// C-ordered dense copy
    #[cfg(test)]
    pub(crate) fn to_dense(&self) -> Vec<f64> {
        let mut dense = vec![0.0; self.nrows * self.ncols];
        for &(r, c, v) in &self.entries {
            dense[r * self.ncols + c] += v;
        }
        dense
    }
}

/// Solve `a x = b` for a symmetric positive-definite `a` with a sparse
/// Cholesky factorization. Only the upper triangle of `a` is read.
///
/// # Errors
/// * [`SmoothingError::Shape`] if `a` is not square or `b` has the wrong length
/// * [`SmoothingError::Solve`] if the factorization fails (not positive definite)
///   or the solution is not finite
/// * [`SmoothingError::Unexpected`] if the sparse structure cannot be built
pub fn solve_spd(a: &CooMatrix, b: &[f64]) -> Result<Vec<f64>> {
    let n = a.nrows();
    if a.ncols() != n || b.len() != n {
        return Err(SmoothingError::Shape(format!(
            "cannot solve {}x{} system with right-hand side of length {}",
            a.nrows(),
            a.ncols(),
            b.len()
        )));
    }

    let triplets: Vec<Triplet<usize, usize, f64>> = a
        .entries()
        .iter()
        .filter(|e| e.0 <= e.1)
        .map(|&(r, c, v)| Triplet::new(r, c, v))
        .collect();
    let mat = SparseColMat::<usize, f64>::try_new_from_triplets(n, n, &triplets).map_err(
        |e| SmoothingError::Unexpected(format!("failed to assemble sparse system: {e:?}")),
    )?;

    let llt = mat
        .as_ref()
        .sp_cholesky(Side::Upper)
        .map_err(|e| SmoothingError::solve(format!("sparse Cholesky failed: {e:?}")))?;

    let rhs = Mat::<f64>::from_fn(n, 1, |i, _| b[i]);
    let sol = llt.solve(rhs.as_ref());
    let x: Vec<f64> = (0..n).map(|i| sol[(i, 0)]).collect();

    if x.iter().any(|v| !v.is_finite()) {
        return Err(SmoothingError::solve("solution contains non-finite values"));
    }
    Ok(x)
}

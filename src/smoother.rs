//! Tensor-product P-spline smoothing of an N-dimensional grid.
//!
//! ```rust
//! use ndpspline::{smooth, PSplineConfig};
//!
//! // Define a grid
//! let x: Vec<f64> = (0..20).map(|i| i as f64 + 0.5).collect();
//! let y: Vec<f64> = (0..15).map(|i| 0.2 * i as f64).collect();
//! let grids = [&x[..], &y[..]];
//!
//! // Values at grid points, C-ordered
//! let z: Vec<f64> = x
//!     .iter()
//!     .flat_map(|&xi| y.iter().map(move |&yj| (xi / 5.0).sin() + 0.1 * yj))
//!     .collect();
//!
//! let cfg = PSplineConfig::default()
//!     .with_lambda(vec![1000.0, 800.0])
//!     .with_degree(3)
//!     .with_knots(vec![8, 6]);
//! let fit = smooth(&grids, &z, &cfg).unwrap();
//!
//! assert_eq!(fit.smoothed().len(), z.len());
//! let v = fit.eval_one([5.0, 2.0]).unwrap();
//! assert!(v.is_finite());
//! ```
//!
//! The fit minimizes `|y - B c|² + sum_d lambda_d cᵀ P_d c` where `B` is the
//! Kronecker product of the per-axis B-spline design matrices and `P_d` the
//! second-order difference penalty along axis `d`, by solving the normal
//! equations `(BᵀB + P) c = Bᵀy` with a sparse Cholesky factorization.
//!
//! Total basis size is the product of the per-axis counts, so both memory and
//! time grow multiplicatively with the number of dimensions.
//!
//! References
//! * P. H. C. Eilers and B. D. Marx, "Flexible smoothing with B-splines and penalties", 1996
//! * I. D. Currie, M. Durban and P. H. C. Eilers, "Generalized linear array models", 2006
use std::fmt;

use itertools::Itertools;

use crate::config::{PSplineConfig, ResolvedConfig};
use crate::design::{design_matrix, tensor_design, tensor_gram};
use crate::error::{Result, SmoothingError};
use crate::knots::KnotVector;
use crate::penalty::{difference_penalty, tensor_penalty, PENALTY_ORDER};
use crate::sparse::{solve_spd, CooMatrix};

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Advisory conditions detected before the solve. None of these stop the fit.
#[derive(Clone, Debug, PartialEq)]
pub enum SmoothingWarning {
    /// More dimensions than the configured comfort limit
    HighDimensionality { ndims: usize, limit: usize },
    /// The basis along an axis is as large as its bin count, so the fit
    /// tends towards interpolating the data rather than smoothing it
    KnotsNearBinCount {
        axis: usize,
        knots: usize,
        n_basis: usize,
        bins: usize,
    },
    /// A dense system of this size would exceed the configured memory limit
    MemoryEstimate { gib: f64, limit_gib: f64 },
}

impl fmt::Display for SmoothingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HighDimensionality { ndims, limit } => write!(
                f,
                "smoothing a {ndims}D grid (more than {limit} dimensions) may be computationally \
                 intensive; consider reducing knots per axis"
            ),
            Self::KnotsNearBinCount {
                axis,
                knots,
                n_basis,
                bins,
            } => write!(
                f,
                "{knots} knots ({n_basis} basis functions) on axis {axis} is close to the number \
                 of bins ({bins}); consider reducing knots per axis"
            ),
            Self::MemoryEstimate { gib, limit_gib } => write!(
                f,
                "estimated memory requirement {gib:.1} GiB exceeds {limit_gib:.1} GiB; consider \
                 reducing knots per axis for dimensions with many knots"
            ),
        }
    }
}

/// A fitted tensor-product P-spline.
///
/// Holds the smoothed grid along with everything needed to evaluate the
/// fitted surface at arbitrary points.
#[derive(Clone, Debug)]
pub struct PSpline {
    /// Size of each dimension of the input grid
    dims: Vec<usize>,
    /// Knot vector for each axis
    knots: Vec<KnotVector<f64>>,
    /// Regularization strength for each axis
    lambdas: Vec<f64>,
    /// Basis functions per axis
    n_basis: Vec<usize>,
    /// Cumulative product of higher basis counts, for C-order indexing
    basis_strides: Vec<usize>,
    /// Solved coefficients, C-ordered over per-axis basis indices
    coefficients: Vec<f64>,
    /// Fitted values at the input grid points, C-ordered like the input
    smoothed: Vec<f64>,
    warnings: Vec<SmoothingWarning>,
}

/// Smooth an N-dimensional grid with tensor-product P-splines.
///
/// Assumes C-style ordering of vals (z(x0, y0), z(x0, y1), ..., z(x0, yn), z(x1, y0), ...),
/// with `grids[i]` holding the strictly increasing bin centers of axis `i`.
///
/// Advisory warnings are logged and also kept on the result, see [`PSpline::warnings`].
///
/// # Errors
/// * [`SmoothingError::InvalidConfig`] for a 0-dimensional grid or invalid hyperparameters
/// * [`SmoothingError::Shape`] if a grid has fewer than 2 points, is not finite and strictly
///   increasing, the number of values does not match the grid, or any value is not finite
/// * [`SmoothingError::Solve`] if the penalized system cannot be solved
/// * [`SmoothingError::Unexpected`] for any other failure while building the system
pub fn smooth(grids: &[&[f64]], vals: &[f64], config: &PSplineConfig) -> Result<PSpline> {
    let dims: Vec<usize> = grids.iter().map(|g| g.len()).collect();
    let resolved = config.resolve(&dims)?;
    check_grid(grids, vals)?;

    let ndims = dims.len();
    log::debug!("Processing {ndims}D grid with shape {dims:?}");

    let warnings = advisories(&dims, &resolved, config);
    for w in &warnings {
        log::warn!("{w}");
    }

    log::debug!(
        "Using knots per axis {:?}, lambdas {:?}, degrees {:?}",
        resolved.knots,
        resolved.lambdas,
        resolved.degrees
    );

    fit(grids, vals, dims, resolved, warnings).map_err(|e| match e {
        e @ SmoothingError::Solve { .. } | e @ SmoothingError::Unexpected(_) => e,
        other => SmoothingError::Unexpected(other.to_string()),
    })
}

/// Check that grids are usable and consistent with the values.
fn check_grid(grids: &[&[f64]], vals: &[f64]) -> Result<()> {
    for (i, g) in grids.iter().enumerate() {
        if g.len() < 2 {
            return Err(SmoothingError::Shape(format!(
                "axis {i} has {} points; all grids must have at least 2 entries",
                g.len()
            )));
        }
        if g.iter().any(|x| !x.is_finite()) {
            return Err(SmoothingError::Shape(format!(
                "axis {i} has non-finite coordinates"
            )));
        }
        if g.windows(2).any(|w| w[1] <= w[0]) {
            return Err(SmoothingError::Shape(format!(
                "axis {i} is not strictly increasing"
            )));
        }
    }

    let nvals: usize = grids.iter().map(|g| g.len()).product();
    if vals.len() != nvals {
        return Err(SmoothingError::Shape(format!(
            "got {} values for a grid of {nvals} points",
            vals.len()
        )));
    }
    if let Some(i) = vals.iter().position(|v| !v.is_finite()) {
        return Err(SmoothingError::Shape(format!(
            "value at flat index {i} is not finite"
        )));
    }
    Ok(())
}

/// Collect the advisory warnings for a validated configuration.
fn advisories(
    dims: &[usize],
    resolved: &ResolvedConfig,
    config: &PSplineConfig,
) -> Vec<SmoothingWarning> {
    let mut warnings = Vec::new();
    let ndims = dims.len();

    if ndims > config.max_ndims_warn {
        warnings.push(SmoothingWarning::HighDimensionality {
            ndims,
            limit: config.max_ndims_warn,
        });
    }

    let n_basis = resolved.n_basis();
    for axis in 0..ndims {
        if n_basis[axis] >= dims[axis] {
            warnings.push(SmoothingWarning::KnotsNearBinCount {
                axis,
                knots: resolved.knots[axis],
                n_basis: n_basis[axis],
                bins: dims[axis],
            });
        }
    }

    // Size of a dense (total x total) f64 system
    let total: f64 = n_basis.iter().map(|&n| n as f64).product();
    let gib = total * total * 8.0 / BYTES_PER_GIB;
    if gib > config.memory_warn_gib {
        warnings.push(SmoothingWarning::MemoryEstimate {
            gib,
            limit_gib: config.memory_warn_gib,
        });
    }

    warnings
}

/// Build and solve the penalized system for an already-validated input.
fn fit(
    grids: &[&[f64]],
    vals: &[f64],
    dims: Vec<usize>,
    resolved: ResolvedConfig,
    warnings: Vec<SmoothingWarning>,
) -> Result<PSpline> {
    let ndims = dims.len();

    let knots = grids
        .iter()
        .zip(resolved.knots.iter().zip(resolved.degrees.iter()))
        .map(|(g, (&k, &d))| KnotVector::for_centers(g, k, d))
        .collect::<Result<Vec<_>>>()?;

    let designs: Vec<CooMatrix> = grids
        .iter()
        .zip(knots.iter())
        .map(|(g, kv)| design_matrix(g, kv))
        .collect();
    let n_basis: Vec<usize> = designs.iter().map(|b| b.ncols()).collect();
    let total: usize = n_basis.iter().product();
    log::debug!("Total basis functions: {total}");

    let penalties: Vec<CooMatrix> = n_basis
        .iter()
        .map(|&n| difference_penalty(n, PENALTY_ORDER))
        .collect();

    log::debug!("Building {ndims}D tensor system");
    let b_tensor = tensor_design(&designs)?;
    log::debug!(
        "Design matrix shape: ({}, {}), {} nonzeros",
        b_tensor.nrows(),
        b_tensor.ncols(),
        b_tensor.nnz()
    );

    let mut system = tensor_gram(&designs)?;
    system.add_assign(&tensor_penalty(&penalties, &resolved.lambdas, &n_basis)?)?;
    system.compress();

    let mut rhs = vec![0.0; total];
    b_tensor.tr_matvec(vals, &mut rhs)?;

    log::debug!("Solving penalized system with {} nonzeros", system.nnz());
    let coefficients = solve_spd(&system, &rhs)?;

    let mut smoothed = vec![0.0; vals.len()];
    b_tensor.matvec(&coefficients, &mut smoothed)?;

    log::info!("{ndims}D P-spline smoothing completed with {total} basis functions");

    Ok(PSpline {
        dims,
        knots,
        lambdas: resolved.lambdas,
        basis_strides: strides(&n_basis),
        n_basis,
        coefficients,
        smoothed,
        warnings,
    })
}

/// Cumulative product of the sizes of the dimensions after each one
fn strides(sizes: &[usize]) -> Vec<usize> {
    let mut out = vec![1_usize; sizes.len()];
    for i in (0..sizes.len().saturating_sub(1)).rev() {
        out[i] = out[i + 1] * sizes[i + 1];
    }
    out
}

impl PSpline {
    /// Number of dimensions
    pub fn ndims(&self) -> usize {
        self.dims.len()
    }

    /// Shape of the input (and smoothed) grid
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Smoothed values at the input grid points, C-ordered like the input
    pub fn smoothed(&self) -> &[f64] {
        &self.smoothed
    }

    /// Take ownership of the smoothed values
    pub fn into_smoothed(self) -> Vec<f64> {
        self.smoothed
    }

    /// Solved spline coefficients, C-ordered over the per-axis basis indices
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Basis functions per axis
    pub fn n_basis(&self) -> &[usize] {
        &self.n_basis
    }

    pub fn knot_vectors(&self) -> &[KnotVector<f64>] {
        &self.knots
    }

    pub fn degrees(&self) -> Vec<usize> {
        self.knots.iter().map(|k| k.degree()).collect()
    }

    pub fn lambdas(&self) -> &[f64] {
        &self.lambdas
    }

    /// Advisory warnings raised while fitting
    pub fn warnings(&self) -> &[SmoothingWarning] {
        &self.warnings
    }

    /// Roughness of the coefficients along one axis: the sum of squared
    /// second differences between neighbouring coefficients on that axis.
    /// This is the penalty term for that axis before scaling by lambda;
    /// validated configurations always have enough basis functions per axis
    /// for the difference penalty to apply.
    ///
    /// # Errors
    /// * If `axis` is out of range
    pub fn roughness(&self, axis: usize) -> Result<f64> {
        if axis >= self.ndims() {
            return Err(SmoothingError::Query(format!(
                "axis {axis} out of range for {} dimensions",
                self.ndims()
            )));
        }
        let n = self.n_basis[axis];
        let stride = self.basis_strides[axis];
        let c = &self.coefficients;

        let mut total = 0.0;
        for flat in 0..c.len() {
            let i = (flat / stride) % n;
            if i + 2 < n {
                let d = c[flat] - 2.0 * c[flat + stride] + c[flat + 2 * stride];
                total += d * d;
            }
        }
        Ok(total)
    }

    /// Evaluate the fitted surface at one point, given as any slice-like
    /// container of N coordinates (`[x, y]`, `&[x, y][..]`, `vec![x, y]`).
    ///
    /// Only the `degree + 1` basis functions supported at the point on each
    /// axis contribute, so the cost is `prod(degree_i + 1)` per point.
    ///
    /// Points outside the knot domain on any axis lie outside the support of
    /// every basis function there and evaluate to zero; behavior beyond the
    /// range of the input grid is not meant to be relied on.
    ///
    /// # Errors
    /// * If the point does not have exactly N coordinates
    /// * If any coordinate is non-finite
    pub fn eval_one<P: AsRef<[f64]>>(&self, point: P) -> Result<f64> {
        let x = point.as_ref();
        let ndims = self.ndims();
        if x.len() != ndims {
            return Err(SmoothingError::Query(format!(
                "expected {ndims} coordinates, got {}",
                x.len()
            )));
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(SmoothingError::Query(
                "coordinates must be finite".to_string(),
            ));
        }

        let mut locals = Vec::with_capacity(ndims);
        for (kv, &xi) in self.knots.iter().zip(x.iter()) {
            match kv.local_basis(xi) {
                Some(local) => locals.push(local),
                None => return Ok(0.0),
            }
        }

        let mut acc = 0.0;
        for offsets in locals.iter().map(|l| 0..l.order).multi_cartesian_product() {
            let mut weight = 1.0;
            let mut flat = 0;
            for (d, &o) in offsets.iter().enumerate() {
                weight *= locals[d].values[o];
                flat += (locals[d].first + o) * self.basis_strides[d];
            }
            acc += weight * self.coefficients[flat];
        }
        Ok(acc)
    }

    /// Evaluate the fitted surface on a contiguous list of observation points,
    /// given as one coordinate slice per axis.
    ///
    /// # Errors
    ///   * If the number of coordinate slices does not match the dimensionality
    ///   * If the coordinate slices and output have different lengths
    ///   * If any coordinate is non-finite
    pub fn eval(&self, obs: &[&[f64]], out: &mut [f64]) -> Result<()> {
        let ndims = self.ndims();
        if obs.len() != ndims {
            return Err(SmoothingError::Query(format!(
                "expected {ndims} coordinate arrays, got {}",
                obs.len()
            )));
        }
        if obs.iter().any(|o| o.len() != out.len()) {
            return Err(SmoothingError::Query(
                "all coordinate arrays must have the same length as the output".to_string(),
            ));
        }

        let mut tmp = vec![0.0; ndims];
        for i in 0..out.len() {
            (0..ndims).for_each(|j| tmp[j] = obs[j][i]);
            out[i] = self.eval_one(&tmp)?;
        }
        Ok(())
    }

    /// Evaluate the fitted surface, allocating a new Vec for the output.
    pub fn eval_alloc(&self, obs: &[&[f64]]) -> Result<Vec<f64>> {
        let n = obs.first().map_or(0, |o| o.len());
        let mut out = vec![0.0; n];
        self.eval(obs, &mut out)?;
        Ok(out)
    }

    /// A closure evaluating the fitted surface at one point.
    pub fn evaluator(&self) -> impl Fn(&[f64]) -> Result<f64> + '_ {
        move |x| self.eval_one(x)
    }
}

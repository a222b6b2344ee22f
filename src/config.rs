//! Smoothing hyperparameters and their validation.
//!
//! Every per-axis parameter is either one value broadcast to all axes
//! or exactly one value per axis.
//!
//! ```rust
//! use ndpspline::{PSplineConfig, PerAxis};
//!
//! let cfg = PSplineConfig::default()
//!     .with_lambda(vec![1000.0, 800.0])
//!     .with_degree(3)
//!     .with_knots(vec![8, 6]);
//! assert_eq!(cfg.lambda, PerAxis::Each(vec![1000.0, 800.0]));
//! ```
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, SmoothingError};
use crate::knots::MAX_DEGREE;

/// Smallest allowed interior knot count, before accounting for degree
pub const MIN_KNOTS: usize = 3;

/// A parameter given once for all axes or once per axis.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PerAxis<T> {
    /// Same value on every axis
    Uniform(T),
    /// One value per axis, in axis order
    Each(Vec<T>),
}

impl<T: Clone> PerAxis<T> {
    /// Expand to exactly `ndims` values.
    ///
    /// A one-element `Each` is broadcast like `Uniform`.
    ///
    /// # Errors
    /// * If `Each` has a length other than 1 or `ndims`
    pub fn resolve(&self, ndims: usize, param: &'static str) -> Result<Vec<T>> {
        match self {
            PerAxis::Uniform(v) => Ok(vec![v.clone(); ndims]),
            PerAxis::Each(v) if v.len() == 1 => Ok(vec![v[0].clone(); ndims]),
            PerAxis::Each(v) if v.len() == ndims => Ok(v.clone()),
            PerAxis::Each(v) => Err(SmoothingError::config(
                param,
                format!("must be scalar or have {ndims} elements, got {}", v.len()),
            )),
        }
    }
}

impl<T> From<T> for PerAxis<T> {
    fn from(v: T) -> Self {
        PerAxis::Uniform(v)
    }
}

impl<T> From<Vec<T>> for PerAxis<T> {
    fn from(v: Vec<T>) -> Self {
        PerAxis::Each(v)
    }
}

impl<T: Clone, const N: usize> From<[T; N]> for PerAxis<T> {
    fn from(v: [T; N]) -> Self {
        PerAxis::Each(v.to_vec())
    }
}

/// Hyperparameters of the tensor-product P-spline smoother.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PSplineConfig {
    /// Regularization strength per axis; larger is smoother. Must be positive.
    pub lambda: PerAxis<f64>,
    /// B-spline degree per axis, 1 to 5. 3 is cubic.
    pub degree: PerAxis<usize>,
    /// Interior knots per axis. `None` derives a count from the bin count and
    /// dimensionality, see [`default_knots`].
    pub knots: Option<PerAxis<usize>>,
    /// Warn when the dense system size estimate exceeds this many GiB
    pub memory_warn_gib: f64,
    /// Warn when smoothing more than this many dimensions
    pub max_ndims_warn: usize,
}

impl Default for PSplineConfig {
    fn default() -> Self {
        Self {
            lambda: PerAxis::Uniform(1000.0),
            degree: PerAxis::Uniform(3),
            knots: None,
            memory_warn_gib: 100.0,
            max_ndims_warn: 10,
        }
    }
}

impl PSplineConfig {
    pub fn with_lambda(mut self, lambda: impl Into<PerAxis<f64>>) -> Self {
        self.lambda = lambda.into();
        self
    }

    pub fn with_degree(mut self, degree: impl Into<PerAxis<usize>>) -> Self {
        self.degree = degree.into();
        self
    }

    pub fn with_knots(mut self, knots: impl Into<PerAxis<usize>>) -> Self {
        self.knots = Some(knots.into());
        self
    }

    pub fn with_memory_warn_gib(mut self, gib: f64) -> Self {
        self.memory_warn_gib = gib;
        self
    }

    /// Validate against the per-axis bin counts and expand every parameter
    /// to one value per axis.
    ///
    /// # Errors
    /// * If there are no axes
    /// * If a per-axis list has the wrong length
    /// * If a lambda is not strictly positive and finite
    /// * If a degree is outside `[1, 5]`
    /// * If a knot count is below `max(3, degree)`
    pub fn resolve(&self, bins: &[usize]) -> Result<ResolvedConfig> {
        let ndims = bins.len();
        if ndims == 0 {
            return Err(SmoothingError::config(
                "dimensions",
                "cannot smooth a 0-dimensional grid",
            ));
        }

        let lambdas = self.lambda.resolve(ndims, "lambda")?;
        if let Some(bad) = lambdas.iter().find(|&&l| !(l > 0.0 && l.is_finite())) {
            return Err(SmoothingError::config(
                "lambda",
                format!("all values must be positive and finite, got {bad}"),
            ));
        }

        let degrees = self.degree.resolve(ndims, "degree")?;
        if let Some(bad) = degrees.iter().find(|&&d| d < 1 || d > MAX_DEGREE) {
            return Err(SmoothingError::config(
                "degree",
                format!("all values must be between 1 and {MAX_DEGREE}, got {bad}"),
            ));
        }

        let knots = match &self.knots {
            Some(k) => k.resolve(ndims, "knots per axis")?,
            None => bins.iter().map(|&n| default_knots(n, ndims)).collect(),
        };
        for (axis, (&k, &d)) in knots.iter().zip(degrees.iter()).enumerate() {
            let min = MIN_KNOTS.max(d);
            if k < min {
                return Err(SmoothingError::config(
                    "knots per axis",
                    format!("need at least max(3, degree) = {min} knots, got {k} for axis {axis}"),
                ));
            }
        }

        Ok(ResolvedConfig {
            lambdas,
            degrees,
            knots,
        })
    }
}

/// Per-axis parameters after broadcasting and validation
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedConfig {
    pub lambdas: Vec<f64>,
    pub degrees: Vec<usize>,
    pub knots: Vec<usize>,
}

impl ResolvedConfig {
    /// Basis functions per axis, `knots + degree + 1`
    pub fn n_basis(&self) -> Vec<usize> {
        self.knots
            .iter()
            .zip(self.degrees.iter())
            .map(|(k, d)| k + d + 1)
            .collect()
    }
}

/// Interior knot count used when none is given, shrinking as the number of
/// dimensions grows to keep the tensor system size in check.
pub fn default_knots(n_bins: usize, ndims: usize) -> usize {
    match ndims {
        0..=4 => (n_bins / 3).min(15).max(4),
        5..=6 => (n_bins / 4).min(10).max(4),
        _ => (n_bins / 5).min(8).max(3),
    }
}

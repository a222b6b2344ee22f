//! N-dimensional smoothing of gridded data with tensor-product penalized
//! B-splines (P-splines).
//!
//! A grid of noisy values, such as a binned histogram, is fitted with a
//! B-spline surface whose coefficients carry a second-order difference
//! penalty along each axis. The regularization strength per axis trades
//! fidelity to the data for smoothness. The result holds the smoothed grid
//! and can evaluate the fitted surface anywhere inside the grid.
//!
//! # Performance Scalings
//! The number of basis functions is the product over axes of
//! `knots + degree + 1`, so the size of the linear system grows
//! multiplicatively with the number of dimensions. The design matrix has
//! `prod(degree_i + 1)` nonzeros per grid point and the system is solved with
//! a sparse Cholesky factorization. Default knot counts shrink as the number
//! of dimensions grows, and advisory warnings are raised for configurations
//! that are likely to be slow or to interpolate rather than smooth.
//!
//! | Operation             | Cost per call                                   |
//! |-----------------------|-------------------------------------------------|
//! | `smooth`              | build O(ngrid * prod(degree + 1)) + sparse solve |
//! | `PSpline::eval_one`   | O(prod(degree + 1)) + ndims * log2(nknots)       |
//!
//! # Example: 2D grid
//! ```rust
//! use ndpspline::{smooth, PSplineConfig};
//!
//! // Bin centers for each axis
//! let x: Vec<f64> = (0..20).map(|i| i as f64 + 0.5).collect();
//! let y: Vec<f64> = (0..15).map(|i| i as f64 * 0.1).collect();
//!
//! // Values at grid points, C-ordered
//! let z: Vec<f64> = x
//!     .iter()
//!     .flat_map(|&xi| y.iter().map(move |&yj| (xi / 4.0).cos() * (1.0 + yj)))
//!     .collect();
//!
//! let cfg = PSplineConfig::default()
//!     .with_lambda(vec![1000.0, 800.0])
//!     .with_knots(vec![8, 6]);
//! let fit = smooth(&[&x[..], &y[..]], &z, &cfg).unwrap();
//!
//! // Smoothed grid has the same shape as the input
//! assert_eq!(fit.dims(), &[20, 15]);
//!
//! // Evaluate the fitted surface at a point
//! let v = fit.eval_one([5.0, 1.0]).unwrap();
//! assert!(v.is_finite());
//! ```
// These "needless" range loops are a significant speedup
#![allow(clippy::needless_range_loop)]

pub mod basis;
pub mod config;
pub mod design;
pub mod error;
pub mod knots;
pub mod penalty;
pub mod smoother;
pub mod sparse;
pub mod sweep;
pub mod utils;

pub use basis::{LocalBasis, Support};
pub use config::{default_knots, PSplineConfig, PerAxis};
pub use error::{Result, SmoothingError};
pub use knots::KnotVector;
pub use smoother::{smooth, PSpline, SmoothingWarning};
pub use sweep::{SweepPoint, SweepSpec};

#[cfg(test)]
pub(crate) mod testing;

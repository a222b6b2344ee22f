//! Clamped knot vectors.
//!
//! A clamped (open) knot vector repeats each boundary knot `degree + 1` times,
//! which pins the spline to the ends of its domain; interior knots are
//! evenly spaced between them.
//!
//! ```rust
//! use ndpspline::KnotVector;
//!
//! let centers = [0.5_f64, 1.5, 2.5, 3.5, 4.5, 5.5];
//! let kv = KnotVector::for_centers(&centers, 3, 3).unwrap();
//! assert_eq!(kv.len(), 3 + 2 * (3 + 1));
//! assert_eq!(kv.n_basis(), 3 + 3 + 1);
//! ```
use num_traits::Float;

use crate::error::{Result, SmoothingError};
use crate::utils::linspace;

/// Highest supported polynomial degree.
pub const MAX_DEGREE: usize = 5;

/// Number of basis functions that are nonzero at any point, at most.
pub const MAX_ORDER: usize = MAX_DEGREE + 1;

/// Relative padding applied to the coordinate range so that the outermost
/// bin centers sit strictly inside the knot domain.
const RANGE_PADDING: f64 = 1e-10;

/// A non-decreasing knot sequence together with the degree of the
/// B-spline basis it defines.
#[derive(Clone, Debug, PartialEq)]
pub struct KnotVector<T: Float> {
    knots: Vec<T>,
    degree: usize,
}

impl<T: Float> KnotVector<T> {
    /// Wrap an existing knot sequence.
    ///
    /// # Errors
    /// * If `degree` is 0 or exceeds [`MAX_DEGREE`]
    /// * If there are fewer than `2 * (degree + 1)` knots
    /// * If any knot is non-finite or the sequence decreases anywhere
    /// * If the domain `[knots[degree], knots[len - degree - 1]]` is empty
    pub fn new(knots: Vec<T>, degree: usize) -> Result<Self> {
        if degree == 0 || degree > MAX_DEGREE {
            return Err(SmoothingError::config(
                "knot vector",
                format!("degree must be between 1 and {MAX_DEGREE}, got {degree}"),
            ));
        }
        if knots.len() < 2 * (degree + 1) {
            return Err(SmoothingError::config(
                "knot vector",
                format!(
                    "need at least {} knots for degree {degree}, got {}",
                    2 * (degree + 1),
                    knots.len()
                ),
            ));
        }
        if knots.iter().any(|k| !k.is_finite()) {
            return Err(SmoothingError::config("knot vector", "knots must be finite"));
        }
        if knots.windows(2).any(|w| w[1] < w[0]) {
            return Err(SmoothingError::config(
                "knot vector",
                "knots must be non-decreasing",
            ));
        }
        let n_basis = knots.len() - degree - 1;
        if knots[n_basis] <= knots[degree] {
            return Err(SmoothingError::config("knot vector", "knot domain is empty"));
        }

        Ok(Self { knots, degree })
    }

    /// Clamped knot vector on `[lo, hi]` with `n_interior` evenly spaced interior knots.
    ///
    /// # Errors
    /// * If `lo >= hi`, or either is non-finite
    /// * If `degree` is out of range (see [`KnotVector::new`])
    pub fn clamped(lo: T, hi: T, n_interior: usize, degree: usize) -> Result<Self> {
        if !(lo.is_finite() && hi.is_finite()) || lo >= hi {
            return Err(SmoothingError::config(
                "knot vector",
                "domain bounds must be finite and increasing",
            ));
        }
        let interior = linspace(lo, hi, n_interior + 2);

        let mut knots = Vec::with_capacity(n_interior + 2 * (degree + 1));
        knots.extend(std::iter::repeat(lo).take(degree + 1));
        knots.extend_from_slice(&interior[1..=n_interior]);
        knots.extend(std::iter::repeat(hi).take(degree + 1));

        Self::new(knots, degree)
    }

    /// Clamped knot vector covering a set of increasing bin centers,
    /// padded by a tiny fraction of the range on each side.
    pub fn for_centers(centers: &[T], n_interior: usize, degree: usize) -> Result<Self> {
        let (first, last) = match (centers.first(), centers.last()) {
            (Some(&a), Some(&b)) => (a, b),
            _ => {
                return Err(SmoothingError::Shape(
                    "cannot build knots for an empty axis".to_string(),
                ))
            }
        };
        let pad = (last - first) * T::from(RANGE_PADDING).unwrap_or_else(T::epsilon);

        Self::clamped(first - pad, last + pad, n_interior, degree)
    }

    /// Polynomial degree of the basis
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Total number of knots, including repeated boundary knots
    pub fn len(&self) -> usize {
        self.knots.len()
    }

    /// Always false; a valid knot vector has at least `2 * (degree + 1)` knots
    pub fn is_empty(&self) -> bool {
        self.knots.is_empty()
    }

    /// Number of basis functions defined by this knot vector
    pub fn n_basis(&self) -> usize {
        self.knots.len() - self.degree - 1
    }

    /// Closed interval on which the basis functions sum to one
    pub fn domain(&self) -> (T, T) {
        (self.knots[self.degree], self.knots[self.n_basis()])
    }

    /// Knot values
    pub fn as_slice(&self) -> &[T] {
        &self.knots
    }

    /// The `degree + 2` knots supporting basis function `j`
    pub fn local_knots(&self, j: usize) -> &[T] {
        &self.knots[j..j + self.degree + 2]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_clamped_structure() {
        let kv = KnotVector::clamped(0.0_f64, 10.0, 4, 3).unwrap();
        let k = kv.as_slice();
        assert_eq!(k.len(), 4 + 8);
        assert!(k[..4].iter().all(|&x| x == 0.0));
        assert!(k[8..].iter().all(|&x| x == 10.0));
        assert_eq!(&k[4..8], &[2.0, 4.0, 6.0, 8.0]);
        assert_eq!(kv.n_basis(), 8);
        assert_eq!(kv.domain(), (0.0, 10.0));
    }

    #[test]
    fn test_for_centers_pads_range() {
        let centers = [1.0_f64, 2.0, 3.0];
        let kv = KnotVector::for_centers(&centers, 3, 2).unwrap();
        let (lo, hi) = kv.domain();
        assert!(lo < 1.0 && lo > 1.0 - 1e-8);
        assert!(hi > 3.0 && hi < 3.0 + 1e-8);
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(KnotVector::new(vec![0.0_f64, 1.0, 0.5, 2.0], 1).is_err());
        assert!(KnotVector::new(vec![0.0_f64, 0.0, 1.0], 1).is_err());
        assert!(KnotVector::new(vec![0.0_f64, f64::NAN, 1.0, 1.0], 1).is_err());
        assert!(KnotVector::new(vec![0.0_f64; 8], 3).is_err());
        assert!(KnotVector::clamped(1.0_f64, 1.0, 3, 3).is_err());
        assert!(KnotVector::clamped(0.0_f64, 1.0, 3, 6).is_err());
    }
}

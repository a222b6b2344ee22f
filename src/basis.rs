//! B-spline basis evaluation.
//!
//! At any point inside the knot domain, only `degree + 1` consecutive basis
//! functions are nonzero. [`KnotVector::local_basis`] finds the knot span
//! containing the point with a bisection search and evaluates those functions
//! together with the triangular de Boor recurrence, using fixed-size stack
//! storage and no allocation.
//!
//! A point outside the knot domain lies outside the support of every basis
//! function; this is reported as [`Support::Outside`] and contributes zero,
//! which is distinct from a malformed knot vector (rejected when the
//! [`KnotVector`] is built).
//!
//! References
//! * C. de Boor, "A Practical Guide to Splines", ch. IX
//! * L. Piegl and W. Tiller, "The NURBS Book", algorithm A2.2
use num_traits::Float;

use crate::error::{Result, SmoothingError};
use crate::knots::{KnotVector, MAX_ORDER};

/// Location of a point relative to the support of a basis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Support {
    /// Inside the domain, in the knot span `[t[span], t[span + 1])`.
    /// At the upper domain edge, the last nonempty span is used.
    Inside(usize),
    /// Outside the domain; every basis function is zero here.
    Outside,
}

/// Values of the nonzero basis functions at a point.
#[derive(Clone, Copy, Debug)]
pub struct LocalBasis<T> {
    /// Index of the first nonzero basis function
    pub first: usize,
    /// Basis values for indices `first..first + order`
    pub values: [T; MAX_ORDER],
    /// Number of populated entries, `degree + 1`
    pub order: usize,
}

impl<T: Float> LocalBasis<T> {
    /// Iterate over `(basis index, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (usize, T)> + '_ {
        self.values[..self.order]
            .iter()
            .enumerate()
            .map(move |(i, &v)| (self.first + i, v))
    }
}

impl<T: Float> KnotVector<T> {
    /// Classify a point against the knot domain.
    #[inline]
    pub fn support(&self, x: T) -> Support {
        let k = self.as_slice();
        let p = self.degree();
        let n = self.n_basis();
        // NaN fails both comparisons and lands here too
        if !(x >= k[p] && x <= k[n]) {
            return Support::Outside;
        }

        if x == k[n] {
            // Closed upper edge: step back over repeated knots to the last nonempty span
            let mut span = n - 1;
            while span > p && k[span] == k[span + 1] {
                span -= 1;
            }
            return Support::Inside(span);
        }

        // Largest index with k[span] <= x, which is in [p, n - 1] for x in [k[p], k[n])
        let span = (k[..=n].partition_point(|&t| t <= x) - 1).clamp(p, n - 1);
        Support::Inside(span)
    }

    /// Evaluate the nonzero basis functions at `x`,
    /// or `None` if `x` is outside the knot domain.
    #[inline]
    pub fn local_basis(&self, x: T) -> Option<LocalBasis<T>> {
        let span = match self.support(x) {
            Support::Inside(span) => span,
            Support::Outside => return None,
        };

        let k = self.as_slice();
        let p = self.degree();
        let mut values = [T::zero(); MAX_ORDER];
        let mut left = [T::zero(); MAX_ORDER];
        let mut right = [T::zero(); MAX_ORDER];

        values[0] = T::one();
        for j in 1..=p {
            left[j] = x - k[span + 1 - j];
            right[j] = k[span + j] - x;
            let mut saved = T::zero();
            for r in 0..j {
                let denom = right[r + 1] + left[j - r];
                let temp = if denom > T::zero() {
                    values[r] / denom
                } else {
                    T::zero()
                };
                values[r] = saved + right[r + 1] * temp;
                saved = left[j - r] * temp;
            }
            values[j] = saved;
        }

        Some(LocalBasis {
            first: span - p,
            values,
            order: p + 1,
        })
    }

    /// Evaluate every basis function at `x` into `out`, which must have
    /// length `n_basis()`. Entries outside the local support are set to zero.
    ///
    /// # Errors
    /// * If `out` has the wrong length
    pub fn eval_all(&self, x: T, out: &mut [T]) -> Result<()> {
        if out.len() != self.n_basis() {
            return Err(SmoothingError::Shape(format!(
                "basis output has length {}, expected {}",
                out.len(),
                self.n_basis()
            )));
        }
        out.iter_mut().for_each(|v| *v = T::zero());
        if let Some(local) = self.local_basis(x) {
            for (j, v) in local.iter() {
                out[j] = v;
            }
        }
        Ok(())
    }
}

/// Evaluate a single B-spline basis function defined by its own
/// `degree + 2` knots, via the Cox-de Boor recursion.
///
/// The function is supported on the half-open interval `[knots[0], knots[last])`
/// and is zero elsewhere. Zero-width sub-intervals contribute nothing.
///
/// ```rust
/// use ndpspline::basis::basis_element;
///
/// // Linear "hat" function on [0, 2] peaking at 1
/// assert_eq!(basis_element(&[0.0, 1.0, 2.0], 0.5).unwrap(), 0.5);
/// assert_eq!(basis_element(&[0.0, 1.0, 2.0], 1.0).unwrap(), 1.0);
/// assert_eq!(basis_element(&[0.0, 1.0, 2.0], 3.0).unwrap(), 0.0);
/// ```
///
/// # Errors
/// * If fewer than two knots are given
/// * If the knots are non-finite or decrease anywhere
pub fn basis_element<T: Float>(knots: &[T], x: T) -> Result<T> {
    if knots.len() < 2 {
        return Err(SmoothingError::Unexpected(format!(
            "basis element needs at least 2 knots, got {}",
            knots.len()
        )));
    }
    if knots.iter().any(|k| !k.is_finite()) || knots.windows(2).any(|w| w[1] < w[0]) {
        return Err(SmoothingError::Unexpected(
            "basis element knots must be finite and non-decreasing".to_string(),
        ));
    }
    Ok(cox_de_boor(knots, x))
}

fn cox_de_boor<T: Float>(t: &[T], x: T) -> T {
    let k = t.len() - 2;
    if k == 0 {
        return if t[0] <= x && x < t[1] {
            T::one()
        } else {
            T::zero()
        };
    }

    let mut acc = T::zero();
    let w0 = t[k] - t[0];
    if w0 > T::zero() {
        acc = acc + (x - t[0]) / w0 * cox_de_boor(&t[..k + 1], x);
    }
    let w1 = t[k + 1] - t[1];
    if w1 > T::zero() {
        acc = acc + (t[k + 1] - x) / w1 * cox_de_boor(&t[1..], x);
    }
    acc
}

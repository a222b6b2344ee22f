//! Hyperparameter sweeps over the smoother.
//!
//! Every point of the sweep is an independent fit with its own copy of the
//! configuration, run on the rayon thread pool. Results come back through
//! the parallel iterator in the order of [`SweepSpec::points`]; a failing
//! point keeps its error instead of aborting the sweep.
//!
//! ```rust
//! use ndpspline::{sweep, PSplineConfig, SweepSpec};
//!
//! let x: Vec<f64> = (0..30).map(|i| i as f64 + 0.5).collect();
//! let y: Vec<f64> = x.iter().map(|v| (v / 5.0).sin()).collect();
//!
//! let spec = SweepSpec {
//!     lambdas: vec![0.1, 10.0, 1000.0],
//!     knots: vec![vec![5], vec![8]],
//!     degrees: vec![3],
//! };
//! let results = sweep::sweep(&[&x[..]], &y, &spec, &PSplineConfig::default());
//! assert_eq!(results.len(), 6);
//! assert!(sweep::best(&results).is_some());
//! ```
use std::collections::BTreeMap;

use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::{PSplineConfig, PerAxis};
use crate::error::{Result, SmoothingError};
use crate::smoother::smooth;

/// Grid of hyperparameters to try. Every combination is fitted.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SweepSpec {
    /// Regularization strengths, applied to every axis
    pub lambdas: Vec<f64>,
    /// Knot configurations; each entry is one count per axis, or a single count for all
    pub knots: Vec<Vec<usize>>,
    /// Degrees, applied to every axis
    pub degrees: Vec<usize>,
}

impl SweepSpec {
    /// Every (lambda, knots, degree) combination, lambda outermost
    pub fn points(&self) -> Vec<(f64, Vec<usize>, usize)> {
        let mut out = Vec::with_capacity(self.len());
        for &lambda in &self.lambdas {
            for knots in &self.knots {
                for &degree in &self.degrees {
                    out.push((lambda, knots.clone(), degree));
                }
            }
        }
        out
    }

    /// Number of combinations
    pub fn len(&self) -> usize {
        self.lambdas.len() * self.knots.len() * self.degrees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Outcome of one sweep point
#[derive(Clone, Debug)]
pub struct SweepPoint {
    pub lambda: f64,
    pub knots: Vec<usize>,
    pub degree: usize,
    /// RMS of `data - smoothed` over the grid, or why the fit failed
    pub rms: Result<f64>,
}

/// Root-mean-square difference between the data and the smoothed values.
///
/// # Errors
/// * If the lengths differ or are zero
pub fn rms_residual(data: &[f64], smoothed: &[f64]) -> Result<f64> {
    if data.len() != smoothed.len() || data.is_empty() {
        return Err(SmoothingError::Shape(format!(
            "cannot compare {} data values with {} smoothed values",
            data.len(),
            smoothed.len()
        )));
    }
    let ss: f64 = data
        .iter()
        .zip(smoothed.iter())
        .map(|(a, b)| (a - b) * (a - b))
        .sum();
    Ok((ss / data.len() as f64).sqrt())
}

/// Fit every point of `spec` in parallel and score it by RMS residual.
///
/// Settings in `base` other than lambda, knots and degree (warning
/// thresholds) are shared by every point.
pub fn sweep(
    grids: &[&[f64]],
    vals: &[f64],
    spec: &SweepSpec,
    base: &PSplineConfig,
) -> Vec<SweepPoint> {
    log::debug!("Running P-spline sweep over {} points", spec.len());

    spec.points()
        .into_par_iter()
        .map(|(lambda, knots, degree)| {
            let cfg = base
                .clone()
                .with_lambda(lambda)
                .with_degree(degree)
                .with_knots(PerAxis::Each(knots.clone()));
            let rms = smooth(grids, vals, &cfg).and_then(|fit| rms_residual(vals, fit.smoothed()));
            if let Err(e) = &rms {
                log::warn!("Sweep point lambda={lambda}, knots={knots:?}, degree={degree} failed: {e}");
            }
            SweepPoint {
                lambda,
                knots,
                degree,
                rms,
            }
        })
        .collect()
}

/// The successful point with the lowest RMS residual
pub fn best(points: &[SweepPoint]) -> Option<&SweepPoint> {
    points
        .iter()
        .filter(|p| matches!(p.rms, Ok(r) if r.is_finite()))
        .min_by(|a, b| {
            let ra = a.rms.as_ref().map_or(f64::INFINITY, |r| *r);
            let rb = b.rms.as_ref().map_or(f64::INFINITY, |r| *r);
            ra.total_cmp(&rb)
        })
}

/// Successful RMS values grouped by knot configuration, each group as
/// `(lambda, rms)` pairs sorted by lambda.
pub fn rms_by_knots(points: &[SweepPoint]) -> BTreeMap<Vec<usize>, Vec<(f64, f64)>> {
    let mut groups: BTreeMap<Vec<usize>, Vec<(f64, f64)>> = BTreeMap::new();
    for p in points {
        if let Ok(rms) = p.rms {
            groups.entry(p.knots.clone()).or_default().push((p.lambda, rms));
        }
    }
    groups
        .values_mut()
        .for_each(|g| g.sort_by(|a, b| a.0.total_cmp(&b.0)));
    groups
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testing::noisy_sine;

    fn spec() -> SweepSpec {
        SweepSpec {
            lambdas: vec![0.01, 1.0, 100.0, 10_000.0],
            knots: vec![vec![4], vec![8], vec![2]],
            degrees: vec![3],
        }
    }

    #[test]
    fn test_points_cover_grid() {
        let s = spec();
        let pts = s.points();
        assert_eq!(pts.len(), 12);
        assert_eq!(s.len(), 12);
        assert_eq!(pts[0], (0.01, vec![4], 3));
        assert_eq!(pts[1], (0.01, vec![8], 3));
        assert!(!s.is_empty());
    }

    #[test]
    fn test_sweep_keeps_failures_and_order() {
        let (x, y) = noisy_sine(0.2);
        let results = sweep(&[&x[..]], &y, &spec(), &PSplineConfig::default());
        assert_eq!(results.len(), 12);

        for (r, (lambda, knots, degree)) in results.iter().zip(spec().points()) {
            assert_eq!((r.lambda, &r.knots, r.degree), (lambda, &knots, degree));
            if knots == vec![2] {
                assert!(matches!(r.rms, Err(SmoothingError::InvalidConfig { .. })));
            } else {
                assert!(r.rms.as_ref().is_ok_and(|v| v.is_finite()));
            }
        }

        // Less regularization follows the data more closely
        let b = best(&results).unwrap();
        assert_eq!(b.lambda, 0.01);
        assert!(b.knots == vec![4] || b.knots == vec![8]);
    }

    #[test]
    fn test_rms_by_knots_groups_sorted() {
        let (x, y) = noisy_sine(0.2);
        let results = sweep(&[&x[..]], &y, &spec(), &PSplineConfig::default());
        let groups = rms_by_knots(&results);
        assert_eq!(groups.len(), 2);
        for g in groups.values() {
            assert_eq!(g.len(), 4);
            assert!(g.windows(2).all(|w| w[0].0 < w[1].0));
            // Residual grows with regularization
            assert!(g.windows(2).all(|w| w[1].1 >= w[0].1 - 1e-12));
        }
    }

    #[test]
    fn test_rms_residual() {
        assert_eq!(rms_residual(&[1.0, 1.0], &[0.0, 2.0]).unwrap(), 1.0);
        assert!(rms_residual(&[1.0], &[1.0, 2.0]).is_err());
        assert!(rms_residual(&[], &[]).is_err());
    }
}

//! Convenience methods for constructing grids in a way that echoes,
//! but does not exactly match, methods common in scripting languages.
use itertools::Itertools;
use num_traits::Float;

/// Generates evenly spaced values from start to stop,
/// including the endpoint, which is always exactly `stop`.
///
/// Returns `[start]` for `n == 1` and an empty vec for `n == 0`.
pub fn linspace<T>(start: T, stop: T, n: usize) -> Vec<T>
where
    T: Float,
{
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let dx: T = (stop - start) / T::from(n - 1).unwrap_or_else(T::one);
            let mut out: Vec<T> = (0..n - 1)
                .map(|i| start + T::from(i).unwrap_or_else(T::zero) * dx)
                .collect();
            out.push(stop);
            out
        }
    }
}

/// Bin centers of `n` equal-width bins spanning `[lo, hi)`.
pub fn bin_centers<T>(lo: T, hi: T, n: usize) -> Vec<T>
where
    T: Float,
{
    let n_t = T::from(n).unwrap_or_else(T::one);
    let width = (hi - lo) / n_t;
    let half = width / (T::one() + T::one());
    (0..n)
        .map(|i| lo + half + T::from(i).unwrap_or_else(T::zero) * width)
        .collect()
}

/// Generates a meshgrid in C ordering (x0, y0, z0, x0, y0, z1, ..., x0, yn, zn)
pub fn meshgrid<T>(x: Vec<&Vec<T>>) -> Vec<Vec<T>>
where
    T: Float,
{
    x.into_iter()
        .multi_cartesian_product()
        .map(|xx| xx.iter().map(|y| **y).collect())
        .collect()
}

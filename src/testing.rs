use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use crate::utils::bin_centers;

/// Fixed random seed to support repeatable testing
const SEED: [u8; 32] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 15, 14, 13, 12, 11, 10, 9, 8, 7, 6,
    5, 4, 3, 2, 1,
];

/// Get a random number generator with a const seed for repeatable testing
pub fn rng_fixed_seed() -> StdRng {
    StdRng::from_seed(SEED)
}

/// Generate `n` uniform noise samples in `[-amplitude, amplitude)`
pub fn noise(rng: &mut StdRng, n: usize, amplitude: f64) -> Vec<f64> {
    std::iter::repeat_with(|| rng.random_range(-amplitude..amplitude))
        .take(n)
        .collect()
}

/// 30 bins on `[0, 30)` holding `sin(x / 5)` plus uniform noise of the given amplitude
pub fn noisy_sine(amplitude: f64) -> (Vec<f64>, Vec<f64>) {
    let x = bin_centers(0.0_f64, 30.0, 30);
    let mut rng = rng_fixed_seed();
    let eps = noise(&mut rng, x.len(), amplitude);
    let y = x
        .iter()
        .zip(eps.iter())
        .map(|(&xi, &e)| (xi / 5.0).sin() + e)
        .collect();
    (x, y)
}

/// Smooth 2D surface sampled at the C-ordered grid of `x` and `y`, with noise
pub fn noisy_surface(x: &[f64], y: &[f64], amplitude: f64) -> Vec<f64> {
    let mut rng = rng_fixed_seed();
    let eps = noise(&mut rng, x.len() * y.len(), amplitude);
    let mut z = Vec::with_capacity(x.len() * y.len());
    for &xi in x {
        for &yj in y {
            z.push((xi / 6.0).sin() * (1.0 + 0.1 * yj));
        }
    }
    z.iter().zip(eps.iter()).map(|(a, b)| a + b).collect()
}

#![allow(clippy::all)] // Clippy will attempt to remove black_box() internals

use criterion::*;
use gridgen::*;
use ndpspline::{smooth, PSplineConfig};

macro_rules! bench_smooth_specific {
    ($group:ident, $ndims:expr, $gridsize:expr, $knots:expr) => {
        $group.throughput(Throughput::Elements(($gridsize as u64).pow($ndims as u32)));

        $group.bench_with_input(
            BenchmarkId::new(
                format!("Smooth {}x{}D, {} knots", $gridsize, $ndims, $knots),
                $gridsize,
            ),
            &$gridsize,
            |b, &gridsize| {
                // Noisy grid to smooth
                let (grids, z) = gen_grid($ndims, gridsize, 0.1);
                let gridslice: Vec<&[f64]> = grids.iter().map(|x| &x[..]).collect();
                let cfg = PSplineConfig::default().with_lambda(100.0).with_knots($knots);

                b.iter(|| black_box(smooth(&gridslice, &z, &cfg).unwrap()));
            },
        );
    };
}

macro_rules! bench_eval_specific {
    ($group:ident, $ndims:expr, $gridsize:expr, $size:expr) => {
        $group.throughput(Throughput::Elements(*$size as u64));

        $group.bench_with_input(
            BenchmarkId::new(
                format!("Eval {}x{}D, Shuffled Order", $gridsize, $ndims),
                $size,
            ),
            $size,
            |b, &size| {
                let (grids, z) = gen_grid($ndims, $gridsize, 0.1);
                let gridslice: Vec<&[f64]> = grids.iter().map(|x| &x[..]).collect();
                let cfg = PSplineConfig::default().with_lambda(100.0);
                let fit = smooth(&gridslice, &z, &cfg).unwrap();

                // Observation grid
                let m: usize = ((size as f64).powf(1.0 / ($ndims as f64)) + 2.0) as usize;
                let gridobs_t = gen_obs_grid(&grids, m, true);
                let obs: Vec<&[f64]> = gridobs_t.iter().map(|x| &x[..size]).collect();
                let mut out = vec![0.0; size];

                b.iter(|| black_box(fit.eval(&obs, &mut out).unwrap()));
            },
        );
    };
}

fn bench_smooth(c: &mut Criterion) {
    for knots in [5, 10] {
        let mut group = c.benchmark_group(format!("Smooth_1D_{knots}-knots"));
        for gridsize in [30, 300] {
            bench_smooth_specific!(group, 1, gridsize, knots);
        }
        group.finish();
    }

    for knots in [5, 10] {
        let mut group = c.benchmark_group(format!("Smooth_2D_{knots}-knots"));
        for gridsize in [20, 60] {
            bench_smooth_specific!(group, 2, gridsize, knots);
        }
        group.finish();
    }

    let mut group = c.benchmark_group("Smooth_3D_5-knots");
    for gridsize in [10, 20] {
        bench_smooth_specific!(group, 3, gridsize, 5);
    }
    group.finish();
}

fn bench_eval(c: &mut Criterion) {
    for ndims in [1, 2, 3] {
        let mut group = c.benchmark_group(format!("Eval_{ndims}D_Shuffled"));
        for size in [1, 100, 10_000].iter() {
            match ndims {
                1 => {
                    bench_eval_specific!(group, 1, 100, size);
                }
                2 => {
                    bench_eval_specific!(group, 2, 30, size);
                }
                _ => {
                    bench_eval_specific!(group, 3, 12, size);
                }
            }
        }
        group.finish();
    }
}

criterion_group!(benches_smooth, bench_smooth);
criterion_group!(benches_eval, bench_eval);
criterion_main!(benches_smooth, benches_eval,);

mod randn {
    use rand::distr::{Distribution, StandardUniform};
    use rand::rngs::StdRng;
    use rand::Rng;
    use rand::SeedableRng;

    /// Fixed random seed to support repeatable testing
    const SEED: [u8; 32] = [
        0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 15, 14, 13, 12, 11, 10, 9, 8, 7,
        6, 5, 4, 3, 2, 1,
    ];

    /// Get a random number generator with a const seed for repeatable testing
    pub fn rng_fixed_seed() -> StdRng {
        StdRng::from_seed(SEED)
    }

    /// Generate `n` random numbers using provided generator
    pub fn randn<T>(rng: &mut StdRng, n: usize) -> Vec<T>
    where
        StandardUniform: Distribution<T>,
    {
        (0..n).map(|_| rng.random::<T>()).collect()
    }
}

mod gridgen {
    use super::randn::*;
    use ndpspline::utils::*;
    use rand::seq::SliceRandom;

    // Generate bin centers on [0, 100) for each axis and a smooth
    // product-of-sines surface with uniform noise of amplitude `noise`.
    pub fn gen_grid(ndims: usize, size: usize, noise: f64) -> (Vec<Vec<f64>>, Vec<f64>) {
        let mut rng = rng_fixed_seed();
        let grids: Vec<Vec<f64>> = (0..ndims).map(|_| bin_centers(0.0, 100.0, size)).collect();

        let points = meshgrid(grids.iter().collect());
        let eps = randn::<f64>(&mut rng, points.len());
        let z = points
            .iter()
            .zip(eps.iter())
            .map(|(p, e)| p.iter().map(|x| (x / 20.0).sin()).product::<f64>() + (e - 0.5) * noise)
            .collect();

        (grids, z)
    }

    // Generate a set of either sequential (scanning) or shuffled
    // observation points that are entirely inside the grid.
    //
    // `size` is the size per axis, so the total number of points will be size.pow(ndims).
    pub fn gen_obs_grid(grids: &Vec<Vec<f64>>, size: usize, shuffled: bool) -> Vec<Vec<f64>> {
        let mut rng = rng_fixed_seed();
        let ndims = grids.len();

        let xobs: Vec<Vec<f64>> = (0..ndims)
            .map(|i| linspace(grids[i][1], grids[i][grids[i].len() - 2], size))
            .collect();
        let gridobs = meshgrid((0..ndims).map(|i| &xobs[i]).collect());
        let mut gridobs_t: Vec<Vec<f64>> = (0..ndims)
            .map(|i| gridobs.iter().map(|x| x[i]).collect())
            .collect(); // transpose
        if shuffled {
            (0..ndims).for_each(|i| gridobs_t[i].shuffle(&mut rng));
        }
        gridobs_t
    }
}

//! Seeded random designs: Latin hypercube and plain uniform.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Latin hypercube design in `[0, 1)^d`: each dimension has exactly one point
/// in each of the `n` equal-width strata.
pub fn latin_hypercube(n: usize, dimensions: usize, seed: u64) -> Vec<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut points = vec![vec![0.0; dimensions]; n];
    let mut strata: Vec<usize> = (0..n).collect();
    for d in 0..dimensions {
        strata.shuffle(&mut rng);
        for (point, stratum) in points.iter_mut().zip(&strata) {
            let jitter: f64 = rng.gen_range(0.0..1.0);
            point[d] = (*stratum as f64 + jitter) / n as f64;
        }
    }
    points
}

pub fn uniform(n: usize, dimensions: usize, seed: u64) -> Vec<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| (0..dimensions).map(|_| rng.gen_range(0.0..1.0)).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lhs_has_one_point_per_stratum() {
        let n = 20;
        let points = latin_hypercube(n, 3, 42);
        assert_eq!(points.len(), n);
        for d in 0..3 {
            let mut cells: Vec<usize> = points
                .iter()
                .map(|p| (p[d] * n as f64).floor() as usize)
                .collect();
            cells.sort_unstable();
            assert_eq!(cells, (0..n).collect::<Vec<_>>());
        }
    }

    #[test]
    fn same_seed_same_design() {
        assert_eq!(latin_hypercube(8, 2, 3), latin_hypercube(8, 2, 3));
        assert_eq!(uniform(8, 2, 3), uniform(8, 2, 3));
        assert_ne!(uniform(8, 2, 3), uniform(8, 2, 4));
    }

    #[test]
    fn uniform_stays_in_unit_cube() {
        for point in uniform(100, 4, 0) {
            assert!(point.iter().all(|v| (0.0..1.0).contains(v)));
        }
    }
}

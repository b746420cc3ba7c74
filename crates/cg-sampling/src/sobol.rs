//! Sobol low-discrepancy sequence.
//!
//! Gray-code construction (Antonov–Saleev) over 32-bit direction numbers.
//! Dimension 0 is the van der Corput sequence in base 2; the remaining
//! dimensions use primitive polynomials and initial direction numbers from
//! Joe & Kuo's `new-joe-kuo-6.21201` table. The first point is the origin and
//! points are not scrambled, so the sequence is fully deterministic.

use crate::{SamplingError, SamplingResult};

const BITS: usize = 32;

/// Largest number of points the 32-bit construction can produce.
pub const MAX_POINTS: u64 = 1 << BITS;

struct Primitive {
    degree: usize,
    coeffs: u32,
    m: &'static [u32],
}

const fn p(degree: usize, coeffs: u32, m: &'static [u32]) -> Primitive {
    Primitive { degree, coeffs, m }
}

const PRIMITIVES: [Primitive; 36] = [
    p(1, 0, &[1]),
    p(2, 1, &[1, 3]),
    p(3, 1, &[1, 3, 1]),
    p(3, 2, &[1, 1, 1]),
    p(4, 1, &[1, 1, 3, 3]),
    p(4, 4, &[1, 3, 5, 13]),
    p(5, 2, &[1, 1, 5, 5, 17]),
    p(5, 4, &[1, 1, 5, 5, 5]),
    p(5, 7, &[1, 1, 7, 11, 19]),
    p(5, 11, &[1, 1, 5, 1, 1]),
    p(5, 13, &[1, 1, 1, 3, 11]),
    p(5, 14, &[1, 3, 5, 5, 31]),
    p(6, 1, &[1, 3, 3, 9, 7, 49]),
    p(6, 13, &[1, 1, 1, 15, 21, 21]),
    p(6, 16, &[1, 3, 1, 13, 27, 49]),
    p(6, 19, &[1, 1, 1, 15, 7, 5]),
    p(6, 22, &[1, 3, 1, 15, 13, 25]),
    p(6, 25, &[1, 1, 5, 5, 19, 61]),
    p(7, 1, &[1, 3, 7, 11, 23, 15, 103]),
    p(7, 4, &[1, 3, 7, 13, 13, 15, 69]),
    p(7, 7, &[1, 1, 3, 13, 7, 35, 63]),
    p(7, 8, &[1, 3, 5, 9, 1, 25, 53]),
    p(7, 14, &[1, 3, 1, 13, 9, 35, 107]),
    p(7, 19, &[1, 3, 1, 5, 27, 61, 31]),
    p(7, 21, &[1, 1, 5, 11, 19, 41, 61]),
    p(7, 28, &[1, 3, 5, 3, 3, 13, 69]),
    p(7, 31, &[1, 1, 7, 13, 1, 19, 1]),
    p(7, 32, &[1, 3, 7, 5, 13, 19, 59]),
    p(7, 37, &[1, 1, 3, 9, 25, 29, 41]),
    p(7, 41, &[1, 3, 5, 13, 23, 1, 55]),
    p(7, 42, &[1, 3, 7, 3, 13, 59, 17]),
    p(7, 50, &[1, 3, 1, 3, 5, 53, 69]),
    p(7, 55, &[1, 1, 5, 5, 23, 33, 13]),
    p(7, 56, &[1, 1, 7, 7, 1, 61, 123]),
    p(7, 59, &[1, 1, 7, 9, 13, 61, 49]),
    p(7, 62, &[1, 3, 3, 5, 3, 55, 33]),
];

/// Number of dimensions supported by the built-in direction numbers.
pub const MAX_DIMENSIONS: usize = PRIMITIVES.len() + 1;

pub struct Sobol {
    directions: Vec<[u32; BITS]>,
    state: Vec<u32>,
    index: u64,
}

impl Sobol {
    pub fn new(dimensions: usize) -> SamplingResult<Self> {
        if dimensions == 0 {
            return Err(SamplingError::config("Sobol sequence needs at least one dimension"));
        }
        if dimensions > MAX_DIMENSIONS {
            return Err(SamplingError::TooManyDimensions {
                requested: dimensions,
                max: MAX_DIMENSIONS,
            });
        }

        let mut directions = Vec::with_capacity(dimensions);
        let mut first = [0u32; BITS];
        for (k, v) in first.iter_mut().enumerate() {
            *v = 1 << (BITS - 1 - k);
        }
        directions.push(first);
        for primitive in PRIMITIVES.iter().take(dimensions - 1) {
            directions.push(direction_numbers(primitive));
        }

        Ok(Self {
            directions,
            state: vec![0; dimensions],
            index: 0,
        })
    }

    pub fn dimensions(&self) -> usize {
        self.directions.len()
    }

    /// Produce the next point in `[0, 1)^d`.
    pub fn next_point(&mut self) -> SamplingResult<Vec<f64>> {
        if self.index >= MAX_POINTS {
            return Err(SamplingError::config("Sobol sequence exhausted (2^32 points)"));
        }
        if self.index > 0 {
            let c = (self.index - 1).trailing_ones() as usize;
            for (x, v) in self.state.iter_mut().zip(&self.directions) {
                *x ^= v[c];
            }
        }
        self.index += 1;
        Ok(self
            .state
            .iter()
            .map(|&x| x as f64 / MAX_POINTS as f64)
            .collect())
    }

    /// Generate `n` consecutive points.
    pub fn take_points(&mut self, n: usize) -> SamplingResult<Vec<Vec<f64>>> {
        (0..n).map(|_| self.next_point()).collect()
    }
}

fn direction_numbers(primitive: &Primitive) -> [u32; BITS] {
    let s = primitive.degree;
    let mut v = [0u32; BITS];
    for (k, m) in primitive.m.iter().enumerate() {
        v[k] = m << (BITS - 1 - k);
    }
    for k in s..BITS {
        let mut value = v[k - s] ^ (v[k - s] >> s);
        for j in 1..s {
            if (primitive.coeffs >> (s - 1 - j)) & 1 == 1 {
                value ^= v[k - j];
            }
        }
        v[k] = value;
    }
    v
}

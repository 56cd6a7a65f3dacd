//! # Noise Field Module
//!
//! Seeded layered gradient noise used for terrain heights and spawn gating.
//!
//! The field is a pure function of `(x, y, z, seed)`: the lattice hash is integer-only
//! and nothing is cached, so identical inputs give bit-identical outputs in any process
//! and on any thread.
//!
//! ## Algorithm
//!
//! 1. Floor each coordinate to find the lattice cell, keep the fractional offsets.
//! 2. Hash the 8 cell corners with the seed; the low 4 bits pick a gradient.
//! 3. Dot each corner gradient with the offset to that corner.
//! 4. Blend the 8 values trilinearly using quintic-faded offsets.
//! 5. Remap from roughly `[-1, 1]` to `[0, 1]`.

use noise::NoiseFn;

/// A seeded noise source.
///
/// This is a thin wrapper that fixes the seed; it also implements [`NoiseFn`] so the
/// field can be fed into the `noise` crate's combinators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NoiseField {
    /// Seed mixed into every lattice hash.
    pub seed: u32,
}

impl NoiseField {
    /// Creates a noise field with the given seed.
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }

    /// Samples a single octave, in `[0, 1]`.
    pub fn sample(&self, x: f64, y: f64, z: f64) -> f64 {
        noise(x, y, z, self.seed)
    }

    /// Samples `octave_count` octaves, in `[0, 1]`. See [`octave_noise`].
    pub fn octaves(&self, x: f64, y: f64, z: f64, octave_count: i32, persistence: f64) -> f64 {
        octave_noise(x, y, z, octave_count, persistence, self.seed)
    }
}

impl NoiseFn<f64, 3> for NoiseField {
    fn get(&self, point: [f64; 3]) -> f64 {
        self.sample(point[0], point[1], point[2])
    }
}

/// Quintic fade curve `6t^5 - 15t^4 + 10t^3`.
#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}

/// Hashes a lattice corner with the seed.
#[inline]
fn hash(x: i32, y: i32, z: i32, seed: u32) -> u32 {
    let mut h = seed
        ^ (x as u32).wrapping_mul(0x27d4_eb2d)
        ^ (y as u32).wrapping_mul(0x1656_67b1)
        ^ (z as u32).wrapping_mul(0x9e37_79b9);
    h ^= h >> 15;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h
}

/// Dot product of the gradient picked by `hash` with the offset `(x, y, z)`.
#[inline]
fn grad(hash: u32, x: f64, y: f64, z: f64) -> f64 {
    match hash & 0xF {
        0 => x + y,
        1 => -x + y,
        2 => x - y,
        3 => -x - y,
        4 => x + z,
        5 => -x + z,
        6 => x - z,
        7 => -x - z,
        8 => y + z,
        9 => -y + z,
        10 => y - z,
        11 => -y - z,
        12 => y + x,
        13 => -y + z,
        14 => y - x,
        _ => -y - z,
    }
}

/// Single-octave gradient noise at `(x, y, z)`, remapped to `[0, 1]`.
///
/// Lattice points sample exactly `0.5`.
pub fn noise(x: f64, y: f64, z: f64, seed: u32) -> f64 {
    let (x0, y0, z0) = (x.floor(), y.floor(), z.floor());
    let (xi, yi, zi) = (x0 as i32, y0 as i32, z0 as i32);
    let (xf, yf, zf) = (x - x0, y - y0, z - z0);
    let (u, v, w) = (fade(xf), fade(yf), fade(zf));

    let corner = |dx: i32, dy: i32, dz: i32| {
        grad(
            hash(
                xi.wrapping_add(dx),
                yi.wrapping_add(dy),
                zi.wrapping_add(dz),
                seed,
            ),
            xf - dx as f64,
            yf - dy as f64,
            zf - dz as f64,
        )
    };

    let x00 = lerp(u, corner(0, 0, 0), corner(1, 0, 0));
    let x10 = lerp(u, corner(0, 1, 0), corner(1, 1, 0));
    let x01 = lerp(u, corner(0, 0, 1), corner(1, 0, 1));
    let x11 = lerp(u, corner(0, 1, 1), corner(1, 1, 1));
    let value = lerp(w, lerp(v, x00, x10), lerp(v, x01, x11));

    ((value + 1.0) * 0.5).clamp(0.0, 1.0)
}

/// Sums `octave_count` octaves of [`noise`], each at double the previous frequency and
/// `persistence` times the previous amplitude, normalized by the total amplitude.
///
/// # Returns
/// A value in `[0, 1]`, or `0.0` when `octave_count <= 0`.
pub fn octave_noise(
    x: f64,
    y: f64,
    z: f64,
    octave_count: i32,
    persistence: f64,
    seed: u32,
) -> f64 {
    if octave_count <= 0 {
        return 0.0;
    }

    let mut total = 0.0;
    let mut max_value = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    for _ in 0..octave_count {
        total += noise(x * frequency, y * frequency, z * frequency, seed) * amplitude;
        max_value += amplitude;
        amplitude *= persistence;
        frequency *= 2.0;
    }

    if max_value == 0.0 {
        return 0.0;
    }
    total / max_value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_samples_are_bit_identical() {
        for &(x, y, z) in &[(0.3, 1.7, -4.2), (123.456, -0.001, 99.9), (-1e4, 5.5, 3.25)] {
            let a = noise(x, y, z, 42);
            let b = noise(x, y, z, 42);
            assert_eq!(a.to_bits(), b.to_bits());

            let a = octave_noise(x, y, z, 5, 0.5, 42);
            let b = octave_noise(x, y, z, 5, 0.5, 42);
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn output_stays_in_unit_range() {
        for i in 0..2000 {
            let t = i as f64 * 0.173;
            let value = noise(t, t * 0.31 - 7.0, -t * 1.7, 9);
            assert!((0.0..=1.0).contains(&value), "{value} out of range");
            let value = octave_noise(t, 0.0, t * 0.5, 4, 0.5, 9);
            assert!((0.0..=1.0).contains(&value), "{value} out of range");
        }
    }

    #[test]
    fn lattice_points_sample_the_midpoint() {
        assert_eq!(noise(0.0, 0.0, 0.0, 1), 0.5);
        assert_eq!(noise(5.0, -3.0, 12.0, 77), 0.5);
    }

    #[test]
    fn seeds_change_the_field() {
        let differing = (0..100)
            .filter(|i| {
                let x = *i as f64 * 0.37 + 0.5;
                noise(x, 0.25, x * 0.5, 1) != noise(x, 0.25, x * 0.5, 2)
            })
            .count();
        assert!(differing > 90);
    }

    #[test]
    fn non_positive_octave_count_returns_zero() {
        assert_eq!(octave_noise(1.5, 2.5, 3.5, 0, 0.5, 1), 0.0);
        assert_eq!(octave_noise(1.5, 2.5, 3.5, -3, 0.5, 1), 0.0);
    }

    #[test]
    fn single_octave_matches_base_noise() {
        let base = noise(3.3, 1.1, -2.2, 5);
        assert_eq!(octave_noise(3.3, 1.1, -2.2, 1, 0.5, 5).to_bits(), base.to_bits());
    }

    #[test]
    fn gradient_table_matches_reference_formulas() {
        assert_eq!(grad(0, 1.0, 2.0, 3.0), 3.0);
        assert_eq!(grad(1, 1.0, 2.0, 3.0), 1.0);
        assert_eq!(grad(7, 1.0, 2.0, 3.0), -4.0);
        assert_eq!(grad(13, 1.0, 2.0, 3.0), 1.0);
        assert_eq!(grad(15, 1.0, 2.0, 3.0), -5.0);
        assert_eq!(grad(16, 1.0, 2.0, 3.0), grad(0, 1.0, 2.0, 3.0));
    }

    #[test]
    fn noise_fn_impl_delegates_to_sample() {
        let field = NoiseField::new(3);
        assert_eq!(field.get([0.4, 0.6, 0.8]), field.sample(0.4, 0.6, 0.8));
    }
}

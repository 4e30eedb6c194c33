//! # Value Noise Implementation
//!
//! Deterministic lattice noise for terrain and climate channels.
//!
//! ## Algorithm
//!
//! - Floor the input to a lattice cell `(ix, iz)`
//! - Fade the fractional offsets with `3t² - 2t³`
//! - Hash each of the four cell corners to a scalar in `[-1, 1]`
//! - Bilinearly interpolate the corner values
//!
//! ## Determinism Guarantee
//!
//! Corner values come from integer bit mixing only. There is no permutation
//! table and no floating-point accumulation before interpolation, so a given
//! `WorldSeed` produces **exactly** the same values on any platform, in any
//! call order.

/// World seed for deterministic generation.
///
/// All procedural generation derives from this seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorldSeed(u64);

impl WorldSeed {
    /// Creates a new world seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Returns the raw seed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Derives a sub-seed for a specific purpose (e.g., wetness noise).
    ///
    /// Uses a hash function to create independent streams from one seed.
    #[inline]
    #[must_use]
    pub const fn derive(self, purpose: u64) -> Self {
        Self(mix64(self.0 ^ purpose.wrapping_mul(0x517c_c1b7_2722_0a95)))
    }
}

impl Default for WorldSeed {
    fn default() -> Self {
        Self(12345)
    }
}

impl From<u64> for WorldSeed {
    fn from(seed: u64) -> Self {
        Self(seed)
    }
}

/// Finalizer from SplitMix64. Full avalanche on all 64 bits.
#[inline]
const fn mix64(mut h: u64) -> u64 {
    h ^= h >> 30;
    h = h.wrapping_mul(0xbf58_476d_1ce4_e5b9);
    h ^= h >> 27;
    h = h.wrapping_mul(0x94d0_49bb_1331_11eb);
    h ^= h >> 31;
    h
}

/// 2D value noise generator.
///
/// Produces smooth, continuous noise values in the range [-1, 1].
///
/// # Example
///
/// ```rust
/// use strata_procedural::noise::{ValueNoise, WorldSeed};
///
/// let noise = ValueNoise::new(WorldSeed::new(42));
/// let value = noise.sample(100.5, 200.3);
/// assert!((-1.0..=1.0).contains(&value));
///
/// let terrain = noise.fbm(100.5, 200.3);
/// assert!((-1.0..=1.0).contains(&terrain));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct ValueNoise {
    seed: WorldSeed,
}

impl ValueNoise {
    /// Octave count used by [`ValueNoise::fbm`].
    pub const FBM_OCTAVES: u32 = 4;

    /// Creates a new value noise generator from a seed.
    #[must_use]
    pub const fn new(seed: WorldSeed) -> Self {
        Self { seed }
    }

    /// Returns the seed this generator was built from.
    #[must_use]
    pub const fn seed(&self) -> WorldSeed {
        self.seed
    }

    /// Samples 2D value noise at the given coordinates.
    ///
    /// # Returns
    ///
    /// A value in the range [-1, 1].
    #[must_use]
    pub fn sample(&self, x: f64, z: f64) -> f64 {
        let fx_floor = x.floor();
        let fz_floor = z.floor();
        let ix = fx_floor as i64;
        let iz = fz_floor as i64;

        let tx = fade(x - fx_floor);
        let tz = fade(z - fz_floor);

        let v00 = self.lattice(ix, iz);
        let v10 = self.lattice(ix.wrapping_add(1), iz);
        let v01 = self.lattice(ix, iz.wrapping_add(1));
        let v11 = self.lattice(ix.wrapping_add(1), iz.wrapping_add(1));

        let top = lerp(v00, v10, tx);
        let bottom = lerp(v01, v11, tx);
        lerp(top, bottom, tz).clamp(-1.0, 1.0)
    }

    /// Generates octaved (fractal) noise.
    ///
    /// # Arguments
    ///
    /// * `x`, `z` - Coordinates
    /// * `octaves` - Number of noise layers
    /// * `persistence` - Amplitude decay per octave (typically 0.5)
    /// * `lacunarity` - Frequency increase per octave (typically 2.0)
    ///
    /// # Returns
    ///
    /// A value in the range [-1, 1]; zero octaves yield 0.
    #[must_use]
    pub fn octaved(&self, x: f64, z: f64, octaves: u32, persistence: f64, lacunarity: f64) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut max_amplitude = 0.0;

        for _ in 0..octaves {
            total += self.sample(x * frequency, z * frequency) * amplitude;
            max_amplitude += amplitude;
            amplitude *= persistence;
            frequency *= lacunarity;
        }

        if max_amplitude > 0.0 {
            total / max_amplitude
        } else {
            0.0
        }
    }

    /// Four-octave fractal noise with halving amplitude and doubling frequency.
    #[inline]
    #[must_use]
    pub fn fbm(&self, x: f64, z: f64) -> f64 {
        self.octaved(x, z, Self::FBM_OCTAVES, 0.5, 2.0)
    }

    /// Pseudo-random value in [-1, 1) for one lattice point.
    #[inline]
    fn lattice(&self, ix: i64, iz: i64) -> f64 {
        let h = mix64(
            self.seed.value()
                ^ (ix as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15)
                ^ (iz as u64).wrapping_mul(0xc2b2_ae3d_27d4_eb4f),
        );
        // Top 53 bits fit an f64 mantissa exactly.
        let unit = (h >> 11) as f64 / (1u64 << 53) as f64;
        unit * 2.0 - 1.0
    }
}

/// Smoothstep fade curve.
#[inline]
fn fade(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_determinism() {
        let seed = WorldSeed::new(12345);
        let noise1 = ValueNoise::new(seed);
        let noise2 = ValueNoise::new(seed);

        for i in 0..100 {
            let x = f64::from(i) * 0.1;
            let z = f64::from(i) * 0.17;
            assert_eq!(
                noise1.sample(x, z).to_bits(),
                noise2.sample(x, z).to_bits(),
                "Noise should be deterministic"
            );
        }
    }

    #[test]
    fn test_call_order_independence() {
        let noise = ValueNoise::new(WorldSeed::new(7));
        let forward: Vec<f64> = (0..50).map(|i| noise.sample(f64::from(i) * 0.37, -3.5)).collect();
        let backward: Vec<f64> = (0..50)
            .rev()
            .map(|i| noise.sample(f64::from(i) * 0.37, -3.5))
            .collect();

        let reversed: Vec<f64> = backward.into_iter().rev().collect();
        assert_eq!(forward, reversed);
    }

    #[test]
    fn test_different_seeds_different_results() {
        let noise1 = ValueNoise::new(WorldSeed::new(1));
        let noise2 = ValueNoise::new(WorldSeed::new(2));

        let v1 = noise1.sample(100.5, 100.5);
        let v2 = noise2.sample(100.5, 100.5);

        assert_ne!(v1, v2, "Different seeds should produce different results");
    }

    #[test]
    fn test_range_random_points() {
        let noise = ValueNoise::new(WorldSeed::new(42));
        let mut rng = ChaCha8Rng::seed_from_u64(99);

        for _ in 0..10_000 {
            let x = rng.gen_range(-100_000.0..100_000.0);
            let z = rng.gen_range(-100_000.0..100_000.0);
            let value = noise.sample(x, z);

            assert!(
                (-1.0..=1.0).contains(&value),
                "Value {value} out of range at ({x}, {z})"
            );
        }
    }

    #[test]
    fn test_lattice_points_match_hash() {
        // At integer coordinates the fade weights are 0, so the sample is the corner value.
        let noise = ValueNoise::new(WorldSeed::new(3));
        for i in -20..20 {
            let v = noise.sample(f64::from(i), f64::from(i * 3));
            assert_eq!(v, noise.lattice(i64::from(i), i64::from(i * 3)));
        }
    }

    #[test]
    fn test_continuity() {
        let noise = ValueNoise::new(WorldSeed::new(42));

        let x = 100.3;
        let z = 100.6;
        let delta = 0.001;

        let v1 = noise.sample(x, z);
        let v2 = noise.sample(x + delta, z);
        let v3 = noise.sample(x, z + delta);

        assert!((v1 - v2).abs() < 0.01, "Noise should be continuous along x");
        assert!((v1 - v3).abs() < 0.01, "Noise should be continuous along z");
    }

    #[test]
    fn test_fbm_range() {
        let noise = ValueNoise::new(WorldSeed::new(42));

        for i in 0..2000 {
            let x = f64::from(i) * 0.731 - 500.0;
            let z = f64::from(i) * 0.377 + 250.0;
            let value = noise.fbm(x, z);
            assert!((-1.0..=1.0).contains(&value), "fbm {value} out of range");
        }
    }

    #[test]
    fn test_zero_octaves_is_flat() {
        let noise = ValueNoise::new(WorldSeed::new(42));
        assert_eq!(noise.octaved(1.5, 2.5, 0, 0.5, 2.0), 0.0);
    }

    #[test]
    fn test_seed_derivation() {
        let base = WorldSeed::new(42);
        let derived1 = base.derive(1);
        let derived2 = base.derive(2);
        let derived1_again = base.derive(1);

        assert_ne!(derived1, derived2, "Different purposes should give different seeds");
        assert_eq!(derived1, derived1_again, "Same purpose should give same seed");
        assert_ne!(derived1, base, "Derived seed should differ from base");
    }

    #[test]
    fn test_far_coordinates_stay_finite() {
        let noise = ValueNoise::new(WorldSeed::new(5));
        for &(x, z) in &[(1.0e12, -1.0e12), (-4.0e9, 3.3e9), (f64::from(i32::MAX), 0.5)] {
            let v = noise.fbm(x, z);
            assert!(v.is_finite() && (-1.0..=1.0).contains(&v));
        }
    }
}

//! # Climate Channels
//!
//! Wetness and temperature for each tile come from their own noise
//! channels, sampled at a much lower frequency than terrain height.
//! Both are nudged by elevation so they correlate with the landscape
//! without being a function of the height channel alone:
//!
//! - Wetness: humidity noise, drier the higher the ground
//! - Temperature: temperature noise, colder the higher the ground

use crate::noise::{ValueNoise, WorldSeed};

/// Sub-seed purpose for the temperature channel.
const TEMPERATURE_CHANNEL: u64 = 1;
/// Sub-seed purpose for the humidity channel.
const HUMIDITY_CHANNEL: u64 = 2;

/// Samples wetness and temperature at world coordinates.
#[derive(Clone, Debug)]
pub struct ClimateSampler {
    temperature_noise: ValueNoise,
    humidity_noise: ValueNoise,
    scale: f64,
    height_dryness: f32,
    elevation_cooling: f32,
}

impl ClimateSampler {
    /// Creates a sampler with independent channels derived from `seed`.
    #[must_use]
    pub fn new(seed: WorldSeed, scale: f64, height_dryness: f32, elevation_cooling: f32) -> Self {
        Self {
            temperature_noise: ValueNoise::new(seed.derive(TEMPERATURE_CHANNEL)),
            humidity_noise: ValueNoise::new(seed.derive(HUMIDITY_CHANNEL)),
            scale,
            height_dryness,
            elevation_cooling,
        }
    }

    /// Wetness in [0, 1].
    ///
    /// `elevation` is the normalized terrain value in [-1, 1].
    #[must_use]
    pub fn wetness(&self, world_x: f64, world_z: f64, elevation: f64) -> f32 {
        let humidity = self.humidity_noise.octaved(
            world_x * self.scale,
            world_z * self.scale,
            2,
            0.5,
            2.0,
        );
        let humidity = (humidity + 1.0) * 0.5;
        let lowness = 1.0 - (elevation.clamp(-1.0, 1.0) + 1.0) * 0.5;

        let dryness = f64::from(self.height_dryness);
        let wetness = humidity * (1.0 - dryness) + lowness * dryness;
        wetness.clamp(0.0, 1.0) as f32
    }

    /// Temperature in [-1, 1].
    ///
    /// Only ground above the midline is cooled.
    #[must_use]
    pub fn temperature(&self, world_x: f64, world_z: f64, elevation: f64) -> f32 {
        // Offset the channel so it does not share lattice cells with humidity.
        let base = self.temperature_noise.sample(
            world_x * self.scale * 0.7 + 1000.0,
            world_z * self.scale * 0.7 - 1000.0,
        );
        let elevation_factor = elevation.max(0.0) * f64::from(self.elevation_cooling);

        (base - elevation_factor).clamp(-1.0, 1.0) as f32
    }
}

//! # Materials
//!
//! Surface categories are plain string keys (`"grass"`, `"road"`, ...).
//! A [`MaterialCatalog`] maps each key to what a renderer needs to draw it
//! and what a mover needs to cross it.
//!
//! Height banding picks a base material from terrain height:
//!
//! | Height        | Material |
//! |---------------|----------|
//! | `< -6`        | sand     |
//! | `-6 .. 14`    | grass    |
//! | `>= 14`       | rock     |

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Sand material key.
pub const SAND: &str = "sand";
/// Grass material key.
pub const GRASS: &str = "grass";
/// Rock material key.
pub const ROCK: &str = "rock";
/// Road material key (added by the road overlay).
pub const ROAD: &str = "road";
/// Water material key (added by the water overlay).
pub const WATER: &str = "water";

/// Interned material key. Cloning is a reference count bump.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialKey(Arc<str>);

impl MaterialKey {
    /// Creates a key.
    #[must_use]
    pub fn new(key: &str) -> Self {
        Self(Arc::from(key))
    }

    /// Returns the key as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if this key equals `key`.
    #[inline]
    #[must_use]
    pub fn is(&self, key: &str) -> bool {
        &*self.0 == key
    }
}

impl fmt::Debug for MaterialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

impl fmt::Display for MaterialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MaterialKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// Rendering and traversal data for one material.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialDescriptor {
    /// Display name.
    pub name: String,
    /// Texture asset path.
    pub texture: String,
    /// Texture repeat factor.
    #[serde(default = "default_texture_scale")]
    pub texture_scale: f32,
    /// Movement speed factor on this surface.
    #[serde(default = "default_speed")]
    pub speed_multiplier: f32,
}

fn default_texture_scale() -> f32 {
    1.0
}

fn default_speed() -> f32 {
    1.0
}

impl MaterialDescriptor {
    /// Creates a descriptor.
    #[must_use]
    pub fn new(name: &str, texture: &str, texture_scale: f32, speed_multiplier: f32) -> Self {
        Self {
            name: name.to_owned(),
            texture: texture.to_owned(),
            texture_scale,
            speed_multiplier,
        }
    }

    /// Checks that scale and speed are finite and positive.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] for a non-positive value.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.texture_scale.is_finite() && self.texture_scale > 0.0) {
            return Err(ConfigError::OutOfRange {
                name: "texture_scale",
                value: self.texture_scale,
                range: "(0, inf)",
            });
        }
        if !(self.speed_multiplier.is_finite() && self.speed_multiplier > 0.0) {
            return Err(ConfigError::OutOfRange {
                name: "speed_multiplier",
                value: self.speed_multiplier,
                range: "(0, inf)",
            });
        }
        Ok(())
    }
}

/// Key → descriptor map. Iteration order is by key.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterialCatalog {
    entries: BTreeMap<String, MaterialDescriptor>,
}

impl MaterialCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog of the three base terrain materials.
    #[must_use]
    pub fn terrain() -> Self {
        let mut catalog = Self::new();
        catalog.insert(
            SAND,
            MaterialDescriptor::new("Sand", "textures/terrain/sand.jpg", 16.0, 0.8),
        );
        catalog.insert(
            GRASS,
            MaterialDescriptor::new("Grass", "textures/terrain/grass.jpg", 32.0, 1.0),
        );
        catalog.insert(
            ROCK,
            MaterialDescriptor::new("Rock", "textures/terrain/rock.jpg", 24.0, 0.7),
        );
        catalog
    }

    /// Inserts or replaces an entry.
    pub fn insert(&mut self, key: &str, descriptor: MaterialDescriptor) {
        self.entries.insert(key.to_owned(), descriptor);
    }

    /// Copies every entry of `other` over this catalog.
    pub fn merge(&mut self, other: &Self) {
        for (key, descriptor) in &other.entries {
            self.entries.insert(key.clone(), descriptor.clone());
        }
    }

    /// Looks up a descriptor.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&MaterialDescriptor> {
        self.entries.get(key)
    }

    /// Returns true if `key` is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Speed multiplier for `key`, or 1.0 if the key is unknown.
    #[must_use]
    pub fn speed_of(&self, key: &str) -> f32 {
        self.get(key).map_or(1.0, |d| d.speed_multiplier)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the catalog has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MaterialDescriptor)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// One height band: heights strictly below `below` get `material`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BandConfig {
    /// Exclusive upper height bound.
    pub below: f32,
    /// Material key.
    pub material: String,
}

/// Height → material banding.
///
/// Thresholds are strictly ascending, so a higher tile never maps to an
/// earlier band than a lower one.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialBands {
    bands: Vec<(f32, MaterialKey)>,
    top: MaterialKey,
}

impl MaterialBands {
    /// Builds bands and checks them against `catalog`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnorderedBands`] if thresholds are not strictly
    /// ascending (or not finite) and [`ConfigError::UnknownMaterial`] if a
    /// band names a key missing from `catalog`.
    pub fn new(bands: &[BandConfig], top: &str, catalog: &MaterialCatalog) -> ConfigResult<Self> {
        let mut previous = f32::NEG_INFINITY;
        let mut built = Vec::with_capacity(bands.len());

        for band in bands {
            if !band.below.is_finite() || band.below <= previous {
                return Err(ConfigError::UnorderedBands {
                    material: band.material.clone(),
                    threshold: band.below,
                    previous,
                });
            }
            if !catalog.contains(&band.material) {
                return Err(ConfigError::UnknownMaterial(band.material.clone()));
            }
            previous = band.below;
            built.push((band.below, MaterialKey::new(&band.material)));
        }

        if !catalog.contains(top) {
            return Err(ConfigError::UnknownMaterial(top.to_owned()));
        }

        Ok(Self {
            bands: built,
            top: MaterialKey::new(top),
        })
    }

    /// Default band configuration: sand < -6, grass < 14, rock above.
    #[must_use]
    pub fn default_config() -> Vec<BandConfig> {
        vec![
            BandConfig {
                below: -6.0,
                material: SAND.to_owned(),
            },
            BandConfig {
                below: 14.0,
                material: GRASS.to_owned(),
            },
        ]
    }

    /// Material for a terrain height.
    #[must_use]
    pub fn classify(&self, height: f32) -> &MaterialKey {
        self.bands
            .iter()
            .find(|(below, _)| height < *below)
            .map_or(&self.top, |(_, key)| key)
    }

    /// Position of the band a height falls into (`bands.len()` for the top).
    #[must_use]
    pub fn band_index(&self, height: f32) -> usize {
        self.bands
            .iter()
            .position(|(below, _)| height < *below)
            .unwrap_or(self.bands.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_bands() -> MaterialBands {
        MaterialBands::new(
            &MaterialBands::default_config(),
            ROCK,
            &MaterialCatalog::terrain(),
        )
        .unwrap()
    }

    #[test]
    fn test_default_banding() {
        let bands = default_bands();
        assert!(bands.classify(-20.0).is(SAND));
        assert!(bands.classify(-6.0).is(GRASS));
        assert!(bands.classify(0.0).is(GRASS));
        assert!(bands.classify(14.0).is(ROCK));
        assert!(bands.classify(39.0).is(ROCK));
    }

    #[test]
    fn test_banding_monotonic() {
        let bands = default_bands();
        let mut last = 0;
        for step in -400..400 {
            let height = step as f32 * 0.25;
            let index = bands.band_index(height);
            assert!(index >= last, "band went backwards at height {height}");
            last = index;
        }
        assert_eq!(last, 2);
    }

    #[test]
    fn test_unordered_bands_rejected() {
        let config = vec![
            BandConfig {
                below: 10.0,
                material: SAND.to_owned(),
            },
            BandConfig {
                below: 10.0,
                material: GRASS.to_owned(),
            },
        ];
        let err = MaterialBands::new(&config, ROCK, &MaterialCatalog::terrain()).unwrap_err();
        assert!(matches!(err, ConfigError::UnorderedBands { .. }));
    }

    #[test]
    fn test_unknown_material_rejected() {
        let config = vec![BandConfig {
            below: 0.0,
            material: "lava".to_owned(),
        }];
        let err = MaterialBands::new(&config, ROCK, &MaterialCatalog::terrain()).unwrap_err();
        assert_eq!(err, ConfigError::UnknownMaterial("lava".to_owned()));
    }

    #[test]
    fn test_catalog_merge_overrides() {
        let mut base = MaterialCatalog::terrain();
        let mut extra = MaterialCatalog::new();
        extra.insert(GRASS, MaterialDescriptor::new("Meadow", "meadow.jpg", 8.0, 0.9));
        extra.insert(ROAD, MaterialDescriptor::new("Road", "dirt.jpg", 1.0, 1.5));
        base.merge(&extra);

        assert_eq!(base.len(), 4);
        assert_eq!(base.get(GRASS).map(|d| d.name.as_str()), Some("Meadow"));
        assert_eq!(base.speed_of(ROAD), 1.5);
        assert_eq!(base.speed_of("missing"), 1.0);
    }

    #[test]
    fn test_key_equality() {
        let a = MaterialKey::new("grass");
        let b = MaterialKey::from("grass");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "grass");
        assert!(a.is("grass"));
    }
}

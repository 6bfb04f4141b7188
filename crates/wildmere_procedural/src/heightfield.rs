//! # Height Field
//!
//! Terrain height as a pure function of world `(x, z)`.
//!
//! ```text
//! base, detail[3] ──┬─> swamp height ─────┐
//!                   ├─> desert height ────┤
//!                   ├─> grassland height ─┼─ Σ weight_i * height_i ─> height
//!                   └─> mountain height ──┘
//! assignment ───────> BiomeWeights ───────┘
//! ```
//!
//! Blending per-biome candidates by smooth weights (instead of picking
//! one biome per point) is what keeps biome borders seamless.

use crate::biome::{Biome, BiomeClassifier, BiomeWeights};
use crate::noise::NoiseField;

/// How one biome shapes the shared noise into a height.
///
/// `height = base * base_scale + Σ detail_i * detail_scale_i + offset`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BiomeHeightProfile {
    /// Multiplier on the base octave sum.
    pub base_scale: f32,
    /// Multipliers on the three detail terms.
    pub detail_scale: [f32; 3],
    /// Vertical offset.
    pub offset: f32,
}

impl BiomeHeightProfile {
    /// Swamp: lowest and flattest.
    pub const SWAMP: Self = Self {
        base_scale: 2.0,
        detail_scale: [0.3, 0.0, 0.0],
        offset: -2.0,
    };
    /// Desert: low dunes.
    pub const DESERT: Self = Self {
        base_scale: 4.0,
        detail_scale: [1.5, 0.5, 0.0],
        offset: 1.0,
    };
    /// Grassland: rolling hills.
    pub const GRASSLAND: Self = Self {
        base_scale: 6.0,
        detail_scale: [1.0, 0.5, 0.0],
        offset: 2.0,
    };
    /// Mountains: highest and roughest, lifted by a fixed offset.
    pub const MOUNTAINS: Self = Self {
        base_scale: 18.0,
        detail_scale: [4.0, 2.5, 1.5],
        offset: 12.0,
    };

    #[inline]
    fn apply(&self, base: f32, detail: [f32; 3]) -> f32 {
        base * self.base_scale
            + detail[0] * self.detail_scale[0]
            + detail[1] * self.detail_scale[1]
            + detail[2] * self.detail_scale[2]
            + self.offset
    }
}

/// Full result of one height sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeightSample {
    /// Blended terrain height.
    pub height: f32,
    /// Normalized weights, `None` in the degenerate case.
    pub weights: Option<BiomeWeights>,
    /// Candidate height per biome, indexed by [`Biome::index`].
    pub candidates: [f32; 4],
}

/// Combines the noise field and the biome classifier into terrain height.
///
/// `Copy` and stateless: safe to call from any thread.
#[derive(Clone, Copy, Debug)]
pub struct HeightFieldGenerator {
    noise: NoiseField,
    classifier: BiomeClassifier,
    profiles: [BiomeHeightProfile; 4],
}

impl HeightFieldGenerator {
    /// Creates a generator with the default biome profiles.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            noise: NoiseField::new(),
            classifier: BiomeClassifier::new(),
            profiles: [
                BiomeHeightProfile::SWAMP,
                BiomeHeightProfile::DESERT,
                BiomeHeightProfile::GRASSLAND,
                BiomeHeightProfile::MOUNTAINS,
            ],
        }
    }

    /// Replaces the profile for one biome.
    #[must_use]
    pub fn with_profile(mut self, biome: Biome, profile: BiomeHeightProfile) -> Self {
        self.profiles[biome as usize] = profile;
        self
    }

    /// The biome classifier used for blending.
    #[must_use]
    pub const fn classifier(&self) -> &BiomeClassifier {
        &self.classifier
    }

    /// Terrain height at world coordinates.
    #[inline]
    #[must_use]
    pub fn height(&self, x: f32, z: f32) -> f32 {
        self.sample(x, z).height
    }

    /// Height plus the intermediate weights and candidates.
    #[must_use]
    pub fn sample(&self, x: f32, z: f32) -> HeightSample {
        let base = self.noise.base(x, z);
        let detail = self.noise.detail(x, z);
        let candidates = self.profiles.map(|p| p.apply(base, detail));
        let weights = self.classifier.weights(x, z);

        HeightSample {
            height: blend_candidates(candidates, weights),
            weights,
            candidates,
        }
    }

    /// Blends candidate heights with raw (unnormalized) weights.
    #[must_use]
    pub fn blend(&self, candidates: [f32; 4], raw: BiomeWeights) -> f32 {
        blend_candidates(candidates, raw.normalized())
    }
}

/// Weighted sum, or the swamp baseline when there are no weights.
fn blend_candidates(candidates: [f32; 4], weights: Option<BiomeWeights>) -> f32 {
    match weights {
        Some(w) => candidates.iter().zip(w.0.iter()).map(|(h, w)| h * w).sum(),
        None => candidates[Biome::Swamp.index()],
    }
}

impl Default for HeightFieldGenerator {
    fn default() -> Self {
        Self::new()
    }
}

//! # Biome Classification
//!
//! Maps world coordinates to biomes.
//!
//! Two views of the same assignment field:
//!
//! - [`BiomeWeights`]: a smooth blend over all four biomes, used for
//!   terrain height so transitions have no seams
//! - [`Biome`]: a hard category, used only to pick spawn density tables

use serde::{Deserialize, Serialize};

use crate::noise::NoiseField;

/// Biome types in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Biome {
    /// Low, flat wetland.
    Swamp = 0,
    /// Gentle dunes.
    Desert = 1,
    /// Rolling plains.
    Grassland = 2,
    /// High, rough peaks.
    Mountains = 3,
}

impl Biome {
    /// All biomes, in weight-vector order.
    pub const ALL: [Self; 4] = [Self::Swamp, Self::Desert, Self::Grassland, Self::Mountains];

    /// Returns the display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Swamp => "Swamp",
            Self::Desert => "Desert",
            Self::Grassland => "Grassland",
            Self::Mountains => "Mountains",
        }
    }

    /// Index into a [`BiomeWeights`] vector.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Hard classification of an assignment scalar.
    #[must_use]
    pub fn from_assignment(value: f32) -> Self {
        if value < -0.3 {
            Self::Swamp
        } else if value < -0.05 {
            Self::Desert
        } else if value < 0.25 {
            Self::Grassland
        } else {
            Self::Mountains
        }
    }
}

/// Blend coefficients over the four biomes, indexed by [`Biome::index`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BiomeWeights(pub [f32; 4]);

impl BiomeWeights {
    /// Raw (unnormalized) ramps for an assignment scalar.
    ///
    /// - Swamp: full below -0.3, gone by -0.1
    /// - Desert: triangle peaking at -0.2
    /// - Grassland: triangle peaking at +0.05
    /// - Mountains: ramps in from +0.1, full at +0.4
    #[must_use]
    pub fn from_assignment(value: f32) -> Self {
        let swamp = ((-0.1 - value) / 0.2).clamp(0.0, 1.0);
        let desert = (1.0 - (value + 0.2).abs() / 0.25).max(0.0);
        let grassland = (1.0 - (value - 0.05).abs() / 0.25).max(0.0);
        let mountains = ((value - 0.1) / 0.3).clamp(0.0, 1.0);
        Self([swamp, desert, grassland, mountains])
    }

    /// Sum of all weights.
    #[must_use]
    pub fn total(&self) -> f32 {
        self.0.iter().sum()
    }

    /// Weights scaled to sum to 1, or `None` when every weight is zero.
    #[must_use]
    pub fn normalized(&self) -> Option<Self> {
        let total = self.total();
        if total > f32::EPSILON {
            Some(Self(self.0.map(|w| w / total)))
        } else {
            None
        }
    }

    /// Weight of one biome.
    #[inline]
    #[must_use]
    pub fn get(&self, biome: Biome) -> f32 {
        self.0[biome.index()]
    }

    /// The biome with the largest weight.
    #[must_use]
    pub fn dominant(&self) -> Biome {
        let mut best = Biome::Swamp;
        for biome in Biome::ALL {
            if self.get(biome) > self.get(best) {
                best = biome;
            }
        }
        best
    }
}

/// Biome classifier that determines biomes from world coordinates.
#[derive(Clone, Copy, Debug, Default)]
pub struct BiomeClassifier {
    noise: NoiseField,
}

impl BiomeClassifier {
    /// Creates a new classifier.
    #[must_use]
    pub const fn new() -> Self {
        Self { noise: NoiseField::new() }
    }

    /// Raw assignment scalar at world coordinates.
    #[must_use]
    pub fn assignment(&self, x: f32, z: f32) -> f32 {
        self.noise.assignment(x, z)
    }

    /// Normalized blend weights at world coordinates.
    ///
    /// Returns `None` in the degenerate all-zero case; callers fall back
    /// to the swamp baseline.
    #[must_use]
    pub fn weights(&self, x: f32, z: f32) -> Option<BiomeWeights> {
        BiomeWeights::from_assignment(self.assignment(x, z)).normalized()
    }

    /// Hard category at world coordinates (spawn density only).
    #[must_use]
    pub fn classify(&self, x: f32, z: f32) -> Biome {
        Biome::from_assignment(self.assignment(x, z))
    }
}

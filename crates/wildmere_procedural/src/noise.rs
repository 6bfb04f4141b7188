//! # Noise Field
//!
//! Deterministic scalar fields over world `(x, z)`.
//!
//! Everything here is a pure function of its arguments: no tables, no
//! caches, no interior state. That is what lets two chunks that have never
//! met agree on the height of their shared edge, and what lets a worker
//! thread sample terrain without synchronization.
//!
//! ## Channels
//!
//! - **base**: four sine/cosine octaves, the shared terrain signal
//! - **detail**: three independent roughness terms, mixed per biome
//! - **assignment**: a very low frequency field that selects biomes
//!
//! Spawn placement does not use these fields; it hashes chunk coordinates
//! with [`WorldSeed`] instead (see [`hash_coords`]).

/// World seed for deterministic spawn placement.
///
/// Terrain height does not depend on the seed; entity placement does.
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

    /// Derives a sub-seed for a specific purpose (resources, NPCs, ...).
    ///
    /// Uses a hash function to create independent streams from one seed.
    #[inline]
    #[must_use]
    pub const fn derive(self, purpose: u64) -> Self {
        // FNV-1a style mixing
        let mut hash = self.0;
        hash ^= purpose;
        hash = hash.wrapping_mul(0x517c_c1b7_2722_0a95);
        hash ^= hash >> 32;
        Self(hash)
    }
}

impl Default for WorldSeed {
    fn default() -> Self {
        Self(0xDEAD_BEEF_CAFE_BABE)
    }
}

/// One sine/cosine octave: `amplitude * sin(x*fx + px) * cos(z*fz + pz)`.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Octave {
    amplitude: f32,
    freq_x: f32,
    freq_z: f32,
    phase_x: f32,
    phase_z: f32,
}

impl Octave {
    const fn new(amplitude: f32, freq_x: f32, freq_z: f32, phase_x: f32, phase_z: f32) -> Self {
        Self {
            amplitude,
            freq_x,
            freq_z,
            phase_x,
            phase_z,
        }
    }

    #[inline]
    fn sample(&self, x: f32, z: f32) -> f32 {
        self.amplitude * (x * self.freq_x + self.phase_x).sin() * (z * self.freq_z + self.phase_z).cos()
    }
}

/// Base terrain octaves. Amplitude halves, frequency roughly doubles or
/// triples each step.
const BASE_OCTAVES: [Octave; 4] = [
    Octave::new(1.0, 0.010, 0.010, 0.0, 0.0),
    Octave::new(0.5, 0.023, 0.021, 1.3, 0.7),
    Octave::new(0.25, 0.061, 0.057, 2.1, 1.7),
    Octave::new(0.125, 0.147, 0.139, 0.5, 2.9),
];

/// Overall scale applied to the summed base octaves.
const BASE_GAIN: f32 = 0.4;

/// Stateless noise source for terrain.
///
/// A zero-sized handle so it can be copied into worker threads freely.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoiseField;

impl NoiseField {
    /// Creates the noise field.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Shared low/high frequency terrain signal, roughly in `[-0.75, 0.75]`.
    #[must_use]
    pub fn base(&self, x: f32, z: f32) -> f32 {
        let sum: f32 = BASE_OCTAVES.iter().map(|o| o.sample(x, z)).sum();
        sum * BASE_GAIN
    }

    /// Three roughness terms at distinct frequency/phase combinations,
    /// each in `[-1, 1]`.
    #[must_use]
    pub fn detail(&self, x: f32, z: f32) -> [f32; 3] {
        [
            (x * 0.08 + 0.3).sin() * (z * 0.07 + 1.1).cos(),
            (x * 0.15 + 2.4).sin() * (z * 0.17 + 0.9).sin(),
            (x * 0.31 + 1.7).cos() * (z * 0.29 + 2.2).sin(),
        ]
    }

    /// Biome-assignment scalar, roughly in `[-1.5, 1.5]`.
    ///
    /// Very low frequency so biomes span many chunks.
    #[must_use]
    pub fn assignment(&self, x: f32, z: f32) -> f32 {
        (x * 0.003).sin() * (z * 0.003).cos()
            + 0.5 * (x * 0.0071 + 1.9).sin() * (z * 0.0053 + 0.4).cos()
    }
}

/// Hashes a chunk coordinate, an attempt index and a channel into 64 bits.
///
/// Stands in for a seeded PRNG: the same inputs always give the same
/// output, and nothing is shared between calls.
#[must_use]
pub const fn hash_coords(seed: WorldSeed, chunk_x: i32, chunk_z: i32, attempt: u32, channel: u64) -> u64 {
    let mut h = seed.derive(channel).value();
    h ^= (chunk_x as u32 as u64).wrapping_mul(73_856_093);
    h = h.rotate_left(21);
    h ^= (chunk_z as u32 as u64).wrapping_mul(19_349_663);
    h = h.rotate_left(17);
    h ^= (attempt as u64).wrapping_mul(83_492_791);
    // splitmix64 finalizer
    h = (h ^ (h >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    h = (h ^ (h >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    h ^ (h >> 31)
}

/// Maps a hash to `[0, 1)` using its top 24 bits.
#[inline]
#[must_use]
pub fn unit_from_hash(hash: u64) -> f32 {
    (hash >> 40) as f32 / (1u64 << 24) as f32
}

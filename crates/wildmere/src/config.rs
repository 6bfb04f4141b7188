//! # Runtime Configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an
//! empty file (or no file) gives the standard world.
//!
//! ```toml
//! [world]
//! seed = 42
//! render_distance = 2
//! respawn_policy = "every_load"   # or "once_per_key"
//!
//! [terrain]
//! chunk_size = 64
//! scale = 0.5
//!
//! [player]
//! move_speed = 5.0
//! sprint_speed = 9.0
//! max_health = 100.0
//!
//! [simulation]
//! combat_seed = 7                 # omit for non-deterministic rolls
//! stats_interval_ticks = 600
//! target_fps = 60
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use wildmere_procedural::{ChunkLayout, ChunkManagerConfig, RespawnPolicy, WorldSeed};
use wildmere_shared::{CHUNK_SIZE, RENDER_DISTANCE, SCALE, TICK_RATE};

use crate::error::{ConfigError, ConfigResult};

/// Largest accepted chunk edge, in cells.
pub const MAX_CHUNK_SIZE: u32 = 512;

/// Largest accepted render distance, in chunks.
pub const MAX_RENDER_DISTANCE: i32 = 16;

/// `[world]` section.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSection {
    /// Seed for spawn placement.
    pub seed: u64,
    /// Chunks loaded in each direction around the player.
    pub render_distance: i32,
    /// Whether reloaded chunks spawn their entities again.
    pub respawn_policy: RespawnPolicy,
}

impl Default for WorldSection {
    fn default() -> Self {
        Self {
            seed: WorldSeed::default().value(),
            render_distance: RENDER_DISTANCE,
            respawn_policy: RespawnPolicy::default(),
        }
    }
}

/// `[terrain]` section.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainSection {
    /// Grid cells per chunk edge.
    pub chunk_size: u32,
    /// World units per cell.
    pub scale: f32,
}

impl Default for TerrainSection {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            scale: SCALE,
        }
    }
}

/// `[player]` section.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSection {
    /// Walking speed, units per second.
    pub move_speed: f32,
    /// Sprinting speed, units per second.
    pub sprint_speed: f32,
    /// Health after spawn and respawn.
    pub max_health: f32,
}

impl Default for PlayerSection {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            sprint_speed: 9.0,
            max_health: 100.0,
        }
    }
}

/// `[simulation]` section.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSection {
    /// Fixed seed for combat rolls; `None` seeds from the clock.
    pub combat_seed: Option<u64>,
    /// Ticks between periodic stats log lines (0 disables them).
    pub stats_interval_ticks: u64,
    /// Frame rate the game loop aims for.
    pub target_fps: u32,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            combat_seed: None,
            stats_interval_ticks: u64::from(TICK_RATE) * 10,
            target_fps: TICK_RATE,
        }
    }
}

/// Complete runtime configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WildmereConfig {
    /// World generation and streaming.
    pub world: WorldSection,
    /// Chunk grid.
    pub terrain: TerrainSection,
    /// Player movement and health.
    pub player: PlayerSection,
    /// Tick-level settings.
    pub simulation: SimulationSection,
}

impl WildmereConfig {
    /// Reads, parses and validates a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parses and validates TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] or [`ConfigError::Invalid`].
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every value against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> ConfigResult<()> {
        let terrain = &self.terrain;
        if terrain.chunk_size == 0 || terrain.chunk_size > MAX_CHUNK_SIZE {
            return Err(ConfigError::Invalid(format!(
                "terrain.chunk_size must be in 1..={MAX_CHUNK_SIZE}, got {}",
                terrain.chunk_size
            )));
        }
        if !terrain.scale.is_finite() || terrain.scale <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "terrain.scale must be positive and finite, got {}",
                terrain.scale
            )));
        }
        if !(0..=MAX_RENDER_DISTANCE).contains(&self.world.render_distance) {
            return Err(ConfigError::Invalid(format!(
                "world.render_distance must be in 0..={MAX_RENDER_DISTANCE}, got {}",
                self.world.render_distance
            )));
        }

        let player = &self.player;
        for (name, value) in [
            ("player.move_speed", player.move_speed),
            ("player.sprint_speed", player.sprint_speed),
            ("player.max_health", player.max_health),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid(format!("{name} must be positive, got {value}")));
            }
        }
        if self.simulation.target_fps == 0 {
            return Err(ConfigError::Invalid("simulation.target_fps must be positive".into()));
        }
        Ok(())
    }

    /// Chunk grid described by `[terrain]`.
    #[must_use]
    pub const fn layout(&self) -> ChunkLayout {
        ChunkLayout::new(self.terrain.chunk_size, self.terrain.scale)
    }

    /// Streaming settings for the chunk manager.
    #[must_use]
    pub const fn chunk_manager_config(&self) -> ChunkManagerConfig {
        ChunkManagerConfig {
            layout: self.layout(),
            render_distance: self.world.render_distance,
            respawn_policy: self.world.respawn_policy,
            seed: WorldSeed::new(self.world.seed),
        }
    }
}

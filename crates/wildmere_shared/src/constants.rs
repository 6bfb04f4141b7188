//! # World Constants
//!
//! Defaults for the chunk grid and simulation rate.
//!
//! Every value here can be overridden through the runtime configuration;
//! these are the numbers used when a config file leaves them out.

// =============================================================================
// CHUNK GRID
// =============================================================================

/// Grid cells per chunk edge. A chunk owns `(CHUNK_SIZE + 1)^2` vertices.
pub const CHUNK_SIZE: u32 = 64;

/// World units between two adjacent grid vertices.
pub const SCALE: f32 = 0.5;

/// Chunks loaded in each direction around the player chunk (5x5 at 2).
pub const RENDER_DISTANCE: i32 = 2;

/// Coordinates beyond this magnitude are flagged by chunk validation.
pub const EXTREME_COORDINATE: f32 = 10_000.0;

/// Height spread inside one chunk above which validation warns.
pub const MAX_CHUNK_HEIGHT_RANGE: f32 = 100.0;

// =============================================================================
// SIMULATION
// =============================================================================

/// Tick rate (updates per second)
pub const TICK_RATE: u32 = 60;

/// Largest delta time fed to one simulation step, in seconds.
pub const MAX_DELTA_TIME: f32 = 0.1;

//! # Wildmere Shared
//!
//! Common types used by terrain generation, gameplay and the renderer
//! boundary.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on a graphics API or windowing crate.
//! Renderable handles are created by the host through the traits in the
//! `wildmere` crate.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod math;

pub use constants::{CHUNK_SIZE, RENDER_DISTANCE, SCALE, TICK_RATE};
pub use math::{Quaternion, Ray, Transform, Vec2, Vec3};

//! # Content Budget Constants
//!
//! Defaults used when a config file leaves a value out.
//!
//! **NOTE:** Pool capacity is a memory budget. Raising it means every stage
//! may hold more composed models at once.

use crate::ids::BodyId;

// =============================================================================
// STAGE POOL
// =============================================================================

/// Composed-model slots per stage unless a stage overrides it.
pub const DEFAULT_POOL_CAPACITY: usize = 40;

/// Heads of each gender kept loadable per stage.
pub const DEFAULT_ACTIVE_HEADS_PER_GENDER: usize = 8;

/// Largest pool a config may ask for. Slots are reserved upfront.
pub const MAX_POOL_CAPACITY: usize = 1024;

/// Largest per-gender head rotation a config may ask for.
pub const MAX_ACTIVE_HEADS_PER_GENDER: usize = 64;

// =============================================================================
// COSMETICS
// =============================================================================

/// Probability that an eligible character gets eyewear.
pub const DEFAULT_EYEWEAR_CHANCE: f32 = 0.25;

/// Smallest height factor a varied body can get.
pub const DEFAULT_MIN_HEIGHT_FACTOR: f32 = 0.95;

/// Largest height factor a varied body can get.
pub const DEFAULT_MAX_HEIGHT_FACTOR: f32 = 1.05;

// =============================================================================
// EYESPY
// =============================================================================

/// Body used for eyespy props.
pub const DEFAULT_EYESPY_BODY: BodyId = BodyId(0x55);

/// Height the eyespy hovers above its pad.
pub const DEFAULT_EYESPY_HOVER_HEIGHT: f32 = 30.0;

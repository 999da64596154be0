//! # MANNEQUIN Shared
//!
//! Common types used by the body registry, the composer, the stage loader
//! and the content tools.
//!
//! ## CRITICAL RULE
//!
//! This crate holds plain data only. Anything that loads assets or touches a
//! stage pool belongs in `mannequin_bodies`.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod ids;
pub mod math;

pub use constants::{
    DEFAULT_ACTIVE_HEADS_PER_GENDER, DEFAULT_EYESPY_BODY, DEFAULT_EYESPY_HOVER_HEIGHT,
    DEFAULT_EYEWEAR_CHANCE, DEFAULT_MAX_HEIGHT_FACTOR, DEFAULT_MIN_HEIGHT_FACTOR,
    DEFAULT_POOL_CAPACITY, MAX_ACTIVE_HEADS_PER_GENDER, MAX_POOL_CAPACITY,
};
pub use ids::{BodyId, Gender, HeadId, PadId, Race, RaceSet, RoomId, SpawnFlag, SpawnFlags, StageId};
pub use math::Vec3;

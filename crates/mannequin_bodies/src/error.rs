//! # Body Error Types
//!
//! All errors that can occur while composing and allocating character models.
//!
//! Cosmetic problems (eyewear that cannot be attached, a height roll on a body
//! that cannot vary) are never errors. They are dropped silently.

use mannequin_shared::{BodyId, HeadId, Race, StageId};
use thiserror::Error;

use crate::assets::AssetError;

/// Errors that can occur in the body system.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BodyError {
    /// Body id is out of range or not registered.
    #[error("invalid body id: {0}")]
    InvalidBodyId(BodyId),

    /// Head id is out of range or not registered.
    #[error("invalid head id: {0}")]
    InvalidHeadId(HeadId),

    /// No head in the registry is compatible with the body's race.
    #[error("no head compatible with {body} (race {race})")]
    NoCompatibleHead {
        /// The body that needed a head.
        body: BodyId,
        /// Race of that body.
        race: Race,
    },

    /// The asset loader could not produce geometry.
    #[error("asset load failed: {0}")]
    LoadFailure(#[from] AssetError),

    /// The stage pool has no free slots left.
    #[error("stage pool exhausted: {stage} holds {capacity} models")]
    PoolExhausted {
        /// Stage whose pool is full.
        stage: StageId,
        /// Pool capacity for that stage.
        capacity: usize,
    },

    /// A body that needs a separate head was composed without one.
    #[error("{0} requires a head")]
    HeadRequired(BodyId),

    /// The body's head is part of its own geometry and cannot be swapped.
    #[error("{0} has an integrated head")]
    IntegratedHead(BodyId),

    /// Body geometry has no headspot joint to attach a head to.
    #[error("{0} has no headspot joint")]
    HeadspotMissing(BodyId),

    /// Head geometry has no root joint to attach by.
    #[error("{0} has no attachment joint")]
    HeadJointMissing(HeadId),

    /// A record was submitted for a stage other than the loaded one.
    #[error("record for {requested} but {active} is loaded")]
    StageMismatch {
        /// Stage named by the caller.
        requested: StageId,
        /// Stage currently loaded.
        active: StageId,
    },

    /// Command indices must increase strictly within a stage.
    #[error("command index {index} follows {last}")]
    CommandOutOfOrder {
        /// Index submitted.
        index: u32,
        /// Last index registered.
        last: u32,
    },

    /// A model handle from an earlier stage was used after reset.
    #[error("model handle is stale or was never issued")]
    StaleHandle,

    /// An allocation was attempted before any stage was loaded.
    #[error("no stage loaded; call reset first")]
    NoActiveStage,

    /// A registry query was made before init.
    #[error("body registry not initialized")]
    NotInitialized,

    /// Invalid content or configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl BodyError {
    /// Returns `true` for the invalid-id class of errors.
    #[must_use]
    pub const fn is_invalid_id(&self) -> bool {
        matches!(self, Self::InvalidBodyId(_) | Self::InvalidHeadId(_))
    }
}

/// Result type for body operations.
pub type BodyResult<T> = Result<T, BodyError>;

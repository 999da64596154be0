//! # MANNEQUIN Bodies
//!
//! Turns packed character records into composed body/head models for the
//! stage being loaded.
//!
//! ## Design Principles
//!
//! 1. **Data-driven content** - bodies, heads and budgets come from TOML files
//! 2. **Fixed budgets** - every stage gets a pool of fixed size, reset wholesale
//! 3. **Replayable** - the caller owns the random stream; same seed, same roster
//! 4. **Isolated failures** - one bad record never aborts the rest of a roster
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use mannequin_bodies::{BodiesConfig, BodiesSystem, BodyRegistry, InMemoryAssets};
//! use mannequin_core::RandomStream;
//!
//! let registry = Arc::new(BodyRegistry::builtin()?);
//! let mut bodies = BodiesSystem::new(BodiesConfig::default(), InMemoryAssets::from_registry(&registry));
//! bodies.init(registry);
//!
//! let mut rng = RandomStream::from_seed(stage_seed);
//! bodies.reset(stage, &mut rng)?;
//! let report = bodies.load_roster(stage, &roster.chrs, &mut rng);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod allocator;
pub mod assets;
pub mod composer;
pub mod config;
pub mod error;
pub mod heads;
pub mod registry;
pub mod spawn;
pub mod system;

pub use allocator::{ModelHandle, StagePool};
pub use assets::{
    AssetError, AssetLoader, AssetRef, GeometryHandle, InMemoryAssets, ModelCache, ModelDef,
    ModelPart, PartSet,
};
pub use composer::{
    calculate_head_offset, compose_new, recompose_head, ComposedModel, Composition,
    HeadAttachment, HeadParts, HeightMode,
};
pub use config::{BodiesConfig, StageBudget, StageOverride};
pub use error::{BodyError, BodyResult};
pub use heads::HeadRotation;
pub use registry::{BodyDefinition, BodyRegistry, ContentIssue, HeadDefinition};
pub use spawn::{
    EyespyProp, EyespyRecord, PackedChr, Pad, Roster, RosterReport, SpawnedChr, StageRoster,
};
pub use system::BodiesSystem;

//! # Body System
//!
//! The entry points the level loader calls.
//!
//! ## Lifecycle
//!
//! ```text
//!   init(registry)  ──  once per process, read-only afterwards
//!        │
//!        ▼
//!   reset(stage)    ──  pool emptied, old handles dead, heads redrawn
//!        │
//!        ▼
//!   allocate_chr    ──  once per roster record, in command order
//!   allocate_eyespy ──  per eyespy prop
//!        │
//!        ▼
//!   reset(next stage) ...
//! ```
//!
//! ## One Record
//!
//! ```text
//!   PackedChr ──> validate body ──> resolve head ──> load assets
//!                                                        │
//!            register <── pool insert <── compose <── cosmetic rolls
//! ```
//!
//! A failed record is logged and reported. It never touches the pool and
//! never stops the rest of the roster.

use rand::Rng;
use std::sync::Arc;

use mannequin_shared::{BodyId, HeadId, Race, RoomId, SpawnFlags, StageId, Vec3};

use crate::allocator::{ModelHandle, StagePool};
use crate::assets::{AssetLoader, ModelCache};
use crate::composer::{
    self, compose_new, recompose_head, ComposedModel, Composition, HeadAttachment, HeadParts,
    HeightMode,
};
use crate::config::BodiesConfig;
use crate::error::{BodyError, BodyResult};
use crate::heads::HeadRotation;
use crate::registry::{BodyDefinition, BodyRegistry};
use crate::spawn::{EyespyProp, PackedChr, Pad, RosterReport, SpawnedChr, StageRoster};

// ============================================================================
// Stage State
// ============================================================================

/// Everything that lives exactly as long as one stage.
#[derive(Debug)]
struct StageState {
    stage: StageId,
    heads: HeadRotation,
    roster: StageRoster,
    /// First command index not yet attempted. `None` once `u32::MAX` is used.
    next_command: Option<u32>,
}

impl StageState {
    /// Moves the command cursor past `index`, whether or not it spawned.
    fn attempted(&mut self, index: u32) {
        self.next_command = match (self.next_command, index.checked_add(1)) {
            (Some(next), Some(after)) => Some(next.max(after)),
            _ => None,
        };
    }
}

// ============================================================================
// Body System
// ============================================================================

/// Process-scoped body system.
///
/// Owns the registry (after [`init`](Self::init)), the model cache, and the
/// pool and head rotation of the loaded stage. All randomness is borrowed
/// from the caller.
#[derive(Debug)]
pub struct BodiesSystem<L> {
    config: BodiesConfig,
    registry: Option<Arc<BodyRegistry>>,
    cache: ModelCache<L>,
    pool: StagePool,
    stage: Option<StageState>,
}

impl<L: AssetLoader> BodiesSystem<L> {
    /// Creates an uninitialized system.
    #[must_use]
    pub fn new(config: BodiesConfig, loader: L) -> Self {
        Self {
            config,
            registry: None,
            cache: ModelCache::new(loader),
            pool: StagePool::new(),
            stage: None,
        }
    }

    /// Installs the registry.
    ///
    /// Only the first call has an effect. Later calls are logged and ignored;
    /// the registry is never replaced or duplicated. Returns `true` if this
    /// call installed it.
    pub fn init(&mut self, registry: Arc<BodyRegistry>) -> bool {
        if self.registry.is_some() {
            tracing::warn!("bodies already initialized, ignoring");
            return false;
        }
        tracing::info!(
            bodies = registry.bodies().len(),
            heads = registry.heads().len(),
            "bodies initialized"
        );
        self.registry = Some(registry);
        true
    }

    /// Returns `true` once [`init`](Self::init) has run.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.registry.is_some()
    }

    /// The installed registry.
    ///
    /// # Errors
    ///
    /// `NotInitialized` before [`init`](Self::init).
    pub fn registry(&self) -> BodyResult<&Arc<BodyRegistry>> {
        self.registry.as_ref().ok_or(BodyError::NotInitialized)
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &BodiesConfig {
        &self.config
    }

    /// The model cache and its loader.
    #[must_use]
    pub fn cache(&self) -> &ModelCache<L> {
        &self.cache
    }

    /// Mutable access to the asset loader.
    pub fn loader_mut(&mut self) -> &mut L {
        self.cache.loader_mut()
    }

    // ------------------------------------------------------------------------
    // Stage lifecycle
    // ------------------------------------------------------------------------

    /// Starts loading `stage`.
    ///
    /// Every handle issued for the previous stage stops resolving, the pool
    /// is resized to the stage budget and a new head rotation is drawn from
    /// `rng`.
    ///
    /// # Errors
    ///
    /// `NotInitialized` before [`init`](Self::init), `InvalidConfig` if the
    /// configuration is out of range or the pool cannot be reserved. No
    /// stage is loaded after an error.
    pub fn reset<R: Rng + ?Sized>(&mut self, stage: StageId, rng: &mut R) -> BodyResult<()> {
        let registry = Arc::clone(self.registry()?);
        self.stage = None;
        self.config.validate()?;
        let budget = self.config.budget_for(stage);

        self.pool.reset(stage, budget.pool_capacity)?;
        let heads = HeadRotation::new(&registry, budget.active_heads_per_gender, rng);
        self.stage = Some(StageState {
            stage,
            heads,
            roster: StageRoster::default(),
            next_command: Some(0),
        });

        tracing::info!(
            %stage,
            pool = budget.pool_capacity,
            heads = budget.active_heads_per_gender,
            "stage reset"
        );
        Ok(())
    }

    /// Stage currently loaded.
    #[must_use]
    pub fn stage(&self) -> Option<StageId> {
        self.stage.as_ref().map(|s| s.stage)
    }

    /// Free slots in the stage pool.
    #[must_use]
    pub fn free_capacity(&self) -> usize {
        self.pool.remaining()
    }

    /// Returns `true` if `records` more models fit in the stage pool.
    #[must_use]
    pub fn roster_fits(&self, records: usize) -> bool {
        self.free_capacity() >= records
    }

    // ------------------------------------------------------------------------
    // Registry queries
    // ------------------------------------------------------------------------

    /// Race of a body.
    ///
    /// # Errors
    ///
    /// `NotInitialized`, or `InvalidBodyId` for unregistered ids.
    pub fn race(&self, body: BodyId) -> BodyResult<Race> {
        self.registry()?.race(body)
    }

    /// Makes sure the body's geometry is loaded.
    ///
    /// Returns `true` if this call loaded it, `false` if it was cached.
    ///
    /// # Errors
    ///
    /// `InvalidBodyId`, or `LoadFailure` if the loader failed. A body that
    /// failed to load must not be composed.
    pub fn load_body(&mut self, body: BodyId) -> BodyResult<bool> {
        let registry = Arc::clone(self.registry()?);
        let def = registry.body(body)?;
        let fresh = !self.cache.is_body_loaded(body);
        self.cache.body(def)?;
        Ok(fresh)
    }

    /// Picks a head for `body` from the stage rotation.
    ///
    /// # Errors
    ///
    /// `NoActiveStage`, `InvalidBodyId` or `NoCompatibleHead`.
    pub fn choose_head<R: Rng + ?Sized>(&mut self, body: BodyId, rng: &mut R) -> BodyResult<HeadId> {
        let registry = Arc::clone(self.registry()?);
        let def = registry.body(body)?;
        let state = self.stage.as_mut().ok_or(BodyError::NoActiveStage)?;
        state.heads.choose(&registry, def, rng)
    }

    // ------------------------------------------------------------------------
    // Allocation
    // ------------------------------------------------------------------------

    /// Composes a model and stores it in the stage pool.
    ///
    /// `head` is used as given. Cosmetic rolls happen here: eyewear with the
    /// configured chance when `ALLOW_EYEWEAR` is set, and a height factor when
    /// `VARY_HEIGHT` is set and the body allows it. Player spawns skip both.
    ///
    /// # Errors
    ///
    /// `InvalidBodyId`/`InvalidHeadId`, `PoolExhausted`, `LoadFailure`, or a
    /// structural composer error. Nothing is stored on error.
    pub fn allocate_model<R: Rng + ?Sized>(
        &mut self,
        body: BodyId,
        head: Option<HeadId>,
        flags: SpawnFlags,
        rng: &mut R,
    ) -> BodyResult<ModelHandle> {
        let registry = Arc::clone(self.registry()?);
        let body_def = registry.body(body)?;
        let head_def = head.map(|id| registry.head(id)).transpose()?;

        // Exhausted stages fail before any asset is touched.
        self.pool.ensure_capacity()?;

        let body_model = self.cache.body(body_def)?;
        let head_model = head_def.map(|h| self.cache.head(h)).transpose()?;
        let (eyewear, height) = self.cosmetic_rolls(body_def, flags, rng);

        let model = compose_new(&Composition {
            body: body_def,
            body_model: &body_model,
            head: head_def.zip(head_model.as_deref()).map(|(def, model)| HeadParts { def, model }),
            eyewear,
            is_player: flags.is_player(),
            height,
        })?;

        let handle = self.pool.insert(model)?;
        tracing::debug!(%body, head = ?head, slot = handle.index(), "model allocated");
        Ok(handle)
    }

    /// Spawns one packed character record.
    ///
    /// The model is registered against `command_index`, which must be greater
    /// than every index registered on this stage so far.
    ///
    /// # Errors
    ///
    /// `NoActiveStage`, `StageMismatch`, `CommandOutOfOrder`, plus every
    /// error of head resolution and [`allocate_model`](Self::allocate_model).
    pub fn allocate_chr<R: Rng + ?Sized>(
        &mut self,
        stage: StageId,
        packed: &PackedChr,
        command_index: u32,
        rng: &mut R,
    ) -> BodyResult<ModelHandle> {
        match self.try_allocate_chr(stage, packed, command_index, rng) {
            Ok(handle) => Ok(handle),
            // Exhaustion was already reported by the pool.
            Err(e @ BodyError::PoolExhausted { .. }) => {
                tracing::debug!(command_index, body = %packed.body, "record skipped, pool full");
                Err(e)
            }
            Err(e) => {
                tracing::warn!(command_index, body = %packed.body, error = %e, "record skipped");
                Err(e)
            }
        }
    }

    fn try_allocate_chr<R: Rng + ?Sized>(
        &mut self,
        stage: StageId,
        packed: &PackedChr,
        command_index: u32,
        rng: &mut R,
    ) -> BodyResult<ModelHandle> {
        let registry = Arc::clone(self.registry()?);
        let state = self.stage.as_mut().ok_or(BodyError::NoActiveStage)?;
        if state.stage != stage {
            return Err(BodyError::StageMismatch {
                requested: stage,
                active: state.stage,
            });
        }
        state.roster.check_order(command_index)?;
        state.attempted(command_index);

        let body = registry.body(packed.body)?;
        let head = state
            .heads
            .resolve(&registry, body, packed.head, packed.flags, rng)?;

        let model = self.allocate_model(packed.body, head, packed.flags, rng)?;

        if let Some(state) = self.stage.as_mut() {
            state.roster.push(SpawnedChr {
                command_index,
                chr_num: packed.chr_num,
                model,
                body: packed.body,
                head,
                pad: packed.pad,
                team: packed.team,
                squadron: packed.squadron,
            });
        }
        Ok(model)
    }

    /// Spawns the eyespy prop on `pad`.
    ///
    /// Uses the configured eyespy body, never selects or attaches a head, and
    /// places the prop hovering above the pad.
    ///
    /// # Errors
    ///
    /// Same as [`allocate_model`](Self::allocate_model).
    pub fn allocate_eyespy<R: Rng + ?Sized>(
        &mut self,
        pad: Pad,
        room: RoomId,
        rng: &mut R,
    ) -> BodyResult<EyespyProp> {
        let body = self.config.eyespy_body;
        let model = self.allocate_model(body, None, SpawnFlags::NONE, rng)?;
        let position = pad.position + Vec3::Y * self.config.eyespy_hover_height;

        tracing::debug!(pad = %pad.id, %room, "eyespy placed");
        Ok(EyespyProp {
            model,
            pad: pad.id,
            room,
            position,
        })
    }

    /// Spawns a whole roster in order, isolating failures per record.
    ///
    /// Command indices continue after the last one attempted on this stage,
    /// so a failed record never shares its index with a later one. Records
    /// past `u32::MAX` are not attempted.
    pub fn load_roster<R: Rng + ?Sized>(
        &mut self,
        stage: StageId,
        records: &[PackedChr],
        rng: &mut R,
    ) -> RosterReport {
        let mut cursor = self.stage.as_ref().map_or(Some(0), |s| s.next_command);

        if !self.roster_fits(records.len()) {
            tracing::warn!(
                %stage,
                records = records.len(),
                free = self.free_capacity(),
                "roster larger than stage pool"
            );
        }

        let mut report = RosterReport::default();
        for (n, packed) in records.iter().enumerate() {
            let Some(index) = cursor else {
                tracing::warn!(%stage, dropped = records.len() - n, "command indices exhausted");
                break;
            };
            match self.allocate_chr(stage, packed, index, rng) {
                Ok(model) => report.spawned.push((index, model)),
                Err(e) => report.failures.push((index, e)),
            }
            cursor = index.checked_add(1);
        }

        tracing::info!(
            %stage,
            spawned = report.spawned.len(),
            failed = report.failures.len(),
            "roster loaded"
        );
        report
    }

    // ------------------------------------------------------------------------
    // Composition
    // ------------------------------------------------------------------------

    /// Head placement for `head` on `body` at the given height.
    ///
    /// # Errors
    ///
    /// Invalid ids, `LoadFailure` for the head geometry, `HeadJointMissing`.
    pub fn calculate_head_offset(
        &mut self,
        head: HeadId,
        body: BodyId,
        height: HeightMode,
    ) -> BodyResult<HeadAttachment> {
        let registry = Arc::clone(self.registry()?);
        let body_def = registry.body(body)?;
        let head_def = registry.head(head)?;
        let head_model = self.cache.head(head_def)?;
        composer::calculate_head_offset(&head_model, head_def, body_def, height)
    }

    /// Replaces the head of a live model in place.
    ///
    /// Body geometry and the pool slot are kept. Cosmetic rolls are redone
    /// with `flags`; a model built for a player stays a player model.
    ///
    /// # Errors
    ///
    /// `StaleHandle` for a handle from an earlier stage, `IntegratedHead` for
    /// bodies that carry their own head, invalid ids, `LoadFailure`, or a
    /// structural composer error. The model is untouched on error.
    pub fn rehead<R: Rng + ?Sized>(
        &mut self,
        handle: ModelHandle,
        head: HeadId,
        flags: SpawnFlags,
        rng: &mut R,
    ) -> BodyResult<()> {
        let registry = Arc::clone(self.registry()?);
        let current = self.pool.get(handle).ok_or(BodyError::StaleHandle)?;
        let (body, was_player) = (current.body, current.is_player);

        let body_def = registry.body(body)?;
        if !body_def.requires_head {
            return Err(BodyError::IntegratedHead(body));
        }
        let head_def = registry.head(head)?;
        let body_model = self.cache.body(body_def)?;
        let head_model = self.cache.head(head_def)?;

        let flags = if was_player {
            flags | SpawnFlags::PLAYER
        } else {
            flags
        };
        let (eyewear, height) = self.cosmetic_rolls(body_def, flags, rng);

        let model = self.pool.get_mut(handle).ok_or(BodyError::StaleHandle)?;
        recompose_head(
            model,
            &Composition {
                body: body_def,
                body_model: &body_model,
                head: Some(HeadParts {
                    def: head_def,
                    model: &head_model,
                }),
                eyewear,
                is_player: flags.is_player(),
                height,
            },
        )?;

        tracing::debug!(%body, %head, slot = handle.index(), "model re-headed");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------------

    /// A live model of the current stage.
    #[must_use]
    pub fn model(&self, handle: ModelHandle) -> Option<&ComposedModel> {
        self.pool.get(handle)
    }

    /// Live models in allocation order.
    pub fn models(&self) -> impl Iterator<Item = (ModelHandle, &ComposedModel)> {
        self.pool.iter()
    }

    /// A character spawned on the current stage, by command index.
    #[must_use]
    pub fn chr(&self, command_index: u32) -> Option<&SpawnedChr> {
        self.stage.as_ref()?.roster.get(command_index)
    }

    /// Characters spawned on the current stage.
    #[must_use]
    pub fn roster(&self) -> Option<&StageRoster> {
        self.stage.as_ref().map(|s| &s.roster)
    }

    /// Heads active on the current stage.
    #[must_use]
    pub fn active_heads(&self) -> &[HeadId] {
        self.stage
            .as_ref()
            .map(|s| s.heads.active())
            .unwrap_or_default()
    }

    fn cosmetic_rolls<R: Rng + ?Sized>(
        &self,
        body: &BodyDefinition,
        flags: SpawnFlags,
        rng: &mut R,
    ) -> (bool, HeightMode) {
        if flags.is_player() {
            return (false, HeightMode::Authored);
        }

        let eyewear = flags.contains(SpawnFlags::ALLOW_EYEWEAR)
            && body.eyewear
            && rng.gen::<f32>() < self.config.eyewear_chance;

        let height = if flags.contains(SpawnFlags::VARY_HEIGHT) && body.vary_height {
            HeightMode::Varied(
                rng.gen_range(self.config.min_height_factor..=self.config.max_height_factor),
            )
        } else {
            HeightMode::Authored
        };

        (eyewear, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetRef, InMemoryAssets};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn system() -> BodiesSystem<InMemoryAssets> {
        let registry = Arc::new(BodyRegistry::builtin().unwrap());
        let mut system = BodiesSystem::new(
            BodiesConfig::default(),
            InMemoryAssets::from_registry(&registry),
        );
        assert!(system.init(registry));
        system
    }

    fn chr(body: u16) -> PackedChr {
        PackedChr {
            body: BodyId(body),
            head: None,
            flags: SpawnFlags::NONE,
            chr_num: body,
            pad: mannequin_shared::PadId(1),
            team: 0,
            squadron: 0,
        }
    }

    #[test]
    fn test_init_is_idempotent() {
        let mut system = system();
        let other = Arc::new(BodyRegistry::default());
        assert!(!system.init(other));
        assert_eq!(system.race(BodyId(0)), Ok(Race::Human));
    }

    #[test]
    fn test_uninitialized() {
        let mut system = BodiesSystem::new(BodiesConfig::default(), InMemoryAssets::new());
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(system.race(BodyId(0)), Err(BodyError::NotInitialized));
        assert_eq!(
            system.reset(StageId(1), &mut rng),
            Err(BodyError::NotInitialized)
        );
    }

    #[test]
    fn test_no_active_stage() {
        let mut system = system();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(
            system.allocate_model(BodyId(7), None, SpawnFlags::NONE, &mut rng),
            Err(BodyError::NoActiveStage)
        );
        assert_eq!(
            system.choose_head(BodyId(0), &mut rng),
            Err(BodyError::NoActiveStage)
        );
    }

    #[test]
    fn test_load_body_caches() {
        let mut system = system();
        assert_eq!(system.load_body(BodyId(0)), Ok(true));
        assert_eq!(system.load_body(BodyId(0)), Ok(false));
        assert_eq!(system.load_body(BodyId(999)), Err(BodyError::InvalidBodyId(BodyId(999))));

        system.loader_mut().mark_corrupt(AssetRef::Body(BodyId(1)), "truncated");
        assert!(matches!(
            system.load_body(BodyId(1)),
            Err(BodyError::LoadFailure(_))
        ));
    }

    #[test]
    fn test_stage_mismatch_and_order() {
        let mut system = system();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        system.reset(StageId(1), &mut rng).unwrap();

        assert_eq!(
            system.allocate_chr(StageId(2), &chr(0), 0, &mut rng),
            Err(BodyError::StageMismatch {
                requested: StageId(2),
                active: StageId(1)
            })
        );

        system.allocate_chr(StageId(1), &chr(0), 3, &mut rng).unwrap();
        assert_eq!(
            system.allocate_chr(StageId(1), &chr(1), 3, &mut rng),
            Err(BodyError::CommandOutOfOrder { index: 3, last: 3 })
        );
        assert_eq!(system.free_capacity(), system.config().pool_capacity - 1);
    }

    #[test]
    fn test_failed_load_allocates_nothing() {
        let mut system = system();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        system.reset(StageId(1), &mut rng).unwrap();
        system.loader_mut().remove_body(BodyId(7));

        let before = system.free_capacity();
        assert!(matches!(
            system.allocate_model(BodyId(7), None, SpawnFlags::NONE, &mut rng),
            Err(BodyError::LoadFailure(_))
        ));
        assert_eq!(system.free_capacity(), before);
    }

    #[test]
    fn test_player_gets_canonical_appearance() {
        let mut system = system();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        system.reset(StageId(1), &mut rng).unwrap();

        let mut record = chr(0);
        record.flags = SpawnFlags::PLAYER | SpawnFlags::VARY_HEIGHT | SpawnFlags::ALLOW_EYEWEAR;
        let handle = system.allocate_chr(StageId(1), &record, 0, &mut rng).unwrap();

        let model = system.model(handle).unwrap();
        assert!(model.is_player);
        assert!(!model.eyewear);
        assert!((model.height_factor - 1.0).abs() < f32::EPSILON);
        // Lowest-id head that suits a male human body.
        assert_eq!(model.head, Some(HeadId(0)));
        assert_eq!(system.chr(0).map(|c| c.head), Some(Some(HeadId(0))));
    }

    #[test]
    fn test_varied_height_within_range() {
        let mut system = system();
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        system.reset(StageId(1), &mut rng).unwrap();
        let (min, max) = (system.config().min_height_factor, system.config().max_height_factor);

        for index in 0..10 {
            let mut record = chr(0);
            record.flags = SpawnFlags::VARY_HEIGHT;
            let handle = system.allocate_chr(StageId(1), &record, index, &mut rng).unwrap();
            let factor = system.model(handle).unwrap().height_factor;
            assert!((min..=max).contains(&factor));
        }
    }

    #[test]
    fn test_rehead_in_place() {
        let mut system = system();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        system.reset(StageId(1), &mut rng).unwrap();

        let handle = system
            .allocate_model(BodyId(0), Some(HeadId(0)), SpawnFlags::NONE, &mut rng)
            .unwrap();
        let free = system.free_capacity();
        let geometry = system.model(handle).unwrap().body_geometry;

        system
            .rehead(handle, HeadId(3), SpawnFlags::NONE, &mut rng)
            .unwrap();
        let model = system.model(handle).unwrap();
        assert_eq!(model.head, Some(HeadId(3)));
        assert_eq!(model.body_geometry, geometry);
        assert_eq!(system.free_capacity(), free);

        system.reset(StageId(2), &mut rng).unwrap();
        assert_eq!(
            system.rehead(handle, HeadId(3), SpawnFlags::NONE, &mut rng),
            Err(BodyError::StaleHandle)
        );
    }

    #[test]
    fn test_calculate_head_offset_through_system() {
        let mut system = system();
        let authored = system
            .calculate_head_offset(HeadId(0), BodyId(0), HeightMode::Authored)
            .unwrap();
        let varied = system
            .calculate_head_offset(HeadId(0), BodyId(0), HeightMode::Varied(1.05))
            .unwrap();
        assert_eq!(varied.offset, authored.offset * 1.05);
    }

    #[test]
    fn test_reset_validates_config() {
        let registry = Arc::new(BodyRegistry::builtin().unwrap());
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let bad = [
            BodiesConfig {
                max_height_factor: f32::INFINITY,
                ..BodiesConfig::default()
            },
            BodiesConfig {
                pool_capacity: 1 << 62,
                ..BodiesConfig::default()
            },
            BodiesConfig {
                active_heads_per_gender: 1 << 62,
                ..BodiesConfig::default()
            },
        ];

        for config in bad {
            let mut system =
                BodiesSystem::new(config, InMemoryAssets::from_registry(&registry));
            system.init(Arc::clone(&registry));
            assert!(matches!(
                system.reset(StageId(1), &mut rng),
                Err(BodyError::InvalidConfig(_))
            ));
            assert_eq!(system.stage(), None);
            assert_eq!(
                system.allocate_model(BodyId(0), Some(HeadId(0)), SpawnFlags::VARY_HEIGHT, &mut rng),
                Err(BodyError::NoActiveStage)
            );
        }
    }

    #[test]
    fn test_rehead_integrated_body_is_refused() {
        let mut system = system();
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        system.reset(StageId(1), &mut rng).unwrap();

        let pad = Pad {
            id: mannequin_shared::PadId(2),
            position: Vec3::new(0.0, 0.0, 0.0),
        };
        let prop = system.allocate_eyespy(pad, RoomId(1), &mut rng).unwrap();
        let before = system.model(prop.model).cloned();

        assert_eq!(
            system.rehead(prop.model, HeadId(0), SpawnFlags::NONE, &mut rng),
            Err(BodyError::IntegratedHead(BodyId(85)))
        );
        assert_eq!(system.model(prop.model).cloned(), before);
    }

    #[test]
    fn test_eyespy_hovers_above_pad() {
        let mut system = system();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        system.reset(StageId(1), &mut rng).unwrap();

        let pad = Pad {
            id: mannequin_shared::PadId(40),
            position: Vec3::new(10.0, 2.0, -4.0),
        };
        let prop = system.allocate_eyespy(pad, RoomId(3), &mut rng).unwrap();
        assert_eq!(prop.room, RoomId(3));
        assert_eq!(prop.position, Vec3::new(10.0, 32.0, -4.0));

        let model = system.model(prop.model).unwrap();
        assert_eq!(model.body, BodyId(85));
        assert!(!model.has_head());
    }
}

//! # Stage Pool
//!
//! Fixed-capacity storage for the composed models of the loaded stage.
//!
//! Models are never freed one by one. The whole pool is reset when the next
//! stage loads, and every handle issued before the reset stops resolving.

use mannequin_core::{Arena, ArenaHandle};
use mannequin_shared::StageId;

use crate::composer::ComposedModel;
use crate::error::{BodyError, BodyResult};

/// Handle to a composed model in the stage pool.
pub type ModelHandle = ArenaHandle;

/// The composed-model pool for the loaded stage.
#[derive(Debug)]
pub struct StagePool {
    stage: Option<StageId>,
    models: Arena<ComposedModel>,
    /// Set on the first failed reservation; cleared by reset.
    exhausted: bool,
}

impl Default for StagePool {
    fn default() -> Self {
        Self::new()
    }
}

impl StagePool {
    /// Creates an empty pool with no stage loaded.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stage: None,
            models: Arena::new(0),
            exhausted: false,
        }
    }

    /// Starts `stage` with room for `capacity` models.
    ///
    /// Handles from the previous stage are invalidated, even when this
    /// fails.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the slots cannot be reserved. No stage is loaded
    /// afterwards.
    pub fn reset(&mut self, stage: StageId, capacity: usize) -> BodyResult<()> {
        if let Some(previous) = self.stage.take() {
            tracing::debug!(%previous, live = self.models.len(), "releasing stage pool");
        }
        self.exhausted = false;
        self.models.reset_with_capacity(capacity).map_err(|e| {
            BodyError::InvalidConfig(format!("{stage} pool of {capacity} models: {e}"))
        })?;
        self.stage = Some(stage);
        Ok(())
    }

    /// Stage currently loaded, if any.
    #[inline]
    #[must_use]
    pub const fn stage(&self) -> Option<StageId> {
        self.stage
    }

    /// Checks that one more model fits.
    ///
    /// Exhaustion is logged once per stage; later calls fail quietly with the
    /// same error.
    ///
    /// # Errors
    ///
    /// `NoActiveStage` before the first reset, `PoolExhausted` when full.
    pub fn ensure_capacity(&mut self) -> BodyResult<()> {
        let stage = self.stage.ok_or(BodyError::NoActiveStage)?;
        let exhausted = BodyError::PoolExhausted {
            stage,
            capacity: self.models.capacity(),
        };

        if self.exhausted {
            return Err(exhausted);
        }
        if self.models.is_full() {
            self.exhausted = true;
            tracing::warn!(%stage, capacity = self.models.capacity(), "stage pool exhausted");
            return Err(exhausted);
        }
        Ok(())
    }

    /// Stores a model.
    ///
    /// # Errors
    ///
    /// Same as [`StagePool::ensure_capacity`]. Nothing is stored on error.
    pub fn insert(&mut self, model: ComposedModel) -> BodyResult<ModelHandle> {
        self.ensure_capacity()?;
        let stage = self.stage.ok_or(BodyError::NoActiveStage)?;
        self.models.alloc(model).ok_or(BodyError::PoolExhausted {
            stage,
            capacity: self.models.capacity(),
        })
    }

    /// Looks up a model. Handles from earlier stages resolve to `None`.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: ModelHandle) -> Option<&ComposedModel> {
        self.models.get(handle)
    }

    /// Mutable lookup, for re-heading in place.
    #[inline]
    pub fn get_mut(&mut self, handle: ModelHandle) -> Option<&mut ComposedModel> {
        self.models.get_mut(handle)
    }

    /// Free slots left on this stage.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.models.remaining()
    }

    /// Slots on this stage.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.models.capacity()
    }

    /// Live models on this stage.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Returns `true` if no model is live.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Live models in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (ModelHandle, &ComposedModel)> {
        self.models.iter()
    }
}

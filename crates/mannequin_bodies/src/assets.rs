//! # Asset Loading Seam
//!
//! The composer never reads files. It asks an [`AssetLoader`] for the model
//! definition behind a body or head and caches the answer for the rest of the
//! process in a [`ModelCache`].
//!
//! [`InMemoryAssets`] is the loader used by tools and tests: it synthesizes
//! model definitions from the registry, and individual entries can be removed
//! or replaced to simulate broken content.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use mannequin_shared::{BodyId, HeadId};
use thiserror::Error;

use crate::registry::{BodyDefinition, BodyRegistry, HeadDefinition};

/// Opaque handle to loaded geometry, owned by the asset layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GeometryHandle(pub u32);

/// Named parts the composer looks for inside a model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ModelPart {
    /// Joint on a body where a head is attached.
    Headspot = 0,
    /// Root joint of a head model.
    HeadRoot = 1,
    /// Eyewear sub-model on a head.
    Eyewear = 2,
}

/// Set of [`ModelPart`]s present in a model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PartSet(u8);

impl PartSet {
    /// No parts.
    pub const EMPTY: Self = Self(0);

    /// Returns a copy with `part` added.
    #[inline]
    #[must_use]
    pub const fn with(self, part: ModelPart) -> Self {
        Self(self.0 | (1 << part as u8))
    }

    /// Membership test.
    #[inline]
    #[must_use]
    pub const fn has(self, part: ModelPart) -> bool {
        self.0 & (1 << part as u8) != 0
    }
}

/// Loaded model definition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModelDef {
    /// Geometry handle.
    pub geometry: GeometryHandle,
    /// Parts present in the geometry.
    pub parts: PartSet,
}

/// Which asset a load concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetRef {
    /// A body model.
    Body(BodyId),
    /// A head model.
    Head(HeadId),
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Body(id) => write!(f, "{id}"),
            Self::Head(id) => write!(f, "{id}"),
        }
    }
}

/// Failure reported by an asset loader.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    /// The file behind the asset does not exist.
    #[error("{asset}: file {file} not found")]
    NotFound {
        /// Asset requested.
        asset: AssetRef,
        /// File name from the definition.
        file: String,
    },
    /// The file exists but could not be decoded.
    #[error("{asset}: corrupt model data ({reason})")]
    Corrupt {
        /// Asset requested.
        asset: AssetRef,
        /// Decoder message.
        reason: String,
    },
}

/// Provider of body and head geometry.
///
/// Calls may block; the body system treats them as synchronous.
pub trait AssetLoader {
    /// Loads the geometry behind a body definition.
    ///
    /// # Errors
    ///
    /// Returns an [`AssetError`] if the geometry cannot be produced.
    fn load_body_geometry(&mut self, body: &BodyDefinition) -> Result<ModelDef, AssetError>;

    /// Loads the geometry behind a head definition.
    ///
    /// # Errors
    ///
    /// Returns an [`AssetError`] if the geometry cannot be produced.
    fn load_head_geometry(&mut self, head: &HeadDefinition) -> Result<ModelDef, AssetError>;
}

/// Process-lifetime cache of loaded model definitions.
///
/// A definition is loaded at most once; failures are not cached, so a later
/// request retries the loader.
#[derive(Debug)]
pub struct ModelCache<L> {
    loader: L,
    bodies: HashMap<BodyId, Arc<ModelDef>>,
    heads: HashMap<HeadId, Arc<ModelDef>>,
}

impl<L: AssetLoader> ModelCache<L> {
    /// Wraps a loader with an empty cache.
    #[must_use]
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            bodies: HashMap::new(),
            heads: HashMap::new(),
        }
    }

    /// Returns `true` if the body's geometry is already cached.
    #[must_use]
    pub fn is_body_loaded(&self, id: BodyId) -> bool {
        self.bodies.contains_key(&id)
    }

    /// Returns the body's model, loading it on first use.
    ///
    /// # Errors
    ///
    /// Propagates the loader's error.
    pub fn body(&mut self, def: &BodyDefinition) -> Result<Arc<ModelDef>, AssetError> {
        if let Some(model) = self.bodies.get(&def.id) {
            return Ok(Arc::clone(model));
        }
        let model = Arc::new(self.loader.load_body_geometry(def)?);
        tracing::debug!(body = %def.id, file = %def.file, "body geometry loaded");
        self.bodies.insert(def.id, Arc::clone(&model));
        Ok(model)
    }

    /// Returns the head's model, loading it on first use.
    ///
    /// # Errors
    ///
    /// Propagates the loader's error.
    pub fn head(&mut self, def: &HeadDefinition) -> Result<Arc<ModelDef>, AssetError> {
        if let Some(model) = self.heads.get(&def.id) {
            return Ok(Arc::clone(model));
        }
        let model = Arc::new(self.loader.load_head_geometry(def)?);
        tracing::debug!(head = %def.id, file = %def.file, "head geometry loaded");
        self.heads.insert(def.id, Arc::clone(&model));
        Ok(model)
    }

    /// Borrows the wrapped loader.
    #[must_use]
    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Mutably borrows the wrapped loader.
    pub fn loader_mut(&mut self) -> &mut L {
        &mut self.loader
    }
}

/// In-memory asset loader.
#[derive(Debug, Default)]
pub struct InMemoryAssets {
    bodies: HashMap<BodyId, ModelDef>,
    heads: HashMap<HeadId, ModelDef>,
    corrupt: HashMap<AssetRef, String>,
    loads: usize,
}

impl InMemoryAssets {
    /// Creates an empty loader. Every load fails until models are inserted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Synthesizes a model for every registry entry.
    ///
    /// Bodies that require a head get a headspot. Heads get a root joint, and
    /// an eyewear part when their definition allows eyewear.
    #[must_use]
    pub fn from_registry(registry: &BodyRegistry) -> Self {
        let mut assets = Self::new();
        let mut next = 1u32;

        for body in registry.bodies() {
            let parts = if body.requires_head {
                PartSet::EMPTY.with(ModelPart::Headspot)
            } else {
                PartSet::EMPTY
            };
            assets.insert_body(body.id, ModelDef { geometry: GeometryHandle(next), parts });
            next += 1;
        }

        for head in registry.heads() {
            let mut parts = PartSet::EMPTY.with(ModelPart::HeadRoot);
            if head.eyewear {
                parts = parts.with(ModelPart::Eyewear);
            }
            assets.insert_head(head.id, ModelDef { geometry: GeometryHandle(next), parts });
            next += 1;
        }

        assets
    }

    /// Adds or replaces a body model.
    pub fn insert_body(&mut self, id: BodyId, model: ModelDef) {
        self.bodies.insert(id, model);
    }

    /// Adds or replaces a head model.
    pub fn insert_head(&mut self, id: HeadId, model: ModelDef) {
        self.heads.insert(id, model);
    }

    /// Removes a body model so its next load fails with `NotFound`.
    pub fn remove_body(&mut self, id: BodyId) -> Option<ModelDef> {
        self.bodies.remove(&id)
    }

    /// Makes every load of `asset` fail with `Corrupt`.
    pub fn mark_corrupt(&mut self, asset: AssetRef, reason: impl Into<String>) {
        self.corrupt.insert(asset, reason.into());
    }

    /// Number of loads served, successful or not.
    #[must_use]
    pub const fn load_count(&self) -> usize {
        self.loads
    }

    fn check_corrupt(&self, asset: AssetRef) -> Result<(), AssetError> {
        match self.corrupt.get(&asset) {
            Some(reason) => Err(AssetError::Corrupt {
                asset,
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl AssetLoader for InMemoryAssets {
    fn load_body_geometry(&mut self, body: &BodyDefinition) -> Result<ModelDef, AssetError> {
        self.loads += 1;
        let asset = AssetRef::Body(body.id);
        self.check_corrupt(asset)?;
        self.bodies.get(&body.id).copied().ok_or_else(|| AssetError::NotFound {
            asset,
            file: body.file.clone(),
        })
    }

    fn load_head_geometry(&mut self, head: &HeadDefinition) -> Result<ModelDef, AssetError> {
        self.loads += 1;
        let asset = AssetRef::Head(head.id);
        self.check_corrupt(asset)?;
        self.heads.get(&head.id).copied().ok_or_else(|| AssetError::NotFound {
            asset,
            file: head.file.clone(),
        })
    }
}

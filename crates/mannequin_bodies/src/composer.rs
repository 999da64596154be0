//! # Geometry Composer
//!
//! Builds a [`ComposedModel`] from a body, an optional head and optional
//! eyewear.
//!
//! Two entry points share one code path:
//! - [`compose_new`] builds a fresh model
//! - [`recompose_head`] re-heads an existing model in place, keeping its
//!   body geometry and pool slot
//!
//! Both recompute the head attachment from the height requested *now*; an
//! attachment is never reused across height changes.

use mannequin_shared::{BodyId, HeadId, Vec3};

use crate::assets::{GeometryHandle, ModelDef, ModelPart};
use crate::error::{BodyError, BodyResult};
use crate::registry::{BodyDefinition, HeadDefinition};

/// How the body's height is chosen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HeightMode {
    /// Authored height, no variation.
    Authored,
    /// Authored height multiplied by a variation factor.
    Varied(f32),
}

impl HeightMode {
    /// Variation factor, `1.0` for [`HeightMode::Authored`].
    #[inline]
    #[must_use]
    pub const fn factor(self) -> f32 {
        match self {
            Self::Authored => 1.0,
            Self::Varied(factor) => factor,
        }
    }
}

/// Where and at what scale a head sits on a body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeadAttachment {
    /// Local offset of the head root from the body's headspot.
    pub offset: Vec3,
    /// Scale applied to the head geometry so it keeps its authored size
    /// under the body's authored scale.
    pub scale: f32,
}

/// A fully assembled character model.
#[derive(Clone, Debug, PartialEq)]
pub struct ComposedModel {
    /// Body the model was built from.
    pub body: BodyId,
    /// Body geometry.
    pub body_geometry: GeometryHandle,
    /// Attached head, if any.
    pub head: Option<HeadId>,
    /// Head geometry, if a head is attached.
    pub head_geometry: Option<GeometryHandle>,
    /// Head placement, if a head is attached.
    pub attachment: Option<HeadAttachment>,
    /// Eyewear is shown.
    pub eyewear: bool,
    /// Final height scale: authored body scale times `height_factor`.
    pub height_scale: f32,
    /// Variation factor that produced `height_scale`.
    pub height_factor: f32,
    /// Built for a player-controlled character.
    pub is_player: bool,
}

impl ComposedModel {
    /// Returns `true` if a head is attached.
    #[inline]
    #[must_use]
    pub const fn has_head(&self) -> bool {
        self.head.is_some()
    }
}

/// A head definition together with its loaded model.
#[derive(Clone, Copy, Debug)]
pub struct HeadParts<'a> {
    /// Head definition.
    pub def: &'a HeadDefinition,
    /// Loaded head model.
    pub model: &'a ModelDef,
}

/// Inputs shared by both composer entry points.
#[derive(Clone, Copy, Debug)]
pub struct Composition<'a> {
    /// Body definition.
    pub body: &'a BodyDefinition,
    /// Loaded body model.
    pub body_model: &'a ModelDef,
    /// Head to attach. Ignored for bodies with an integrated head.
    pub head: Option<HeadParts<'a>>,
    /// Eyewear requested. Best effort.
    pub eyewear: bool,
    /// Player-controlled: height variation is ignored.
    pub is_player: bool,
    /// Requested height.
    pub height: HeightMode,
}

/// Computes where the head root sits relative to the body's headspot.
///
/// The offset is the head's authored joint offset, scaled linearly by the
/// variation factor for [`HeightMode::Varied`] and left untouched for
/// [`HeightMode::Authored`]. The scale compensation is the ratio of the
/// head's authored scale to the body's.
///
/// This is a pure function of its arguments.
///
/// # Errors
///
/// Returns `HeadJointMissing` if the head model has no root joint.
pub fn calculate_head_offset(
    head_model: &ModelDef,
    head: &HeadDefinition,
    body: &BodyDefinition,
    height: HeightMode,
) -> BodyResult<HeadAttachment> {
    if !head_model.parts.has(ModelPart::HeadRoot) {
        return Err(BodyError::HeadJointMissing(head.id));
    }

    let offset = match height {
        HeightMode::Authored => head.joint_offset,
        HeightMode::Varied(factor) => head.joint_offset * factor,
    };

    Ok(HeadAttachment {
        offset,
        scale: head.scale / body.height_scale,
    })
}

/// Height mode actually applied: players and fixed-height bodies always use
/// the authored height.
fn effective_height(c: &Composition<'_>) -> HeightMode {
    if c.is_player || !c.body.vary_height {
        HeightMode::Authored
    } else {
        c.height
    }
}

/// Head-related fields of a model, computed before anything is written.
struct HeadFit {
    head: Option<HeadId>,
    head_geometry: Option<GeometryHandle>,
    attachment: Option<HeadAttachment>,
    eyewear: bool,
}

fn fit_head(c: &Composition<'_>, height: HeightMode) -> BodyResult<HeadFit> {
    if !c.body.requires_head {
        if let Some(head) = c.head {
            tracing::trace!(body = %c.body.id, head = %head.def.id, "integrated head, ignoring");
        }
        return Ok(HeadFit {
            head: None,
            head_geometry: None,
            attachment: None,
            eyewear: false,
        });
    }

    let head = c.head.ok_or(BodyError::HeadRequired(c.body.id))?;
    if !c.body_model.parts.has(ModelPart::Headspot) {
        return Err(BodyError::HeadspotMissing(c.body.id));
    }
    let attachment = calculate_head_offset(head.model, head.def, c.body, height)?;

    let eyewear = c.eyewear
        && c.body.eyewear
        && head.def.eyewear
        && head.model.parts.has(ModelPart::Eyewear);
    if c.eyewear && !eyewear {
        tracing::trace!(body = %c.body.id, head = %head.def.id, "eyewear omitted");
    }

    Ok(HeadFit {
        head: Some(head.def.id),
        head_geometry: Some(head.model.geometry),
        attachment: Some(attachment),
        eyewear,
    })
}

/// Re-heads `model` in place.
///
/// Body geometry and the model's pool slot are kept. Head, attachment,
/// eyewear and height are replaced. On error the model is left untouched.
///
/// # Errors
///
/// - `InvalidBodyId` if `c.body` is not the body `model` was built from
/// - `IntegratedHead` if the body carries its own head
/// - `HeadRequired`, `HeadspotMissing`, `HeadJointMissing` on structural
///   mismatches
pub fn recompose_head(model: &mut ComposedModel, c: &Composition<'_>) -> BodyResult<()> {
    if model.body != c.body.id {
        return Err(BodyError::InvalidBodyId(c.body.id));
    }
    if !c.body.requires_head {
        return Err(BodyError::IntegratedHead(c.body.id));
    }

    let height = effective_height(c);
    let fit = fit_head(c, height)?;

    model.head = fit.head;
    model.head_geometry = fit.head_geometry;
    model.attachment = fit.attachment;
    model.eyewear = fit.eyewear;
    model.height_factor = height.factor();
    model.height_scale = c.body.height_scale * height.factor();
    model.is_player = c.is_player;
    Ok(())
}

/// Builds a new model: body first, then head at the computed offset, then
/// eyewear if it fits.
///
/// # Errors
///
/// Same structural errors as [`recompose_head`].
pub fn compose_new(c: &Composition<'_>) -> BodyResult<ComposedModel> {
    let mut model = ComposedModel {
        body: c.body.id,
        body_geometry: c.body_model.geometry,
        head: None,
        head_geometry: None,
        attachment: None,
        eyewear: false,
        height_scale: c.body.height_scale,
        height_factor: 1.0,
        is_player: c.is_player,
    };
    recompose_head(&mut model, c)?;
    Ok(model)
}

//! # Body and Head Registry
//!
//! Flat, read-only tables of body and head definitions.
//!
//! The registry is built once (by `bodies_init`) from a TOML content file and
//! never mutated afterwards. Composed models refer back to it by id.
//!
//! Compatibility is a data tag, not a type hierarchy: a head lists the races
//! it fits in a [`RaceSet`] and the check is a bit test.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use mannequin_shared::{BodyId, Gender, HeadId, Race, RaceSet, Vec3};

use crate::error::{BodyError, BodyResult};

const fn unit_scale() -> f32 {
    1.0
}

const fn yes() -> bool {
    true
}

/// A body definition: torso, limbs and skeleton of a character.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BodyDefinition {
    /// Stable body id.
    pub id: BodyId,
    /// Content name, for logs and tools.
    pub name: String,
    /// Race classification.
    pub race: Race,
    /// Gender, if the body has one.
    #[serde(default)]
    pub gender: Option<Gender>,
    /// Geometry file the asset loader resolves.
    pub file: String,
    /// Authored height scale.
    #[serde(default = "unit_scale")]
    pub height_scale: f32,
    /// The head is a separate model attached at the headspot.
    #[serde(default)]
    pub requires_head: bool,
    /// The outfit allows eyewear.
    #[serde(default)]
    pub eyewear: bool,
    /// Height may be randomized on spawn.
    #[serde(default)]
    pub vary_height: bool,
    /// Canonical head for player-controlled spawns.
    #[serde(default)]
    pub default_head: Option<HeadId>,
}

/// A head definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeadDefinition {
    /// Stable head id.
    pub id: HeadId,
    /// Content name, for logs and tools.
    pub name: String,
    /// Races whose bodies can wear this head.
    pub races: RaceSet,
    /// Gender, if the head has one.
    #[serde(default)]
    pub gender: Option<Gender>,
    /// Geometry file the asset loader resolves.
    pub file: String,
    /// Authored head scale.
    #[serde(default = "unit_scale")]
    pub scale: f32,
    /// Local offset of the head root relative to the body's headspot.
    pub joint_offset: Vec3,
    /// The head carries an eyewear part.
    #[serde(default)]
    pub eyewear: bool,
    /// The head may be picked by random selection.
    #[serde(default = "yes")]
    pub selectable: bool,
}

impl HeadDefinition {
    /// Race compatibility: the head's race set contains the body's race.
    #[inline]
    #[must_use]
    pub fn fits_race(&self, body: &BodyDefinition) -> bool {
        self.races.contains(body.race)
    }

    /// Race compatibility plus matching gender where both are tagged.
    ///
    /// This is what automatic selection uses.
    #[inline]
    #[must_use]
    pub fn suits(&self, body: &BodyDefinition) -> bool {
        self.fits_race(body)
            && match (self.gender, body.gender) {
                (Some(head), Some(body)) => head == body,
                _ => true,
            }
    }
}

/// Problems found by [`BodyRegistry::audit`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContentIssue {
    /// A body needs a head but no head fits its race.
    NoCompatibleHead {
        /// The body.
        body: BodyId,
        /// Its race.
        race: Race,
    },
    /// A body's compatible heads are all unselectable, so random selection
    /// always takes the fallback path.
    NoSelectableHead {
        /// The body.
        body: BodyId,
    },
    /// `default_head` names a head that does not exist.
    DanglingDefaultHead {
        /// The body.
        body: BodyId,
        /// The missing head.
        head: HeadId,
    },
    /// `default_head` names a head of another race.
    IncompatibleDefaultHead {
        /// The body.
        body: BodyId,
        /// The mismatched head.
        head: HeadId,
    },
}

impl ContentIssue {
    /// Returns `true` if the issue breaks spawning rather than degrading it.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(
            self,
            Self::NoCompatibleHead { .. } | Self::DanglingDefaultHead { .. }
        )
    }
}

impl fmt::Display for ContentIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCompatibleHead { body, race } => {
                write!(f, "{body} ({race}) needs a head but none is compatible")
            }
            Self::NoSelectableHead { body } => {
                write!(f, "{body} has compatible heads but none are selectable")
            }
            Self::DanglingDefaultHead { body, head } => {
                write!(f, "{body} default_head {head} does not exist")
            }
            Self::IncompatibleDefaultHead { body, head } => {
                write!(f, "{body} default_head {head} does not fit its race")
            }
        }
    }
}

/// On-disk layout of a content file.
#[derive(Deserialize)]
struct RegistryFile {
    #[serde(default, rename = "body")]
    bodies: Vec<BodyDefinition>,
    #[serde(default, rename = "head")]
    heads: Vec<HeadDefinition>,
}

/// The body and head tables.
#[derive(Debug, Default)]
pub struct BodyRegistry {
    /// Bodies sorted by id.
    bodies: Vec<BodyDefinition>,
    /// Heads sorted by id.
    heads: Vec<HeadDefinition>,
    body_index: HashMap<BodyId, usize>,
    head_index: HashMap<HeadId, usize>,
}

impl BodyRegistry {
    /// Builds a registry, validating every entry.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` on duplicate ids, non-positive scales,
    /// non-finite offsets or heads with no races.
    pub fn new(
        mut bodies: Vec<BodyDefinition>,
        mut heads: Vec<HeadDefinition>,
    ) -> BodyResult<Self> {
        bodies.sort_by_key(|b| b.id);
        heads.sort_by_key(|h| h.id);

        let mut body_index = HashMap::with_capacity(bodies.len());
        for (i, body) in bodies.iter().enumerate() {
            if !(body.height_scale.is_finite() && body.height_scale > 0.0) {
                return Err(BodyError::InvalidConfig(format!(
                    "{} has height_scale {}",
                    body.id, body.height_scale
                )));
            }
            if body_index.insert(body.id, i).is_some() {
                return Err(BodyError::InvalidConfig(format!("duplicate {}", body.id)));
            }
        }

        let mut head_index = HashMap::with_capacity(heads.len());
        for (i, head) in heads.iter().enumerate() {
            if !(head.scale.is_finite() && head.scale > 0.0) {
                return Err(BodyError::InvalidConfig(format!(
                    "{} has scale {}",
                    head.id, head.scale
                )));
            }
            if !head.joint_offset.is_finite() {
                return Err(BodyError::InvalidConfig(format!(
                    "{} has a non-finite joint_offset",
                    head.id
                )));
            }
            if head.races.is_empty() {
                return Err(BodyError::InvalidConfig(format!("{} lists no races", head.id)));
            }
            if head_index.insert(head.id, i).is_some() {
                return Err(BodyError::InvalidConfig(format!("duplicate {}", head.id)));
            }
        }

        Ok(Self {
            bodies,
            heads,
            body_index,
            head_index,
        })
    }

    /// Parses a registry from TOML content.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` on malformed TOML or invalid entries.
    pub fn from_toml_str(text: &str) -> BodyResult<Self> {
        let file: RegistryFile =
            toml::from_str(text).map_err(|e| BodyError::InvalidConfig(e.to_string()))?;
        Self::new(file.bodies, file.heads)
    }

    /// Reads and parses a registry file.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the file cannot be read or is invalid.
    pub fn from_file(path: impl AsRef<Path>) -> BodyResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| BodyError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// The content table bundled with the crate.
    ///
    /// # Errors
    ///
    /// Only fails if the bundled file itself is broken.
    pub fn builtin() -> BodyResult<Self> {
        Self::from_toml_str(include_str!("../data/bodies.toml"))
    }

    /// Looks up a body.
    ///
    /// # Errors
    ///
    /// Returns `InvalidBodyId` for unregistered ids.
    #[inline]
    pub fn body(&self, id: BodyId) -> BodyResult<&BodyDefinition> {
        self.body_index
            .get(&id)
            .map(|&i| &self.bodies[i])
            .ok_or(BodyError::InvalidBodyId(id))
    }

    /// Looks up a head.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHeadId` for unregistered ids.
    #[inline]
    pub fn head(&self, id: HeadId) -> BodyResult<&HeadDefinition> {
        self.head_index
            .get(&id)
            .map(|&i| &self.heads[i])
            .ok_or(BodyError::InvalidHeadId(id))
    }

    /// Race classification of a body.
    ///
    /// # Errors
    ///
    /// Returns `InvalidBodyId` for unregistered ids.
    #[inline]
    pub fn race(&self, id: BodyId) -> BodyResult<Race> {
        self.body(id).map(|b| b.race)
    }

    /// All bodies, sorted by id.
    #[must_use]
    pub fn bodies(&self) -> &[BodyDefinition] {
        &self.bodies
    }

    /// All heads, sorted by id.
    #[must_use]
    pub fn heads(&self) -> &[HeadDefinition] {
        &self.heads
    }

    /// Heads whose race set contains the body's race, in id order.
    pub fn compatible_heads<'a>(
        &'a self,
        body: &'a BodyDefinition,
    ) -> impl Iterator<Item = &'a HeadDefinition> + 'a {
        self.heads.iter().filter(move |h| h.fits_race(body))
    }

    /// The head a player-controlled spawn of `body` always gets.
    ///
    /// Uses the body's `default_head` when it exists and fits; otherwise the
    /// lowest-id head that suits the body, then the lowest-id head that fits
    /// its race.
    #[must_use]
    pub fn canonical_head(&self, body: &BodyDefinition) -> Option<HeadId> {
        if let Some(id) = body.default_head {
            if self.head(id).is_ok_and(|h| h.fits_race(body)) {
                return Some(id);
            }
        }
        self.heads
            .iter()
            .find(|h| h.suits(body))
            .or_else(|| self.compatible_heads(body).next())
            .map(|h| h.id)
    }

    /// Checks content for problems that would surface at spawn time.
    #[must_use]
    pub fn audit(&self) -> Vec<ContentIssue> {
        let mut issues = Vec::new();

        for body in &self.bodies {
            if let Some(head) = body.default_head {
                match self.head(head) {
                    Err(_) => issues.push(ContentIssue::DanglingDefaultHead { body: body.id, head }),
                    Ok(h) if !h.fits_race(body) => {
                        issues.push(ContentIssue::IncompatibleDefaultHead { body: body.id, head });
                    }
                    Ok(_) => {}
                }
            }

            if !body.requires_head {
                continue;
            }

            let mut compatible = self.compatible_heads(body).peekable();
            if compatible.peek().is_none() {
                issues.push(ContentIssue::NoCompatibleHead {
                    body: body.id,
                    race: body.race,
                });
            } else if !compatible.any(|h| h.selectable) {
                issues.push(ContentIssue::NoSelectableHead { body: body.id });
            }
        }

        issues
    }
}

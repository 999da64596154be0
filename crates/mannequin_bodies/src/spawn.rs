//! # Spawn Records
//!
//! What the level script hands the body system, and what it gets back.

use serde::{Deserialize, Serialize};
use std::path::Path;

use mannequin_shared::{BodyId, HeadId, PadId, RoomId, SpawnFlags, StageId, Vec3};

use crate::allocator::ModelHandle;
use crate::error::{BodyError, BodyResult};

/// One packed character record from a stage roster.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedChr {
    /// Body to spawn.
    pub body: BodyId,
    /// Explicit head. `None` lets the policy choose.
    #[serde(default)]
    pub head: Option<HeadId>,
    /// Spawn flags.
    #[serde(default)]
    pub flags: SpawnFlags,
    /// Character number the level script refers to.
    pub chr_num: u16,
    /// Pad the character spawns on.
    pub pad: PadId,
    /// Team bits.
    #[serde(default)]
    pub team: u8,
    /// Squadron.
    #[serde(default)]
    pub squadron: u8,
}

/// A character registered against its roster command index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpawnedChr {
    /// Roster command index.
    pub command_index: u32,
    /// Character number.
    pub chr_num: u16,
    /// Composed model.
    pub model: ModelHandle,
    /// Body spawned.
    pub body: BodyId,
    /// Head attached, if any.
    pub head: Option<HeadId>,
    /// Spawn pad.
    pub pad: PadId,
    /// Team bits.
    pub team: u8,
    /// Squadron.
    pub squadron: u8,
}

/// Characters spawned on the current stage, in command order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StageRoster {
    entries: Vec<SpawnedChr>,
}

impl StageRoster {
    /// Last registered command index.
    #[must_use]
    pub fn last_index(&self) -> Option<u32> {
        self.entries.last().map(|c| c.command_index)
    }

    /// Checks that `index` may be registered next.
    ///
    /// # Errors
    ///
    /// `CommandOutOfOrder` unless `index` is greater than the last one.
    pub fn check_order(&self, index: u32) -> BodyResult<()> {
        match self.last_index() {
            Some(last) if index <= last => Err(BodyError::CommandOutOfOrder { index, last }),
            _ => Ok(()),
        }
    }

    /// Registers a character. The caller has checked the order.
    pub(crate) fn push(&mut self, chr: SpawnedChr) {
        self.entries.push(chr);
    }

    /// Looks up a character by command index.
    #[must_use]
    pub fn get(&self, command_index: u32) -> Option<&SpawnedChr> {
        self.entries
            .binary_search_by_key(&command_index, |c| c.command_index)
            .ok()
            .map(|i| &self.entries[i])
    }

    /// Looks up a character by character number.
    #[must_use]
    pub fn by_chr_num(&self, chr_num: u16) -> Option<&SpawnedChr> {
        self.entries.iter().find(|c| c.chr_num == chr_num)
    }

    /// Spawned characters in command order.
    #[must_use]
    pub fn entries(&self) -> &[SpawnedChr] {
        &self.entries
    }

    /// Number of spawned characters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has spawned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A level pad.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pad {
    /// Pad id.
    pub id: PadId,
    /// World position.
    pub position: Vec3,
}

/// An eyespy prop placed on a pad.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EyespyProp {
    /// Composed model, no head attached.
    pub model: ModelHandle,
    /// Spawn pad.
    pub pad: PadId,
    /// Room the prop is registered in.
    pub room: RoomId,
    /// Hover position above the pad.
    pub position: Vec3,
}

/// Eyespy spawn request from a roster file.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EyespyRecord {
    /// Spawn pad.
    pub pad: PadId,
    /// Room.
    pub room: RoomId,
    /// Pad position.
    #[serde(default)]
    pub position: Vec3,
}

impl EyespyRecord {
    /// The pad this record refers to.
    #[must_use]
    pub const fn pad(&self) -> Pad {
        Pad {
            id: self.pad,
            position: self.position,
        }
    }
}

/// A decoded stage roster.
///
/// ```toml
/// stage = 1
///
/// [[chr]]
/// body = 0
/// flags = ["vary_height"]
/// chr_num = 1
/// pad = 10
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    /// Stage the roster belongs to.
    pub stage: StageId,
    /// Character records, in command order.
    #[serde(default, rename = "chr")]
    pub chrs: Vec<PackedChr>,
    /// Eyespy props.
    #[serde(default, rename = "eyespy")]
    pub eyespies: Vec<EyespyRecord>,
}

impl Roster {
    /// Parses a roster from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` on malformed TOML.
    pub fn from_toml_str(text: &str) -> BodyResult<Self> {
        toml::from_str(text).map_err(|e| BodyError::InvalidConfig(e.to_string()))
    }

    /// Reads and parses a roster file.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> BodyResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| BodyError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}

/// Outcome of loading a whole roster.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RosterReport {
    /// Command indices that spawned, with their models.
    pub spawned: Vec<(u32, ModelHandle)>,
    /// Command indices that failed, with the reason.
    pub failures: Vec<(u32, BodyError)>,
}

impl RosterReport {
    /// Returns `true` if every record spawned.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Failures that indicate broken content rather than a tight budget.
    pub fn content_errors(&self) -> impl Iterator<Item = &(u32, BodyError)> {
        self.failures
            .iter()
            .filter(|(_, e)| !matches!(e, BodyError::PoolExhausted { .. }))
    }
}

//! # Identifiers and Tags
//!
//! Stable ids for bodies, heads, stages, pads and rooms, plus the small
//! tagged enums and bitsets used for compatibility checks.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        #[repr(transparent)]
        pub struct $name(pub u16);

        impl $name {
            /// Returns the raw id.
            #[inline]
            #[must_use]
            pub const fn raw(self) -> u16 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

id_type!(
    /// Identifier of a body definition.
    BodyId,
    "body"
);
id_type!(
    /// Identifier of a head definition.
    HeadId,
    "head"
);
id_type!(
    /// Stage (level) number.
    StageId,
    "stage"
);
id_type!(
    /// Level pad a prop or character is placed on.
    PadId,
    "pad"
);
id_type!(
    /// Room a prop is registered in.
    RoomId,
    "room"
);

// ============================================================================
// RACE
// ============================================================================

/// Race classification of a body.
///
/// This is a closed set: content files cannot introduce new races.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Race {
    /// Human characters, the bulk of every roster.
    Human = 0,
    /// Maian visitors.
    Maian = 1,
    /// Skedar warriors. Heads are part of the body model.
    Skedar = 2,
    /// The Dr. Caroll AI shell.
    DrCaroll = 3,
    /// Robots and drones.
    Robot = 4,
    /// The eyespy camera drone.
    Eyespy = 5,
}

impl Race {
    /// Every race, in discriminant order.
    pub const ALL: [Self; 6] = [
        Self::Human,
        Self::Maian,
        Self::Skedar,
        Self::DrCaroll,
        Self::Robot,
        Self::Eyespy,
    ];

    /// Bit used for this race inside a [`RaceSet`].
    #[inline]
    #[must_use]
    pub const fn bit(self) -> u8 {
        1 << (self as u8)
    }

    /// Human-readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Human => "human",
            Self::Maian => "maian",
            Self::Skedar => "skedar",
            Self::DrCaroll => "dr_caroll",
            Self::Robot => "robot",
            Self::Eyespy => "eyespy",
        }
    }
}

impl fmt::Display for Race {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Set of races a head can be attached to.
///
/// Serialized as a list of race names.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Race>", into = "Vec<Race>")]
pub struct RaceSet(u8);

impl RaceSet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Creates a set holding exactly one race.
    #[inline]
    #[must_use]
    pub const fn only(race: Race) -> Self {
        Self(race.bit())
    }

    /// Returns a copy with `race` added.
    #[inline]
    #[must_use]
    pub const fn with(self, race: Race) -> Self {
        Self(self.0 | race.bit())
    }

    /// Membership test.
    #[inline]
    #[must_use]
    pub const fn contains(self, race: Race) -> bool {
        self.0 & race.bit() != 0
    }

    /// Returns `true` if no race is in the set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates over members in discriminant order.
    pub fn iter(self) -> impl Iterator<Item = Race> {
        Race::ALL.into_iter().filter(move |r| self.contains(*r))
    }
}

impl From<Vec<Race>> for RaceSet {
    fn from(races: Vec<Race>) -> Self {
        races.into_iter().fold(Self::EMPTY, Self::with)
    }
}

impl From<RaceSet> for Vec<Race> {
    fn from(set: RaceSet) -> Self {
        set.iter().collect()
    }
}

impl FromIterator<Race> for RaceSet {
    fn from_iter<I: IntoIterator<Item = Race>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

/// Gender tag shared by bodies and heads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    /// Male body or head.
    Male,
    /// Female body or head.
    Female,
}

// ============================================================================
// SPAWN FLAGS
// ============================================================================

/// A single named spawn flag, as written in roster files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnFlag {
    /// Use the record's head even if its race set does not match.
    ForceHead,
    /// The character may be given eyewear.
    AllowEyewear,
    /// Randomize the body height within the configured range.
    VaryHeight,
    /// The character is player controlled.
    Player,
}

impl SpawnFlag {
    const fn bit(self) -> u32 {
        match self {
            Self::ForceHead => SpawnFlags::FORCE_HEAD.0,
            Self::AllowEyewear => SpawnFlags::ALLOW_EYEWEAR.0,
            Self::VaryHeight => SpawnFlags::VARY_HEIGHT.0,
            Self::Player => SpawnFlags::PLAYER.0,
        }
    }
}

/// Bitset of per-spawn flags carried by a packed character record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<SpawnFlag>", into = "Vec<SpawnFlag>")]
pub struct SpawnFlags(u32);

impl SpawnFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// Explicit head bypasses the race check.
    pub const FORCE_HEAD: Self = Self(1 << 0);
    /// Eyewear may be attached.
    pub const ALLOW_EYEWEAR: Self = Self(1 << 1);
    /// Height may be varied.
    pub const VARY_HEIGHT: Self = Self(1 << 2);
    /// Player-controlled character: no cosmetic randomization.
    pub const PLAYER: Self = Self(1 << 3);

    const NAMED: [SpawnFlag; 4] = [
        SpawnFlag::ForceHead,
        SpawnFlag::AllowEyewear,
        SpawnFlag::VaryHeight,
        SpawnFlag::Player,
    ];

    /// Returns `true` if every flag in `other` is set.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns a copy with `other` removed.
    #[inline]
    #[must_use]
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Shorthand for `contains(Self::PLAYER)`.
    #[inline]
    #[must_use]
    pub const fn is_player(self) -> bool {
        self.contains(Self::PLAYER)
    }
}

impl std::ops::BitOr for SpawnFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for SpawnFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl From<Vec<SpawnFlag>> for SpawnFlags {
    fn from(flags: Vec<SpawnFlag>) -> Self {
        Self(flags.into_iter().fold(0, |bits, f| bits | f.bit()))
    }
}

impl From<SpawnFlags> for Vec<SpawnFlag> {
    fn from(flags: SpawnFlags) -> Self {
        SpawnFlags::NAMED
            .into_iter()
            .filter(|f| flags.0 & f.bit() != 0)
            .collect()
    }
}

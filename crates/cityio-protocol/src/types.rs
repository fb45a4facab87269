//! Entity models and identifiers.
//!
//! These are the snapshots an entity actor owns. They are plain data:
//! cloning one hands out a copy of the state at that moment, never a live
//! reference. Relationships between entities are expressed as identifiers
//! here and as actor addresses inside the actors themselves.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Generates a random 32-character hex id (128 bits of entropy).
fn generate_id() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Declares a string-backed id newtype. All four entity ids share the
/// same shape; only the name differs.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord,
            Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Generates a fresh random id.
            pub fn generate() -> Self {
                Self(generate_id())
            }

            /// Borrows the raw id string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Identity of a user account.
    UserId
);
string_id!(
    /// Identity of a city or town.
    CityId
);
string_id!(
    /// Identity of a building.
    BuildingId
);
string_id!(
    /// Identity of an army.
    ArmyId
);

/// A map coordinate. Identity of a tile.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
pub struct Coord {
    pub x: u32,
    pub y: u32,
}

impl Coord {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The five kinds of entity that run as actors.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    MapTile,
    City,
    Building,
    Army,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::MapTile => write!(f, "tile"),
            Self::City => write!(f, "city"),
            Self::Building => write!(f, "building"),
            Self::Army => write!(f, "army"),
        }
    }
}

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

/// A user account with its resource counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub username: String,
    pub email: String,
    /// Credential hash. Hashing happens outside the actor layer.
    pub password_hash: String,
    pub gold: u64,
    pub food: u64,
}

/// One tile of the world map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapTile {
    pub x: u32,
    pub y: u32,
}

impl MapTile {
    pub fn coord(&self) -> Coord {
        Coord::new(self.x, self.y)
    }
}

/// Whether a city belongs to a player or is a neutral town.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CityType {
    Capital,
    Town,
}

/// A city occupying a square footprint of tiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub city_id: CityId,
    /// `None` for unowned towns.
    pub owner: Option<UserId>,
    pub name: String,
    pub city_type: CityType,
    pub population: u32,
    pub population_cap: u32,
    pub start_x: u32,
    pub start_y: u32,
    pub size: u32,
}

impl City {
    /// Every tile covered by the city, row by row.
    ///
    /// Coordinates past `u32::MAX` do not exist and are skipped.
    pub fn footprint(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.size)
            .filter_map(move |dx| self.start_x.checked_add(dx))
            .flat_map(move |x| {
                (0..self.size)
                    .filter_map(move |dy| self.start_y.checked_add(dy))
                    .map(move |y| Coord::new(x, y))
            })
    }
}

/// The type of a building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingType {
    CityCenter,
    TownCenter,
    Barracks,
    Farm,
}

impl BuildingType {
    /// Population cap granted by a center building at `level`.
    ///
    /// Only city and town centers define a cap; other buildings return
    /// `None` and leave the city's cap untouched. Saturates at `u32::MAX`.
    pub fn population_cap(self, level: u32) -> Option<u32> {
        match self {
            Self::CityCenter => Some(level.saturating_mul(1000)),
            Self::TownCenter => Some(level.saturating_mul(500)),
            Self::Barracks | Self::Farm => None,
        }
    }

    /// Returns `true` for the buildings that drive a city's cap.
    pub fn is_center(self) -> bool {
        self.population_cap(1).is_some()
    }
}

/// A building placed on a single tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    pub building_id: BuildingId,
    pub city_id: CityId,
    pub building_type: BuildingType,
    pub level: u32,
    pub x: u32,
    pub y: u32,
}

impl Building {
    pub fn coord(&self) -> Coord {
        Coord::new(self.x, self.y)
    }
}

/// An army stationed on a tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Army {
    pub army_id: ArmyId,
    pub owner: UserId,
    pub size: u32,
    pub x: u32,
    pub y: u32,
}

impl Army {
    pub fn coord(&self) -> Coord {
        Coord::new(self.x, self.y)
    }
}

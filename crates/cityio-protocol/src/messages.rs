//! Messages exchanged between actors.
//!
//! Every entity actor accepts an [`Envelope`]: the lifecycle messages all
//! entities share (create, get, delete, stop) plus a `Command` slot for
//! the entity's own commands. Requests carry a [`Reply`] channel; the
//! actor answers on it exactly once. Messages without a reply channel are
//! fire-and-forget.

use std::collections::BTreeMap;
use std::fmt;

use cityio_actor::{Address, Reply};

use crate::{
    Army, ArmyId, Building, BuildingId, BuildingType, City, CityId, Coord,
    EntityError, EntityKind, MapTile, User, UserId,
};

// ---------------------------------------------------------------------------
// Envelope: shared lifecycle
// ---------------------------------------------------------------------------

/// The message type of an entity actor with state `S` and commands `C`.
#[derive(Debug)]
pub enum Envelope<S, C> {
    /// Sets the actor's state (Create/Register).
    ///
    /// With `restore: false` the state is persisted first and only
    /// committed if the write succeeds. With `restore: true` the row
    /// already exists and persistence is skipped. `reply` may be `None`
    /// for fire-and-forget restoration.
    Create {
        state: S,
        restore: bool,
        reply: Option<Reply<Result<(), EntityError>>>,
    },

    /// Requests a snapshot of the current state.
    Get { reply: Reply<Result<S, EntityError>> },

    /// Deletes the durable row, replies, then stops the actor.
    Delete { reply: Reply<Result<(), EntityError>> },

    /// An entity-specific command.
    Command(C),

    /// Stops the actor without touching storage.
    Stop,
}

impl<S, C> Envelope<S, C> {
    /// A fire-and-forget restore of an already persisted row.
    pub fn restore(state: S) -> Self {
        Self::Create {
            state,
            restore: true,
            reply: None,
        }
    }
}

pub type UserMessage = Envelope<User, UserCommand>;
pub type TileMessage = Envelope<MapTile, TileCommand>;
pub type CityMessage = Envelope<City, CityCommand>;
pub type BuildingMessage = Envelope<Building, BuildingCommand>;
pub type ArmyMessage = Envelope<Army, ArmyCommand>;

pub type UserAddress = Address<UserMessage>;
pub type TileAddress = Address<TileMessage>;
pub type CityAddress = Address<CityMessage>;
pub type BuildingAddress = Address<BuildingMessage>;
pub type ArmyAddress = Address<ArmyMessage>;
pub type ManagerAddress = Address<ManagerMessage>;

// ---------------------------------------------------------------------------
// Entity commands
// ---------------------------------------------------------------------------

/// Users have no commands beyond the envelope.
#[derive(Debug)]
pub enum UserCommand {}

/// Armies have no commands beyond the envelope.
#[derive(Debug)]
pub enum ArmyCommand {}

/// Commands understood by a tile actor.
#[derive(Debug)]
pub enum TileCommand {
    /// Links the city covering this tile. Last writer wins.
    SetCity { city: CityAddress },

    /// Links the building on this tile. Last writer wins.
    SetBuilding { building: BuildingAddress },

    /// Links the building only if the slot is free.
    ///
    /// Replies [`EntityError::Occupied`] when a building is already linked.
    ClaimBuilding {
        building: BuildingAddress,
        reply: Reply<Result<(), EntityError>>,
    },

    /// Unlinks the building.
    ClearBuilding,

    /// Appends an army and its snapshot. No deduplication.
    AddArmy {
        army: ArmyAddress,
        snapshot: Army,
        reply: Option<Reply<Result<(), EntityError>>>,
    },

    /// Removes the army with this id.
    RemoveArmy {
        army_id: ArmyId,
        reply: Reply<Result<(), EntityError>>,
    },

    /// Composite query: the tile plus whatever its links can report.
    GetView { reply: Reply<Result<TileView, EntityError>> },

    /// Army snapshots grouped by owner.
    GetArmies {
        reply: Reply<Result<BTreeMap<UserId, Vec<Army>>, EntityError>>,
    },
}

/// Everything known about one tile.
///
/// `city` and `building` are `None` both when nothing is linked and when
/// the linked actor failed to answer in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileView {
    pub tile: MapTile,
    pub city: Option<City>,
    pub building: Option<Building>,
    pub armies: BTreeMap<UserId, Vec<Army>>,
}

/// Commands understood by a city actor.
#[derive(Debug)]
pub enum CityCommand {
    /// Changes the owner (persisted).
    SetOwner {
        owner: Option<UserId>,
        reply: Reply<Result<City, EntityError>>,
    },

    /// Recomputes the population cap from the center building.
    RecalculatePopulationCap {
        center: BuildingType,
        level: u32,
        reply: Option<Reply<Result<City, EntityError>>>,
    },
}

/// Commands understood by a building actor.
#[derive(Debug)]
pub enum BuildingCommand {
    /// Links the owning city. Last writer wins.
    SetCity { city: CityAddress },

    /// Raises the level by one (persisted) and returns the new snapshot.
    Upgrade { reply: Reply<Result<Building, EntityError>> },
}

// ---------------------------------------------------------------------------
// PID registry
// ---------------------------------------------------------------------------

/// Key of a registry entry: an entity's durable identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PidKey {
    User(UserId),
    Tile(Coord),
    City(CityId),
    Building(BuildingId),
    Army(ArmyId),
}

impl PidKey {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::User(_) => EntityKind::User,
            Self::Tile(_) => EntityKind::MapTile,
            Self::City(_) => EntityKind::City,
            Self::Building(_) => EntityKind::Building,
            Self::Army(_) => EntityKind::Army,
        }
    }
}

/// Value of a registry entry: the live address for that entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pid {
    User(UserAddress),
    Tile(TileAddress),
    City(CityAddress),
    Building(BuildingAddress),
    Army(ArmyAddress),
}

impl Pid {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::User(_) => EntityKind::User,
            Self::Tile(_) => EntityKind::MapTile,
            Self::City(_) => EntityKind::City,
            Self::Building(_) => EntityKind::Building,
            Self::Army(_) => EntityKind::Army,
        }
    }
}

/// Ties a model type to its registry key and address type, so registry
/// lookups can be typed: `get::<User>(id)` yields a [`UserAddress`].
pub trait Registrable {
    /// Kind reported when a lookup finds nothing.
    const KIND: EntityKind;
    /// The durable identity used as registry key.
    type Key: Clone + fmt::Display + Send + Sync + 'static;
    /// The message type of the entity's actor.
    type Message: Send + 'static;

    fn pid_key(key: Self::Key) -> PidKey;
    fn into_pid(address: Address<Self::Message>) -> Pid;
    /// Returns `None` if `pid` belongs to another kind.
    fn from_pid(pid: Pid) -> Option<Address<Self::Message>>;
}

macro_rules! registrable {
    ($model:ty, $key:ty, $msg:ty, $variant:ident, $kind:ident) => {
        impl Registrable for $model {
            const KIND: EntityKind = EntityKind::$kind;
            type Key = $key;
            type Message = $msg;

            fn pid_key(key: $key) -> PidKey {
                PidKey::$variant(key)
            }

            fn into_pid(address: Address<$msg>) -> Pid {
                Pid::$variant(address)
            }

            fn from_pid(pid: Pid) -> Option<Address<$msg>> {
                match pid {
                    Pid::$variant(address) => Some(address),
                    _ => None,
                }
            }
        }
    };
}

registrable!(User, UserId, UserMessage, User, User);
registrable!(MapTile, Coord, TileMessage, Tile, MapTile);
registrable!(City, CityId, CityMessage, City, City);
registrable!(Building, BuildingId, BuildingMessage, Building, Building);
registrable!(Army, ArmyId, ArmyMessage, Army, Army);

/// Messages understood by the manager (PID registry) actor.
#[derive(Debug)]
pub enum ManagerMessage {
    /// Readiness barrier. Idempotent.
    Init { reply: Reply<Result<(), EntityError>> },

    /// Registers or overwrites a mapping.
    AddPid {
        key: PidKey,
        pid: Pid,
        reply: Option<Reply<Result<(), EntityError>>>,
    },

    /// Looks up a mapping. `Ok(None)` means the key is unknown.
    GetPid {
        key: PidKey,
        reply: Reply<Result<Option<Pid>, EntityError>>,
    },

    /// Deletes a mapping, returning the removed address if there was one.
    RemovePid {
        key: PidKey,
        reply: Reply<Result<Option<Pid>, EntityError>>,
    },

    /// Number of mappings of one kind.
    CountPids {
        kind: EntityKind,
        reply: Reply<Result<usize, EntityError>>,
    },

    /// Stops the manager.
    Shutdown,
}

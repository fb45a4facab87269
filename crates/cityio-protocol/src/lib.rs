//! Message catalog for Cityio.
//!
//! Everything that crosses an actor boundary is defined here:
//!
//! - **Types** ([`User`], [`MapTile`], [`City`], [`Building`], [`Army`],
//!   their identifiers and [`EntityKind`]): the entity snapshots actors
//!   own and hand out.
//! - **Messages** ([`Envelope`], the per-entity command enums, and
//!   [`ManagerMessage`]): what actors can be asked to do.
//! - **Errors** ([`EntityError`], [`StoreError`]): application-level
//!   failures carried inside well-formed replies.
//!
//! No logic lives here beyond small helpers on the data itself.
//!
//! ```text
//! Service layer → Envelope / ManagerMessage → Entity actors
//! ```

mod error;
mod messages;
mod types;

pub use error::{EntityError, StoreError};
pub use messages::{
    ArmyAddress, ArmyCommand, ArmyMessage, BuildingAddress, BuildingCommand,
    BuildingMessage, CityAddress, CityCommand, CityMessage, Envelope,
    ManagerAddress, ManagerMessage, Pid, PidKey, Registrable, TileAddress,
    TileCommand, TileMessage, TileView, UserAddress, UserCommand, UserMessage,
};
pub use types::{
    Army, ArmyId, Building, BuildingId, BuildingType, City, CityId, CityType,
    Coord, EntityKind, MapTile, User, UserId,
};

//! # Cityio
//!
//! Actor-per-entity game world for a city-building strategy game.
//!
//! Every user, map tile, city, building, and army runs as its own Tokio
//! task that owns its state. Entities refer to each other only by actor
//! address, and all interaction goes through messages. A single manager
//! actor maps entity ids to addresses.
//!
//! - [`World`] is the service layer: register, query, and mutate entities.
//! - [`World::restore`] rebuilds the world from a [`Store`] at startup.
//! - [`MemoryStore`] is an in-process store for tests and demos.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cityio::prelude::*;
//!
//! # async fn run() -> Result<(), CityioError> {
//! let world = World::builder()
//!     .config(ActorConfig::default())
//!     .build(MemoryStore::new());
//! let report = world.restore().await?;
//! println!("{} users online", report.users);
//! # Ok(())
//! # }
//! ```

mod army;
mod building;
mod city;
mod entity;
mod error;
mod manager;
mod restore;
mod store;
mod tile;
mod user;
mod world;

pub use army::ArmyActor;
pub use building::BuildingActor;
pub use city::CityActor;
pub use entity::{spawn, Context, Entity, EntityAddress};
pub use error::CityioError;
pub use manager::{spawn_manager, ManagerHandle};
pub use restore::RestoreReport;
pub use store::{MemoryStore, Row, Store};
pub use tile::TileActor;
pub use user::UserActor;
pub use world::{NewBuilding, NewUser, World, WorldBuilder};

pub use cityio_actor as actor;
pub use cityio_protocol as protocol;

/// Convenience re-exports for the common case.
pub mod prelude {
    pub use crate::{
        CityioError, MemoryStore, NewBuilding, NewUser, RestoreReport, Row,
        Store, World, WorldBuilder,
    };
    pub use cityio_actor::{ActorConfig, TransportError};
    pub use cityio_protocol::{
        Army, ArmyId, Building, BuildingId, BuildingType, City, CityId,
        CityType, Coord, EntityError, EntityKind, MapTile, StoreError,
        TileView, User, UserId,
    };
}

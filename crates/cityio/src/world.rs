//! `World` builder and the service-layer entry points.
//!
//! This is what an API layer calls. Each operation resolves the entities
//! it needs through the manager, then talks to their actors through the
//! request gateway. Nothing here touches entity state directly.

use std::collections::BTreeMap;
use std::sync::Arc;

use cityio_actor::{ActorConfig, Address, Reply};
use cityio_protocol::{
    Army, ArmyId, Building, BuildingCommand, BuildingId, BuildingType, City,
    CityCommand, CityId, Coord, EntityError, Envelope, MapTile, Registrable,
    TileCommand, TileView, User, UserId,
};

use crate::army::ArmyActor;
use crate::building::BuildingActor;
use crate::city::CityActor;
use crate::entity::{self, Context, Entity, EntityAddress};
use crate::manager::{spawn_manager, ManagerHandle};
use crate::store::Store;
use crate::tile::TileActor;
use crate::user::UserActor;
use crate::CityioError;

/// Input for [`World::register_user`]. The credential arrives already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Input for [`World::construct_building`]. New buildings start at level 1.
#[derive(Debug, Clone)]
pub struct NewBuilding {
    pub city_id: CityId,
    pub building_type: BuildingType,
    pub x: u32,
    pub y: u32,
}

/// Builder for configuring and starting a [`World`].
///
/// # Example
///
/// ```rust,ignore
/// let world = World::builder()
///     .config(ActorConfig::default())
///     .build(MemoryStore::new());
/// world.restore().await?;
/// ```
pub struct WorldBuilder {
    config: ActorConfig,
}

impl WorldBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ActorConfig::default(),
        }
    }

    /// Sets the actor configuration. Out-of-range values are clamped.
    pub fn config(mut self, config: ActorConfig) -> Self {
        self.config = config;
        self
    }

    /// Spawns the manager and returns the world.
    ///
    /// Must be called from inside a Tokio runtime. The manager starts
    /// closed; [`World::restore`] opens it.
    pub fn build<S: Store>(self, store: S) -> World<S> {
        let config = self.config.validated();
        let manager = spawn_manager(&config);
        World {
            ctx: Context {
                store: Arc::new(store),
                config,
            },
            manager,
        }
    }
}

impl Default for WorldBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running world: one manager plus the entity actors it knows about.
pub struct World<S> {
    pub(crate) ctx: Context<S>,
    pub(crate) manager: ManagerHandle,
}

impl World<()> {
    /// Creates a new builder. The store type is chosen by
    /// [`WorldBuilder::build`].
    pub fn builder() -> WorldBuilder {
        WorldBuilder::new()
    }
}

impl<S: Store> World<S> {
    pub fn manager(&self) -> &ManagerHandle {
        &self.manager
    }

    pub fn store(&self) -> &Arc<S> {
        &self.ctx.store
    }

    pub fn config(&self) -> &ActorConfig {
        &self.ctx.config
    }

    /// Stops the manager. Entity actors stop once nothing references them.
    pub async fn shutdown(&self) {
        self.manager.shutdown().await;
    }

    // -----------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------

    /// Creates, persists, and registers a new user. Returns the new id.
    pub async fn register_user(&self, new: NewUser) -> Result<UserId, CityioError> {
        let user = User {
            user_id: UserId::generate(),
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            gold: 0,
            food: 0,
        };
        let user_id = user.user_id.clone();

        let address = self.create::<UserActor>(user).await?;
        self.manager.add::<User>(user_id.clone(), address).await?;

        tracing::info!(%user_id, "user registered");
        Ok(user_id)
    }

    /// Spawns an actor for an already persisted user and registers it.
    pub async fn restore_user(&self, user: User) -> Result<(), CityioError> {
        let user_id = user.user_id.clone();
        let address = self.spawn::<UserActor>();
        self.call(&address, |reply| Envelope::Create {
            state: user,
            restore: true,
            reply: Some(reply),
        })
        .await?;
        self.manager.add::<User>(user_id, address).await
    }

    pub async fn get_user(&self, user_id: &UserId) -> Result<User, CityioError> {
        let address = self.resolve::<User>(user_id).await?;
        self.call(&address, |reply| Envelope::Get { reply }).await
    }

    /// Deletes the user's row, waits for its actor to stop, then drops
    /// the registry entry.
    pub async fn delete_user(&self, user_id: &UserId) -> Result<(), CityioError> {
        let address = self.resolve::<User>(user_id).await?;
        self.call(&address, |reply| Envelope::Delete { reply }).await?;
        self.manager.remove::<User>(user_id.clone()).await?;
        tracing::info!(%user_id, "user deleted");
        Ok(())
    }

    // -----------------------------------------------------------------
    // Tiles
    // -----------------------------------------------------------------

    pub async fn restore_tile(&self, tile: MapTile) -> Result<(), CityioError> {
        let address = self.restore_entity::<TileActor>(tile).await?;
        self.manager.add::<MapTile>(tile.coord(), address).await
    }

    /// The tile with its city, building, and armies.
    ///
    /// City or building are left `None` if their actor does not answer;
    /// only a missing or unresponsive tile fails the call.
    pub async fn get_tile(&self, coord: Coord) -> Result<TileView, CityioError> {
        let tile = self.resolve::<MapTile>(&coord).await?;
        self.call(&tile, |reply| Envelope::Command(TileCommand::GetView { reply }))
            .await
    }

    pub async fn get_tile_armies(
        &self,
        coord: Coord,
    ) -> Result<BTreeMap<UserId, Vec<Army>>, CityioError> {
        let tile = self.resolve::<MapTile>(&coord).await?;
        self.call(&tile, |reply| {
            Envelope::Command(TileCommand::GetArmies { reply })
        })
        .await
    }

    // -----------------------------------------------------------------
    // Cities
    // -----------------------------------------------------------------

    /// Spawns an actor for a persisted city and links every tile of its
    /// footprint to it.
    pub async fn restore_city(&self, city: City) -> Result<(), CityioError> {
        let city_id = city.city_id.clone();
        let footprint: Vec<Coord> = city.footprint().collect();

        let address = self.restore_entity::<CityActor>(city).await?;
        self.manager.add::<City>(city_id, address.clone()).await?;

        for coord in footprint {
            let tile = self.resolve::<MapTile>(&coord).await?;
            tile.send(Envelope::Command(TileCommand::SetCity {
                city: address.clone(),
            }))
            .await?;
        }
        Ok(())
    }

    pub async fn get_city(&self, city_id: &CityId) -> Result<City, CityioError> {
        let address = self.resolve::<City>(city_id).await?;
        self.call(&address, |reply| Envelope::Get { reply }).await
    }

    /// Hands a city to a new owner, or leaves it unowned with `None`.
    pub async fn set_city_owner(
        &self,
        city_id: &CityId,
        owner: Option<UserId>,
    ) -> Result<City, CityioError> {
        let address = self.resolve::<City>(city_id).await?;
        self.call(&address, |reply| {
            Envelope::Command(CityCommand::SetOwner { owner, reply })
        })
        .await
    }

    // -----------------------------------------------------------------
    // Armies
    // -----------------------------------------------------------------

    pub async fn restore_army(&self, army: Army) -> Result<(), CityioError> {
        let tile = self.resolve::<MapTile>(&army.coord()).await?;
        let army_id = army.army_id.clone();

        let address = self.restore_entity::<ArmyActor>(army.clone()).await?;
        self.manager.add::<Army>(army_id, address.clone()).await?;

        tile.send(Envelope::Command(TileCommand::AddArmy {
            army: address,
            snapshot: army,
            reply: None,
        }))
        .await?;
        Ok(())
    }

    /// Creates and persists an army, then stations it on its tile.
    pub async fn deploy_army(&self, army: Army) -> Result<(), CityioError> {
        let tile = self.resolve::<MapTile>(&army.coord()).await?;
        let army_id = army.army_id.clone();

        let address = self.create::<ArmyActor>(army.clone()).await?;
        self.manager
            .add::<Army>(army_id.clone(), address.clone())
            .await
            .inspect_err(|e| {
                tracing::warn!(%army_id, error = %e, "army persisted but not registered");
            })?;

        self.call(&tile, |reply| {
            Envelope::Command(TileCommand::AddArmy {
                army: address,
                snapshot: army,
                reply: Some(reply),
            })
        })
        .await
        .inspect_err(|e| {
            tracing::warn!(%army_id, error = %e, "army persisted but not stationed");
        })?;
        tracing::info!(%army_id, "army deployed");
        Ok(())
    }

    /// Removes an army from a tile's list. The army actor keeps running.
    pub async fn remove_army_from_tile(
        &self,
        coord: Coord,
        army_id: &ArmyId,
    ) -> Result<(), CityioError> {
        let tile = self.resolve::<MapTile>(&coord).await?;
        let army_id = army_id.clone();
        self.call(&tile, |reply| {
            Envelope::Command(TileCommand::RemoveArmy { army_id, reply })
        })
        .await
    }

    // -----------------------------------------------------------------
    // Buildings
    // -----------------------------------------------------------------

    /// Spawns an actor for a persisted building and links it to its tile
    /// and its city.
    pub async fn restore_building(&self, building: Building) -> Result<(), CityioError> {
        let tile = self.resolve::<MapTile>(&building.coord()).await?;
        let city = self.resolve::<City>(&building.city_id).await?;
        let building_id = building.building_id.clone();

        let address = self.restore_entity::<BuildingActor>(building).await?;
        address
            .send(Envelope::Command(BuildingCommand::SetCity { city }))
            .await?;
        self.manager
            .add::<Building>(building_id, address.clone())
            .await?;
        tile.send(Envelope::Command(TileCommand::SetBuilding { building: address }))
            .await?;
        Ok(())
    }

    /// Places a new building on a free tile.
    ///
    /// The tile is claimed before the row is written so two concurrent
    /// constructions cannot both win. If the write fails the claim is
    /// released and the actor stopped.
    pub async fn construct_building(
        &self,
        new: NewBuilding,
    ) -> Result<BuildingId, CityioError> {
        let coord = Coord::new(new.x, new.y);
        let tile = self.resolve::<MapTile>(&coord).await?;
        let city = self.resolve::<City>(&new.city_id).await?;

        let building = Building {
            building_id: BuildingId::generate(),
            city_id: new.city_id,
            building_type: new.building_type,
            level: 1,
            x: new.x,
            y: new.y,
        };
        let building_id = building.building_id.clone();
        let address = self.spawn::<BuildingActor>();

        let claim = address.clone();
        self.call(&tile, |reply| {
            Envelope::Command(TileCommand::ClaimBuilding {
                building: claim,
                reply,
            })
        })
        .await?;

        let created = self
            .call(&address, |reply| Envelope::Create {
                state: building,
                restore: false,
                reply: Some(reply),
            })
            .await;
        if let Err(e) = created {
            let _ = tile
                .send(Envelope::Command(TileCommand::ClearBuilding))
                .await;
            let _ = address.send(Envelope::Stop).await;
            return Err(e);
        }

        address
            .send(Envelope::Command(BuildingCommand::SetCity { city }))
            .await
            .inspect_err(|e| {
                tracing::warn!(%building_id, error = %e, "building persisted but not linked to city");
            })?;
        self.manager
            .add::<Building>(building_id.clone(), address)
            .await
            .inspect_err(|e| {
                tracing::warn!(%building_id, error = %e, "building persisted but not registered");
            })?;

        tracing::info!(%building_id, %coord, "building constructed");
        Ok(building_id)
    }

    /// Raises a building's level. Center buildings also update their
    /// city's population cap.
    pub async fn upgrade_building(
        &self,
        building_id: &BuildingId,
    ) -> Result<Building, CityioError> {
        let address = self.resolve::<Building>(building_id).await?;
        self.call(&address, |reply| {
            Envelope::Command(BuildingCommand::Upgrade { reply })
        })
        .await
    }

    pub async fn get_building(
        &self,
        building_id: &BuildingId,
    ) -> Result<Building, CityioError> {
        let address = self.resolve::<Building>(building_id).await?;
        self.call(&address, |reply| Envelope::Get { reply }).await
    }

    // -----------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------

    fn spawn<E: Entity>(&self) -> EntityAddress<E> {
        entity::spawn::<E, S>(self.ctx.clone())
    }

    /// Spawns an actor and creates its state, persisting it. The actor is
    /// stopped again if creation fails.
    async fn create<E: Entity>(
        &self,
        state: E::State,
    ) -> Result<EntityAddress<E>, CityioError> {
        let address = self.spawn::<E>();
        let created = self
            .call(&address, |reply| Envelope::Create {
                state,
                restore: false,
                reply: Some(reply),
            })
            .await;
        if let Err(e) = created {
            let _ = address.send(Envelope::Stop).await;
            return Err(e);
        }
        Ok(address)
    }

    /// Spawns an actor and restores its state without waiting for it.
    async fn restore_entity<E: Entity>(
        &self,
        state: E::State,
    ) -> Result<EntityAddress<E>, CityioError> {
        let address = self.spawn::<E>();
        address.send(Envelope::restore(state)).await?;
        Ok(address)
    }

    /// Looks up a registered entity, turning "unknown" into `NotFound`.
    async fn resolve<R: Registrable>(
        &self,
        key: &R::Key,
    ) -> Result<Address<R::Message>, CityioError> {
        self.manager
            .get::<R>(key.clone())
            .await?
            .ok_or_else(|| CityioError::from(EntityError::not_found(R::KIND, key)))
    }

    /// One bounded request to an entity actor.
    async fn call<St, C, T>(
        &self,
        address: &Address<Envelope<St, C>>,
        make: impl FnOnce(Reply<Result<T, EntityError>>) -> Envelope<St, C>,
    ) -> Result<T, CityioError>
    where
        St: Send + 'static,
        C: Send + 'static,
    {
        let result = address
            .request(make, self.ctx.config.request_timeout)
            .await??;
        Ok(result)
    }
}

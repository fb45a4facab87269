//! Tile actor: one map coordinate and everything standing on it.
//!
//! A tile owns no other entity. It holds the *addresses* of the city
//! covering it, the building on it, and the armies stationed there, and
//! asks them for their state when someone wants the full picture.

use std::collections::BTreeMap;

use cityio_actor::respond;
use cityio_protocol::{
    Army, ArmyAddress, BuildingAddress, CityAddress, EntityError, EntityKind,
    MapTile, TileCommand, TileView, UserId,
};

use crate::entity::{query_link, Context, Entity};
use crate::store::Store;

/// Private state of a tile actor.
pub struct TileActor {
    tile: MapTile,
    city: Option<CityAddress>,
    building: Option<BuildingAddress>,
    /// Stationed armies with the snapshot taken when they arrived.
    armies: Vec<(ArmyAddress, Army)>,
}

impl TileActor {
    fn armies_by_owner(&self) -> BTreeMap<UserId, Vec<Army>> {
        let mut grouped: BTreeMap<UserId, Vec<Army>> = BTreeMap::new();
        for (_, army) in &self.armies {
            grouped
                .entry(army.owner.clone())
                .or_default()
                .push(army.clone());
        }
        grouped
    }

    /// Builds the composite view. City and building are queried
    /// concurrently, each bounded by `link_timeout`.
    async fn view<S: Store>(&self, ctx: &Context<S>) -> TileView {
        let timeout = ctx.config.link_timeout;
        let (city, building) = tokio::join!(
            query_link(self.city.as_ref(), EntityKind::City, timeout),
            query_link(self.building.as_ref(), EntityKind::Building, timeout),
        );
        TileView {
            tile: self.tile,
            city,
            building,
            armies: self.armies_by_owner(),
        }
    }
}

impl Entity for TileActor {
    const KIND: EntityKind = EntityKind::MapTile;
    type State = MapTile;
    type Command = TileCommand;

    fn from_state(tile: MapTile) -> Self {
        Self {
            tile,
            city: None,
            building: None,
            armies: Vec::new(),
        }
    }

    fn replace(&mut self, tile: MapTile) {
        self.tile = tile;
    }

    fn state(&self) -> &MapTile {
        &self.tile
    }

    async fn handle<S: Store>(&mut self, cmd: TileCommand, ctx: &Context<S>) {
        match cmd {
            TileCommand::SetCity { city } => {
                self.city = Some(city);
            }
            TileCommand::SetBuilding { building } => {
                self.building = Some(building);
            }
            TileCommand::ClaimBuilding { building, reply } => {
                if self.building.is_some() {
                    respond(
                        reply,
                        Err(EntityError::Occupied {
                            x: self.tile.x,
                            y: self.tile.y,
                        }),
                    );
                } else {
                    self.building = Some(building);
                    respond(reply, Ok(()));
                }
            }
            TileCommand::ClearBuilding => {
                self.building = None;
            }
            TileCommand::AddArmy {
                army,
                snapshot,
                reply,
            } => {
                self.armies.push((army, snapshot));
                if let Some(reply) = reply {
                    respond(reply, Ok(()));
                }
            }
            TileCommand::RemoveArmy { army_id, reply } => {
                let position = self
                    .armies
                    .iter()
                    .position(|(_, army)| army.army_id == army_id);
                let result = match position {
                    Some(index) => {
                        self.armies.remove(index);
                        Ok(())
                    }
                    None => Err(EntityError::not_found(EntityKind::Army, &army_id)),
                };
                respond(reply, result);
            }
            TileCommand::GetView { reply } => {
                let view = self.view(ctx).await;
                respond(reply, Ok(view));
            }
            TileCommand::GetArmies { reply } => {
                respond(reply, Ok(self.armies_by_owner()));
            }
        }
    }

    fn reject(cmd: TileCommand, err: EntityError) {
        match cmd {
            TileCommand::ClaimBuilding { reply, .. }
            | TileCommand::RemoveArmy { reply, .. } => respond(reply, Err(err)),
            TileCommand::AddArmy {
                reply: Some(reply), ..
            } => respond(reply, Err(err)),
            TileCommand::GetView { reply } => respond(reply, Err(err)),
            TileCommand::GetArmies { reply } => respond(reply, Err(err)),
            TileCommand::SetCity { .. }
            | TileCommand::SetBuilding { .. }
            | TileCommand::ClearBuilding
            | TileCommand::AddArmy { reply: None, .. } => {}
        }
    }
}

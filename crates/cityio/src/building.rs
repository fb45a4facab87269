//! Building actor.

use cityio_actor::respond;
use cityio_protocol::{
    Building, BuildingCommand, CityAddress, CityCommand, EntityError,
    EntityKind, Envelope,
};

use crate::entity::{Context, Entity};
use crate::store::Store;

pub struct BuildingActor {
    building: Building,
    /// The owning city, told about level changes of center buildings.
    city: Option<CityAddress>,
}

impl Entity for BuildingActor {
    const KIND: EntityKind = EntityKind::Building;
    type State = Building;
    type Command = BuildingCommand;

    fn from_state(building: Building) -> Self {
        Self {
            building,
            city: None,
        }
    }

    fn replace(&mut self, building: Building) {
        self.building = building;
    }

    fn state(&self) -> &Building {
        &self.building
    }

    async fn handle<S: Store>(&mut self, cmd: BuildingCommand, ctx: &Context<S>) {
        match cmd {
            BuildingCommand::SetCity { city } => {
                self.city = Some(city);
            }
            BuildingCommand::Upgrade { reply } => {
                let result = self.upgrade(ctx).await;
                respond(reply, result);
            }
        }
    }

    fn reject(cmd: BuildingCommand, err: EntityError) {
        match cmd {
            BuildingCommand::SetCity { .. } => {}
            BuildingCommand::Upgrade { reply } => respond(reply, Err(err)),
        }
    }
}

impl BuildingActor {
    async fn upgrade<S: Store>(
        &mut self,
        ctx: &Context<S>,
    ) -> Result<Building, EntityError> {
        let Some(level) = self.building.level.checked_add(1) else {
            return Err(EntityError::LimitReached {
                kind: EntityKind::Building,
                key: self.building.building_id.to_string(),
            });
        };
        let previous = std::mem::replace(&mut self.building.level, level);
        if let Err(e) = ctx.save(self.building.clone()).await {
            self.building.level = previous;
            return Err(e);
        }
        tracing::info!(
            building_id = %self.building.building_id,
            level = self.building.level,
            "building upgraded"
        );

        if self.building.building_type.is_center() {
            self.notify_city(ctx).await;
        }
        Ok(self.building.clone())
    }

    /// Asks the owning city to recompute its cap. The upgrade itself is
    /// already durable, so a failure here is logged, not returned.
    async fn notify_city<S: Store>(&self, ctx: &Context<S>) {
        let Some(city) = &self.city else {
            tracing::warn!(
                building_id = %self.building.building_id,
                "center building has no linked city"
            );
            return;
        };

        let center = self.building.building_type;
        let level = self.building.level;
        let result = city
            .request(
                |reply| {
                    Envelope::Command(CityCommand::RecalculatePopulationCap {
                        center,
                        level,
                        reply: Some(reply),
                    })
                },
                ctx.config.link_timeout,
            )
            .await;

        match result {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::warn!(
                building_id = %self.building.building_id, error = %e,
                "city rejected population cap update"
            ),
            Err(e) => tracing::warn!(
                building_id = %self.building.building_id, error = %e,
                "city did not answer population cap update"
            ),
        }
    }
}

//! City actor.
//!
//! The population cap is derived from the city's center building. The
//! building actor owns the level, so whenever it upgrades it tells the
//! city to recompute; the two are persisted separately and can disagree
//! for a moment.

use cityio_actor::respond;
use cityio_protocol::{City, CityCommand, EntityError, EntityKind};

use crate::entity::{Context, Entity};
use crate::store::Store;

pub struct CityActor {
    city: City,
}

impl Entity for CityActor {
    const KIND: EntityKind = EntityKind::City;
    type State = City;
    type Command = CityCommand;

    fn from_state(city: City) -> Self {
        Self { city }
    }

    fn replace(&mut self, city: City) {
        self.city = city;
    }

    fn state(&self) -> &City {
        &self.city
    }

    async fn handle<S: Store>(&mut self, cmd: CityCommand, ctx: &Context<S>) {
        match cmd {
            CityCommand::SetOwner { owner, reply } => {
                let previous = std::mem::replace(&mut self.city.owner, owner);
                let result = match ctx.save(self.city.clone()).await {
                    Ok(()) => Ok(self.city.clone()),
                    Err(e) => {
                        self.city.owner = previous;
                        Err(e)
                    }
                };
                respond(reply, result);
            }
            CityCommand::RecalculatePopulationCap {
                center,
                level,
                reply,
            } => {
                let result = self.recalculate(center.population_cap(level), ctx).await;
                if let Err(e) = &result {
                    tracing::warn!(
                        city_id = %self.city.city_id, error = %e,
                        "population cap not updated"
                    );
                }
                if let Some(reply) = reply {
                    respond(reply, result);
                }
            }
        }
    }

    fn reject(cmd: CityCommand, err: EntityError) {
        match cmd {
            CityCommand::SetOwner { reply, .. } => respond(reply, Err(err)),
            CityCommand::RecalculatePopulationCap { reply, .. } => {
                if let Some(reply) = reply {
                    respond(reply, Err(err));
                }
            }
        }
    }
}

impl CityActor {
    /// Applies a new cap. `None` (not a center building) changes nothing.
    async fn recalculate<S: Store>(
        &mut self,
        cap: Option<u32>,
        ctx: &Context<S>,
    ) -> Result<City, EntityError> {
        let Some(cap) = cap else {
            return Ok(self.city.clone());
        };
        if cap == self.city.population_cap {
            return Ok(self.city.clone());
        }

        let previous = std::mem::replace(&mut self.city.population_cap, cap);
        if let Err(e) = ctx.save(self.city.clone()).await {
            self.city.population_cap = previous;
            return Err(e);
        }
        tracing::debug!(
            city_id = %self.city.city_id,
            from = previous,
            to = cap,
            "population cap recalculated"
        );
        Ok(self.city.clone())
    }
}

//! Startup restoration.
//!
//! Rebuilds the actor world from the store in dependency order:
//! users, tiles, cities, armies, buildings. Later phases resolve
//! entities registered by earlier ones, so the order is fixed.

use cityio_protocol::EntityKind;

use crate::store::{Row, Store};
use crate::world::World;
use crate::CityioError;

/// How many entities of each kind were restored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub users: usize,
    pub tiles: usize,
    pub cities: usize,
    pub armies: usize,
    pub buildings: usize,
}

impl<S: Store> World<S> {
    /// Opens the manager and restores every persisted entity.
    ///
    /// Any failure aborts the restore: a half-linked world is not served.
    pub async fn restore(&self) -> Result<RestoreReport, CityioError> {
        self.manager.init().await?;
        let mut report = RestoreReport::default();

        let users = self
            .load(EntityKind::User, |row| match row {
                Row::User(user) => Some(user),
                _ => None,
            })
            .await?;
        for user in users {
            let user_id = user.user_id.clone();
            self.restore_user(user).await.inspect_err(|e| {
                tracing::error!(%user_id, error = %e, "user restoration failed");
            })?;
            report.users += 1;
        }
        tracing::info!(count = report.users, "users restored");

        let tiles = self
            .load(EntityKind::MapTile, |row| match row {
                Row::MapTile(tile) => Some(tile),
                _ => None,
            })
            .await?;
        for tile in tiles {
            self.restore_tile(tile).await.inspect_err(|e| {
                tracing::error!(coord = %tile.coord(), error = %e, "tile restoration failed");
            })?;
            report.tiles += 1;
        }
        tracing::info!(count = report.tiles, "tiles restored");

        let cities = self
            .load(EntityKind::City, |row| match row {
                Row::City(city) => Some(city),
                _ => None,
            })
            .await?;
        for city in cities {
            let city_id = city.city_id.clone();
            self.restore_city(city).await.inspect_err(|e| {
                tracing::error!(%city_id, error = %e, "city restoration failed");
            })?;
            report.cities += 1;
        }
        tracing::info!(count = report.cities, "cities restored");

        let armies = self
            .load(EntityKind::Army, |row| match row {
                Row::Army(army) => Some(army),
                _ => None,
            })
            .await?;
        for army in armies {
            let army_id = army.army_id.clone();
            self.restore_army(army).await.inspect_err(|e| {
                tracing::error!(%army_id, error = %e, "army restoration failed");
            })?;
            report.armies += 1;
        }
        tracing::info!(count = report.armies, "armies restored");

        let buildings = self
            .load(EntityKind::Building, |row| match row {
                Row::Building(building) => Some(building),
                _ => None,
            })
            .await?;
        for building in buildings {
            let building_id = building.building_id.clone();
            self.restore_building(building).await.inspect_err(|e| {
                tracing::error!(%building_id, error = %e, "building restoration failed");
            })?;
            report.buildings += 1;
        }
        tracing::info!(count = report.buildings, "buildings restored");

        tracing::info!(?report, "world restored");
        Ok(report)
    }

    async fn load<T>(
        &self,
        kind: EntityKind,
        pick: fn(Row) -> Option<T>,
    ) -> Result<Vec<T>, CityioError> {
        let rows = self.ctx.store.find_all(kind).await?;
        Ok(rows.into_iter().filter_map(pick).collect())
    }
}

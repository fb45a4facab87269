use std::path::{Path, PathBuf};

use cityio::prelude::*;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;


// ---------------------------------------------------------------------------
// Snapshot file
// ---------------------------------------------------------------------------

#[derive(Deserialize, Default)]
#[serde(default)]
struct WorldFile {
    users: Vec<User>,
    tiles: Vec<MapTile>,
    cities: Vec<City>,
    armies: Vec<Army>,
    buildings: Vec<Building>,
}

impl WorldFile {
    fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    fn seed(self, store: &MemoryStore) {
        let rows = self
            .users
            .into_iter()
            .map(Row::from)
            .chain(self.tiles.into_iter().map(Row::from))
            .chain(self.cities.into_iter().map(Row::from))
            .chain(self.armies.into_iter().map(Row::from))
            .chain(self.buildings.into_iter().map(Row::from));
        for row in rows {
            store.seed(row);
        }
    }
}

/// The bundled snapshot, found next to this crate's manifest.
fn default_world() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("world.json")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("cityio=info".parse()?),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(default_world);
    let file = WorldFile::load(&path)?;
    let coords: Vec<Coord> = file.tiles.iter().map(MapTile::coord).collect();

    let store = MemoryStore::new();
    file.seed(&store);
    let world = World::builder().build(store);

    let report = match world.restore().await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "restoration failed, exiting");
            std::process::exit(1);
        }
    };
    tracing::info!(
        users = report.users,
        tiles = report.tiles,
        cities = report.cities,
        armies = report.armies,
        buildings = report.buildings,
        "world ready"
    );

    for coord in coords {
        let view = world.get_tile(coord).await?;
        let armies: usize = view.armies.values().map(Vec::len).sum();
        tracing::info!(
            %coord,
            city = view.city.as_ref().map(|c| c.name.as_str()).unwrap_or("-"),
            building = ?view.building.as_ref().map(|b| (b.building_type, b.level)),
            armies,
            "tile"
        );
    }

    world.shutdown().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_file_missing_sections_default_empty() {
        let file: WorldFile = serde_json::from_str(r#"{ "tiles": [{ "x": 1, "y": 2 }] }"#).unwrap();
        assert_eq!(file.tiles, vec![MapTile { x: 1, y: 2 }]);
        assert!(file.users.is_empty());
        assert!(file.buildings.is_empty());
    }

    #[test]
    fn test_default_world_path_loads() {
        let file = WorldFile::load(&default_world()).unwrap();
        assert_eq!(file.users.len(), 1);
    }

    #[test]
    fn test_bundled_world_parses() {
        let text = include_str!("../world.json");
        let file: WorldFile = serde_json::from_str(text).unwrap();
        assert_eq!(file.tiles.len(), 9);
        assert_eq!(file.cities.len(), 1);
    }

    #[tokio::test]
    async fn test_bundled_world_restores() {
        let file: WorldFile = serde_json::from_str(include_str!("../world.json")).unwrap();
        let store = MemoryStore::new();
        file.seed(&store);
        let world = World::builder().build(store);

        let report = world.restore().await.unwrap();

        assert_eq!(report.buildings, 2);
        let view = world.get_tile(Coord::new(0, 0)).await.unwrap();
        assert!(view.city.is_some());
        assert!(view.building.is_some());
    }
}

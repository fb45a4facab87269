//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use cityio::prelude::*;

pub fn user(id: &str) -> User {
    User {
        user_id: UserId::from(id),
        username: format!("{id}-name"),
        email: format!("{id}@example.com"),
        password_hash: "hash".into(),
        gold: 0,
        food: 0,
    }
}

pub fn tile(x: u32, y: u32) -> MapTile {
    MapTile { x, y }
}

/// A square grid of tiles with the origin at (0, 0).
pub fn grid(side: u32) -> Vec<Row> {
    let mut rows = Vec::new();
    for x in 0..side {
        for y in 0..side {
            rows.push(tile(x, y).into());
        }
    }
    rows
}

pub fn city(id: &str, x: u32, y: u32, size: u32) -> City {
    City {
        city_id: CityId::from(id),
        owner: None,
        name: format!("{id}-town"),
        city_type: CityType::Capital,
        population: 0,
        population_cap: 1000,
        start_x: x,
        start_y: y,
        size,
    }
}

pub fn building(id: &str, city: &str, building_type: BuildingType, x: u32, y: u32) -> Building {
    Building {
        building_id: BuildingId::from(id),
        city_id: CityId::from(city),
        building_type,
        level: 1,
        x,
        y,
    }
}

pub fn army(id: &str, owner: &str, x: u32, y: u32) -> Army {
    Army {
        army_id: ArmyId::from(id),
        owner: UserId::from(owner),
        size: 10,
        x,
        y,
    }
}

/// Seeds a store with `rows` and restores a world from it.
pub async fn restored_world(rows: Vec<Row>) -> World<MemoryStore> {
    let store = MemoryStore::new();
    for row in rows {
        store.seed(row);
    }
    let world = World::builder().build(store);
    world.restore().await.unwrap();
    world
}

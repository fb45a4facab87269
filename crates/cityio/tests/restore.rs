//! Integration tests for startup restoration.

mod common;

use cityio::prelude::*;

use common::*;

#[tokio::test]
async fn test_restore_users_registers_each_user() {
    let rows = (0..5).map(|n| user(&format!("u{n}")).into()).collect();
    let world = restored_world(rows).await;

    assert_eq!(world.manager().count(EntityKind::User).await.unwrap(), 5);
    let user = world.get_user(&UserId::from("u3")).await.unwrap();
    assert_eq!(user.username, "u3-name");
}

#[tokio::test]
async fn test_restore_reports_counts_per_kind() {
    let mut rows = grid(3);
    rows.push(user("u1").into());
    rows.push(city("c1", 0, 0, 2).into());
    rows.push(army("a1", "u1", 2, 2).into());
    rows.push(building("b1", "c1", BuildingType::CityCenter, 0, 0).into());
    rows.push(building("b2", "c1", BuildingType::Farm, 1, 1).into());
    let store = MemoryStore::new();
    for row in rows {
        store.seed(row);
    }
    let world = World::builder().build(store);

    let report = world.restore().await.unwrap();

    assert_eq!(
        report,
        RestoreReport {
            users: 1,
            tiles: 9,
            cities: 1,
            armies: 1,
            buildings: 2,
        }
    );
    assert_eq!(world.manager().count(EntityKind::MapTile).await.unwrap(), 9);
}

#[tokio::test]
async fn test_restore_tiles_with_buildings_have_building_link() {
    let mut rows = grid(3);
    rows.push(city("c1", 0, 0, 3).into());
    let placed = [(0, 0), (2, 1), (1, 2)];
    for (n, (x, y)) in placed.iter().enumerate() {
        rows.push(building(&format!("b{n}"), "c1", BuildingType::Farm, *x, *y).into());
    }
    let world = restored_world(rows).await;

    for x in 0..3 {
        for y in 0..3 {
            let view = world.get_tile(Coord::new(x, y)).await.unwrap();
            assert_eq!(view.building.is_some(), placed.contains(&(x, y)), "tile ({x}, {y})");
        }
    }
}

#[tokio::test]
async fn test_restore_city_links_whole_footprint() {
    let mut rows = grid(4);
    rows.push(city("c1", 1, 1, 2).into());
    let world = restored_world(rows).await;

    for x in 0..4 {
        for y in 0..4 {
            let view = world.get_tile(Coord::new(x, y)).await.unwrap();
            let inside = (1..3).contains(&x) && (1..3).contains(&y);
            assert_eq!(view.city.is_some(), inside, "tile ({x}, {y})");
        }
    }
}

#[tokio::test]
async fn test_restore_armies_grouped_by_owner() {
    let mut rows = grid(2);
    rows.push(army("a1", "red", 1, 1).into());
    rows.push(army("a2", "blue", 1, 1).into());
    rows.push(army("a3", "red", 1, 1).into());
    let world = restored_world(rows).await;

    let armies = world.get_tile_armies(Coord::new(1, 1)).await.unwrap();

    assert_eq!(armies[&UserId::from("red")].len(), 2);
    assert_eq!(armies[&UserId::from("blue")].len(), 1);
    assert!(world.get_tile_armies(Coord::new(0, 0)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_restore_building_missing_city_fails() {
    let store = MemoryStore::new();
    store.seed(tile(0, 0).into());
    store.seed(building("b1", "nowhere", BuildingType::Farm, 0, 0).into());
    let world = World::builder().build(store);

    let err = world.restore().await.unwrap_err();

    assert!(matches!(
        err,
        CityioError::Entity(EntityError::NotFound {
            kind: EntityKind::City,
            ..
        })
    ));
}

#[tokio::test]
async fn test_restore_city_outside_map_fails() {
    let store = MemoryStore::new();
    store.seed(tile(0, 0).into());
    store.seed(city("c1", 0, 0, 2).into());
    let world = World::builder().build(store);

    let err = world.restore().await.unwrap_err();

    assert!(matches!(
        err,
        CityioError::Entity(EntityError::NotFound {
            kind: EntityKind::MapTile,
            ..
        })
    ));
}

//! Integration tests for the service layer.

mod common;

use std::sync::Arc;

use cityio::actor::mailbox;
use cityio::prelude::*;
use cityio::protocol::{CityMessage, Envelope, TileCommand};
use cityio::{spawn, Context, UserActor};
use tokio::time::Instant;

use common::*;

fn new_user(name: &str) -> NewUser {
    NewUser {
        username: name.into(),
        email: format!("{name}@example.com"),
        password_hash: "hash".into(),
    }
}

/// A 4x4 map with one city at (0, 0) covering 2x2 and its center building.
fn town() -> Vec<Row> {
    let mut rows = grid(4);
    rows.push(city("c1", 0, 0, 2).into());
    rows.push(building("b-center", "c1", BuildingType::CityCenter, 0, 0).into());
    rows
}

// =========================================================================
// Users
// =========================================================================

#[tokio::test]
async fn test_register_user_then_get_returns_user() {
    let world = restored_world(Vec::new()).await;

    let user_id = world.register_user(new_user("alice")).await.unwrap();
    let user = world.get_user(&user_id).await.unwrap();

    assert_eq!(user.user_id, user_id);
    assert_eq!(user.username, "alice");
    assert_eq!(user.gold, 0);
    assert_eq!(world.store().count(EntityKind::User), 1);
    assert_eq!(world.manager().count(EntityKind::User).await.unwrap(), 1);
}

#[tokio::test]
async fn test_register_user_store_failure_not_registered() {
    let world = restored_world(Vec::new()).await;
    world.store().fail_writes(true);

    let err = world.register_user(new_user("bob")).await.unwrap_err();

    assert!(matches!(
        err,
        CityioError::Entity(EntityError::Persistence(StoreError::Unavailable(_)))
    ));
    assert_eq!(world.manager().count(EntityKind::User).await.unwrap(), 0);
    assert_eq!(world.store().count(EntityKind::User), 0);
}

#[tokio::test]
async fn test_get_user_unknown_id_not_found() {
    let world = restored_world(Vec::new()).await;

    let err = world.get_user(&UserId::from("ghost")).await.unwrap_err();

    assert!(err.is_not_found());
    assert!(!err.is_transport());
}

#[tokio::test]
async fn test_delete_user_then_get_not_found() {
    let world = restored_world(vec![user("u1").into()]).await;
    let user_id = UserId::from("u1");

    world.delete_user(&user_id).await.unwrap();

    assert!(world.get_user(&user_id).await.unwrap_err().is_not_found());
    assert_eq!(world.store().count(EntityKind::User), 0);
    assert_eq!(world.manager().count(EntityKind::User).await.unwrap(), 0);
}

#[tokio::test]
async fn test_get_pid_unknown_user_is_none() {
    let world = restored_world(vec![user("u1").into()]).await;

    let found = world.manager().get::<User>(UserId::from("nobody")).await.unwrap();

    assert!(found.is_none());
}

// =========================================================================
// Entity lifecycle
// =========================================================================

fn detached_context() -> Context<MemoryStore> {
    Context {
        store: Arc::new(MemoryStore::new()),
        config: ActorConfig::default(),
    }
}

#[tokio::test]
async fn test_entity_get_before_create_not_initialized() {
    let address = spawn::<UserActor, _>(detached_context());

    let result = address
        .request(|reply| Envelope::Get { reply }, ActorConfig::default().request_timeout)
        .await
        .unwrap();

    assert_eq!(result, Err(EntityError::NotInitialized(EntityKind::User)));
}

#[tokio::test]
async fn test_entity_create_twice_get_reflects_last() {
    let ctx = detached_context();
    let store = Arc::clone(&ctx.store);
    let timeout = ctx.config.request_timeout;
    let address = spawn::<UserActor, _>(ctx);

    let mut first = user("u1");
    first.gold = 5;
    let mut second = first.clone();
    second.gold = 50;

    for state in [first, second.clone()] {
        address
            .request(
                |reply| Envelope::Create {
                    state,
                    restore: false,
                    reply: Some(reply),
                },
                timeout,
            )
            .await
            .unwrap()
            .unwrap();
    }
    let current = address
        .request(|reply| Envelope::Get { reply }, timeout)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(current, second);
    assert_eq!(store.get(EntityKind::User, "u1"), Some(Row::User(second)));
}

#[tokio::test]
async fn test_entity_create_store_failure_stays_uninitialized() {
    let ctx = detached_context();
    ctx.store.fail_writes(true);
    let timeout = ctx.config.request_timeout;
    let address = spawn::<UserActor, _>(ctx);

    let created = address
        .request(
            |reply| Envelope::Create {
                state: user("u1"),
                restore: false,
                reply: Some(reply),
            },
            timeout,
        )
        .await
        .unwrap();
    let current = address
        .request(|reply| Envelope::Get { reply }, timeout)
        .await
        .unwrap();

    assert!(matches!(created, Err(EntityError::Persistence(_))));
    assert_eq!(current, Err(EntityError::NotInitialized(EntityKind::User)));
}

// =========================================================================
// Tiles
// =========================================================================

#[tokio::test]
async fn test_get_tile_returns_linked_city_and_building() {
    let world = restored_world(town()).await;

    let view = world.get_tile(Coord::new(0, 0)).await.unwrap();

    assert_eq!(view.tile, tile(0, 0));
    assert_eq!(view.city.map(|c| c.city_id), Some(CityId::from("c1")));
    assert_eq!(
        view.building.map(|b| b.building_id),
        Some(BuildingId::from("b-center"))
    );
}

#[tokio::test]
async fn test_get_tile_stopped_city_degrades_to_none() {
    let mut rows = grid(6);
    rows.push(city("c1", 5, 5, 1).into());
    rows.push(building("b1", "c1", BuildingType::Barracks, 5, 5).into());
    let world = restored_world(rows).await;

    let city = world
        .manager()
        .get::<City>(CityId::from("c1"))
        .await
        .unwrap()
        .unwrap();
    city.send(Envelope::Stop).await.unwrap();

    let view = world.get_tile(Coord::new(5, 5)).await.unwrap();

    assert_eq!(view.tile, tile(5, 5));
    assert!(view.city.is_none());
    assert_eq!(view.building.map(|b| b.building_id), Some(BuildingId::from("b1")));
}

#[tokio::test(start_paused = true)]
async fn test_get_tile_silent_city_degrades_within_request_timeout() {
    let mut rows = grid(2);
    rows.push(city("c1", 0, 0, 1).into());
    rows.push(building("b1", "c1", BuildingType::Barracks, 0, 0).into());
    let world = restored_world(rows).await;

    // A city address whose mailbox is never drained.
    let (silent, _mailbox) = mailbox::<CityMessage>(1);
    let tile = world
        .manager()
        .get::<MapTile>(Coord::new(0, 0))
        .await
        .unwrap()
        .unwrap();
    tile.send(Envelope::Command(TileCommand::SetCity { city: silent }))
        .await
        .unwrap();

    let started = Instant::now();
    let view = world.get_tile(Coord::new(0, 0)).await.unwrap();
    let elapsed = started.elapsed();

    assert!(view.city.is_none());
    assert_eq!(view.building.map(|b| b.building_id), Some(BuildingId::from("b1")));
    assert!(elapsed >= world.config().link_timeout);
    assert!(elapsed < world.config().request_timeout);
}

#[tokio::test]
async fn test_get_tile_unknown_coord_not_found() {
    let world = restored_world(grid(2)).await;

    let err = world.get_tile(Coord::new(9, 9)).await.unwrap_err();

    assert!(err.is_not_found());
}

// =========================================================================
// Armies
// =========================================================================

#[tokio::test]
async fn test_deploy_army_concurrent_none_lost() {
    let world = Arc::new(restored_world(grid(1)).await);

    let mut handles = Vec::new();
    for n in 0..20 {
        let world = Arc::clone(&world);
        let owner = if n % 2 == 0 { "red" } else { "blue" };
        handles.push(tokio::spawn(async move {
            world.deploy_army(army(&format!("a{n}"), owner, 0, 0)).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let armies = world.get_tile_armies(Coord::new(0, 0)).await.unwrap();
    assert_eq!(armies[&UserId::from("red")].len(), 10);
    assert_eq!(armies[&UserId::from("blue")].len(), 10);
    assert_eq!(world.store().count(EntityKind::Army), 20);
}

#[tokio::test]
async fn test_deploy_army_stopped_tile_keeps_persisted_army() {
    let world = restored_world(grid(1)).await;
    let tile = world
        .manager()
        .get::<MapTile>(Coord::new(0, 0))
        .await
        .unwrap()
        .unwrap();
    tile.send(Envelope::Stop).await.unwrap();
    while !tile.is_closed() {
        tokio::task::yield_now().await;
    }

    let err = world.deploy_army(army("a1", "red", 0, 0)).await.unwrap_err();

    assert!(err.is_transport());
    assert_eq!(world.store().count(EntityKind::Army), 1);
    assert!(world
        .manager()
        .get::<Army>(ArmyId::from("a1"))
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_remove_army_from_tile_removes_only_that_army() {
    let mut rows = grid(1);
    rows.push(army("a1", "red", 0, 0).into());
    rows.push(army("a2", "red", 0, 0).into());
    let world = restored_world(rows).await;

    world
        .remove_army_from_tile(Coord::new(0, 0), &ArmyId::from("a1"))
        .await
        .unwrap();

    let armies = world.get_tile_armies(Coord::new(0, 0)).await.unwrap();
    let ids: Vec<_> = armies[&UserId::from("red")]
        .iter()
        .map(|a| a.army_id.clone())
        .collect();
    assert_eq!(ids, vec![ArmyId::from("a2")]);
}

#[tokio::test]
async fn test_remove_army_from_tile_unknown_army_not_found() {
    let world = restored_world(grid(1)).await;

    let err = world
        .remove_army_from_tile(Coord::new(0, 0), &ArmyId::from("missing"))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}

// =========================================================================
// Buildings and cities
// =========================================================================

#[tokio::test]
async fn test_construct_building_free_tile_links_tile() {
    let world = restored_world(town()).await;

    let building_id = world
        .construct_building(NewBuilding {
            city_id: CityId::from("c1"),
            building_type: BuildingType::Farm,
            x: 1,
            y: 0,
        })
        .await
        .unwrap();

    let view = world.get_tile(Coord::new(1, 0)).await.unwrap();
    let building = view.building.unwrap();
    assert_eq!(building.building_id, building_id);
    assert_eq!(building.level, 1);
    assert_eq!(world.get_building(&building_id).await.unwrap(), building);
}

#[tokio::test]
async fn test_construct_building_occupied_tile_rejected() {
    let world = restored_world(town()).await;

    let err = world
        .construct_building(NewBuilding {
            city_id: CityId::from("c1"),
            building_type: BuildingType::Farm,
            x: 0,
            y: 0,
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CityioError::Entity(EntityError::Occupied { x: 0, y: 0 })
    ));
    assert_eq!(world.store().count(EntityKind::Building), 1);
}

#[tokio::test]
async fn test_construct_building_store_failure_releases_tile() {
    let world = restored_world(town()).await;
    let request = NewBuilding {
        city_id: CityId::from("c1"),
        building_type: BuildingType::Barracks,
        x: 1,
        y: 1,
    };

    world.store().fail_writes(true);
    let err = world.construct_building(request.clone()).await.unwrap_err();
    assert!(matches!(err, CityioError::Entity(EntityError::Persistence(_))));

    world.store().fail_writes(false);
    world.construct_building(request).await.unwrap();
    assert_eq!(world.store().count(EntityKind::Building), 2);
}

#[tokio::test]
async fn test_upgrade_center_building_updates_city_cap() {
    let world = restored_world(town()).await;

    let building = world
        .upgrade_building(&BuildingId::from("b-center"))
        .await
        .unwrap();
    let city = world.get_city(&CityId::from("c1")).await.unwrap();

    assert_eq!(building.level, 2);
    assert_eq!(city.population_cap, 2000);
    assert_eq!(
        world.store().get(EntityKind::City, "c1"),
        Some(Row::City(city))
    );
}

#[tokio::test]
async fn test_upgrade_building_store_failure_keeps_level() {
    let world = restored_world(town()).await;
    let building_id = BuildingId::from("b-center");

    world.store().fail_writes(true);
    let err = world.upgrade_building(&building_id).await.unwrap_err();

    assert!(matches!(err, CityioError::Entity(EntityError::Persistence(_))));
    assert_eq!(world.get_building(&building_id).await.unwrap().level, 1);
    assert_eq!(
        world.get_city(&CityId::from("c1")).await.unwrap().population_cap,
        1000
    );
}

#[tokio::test]
async fn test_set_city_owner_persists_owner() {
    let world = restored_world(town()).await;
    let owner = UserId::from("u1");

    let city = world
        .set_city_owner(&CityId::from("c1"), Some(owner.clone()))
        .await
        .unwrap();

    assert_eq!(city.owner, Some(owner));
    assert_eq!(
        world.store().get(EntityKind::City, "c1"),
        Some(Row::City(city))
    );
}

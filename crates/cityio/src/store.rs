//! The persistence collaborator.
//!
//! Cityio does not own a database. Entity actors write through the
//! [`Store`] trait and the restoration orchestrator reads through it; the
//! embedding application plugs in whatever engine it uses. [`MemoryStore`]
//! is the bundled implementation, used by tests and the demo.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use cityio_protocol::{
    Army, Building, City, EntityKind, MapTile, StoreError, User,
};
use serde::{Deserialize, Serialize};

/// One persisted entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Row {
    User(User),
    MapTile(MapTile),
    City(City),
    Building(Building),
    Army(Army),
}

impl Row {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::User(_) => EntityKind::User,
            Self::MapTile(_) => EntityKind::MapTile,
            Self::City(_) => EntityKind::City,
            Self::Building(_) => EntityKind::Building,
            Self::Army(_) => EntityKind::Army,
        }
    }

    /// The row's primary key as a string.
    pub fn key(&self) -> String {
        match self {
            Self::User(u) => u.user_id.to_string(),
            Self::MapTile(t) => t.coord().to_string(),
            Self::City(c) => c.city_id.to_string(),
            Self::Building(b) => b.building_id.to_string(),
            Self::Army(a) => a.army_id.to_string(),
        }
    }
}

impl From<User> for Row {
    fn from(user: User) -> Self {
        Self::User(user)
    }
}

impl From<MapTile> for Row {
    fn from(tile: MapTile) -> Self {
        Self::MapTile(tile)
    }
}

impl From<City> for Row {
    fn from(city: City) -> Self {
        Self::City(city)
    }
}

impl From<Building> for Row {
    fn from(building: Building) -> Self {
        Self::Building(building)
    }
}

impl From<Army> for Row {
    fn from(army: Army) -> Self {
        Self::Army(army)
    }
}

/// Durable storage for entity rows.
///
/// Failures come back as values; callers decide whether to retry (the
/// actors never do).
///
/// # Trait bounds
///
/// `Send + Sync + 'static` because one store is shared by every actor
/// task through an `Arc`.
pub trait Store: Send + Sync + 'static {
    /// Inserts a new row. Fails with [`StoreError::Duplicate`] if the key exists.
    fn create(
        &self,
        row: Row,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Overwrites an existing row. Fails with [`StoreError::Missing`] if absent.
    fn save(&self, row: Row) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Removes a row. Fails with [`StoreError::Missing`] if absent.
    fn delete(
        &self,
        kind: EntityKind,
        key: String,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Every row of one kind, ordered by key. Only used at restoration.
    fn find_all(
        &self,
        kind: EntityKind,
    ) -> impl Future<Output = Result<Vec<Row>, StoreError>> + Send;
}

/// In-process [`Store`] backed by a `BTreeMap`.
///
/// Besides plain storage it enforces the one-building-per-tile rule on
/// insert, and can be told to fail every write so callers can exercise
/// their persistence-failure paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<BTreeMap<(EntityKind, String), Row>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a row directly, bypassing failure injection and checks.
    /// Meant for fixtures.
    pub fn seed(&self, row: Row) {
        let mut rows = match self.rows.lock() {
            Ok(rows) => rows,
            Err(poisoned) => poisoned.into_inner(),
        };
        rows.insert((row.kind(), row.key()), row);
    }

    /// When `true`, every `create`/`save`/`delete` fails with
    /// [`StoreError::Unavailable`].
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// When `true`, every `find_all` fails with [`StoreError::Unavailable`].
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Returns a stored row, if present.
    pub fn get(&self, kind: EntityKind, key: &str) -> Option<Row> {
        let rows = self.lock().ok()?;
        rows.get(&(kind, key.to_string())).cloned()
    }

    /// Number of stored rows of one kind.
    pub fn count(&self, kind: EntityKind) -> usize {
        self.lock()
            .map(|rows| rows.keys().filter(|(k, _)| *k == kind).count())
            .unwrap_or(0)
    }

    fn lock(
        &self,
    ) -> Result<MutexGuard<'_, BTreeMap<(EntityKind, String), Row>>, StoreError>
    {
        self.rows
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".into()));
        }
        Ok(())
    }
}

impl Store for MemoryStore {
    async fn create(&self, row: Row) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut rows = self.lock()?;
        let key = (row.kind(), row.key());
        if rows.contains_key(&key) {
            return Err(StoreError::Duplicate {
                kind: key.0,
                key: key.1,
            });
        }
        if let Row::Building(new) = &row {
            let occupied = rows.values().any(|existing| {
                matches!(existing, Row::Building(b) if b.coord() == new.coord())
            });
            if occupied {
                return Err(StoreError::Duplicate {
                    kind: EntityKind::Building,
                    key: new.coord().to_string(),
                });
            }
        }
        rows.insert(key, row);
        Ok(())
    }

    async fn save(&self, row: Row) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut rows = self.lock()?;
        let key = (row.kind(), row.key());
        match rows.get_mut(&key) {
            Some(existing) => {
                *existing = row;
                Ok(())
            }
            None => Err(StoreError::Missing {
                kind: key.0,
                key: key.1,
            }),
        }
    }

    async fn delete(&self, kind: EntityKind, key: String) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut rows = self.lock()?;
        match rows.remove(&(kind, key.clone())) {
            Some(_) => Ok(()),
            None => Err(StoreError::Missing { kind, key }),
        }
    }

    async fn find_all(&self, kind: EntityKind) -> Result<Vec<Row>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("reads disabled".into()));
        }
        let rows = self.lock()?;
        Ok(rows
            .iter()
            .filter(|((k, _), _)| *k == kind)
            .map(|(_, row)| row.clone())
            .collect())
    }
}

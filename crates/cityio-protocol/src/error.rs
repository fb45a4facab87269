//! Typed errors carried inside actor replies.

use crate::EntityKind;

/// Failures reported by the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached or refused the write.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A row with this key already exists.
    #[error("{kind} {key} already exists")]
    Duplicate {
        /// Kind of the conflicting row.
        kind: EntityKind,
        /// Its key.
        key: String,
    },

    /// The row to update or delete does not exist.
    #[error("{kind} {key} is not stored")]
    Missing {
        /// Kind of the missing row.
        kind: EntityKind,
        /// Its key.
        key: String,
    },
}

/// Application-level errors returned by entity actors and the manager.
///
/// An actor that replies with one of these processed the message fine:
/// the answer just happens to be negative. Transport failures (timeouts,
/// dead actors) are a separate type in `cityio-actor`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntityError {
    /// No live actor or stored row for this key.
    #[error("{kind} {key} not found")]
    NotFound {
        /// Kind of the missing entity.
        kind: EntityKind,
        /// The id or coordinate that was looked up.
        key: String,
    },

    /// The actor has not received its Create/Register message yet.
    #[error("{0} actor is not initialized")]
    NotInitialized(EntityKind),

    /// The tile already holds a building.
    #[error("tile ({x}, {y}) is already occupied")]
    Occupied {
        /// Tile x coordinate.
        x: u32,
        /// Tile y coordinate.
        y: u32,
    },

    /// A later Create carried a different identity than the live state.
    #[error("{kind} {current} cannot be re-created as {requested}")]
    IdentityChanged {
        kind: EntityKind,
        /// Key of the state the actor holds.
        current: String,
        /// Key carried by the rejected Create.
        requested: String,
    },

    /// A counter such as a building level is already at its maximum.
    #[error("{kind} {key} is at its limit")]
    LimitReached { kind: EntityKind, key: String },

    /// The manager was asked to do something before `Init`.
    #[error("pid registry is not initialized")]
    RegistryNotReady,

    /// The durable write failed. In-memory state was left unchanged.
    #[error("persistence failed: {0}")]
    Persistence(#[from] StoreError),
}

impl EntityError {
    /// Shorthand for [`EntityError::NotFound`].
    pub fn not_found(kind: EntityKind, key: impl ToString) -> Self {
        Self::NotFound {
            kind,
            key: key.to_string(),
        }
    }
}

//! Unified error type for the Cityio service layer.

use cityio_actor::TransportError;
use cityio_protocol::{EntityError, StoreError};

/// Top-level error returned by [`World`](crate::World) operations.
///
/// The variants map onto how callers should react:
/// - `Entity(NotFound { .. })`: the entity does not exist (yet); recoverable.
/// - `Transport(_)`: an actor did not answer; possibly transient, surface it.
/// - `Entity(Persistence(_))` / `Store(_)`: a durable write or read failed.
#[derive(Debug, thiserror::Error)]
pub enum CityioError {
    /// No reply arrived (timeout, stopped actor).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An actor replied with an application error.
    #[error(transparent)]
    Entity(#[from] EntityError),

    /// The store failed outside of any actor (restoration reads).
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CityioError {
    /// Returns `true` if the error means "no such entity".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Entity(EntityError::NotFound { .. }))
    }

    /// Returns `true` for transport failures.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

//! Error types for the actor transport.

use std::time::Duration;

use crate::ActorId;

/// Failures of the message transport itself.
///
/// These are distinct from application errors: an actor that answers
/// "not found" has answered successfully. A `TransportError` means no
/// answer arrived at all, so the caller cannot know what the callee did.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The actor's mailbox is closed: the task has stopped.
    #[error("actor {0} is unreachable")]
    Unreachable(ActorId),

    /// No reply arrived within the bound.
    #[error("request to actor {actor} timed out after {after:?}")]
    Timeout {
        /// The actor that was asked.
        actor: ActorId,
        /// The bound that elapsed.
        after: Duration,
    },

    /// The actor dropped the reply channel without answering.
    ///
    /// Happens when the actor stops with the request still queued, or
    /// when it received a message it does not answer.
    #[error("actor {0} dropped the request without replying")]
    NoReply(ActorId),
}

//! Actor plumbing for Cityio.
//!
//! Every game entity runs as an isolated Tokio task that owns its state and
//! drains a bounded mailbox one message at a time. This crate provides the
//! pieces those tasks are built from, without knowing anything about the
//! game itself:
//!
//! - [`Address`] / [`Mailbox`]: the two ends of an actor's mailbox,
//!   created together by [`mailbox`]
//! - [`request`]: the synchronous-call gateway: send a message carrying a
//!   [`Reply`] channel and wait (bounded) for the answer
//! - [`TransportError`]: what can go wrong on the way (timeout, dead actor)
//! - [`ActorConfig`]: mailbox size and request timeouts
//!
//! ```text
//! caller ──send(M{reply})──→ [mailbox] ──→ actor task
//!    ↑                                        │
//!    └──────────── oneshot reply ─────────────┘
//! ```

mod address;
mod config;
mod error;
mod gateway;

pub use address::{mailbox, ActorId, Address, Mailbox};
pub use config::ActorConfig;
pub use error::TransportError;
pub use gateway::{request, respond, Reply};

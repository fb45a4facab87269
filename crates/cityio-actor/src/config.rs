//! Actor runtime configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings shared by every actor in a world.
///
/// There are two timeouts because calls nest: a service asks a tile for
/// its composite view (bounded by `request_timeout`) and the tile asks its
/// city and building (each bounded by `link_timeout`). The inner bound must
/// be shorter than the outer one or the caller would give up before the
/// tile could answer with a partial view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorConfig {
    /// Bounded mailbox size per actor.
    pub mailbox_capacity: usize,

    /// How long service-level calls wait for an actor's reply.
    pub request_timeout: Duration,

    /// How long an actor waits on another actor while handling a message.
    pub link_timeout: Duration,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 64,
            request_timeout: Duration::from_secs(3),
            link_timeout: Duration::from_secs(1),
        }
    }
}

impl ActorConfig {
    /// Clamp and fix any out-of-range values so the config is safe to use.
    ///
    /// - `mailbox_capacity` at least 1.
    /// - `request_timeout` non-zero (falls back to the default).
    /// - `link_timeout` non-zero and strictly below `request_timeout`
    ///   (falls back to half of `request_timeout`).
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();

        if self.mailbox_capacity == 0 {
            tracing::warn!("mailbox_capacity is 0: using 1");
            self.mailbox_capacity = 1;
        }
        if self.request_timeout.is_zero() {
            tracing::warn!(
                fallback = ?defaults.request_timeout,
                "request_timeout is 0: using default"
            );
            self.request_timeout = defaults.request_timeout;
        }
        if self.link_timeout.is_zero() || self.link_timeout >= self.request_timeout {
            let fixed = self.request_timeout / 2;
            tracing::warn!(
                link_timeout = ?self.link_timeout,
                request_timeout = ?self.request_timeout,
                fixed = ?fixed,
                "link_timeout must be below request_timeout: clamping"
            );
            self.link_timeout = fixed;
        }
        self
    }
}

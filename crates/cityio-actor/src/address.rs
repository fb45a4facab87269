//! Actor addresses and mailboxes.
//!
//! An [`Address`] is the only way to reach an actor. It wraps the sending
//! half of a bounded `mpsc` channel; the receiving half ([`Mailbox`]) is
//! owned by the actor task. Addresses are cheap to clone and can be stored
//! inside other actors' state: that is how entities reference each other.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::{Reply, TransportError};

/// Counter for generating process-unique actor IDs.
static NEXT_ACTOR_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of one actor instance.
///
/// Two actors representing the same entity at different times (e.g.
/// before and after a restart) have different `ActorId`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(pub u64);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A-{}", self.0)
    }
}

/// Handle used to send messages of type `M` to one actor.
pub struct Address<M> {
    id: ActorId,
    sender: mpsc::Sender<M>,
}

// Manual impls: deriving would require `M: Clone` / `M: Debug`, but the
// handle itself is cloneable and printable regardless of the message type.
impl<M> Clone for Address<M> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            sender: self.sender.clone(),
        }
    }
}

impl<M> fmt::Debug for Address<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Address").field("id", &self.id).finish()
    }
}

impl<M> PartialEq for Address<M> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<M> Eq for Address<M> {}

impl<M> Address<M> {
    /// Returns the identity of the actor behind this address.
    pub fn id(&self) -> ActorId {
        self.id
    }

    /// Returns `true` once the actor has stopped and dropped its mailbox.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl<M: Send + 'static> Address<M> {
    /// Sends a message without waiting for any reply (fire-and-forget).
    ///
    /// Waits for mailbox capacity if the mailbox is full.
    pub async fn send(&self, msg: M) -> Result<(), TransportError> {
        self.sender
            .send(msg)
            .await
            .map_err(|_| TransportError::Unreachable(self.id))
    }

    /// Sends a request and waits up to `timeout` for the reply.
    ///
    /// Shorthand for [`request`](crate::request) with this address.
    pub async fn request<R>(
        &self,
        make: impl FnOnce(Reply<R>) -> M,
        timeout: Duration,
    ) -> Result<R, TransportError> {
        crate::request(self, make, timeout).await
    }
}

/// Receiving end of an actor's mailbox. Owned by the actor task.
#[derive(Debug)]
pub struct Mailbox<M> {
    id: ActorId,
    receiver: mpsc::Receiver<M>,
}

impl<M> Mailbox<M> {
    /// The identity shared with every [`Address`] of this mailbox.
    pub fn id(&self) -> ActorId {
        self.id
    }

    /// Waits for the next message.
    ///
    /// Returns `None` once every address has been dropped and the queue
    /// is drained: the actor should stop.
    pub async fn recv(&mut self) -> Option<M> {
        self.receiver.recv().await
    }
}

/// Creates a new mailbox and the first address pointing at it.
///
/// `capacity` bounds the queue; senders wait when it is full. A capacity
/// of zero is bumped to one.
pub fn mailbox<M>(capacity: usize) -> (Address<M>, Mailbox<M>) {
    let id = ActorId(NEXT_ACTOR_ID.fetch_add(1, Ordering::Relaxed));
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (Address { id, sender }, Mailbox { id, receiver })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mailbox_returns_unique_ids() {
        let (a, _ma) = mailbox::<u32>(1);
        let (b, _mb) = mailbox::<u32>(1);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_address_clone_keeps_identity() {
        let (a, mb) = mailbox::<u32>(1);
        let b = a.clone();
        assert_eq!(a, b);
        assert_eq!(a.id(), mb.id());
    }

    #[test]
    fn test_actor_id_display() {
        assert_eq!(ActorId(7).to_string(), "A-7");
    }

    #[tokio::test]
    async fn test_send_preserves_order_from_one_sender() {
        let (addr, mut mb) = mailbox::<u32>(8);
        for i in 0..5 {
            addr.send(i).await.unwrap();
        }
        for i in 0..5 {
            assert_eq!(mb.recv().await, Some(i));
        }
    }

    #[tokio::test]
    async fn test_send_to_dropped_mailbox_is_unreachable() {
        let (addr, mb) = mailbox::<u32>(1);
        drop(mb);
        assert!(addr.is_closed());
        assert_eq!(
            addr.send(1).await,
            Err(TransportError::Unreachable(addr.id()))
        );
    }

    #[tokio::test]
    async fn test_recv_returns_none_when_all_addresses_dropped() {
        let (addr, mut mb) = mailbox::<u32>(1);
        drop(addr);
        assert_eq!(mb.recv().await, None);
    }
}

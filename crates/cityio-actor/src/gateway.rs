//! The request/response gateway.
//!
//! Actors only understand messages, so a "call" is built from two one-way
//! hops: the request travels through the callee's mailbox carrying a
//! `oneshot` sender, and the callee answers on it. [`request`] packages
//! both hops behind a single bounded wait.
//!
//! The whole exchange is covered by one timeout, including the time spent
//! waiting for mailbox capacity. A caller that gives up simply drops its
//! receiver; if the callee answers later, the answer is discarded.

use std::time::Duration;

use tokio::sync::oneshot;

use crate::{Address, TransportError};

/// Reply channel embedded in request messages.
pub type Reply<R> = oneshot::Sender<R>;

/// Sends the message built by `make` to `address` and waits for the reply.
///
/// `make` receives the reply channel and must embed it in the message.
///
/// # Errors
/// - [`TransportError::Unreachable`]: the actor has stopped
/// - [`TransportError::NoReply`]: the actor dropped the reply channel
/// - [`TransportError::Timeout`]: nothing arrived within `timeout`
pub async fn request<M, R>(
    address: &Address<M>,
    make: impl FnOnce(Reply<R>) -> M,
    timeout: Duration,
) -> Result<R, TransportError>
where
    M: Send + 'static,
{
    let actor = address.id();
    let (reply_tx, reply_rx) = oneshot::channel();

    let exchange = async {
        address.send(make(reply_tx)).await?;
        reply_rx.await.map_err(|_| TransportError::NoReply(actor))
    };

    match tokio::time::timeout(timeout, exchange).await {
        Ok(result) => result,
        Err(_) => {
            tracing::debug!(%actor, ?timeout, "request timed out");
            Err(TransportError::Timeout {
                actor,
                after: timeout,
            })
        }
    }
}

/// Answers a request. A caller that already gave up is not an error.
pub fn respond<R>(reply: Reply<R>, value: R) {
    if reply.send(value).is_err() {
        tracing::trace!("reply dropped, caller stopped waiting");
    }
}

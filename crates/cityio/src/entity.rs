//! The generic entity actor.
//!
//! Every entity kind (tile, city, building, army, user) runs the same
//! actor loop; only its state and commands differ. The loop owns the
//! two-state lifecycle:
//!
//! ```text
//!   [Uninitialized] ──Create──→ [Active] ──Delete/Stop──→ (stopped)
//! ```
//!
//! - **Uninitialized**: only `Create` and `Stop` do anything. `Get`,
//!   `Delete`, and commands with a reply channel are answered with
//!   [`EntityError::NotInitialized`]; reply-less commands are dropped with
//!   a warning.
//! - **Active**: everything is dispatched. A further `Create` replaces the
//!   state (saved instead of created) as long as it keeps the entity's
//!   key; a different key is refused with
//!   [`EntityError::IdentityChanged`].
//!
//! A state change that must be persisted is only committed after the
//! store accepted it. If the write fails, the actor keeps its previous
//! state (or stays uninitialized) and replies with the error.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use cityio_actor::{mailbox, respond, ActorConfig, Address, Mailbox};
use cityio_protocol::{EntityError, EntityKind, Envelope};

use crate::store::{Row, Store};

/// What an entity actor needs besides its own state.
pub struct Context<S> {
    pub store: Arc<S>,
    pub config: ActorConfig,
}

impl<S> Clone for Context<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl<S: Store> Context<S> {
    /// Persists an updated row.
    pub async fn save(&self, row: impl Into<Row>) -> Result<(), EntityError> {
        self.store.save(row.into()).await?;
        Ok(())
    }
}

/// Behavior of one entity kind inside the generic actor loop.
///
/// The implementor is the actor's private state: the entity snapshot plus
/// whatever addresses it holds for related entities.
pub trait Entity: Send + Sync + Sized + 'static {
    /// Kind reported in errors and logs.
    const KIND: EntityKind;

    /// The snapshot handed out by `Get` and written to the store.
    type State: Clone + fmt::Debug + Into<Row> + Send + Sync + 'static;

    /// Entity-specific commands.
    type Command: Send + 'static;

    /// Builds the actor state from its first `Create`.
    fn from_state(state: Self::State) -> Self;

    /// Replaces the snapshot on a later `Create`, keeping links.
    fn replace(&mut self, state: Self::State);

    fn state(&self) -> &Self::State;

    /// Handles one command. Runs to completion before the next message.
    fn handle<S: Store>(
        &mut self,
        cmd: Self::Command,
        ctx: &Context<S>,
    ) -> impl Future<Output = ()> + Send;

    /// Answers a command that arrived before initialization.
    fn reject(cmd: Self::Command, err: EntityError);
}

/// Address of an actor running entity `E`.
pub type EntityAddress<E> =
    Address<Envelope<<E as Entity>::State, <E as Entity>::Command>>;

/// Spawns an uninitialized actor for entity kind `E`.
pub fn spawn<E: Entity, S: Store>(ctx: Context<S>) -> EntityAddress<E> {
    let (address, mailbox) = mailbox(ctx.config.mailbox_capacity);
    let actor = EntityActor::<E, S> {
        entity: None,
        ctx,
        mailbox,
    };
    tokio::spawn(actor.run());
    address
}

/// Asks a linked actor for its snapshot, degrading to `None` on failure.
///
/// Used by composite queries: one unresponsive link must not fail the
/// whole answer, so the failure is logged and the field left empty.
pub(crate) async fn query_link<St, C>(
    link: Option<&Address<Envelope<St, C>>>,
    kind: EntityKind,
    timeout: Duration,
) -> Option<St>
where
    St: Send + 'static,
    C: Send + 'static,
{
    let address = link?;
    match address.request(|reply| Envelope::Get { reply }, timeout).await {
        Ok(Ok(state)) => Some(state),
        Ok(Err(e)) => {
            tracing::warn!(
                actor = %address.id(), %kind, error = %e,
                "linked entity refused query, leaving field unset"
            );
            None
        }
        Err(e) => {
            tracing::warn!(
                actor = %address.id(), %kind, error = %e,
                "linked entity did not answer, leaving field unset"
            );
            None
        }
    }
}

/// The actor task. `entity` is `None` while uninitialized.
struct EntityActor<E: Entity, S> {
    entity: Option<E>,
    ctx: Context<S>,
    mailbox: Mailbox<Envelope<E::State, E::Command>>,
}

impl<E: Entity, S: Store> EntityActor<E, S> {
    /// Runs the actor loop, processing messages until stopped.
    async fn run(mut self) {
        let actor = self.mailbox.id();
        tracing::debug!(%actor, kind = %E::KIND, "entity actor started");

        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                Envelope::Create {
                    state,
                    restore,
                    reply,
                } => {
                    let result = self.handle_create(state, restore).await;
                    if let Err(e) = &result {
                        tracing::warn!(
                            %actor, kind = %E::KIND, error = %e,
                            "create failed, state not committed"
                        );
                    }
                    if let Some(reply) = reply {
                        respond(reply, result);
                    }
                }
                Envelope::Get { reply } => {
                    respond(reply, self.active().map(|e| e.state().clone()));
                }
                Envelope::Delete { reply } => match self.handle_delete().await {
                    Ok(()) => {
                        respond(reply, Ok(()));
                        tracing::debug!(%actor, kind = %E::KIND, "entity deleted");
                        break;
                    }
                    Err(e) => respond(reply, Err(e)),
                },
                Envelope::Command(cmd) => match self.entity.as_mut() {
                    Some(entity) => entity.handle(cmd, &self.ctx).await,
                    None => {
                        tracing::warn!(
                            %actor, kind = %E::KIND,
                            "command before initialization, rejecting"
                        );
                        E::reject(cmd, EntityError::NotInitialized(E::KIND));
                    }
                },
                Envelope::Stop => break,
            }
        }

        tracing::debug!(%actor, kind = %E::KIND, "entity actor stopped");
    }

    fn active(&self) -> Result<&E, EntityError> {
        self.entity
            .as_ref()
            .ok_or(EntityError::NotInitialized(E::KIND))
    }

    async fn handle_create(
        &mut self,
        state: E::State,
        restore: bool,
    ) -> Result<(), EntityError> {
        let row: Row = state.clone().into();
        if let Some(entity) = &self.entity {
            let current: Row = entity.state().clone().into();
            if current.key() != row.key() {
                return Err(EntityError::IdentityChanged {
                    kind: E::KIND,
                    current: current.key(),
                    requested: row.key(),
                });
            }
        }
        if !restore {
            if self.entity.is_some() {
                self.ctx.store.save(row).await?;
            } else {
                self.ctx.store.create(row).await?;
            }
        }
        match self.entity.as_mut() {
            Some(entity) => entity.replace(state),
            None => self.entity = Some(E::from_state(state)),
        }
        Ok(())
    }

    async fn handle_delete(&mut self) -> Result<(), EntityError> {
        let row: Row = self.active()?.state().clone().into();
        self.ctx.store.delete(E::KIND, row.key()).await?;
        self.entity = None;
        Ok(())
    }
}

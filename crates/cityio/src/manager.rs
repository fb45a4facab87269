//! The manager: the process-wide PID registry.
//!
//! The manager is the only component that can turn a durable identity
//! (a user id, a city id, a tile coordinate) into the address of the
//! actor currently representing it. It is itself an actor, so lookups and
//! updates are serialized through its mailbox like everything else.
//!
//! ## Lifecycle
//!
//! ```text
//! spawn_manager() ──→ [NotReady] ──Init──→ [Ready] ──Shutdown──→ (stopped)
//! ```
//!
//! While not ready, every registry operation is answered with
//! [`EntityError::RegistryNotReady`]. `Init` is the barrier restoration
//! waits on before registering anything.

use std::collections::HashMap;
use std::time::Duration;

use cityio_actor::{mailbox, respond, ActorConfig, Address, Mailbox};
use cityio_protocol::{
    EntityError, EntityKind, ManagerAddress, ManagerMessage, Pid, PidKey,
    Registrable,
};

use crate::CityioError;

/// Handle to the running manager actor. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ManagerHandle {
    address: ManagerAddress,
    timeout: Duration,
}

impl ManagerHandle {
    /// The raw address, for callers that speak [`ManagerMessage`] directly.
    pub fn address(&self) -> &ManagerAddress {
        &self.address
    }

    /// Opens the registry. Idempotent.
    pub async fn init(&self) -> Result<(), CityioError> {
        self.address
            .request(|reply| ManagerMessage::Init { reply }, self.timeout)
            .await??;
        Ok(())
    }

    /// Registers (or overwrites) the address for an entity.
    pub async fn add<R: Registrable>(
        &self,
        key: R::Key,
        address: Address<R::Message>,
    ) -> Result<(), CityioError> {
        let key = R::pid_key(key);
        let pid = R::into_pid(address);
        self.address
            .request(
                |reply| ManagerMessage::AddPid {
                    key,
                    pid,
                    reply: Some(reply),
                },
                self.timeout,
            )
            .await??;
        Ok(())
    }

    /// Looks up the address for an entity.
    ///
    /// `Ok(None)` means the id is unknown: it is not an error.
    pub async fn get<R: Registrable>(
        &self,
        key: R::Key,
    ) -> Result<Option<Address<R::Message>>, CityioError> {
        let key = R::pid_key(key);
        let pid = self
            .address
            .request(|reply| ManagerMessage::GetPid { key, reply }, self.timeout)
            .await??;
        Ok(pid.and_then(R::from_pid))
    }

    /// Removes the mapping for an entity. Returns `true` if one existed.
    ///
    /// Call this only after the entity's actor has stopped, so the id
    /// never resolves to a dead address.
    pub async fn remove<R: Registrable>(
        &self,
        key: R::Key,
    ) -> Result<bool, CityioError> {
        let key = R::pid_key(key);
        let removed = self
            .address
            .request(|reply| ManagerMessage::RemovePid { key, reply }, self.timeout)
            .await??;
        Ok(removed.is_some())
    }

    /// Number of registered entities of one kind.
    pub async fn count(&self, kind: EntityKind) -> Result<usize, CityioError> {
        let count = self
            .address
            .request(|reply| ManagerMessage::CountPids { kind, reply }, self.timeout)
            .await??;
        Ok(count)
    }

    /// Tells the manager to stop. Dropping the registry drops the last
    /// address of every entity actor nobody else references, so those
    /// actors drain their mailboxes and stop too.
    pub async fn shutdown(&self) {
        let _ = self.address.send(ManagerMessage::Shutdown).await;
    }
}

/// The manager's private state.
struct ManagerActor {
    ready: bool,
    pids: HashMap<PidKey, Pid>,
    mailbox: Mailbox<ManagerMessage>,
}

impl ManagerActor {
    async fn run(mut self) {
        let actor = self.mailbox.id();
        tracing::info!(%actor, "manager started");

        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                ManagerMessage::Init { reply } => {
                    if !self.ready {
                        self.ready = true;
                        tracing::info!(%actor, "pid registry ready");
                    }
                    respond(reply, Ok(()));
                }
                ManagerMessage::AddPid { key, pid, reply } => {
                    let result = self.ready().map(|pids| {
                        tracing::debug!(?key, actor = ?pid, "pid registered");
                        pids.insert(key, pid);
                    });
                    if let Some(reply) = reply {
                        respond(reply, result);
                    }
                }
                ManagerMessage::GetPid { key, reply } => {
                    let result = self.ready().map(|pids| pids.get(&key).cloned());
                    respond(reply, result);
                }
                ManagerMessage::RemovePid { key, reply } => {
                    let result = self.ready().map(|pids| pids.remove(&key));
                    respond(reply, result);
                }
                ManagerMessage::CountPids { kind, reply } => {
                    let result = self
                        .ready()
                        .map(|pids| pids.keys().filter(|k| k.kind() == kind).count());
                    respond(reply, result);
                }
                ManagerMessage::Shutdown => {
                    tracing::info!(%actor, "manager shutting down");
                    break;
                }
            }
        }

        tracing::info!(%actor, registered = self.pids.len(), "manager stopped");
    }

    fn ready(&mut self) -> Result<&mut HashMap<PidKey, Pid>, EntityError> {
        if self.ready {
            Ok(&mut self.pids)
        } else {
            Err(EntityError::RegistryNotReady)
        }
    }
}

/// Spawns the manager actor. It starts not ready; call
/// [`ManagerHandle::init`] before registering anything.
pub fn spawn_manager(config: &ActorConfig) -> ManagerHandle {
    let (address, mailbox) = mailbox(config.mailbox_capacity);
    let actor = ManagerActor {
        ready: false,
        pids: HashMap::new(),
        mailbox,
    };
    tokio::spawn(actor.run());
    ManagerHandle {
        address,
        timeout: config.request_timeout,
    }
}

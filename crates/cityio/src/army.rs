//! Army actor. Armies only use the shared lifecycle messages; training
//! and movement live above this layer.

use cityio_protocol::{Army, ArmyCommand, EntityError, EntityKind};

use crate::entity::{Context, Entity};
use crate::store::Store;

pub struct ArmyActor {
    army: Army,
}

impl Entity for ArmyActor {
    const KIND: EntityKind = EntityKind::Army;
    type State = Army;
    type Command = ArmyCommand;

    fn from_state(army: Army) -> Self {
        Self { army }
    }

    fn replace(&mut self, army: Army) {
        self.army = army;
    }

    fn state(&self) -> &Army {
        &self.army
    }

    async fn handle<S: Store>(&mut self, cmd: ArmyCommand, _ctx: &Context<S>) {
        match cmd {}
    }

    fn reject(cmd: ArmyCommand, _err: EntityError) {
        match cmd {}
    }
}

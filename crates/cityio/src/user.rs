//! User actor.

use cityio_protocol::{EntityError, EntityKind, User, UserCommand};

use crate::entity::{Context, Entity};
use crate::store::Store;

pub struct UserActor {
    user: User,
}

impl Entity for UserActor {
    const KIND: EntityKind = EntityKind::User;
    type State = User;
    type Command = UserCommand;

    fn from_state(user: User) -> Self {
        Self { user }
    }

    fn replace(&mut self, user: User) {
        self.user = user;
    }

    fn state(&self) -> &User {
        &self.user
    }

    async fn handle<S: Store>(&mut self, cmd: UserCommand, _ctx: &Context<S>) {
        match cmd {}
    }

    fn reject(cmd: UserCommand, _err: EntityError) {
        match cmd {}
    }
}

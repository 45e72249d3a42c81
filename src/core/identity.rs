//! Identity of the acting user
//!
//! The coordinator asks an [`IdentityProvider`] who is signed in at the moment
//! a change is saved. [`Session`] is the binding kept by the console's login
//! flow; a plain `Option<Actor>` works for fixed identities.

use parking_lot::RwLock;

use crate::core::entry::Actor;

/// Source of the currently bound actor
pub trait IdentityProvider: Send + Sync {
    /// The signed-in actor, or `None` when nobody is signed in
    fn current_actor(&self) -> Option<Actor>;
}

impl IdentityProvider for Option<Actor> {
    fn current_actor(&self) -> Option<Actor> {
        self.clone()
    }
}

/// Signed-in user of the running console
#[derive(Debug, Default)]
pub struct Session {
    actor: RwLock<Option<Actor>>,
}

impl Session {
    /// Session with nobody signed in
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Session with `actor` already signed in
    pub fn signed_in(actor: Actor) -> Self {
        Self {
            actor: RwLock::new(Some(actor)),
        }
    }

    /// Bind `actor`, replacing whoever was signed in
    pub fn sign_in(&self, actor: Actor) {
        *self.actor.write() = Some(actor);
    }

    /// Unbind the current actor, returning it
    pub fn sign_out(&self) -> Option<Actor> {
        self.actor.write().take()
    }

    pub fn is_authenticated(&self) -> bool {
        self.actor.read().is_some()
    }
}

impl IdentityProvider for Session {
    fn current_actor(&self) -> Option<Actor> {
        self.actor.read().clone()
    }
}

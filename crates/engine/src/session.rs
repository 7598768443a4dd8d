//! Session context for an authenticated user.
//!
//! A `Session` is an explicit value produced by [`Engine::login`] and
//! threaded through every call that acts on behalf of a user; there is no
//! ambient "current user" state anywhere in the engine.
//!
//! [`Engine::login`]: crate::Engine::login

use serde::{Deserialize, Serialize};

use crate::Role;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// The user's DPI.
    pub user_id: String,
    pub name: String,
    /// Resolved at login and immutable for the session's lifetime.
    pub role: Role,
}

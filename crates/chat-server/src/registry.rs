//! ConnectionRegistry — every live connection and its login state.
//!
//! Pending connections are tracked so they can be counted and closed,
//! but only authenticated ones are ever handed out for broadcast.
//!
//! All state sits behind one parking_lot::Mutex; every operation takes it
//! once and never across an await, so a snapshot can't observe a
//! half-applied transition.

use std::collections::HashMap;

use chat_transport::{ConnectionHandle, ConnectionId};
use parking_lot::Mutex;
use thiserror::Error;

use crate::login::LoginState;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("connection is already logged in as {identity}")]
    AlreadyBound { identity: String },
    #[error("connection is not registered")]
    NotRegistered,
}

/// An authenticated broadcast target.
#[derive(Debug, Clone)]
pub struct Recipient {
    pub identity: String,
    pub handle: ConnectionHandle,
}

struct Entry {
    handle: ConnectionHandle,
    state: LoginState,
}

#[derive(Default)]
pub struct ConnectionRegistry {
    entries: Mutex<HashMap<ConnectionId, Entry>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a freshly accepted connection as `Pending`.
    /// Returns `false` (and changes nothing) if it is already tracked.
    pub fn register(&self, handle: ConnectionHandle) -> bool {
        let mut entries = self.entries.lock();
        if entries.contains_key(&handle.id()) {
            return false;
        }
        entries.insert(
            handle.id(),
            Entry {
                handle,
                state: LoginState::Pending,
            },
        );
        true
    }

    /// Attach an identity. An identity is set at most once per connection.
    pub fn bind(&self, id: ConnectionId, identity: &str) -> Result<(), RegistryError> {
        let mut entries = self.entries.lock();
        let entry = entries.get_mut(&id).ok_or(RegistryError::NotRegistered)?;
        if let LoginState::Authenticated(existing) = &entry.state {
            return Err(RegistryError::AlreadyBound {
                identity: existing.clone(),
            });
        }
        entry.state = LoginState::Authenticated(identity.to_owned());
        Ok(())
    }

    /// Forget a connection. Safe to call for one that is already gone;
    /// returns the state it had if it was still tracked.
    pub fn unregister(&self, id: ConnectionId) -> Option<LoginState> {
        self.entries.lock().remove(&id).map(|entry| entry.state)
    }

    /// Point-in-time copy of every authenticated connection.
    pub fn snapshot(&self) -> Vec<Recipient> {
        self.entries
            .lock()
            .values()
            .filter_map(|entry| match &entry.state {
                LoginState::Authenticated(identity) => Some(Recipient {
                    identity: identity.clone(),
                    handle: entry.handle.clone(),
                }),
                LoginState::Pending => None,
            })
            .collect()
    }

    pub fn lookup_identity(&self, id: ConnectionId) -> Option<String> {
        self.entries
            .lock()
            .get(&id)
            .and_then(|entry| entry.state.identity().map(str::to_owned))
    }

    pub fn login_state(&self, id: ConnectionId) -> Option<LoginState> {
        self.entries.lock().get(&id).map(|entry| entry.state.clone())
    }

    /// Remove every connection, pending ones included.
    pub fn drain(&self) -> Vec<(ConnectionHandle, LoginState)> {
        self.entries
            .lock()
            .drain()
            .map(|(_, entry)| (entry.handle, entry.state))
            .collect()
    }

    /// Number of tracked connections, pending ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

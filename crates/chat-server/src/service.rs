//! ChatService — the handler the transport calls for every connection.
//!
//! Runs each incoming line through the login state machine and acts on
//! the result: bind and confirm, broadcast, or send a diagnostic and
//! close. Every eviction (violation, failed delivery, operator close)
//! goes through one path so the operator sees exactly one disconnect
//! notice per connection.

use std::sync::Arc;
use std::time::Duration;

use chat_protocol::wire::{error_line, login_line, server_line};
use chat_protocol::{Console, Origin, ProtocolViolation};
use chat_transport::{ConnectionHandle, ConnectionHandler, TransportError};
use tracing::{debug, info, warn};

use crate::broadcast::{Broadcaster, Delivery};
use crate::login::{self, LoginState, Transition};
use crate::registry::{ConnectionRegistry, RegistryError};

/// How long closing every connection waits for sockets to flush.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

pub struct ChatService {
    registry: Arc<ConnectionRegistry>,
    broadcaster: Broadcaster,
    console: Arc<dyn Console>,
}

impl ChatService {
    pub fn new(console: Arc<dyn Console>) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        Self {
            broadcaster: Broadcaster::new(registry.clone()),
            registry,
            console,
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Connections currently attached, logged in or not.
    pub fn client_count(&self) -> usize {
        self.registry.len()
    }

    /// Handle one line from `conn`.
    pub fn process_line(&self, conn: &ConnectionHandle, line: &str) {
        // A connection evicted while its line was in flight is ignored.
        let Some(state) = self.registry.login_state(conn.id()) else {
            debug!("dropping line from untracked connection {conn}");
            return;
        };

        match login::advance(&state, line) {
            Transition::Login(identity) => self.login(conn, &identity),
            Transition::Chat { identity, payload } => {
                self.console
                    .display(&server_line(&format!("Message received from {identity}: {payload}")));
                self.broadcast(Origin::Client(&identity), &payload);
            }
            Transition::Reject(violation) => self.reject(conn, violation),
        }
    }

    /// Bind `identity` to `conn` and confirm it with the login line.
    pub fn login(&self, conn: &ConnectionHandle, identity: &str) {
        match self.registry.bind(conn.id(), identity) {
            Ok(()) => {}
            Err(e @ RegistryError::AlreadyBound { .. }) => {
                warn!("login rejected for {conn}: {e}");
                self.reject(conn, ProtocolViolation::AlreadyLoggedIn);
                return;
            }
            // Evicted or closed while the line was in flight.
            Err(RegistryError::NotRegistered) => {
                debug!("dropping login from untracked connection {conn}");
                return;
            }
        }

        info!("{conn} logged in as {identity}");
        self.console
            .display(&server_line(&format!("Client logged in with ID: {identity}")));

        if let Err(e) = conn.send(login_line(identity)) {
            warn!("could not confirm login for {identity}: {e}");
            self.evict(conn);
        }
    }

    fn reject(&self, conn: &ConnectionHandle, violation: ProtocolViolation) {
        warn!("protocol violation from {conn}: {violation}");
        // Best effort: the connection is closed either way.
        let _ = conn.send(error_line(violation));
        self.evict(conn);
    }

    /// Fan `payload` out and evict every recipient whose send failed.
    pub fn broadcast(&self, origin: Origin<'_>, payload: &str) -> Delivery {
        let delivery = self.broadcaster.broadcast(origin, payload);
        for handle in &delivery.failed {
            self.evict(handle);
        }
        delivery
    }

    /// Broadcast a line typed on the operator console.
    pub fn operator_broadcast(&self, payload: &str) -> Delivery {
        self.console.display(&server_line(payload));
        self.broadcast(Origin::Operator, payload)
    }

    /// Remove `conn` from the registry and close it.
    pub fn evict(&self, conn: &ConnectionHandle) {
        if let Some(state) = self.registry.unregister(conn.id()) {
            self.announce_disconnect(&state);
        }
        if !conn.is_closed() {
            // The task may end between the check and the close; that is fine.
            let _ = conn.close();
        }
    }

    /// Close every connection and wait briefly for them to flush.
    pub async fn close_all(&self) -> usize {
        let drained = self.registry.drain();
        let count = drained.len();

        for (handle, state) in &drained {
            let _ = handle.close();
            self.announce_disconnect(state);
        }

        let flushed = async {
            for (handle, _) in &drained {
                handle.closed().await;
            }
        };
        if tokio::time::timeout(CLOSE_GRACE, flushed).await.is_err() {
            warn!("some connections did not close within {CLOSE_GRACE:?}");
        }

        info!("closed {count} connections");
        count
    }

    fn announce_disconnect(&self, state: &LoginState) {
        let who = state.identity().unwrap_or("Unknown");
        info!("client disconnected: {who}");
        self.console
            .display(&server_line(&format!("Client disconnected: {who}")));
    }
}

impl ConnectionHandler for ChatService {
    fn client_connected(&self, conn: &ConnectionHandle) {
        if self.registry.register(conn.clone()) {
            info!("client connected: {conn}");
            self.console
                .display(&server_line(&format!("Client connected: {}", conn.peer())));
        }
    }

    async fn handle_line(&self, conn: &ConnectionHandle, line: String) {
        self.process_line(conn, &line);
    }

    fn client_exception(&self, conn: &ConnectionHandle, error: &TransportError) {
        warn!("transport error on {conn}: {error}");
    }

    fn client_disconnected(&self, conn: &ConnectionHandle) {
        if let Some(state) = self.registry.unregister(conn.id()) {
            self.announce_disconnect(&state);
        }
    }
}

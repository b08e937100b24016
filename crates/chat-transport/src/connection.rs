//! Server-side handle to one connected peer.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Notify, mpsc};
use uuid::Uuid;

use crate::error::TransportError;

/// Opaque identity of one accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lines a connection may have queued before sends start failing.
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 1024;

/// Work queued for a connection's writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Line(String),
    /// Flush everything queued before this, then shut the connection down.
    Close,
}

/// Cheap, cloneable sender side of a connection.
///
/// Sends never block: lines are queued for the connection's task. A peer
/// that stops reading fills its queue, after which sends fail with
/// [`TransportError::Backpressure`]. Once the task has ended every send
/// fails with [`TransportError::ConnectionClosed`].
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    peer: SocketAddr,
    tx: mpsc::Sender<Outbound>,
    abort: Arc<Notify>,
}

impl ConnectionHandle {
    /// Create a handle plus the receiving end of its outbound queue.
    ///
    /// The transport drives the receiver from the socket task; tests can
    /// hold it directly to observe what would have been written.
    pub fn detached(peer: SocketAddr) -> (Self, mpsc::Receiver<Outbound>) {
        Self::with_capacity(peer, DEFAULT_OUTBOUND_CAPACITY)
    }

    /// Like [`detached`](Self::detached) with an explicit queue bound.
    pub fn with_capacity(peer: SocketAddr, capacity: usize) -> (Self, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = Self {
            id: ConnectionId::new(),
            peer,
            tx,
            abort: Arc::new(Notify::new()),
        };
        (handle, rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn send(&self, line: impl Into<String>) -> Result<(), TransportError> {
        self.tx
            .try_send(Outbound::Line(line.into()))
            .map_err(|e| match e {
                TrySendError::Full(_) => TransportError::Backpressure,
                TrySendError::Closed(_) => TransportError::ConnectionClosed,
            })
    }

    /// Ask the connection to close after draining what is already queued.
    ///
    /// With a full queue the backlog is abandoned and the connection is
    /// dropped straight away.
    pub fn close(&self) -> Result<(), TransportError> {
        match self.tx.try_send(Outbound::Close) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.abort.notify_one();
                Ok(())
            }
            Err(TrySendError::Closed(_)) => Err(TransportError::ConnectionClosed),
        }
    }

    /// Resolves once `close` gave up on a full queue.
    pub(crate) async fn aborted(&self) {
        self.abort.notified().await
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Resolves once the connection's task has released its queue.
    pub async fn closed(&self) {
        self.tx.closed().await
    }
}

impl fmt::Display for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.peer, self.id)
    }
}

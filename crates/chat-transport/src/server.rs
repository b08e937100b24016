//! TCP transport server.
//!
//! Binds a listener, accepts connections and runs one task per
//! connection that frames the socket into lines, hands each line to the
//! [`ConnectionHandler`] and drains the connection's outbound queue.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chat_protocol::{DEFAULT_MAX_LINE_LENGTH, DEFAULT_PORT};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::codec::{Framed, LinesCodec};
use tracing::{debug, info, warn};

use crate::connection::{ConnectionHandle, DEFAULT_OUTBOUND_CAPACITY, Outbound};
use crate::error::TransportError;

/// Implemented by the chat server to receive connection lifecycle events.
///
/// All callbacks for one connection run on that connection's task, in
/// order: `client_connected`, any number of `handle_line`, an optional
/// `client_exception`, then exactly one `client_disconnected`.
pub trait ConnectionHandler: Send + Sync + 'static {
    /// A socket was accepted.
    fn client_connected(&self, conn: &ConnectionHandle);

    /// A full line arrived (terminator stripped).
    fn handle_line(
        &self,
        conn: &ConnectionHandle,
        line: String,
    ) -> impl Future<Output = ()> + Send;

    /// Reading or writing failed; the connection is about to be torn down.
    fn client_exception(&self, _conn: &ConnectionHandle, _error: &TransportError) {}

    /// The connection's task is ending.
    fn client_disconnected(&self, conn: &ConnectionHandle);
}

/// Transport server configuration.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Hostname to bind to
    pub hostname: String,
    /// Port to listen on (0 for OS-assigned)
    pub port: u16,
    /// Longest accepted line in bytes
    pub max_line_length: usize,
    /// Lines queued per connection before sends to it fail
    pub outbound_capacity: usize,
    /// How long one socket write may take before the connection is dropped
    pub write_timeout: Duration,
}

/// Default for [`TransportConfig::write_timeout`].
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            hostname: "0.0.0.0".into(),
            port: DEFAULT_PORT,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

/// The per-connection part of [`TransportConfig`].
#[derive(Debug, Clone, Copy)]
struct Limits {
    max_line_length: usize,
    outbound_capacity: usize,
    write_timeout: Duration,
}

impl TransportConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }

    fn limits(&self) -> Limits {
        Limits {
            max_line_length: self.max_line_length,
            outbound_capacity: self.outbound_capacity,
            write_timeout: self.write_timeout,
        }
    }
}

/// A running accept loop.
///
/// Stopping it only stops accepting: connection tasks already spawned
/// keep running until they are closed individually.
pub struct TransportServer {
    /// Shutdown signal for the accept loop
    shutdown_tx: Option<mpsc::Sender<()>>,
    /// Accept loop task handle
    handle: Option<tokio::task::JoinHandle<()>>,
    /// Actual bound address
    local_addr: SocketAddr,
}

impl TransportServer {
    /// Bind and start accepting connections for `handler`.
    pub async fn start<H: ConnectionHandler>(
        config: &TransportConfig,
        handler: Arc<H>,
    ) -> Result<Self, TransportError> {
        let addr = config.bind_address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| TransportError::Bind { addr, source })?;
        let local_addr = listener.local_addr()?;

        info!("chat transport listening on {local_addr}");

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let limits = config.limits();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    accepted = listener.accept() => match accepted {
                        Ok((socket, peer)) => {
                            debug!("accepted connection from {peer}");
                            spawn_connection(socket, peer, limits, handler.clone());
                        }
                        Err(e) => warn!("failed to accept connection: {e}"),
                    },
                }
            }
            // Dropping the listener here releases the port.
        });

        Ok(Self {
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
            local_addr,
        })
    }

    /// Get the actual bound port.
    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting new connections and release the port.
    pub async fn stop(&mut self) -> Result<(), TransportError> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(()).await;
        }
        if let Some(handle) = self.handle.take() {
            handle.await?;
        }
        info!("chat transport stopped listening on {}", self.local_addr);
        Ok(())
    }
}

fn spawn_connection<H: ConnectionHandler>(
    socket: TcpStream,
    peer: SocketAddr,
    limits: Limits,
    handler: Arc<H>,
) {
    let (conn, outbound) = ConnectionHandle::with_capacity(peer, limits.outbound_capacity);
    tokio::spawn(async move {
        handler.client_connected(&conn);
        if let Err(e) = run_connection(socket, &conn, outbound, limits, handler.as_ref()).await {
            warn!("connection {conn} failed: {e}");
            handler.client_exception(&conn, &e);
        }
        handler.client_disconnected(&conn);
    });
}

async fn run_connection<H: ConnectionHandler>(
    socket: TcpStream,
    conn: &ConnectionHandle,
    mut outbound: mpsc::Receiver<Outbound>,
    limits: Limits,
    handler: &H,
) -> Result<(), TransportError> {
    let framed = Framed::new(socket, LinesCodec::new_with_max_length(limits.max_line_length));
    let (mut sink, mut lines) = framed.split::<String>();

    let result = loop {
        tokio::select! {
            // An abandoned backlog ends the connection at once. Otherwise
            // queued writes go first so a diagnostic followed by a close
            // goes out before anything else is read.
            biased;

            _ = conn.aborted() => {
                debug!("dropping backlog of connection {conn}");
                break Ok(());
            }

            queued = outbound.recv() => match queued {
                Some(Outbound::Line(line)) => match timeout(limits.write_timeout, sink.send(line)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => break Err(e.into()),
                    Err(_) => break Err(TransportError::WriteTimeout),
                },
                Some(Outbound::Close) | None => {
                    debug!("closing connection {conn}");
                    break Ok(());
                }
            },

            frame = lines.next() => match frame {
                Some(Ok(line)) => handler.handle_line(conn, line).await,
                Some(Err(e)) => break Err(e.into()),
                None => {
                    debug!("peer closed connection {conn}");
                    break Ok(());
                }
            },
        }
    };

    // Refuse further sends before tearing the socket down.
    outbound.close();
    let _ = timeout(limits.write_timeout, sink.close()).await;
    result
}

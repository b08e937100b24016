//! Client side of the transport: one outbound TCP connection.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{Framed, LinesCodec};
use tracing::debug;

use crate::connection::Outbound;
use crate::error::TransportError;

/// Something the server side of the connection did.
#[derive(Debug)]
pub enum ClientEvent {
    /// A line from the server.
    Message(String),
    /// The server closed the connection.
    Closed,
    /// Reading or writing failed.
    Exception(TransportError),
}

/// An open connection to a chat server.
///
/// Dropping or closing the connection also drops its event queue, so
/// events from a connection the client closed itself are never seen.
#[derive(Debug)]
pub struct ClientConnection {
    tx: mpsc::UnboundedSender<Outbound>,
    events: mpsc::UnboundedReceiver<ClientEvent>,
    task: tokio::task::JoinHandle<()>,
}

impl ClientConnection {
    pub async fn open(host: &str, port: u16, max_line_length: usize) -> Result<Self, TransportError> {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|source| TransportError::Connect {
                addr: format!("{host}:{port}"),
                source,
            })?;
        debug!("connected to {host}:{port}");

        let (tx, outbound) = mpsc::unbounded_channel();
        let (event_tx, events) = mpsc::unbounded_channel();
        let framed = Framed::new(stream, LinesCodec::new_with_max_length(max_line_length));
        let task = tokio::spawn(run_client(framed, outbound, event_tx));

        Ok(Self { tx, events, task })
    }

    pub fn send(&self, line: impl Into<String>) -> Result<(), TransportError> {
        self.tx
            .send(Outbound::Line(line.into()))
            .map_err(|_| TransportError::ConnectionClosed)
    }

    /// Flush queued lines, shut the socket down and wait for the task.
    pub async fn close(self) -> Result<(), TransportError> {
        // A task that already ended has nothing left to flush.
        let _ = self.tx.send(Outbound::Close);
        self.task.await?;
        Ok(())
    }

    /// Next event from the server; `None` once the connection task is gone.
    pub async fn next_event(&mut self) -> Option<ClientEvent> {
        self.events.recv().await
    }
}

async fn run_client(
    framed: Framed<TcpStream, LinesCodec>,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    events: mpsc::UnboundedSender<ClientEvent>,
) {
    let (mut sink, mut lines) = framed.split::<String>();

    loop {
        tokio::select! {
            biased;

            queued = outbound.recv() => match queued {
                Some(Outbound::Line(line)) => {
                    if let Err(e) = sink.send(line).await {
                        let _ = events.send(ClientEvent::Exception(e.into()));
                        break;
                    }
                }
                Some(Outbound::Close) | None => break,
            },

            frame = lines.next() => {
                let event = match frame {
                    Some(Ok(line)) => ClientEvent::Message(line),
                    Some(Err(e)) => ClientEvent::Exception(e.into()),
                    None => ClientEvent::Closed,
                };
                let done = !matches!(event, ClientEvent::Message(_));
                // Nobody listening means the session already let go of us.
                if events.send(event).is_err() || done {
                    break;
                }
            }
        }
    }

    outbound.close();
    let _ = sink.close().await;
}

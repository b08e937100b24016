//! Chat Transport Layer
//!
//! Line-framed TCP transport for the chat server and client.
//! The transport layer handles:
//! - Accepting connections and running one task per connection
//! - Framing (one message per `\n`-terminated line)
//! - Bounded per-connection outbound queues with ordered close
//! - Lifecycle callbacks (connected, line, exception, disconnected)
//!
//! The transport is decoupled from the chat logic via the
//! `ConnectionHandler` trait.

pub mod client;
pub mod connection;
pub mod error;
pub mod server;

pub use client::{ClientConnection, ClientEvent};
pub use connection::{ConnectionHandle, ConnectionId, DEFAULT_OUTBOUND_CAPACITY, Outbound};
pub use error::TransportError;
pub use server::{ConnectionHandler, DEFAULT_WRITE_TIMEOUT, TransportConfig, TransportServer};

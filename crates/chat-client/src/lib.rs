//! Chat Client — one session against one server.
//!
//! The session sends `#login <id>` as soon as it connects, forwards plain
//! lines as chat and carries out `#` commands locally. Host and port can
//! only be changed while disconnected.

pub mod commands;
pub mod session;

pub use commands::{CLIENT_COMMANDS, ClientAction, ClientGate};
pub use session::{ClientConfig, ClientError, ClientSession, Control};

//! Simple chat protocol - line grammar shared by server and client.
//!
//! Every message on the wire is a single line of text. Lines starting
//! with `#` are commands, anything else is a chat payload. This crate is
//! the single source of truth for command names, the server's wire
//! formats, protocol violations and the dispatch tables both consoles
//! use to validate commands before acting on them.

pub mod auth;
pub mod commands;
pub mod config;
pub mod console;
pub mod dispatch;
pub mod error;
pub mod wire;

pub use auth::parse_login;
pub use commands::{Command, Commands, Input, interpret};
pub use config::{DEFAULT_HOST, DEFAULT_MAX_LINE_LENGTH, DEFAULT_PORT, parse_port, parse_port_or_default, port_argument};
pub use console::{BufferConsole, Console, StdoutConsole};
pub use dispatch::{CommandSpec, DispatchTable, Invocation, Precondition};
pub use error::{CommandError, ProtocolViolation};
pub use wire::Origin;

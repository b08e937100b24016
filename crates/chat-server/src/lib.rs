//! Chat Server — login gate, connection registry and broadcast fan-out.
//!
//! [`ChatService`] is the `ConnectionHandler` the transport calls for every
//! connection. [`ChatServer`] owns the listener and carries out operator
//! console commands.

pub mod broadcast;
pub mod console;
pub mod login;
pub mod registry;
pub mod server;
pub mod service;

pub use broadcast::{Broadcaster, Delivery};
pub use console::{CONSOLE_COMMANDS, ConsoleAction, ServerGate, ServerStatus};
pub use login::{LoginState, Transition};
pub use registry::{ConnectionRegistry, Recipient, RegistryError};
pub use server::{ChatServer, ConsoleOutcome, ExitStatus};
pub use service::ChatService;

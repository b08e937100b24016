//! Protocol violations and command errors.

use thiserror::Error;

/// A client broke the login protocol. The connection is always closed
/// after the diagnostic (the `Display` text) has been sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
    #[error("You must log in first using #login <loginID>")]
    NotLoggedIn,
    #[error("You are already logged in. Connection will be closed.")]
    AlreadyLoggedIn,
    #[error("Login ID cannot be empty. Connection will be closed.")]
    EmptyLoginId,
}

/// A console command could not be carried out. State is unchanged and
/// the operator may retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// No entry for this name in the dispatch table.
    #[error("unknown command '{name}'")]
    Unknown { name: String },
    /// Too few arguments for the command's declared arity.
    #[error("Usage: {usage}")]
    Usage { usage: &'static str },
    /// The current state does not allow the command.
    #[error("{message}")]
    Precondition { message: &'static str },
    /// An argument was present but malformed.
    #[error("{message}")]
    InvalidArgument { message: String },
}

impl CommandError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown { .. })
    }
}

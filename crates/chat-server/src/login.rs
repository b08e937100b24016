//! Per-connection login state machine.
//!
//! A connection starts `Pending` and must send `#login <id>` as its very
//! first line. Once `Authenticated` it stays that way for the rest of its
//! life; every later line is chat, except another `#login`, which is a
//! violation. Violations always end the connection.

use chat_protocol::{ProtocolViolation, parse_login};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoginState {
    #[default]
    Pending,
    Authenticated(String),
}

impl LoginState {
    pub fn identity(&self) -> Option<&str> {
        match self {
            LoginState::Pending => None,
            LoginState::Authenticated(identity) => Some(identity),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, LoginState::Authenticated(_))
    }
}

/// What the server must do with one incoming line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Bind this identity and confirm the login.
    Login(String),
    /// Fan the payload out, attributed to `identity`.
    Chat { identity: String, payload: String },
    /// Send the diagnostic and close the connection.
    Reject(ProtocolViolation),
}

/// Decide what `line` means for a connection in `state`. Pure.
pub fn advance(state: &LoginState, line: &str) -> Transition {
    match (state, parse_login(line)) {
        (LoginState::Pending, Some(identity)) if identity.is_empty() => {
            Transition::Reject(ProtocolViolation::EmptyLoginId)
        }
        (LoginState::Pending, Some(identity)) => Transition::Login(identity),
        (LoginState::Pending, None) => Transition::Reject(ProtocolViolation::NotLoggedIn),
        (LoginState::Authenticated(_), Some(_)) => {
            Transition::Reject(ProtocolViolation::AlreadyLoggedIn)
        }
        (LoginState::Authenticated(identity), None) => Transition::Chat {
            identity: identity.clone(),
            payload: line.to_owned(),
        },
    }
}

//! Server → client line formats.

use crate::commands::Commands;
use crate::error::ProtocolViolation;

/// Prefix for every line the server itself originates.
pub const SERVER_PREFIX: &str = "SERVER MSG>";

/// Who a broadcast line is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin<'a> {
    /// An authenticated client, by login id.
    Client(&'a str),
    /// The server operator console.
    Operator,
}

impl Origin<'_> {
    pub fn format(&self, payload: &str) -> String {
        match self {
            Origin::Client(identity) => format!("{identity}> {payload}"),
            Origin::Operator => server_line(payload),
        }
    }
}

/// `#login <id>`: sent by the client first, echoed by the server as confirmation.
pub fn login_line(identity: &str) -> String {
    format!("{} {identity}", Commands::LOGIN)
}

pub fn server_line(payload: &str) -> String {
    format!("{SERVER_PREFIX} {payload}")
}

/// Diagnostic sent right before the server closes a misbehaving connection.
pub fn error_line(violation: ProtocolViolation) -> String {
    server_line(&format!("ERROR: {violation}"))
}

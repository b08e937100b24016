//! Login handshake.
//!
//! Protocol flow:
//!   1. Client connects.
//!   2. Client sends: `#login <id>` (must be the first line).
//!   3. Server binds `<id>` to the connection and echoes `#login <id>`.
//!   4. Chat traffic begins. Any further `#login` closes the connection.
//!
//! The id is the first whitespace-delimited token after `#login`; extra
//! tokens are ignored.

use crate::commands::{Commands, Input, interpret};

/// Extract the login id from a `#login` line.
///
/// Returns `None` when the line is not a login command at all, and
/// `Some("")` for a bare `#login` so the caller can reject the empty id.
pub fn parse_login(line: &str) -> Option<String> {
    match interpret(line) {
        Input::Command(command) if command.name == Commands::LOGIN => {
            Some(command.args.into_iter().next().unwrap_or_default())
        }
        _ => None,
    }
}

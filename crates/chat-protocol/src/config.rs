//! Defaults shared by the server and client binaries.

use crate::error::CommandError;

/// Port used when none is given or the given one does not parse.
pub const DEFAULT_PORT: u16 = 5555;

/// Host the client connects to by default.
pub const DEFAULT_HOST: &str = "localhost";

/// Longest accepted line, in bytes, excluding the terminator.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 8192;

/// Parse a port argument strictly.
pub fn parse_port(text: &str) -> Option<u16> {
    text.trim().parse().ok()
}

/// Parse a port argument, falling back to [`DEFAULT_PORT`].
pub fn parse_port_or_default(text: Option<&str>) -> u16 {
    text.and_then(parse_port).unwrap_or(DEFAULT_PORT)
}

/// Parse the argument of a `#setport` command.
pub fn port_argument(text: &str) -> Result<u16, CommandError> {
    parse_port(text).ok_or_else(|| CommandError::invalid_argument("Error: Invalid port number."))
}

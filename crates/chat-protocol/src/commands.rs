//! Command names and the line interpreter.
//!
//! A line whose first character is `#` is a command: it is split on
//! whitespace, the first token (including the `#`) is the name and the
//! rest are arguments. Any other line is a chat payload and is kept
//! verbatim.

/// Leading character that marks a line as a command.
pub const COMMAND_PREFIX: char = '#';

/// All command names, grouped by the console that accepts them.
pub struct Commands;

impl Commands {
    // ── Shared ──────────────────────────────────────────────────────────
    pub const QUIT: &str = "#quit";
    pub const SET_PORT: &str = "#setport";
    pub const GET_PORT: &str = "#getport";

    // ── Client ──────────────────────────────────────────────────────────
    pub const LOGIN: &str = "#login";
    pub const LOGOFF: &str = "#logoff";
    pub const SET_HOST: &str = "#sethost";
    pub const GET_HOST: &str = "#gethost";

    // ── Server console ──────────────────────────────────────────────────
    pub const STOP: &str = "#stop";
    pub const CLOSE: &str = "#close";
    pub const START: &str = "#start";
}

/// A parsed command line. Names are case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub args: Vec<String>,
}

impl Command {
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }
}

/// Result of interpreting one line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Command(Command),
    Chat(String),
}

/// Classify a line as a command or a chat payload. Has no side effects.
pub fn interpret(line: &str) -> Input {
    if !line.starts_with(COMMAND_PREFIX) {
        return Input::Chat(line.to_owned());
    }

    let mut tokens = line.split_whitespace().map(str::to_owned);
    // The line starts with a non-whitespace '#', so there is always a first token.
    let name = tokens.next().unwrap_or_default();
    Input::Command(Command {
        name,
        args: tokens.collect(),
    })
}

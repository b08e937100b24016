//! Operator console command table.

use chat_protocol::{Commands, CommandSpec, DispatchTable, Precondition};

/// Message shown when the listener or attached clients forbid a command.
pub const SERVER_BUSY: &str = "SERVER MSG> Can't do that now. Server is connected.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleAction {
    Quit,
    Stop,
    Close,
    SetPort,
    Start,
    GetPort,
}

/// What a console command requires of the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerGate {
    Always,
    NotListening,
    /// Not listening and no connections attached.
    Idle,
}

/// The part of the server's state console preconditions look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerStatus {
    pub listening: bool,
    pub clients: usize,
}

impl Precondition for ServerGate {
    type State = ServerStatus;

    fn check(self, status: &ServerStatus) -> Result<(), &'static str> {
        let allowed = match self {
            ServerGate::Always => true,
            ServerGate::NotListening => !status.listening,
            ServerGate::Idle => !status.listening && status.clients == 0,
        };
        if allowed { Ok(()) } else { Err(SERVER_BUSY) }
    }
}

pub static CONSOLE_COMMANDS: DispatchTable<ConsoleAction, ServerGate> = DispatchTable::new(&[
    CommandSpec {
        name: Commands::QUIT,
        arity: 0,
        usage: "#quit",
        precondition: ServerGate::Always,
        action: ConsoleAction::Quit,
    },
    CommandSpec {
        name: Commands::STOP,
        arity: 0,
        usage: "#stop",
        precondition: ServerGate::Always,
        action: ConsoleAction::Stop,
    },
    CommandSpec {
        name: Commands::CLOSE,
        arity: 0,
        usage: "#close",
        precondition: ServerGate::Always,
        action: ConsoleAction::Close,
    },
    CommandSpec {
        name: Commands::SET_PORT,
        arity: 1,
        usage: "#setport <port>",
        precondition: ServerGate::Idle,
        action: ConsoleAction::SetPort,
    },
    CommandSpec {
        name: Commands::START,
        arity: 0,
        usage: "#start",
        precondition: ServerGate::NotListening,
        action: ConsoleAction::Start,
    },
    CommandSpec {
        name: Commands::GET_PORT,
        arity: 0,
        usage: "#getport",
        precondition: ServerGate::Always,
        action: ConsoleAction::GetPort,
    },
]);

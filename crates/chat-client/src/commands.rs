//! Client command table.

use chat_protocol::{Commands, CommandSpec, DispatchTable, Precondition};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientAction {
    Quit,
    Logoff,
    SetHost,
    SetPort,
    Login,
    GetHost,
    GetPort,
}

/// Connection state a client command requires, with the refusal text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientGate {
    Always,
    Connected(&'static str),
    Disconnected(&'static str),
}

impl Precondition for ClientGate {
    /// Whether the session is connected.
    type State = bool;

    fn check(self, connected: &bool) -> Result<(), &'static str> {
        match self {
            ClientGate::Always => Ok(()),
            ClientGate::Connected(refusal) if !*connected => Err(refusal),
            ClientGate::Disconnected(refusal) if *connected => Err(refusal),
            ClientGate::Connected(_) | ClientGate::Disconnected(_) => Ok(()),
        }
    }
}

pub static CLIENT_COMMANDS: DispatchTable<ClientAction, ClientGate> = DispatchTable::new(&[
    CommandSpec {
        name: Commands::QUIT,
        arity: 0,
        usage: "#quit",
        precondition: ClientGate::Always,
        action: ClientAction::Quit,
    },
    CommandSpec {
        name: Commands::LOGOFF,
        arity: 0,
        usage: "#logoff",
        precondition: ClientGate::Connected("Error: Not currently connected to the server."),
        action: ClientAction::Logoff,
    },
    CommandSpec {
        name: Commands::SET_HOST,
        arity: 1,
        usage: "#sethost <host>",
        precondition: ClientGate::Disconnected("Error: You must be logged off to change the host."),
        action: ClientAction::SetHost,
    },
    CommandSpec {
        name: Commands::SET_PORT,
        arity: 1,
        usage: "#setport <port>",
        precondition: ClientGate::Disconnected("Error: You must be logged off to change the port."),
        action: ClientAction::SetPort,
    },
    CommandSpec {
        name: Commands::LOGIN,
        arity: 0,
        usage: "#login",
        precondition: ClientGate::Disconnected("Error: Already connected."),
        action: ClientAction::Login,
    },
    CommandSpec {
        name: Commands::GET_HOST,
        arity: 0,
        usage: "#gethost",
        precondition: ClientGate::Always,
        action: ClientAction::GetHost,
    },
    CommandSpec {
        name: Commands::GET_PORT,
        arity: 0,
        usage: "#getport",
        precondition: ClientGate::Always,
        action: ClientAction::GetPort,
    },
]);

#[cfg(test)]
mod tests {
    use super::*;
    use chat_protocol::{CommandError, Input, interpret};

    fn resolve(line: &str, connected: bool) -> Result<ClientAction, CommandError> {
        let Input::Command(command) = interpret(line) else {
            panic!("not a command: {line}");
        };
        CLIENT_COMMANDS.resolve(&command, &connected).map(|inv| inv.action)
    }

    #[test]
    fn host_and_port_only_change_while_disconnected() {
        assert_eq!(resolve("#sethost a", false), Ok(ClientAction::SetHost));
        assert_eq!(resolve("#setport 1", false), Ok(ClientAction::SetPort));
        assert!(matches!(resolve("#sethost a", true), Err(CommandError::Precondition { .. })));
        assert!(matches!(resolve("#setport 1", true), Err(CommandError::Precondition { .. })));
    }

    #[test]
    fn refusal_reported_even_without_argument() {
        assert_eq!(
            resolve("#sethost", true),
            Err(CommandError::Precondition {
                message: "Error: You must be logged off to change the host."
            })
        );
    }

    #[test]
    fn missing_argument_while_disconnected() {
        assert_eq!(resolve("#sethost", false), Err(CommandError::Usage { usage: "#sethost <host>" }));
        assert_eq!(resolve("#setport", false), Err(CommandError::Usage { usage: "#setport <port>" }));
    }

    #[test]
    fn login_and_logoff_gates() {
        assert_eq!(resolve("#login", false), Ok(ClientAction::Login));
        assert!(resolve("#login", true).is_err());
        assert_eq!(resolve("#logoff", true), Ok(ClientAction::Logoff));
        assert!(resolve("#logoff", false).is_err());
    }

    #[test]
    fn queries_always_allowed() {
        for connected in [true, false] {
            assert_eq!(resolve("#quit", connected), Ok(ClientAction::Quit));
            assert_eq!(resolve("#gethost", connected), Ok(ClientAction::GetHost));
            assert_eq!(resolve("#getport", connected), Ok(ClientAction::GetPort));
        }
    }

    #[test]
    fn unknown_command() {
        assert!(resolve("#help", false).unwrap_err().is_unknown());
    }
}

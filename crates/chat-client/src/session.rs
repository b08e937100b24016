//! ClientSession — one user's connection, login id and settings.

use std::sync::Arc;

use chat_protocol::wire::login_line;
use chat_protocol::{
    CommandError, Command, Console, DEFAULT_HOST, DEFAULT_MAX_LINE_LENGTH, DEFAULT_PORT, Input,
    interpret, port_argument,
};
use chat_transport::{ClientConnection, ClientEvent, TransportError};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

use crate::commands::{CLIENT_COMMANDS, ClientAction};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub login_id: String,
    pub host: String,
    pub port: u16,
    pub max_line_length: usize,
}

impl ClientConfig {
    pub fn new(login_id: impl Into<String>) -> Self {
        Self {
            login_id: login_id.into(),
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("not connected to a server")]
    NotConnected,
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Whether the session keeps running after an input or event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

pub struct ClientSession {
    config: ClientConfig,
    connection: Option<ClientConnection>,
    console: Arc<dyn Console>,
}

impl ClientSession {
    /// A session that has not connected yet.
    pub fn new(config: ClientConfig, console: Arc<dyn Console>) -> Self {
        Self {
            config,
            connection: None,
            console,
        }
    }

    /// Connect to the configured server and log in.
    pub async fn connect(config: ClientConfig, console: Arc<dyn Console>) -> Result<Self, ClientError> {
        let mut session = Self::new(config, console);
        session.open().await?;
        Ok(session)
    }

    async fn open(&mut self) -> Result<(), ClientError> {
        let connection =
            ClientConnection::open(&self.config.host, self.config.port, self.config.max_line_length)
                .await?;
        // The login line is always the first thing the server sees.
        connection.send(login_line(&self.config.login_id))?;
        info!(
            "connected to {}:{} as {}",
            self.config.host, self.config.port, self.config.login_id
        );
        self.connection = Some(connection);
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Handle one line typed by the user.
    pub async fn handle_input(&mut self, line: &str) -> Control {
        match interpret(line) {
            Input::Chat(payload) => self.send_chat(payload).await,
            Input::Command(command) => self.handle_command(&command).await,
        }
    }

    async fn send_chat(&mut self, payload: String) -> Control {
        let sent = match &self.connection {
            Some(connection) => connection.send(payload).map_err(ClientError::from),
            None => Err(ClientError::NotConnected),
        };
        match sent {
            Ok(()) => Control::Continue,
            Err(e) => {
                warn!("could not send chat line: {e}");
                self.console
                    .display("Could not send message to server. Terminating client.");
                self.quit().await
            }
        }
    }

    async fn handle_command(&mut self, command: &Command) -> Control {
        let invocation = match CLIENT_COMMANDS.resolve(command, &self.is_connected()) {
            Ok(invocation) => invocation,
            Err(CommandError::Unknown { .. }) => {
                self.console.display("Error: Unknown command.");
                return Control::Continue;
            }
            Err(e) => {
                self.console.display(&e.to_string());
                return Control::Continue;
            }
        };

        match invocation.action {
            ClientAction::Quit => return self.quit().await,
            ClientAction::Logoff => self.logoff().await,
            ClientAction::SetHost => {
                if let Some(host) = invocation.arg(0) {
                    self.config.host = host.to_owned();
                    self.console.display(&format!("Host set to: {host}"));
                }
            }
            ClientAction::SetPort => match port_argument(invocation.arg(0).unwrap_or_default()) {
                Ok(port) => {
                    self.config.port = port;
                    self.console.display(&format!("Port set to: {port}"));
                }
                Err(e) => self.console.display(&e.to_string()),
            },
            ClientAction::Login => match self.open().await {
                Ok(()) => self.console.display("Logged in to server."),
                Err(e) => {
                    warn!("login failed: {e}");
                    self.console.display("Failed to connect to server.");
                }
            },
            ClientAction::GetHost => {
                self.console.display(&format!("Current host: {}", self.config.host));
            }
            ClientAction::GetPort => {
                self.console.display(&format!("Current port: {}", self.config.port));
            }
        }
        Control::Continue
    }

    async fn logoff(&mut self) {
        let Some(connection) = self.connection.take() else {
            return;
        };
        match connection.close().await {
            Ok(()) => self.console.display("Logged off from the server."),
            Err(e) => {
                warn!("error while logging off: {e}");
                self.console.display(&format!("Error while logging off: {e}"));
            }
        }
    }

    /// Close the connection, if any, and end the session.
    pub async fn quit(&mut self) -> Control {
        if let Some(connection) = self.connection.take() {
            if let Err(e) = connection.close().await {
                warn!("error while closing connection: {e}");
            }
        }
        Control::Quit
    }

    /// React to something the server did.
    pub async fn handle_event(&mut self, event: ClientEvent) -> Control {
        match event {
            ClientEvent::Message(line) => {
                self.console.display(&line);
                Control::Continue
            }
            ClientEvent::Closed => {
                self.console.display("Connection closed.");
                self.quit().await
            }
            ClientEvent::Exception(e) => {
                warn!("connection failed: {e}");
                self.console
                    .display("The server has shut down due to an exception.");
                self.quit().await
            }
        }
    }

    /// Next event from the server. Never resolves while disconnected.
    pub async fn next_event(&mut self) -> ClientEvent {
        match self.connection.as_mut() {
            Some(connection) => connection.next_event().await.unwrap_or(ClientEvent::Closed),
            None => std::future::pending().await,
        }
    }

    /// Read user lines and server events until the session quits.
    /// End of input counts as `#quit`.
    pub async fn run<R>(mut self, input: R)
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();

        loop {
            let control = tokio::select! {
                line = lines.next_line() => match line {
                    Ok(Some(line)) => self.handle_input(&line).await,
                    Ok(None) => {
                        debug!("input closed");
                        self.quit().await
                    }
                    Err(e) => {
                        warn!("failed to read input: {e}");
                        self.quit().await
                    }
                },
                event = self.next_event() => self.handle_event(event).await,
            };
            if control == Control::Quit {
                break;
            }
        }
        info!("client session ended");
    }
}

//! ChatServer — listener ownership and operator console commands.

use std::future::Future;
use std::sync::Arc;

use chat_protocol::wire::server_line;
use chat_protocol::{CommandError, Console, Input, interpret, port_argument};
use chat_transport::{TransportConfig, TransportError, TransportServer};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{error, info};

use crate::console::{CONSOLE_COMMANDS, ConsoleAction, ServerStatus};
use crate::service::ChatService;

/// How the server process should end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    /// Shutting down the listener failed.
    Failure,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Failure => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleOutcome {
    Continue,
    Exit(ExitStatus),
}

pub struct ChatServer {
    service: Arc<ChatService>,
    console: Arc<dyn Console>,
    config: TransportConfig,
    listener: Option<TransportServer>,
}

impl ChatServer {
    pub fn new(config: TransportConfig, console: Arc<dyn Console>) -> Self {
        Self {
            service: Arc::new(ChatService::new(console.clone())),
            console,
            config,
            listener: None,
        }
    }

    pub fn service(&self) -> &Arc<ChatService> {
        &self.service
    }

    pub fn is_listening(&self) -> bool {
        self.listener.is_some()
    }

    /// Configured port, or the bound one once listening on port 0.
    pub fn port(&self) -> u16 {
        self.config.port
    }

    pub fn status(&self) -> ServerStatus {
        ServerStatus {
            listening: self.is_listening(),
            clients: self.service.client_count(),
        }
    }

    /// Start accepting connections. No-op if already listening.
    pub async fn listen(&mut self) -> Result<(), TransportError> {
        if self.listener.is_some() {
            return Ok(());
        }
        let listener = TransportServer::start(&self.config, self.service.clone()).await?;
        // Keep the port stable across #stop/#start when it was OS-assigned.
        self.config.port = listener.port();
        self.listener = Some(listener);
        self.console.display(&server_line(&format!(
            "Server listening for connections on port {}",
            self.config.port
        )));
        Ok(())
    }

    /// Stop accepting connections; attached clients stay connected.
    pub async fn stop_listening(&mut self) -> Result<(), TransportError> {
        let Some(mut listener) = self.listener.take() else {
            return Ok(());
        };
        listener.stop().await?;
        self.console
            .display(&server_line("Server has stopped listening for connections."));
        Ok(())
    }

    pub async fn close_connections(&self) -> usize {
        self.service.close_all().await
    }

    /// Stop listening and close every connection.
    pub async fn shutdown(&mut self) -> ExitStatus {
        let stopped = self.stop_listening().await;
        self.close_connections().await;
        match stopped {
            Ok(()) => {
                info!("chat server shut down");
                ExitStatus::Success
            }
            Err(e) => {
                error!("failed to stop listening: {e}");
                ExitStatus::Failure
            }
        }
    }

    /// Handle one line typed by the operator.
    pub async fn handle_console_line(&mut self, line: &str) -> ConsoleOutcome {
        let command = match interpret(line) {
            Input::Chat(payload) => {
                self.service.operator_broadcast(&payload);
                return ConsoleOutcome::Continue;
            }
            Input::Command(command) => command,
        };

        let invocation = match CONSOLE_COMMANDS.resolve(&command, &self.status()) {
            Ok(invocation) => invocation,
            Err(CommandError::Unknown { name }) => {
                self.console.display(&format!("Invalid command: '{name}'"));
                return ConsoleOutcome::Continue;
            }
            Err(e) => {
                self.console.display(&e.to_string());
                return ConsoleOutcome::Continue;
            }
        };

        match invocation.action {
            ConsoleAction::Quit => return ConsoleOutcome::Exit(self.shutdown().await),
            ConsoleAction::Stop => {
                if let Err(e) = self.stop_listening().await {
                    self.console
                        .display(&server_line(&format!("Error stopping the listener: {e}")));
                }
            }
            ConsoleAction::Close => {
                self.close_connections().await;
            }
            ConsoleAction::SetPort => match port_argument(invocation.arg(0).unwrap_or_default()) {
                Ok(port) => {
                    self.config.port = port;
                    self.console.display(&server_line(&format!("Port set to {port}")));
                }
                Err(e) => self.console.display(&server_line(&e.to_string())),
            },
            ConsoleAction::Start => {
                if let Err(e) = self.listen().await {
                    self.console.display(&server_line(&format!(
                        "Error listening for incoming connections: {e}"
                    )));
                }
            }
            ConsoleAction::GetPort => {
                self.console.display(&format!("Current port is {}", self.config.port));
            }
        }
        ConsoleOutcome::Continue
    }

    /// Read operator lines until `#quit`, end of input or `shutdown` resolves.
    pub async fn run<R, F>(mut self, input: R, shutdown: F) -> ExitStatus
    where
        R: AsyncBufRead + Unpin,
        F: Future<Output = ()>,
    {
        let mut lines = input.lines();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        if let ConsoleOutcome::Exit(status) = self.handle_console_line(&line).await {
                            return status;
                        }
                    }
                    Ok(None) => {
                        info!("console input closed");
                        return self.shutdown().await;
                    }
                    Err(e) => {
                        error!("failed to read console input: {e}");
                        return self.shutdown().await;
                    }
                },
                _ = &mut shutdown => {
                    info!("shutdown requested");
                    return self.shutdown().await;
                }
            }
        }
    }
}

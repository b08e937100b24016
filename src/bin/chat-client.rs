//! chat-client — connect to a chat server under a login id.
//!
//! Usage:
//!   chat-client alice                    # localhost:5555
//!   chat-client alice example.org 6000   # custom host and port
//!
//! Plain lines are sent as chat; `#quit`, `#logoff`, `#login`,
//! `#sethost <host>`, `#setport <port>`, `#gethost` and `#getport` are
//! handled locally.

use std::path::PathBuf;
use std::sync::Arc;

use chat_client::{ClientConfig, ClientSession};
use chat_protocol::{
    Console, DEFAULT_HOST, DEFAULT_MAX_LINE_LENGTH, StdoutConsole, parse_port_or_default,
};
use clap::Parser;
use tokio::io::BufReader;
use tracing::error;

#[derive(Parser, Debug)]
#[command(name = "chat-client", about = "Simple chat client")]
struct Cli {
    /// Login id announced to the server
    login_id: String,

    /// Server host
    #[arg(default_value = DEFAULT_HOST)]
    host: String,

    /// Server port (5555 if missing or not a valid port)
    port: Option<String>,

    /// Longest accepted line in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_LINE_LENGTH)]
    max_line_length: usize,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    simplechat::logging::init(cli.verbose, "warn", cli.log_file.as_deref())?;

    let config = ClientConfig {
        login_id: cli.login_id,
        host: cli.host,
        port: parse_port_or_default(cli.port.as_deref()),
        max_line_length: cli.max_line_length,
    };
    let console: Arc<dyn Console> = Arc::new(StdoutConsole);

    let session = match ClientSession::connect(config, console.clone()).await {
        Ok(session) => session,
        Err(e) => {
            error!("{e}");
            console.display("ERROR - Can't setup connection! Terminating client.");
            std::process::exit(1);
        }
    };

    session.run(BufReader::new(tokio::io::stdin())).await;
    // A blocked stdin read would otherwise hold the runtime open.
    std::process::exit(0);
}

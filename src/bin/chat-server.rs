//! chat-server — accept chat clients and relay their lines to each other.
//!
//! Usage:
//!   chat-server              # port 5555
//!   chat-server 6000         # custom port (unparsable falls back to 5555)
//!   chat-server --verbose    # debug logging
//!
//! Lines typed on stdin are operator input: `#quit`, `#stop`, `#close`,
//! `#setport <port>`, `#start`, `#getport`, or text to broadcast.

use std::path::PathBuf;
use std::sync::Arc;

use chat_protocol::wire::server_line;
use chat_protocol::{Console, DEFAULT_MAX_LINE_LENGTH, StdoutConsole, parse_port_or_default};
use chat_server::ChatServer;
use chat_transport::{DEFAULT_OUTBOUND_CAPACITY, TransportConfig};
use clap::Parser;
use tokio::io::BufReader;
use tracing::{error, warn};

#[derive(Parser, Debug)]
#[command(name = "chat-server", about = "Simple chat server")]
struct Cli {
    /// Port to listen on (5555 if missing or not a valid port)
    port: Option<String>,

    /// Hostname to bind to
    #[arg(long, default_value = "0.0.0.0")]
    hostname: String,

    /// Longest accepted line in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_LINE_LENGTH)]
    max_line_length: usize,

    /// Lines queued per client before a client that stops reading is dropped
    #[arg(long, default_value_t = DEFAULT_OUTBOUND_CAPACITY)]
    outbound_capacity: usize,

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
    simplechat::logging::init(cli.verbose, "info", cli.log_file.as_deref())?;

    let config = TransportConfig {
        hostname: cli.hostname,
        port: parse_port_or_default(cli.port.as_deref()),
        max_line_length: cli.max_line_length,
        outbound_capacity: cli.outbound_capacity,
        ..TransportConfig::default()
    };
    let console: Arc<dyn Console> = Arc::new(StdoutConsole);
    let mut server = ChatServer::new(config, console.clone());

    // Without a listener the operator can still #setport and #start.
    if let Err(e) = server.listen().await {
        error!("{e}");
        console.display(&server_line("ERROR - Could not listen for clients!"));
    }

    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("cannot watch for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };
    let status = server.run(BufReader::new(tokio::io::stdin()), ctrl_c).await;
    std::process::exit(status.code());
}

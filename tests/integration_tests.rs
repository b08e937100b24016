//! End-to-end tests: a listening chat server and real TCP clients.

use std::sync::Arc;
use std::time::Duration;

use chat_client::{ClientConfig, ClientSession, Control};
use chat_protocol::BufferConsole;
use chat_server::ChatServer;
use chat_transport::TransportConfig;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::{Framed, LinesCodec};

const TIMEOUT: Duration = Duration::from_secs(5);

type Line = Framed<TcpStream, LinesCodec>;

fn loopback_config() -> TransportConfig {
    TransportConfig {
        hostname: "127.0.0.1".into(),
        port: 0,
        ..TransportConfig::default()
    }
}

/// Start a server on an OS-assigned loopback port.
async fn start_server() -> (ChatServer, Arc<BufferConsole>) {
    start_server_with(loopback_config()).await
}

async fn start_server_with(config: TransportConfig) -> (ChatServer, Arc<BufferConsole>) {
    let console = Arc::new(BufferConsole::new());
    let mut server = ChatServer::new(config, console.clone());
    server.listen().await.expect("listen");
    (server, console)
}

async fn connect(port: u16) -> Line {
    let stream = timeout(TIMEOUT, TcpStream::connect(("127.0.0.1", port)))
        .await
        .expect("connect timed out")
        .expect("connect");
    Framed::new(stream, LinesCodec::new())
}

async fn recv(conn: &mut Line) -> Option<String> {
    timeout(TIMEOUT, conn.next())
        .await
        .expect("read timed out")
        .map(|line| line.expect("read"))
}

async fn login(port: u16, id: &str) -> Line {
    let mut conn = connect(port).await;
    conn.send(format!("#login {id}")).await.unwrap();
    assert_eq!(recv(&mut conn).await, Some(format!("#login {id}")));
    conn
}

/// Wait until the console shows `text`; connection callbacks run on other tasks.
async fn console_shows(console: &BufferConsole, text: &str) {
    timeout(TIMEOUT, async {
        while !console.contains(text) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("console never showed {text:?}"));
}

#[tokio::test]
async fn chat_round_trip_between_two_clients() {
    let (mut server, console) = start_server().await;
    let port = server.port();

    let mut alice = login(port, "alice").await;
    let mut bob = login(port, "bob").await;

    alice.send("hi").await.unwrap();
    assert_eq!(recv(&mut alice).await.as_deref(), Some("alice> hi"));
    assert_eq!(recv(&mut bob).await.as_deref(), Some("alice> hi"));

    bob.send("hey").await.unwrap();
    assert_eq!(recv(&mut alice).await.as_deref(), Some("bob> hey"));
    assert_eq!(recv(&mut bob).await.as_deref(), Some("bob> hey"));

    console_shows(&console, "SERVER MSG> Message received from bob: hey").await;
    server.shutdown().await;
}

#[tokio::test]
async fn chat_before_login_gets_diagnostic_then_close() {
    let (mut server, console) = start_server().await;
    let mut conn = connect(server.port()).await;

    conn.send("hello").await.unwrap();
    assert_eq!(
        recv(&mut conn).await.as_deref(),
        Some("SERVER MSG> ERROR: You must log in first using #login <loginID>")
    );
    assert_eq!(recv(&mut conn).await, None);

    console_shows(&console, "SERVER MSG> Client disconnected: Unknown").await;
    server.shutdown().await;
}

#[tokio::test]
async fn second_login_closes_only_that_connection() {
    let (mut server, _console) = start_server().await;
    let port = server.port();
    let mut alice = login(port, "alice").await;
    let mut bob = login(port, "bob").await;

    bob.send("#login bob2").await.unwrap();
    assert_eq!(
        recv(&mut bob).await.as_deref(),
        Some("SERVER MSG> ERROR: You are already logged in. Connection will be closed.")
    );
    assert_eq!(recv(&mut bob).await, None);

    alice.send("still here").await.unwrap();
    assert_eq!(recv(&mut alice).await.as_deref(), Some("alice> still here"));
    server.shutdown().await;
}

#[tokio::test]
async fn operator_broadcast_reaches_only_logged_in_clients() {
    let (mut server, _console) = start_server().await;
    let port = server.port();
    let mut alice = login(port, "alice").await;
    let mut pending = connect(port).await;

    server.handle_console_line("maintenance at noon").await;
    assert_eq!(
        recv(&mut alice).await.as_deref(),
        Some("SERVER MSG> maintenance at noon")
    );

    // The pending connection's first line is still its login.
    pending.send("#login late").await.unwrap();
    assert_eq!(recv(&mut pending).await.as_deref(), Some("#login late"));
    server.shutdown().await;
}

#[tokio::test]
async fn stop_keeps_clients_and_refuses_new_ones() {
    let (mut server, _console) = start_server().await;
    let port = server.port();
    let mut alice = login(port, "alice").await;

    server.handle_console_line("#stop").await;
    assert!(TcpStream::connect(("127.0.0.1", port)).await.is_err());

    alice.send("after stop").await.unwrap();
    assert_eq!(recv(&mut alice).await.as_deref(), Some("alice> after stop"));
    server.shutdown().await;
}

#[tokio::test]
async fn close_disconnects_clients_but_keeps_listening() {
    let (mut server, console) = start_server().await;
    let port = server.port();
    let mut alice = login(port, "alice").await;

    server.handle_console_line("#close").await;
    assert_eq!(recv(&mut alice).await, None);
    assert!(server.is_listening());
    assert!(console.contains("SERVER MSG> Client disconnected: alice"));

    let _again = login(port, "alice").await;
    server.shutdown().await;
}

#[tokio::test]
async fn client_session_talks_to_server() {
    let (mut server, _server_console) = start_server().await;
    let port = server.port();
    let mut bob = login(port, "bob").await;

    let mut config = ClientConfig::new("alice");
    config.host = "127.0.0.1".into();
    config.port = port;
    let console = Arc::new(BufferConsole::new());
    let mut session = ClientSession::connect(config, console.clone()).await.unwrap();

    // The session sees its own login echoed back.
    let event = timeout(TIMEOUT, session.next_event()).await.unwrap();
    assert_eq!(session.handle_event(event).await, Control::Continue);
    assert_eq!(console.last().as_deref(), Some("#login alice"));

    session.handle_input("hello bob").await;
    assert_eq!(recv(&mut bob).await.as_deref(), Some("alice> hello bob"));
    let event = timeout(TIMEOUT, session.next_event()).await.unwrap();
    session.handle_event(event).await;
    assert_eq!(console.last().as_deref(), Some("alice> hello bob"));

    // Server-side #quit closes the client's connection.
    server.handle_console_line("#quit").await;
    let event = timeout(TIMEOUT, session.next_event()).await.unwrap();
    assert_eq!(session.handle_event(event).await, Control::Quit);
    assert!(console.contains("Connection closed."));
}

#[tokio::test]
async fn client_that_stops_reading_is_dropped() {
    let config = TransportConfig {
        outbound_capacity: 16,
        write_timeout: Duration::from_millis(500),
        ..loopback_config()
    };
    let (mut server, console) = start_server_with(config).await;
    let port = server.port();
    let alice = login(port, "alice").await;
    let _bob = login(port, "bob").await;

    // Alice keeps reading; Bob never reads again.
    let reader = tokio::spawn(async move {
        let mut alice = alice;
        let mut received = 0usize;
        while let Some(Ok(line)) = alice.next().await {
            if line == "SERVER MSG> done" {
                return Some(received);
            }
            received += 1;
        }
        None
    });

    let payload = "x".repeat(16 * 1024);
    let mut sent = 0usize;
    timeout(Duration::from_secs(30), async {
        while server.service().client_count() > 1 {
            server.handle_console_line(&payload).await;
            sent += 1;
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("non-reading client was never dropped");

    assert_eq!(
        server.service().registry().snapshot()[0].identity,
        "alice"
    );
    assert_eq!(
        console
            .lines()
            .iter()
            .filter(|l| l.as_str() == "SERVER MSG> Client disconnected: bob")
            .count(),
        1
    );

    server.handle_console_line("done").await;
    let received = timeout(Duration::from_secs(30), reader)
        .await
        .expect("reader timed out")
        .expect("reader panicked");
    assert_eq!(received, Some(sent));
    server.shutdown().await;
}

//! Client session tests against a bare line-based peer.

use std::sync::Arc;
use std::time::Duration;

use chat_client::{ClientConfig, ClientSession, Control};
use chat_protocol::BufferConsole;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{Framed, LinesCodec};

const TIMEOUT: Duration = Duration::from_secs(5);

async fn peer() -> (TcpListener, ClientConfig) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let mut config = ClientConfig::new("alice");
    config.host = "127.0.0.1".to_owned();
    config.port = listener.local_addr().unwrap().port();
    (listener, config)
}

async fn accept(listener: &TcpListener) -> Framed<TcpStream, LinesCodec> {
    let (stream, _) = tokio::time::timeout(TIMEOUT, listener.accept())
        .await
        .expect("accept timed out")
        .unwrap();
    Framed::new(stream, LinesCodec::new())
}

async fn recv(framed: &mut Framed<TcpStream, LinesCodec>) -> Option<String> {
    tokio::time::timeout(TIMEOUT, framed.next())
        .await
        .expect("read timed out")
        .map(|line| line.unwrap())
}

async fn connected() -> (ClientSession, Framed<TcpStream, LinesCodec>, Arc<BufferConsole>, TcpListener) {
    let (listener, config) = peer().await;
    let console = Arc::new(BufferConsole::new());
    let session = ClientSession::connect(config, console.clone()).await.unwrap();
    let mut server = accept(&listener).await;
    assert_eq!(recv(&mut server).await.as_deref(), Some("#login alice"));
    (session, server, console, listener)
}

#[tokio::test]
async fn login_line_precedes_chat() {
    let (mut session, mut server, _console, _listener) = connected().await;

    assert_eq!(session.handle_input("hello").await, Control::Continue);
    assert_eq!(session.handle_input("").await, Control::Continue);
    assert_eq!(recv(&mut server).await.as_deref(), Some("hello"));
    assert_eq!(recv(&mut server).await.as_deref(), Some(""));
}

#[tokio::test]
async fn server_lines_are_displayed_verbatim() {
    let (mut session, mut server, console, _listener) = connected().await;

    server.send("SERVER MSG> hi all").await.unwrap();
    let event = tokio::time::timeout(TIMEOUT, session.next_event()).await.unwrap();
    assert_eq!(session.handle_event(event).await, Control::Continue);
    assert_eq!(console.last().as_deref(), Some("SERVER MSG> hi all"));
}

#[tokio::test]
async fn server_closing_ends_the_session() {
    let (mut session, server, console, _listener) = connected().await;

    drop(server);
    let event = tokio::time::timeout(TIMEOUT, session.next_event()).await.unwrap();
    assert_eq!(session.handle_event(event).await, Control::Quit);
    assert!(console.contains("Connection closed."));
    assert!(!session.is_connected());
}

#[tokio::test]
async fn settings_locked_while_connected() {
    let (mut session, _server, console, listener) = connected().await;
    let port = listener.local_addr().unwrap().port();

    session.handle_input("#sethost example.org").await;
    assert_eq!(
        console.last().as_deref(),
        Some("Error: You must be logged off to change the host.")
    );
    session.handle_input("#setport 6000").await;
    assert_eq!(
        console.last().as_deref(),
        Some("Error: You must be logged off to change the port.")
    );
    session.handle_input("#login").await;
    assert_eq!(console.last().as_deref(), Some("Error: Already connected."));
    assert_eq!(session.config().host, "127.0.0.1");
    assert_eq!(session.config().port, port);
}

#[tokio::test]
async fn logoff_then_login_reconnects() {
    let (mut session, mut server, console, listener) = connected().await;

    assert_eq!(session.handle_input("#logoff").await, Control::Continue);
    assert!(console.contains("Logged off from the server."));
    assert!(!session.is_connected());
    assert_eq!(recv(&mut server).await, None);

    session.handle_input("#logoff").await;
    assert_eq!(
        console.last().as_deref(),
        Some("Error: Not currently connected to the server.")
    );

    session.handle_input("#login").await;
    assert!(session.is_connected());
    assert_eq!(console.last().as_deref(), Some("Logged in to server."));
    let mut again = accept(&listener).await;
    assert_eq!(recv(&mut again).await.as_deref(), Some("#login alice"));
}

#[tokio::test]
async fn transport_failure_ends_the_session() {
    let (listener, mut config) = peer().await;
    config.max_line_length = 64;
    let console = Arc::new(BufferConsole::new());
    let mut session = ClientSession::connect(config, console.clone()).await.unwrap();
    let mut server = accept(&listener).await;
    assert_eq!(recv(&mut server).await.as_deref(), Some("#login alice"));

    server.send("x".repeat(200)).await.unwrap();
    let event = tokio::time::timeout(TIMEOUT, session.next_event()).await.unwrap();
    assert_eq!(session.handle_event(event).await, Control::Quit);
    assert_eq!(
        console.last().as_deref(),
        Some("The server has shut down due to an exception.")
    );
    assert!(!session.is_connected());
}

#[tokio::test]
async fn settings_change_while_logged_off() {
    let (_listener, config) = peer().await;
    let console = Arc::new(BufferConsole::new());
    let mut session = ClientSession::new(config, console.clone());

    session.handle_input("#sethost example.org").await;
    assert_eq!(console.last().as_deref(), Some("Host set to: example.org"));
    session.handle_input("#setport 6000").await;
    assert_eq!(console.last().as_deref(), Some("Port set to: 6000"));
    session.handle_input("#setport nope").await;
    assert_eq!(console.last().as_deref(), Some("Error: Invalid port number."));
    session.handle_input("#sethost").await;
    assert_eq!(console.last().as_deref(), Some("Usage: #sethost <host>"));

    session.handle_input("#gethost").await;
    assert_eq!(console.last().as_deref(), Some("Current host: example.org"));
    session.handle_input("#getport").await;
    assert_eq!(console.last().as_deref(), Some("Current port: 6000"));
}

#[tokio::test]
async fn unknown_command_is_reported_locally() {
    let (mut session, mut server, console, _listener) = connected().await;

    assert_eq!(session.handle_input("#whoami").await, Control::Continue);
    assert_eq!(console.last().as_deref(), Some("Error: Unknown command."));

    // Nothing reached the server before the next chat line.
    session.handle_input("after").await;
    assert_eq!(recv(&mut server).await.as_deref(), Some("after"));
}

#[tokio::test]
async fn chat_while_logged_off_terminates() {
    let (_listener, config) = peer().await;
    let console = Arc::new(BufferConsole::new());
    let mut session = ClientSession::new(config, console.clone());

    assert_eq!(session.handle_input("anyone?").await, Control::Quit);
    assert!(console.contains("Could not send message to server. Terminating client."));
}

#[tokio::test]
async fn failed_login_keeps_session_alive() {
    let (listener, config) = peer().await;
    drop(listener);
    let console = Arc::new(BufferConsole::new());
    let mut session = ClientSession::new(config, console.clone());

    assert_eq!(session.handle_input("#login").await, Control::Continue);
    assert_eq!(console.last().as_deref(), Some("Failed to connect to server."));
    assert!(!session.is_connected());
}

#[tokio::test]
async fn connect_fails_without_a_server() {
    let (listener, config) = peer().await;
    drop(listener);
    let console = Arc::new(BufferConsole::new());

    assert!(ClientSession::connect(config, console).await.is_err());
}

#[tokio::test]
async fn run_quits_on_command_and_closes_socket() {
    let (session, mut server, _console, _listener) = connected().await;

    let input: &[u8] = b"first\n#quit\nnever sent\n";
    tokio::time::timeout(TIMEOUT, session.run(input)).await.unwrap();

    assert_eq!(recv(&mut server).await.as_deref(), Some("first"));
    assert_eq!(recv(&mut server).await, None);
}

#[tokio::test]
async fn run_treats_end_of_input_as_quit() {
    let (session, mut server, _console, _listener) = connected().await;

    let input: &[u8] = b"";
    tokio::time::timeout(TIMEOUT, session.run(input)).await.unwrap();
    assert_eq!(recv(&mut server).await, None);
}

//! Simple Chat — shared setup for the `chat-server` and `chat-client` binaries.
//!
//! The protocol, transport, server and client live in the crates under
//! `crates/`; this package only wires them to a terminal.

pub mod logging;

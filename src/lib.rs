//! WS Client Session - Single-connection WebSocket client.
//!
//! This library manages one outgoing WebSocket connection at a time and
//! exposes it through a small, poll-driven API: connect, send a text
//! message, take the oldest received message, and read the lifecycle state.
//!
//! # Architecture
//!
//! The session is split into two halves:
//!
//! - **State machine (sans-IO)**: [`SessionMachine`] consumes I/O completions
//!   and emits I/O requests. It owns the lifecycle state and both queues.
//! - **Transport link**: one tokio task per connection cycle performs the
//!   resolve, connect, handshake, read, write and close steps.
//!
//! Key design principles:
//!
//! - Exactly one read is outstanding while connected
//! - A transport handle exists iff the state is `Connecting`, `Connected`
//!   or `Disconnecting`
//! - Failures never panic or return from the poll loop; they go to the
//!   error handler
//!
//! # Quick Start
//!
//! ```no_run
//! use ws_client_session::{ClientSession, ConnectionState, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let mut session = ClientSession::builder()
//!         .error_handler(|err| eprintln!("error: {err}"))
//!         .build()?;
//!
//!     session.connect("echo.websocket.org", "80")?;
//!
//!     while session.get_socket_state() != ConnectionState::Disconnected {
//!         session.tick().await;
//!
//!         if let Some(message) = session.get_last_message() {
//!             println!("received: {message}");
//!             session.send_message("Hello world!")?;
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`session`] | [`ClientSession`], [`SessionMachine`], options and states |
//! | [`transport`] | Resolvers and the per-cycle transport link |
//! | [`error`] | Error types and [`Result`] alias |

// ============================================================================
// Modules
// ============================================================================

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Client session: driver, state machine, options and states.
pub mod session;

/// Transport layer.
///
/// Name resolution and the task that owns the socket of one connection cycle.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Error types
pub use error::{Error, Result};

// Session types
pub use session::{
    Action, ClientSession, Completion, ConnectionState, ErrorHandler, IoRequest, QueueLimit,
    ReadOutcome, SessionBuilder, SessionMachine, SessionOptions,
};

// Transport types
pub use transport::{Resolver, StaticResolver, SystemResolver};

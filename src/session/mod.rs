//! Client session.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ClientSession`] | Poll-driven session bound to a tokio runtime |
//! | [`SessionBuilder`] | Fluent configuration builder |
//! | [`SessionMachine`] | Sans-IO state machine behind the session |
//! | [`SessionOptions`] | Timeouts, handshake identity, queue bounds |
//! | [`ConnectionState`] | Lifecycle phase |

// ============================================================================
// Submodules
// ============================================================================

/// Poll-driven client session.
pub mod client;

/// Sans-IO connection state machine.
pub mod machine;

/// Session configuration.
pub mod options;

/// Connection lifecycle states.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use client::{ClientSession, ErrorHandler, SessionBuilder};
pub use machine::{Action, Completion, IoRequest, ReadOutcome, SessionMachine};
pub use options::{QueueLimit, SessionOptions};
pub use state::ConnectionState;

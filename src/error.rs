//! Error types for the WebSocket client session.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Reporting Model
//!
//! Lifecycle failures (resolve, connect, handshake, read, write, close) are
//! never returned from [`ClientSession`] operations. They are delivered to the
//! session's error handler and, where [`Error::forces_disconnect`] is `true`,
//! move the session back to `Disconnected`. Only caller misuse is returned
//! directly:
//!
//! ```ignore
//! use ws_client_session::{ClientSession, Error};
//!
//! match session.send_message("hello") {
//!     Ok(()) => {}
//!     Err(Error::NotConnected { state }) => eprintln!("not yet: {state}"),
//!     Err(e) => return Err(e),
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Usage | [`Error::NotConnected`], [`Error::ConnectInProgress`], [`Error::OutboundQueueFull`] |
//! | Connect phase | [`Error::Resolve`], [`Error::Connect`], [`Error::ConnectTimeout`], [`Error::Handshake`], [`Error::HandshakeTimeout`] |
//! | Connected phase | [`Error::Read`], [`Error::Write`], [`Error::Close`] |
//! | External | [`Error::Io`], [`Error::Json`] |
//!
//! [`ClientSession`]: crate::ClientSession

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;

use crate::session::ConnectionState;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when session options fail validation.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Usage Errors
    // ========================================================================
    /// Message send requested while the session is not connected.
    #[error("Not connected (state: {state})")]
    NotConnected {
        /// State at the time of the request.
        state: ConnectionState,
    },

    /// Connect requested while a previous connection cycle is still active.
    #[error("Connection cycle already active (state: {state})")]
    ConnectInProgress {
        /// State at the time of the request.
        state: ConnectionState,
    },

    /// Outbound queue reached its configured capacity.
    #[error("Outbound queue full ({capacity} messages)")]
    OutboundQueueFull {
        /// Configured capacity.
        capacity: usize,
    },

    // ========================================================================
    // Connect Phase Errors
    // ========================================================================
    /// Name resolution failed.
    #[error("Failed to resolve {host}:{port}: {message}")]
    Resolve {
        /// Host that was looked up.
        host: String,
        /// Port or service that was looked up.
        port: String,
        /// Description of the failure.
        message: String,
    },

    /// Transport connection failed.
    #[error("Connection failed: {message}")]
    Connect {
        /// Description of the connection error.
        message: String,
    },

    /// Transport connection did not complete in time.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// WebSocket upgrade handshake failed.
    #[error("Handshake failed: {message}")]
    Handshake {
        /// Description of the handshake failure.
        message: String,
    },

    /// WebSocket upgrade handshake did not complete in time.
    #[error("Handshake timeout after {timeout_ms}ms")]
    HandshakeTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // Connected Phase Errors
    // ========================================================================
    /// Reading a frame failed with something other than a clean close.
    #[error("Read failed: {message}")]
    Read {
        /// Description of the read failure.
        message: String,
    },

    /// Writing a frame failed.
    ///
    /// Does not tear down the connection.
    #[error("Write failed: {message}")]
    Write {
        /// Description of the write failure.
        message: String,
    },

    /// Close handshake failed.
    #[error("Close failed: {message}")]
    Close {
        /// Description of the close failure.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a not connected error.
    #[inline]
    pub fn not_connected(state: ConnectionState) -> Self {
        Self::NotConnected { state }
    }

    /// Creates a connect in progress error.
    #[inline]
    pub fn connect_in_progress(state: ConnectionState) -> Self {
        Self::ConnectInProgress { state }
    }

    /// Creates an outbound queue full error.
    #[inline]
    pub fn outbound_queue_full(capacity: usize) -> Self {
        Self::OutboundQueueFull { capacity }
    }

    /// Creates a resolve error.
    #[inline]
    pub fn resolve(
        host: impl Into<String>,
        port: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Resolve {
            host: host.into(),
            port: port.into(),
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connect(message: impl Into<String>) -> Self {
        Self::Connect {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connect_timeout(timeout_ms: u64) -> Self {
        Self::ConnectTimeout { timeout_ms }
    }

    /// Creates a handshake error.
    #[inline]
    pub fn handshake(message: impl Into<String>) -> Self {
        Self::Handshake {
            message: message.into(),
        }
    }

    /// Creates a handshake timeout error.
    #[inline]
    pub fn handshake_timeout(timeout_ms: u64) -> Self {
        Self::HandshakeTimeout { timeout_ms }
    }

    /// Creates a read error.
    #[inline]
    pub fn read(message: impl Into<String>) -> Self {
        Self::Read {
            message: message.into(),
        }
    }

    /// Creates a write error.
    #[inline]
    pub fn write(message: impl Into<String>) -> Self {
        Self::Write {
            message: message.into(),
        }
    }

    /// Creates a close error.
    #[inline]
    pub fn close(message: impl Into<String>) -> Self {
        Self::Close {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ConnectTimeout { .. } | Self::HandshakeTimeout { .. }
        )
    }

    /// Returns `true` if this error was raised while establishing a connection.
    #[inline]
    #[must_use]
    pub fn is_connect_phase(&self) -> bool {
        matches!(
            self,
            Self::Resolve { .. }
                | Self::Connect { .. }
                | Self::ConnectTimeout { .. }
                | Self::Handshake { .. }
                | Self::HandshakeTimeout { .. }
        )
    }

    /// Returns `true` if this error reflects caller misuse rather than I/O.
    #[inline]
    #[must_use]
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::NotConnected { .. }
                | Self::ConnectInProgress { .. }
                | Self::OutboundQueueFull { .. }
        )
    }

    /// Returns `true` if reporting this error sends the session straight to
    /// `Disconnected`.
    ///
    /// Write and close failures are reported without tearing the session
    /// down on their own.
    #[inline]
    #[must_use]
    pub fn forces_disconnect(&self) -> bool {
        self.is_connect_phase() || matches!(self, Self::Read { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================

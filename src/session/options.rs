//! Session configuration.
//!
//! Provides a type-safe interface for the connection timeouts, handshake
//! identity and queue bounds of a [`ClientSession`](crate::ClientSession).
//!
//! # Example
//!
//! ```
//! use ws_client_session::{QueueLimit, SessionOptions};
//!
//! let options = SessionOptions::new()
//!     .with_connect_timeout_ms(5_000)
//!     .with_resource_path("/feed")
//!     .with_inbound_limit(QueueLimit::DropOldest(1024));
//!
//! assert!(options.validate().is_ok());
//! ```
//!
//! Options can also be loaded from JSON; missing fields take their defaults:
//!
//! ```
//! use ws_client_session::SessionOptions;
//!
//! let options = SessionOptions::from_json(r#"{ "resource_path": "/chat" }"#).unwrap();
//! assert_eq!(options.resource_path, "/chat");
//! assert_eq!(options.connect_timeout_ms, 30_000);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default transport connect timeout (30s).
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 30_000;

/// Default upgrade handshake timeout (30s).
pub const DEFAULT_HANDSHAKE_TIMEOUT_MS: u64 = 30_000;

/// Default resource path requested during the handshake.
pub const DEFAULT_RESOURCE_PATH: &str = "/";

/// Default `User-Agent` sent with the handshake.
pub const DEFAULT_USER_AGENT: &str = concat!(
    env!("CARGO_PKG_NAME"),
    "/",
    env!("CARGO_PKG_VERSION"),
    " websocket-client-async"
);

// ============================================================================
// QueueLimit
// ============================================================================

/// Bound applied to the inbound message queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueLimit {
    /// No bound; the queue grows until drained.
    #[default]
    Unbounded,
    /// At capacity, the oldest undrained message is discarded.
    DropOldest(usize),
    /// At capacity, the newly received message is discarded.
    DropNewest(usize),
}

impl QueueLimit {
    /// Returns the capacity, or `None` if unbounded.
    #[inline]
    #[must_use]
    pub const fn capacity(self) -> Option<usize> {
        match self {
            Self::Unbounded => None,
            Self::DropOldest(n) | Self::DropNewest(n) => Some(n),
        }
    }
}

// ============================================================================
// SessionOptions
// ============================================================================

/// Client session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Bound on the whole transport connect step, across all endpoints.
    pub connect_timeout_ms: u64,

    /// Bound on the upgrade handshake.
    pub handshake_timeout_ms: u64,

    /// Resource path requested in the handshake.
    pub resource_path: String,

    /// Value of the handshake's `User-Agent` header.
    pub user_agent: String,

    /// Inbound queue bound.
    pub inbound_limit: QueueLimit,

    /// Maximum queued outbound messages (including the one in flight).
    pub outbound_limit: Option<usize>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl SessionOptions {
    /// Creates options with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            handshake_timeout_ms: DEFAULT_HANDSHAKE_TIMEOUT_MS,
            resource_path: DEFAULT_RESOURCE_PATH.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            inbound_limit: QueueLimit::Unbounded,
            outbound_limit: None,
        }
    }

    /// Parses options from a JSON document and validates them.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the document is malformed
    /// - [`Error::Config`] if validation fails
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl SessionOptions {
    /// Sets the transport connect timeout in milliseconds.
    #[inline]
    #[must_use]
    pub fn with_connect_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.connect_timeout_ms = timeout_ms;
        self
    }

    /// Sets the handshake timeout in milliseconds.
    #[inline]
    #[must_use]
    pub fn with_handshake_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.handshake_timeout_ms = timeout_ms;
        self
    }

    /// Sets the resource path requested in the handshake.
    #[inline]
    #[must_use]
    pub fn with_resource_path(mut self, path: impl Into<String>) -> Self {
        self.resource_path = path.into();
        self
    }

    /// Sets the handshake `User-Agent`.
    #[inline]
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets the inbound queue bound.
    #[inline]
    #[must_use]
    pub fn with_inbound_limit(mut self, limit: QueueLimit) -> Self {
        self.inbound_limit = limit;
        self
    }

    /// Bounds the outbound queue.
    #[inline]
    #[must_use]
    pub fn with_outbound_limit(mut self, capacity: usize) -> Self {
        self.outbound_limit = Some(capacity);
        self
    }
}

// ============================================================================
// Accessors
// ============================================================================

impl SessionOptions {
    /// Returns the connect timeout as a [`Duration`].
    #[inline]
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Returns the handshake timeout as a [`Duration`].
    #[inline]
    #[must_use]
    pub const fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.connect_timeout_ms == 0 {
            return Err(Error::config("connect_timeout_ms must be greater than zero"));
        }
        if self.handshake_timeout_ms == 0 {
            return Err(Error::config(
                "handshake_timeout_ms must be greater than zero",
            ));
        }
        if !self.resource_path.starts_with('/') {
            return Err(Error::config(format!(
                "resource_path must start with '/': {:?}",
                self.resource_path
            )));
        }
        if self.user_agent.trim().is_empty() {
            return Err(Error::config("user_agent must not be empty"));
        }
        if self.inbound_limit.capacity() == Some(0) {
            return Err(Error::config("inbound_limit capacity must be greater than zero"));
        }
        if self.outbound_limit == Some(0) {
            return Err(Error::config("outbound_limit must be greater than zero"));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

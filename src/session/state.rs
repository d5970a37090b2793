//! Connection lifecycle states.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

// ============================================================================
// ConnectionState
// ============================================================================

/// Lifecycle phase of a [`ClientSession`](crate::ClientSession).
///
/// ```text
///                 connect()
/// DISCONNECTED ──────────────► CONNECTING
///      ▲   ▲                       │ handshake ok
///      │   └── resolve/connect/    ▼
///      │       handshake error  CONNECTED ──── read error ───► DISCONNECTED
///      │                           │ clean end-of-stream
///      │                           ▼
///      └──── close completes ── DISCONNECTING
/// ```
///
/// A transport handle exists exactly while the state is
/// [`Connecting`](Self::Connecting), [`Connected`](Self::Connected) or
/// [`Disconnecting`](Self::Disconnecting).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No transport. Initial state, and the end of every connection cycle.
    #[default]
    Disconnected,
    /// Resolving, connecting or performing the upgrade handshake.
    Connecting,
    /// Handshake complete; frames are being exchanged.
    Connected,
    /// Peer closed cleanly; our close handshake is in progress.
    Disconnecting,
}

impl ConnectionState {
    /// Returns `true` if a transport handle is held in this state.
    #[inline]
    #[must_use]
    pub const fn has_transport(self) -> bool {
        !matches!(self, Self::Disconnected)
    }

    /// Returns `true` if messages may be sent in this state.
    #[inline]
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Returns the upper-case name used in logs.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "DISCONNECTED",
            Self::Connecting => "CONNECTING",
            Self::Connected => "CONNECTED",
            Self::Disconnecting => "DISCONNECTING",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================

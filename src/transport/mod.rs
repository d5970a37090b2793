//! WebSocket transport layer.
//!
//! This module performs the I/O requested by the session state machine:
//! name resolution, the TCP connect, the WebSocket upgrade, and frame
//! reads and writes.
//!
//! # Connection Lifecycle
//!
//! 1. `Link::spawn` - Allocate a transport handle for a new connection cycle
//! 2. `Resolver::resolve` - Turn host/port into candidate endpoints
//! 3. TCP connect - First reachable endpoint, bounded by the connect timeout
//! 4. WebSocket upgrade - `User-Agent` and resource path from the options
//! 5. Read/write loop - One read outstanding, writes serialized
//! 6. `Link` dropped - Task aborted, socket closed
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `link` | Per-cycle transport task |
//! | `resolver` | Host name resolution |

// ============================================================================
// Submodules
// ============================================================================

/// Per-cycle transport task.
pub mod link;

/// Host name resolution.
pub mod resolver;

// ============================================================================
// Re-exports
// ============================================================================

pub use link::Link;
pub use resolver::{Resolver, StaticResolver, SystemResolver};

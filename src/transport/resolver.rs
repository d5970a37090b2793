//! Host name resolution.
//!
//! The session resolves through a [`Resolver`] so that lookups can be served
//! from the operating system ([`SystemResolver`]) or from a fixed table
//! ([`StaticResolver`]).

// ============================================================================
// Imports
// ============================================================================

use std::collections::HashMap;
use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::net::lookup_host;
use tracing::trace;

use crate::error::{Error, Result};

// ============================================================================
// Resolver
// ============================================================================

/// Asynchronous host/port to endpoint resolution.
#[async_trait]
pub trait Resolver: Send + Sync + 'static {
    /// Resolves `host` and `port` to candidate endpoints, in preference order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resolve`] if the lookup fails.
    async fn resolve(&self, host: &str, port: &str) -> Result<Vec<SocketAddr>>;
}

// ============================================================================
// SystemResolver
// ============================================================================

/// Well-known service names accepted in place of a numeric port.
const SERVICES: &[(&str, u16)] = &[("http", 80), ("ws", 80), ("https", 443), ("wss", 443)];

/// Resolves through the operating system.
///
/// The port is either numeric or one of the service names `http`, `ws`,
/// `https` and `wss`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

/// Maps a numeric port or a well-known service name to a port number.
fn service_port(port: &str) -> Option<u16> {
    port.parse().ok().or_else(|| {
        SERVICES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(port))
            .map(|&(_, number)| number)
    })
}

#[async_trait]
impl Resolver for SystemResolver {
    async fn resolve(&self, host: &str, port: &str) -> Result<Vec<SocketAddr>> {
        let port_number = service_port(port)
            .ok_or_else(|| Error::resolve(host, port, "unknown service or port out of range"))?;

        let endpoints: Vec<SocketAddr> = lookup_host((host, port_number))
            .await
            .map_err(|e| Error::resolve(host, port, e.to_string()))?
            .collect();

        trace!(host, port, count = endpoints.len(), "System lookup finished");
        Ok(endpoints)
    }
}

// ============================================================================
// StaticResolver
// ============================================================================

/// Resolves from a fixed host table.
///
/// Entries pin complete socket addresses; the requested port is ignored.
///
/// # Example
///
/// ```
/// use ws_client_session::StaticResolver;
///
/// let resolver = StaticResolver::new()
///     .with_host("example.org", "127.0.0.1:9001".parse().unwrap());
/// assert_eq!(resolver.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    hosts: HashMap<String, Vec<SocketAddr>>,
}

impl StaticResolver {
    /// Creates an empty table.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an endpoint for `host`. Repeated calls append candidates.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>, addr: SocketAddr) -> Self {
        self.hosts.entry(host.into()).or_default().push(addr);
        self
    }

    /// Returns the number of hosts in the table.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    /// Returns `true` if the table is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

#[async_trait]
impl Resolver for StaticResolver {
    async fn resolve(&self, host: &str, port: &str) -> Result<Vec<SocketAddr>> {
        self.hosts
            .get(host)
            .cloned()
            .ok_or_else(|| Error::resolve(host, port, "host not in static table"))
    }
}

// ============================================================================
// Tests
// ============================================================================

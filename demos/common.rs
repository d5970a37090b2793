//! Shared utilities for demos.
//!
//! Provides common functionality used across the demos:
//! - Command-line argument parsing
//! - Logging initialization

#![allow(dead_code)]

// ============================================================================
// Imports
// ============================================================================

use tracing_subscriber::EnvFilter;

// ============================================================================
// Constants
// ============================================================================

/// Host used when none is given.
pub const DEFAULT_HOST: &str = "echo.websocket.org";

/// Port used when none is given.
pub const DEFAULT_PORT: &str = "80";

/// Message sent in reply to every received message.
pub const DEFAULT_TEXT: &str = "Hello world!";

// ============================================================================
// Types
// ============================================================================

/// Command-line arguments for demos.
///
/// Positional: `[host] [port] [text]`. Flags: `--debug`, `--once`.
#[derive(Debug, Clone)]
pub struct Args {
    pub host: String,
    pub port: String,
    pub text: String,
    pub debug: bool,
    pub once: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse() -> Self {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut positional = args.iter().filter(|a| !a.starts_with("--"));

        Self {
            host: positional
                .next()
                .cloned()
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: positional
                .next()
                .cloned()
                .unwrap_or_else(|| DEFAULT_PORT.to_string()),
            text: positional
                .next()
                .cloned()
                .unwrap_or_else(|| DEFAULT_TEXT.to_string()),
            debug: args.iter().any(|a| a == "--debug"),
            once: args.iter().any(|a| a == "--once"),
        }
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Initialize tracing/logging.
pub fn init_logging(debug: bool) {
    let filter = if debug {
        "ws_client_session=trace"
    } else {
        "ws_client_session=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

//! Echo client main loop.
//!
//! Demonstrates:
//! - Building a session with an error handler
//! - Reconnecting whenever the session is `Disconnected`
//! - Printing each received message and replying to it
//! - Driving the session from a fixed-rate tick
//!
//! Usage:
//!   cargo run --example echo_client
//!   cargo run --example echo_client -- 127.0.0.1 9001 "ping"
//!   cargo run --example echo_client -- --debug
//!   cargo run --example echo_client -- --once

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use common::Args;
use tokio::time::{MissedTickBehavior, interval};
use ws_client_session::{ClientSession, ConnectionState, Result};

// ============================================================================
// Constants
// ============================================================================

const TICK: Duration = Duration::from_millis(10);

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    println!("=== Echo Client: {}:{} ===\n", args.host, args.port);

    let mut session = ClientSession::builder()
        .error_handler(|err| eprintln!("[error] {err}"))
        .build()?;

    let mut ticker = interval(TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut received = 0usize;

    loop {
        match session.get_socket_state() {
            ConnectionState::Disconnected => {
                if args.once && session.cycles() > 0 {
                    break;
                }
                println!("[connect] cycle {}", session.cycles() + 1);
                session.connect(&args.host, &args.port)?;
            }

            ConnectionState::Connected => {
                while let Some(message) = session.get_last_message() {
                    received += 1;
                    println!("[recv #{received}] {message}");
                    session.send_message(args.text.as_str())?;
                }
            }

            ConnectionState::Connecting | ConnectionState::Disconnecting => {}
        }

        tokio::select! {
            _ = ticker.tick() => {
                session.poll();
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\n[exit] interrupted");
                break;
            }
        }
    }

    println!("[done] {received} messages received");
    Ok(())
}

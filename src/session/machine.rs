//! Sans-IO connection state machine.
//!
//! [`SessionMachine`] holds every piece of session state and decides what
//! happens next, but performs no I/O itself. Callers feed it requests
//! ([`connect`](SessionMachine::connect), [`send`](SessionMachine::send)) and
//! I/O completions ([`step`](SessionMachine::step)); it answers with the
//! [`Action`]s the driver must carry out.
//!
//! # Read Discipline
//!
//! While `Connected`, exactly one read is outstanding. The handshake
//! completion issues the first [`IoRequest::Read`], and every delivered frame
//! issues the next one. Any other read completion ends the read chain.
//!
//! # Stale Completions
//!
//! A completion that does not match what the machine is waiting for (for
//! example a write completion after the session was reset) is ignored.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::mem;
use std::net::SocketAddr;
use std::time::Duration;

use tracing::{debug, info, trace, warn};

use crate::error::{Error, Result};

use super::options::{QueueLimit, SessionOptions};
use super::state::ConnectionState;

// ============================================================================
// Completion
// ============================================================================

/// Result of an I/O operation previously requested through an [`IoRequest`].
#[derive(Debug)]
pub enum Completion {
    /// Name resolution finished.
    Resolved(Result<Vec<SocketAddr>>),
    /// Transport connect finished; carries the endpoint that accepted.
    TransportConnected(Result<SocketAddr>),
    /// Upgrade handshake finished.
    Handshake(Result<()>),
    /// The outstanding read finished.
    Read(ReadOutcome),
    /// The in-flight write finished.
    Write(Result<()>),
    /// The close handshake finished.
    Closed(Result<()>),
}

/// Outcome of a single read.
#[derive(Debug)]
pub enum ReadOutcome {
    /// A complete message arrived.
    Frame(String),
    /// The peer closed the connection according to protocol.
    EndOfStream,
    /// The read failed for any other reason.
    Failed(Error),
}

// ============================================================================
// Action
// ============================================================================

/// Work the driver must perform on behalf of the machine.
#[derive(Debug)]
pub enum Action {
    /// Hand an I/O request to the transport.
    Io(IoRequest),
    /// Drop the transport handle.
    Release,
    /// Deliver an error to the error side channel.
    Report(Error),
}

/// I/O operation executed by the transport handle.
///
/// Each request is answered by exactly one [`Completion`], except
/// [`IoRequest::Read`], which stays outstanding across control frames.
#[derive(Debug)]
pub enum IoRequest {
    /// Resolve `host`/`port` to candidate endpoints.
    Resolve {
        /// Host to look up.
        host: String,
        /// Port or service to look up.
        port: String,
    },
    /// Connect to the first reachable endpoint within `timeout`.
    ConnectTransport {
        /// Candidate endpoints, in preference order.
        endpoints: Vec<SocketAddr>,
        /// Bound on the whole connect step.
        timeout: Duration,
    },
    /// Perform the WebSocket upgrade over the connected transport.
    Handshake {
        /// Host the request targets.
        host: String,
        /// Port of the endpoint that accepted the transport.
        port: u16,
        /// Resource path requested.
        path: String,
        /// `User-Agent` header value.
        user_agent: String,
        /// Bound on the handshake.
        timeout: Duration,
    },
    /// Issue one read.
    Read,
    /// Write one text message.
    Write(String),
    /// Start the close handshake with a normal close code.
    Close,
}

// ============================================================================
// Connect Steps
// ============================================================================

/// Which connect-phase operation is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectStep {
    Resolve,
    Transport,
    Handshake,
}

// ============================================================================
// SessionMachine
// ============================================================================

/// State of one client session, independent of any I/O runtime.
#[derive(Debug)]
pub struct SessionMachine {
    options: SessionOptions,
    state: ConnectionState,
    /// Outstanding connect-phase operation while `Connecting`.
    connect_step: Option<ConnectStep>,
    host: String,
    port: String,
    inbound: VecDeque<String>,
    /// Messages waiting behind the in-flight write.
    outbound: VecDeque<String>,
    write_in_flight: bool,
    reads_outstanding: usize,
    /// Accumulates the frame currently being received.
    scratch: String,
    dropped: u64,
}

impl SessionMachine {
    /// Creates a disconnected machine.
    #[must_use]
    pub fn new(options: SessionOptions) -> Self {
        Self {
            options,
            state: ConnectionState::Disconnected,
            connect_step: None,
            host: String::new(),
            port: String::new(),
            inbound: VecDeque::new(),
            outbound: VecDeque::new(),
            write_in_flight: false,
            reads_outstanding: 0,
            scratch: String::new(),
            dropped: 0,
        }
    }
}

// ============================================================================
// SessionMachine - Accessors
// ============================================================================

impl SessionMachine {
    /// Returns the current lifecycle state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// Returns the host of the current or last connection cycle.
    #[inline]
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port of the current or last connection cycle.
    #[inline]
    #[must_use]
    pub fn port(&self) -> &str {
        &self.port
    }

    /// Returns the options this machine was built with.
    #[inline]
    #[must_use]
    pub const fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Returns the number of reads currently outstanding (0 or 1).
    #[inline]
    #[must_use]
    pub const fn pending_reads(&self) -> usize {
        self.reads_outstanding
    }

    /// Returns `true` if a write has been issued and not yet completed.
    #[inline]
    #[must_use]
    pub const fn write_in_flight(&self) -> bool {
        self.write_in_flight
    }

    /// Returns the number of received messages not yet drained.
    #[inline]
    #[must_use]
    pub fn inbound_len(&self) -> usize {
        self.inbound.len()
    }

    /// Returns the number of messages queued behind the in-flight write.
    #[inline]
    #[must_use]
    pub fn outbound_len(&self) -> usize {
        self.outbound.len()
    }

    /// Returns how many inbound messages the queue bound has discarded.
    #[inline]
    #[must_use]
    pub const fn dropped_messages(&self) -> u64 {
        self.dropped
    }
}

// ============================================================================
// SessionMachine - Requests
// ============================================================================

impl SessionMachine {
    /// Starts a connection cycle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectInProgress`] unless the state is
    /// `Disconnected`. The current cycle is left untouched.
    pub fn connect(&mut self, host: &str, port: &str) -> Result<Vec<Action>> {
        if self.state != ConnectionState::Disconnected {
            return Err(Error::connect_in_progress(self.state));
        }

        host.clone_into(&mut self.host);
        port.clone_into(&mut self.port);
        self.scratch.clear();
        self.transition(ConnectionState::Connecting);
        self.connect_step = Some(ConnectStep::Resolve);

        Ok(vec![Action::Io(IoRequest::Resolve {
            host: self.host.clone(),
            port: self.port.clone(),
        })])
    }

    /// Queues a text message for sending.
    ///
    /// Only one write is in flight at a time; later messages wait in FIFO
    /// order and are written as earlier ones complete.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] unless the state is `Connected`
    /// - [`Error::OutboundQueueFull`] if the outbound bound is reached
    pub fn send(&mut self, message: String) -> Result<Vec<Action>> {
        if !self.state.is_connected() {
            return Err(Error::not_connected(self.state));
        }

        if let Some(capacity) = self.options.outbound_limit {
            let queued = self.outbound.len() + usize::from(self.write_in_flight);
            if queued >= capacity {
                return Err(Error::outbound_queue_full(capacity));
            }
        }

        if self.write_in_flight {
            self.outbound.push_back(message);
            trace!(queued = self.outbound.len(), "Write queued behind in-flight write");
            return Ok(Vec::new());
        }

        self.write_in_flight = true;
        Ok(vec![Action::Io(IoRequest::Write(message))])
    }

    /// Removes and returns the oldest received message, if any.
    ///
    /// Never blocks and never changes the lifecycle state.
    #[inline]
    pub fn next_message(&mut self) -> Option<String> {
        self.inbound.pop_front()
    }

    /// Abandons the current connection cycle.
    ///
    /// Returns [`Action::Release`] if a transport was held. Undrained inbound
    /// messages are kept; queued outbound messages are discarded.
    pub fn reset(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.state.has_transport() {
            self.disconnect(&mut actions);
        }
        actions
    }
}

// ============================================================================
// SessionMachine - Completions
// ============================================================================

impl SessionMachine {
    /// Advances the machine with one I/O completion.
    pub fn step(&mut self, completion: Completion) -> Vec<Action> {
        let mut actions = Vec::new();

        match completion {
            Completion::Resolved(result) => self.on_resolved(result, &mut actions),
            Completion::TransportConnected(result) => self.on_connected(result, &mut actions),
            Completion::Handshake(result) => self.on_handshake(result, &mut actions),
            Completion::Read(outcome) => self.on_read(outcome, &mut actions),
            Completion::Write(result) => self.on_write(result, &mut actions),
            Completion::Closed(result) => self.on_closed(result, &mut actions),
        }

        actions
    }

    fn on_resolved(&mut self, result: Result<Vec<SocketAddr>>, actions: &mut Vec<Action>) {
        if !self.expecting(ConnectStep::Resolve) {
            trace!(state = %self.state, "Ignoring stale resolve completion");
            return;
        }

        match result {
            Ok(endpoints) if endpoints.is_empty() => {
                let err = Error::resolve(&self.host, &self.port, "no addresses found");
                self.fail(err, actions);
            }
            Ok(endpoints) => {
                debug!(host = %self.host, count = endpoints.len(), "Host resolved");
                self.connect_step = Some(ConnectStep::Transport);
                actions.push(Action::Io(IoRequest::ConnectTransport {
                    endpoints,
                    timeout: self.options.connect_timeout(),
                }));
            }
            Err(err) => self.fail(err, actions),
        }
    }

    fn on_connected(&mut self, result: Result<SocketAddr>, actions: &mut Vec<Action>) {
        if !self.expecting(ConnectStep::Transport) {
            trace!(state = %self.state, "Ignoring stale connect completion");
            return;
        }

        match result {
            Ok(addr) => {
                debug!(%addr, "Transport connected");
                self.connect_step = Some(ConnectStep::Handshake);
                actions.push(Action::Io(IoRequest::Handshake {
                    host: self.host.clone(),
                    port: addr.port(),
                    path: self.options.resource_path.clone(),
                    user_agent: self.options.user_agent.clone(),
                    timeout: self.options.handshake_timeout(),
                }));
            }
            Err(err) => self.fail(err, actions),
        }
    }

    fn on_handshake(&mut self, result: Result<()>, actions: &mut Vec<Action>) {
        if !self.expecting(ConnectStep::Handshake) {
            trace!(state = %self.state, "Ignoring stale handshake completion");
            return;
        }

        match result {
            Ok(()) => {
                self.connect_step = None;
                self.transition(ConnectionState::Connected);
                info!(host = %self.host, port = %self.port, "WebSocket connection established");
                self.issue_read(actions);
            }
            Err(err) => self.fail(err, actions),
        }
    }

    fn on_read(&mut self, outcome: ReadOutcome, actions: &mut Vec<Action>) {
        if !self.state.is_connected() || self.reads_outstanding == 0 {
            trace!(state = %self.state, "Ignoring stale read completion");
            return;
        }
        self.reads_outstanding -= 1;

        match outcome {
            ReadOutcome::Frame(text) => {
                trace!(len = text.len(), "Frame received");
                self.scratch.push_str(&text);
                let message = mem::take(&mut self.scratch);
                self.enqueue(message);
                self.issue_read(actions);
            }
            ReadOutcome::EndOfStream => {
                if !self.scratch.is_empty() {
                    let partial = mem::take(&mut self.scratch);
                    self.enqueue(partial);
                }
                debug!("Peer closed the connection");
                self.transition(ConnectionState::Disconnecting);
                actions.push(Action::Io(IoRequest::Close));
            }
            ReadOutcome::Failed(err) => self.fail(err, actions),
        }
    }

    fn on_write(&mut self, result: Result<()>, actions: &mut Vec<Action>) {
        if !self.state.has_transport() || !self.write_in_flight {
            trace!(state = %self.state, "Ignoring stale write completion");
            return;
        }
        self.write_in_flight = false;

        if let Err(err) = result {
            actions.push(Action::Report(err));
        }

        if self.state.is_connected()
            && let Some(next) = self.outbound.pop_front()
        {
            self.write_in_flight = true;
            actions.push(Action::Io(IoRequest::Write(next)));
        }
    }

    fn on_closed(&mut self, result: Result<()>, actions: &mut Vec<Action>) {
        if self.state != ConnectionState::Disconnecting {
            trace!(state = %self.state, "Ignoring stale close completion");
            return;
        }

        if let Err(err) = result {
            actions.push(Action::Report(err));
        }
        self.disconnect(actions);
    }
}

// ============================================================================
// SessionMachine - Internals
// ============================================================================

impl SessionMachine {
    fn expecting(&self, step: ConnectStep) -> bool {
        self.state == ConnectionState::Connecting && self.connect_step == Some(step)
    }

    fn issue_read(&mut self, actions: &mut Vec<Action>) {
        debug_assert_eq!(self.reads_outstanding, 0);
        self.reads_outstanding = 1;
        actions.push(Action::Io(IoRequest::Read));
    }

    fn enqueue(&mut self, message: String) {
        match self.options.inbound_limit {
            QueueLimit::Unbounded => {}
            QueueLimit::DropOldest(capacity) => {
                if self.inbound.len() >= capacity {
                    self.inbound.pop_front();
                    self.dropped += 1;
                    warn!(capacity, dropped = self.dropped, "Inbound queue full, dropped oldest");
                }
            }
            QueueLimit::DropNewest(capacity) => {
                if self.inbound.len() >= capacity {
                    self.dropped += 1;
                    warn!(capacity, dropped = self.dropped, "Inbound queue full, dropped newest");
                    return;
                }
            }
        }
        self.inbound.push_back(message);
    }

    /// Reports `err` and ends the cycle without a close handshake.
    fn fail(&mut self, err: Error, actions: &mut Vec<Action>) {
        actions.push(Action::Report(err));
        self.disconnect(actions);
    }

    fn disconnect(&mut self, actions: &mut Vec<Action>) {
        self.transition(ConnectionState::Disconnected);
        self.connect_step = None;
        self.reads_outstanding = 0;
        self.write_in_flight = false;
        self.outbound.clear();
        self.scratch.clear();
        actions.push(Action::Release);
    }

    fn transition(&mut self, to: ConnectionState) {
        debug!(from = %self.state, %to, "State transition");
        self.state = to;
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Poll-driven client session.
//!
//! [`ClientSession`] pairs a [`SessionMachine`] with a per-cycle transport
//! [`Link`]. The caller owns the tick: it calls [`poll`](ClientSession::poll)
//! (or awaits [`tick`](ClientSession::tick)) to let completed I/O advance the
//! session, and inspects [`get_socket_state`](ClientSession::get_socket_state)
//! to decide what to do next.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use ws_client_session::{ClientSession, ConnectionState};
//!
//! # async fn example() -> ws_client_session::Result<()> {
//! let mut session = ClientSession::builder()
//!     .error_handler(|err| eprintln!("session error: {err}"))
//!     .build()?;
//!
//! loop {
//!     match session.get_socket_state() {
//!         ConnectionState::Disconnected => session.connect("echo.websocket.org", "80")?,
//!         ConnectionState::Connected => {
//!             if let Some(message) = session.get_last_message() {
//!                 println!("{message}");
//!                 session.send_message("Hello world!")?;
//!             }
//!         }
//!         ConnectionState::Connecting | ConnectionState::Disconnecting => {}
//!     }
//!
//!     session.poll();
//!     tokio::time::sleep(Duration::from_millis(10)).await;
//! }
//! # }
//! ```
//!
//! # Serialization
//!
//! Every operation takes `&mut self`, so the machine is only ever advanced
//! by one caller at a time. I/O runs on the runtime's worker tasks, but its
//! results only take effect when the caller polls.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::io;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::transport::{Link, Resolver, SystemResolver};

use super::machine::{Action, Completion, IoRequest, SessionMachine};
use super::options::SessionOptions;
use super::state::ConnectionState;

// ============================================================================
// Types
// ============================================================================

/// Error side channel callback.
///
/// Called once for every resolve, connect, handshake, read, write and close
/// failure.
pub type ErrorHandler = Box<dyn FnMut(&Error) + Send>;

// ============================================================================
// ClientSession
// ============================================================================

/// Single-connection WebSocket client session.
///
/// One session object serves every reconnect: each [`connect`](Self::connect)
/// allocates a fresh transport handle, and the previous one is discarded when
/// its cycle ends.
pub struct ClientSession {
    /// Runtime the transport tasks are spawned on.
    runtime: Handle,
    /// Name resolution for `connect`.
    resolver: Arc<dyn Resolver>,
    /// Connection state and message queues.
    machine: SessionMachine,
    /// Transport handle of the current cycle.
    link: Option<Link>,
    /// Error side channel.
    error_handler: Option<ErrorHandler>,
    /// Connect cycles started so far.
    cycles: u64,
}

// ============================================================================
// ClientSession - Constructors
// ============================================================================

impl ClientSession {
    /// Creates a session with default options and the system resolver.
    #[must_use]
    pub fn new(runtime: Handle) -> Self {
        Self::from_parts(runtime, SessionOptions::new(), Arc::new(SystemResolver), None)
    }

    /// Creates a builder for a configured session.
    #[inline]
    #[must_use]
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    fn from_parts(
        runtime: Handle,
        options: SessionOptions,
        resolver: Arc<dyn Resolver>,
        error_handler: Option<ErrorHandler>,
    ) -> Self {
        Self {
            runtime,
            resolver,
            machine: SessionMachine::new(options),
            link: None,
            error_handler,
            cycles: 0,
        }
    }
}

// ============================================================================
// ClientSession - Public API
// ============================================================================

impl ClientSession {
    /// Starts connecting to `host`:`port`.
    ///
    /// Progress and failures are observed through
    /// [`get_socket_state`](Self::get_socket_state) and the error handler.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectInProgress`] unless the session is
    /// `Disconnected`.
    pub fn connect(&mut self, host: &str, port: &str) -> Result<()> {
        let actions = self.machine.connect(host, port)?;

        self.link = None;
        self.cycles += 1;
        self.link = Some(Link::spawn(
            &self.runtime,
            Arc::clone(&self.resolver),
            self.cycles,
            host,
        ));

        debug!(host, port, cycle = self.cycles, "Connecting");
        self.execute(actions);
        Ok(())
    }

    /// Queues a text message for sending.
    ///
    /// Messages are written one at a time in the order they were queued.
    /// Write failures go to the error handler and leave the connection up.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] unless the session is `Connected`
    /// - [`Error::OutboundQueueFull`] if the outbound bound is reached
    pub fn send_message(&mut self, message: impl Into<String>) -> Result<()> {
        let actions = self.machine.send(message.into())?;
        self.execute(actions);
        Ok(())
    }

    /// Removes and returns the oldest received message.
    ///
    /// Returns `None` when nothing is pending. Never blocks.
    #[inline]
    pub fn get_last_message(&mut self) -> Option<String> {
        self.machine.next_message()
    }

    /// Returns the current lifecycle state.
    #[inline]
    #[must_use]
    pub fn get_socket_state(&self) -> ConnectionState {
        self.machine.state()
    }

    /// Applies every I/O completion that has already arrived.
    ///
    /// Never blocks. Returns the number of completions processed.
    pub fn poll(&mut self) -> usize {
        let mut processed = 0;

        while let Some(link) = self.link.as_mut() {
            match link.try_completion() {
                Ok(completion) => {
                    self.apply(completion);
                    processed += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.abandon();
                    break;
                }
            }
        }

        processed
    }

    /// Waits for at least one I/O completion, then applies every completion
    /// that has arrived.
    ///
    /// Returns `0` immediately if no transport is held.
    pub async fn tick(&mut self) -> usize {
        let Some(link) = self.link.as_mut() else {
            return 0;
        };

        match link.completion().await {
            Some(completion) => {
                self.apply(completion);
                1 + self.poll()
            }
            None => {
                self.abandon();
                0
            }
        }
    }

    /// Abandons the current connection cycle.
    ///
    /// Drops the transport handle without a close handshake and returns to
    /// `Disconnected`. Undrained inbound messages are kept; queued outbound
    /// messages are discarded.
    pub fn reset(&mut self) {
        let actions = self.machine.reset();
        self.execute(actions);
        self.link = None;
    }

    /// Sets the error side channel, replacing any previous handler.
    pub fn set_error_handler(&mut self, handler: ErrorHandler) {
        self.error_handler = Some(handler);
    }

    /// Removes the error handler. Errors are still logged.
    pub fn clear_error_handler(&mut self) {
        self.error_handler = None;
    }
}

// ============================================================================
// ClientSession - Accessors
// ============================================================================

impl ClientSession {
    /// Returns the host of the current or last connection cycle.
    #[inline]
    #[must_use]
    pub fn host(&self) -> &str {
        self.machine.host()
    }

    /// Returns the port of the current or last connection cycle.
    #[inline]
    #[must_use]
    pub fn port(&self) -> &str {
        self.machine.port()
    }

    /// Returns the number of connection cycles started.
    #[inline]
    #[must_use]
    pub const fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Returns the number of received messages not yet drained.
    #[inline]
    #[must_use]
    pub fn pending_messages(&self) -> usize {
        self.machine.inbound_len()
    }

    /// Returns how many inbound messages the queue bound has discarded.
    #[inline]
    #[must_use]
    pub const fn dropped_messages(&self) -> u64 {
        self.machine.dropped_messages()
    }

    /// Returns `true` if a transport handle is held.
    #[inline]
    #[must_use]
    pub const fn has_transport(&self) -> bool {
        self.link.is_some()
    }

    /// Returns the session options.
    #[inline]
    #[must_use]
    pub const fn options(&self) -> &SessionOptions {
        self.machine.options()
    }
}

// ============================================================================
// ClientSession - Internals
// ============================================================================

impl ClientSession {
    fn apply(&mut self, completion: Completion) {
        let actions = self.machine.step(completion);
        self.execute(actions);
    }

    fn execute(&mut self, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::Io(request) => self.submit(request),
                Action::Release => self.link = None,
                Action::Report(err) => self.report(&err),
            }
        }
    }

    fn submit(&mut self, request: IoRequest) {
        let delivered = self.link.as_ref().is_some_and(|link| link.submit(request));
        if !delivered {
            self.abandon();
        }
    }

    fn report(&mut self, err: &Error) {
        warn!(
            cycle = self.cycles,
            state = %self.machine.state(),
            error = %err,
            "Session error"
        );

        if let Some(handler) = self.error_handler.as_mut() {
            handler(err);
        }
    }

    /// Ends the cycle after the transport task stopped on its own.
    fn abandon(&mut self) {
        if self.machine.state().has_transport() {
            self.report(&Error::Io(io::Error::other("transport task stopped")));
            let actions = self.machine.reset();
            self.execute(actions);
        }
        self.link = None;
    }
}

impl fmt::Debug for ClientSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSession")
            .field("state", &self.machine.state())
            .field("host", &self.machine.host())
            .field("port", &self.machine.port())
            .field("cycles", &self.cycles)
            .field("pending_messages", &self.machine.inbound_len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SessionBuilder
// ============================================================================

/// Builder for configuring a [`ClientSession`].
///
/// Use [`ClientSession::builder()`] to create a new builder.
#[derive(Default)]
pub struct SessionBuilder {
    /// Runtime for transport tasks.
    runtime: Option<Handle>,
    /// Session options.
    options: SessionOptions,
    /// Name resolution.
    resolver: Option<Arc<dyn Resolver>>,
    /// Error side channel.
    error_handler: Option<ErrorHandler>,
}

impl SessionBuilder {
    /// Creates a builder with default options.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime transport tasks are spawned on.
    ///
    /// Defaults to the runtime [`build`](Self::build) is called from.
    #[inline]
    #[must_use]
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Sets the session options.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the resolver. Defaults to [`SystemResolver`].
    #[inline]
    #[must_use]
    pub fn resolver(mut self, resolver: impl Resolver) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Sets the error side channel.
    #[inline]
    #[must_use]
    pub fn error_handler(mut self, handler: impl FnMut(&Error) + Send + 'static) -> Self {
        self.error_handler = Some(Box::new(handler));
        self
    }

    /// Builds the session with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the options are invalid
    /// - [`Error::Config`] if no runtime was set and none is running
    pub fn build(self) -> Result<ClientSession> {
        self.options.validate()?;

        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|_| {
                Error::config(
                    "No tokio runtime available. Use .runtime() to set one.\n\
                     Example: ClientSession::builder().runtime(runtime.handle().clone())",
                )
            })?,
        };

        let resolver = self
            .resolver
            .unwrap_or_else(|| Arc::new(SystemResolver) as Arc<dyn Resolver>);

        Ok(ClientSession::from_parts(
            runtime,
            self.options,
            resolver,
            self.error_handler,
        ))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::future::Future;
    use std::net::SocketAddr;
    use std::time::Duration;

    use futures_util::{SinkExt, StreamExt};
    use parking_lot::Mutex;
    use tokio::io::AsyncWriteExt;
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::oneshot;
    use tokio::time::{sleep, timeout};
    use tokio_tungstenite::tungstenite::Message;
    use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};
    use tokio_tungstenite::{WebSocketStream, accept_async, accept_hdr_async};

    use crate::transport::StaticResolver;

    const TEST_TIMEOUT: Duration = Duration::from_secs(10);

    type Errors = Arc<Mutex<Vec<String>>>;

    /// Accepts one WebSocket client and hands it to `handler`.
    async fn serve_once<F, Fut>(handler: F) -> SocketAddr
    where
        F: FnOnce(WebSocketStream<TcpStream>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            let ws = accept_async(stream).await.expect("upgrade");
            handler(ws).await;
        });

        addr
    }

    /// Builds a session whose `example.org` resolves to `addr`.
    fn session_for(addr: SocketAddr) -> (ClientSession, Errors) {
        session_with(addr, SessionOptions::new())
    }

    fn session_with(addr: SocketAddr, options: SessionOptions) -> (ClientSession, Errors) {
        let errors: Errors = Arc::default();
        let sink = Arc::clone(&errors);

        let session = ClientSession::builder()
            .options(options)
            .resolver(StaticResolver::new().with_host("example.org", addr))
            .error_handler(move |err| sink.lock().push(err.to_string()))
            .build()
            .expect("valid session");

        (session, errors)
    }

    /// Ticks until `done` holds.
    async fn drive_until(session: &mut ClientSession, done: impl Fn(&ClientSession) -> bool) {
        timeout(TEST_TIMEOUT, async {
            while !done(&*session) {
                if session.tick().await == 0 {
                    tokio::task::yield_now().await;
                }
            }
        })
        .await
        .expect("condition reached in time");
    }

    fn is_state(state: ConnectionState) -> impl Fn(&ClientSession) -> bool {
        move |session: &ClientSession| session.get_socket_state() == state
    }

    #[tokio::test]
    async fn test_connect_and_receive() {
        let addr = serve_once(|mut ws| async move {
            ws.send(Message::Text("ping".to_string().into())).await.expect("send");
            while ws.next().await.is_some() {}
        })
        .await;
        let (mut session, errors) = session_for(addr);

        assert_eq!(session.get_socket_state(), ConnectionState::Disconnected);
        session.connect("example.org", "80").expect("connect accepted");
        assert_eq!(session.get_socket_state(), ConnectionState::Connecting);
        assert!(session.has_transport());

        drive_until(&mut session, is_state(ConnectionState::Connected)).await;
        drive_until(&mut session, |s| s.pending_messages() > 0).await;

        assert_eq!(session.get_last_message().as_deref(), Some("ping"));
        assert_eq!(session.get_last_message(), None);
        assert_eq!(session.get_last_message(), None);
        assert_eq!(session.get_socket_state(), ConnectionState::Connected);
        assert!(errors.lock().is_empty());
    }

    #[tokio::test]
    async fn test_handshake_identity() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let (seen_tx, seen_rx) = oneshot::channel();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            let callback = move |request: &Request, response: Response| {
                let agent = request
                    .headers()
                    .get("user-agent")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_owned);
                let _ = seen_tx.send((request.uri().path().to_owned(), agent));
                Ok(response)
            };
            let mut ws = accept_hdr_async(stream, callback).await.expect("upgrade");
            while ws.next().await.is_some() {}
        });

        let (mut session, _errors) = session_for(addr);
        session.connect("example.org", "80").expect("connect accepted");
        drive_until(&mut session, is_state(ConnectionState::Connected)).await;

        let (path, agent) = seen_rx.await.expect("handshake observed");
        assert_eq!(path, "/");
        assert!(agent.expect("user agent sent").ends_with("websocket-client-async"));
    }

    #[tokio::test]
    async fn test_send_echo_in_order() {
        let addr = serve_once(|mut ws| async move {
            while let Some(Ok(message)) = ws.next().await {
                if message.is_text() && ws.send(message).await.is_err() {
                    break;
                }
            }
        })
        .await;
        let (mut session, errors) = session_for(addr);

        session.connect("example.org", "80").expect("connect accepted");
        drive_until(&mut session, is_state(ConnectionState::Connected)).await;

        session.send_message("hello").expect("send accepted");
        session.send_message("world").expect("send accepted");
        assert_eq!(session.get_socket_state(), ConnectionState::Connected);

        drive_until(&mut session, |s| s.pending_messages() >= 2).await;
        assert_eq!(session.get_last_message().as_deref(), Some("hello"));
        assert_eq!(session.get_last_message().as_deref(), Some("world"));
        assert!(errors.lock().is_empty());
    }

    #[tokio::test]
    async fn test_peer_close_returns_to_disconnected() {
        let addr = serve_once(|mut ws| async move {
            ws.send(Message::Text("bye".to_string().into())).await.expect("send");
            let _ = ws.close(None).await;
            while ws.next().await.is_some() {}
        })
        .await;
        let (mut session, errors) = session_for(addr);

        session.connect("example.org", "80").expect("connect accepted");
        drive_until(&mut session, is_state(ConnectionState::Connected)).await;
        drive_until(&mut session, is_state(ConnectionState::Disconnected)).await;

        assert!(!session.has_transport());
        assert_eq!(session.get_last_message().as_deref(), Some("bye"));
        assert!(
            errors.lock().iter().all(|e| e.starts_with("Close failed")),
            "unexpected errors: {:?}",
            errors.lock()
        );
    }

    #[tokio::test]
    async fn test_abrupt_drop_is_read_error() {
        let addr = serve_once(|ws| async move {
            drop(ws);
        })
        .await;
        let (mut session, errors) = session_for(addr);

        session.connect("example.org", "80").expect("connect accepted");
        drive_until(&mut session, |s| {
            s.get_socket_state() == ConnectionState::Disconnected
        })
        .await;

        let errors = errors.lock();
        assert_eq!(errors.len(), 1, "errors: {errors:?}");
        assert!(errors[0].starts_with("Read failed"), "errors: {errors:?}");
    }

    #[tokio::test]
    async fn test_handshake_timeout_on_silent_peer() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            sleep(Duration::from_secs(5)).await;
            drop(stream);
        });
        let options = SessionOptions::new().with_handshake_timeout_ms(200);
        let (mut session, errors) = session_with(addr, options);

        session.connect("example.org", "80").expect("connect accepted");
        drive_until(&mut session, is_state(ConnectionState::Disconnected)).await;

        assert!(!session.has_transport());
        assert_eq!(*errors.lock(), vec!["Handshake timeout after 200ms".to_string()]);
    }

    #[tokio::test]
    async fn test_service_name_port_resolves() {
        let errors: Errors = Arc::default();
        let sink = Arc::clone(&errors);
        let mut session = ClientSession::builder()
            .options(
                SessionOptions::new()
                    .with_connect_timeout_ms(500)
                    .with_handshake_timeout_ms(500),
            )
            .error_handler(move |err| sink.lock().push(err.to_string()))
            .build()
            .expect("valid session");

        session.connect("localhost", "http").expect("connect accepted");
        drive_until(&mut session, |s| {
            s.get_socket_state() != ConnectionState::Connecting
        })
        .await;
        session.reset();

        assert!(
            errors.lock().iter().all(|e| !e.starts_with("Failed to resolve")),
            "errors: {:?}",
            errors.lock()
        );
    }

    #[tokio::test]
    async fn test_resolve_failure() {
        let (mut session, errors) = session_for("127.0.0.1:1".parse().unwrap());

        session.connect("nonexistent.invalid", "80").expect("connect accepted");
        drive_until(&mut session, is_state(ConnectionState::Disconnected)).await;

        assert!(!session.has_transport());
        let errors = errors.lock();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Failed to resolve nonexistent.invalid:80"));
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let dead = {
            let scratch = TcpListener::bind("127.0.0.1:0").await.expect("bind");
            scratch.local_addr().expect("addr")
        };
        let (mut session, errors) = session_for(dead);

        session.connect("example.org", "80").expect("connect accepted");
        drive_until(&mut session, is_state(ConnectionState::Disconnected)).await;

        let errors = errors.lock();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Connection failed"), "errors: {errors:?}");
    }

    #[tokio::test]
    async fn test_handshake_rejected() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.expect("accept");
            let _ = stream
                .write_all(b"HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\n\r\n")
                .await;
        });
        let (mut session, errors) = session_for(addr);

        session.connect("example.org", "80").expect("connect accepted");
        drive_until(&mut session, is_state(ConnectionState::Disconnected)).await;

        let errors = errors.lock();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Handshake failed"), "errors: {errors:?}");
    }

    #[tokio::test]
    async fn test_overlapping_connect_rejected() {
        let (mut session, _errors) = session_for("127.0.0.1:1".parse().unwrap());

        session.connect("example.org", "80").expect("connect accepted");
        let err = session.connect("other.example", "81").unwrap_err();

        assert!(matches!(err, Error::ConnectInProgress { .. }));
        assert_eq!(session.host(), "example.org");
        assert_eq!(session.cycles(), 1);
    }

    #[tokio::test]
    async fn test_send_rejected_while_disconnected() {
        let (mut session, _errors) = session_for("127.0.0.1:1".parse().unwrap());

        let err = session.send_message("hello").unwrap_err();
        assert!(matches!(err, Error::NotConnected { .. }));
        assert_eq!(session.get_last_message(), None);
        assert_eq!(session.get_socket_state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_poll_without_transport() {
        let (mut session, _errors) = session_for("127.0.0.1:1".parse().unwrap());
        assert_eq!(session.poll(), 0);
        assert_eq!(session.tick().await, 0);
    }

    #[tokio::test]
    async fn test_poll_driven_loop() {
        let addr = serve_once(|mut ws| async move {
            ws.send(Message::Text("ping".to_string().into())).await.expect("send");
            while ws.next().await.is_some() {}
        })
        .await;
        let (mut session, _errors) = session_for(addr);

        session.connect("example.org", "80").expect("connect accepted");

        let message = timeout(TEST_TIMEOUT, async {
            loop {
                session.poll();
                if let Some(message) = session.get_last_message() {
                    break message;
                }
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("message in time");

        assert_eq!(message, "ping");
        assert_eq!(session.get_socket_state(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_reset_and_reconnect() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let mut greeting = 0;
            while let Ok((stream, _)) = listener.accept().await {
                greeting += 1;
                let text = format!("hello #{greeting}");
                tokio::spawn(async move {
                    let Ok(mut ws) = accept_async(stream).await else {
                        return;
                    };
                    let _ = ws.send(Message::Text(text.into())).await;
                    while ws.next().await.is_some() {}
                });
            }
        });
        let (mut session, _errors) = session_for(addr);

        session.connect("example.org", "80").expect("connect accepted");
        drive_until(&mut session, |s| s.pending_messages() > 0).await;
        assert_eq!(session.get_last_message().as_deref(), Some("hello #1"));

        session.reset();
        assert_eq!(session.get_socket_state(), ConnectionState::Disconnected);
        assert!(!session.has_transport());

        session.connect("example.org", "80").expect("reconnect accepted");
        drive_until(&mut session, |s| s.pending_messages() > 0).await;
        assert_eq!(session.get_last_message().as_deref(), Some("hello #2"));
        assert_eq!(session.cycles(), 2);
    }

    #[test]
    fn test_build_without_runtime() {
        let err = ClientSession::builder().build().unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[tokio::test]
    async fn test_build_rejects_invalid_options() {
        let result = ClientSession::builder()
            .options(SessionOptions::new().with_resource_path("no-slash"))
            .build();
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[tokio::test]
    async fn test_debug_output() {
        let session = ClientSession::new(Handle::current());
        let debug = format!("{session:?}");
        assert!(debug.contains("Disconnected"));
    }
}

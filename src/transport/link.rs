//! Transport handle for one connection cycle.
//!
//! A [`Link`] owns a spawned tokio task that executes [`IoRequest`]s and
//! answers each with a [`Completion`]. The session creates a fresh link for
//! every connect and drops it when the cycle ends; dropping aborts the task
//! and discards any completions it had not yet delivered.
//!
//! # Task Loop
//!
//! ```text
//!  IoRequest ──► command channel ──► ┌──────────────────────┐
//!                                    │  resolve / connect / │
//!                                    │  handshake (in turn) │
//!                                    │                      │──► completion channel ──► Completion
//!  peer frames ─────────────────────►│  read ∥ write/close  │
//!                                    └──────────────────────┘
//! ```
//!
//! Connect-phase requests are awaited one at a time. Once the handshake has
//! produced a stream, the outstanding read runs alongside incoming write and
//! close requests.

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::header::{HeaderValue, USER_AGENT};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{WebSocketStream, client_async};
use tracing::{Instrument, debug, info_span, trace};
use url::Url;

use crate::error::{Error, Result};
use crate::session::{Completion, IoRequest, ReadOutcome};

use super::resolver::Resolver;

// ============================================================================
// Types
// ============================================================================

type WsStream = WebSocketStream<TcpStream>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

// ============================================================================
// Link
// ============================================================================

/// Transport handle for one connection cycle.
pub struct Link {
    /// Requests for the link task.
    command_tx: mpsc::UnboundedSender<IoRequest>,
    /// Completions from the link task.
    completion_rx: mpsc::UnboundedReceiver<Completion>,
    /// The link task itself.
    task: JoinHandle<()>,
    /// Connection cycle this link belongs to.
    cycle: u64,
}

impl Link {
    /// Spawns the link task on `runtime`.
    pub fn spawn(runtime: &Handle, resolver: Arc<dyn Resolver>, cycle: u64, host: &str) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();

        let span = info_span!("ws_link", cycle, host = %host);
        let task = runtime.spawn(run_link(resolver, command_rx, completion_tx).instrument(span));

        Self {
            command_tx,
            completion_rx,
            task,
            cycle,
        }
    }

    /// Returns the connection cycle this link belongs to.
    #[inline]
    #[must_use]
    pub const fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Hands a request to the link task.
    ///
    /// Returns `false` if the task is no longer running.
    pub fn submit(&self, request: IoRequest) -> bool {
        self.command_tx.send(request).is_ok()
    }

    /// Returns a completion if one has already been delivered.
    ///
    /// # Errors
    ///
    /// - [`TryRecvError::Empty`] if nothing is ready yet
    /// - [`TryRecvError::Disconnected`] if the task has stopped
    pub fn try_completion(&mut self) -> std::result::Result<Completion, TryRecvError> {
        self.completion_rx.try_recv()
    }

    /// Waits for the next completion.
    ///
    /// Returns `None` if the task has stopped.
    pub async fn completion(&mut self) -> Option<Completion> {
        self.completion_rx.recv().await
    }
}

impl Drop for Link {
    fn drop(&mut self) {
        self.task.abort();
        trace!(cycle = self.cycle, "Link released");
    }
}

// ============================================================================
// Link Task
// ============================================================================

/// Transport resources, filled in as the connection progresses.
#[derive(Default)]
struct LinkIo {
    tcp: Option<TcpStream>,
    sink: Option<WsSink>,
    source: Option<WsSource>,
    read_requested: bool,
}

async fn run_link(
    resolver: Arc<dyn Resolver>,
    mut command_rx: mpsc::UnboundedReceiver<IoRequest>,
    completion_tx: mpsc::UnboundedSender<Completion>,
) {
    let mut io = LinkIo::default();

    loop {
        let completion = tokio::select! {
            request = command_rx.recv() => {
                let Some(request) = request else {
                    debug!("Command channel closed");
                    break;
                };
                execute(request, resolver.as_ref(), &mut io).await
            }

            message = next_message(&mut io.source), if io.read_requested => {
                let outcome = classify_read(message);
                if outcome.is_some() {
                    io.read_requested = false;
                }
                outcome.map(Completion::Read)
            }
        };

        if let Some(completion) = completion
            && completion_tx.send(completion).is_err()
        {
            debug!("Completion channel closed");
            break;
        }
    }

    debug!("Link task terminated");
}

/// Executes one request. Returns `None` for a read, which completes later.
async fn execute(request: IoRequest, resolver: &dyn Resolver, io: &mut LinkIo) -> Option<Completion> {
    match request {
        IoRequest::Resolve { host, port } => {
            Some(Completion::Resolved(resolver.resolve(&host, &port).await))
        }

        IoRequest::ConnectTransport { endpoints, timeout } => {
            let result = connect_any(&endpoints, timeout).await.map(|(stream, addr)| {
                io.tcp = Some(stream);
                addr
            });
            Some(Completion::TransportConnected(result))
        }

        IoRequest::Handshake {
            host,
            port,
            path,
            user_agent,
            timeout,
        } => {
            let Some(stream) = io.tcp.take() else {
                return Some(Completion::Handshake(Err(Error::handshake(
                    "transport is not connected",
                ))));
            };
            let result = handshake(stream, &host, port, &path, &user_agent, timeout)
                .await
                .map(|ws| {
                    let (sink, source) = ws.split();
                    io.sink = Some(sink);
                    io.source = Some(source);
                });
            Some(Completion::Handshake(result))
        }

        IoRequest::Read => {
            if io.source.is_none() {
                return Some(Completion::Read(ReadOutcome::Failed(Error::read(
                    "stream is not open",
                ))));
            }
            io.read_requested = true;
            None
        }

        IoRequest::Write(text) => {
            let Some(sink) = io.sink.as_mut() else {
                return Some(Completion::Write(Err(Error::write("stream is not open"))));
            };
            let len = text.len();
            let result = sink
                .send(Message::Text(text.into()))
                .await
                .map_err(|e| Error::write(e.to_string()));
            trace!(len, ok = result.is_ok(), "Write finished");
            Some(Completion::Write(result))
        }

        IoRequest::Close => {
            let Some(sink) = io.sink.as_mut() else {
                return Some(Completion::Closed(Err(Error::close("stream is not open"))));
            };
            Some(Completion::Closed(close(sink).await))
        }
    }
}

// ============================================================================
// Connect Phase
// ============================================================================

/// Tries each endpoint in order; the whole attempt is bounded by `limit`.
async fn connect_any(endpoints: &[SocketAddr], limit: Duration) -> Result<(TcpStream, SocketAddr)> {
    let attempt = async {
        let mut last_error = None;

        for &addr in endpoints {
            match TcpStream::connect(addr).await {
                Ok(stream) => return Ok((stream, addr)),
                Err(e) => {
                    debug!(%addr, error = %e, "Endpoint connect failed");
                    last_error = Some(e);
                }
            }
        }

        Err(match last_error {
            Some(e) => Error::connect(e.to_string()),
            None => Error::connect("no endpoints to connect to"),
        })
    };

    bounded(limit, attempt, Error::connect_timeout).await
}

/// Performs the WebSocket upgrade over `stream`.
async fn handshake(
    stream: TcpStream,
    host: &str,
    port: u16,
    path: &str,
    user_agent: &str,
    limit: Duration,
) -> Result<WsStream> {
    let request = build_request(host, port, path, user_agent)?;

    let upgrade = async {
        client_async(request, stream)
            .await
            .map_err(|e| Error::handshake(e.to_string()))
    };
    let (ws, response) = bounded(limit, upgrade, Error::handshake_timeout).await?;

    debug!(status = %response.status(), "Upgrade accepted");
    Ok(ws)
}

/// Runs `attempt` for at most `limit`; `elapsed` builds the timeout error
/// from the limit in milliseconds.
async fn bounded<T>(
    limit: Duration,
    attempt: impl Future<Output = Result<T>>,
    elapsed: fn(u64) -> Error,
) -> Result<T> {
    match timeout(limit, attempt).await {
        Ok(result) => result,
        Err(_) => Err(elapsed(u64::try_from(limit.as_millis()).unwrap_or(u64::MAX))),
    }
}

/// Builds the upgrade request for `ws://host:port/path`.
pub(crate) fn build_request(host: &str, port: u16, path: &str, user_agent: &str) -> Result<Request> {
    let mut url = Url::parse("ws://localhost/").map_err(|e| Error::handshake(e.to_string()))?;

    match host.parse::<IpAddr>() {
        Ok(ip) => url
            .set_ip_host(ip)
            .map_err(|()| Error::handshake(format!("invalid host: {host}")))?,
        Err(_) => url
            .set_host(Some(host))
            .map_err(|e| Error::handshake(format!("invalid host {host}: {e}")))?,
    }

    url.set_port(Some(port))
        .map_err(|()| Error::handshake(format!("invalid port: {port}")))?;
    url.set_path(path);

    let mut request = url
        .as_str()
        .into_client_request()
        .map_err(|e| Error::handshake(e.to_string()))?;

    let agent = HeaderValue::from_str(user_agent)
        .map_err(|e| Error::handshake(format!("invalid user agent: {e}")))?;
    request.headers_mut().insert(USER_AGENT, agent);

    Ok(request)
}

// ============================================================================
// Connected Phase
// ============================================================================

/// Waits for the next message, or forever if the stream is not open.
async fn next_message(source: &mut Option<WsSource>) -> Option<std::result::Result<Message, WsError>> {
    match source.as_mut() {
        Some(source) => source.next().await,
        None => std::future::pending().await,
    }
}

/// Maps a stream item to a read outcome. Control frames yield `None`, which
/// keeps the read outstanding.
fn classify_read(message: Option<std::result::Result<Message, WsError>>) -> Option<ReadOutcome> {
    match message {
        Some(Ok(Message::Text(text))) => Some(ReadOutcome::Frame(text.as_str().to_owned())),

        Some(Ok(Message::Binary(data))) => {
            Some(ReadOutcome::Frame(String::from_utf8_lossy(&data).into_owned()))
        }

        Some(Ok(Message::Close(frame))) => {
            debug!(?frame, "Close frame received");
            Some(ReadOutcome::EndOfStream)
        }

        Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {
            trace!("Control frame received");
            None
        }

        Some(Err(WsError::ConnectionClosed)) | None => Some(ReadOutcome::EndOfStream),

        Some(Err(e)) => Some(ReadOutcome::Failed(Error::read(e.to_string()))),
    }
}

/// Completes the close handshake with a normal close code.
///
/// After a peer-initiated close the reply frame is already queued, so the
/// send is refused with `SendAfterClosing` and only the flush remains.
async fn close(sink: &mut WsSink) -> Result<()> {
    let frame = CloseFrame {
        code: CloseCode::Normal,
        reason: String::new().into(),
    };

    match sink.send(Message::Close(Some(frame))).await {
        Ok(())
        | Err(WsError::ConnectionClosed | WsError::Protocol(ProtocolError::SendAfterClosing)) => {}
        Err(e) => return Err(Error::close(e.to_string())),
    }

    sink.close().await.map_err(|e| Error::close(e.to_string()))
}

// ============================================================================
// Tests
// ============================================================================

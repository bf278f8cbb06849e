//! Legacy dual-endpoint binding: `GET /sse` plus `POST /message`.
//!
//! Each `GET /sse` opens one session:
//!
//! 1. A worker task and a bounded inbound queue are created, and the session
//!    is registered under a fresh id.
//! 2. The first event is `endpoint`, whose data is the URL the client must
//!    POST to: `/message?sessionId=<id>`.
//! 3. Client messages POSTed there are queued; the worker handles them one at
//!    a time and replies arrive on the stream as `message` events.
//! 4. When the stream ends (disconnect or shutdown) the session leaves the
//!    registry for good. There is no reconnection.

use std::convert::Infallible;
use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use medusa_mcp_core::protocol::Message;
use medusa_mcp_server::Server;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::HttpError;
use crate::health::BindingState;
use crate::payload::{parse_payload, read_body};
use crate::session::{SessionGuard, SessionHandle, SessionRegistry};

/// Path of the event-stream endpoint.
pub const SSE_PATH: &str = "/sse";

/// Path clients POST messages to.
pub const MESSAGE_PATH: &str = "/message";

/// Default depth of each session's inbound and outbound queues.
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

/// Shared state for the legacy binding.
#[derive(Clone)]
pub struct LegacyState {
    server: Arc<Server>,
    sessions: Arc<SessionRegistry>,
    auth_enabled: bool,
    shutdown: CancellationToken,
    queue_capacity: usize,
}

impl LegacyState {
    /// Create state with an empty session registry.
    #[must_use]
    pub fn new(server: Arc<Server>, auth_enabled: bool, shutdown: CancellationToken) -> Self {
        Self {
            server,
            sessions: Arc::new(SessionRegistry::new()),
            auth_enabled,
            shutdown,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    /// Set the per-session queue depth.
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// The session registry.
    #[must_use]
    pub const fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }
}

impl BindingState for LegacyState {
    fn server(&self) -> &Server {
        &self.server
    }

    fn transport_label(&self) -> &'static str {
        "http/sse"
    }

    fn auth_enabled(&self) -> bool {
        self.auth_enabled
    }

    fn active_connections(&self) -> usize {
        self.sessions.len()
    }
}

/// `GET /sse`: open a session and stream its replies.
pub async fn open_stream(
    State(state): State<LegacyState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (inbound_tx, inbound_rx) = mpsc::channel(state.queue_capacity);
    let (outbound_tx, outbound_rx) = mpsc::channel(state.queue_capacity);

    let session_id = state.sessions.create(SessionHandle::new(inbound_tx));
    tracing::info!(
        session_id = %session_id,
        active = state.sessions.len(),
        "SSE session established"
    );

    tokio::spawn(run_session(
        Arc::clone(&state.server),
        session_id.clone(),
        inbound_rx,
        outbound_tx,
    ));

    let guard = SessionGuard::new(Arc::clone(&state.sessions), session_id.clone());
    let stream = session_stream(session_id, guard, outbound_rx, state.shutdown.clone());
    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn session_stream(
    session_id: String,
    guard: SessionGuard,
    mut outbound: mpsc::Receiver<Message>,
    shutdown: CancellationToken,
) -> impl Stream<Item = Result<Event, Infallible>> {
    async_stream::stream! {
        let _guard = guard;

        yield Ok(Event::default()
            .event("endpoint")
            .data(format!("{MESSAGE_PATH}?sessionId={session_id}")));

        loop {
            let next = tokio::select! {
                () = shutdown.cancelled() => None,
                message = outbound.recv() => message,
            };
            let Some(message) = next else {
                break;
            };

            match serde_json::to_string(&message) {
                Ok(json) => yield Ok(Event::default().event("message").data(json)),
                Err(e) => tracing::error!(session_id = %session_id, error = %e, "Failed to serialize reply"),
            }
        }
    }
}

/// Handle one session's messages in arrival order.
///
/// Ends when the session leaves the registry. A reply produced after the
/// stream closed is dropped.
async fn run_session(
    server: Arc<Server>,
    session_id: String,
    mut inbound: mpsc::Receiver<Vec<Message>>,
    outbound: mpsc::Sender<Message>,
) {
    'session: while let Some(batch) = inbound.recv().await {
        for message in batch {
            tracing::debug!(session_id = %session_id, method = ?message.method(), "Handling message");
            if let Some(reply) = server.handle(message).await {
                if outbound.send(reply).await.is_err() {
                    tracing::debug!(session_id = %session_id, "Stream closed, reply undeliverable");
                    break 'session;
                }
            }
        }
    }
}

/// Query string of `POST /message`.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    /// The session to deliver to.
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

/// `POST /message?sessionId=<id>`: queue a client message for its session.
///
/// A batch is queued as one unit: either every message reaches the worker
/// or, if the session closed first, none does and the reply is 404.
pub async fn post_message(
    State(state): State<LegacyState>,
    query: Result<Query<MessageQuery>, QueryRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let session_id = query
        .ok()
        .and_then(|Query(q)| q.session_id)
        .filter(|id| !id.is_empty())
        .ok_or(HttpError::MissingSessionId)?;

    let session = state
        .sessions
        .get(&session_id)
        .ok_or(HttpError::SessionNotFound)?;

    let body = read_body(body)?;
    let payload = parse_payload(&body)?;

    session.deliver(payload.into_messages()).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "status": "accepted" })),
    ))
}

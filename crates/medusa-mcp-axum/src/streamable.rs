//! Single-endpoint binding: `GET` and `POST` on `/mcp`.
//!
//! One [`StreamableTransport`] is created at startup and shared by every
//! request. Its session id comes from a generator supplied at construction
//! and is echoed in the `mcp-session-id` response header; a request naming
//! any other session gets 404.
//!
//! POST bodies carry one message or a batch. Requests are answered inline as
//! JSON; payloads with nothing to answer get 202. GET opens an event stream
//! that stays idle (this server never initiates messages) until shutdown.

use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use medusa_mcp_core::protocol::Message;
use medusa_mcp_server::Server;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::HttpError;
use crate::health::BindingState;
use crate::payload::{Payload, is_blank, parse_payload, read_body};

/// Path of the single endpoint.
pub const MCP_PATH: &str = "/mcp";

/// Header carrying the session id.
pub const MCP_SESSION_ID_HEADER: &str = "mcp-session-id";

/// The one transport handle shared by all `/mcp` requests.
pub struct StreamableTransport {
    session_id: String,
    server: Arc<Server>,
    order: Mutex<()>,
    open_streams: AtomicUsize,
}

impl StreamableTransport {
    /// Create the transport, drawing its session id from `generate_session_id`.
    pub fn new(server: Arc<Server>, generate_session_id: impl FnOnce() -> String) -> Self {
        let session_id = generate_session_id();
        tracing::info!(session_id = %session_id, "Single-endpoint session created");
        Self {
            session_id,
            server,
            order: Mutex::new(()),
            open_streams: AtomicUsize::new(0),
        }
    }

    /// The shared session id.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Number of open GET streams.
    #[must_use]
    pub fn open_streams(&self) -> usize {
        self.open_streams.load(Ordering::SeqCst)
    }

    /// Handle `messages` in order, returning the replies that are due.
    ///
    /// Payloads are processed one at a time across all requests, so the
    /// shared session sees messages in arrival order.
    pub async fn handle(&self, messages: Vec<Message>) -> Vec<Message> {
        let _order = self.order.lock().await;
        let mut replies = Vec::new();
        for message in messages {
            if let Some(reply) = self.server.handle(message).await {
                replies.push(reply);
            }
        }
        replies
    }

    fn check_session(&self, headers: &HeaderMap) -> Result<(), HttpError> {
        match headers.get(MCP_SESSION_ID_HEADER) {
            None => Ok(()),
            Some(value) if value.as_bytes() == self.session_id.as_bytes() => Ok(()),
            Some(_) => Err(HttpError::SessionNotFound),
        }
    }

    fn session_header(&self) -> [(&'static str, String); 1] {
        [(MCP_SESSION_ID_HEADER, self.session_id.clone())]
    }
}

impl std::fmt::Debug for StreamableTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamableTransport")
            .field("session_id", &self.session_id)
            .field("open_streams", &self.open_streams())
            .finish_non_exhaustive()
    }
}

struct StreamGuard(Arc<StreamableTransport>);

impl StreamGuard {
    fn open(transport: Arc<StreamableTransport>) -> Self {
        transport.open_streams.fetch_add(1, Ordering::SeqCst);
        Self(transport)
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.0.open_streams.fetch_sub(1, Ordering::SeqCst);
        tracing::debug!("Event stream closed");
    }
}

/// Shared state for the single-endpoint binding.
#[derive(Clone)]
pub struct StreamableState {
    transport: Arc<StreamableTransport>,
    auth_enabled: bool,
    shutdown: CancellationToken,
}

impl StreamableState {
    /// Create state around one shared transport.
    #[must_use]
    pub const fn new(
        transport: Arc<StreamableTransport>,
        auth_enabled: bool,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            transport,
            auth_enabled,
            shutdown,
        }
    }

    /// The shared transport.
    #[must_use]
    pub const fn transport(&self) -> &Arc<StreamableTransport> {
        &self.transport
    }
}

impl BindingState for StreamableState {
    fn server(&self) -> &Server {
        &self.transport.server
    }

    fn transport_label(&self) -> &'static str {
        "streamable-http"
    }

    fn auth_enabled(&self) -> bool {
        self.auth_enabled
    }

    fn active_connections(&self) -> usize {
        self.transport.open_streams()
    }
}

fn accepts_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_none_or(|accept| {
            accept.contains("text/event-stream") || accept.contains("*/*")
        })
}

/// `GET /mcp`: open the server-to-client event stream.
pub async fn open_stream(
    State(state): State<StreamableState>,
    headers: HeaderMap,
) -> Result<Response, HttpError> {
    state.transport.check_session(&headers)?;
    if !accepts_event_stream(&headers) {
        return Err(HttpError::NotAcceptable);
    }

    let guard = StreamGuard::open(Arc::clone(&state.transport));
    let shutdown = state.shutdown.clone();
    tracing::debug!(session_id = %state.transport.session_id(), "Event stream opened");

    let stream = async_stream::stream! {
        let _guard = guard;
        yield Ok::<_, Infallible>(Event::default().comment("stream open"));
        shutdown.cancelled().await;
    };

    Ok((
        state.transport.session_header(),
        Sse::new(stream).keep_alive(KeepAlive::default()),
    )
        .into_response())
}

/// `POST /mcp`: deliver one payload to the shared session.
pub async fn post_message(
    State(state): State<StreamableState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, HttpError> {
    let transport = &state.transport;
    transport.check_session(&headers)?;

    let body = read_body(body)?;
    if is_blank(&body) {
        return Err(HttpError::EmptyBody);
    }
    let payload = parse_payload(&body)?;
    let batch = matches!(payload, Payload::Batch(_));

    let mut replies = transport.handle(payload.into_messages()).await;

    if replies.is_empty() {
        return Ok((
            StatusCode::ACCEPTED,
            transport.session_header(),
            Json(serde_json::json!({ "status": "accepted" })),
        )
            .into_response());
    }

    let body = if batch {
        serde_json::to_value(replies)
    } else {
        serde_json::to_value(replies.swap_remove(0))
    }
    .map_err(|e| HttpError::Internal(e.to_string()))?;

    Ok((transport.session_header(), Json(body)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_accept_header() {
        let mut headers = HeaderMap::new();
        assert!(accepts_event_stream(&headers));

        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json, text/event-stream"));
        assert!(accepts_event_stream(&headers));

        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        assert!(!accepts_event_stream(&headers));
    }
}

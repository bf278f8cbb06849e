//! Router builder for the HTTP bindings.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use medusa_mcp_server::Server;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::auth::{BearerAuth, require_bearer};
use crate::cors::cors;
use crate::error::not_found;
use crate::health::{HEALTH_PATH, health};
use crate::sse::{self, DEFAULT_QUEUE_CAPACITY, LegacyState, MESSAGE_PATH, SSE_PATH};
use crate::streamable::{self, MCP_PATH, StreamableState, StreamableTransport};

/// Default request body limit (4 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Which HTTP protocol shape to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpBinding {
    /// `GET /sse` + `POST /message`, one session per stream.
    DualEndpoint,
    /// `GET`/`POST /mcp`, one shared session.
    SingleEndpoint,
}

/// Builder for the MCP HTTP router.
///
/// # Example
///
/// ```ignore
/// use medusa_mcp_axum::{HttpBinding, McpRouter};
///
/// let router = McpRouter::new(server, HttpBinding::DualEndpoint)
///     .bearer_token("s3cret")
///     .with_tracing()
///     .into_router();
/// ```
pub struct McpRouter {
    server: Arc<Server>,
    binding: HttpBinding,
    auth: BearerAuth,
    max_body_bytes: usize,
    queue_capacity: usize,
    shutdown: CancellationToken,
    enable_tracing: bool,
}

impl McpRouter {
    /// Create a router for `server` using `binding`. Authentication is off
    /// until a bearer token is set.
    #[must_use]
    pub fn new(server: Arc<Server>, binding: HttpBinding) -> Self {
        Self {
            server,
            binding,
            auth: BearerAuth::default(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            shutdown: CancellationToken::new(),
            enable_tracing: false,
        }
    }

    /// Require `Authorization: Bearer <token>`. Empty disables the check.
    #[must_use]
    pub fn bearer_token(mut self, token: impl Into<Arc<str>>) -> Self {
        self.auth = BearerAuth::new(token);
        self
    }

    /// Reject request bodies larger than `bytes` with 413.
    #[must_use]
    pub const fn max_body_bytes(mut self, bytes: usize) -> Self {
        self.max_body_bytes = bytes;
        self
    }

    /// Per-session queue depth for the dual-endpoint binding.
    #[must_use]
    pub const fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Token whose cancellation ends every open event stream.
    #[must_use]
    pub fn shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Enable request tracing.
    #[must_use]
    pub const fn with_tracing(mut self) -> Self {
        self.enable_tracing = true;
        self
    }

    /// Build the router.
    ///
    /// Layers, outermost first: CORS (answers every `OPTIONS`), tracing,
    /// bearer authentication (exempting `GET /health`), body limit, routes.
    #[must_use]
    pub fn into_router(self) -> Router {
        let auth_enabled = self.auth.is_enabled();
        if !auth_enabled {
            tracing::warn!("No bearer token configured, HTTP authentication is disabled");
        }

        let routes = match self.binding {
            HttpBinding::DualEndpoint => {
                let state = LegacyState::new(self.server, auth_enabled, self.shutdown)
                    .with_queue_capacity(self.queue_capacity);
                Router::new()
                    .route(SSE_PATH, get(sse::open_stream))
                    .route(MESSAGE_PATH, post(sse::post_message))
                    .route(HEALTH_PATH, get(health::<LegacyState>))
                    .with_state(state)
            }
            HttpBinding::SingleEndpoint => {
                let transport = Arc::new(StreamableTransport::new(self.server, || {
                    uuid::Uuid::new_v4().to_string()
                }));
                let state = StreamableState::new(transport, auth_enabled, self.shutdown);
                Router::new()
                    .route(
                        MCP_PATH,
                        get(streamable::open_stream).post(streamable::post_message),
                    )
                    .route(HEALTH_PATH, get(health::<StreamableState>))
                    .with_state(state)
            }
        };

        let mut router = routes
            .fallback(not_found)
            .method_not_allowed_fallback(not_found)
            .layer(DefaultBodyLimit::max(self.max_body_bytes))
            .layer(middleware::from_fn_with_state(self.auth, require_bearer));

        if self.enable_tracing {
            router = router.layer(TraceLayer::new_for_http());
        }

        router.layer(middleware::from_fn(cors))
    }

    /// Bind `addr` and serve until the shutdown token is cancelled.
    ///
    /// Failing to bind is returned to the caller; it is the only error here.
    pub async fn serve(self, addr: SocketAddr) -> std::io::Result<()> {
        let shutdown = self.shutdown.clone();
        let binding = self.binding;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let local = listener.local_addr()?;

        tracing::info!(addr = %local, binding = ?binding, "MCP HTTP server listening");
        match binding {
            HttpBinding::DualEndpoint => {
                tracing::info!("SSE endpoint: http://{local}{SSE_PATH}");
                tracing::info!("Message endpoint: http://{local}{MESSAGE_PATH}?sessionId=<sessionId>");
            }
            HttpBinding::SingleEndpoint => {
                tracing::info!("MCP endpoint: http://{local}{MCP_PATH}");
            }
        }
        tracing::info!("Health check: http://{local}{HEALTH_PATH}");

        axum::serve(listener, self.into_router())
            .with_graceful_shutdown(shutdown.cancelled_owned())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medusa_mcp_core::ServerInfo;
    use medusa_mcp_server::Catalog;

    fn server() -> Arc<Server> {
        Arc::new(Server::new(ServerInfo::new("test", "0.0.0"), Catalog::default()))
    }

    #[test]
    fn test_router_builder() {
        let _legacy = McpRouter::new(server(), HttpBinding::DualEndpoint)
            .bearer_token("s3cret")
            .max_body_bytes(1024)
            .queue_capacity(8)
            .with_tracing()
            .into_router();

        let _single = McpRouter::new(server(), HttpBinding::SingleEndpoint).into_router();
    }
}

//! HTTP bindings for the Medusa MCP server, built on Axum.
//!
//! Two protocol shapes are served, chosen once at startup:
//!
//! - **Dual endpoint** (legacy): `GET /sse` opens an event stream and mints a
//!   session; clients POST to `/message?sessionId=<id>`. Sessions live in a
//!   [`SessionRegistry`] until their stream closes.
//! - **Single endpoint**: `GET` and `POST` on `/mcp`, backed by one shared
//!   [`StreamableTransport`].
//!
//! Both expose `GET /health`, answer every `OPTIONS` with 204 and permissive
//! CORS headers, and gate everything else behind a shared bearer token.
//!
//! # Endpoints
//!
//! | Endpoint | Method | Auth | Binding |
//! |---|---|---|---|
//! | `/health` | GET | no | both |
//! | `/sse` | GET | yes | dual |
//! | `/message?sessionId=` | POST | yes | dual |
//! | `/mcp` | GET, POST | yes | single |
//! | anything else | any | yes | 404 `{"error":"Not found"}` |
//!
//! # Example
//!
//! ```ignore
//! use medusa_mcp_axum::{HttpBinding, McpRouter};
//!
//! McpRouter::new(server, HttpBinding::DualEndpoint)
//!     .bearer_token(std::env::var("MCP_BEARER_TOKEN").unwrap_or_default())
//!     .with_tracing()
//!     .serve("0.0.0.0:3000".parse()?)
//!     .await?;
//! ```

#![warn(clippy::unwrap_used)]

pub mod auth;
pub mod cors;
pub mod error;
pub mod health;
pub mod payload;
pub mod router;
pub mod session;
pub mod sse;
pub mod streamable;

pub use auth::{BearerAuth, authorize};
pub use error::HttpError;
pub use health::{BindingState, HEALTH_PATH, HealthReport};
pub use router::{DEFAULT_MAX_BODY_BYTES, HttpBinding, McpRouter};
pub use session::{SessionHandle, SessionRegistry};
pub use sse::{LegacyState, MESSAGE_PATH, SSE_PATH};
pub use streamable::{MCP_PATH, MCP_SESSION_ID_HEADER, StreamableState, StreamableTransport};

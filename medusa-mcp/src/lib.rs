//! # Medusa MCP
//!
//! An MCP server that exposes a Medusa commerce backend as tools.
//!
//! The server composes two providers into one catalog: storefront tools,
//! which are always available, and admin tools, which appear only when the
//! admin login succeeds at startup. The catalog is served over exactly one
//! binding, chosen by `TRANSPORT_MODE`:
//!
//! | Mode | Binding |
//! |---|---|
//! | `stdio` | line-delimited JSON over stdin/stdout |
//! | `http`, `sse` | `GET /sse` + `POST /message?sessionId=` |
//! | `streamable-http`, `streamable` | `GET`/`POST /mcp` |
//!
//! ## Crate Organization
//!
//! - [`medusa_mcp_core`] - JSON-RPC framing, tool types, errors
//! - [`medusa_mcp_server`] - catalog composition and the server core
//! - [`medusa_mcp_transport`] - the stdio binding
//! - [`medusa_mcp_axum`] - the HTTP bindings

#![warn(clippy::unwrap_used)]

pub mod binding;
pub mod config;
pub mod logging;
pub mod providers;

use medusa_mcp_server::compose;

pub use binding::{ServeError, TransportBinding};
pub use config::{Config, ConfigError, HttpOptions, LogFormat, MedusaConfig, TransportMode};
pub use providers::{AdminProvider, ClientError, MedusaClient, StoreProvider, medusa_providers};

pub use medusa_mcp_axum::{HttpBinding, McpRouter};
pub use medusa_mcp_core::{McpError, ServerInfo};
pub use medusa_mcp_server::{Catalog, ProviderReport, Server, ToolProvider};

/// Name reported in `initialize`.
pub const SERVER_NAME: &str = "Medusa Store MCP Server";

/// Identity reported in `initialize`.
#[must_use]
pub fn server_info() -> ServerInfo {
    ServerInfo::new(SERVER_NAME, env!("CARGO_PKG_VERSION"))
}

/// Compose the Medusa providers and build the server.
///
/// Provider failures do not fail this call; they show up as excluded
/// entries in the catalog's reports.
pub async fn build_server(config: &MedusaConfig) -> Result<Server, ClientError> {
    let providers = medusa_providers(config)?;
    let catalog = compose(&providers).await;

    tracing::info!(
        tools = catalog.len(),
        degraded = catalog.is_degraded(),
        "Tool catalog ready"
    );
    Ok(Server::new(server_info(), catalog))
}

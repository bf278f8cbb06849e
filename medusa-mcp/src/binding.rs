//! Transport binding selection.
//!
//! The process serves exactly one binding, chosen from configuration at
//! startup. Every binding shares one entry point, [`TransportBinding::serve`],
//! and stops when the shutdown token is cancelled.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use medusa_mcp_axum::{HttpBinding, McpRouter};
use medusa_mcp_server::Server;
use medusa_mcp_transport::{StdioTransport, TransportError};
use miette::Diagnostic;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::{Config, HttpOptions, TransportMode};

/// Failure to start or keep serving a binding.
#[derive(Error, Diagnostic, Debug)]
pub enum ServeError {
    /// `HTTP_HOST` did not resolve to an address.
    #[error("Invalid bind host '{host}'")]
    #[diagnostic(code(medusa_mcp::serve::host), help("Use an IP address such as 0.0.0.0 or 127.0.0.1"))]
    InvalidHost {
        /// The rejected host.
        host: String,
    },

    /// The HTTP listener failed.
    #[error("HTTP server failed on {addr}")]
    #[diagnostic(code(medusa_mcp::serve::http))]
    Http {
        /// The bind address.
        addr: SocketAddr,
        /// The underlying failure.
        #[source]
        source: std::io::Error,
    },

    /// The stdio session failed.
    #[error("stdio transport failed")]
    #[diagnostic(code(medusa_mcp::serve::stdio))]
    Stdio(#[from] TransportError),
}

/// The binding this process serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportBinding {
    /// Line-delimited JSON over stdin/stdout.
    Stdio,
    /// `GET /sse` + `POST /message`.
    DualEndpoint(HttpOptions),
    /// `GET`/`POST /mcp`.
    SingleEndpoint(HttpOptions),
}

impl TransportBinding {
    /// Pick the binding named by `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        match config.transport {
            TransportMode::Stdio => Self::Stdio,
            TransportMode::DualEndpoint => Self::DualEndpoint(config.http.clone()),
            TransportMode::SingleEndpoint => Self::SingleEndpoint(config.http.clone()),
        }
    }

    /// Short name used in logs and health output.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Stdio => "stdio",
            Self::DualEndpoint(_) => "http/sse",
            Self::SingleEndpoint(_) => "streamable-http",
        }
    }

    /// The HTTP router for an HTTP binding, or `None` for stdio.
    #[must_use]
    pub fn router(&self, server: Arc<Server>, shutdown: CancellationToken) -> Option<McpRouter> {
        let (binding, options) = match self {
            Self::Stdio => return None,
            Self::DualEndpoint(options) => (HttpBinding::DualEndpoint, options),
            Self::SingleEndpoint(options) => (HttpBinding::SingleEndpoint, options),
        };

        Some(
            McpRouter::new(server, binding)
                .bearer_token(options.bearer_token.as_str())
                .max_body_bytes(options.max_body_bytes)
                .shutdown(shutdown)
                .with_tracing(),
        )
    }

    /// Serve `server` until the binding ends or `shutdown` is cancelled.
    ///
    /// For stdio, end of input also ends the binding.
    pub async fn serve(self, server: Arc<Server>, shutdown: CancellationToken) -> Result<(), ServeError> {
        tracing::info!(transport = self.label(), "Starting Medusa MCP server");

        let options = match &self {
            Self::Stdio => {
                medusa_mcp_transport::serve(server, StdioTransport::new(), shutdown).await?;
                return Ok(());
            }
            Self::DualEndpoint(options) | Self::SingleEndpoint(options) => options,
        };

        let addr = bind_addr(options).await?;
        let Some(router) = self.router(server, shutdown) else {
            return Ok(());
        };
        router
            .serve(addr)
            .await
            .map_err(|source| ServeError::Http { addr, source })
    }
}

async fn bind_addr(options: &HttpOptions) -> Result<SocketAddr, ServeError> {
    if let Ok(ip) = options.host.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, options.port));
    }
    tokio::net::lookup_host((options.host.as_str(), options.port))
        .await
        .ok()
        .and_then(|mut addrs| addrs.next())
        .ok_or_else(|| ServeError::InvalidHost {
            host: options.host.clone(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config(mode: TransportMode) -> Config {
        let mut config = Config::from_lookup(|_| None).unwrap();
        config.transport = mode;
        config
    }

    #[test]
    fn test_from_config() {
        assert_eq!(TransportBinding::from_config(&config(TransportMode::Stdio)), TransportBinding::Stdio);
        assert_eq!(
            TransportBinding::from_config(&config(TransportMode::DualEndpoint)),
            TransportBinding::DualEndpoint(HttpOptions::default())
        );
        assert_eq!(
            TransportBinding::from_config(&config(TransportMode::SingleEndpoint)),
            TransportBinding::SingleEndpoint(HttpOptions::default())
        );
    }

    #[test]
    fn test_labels() {
        assert_eq!(TransportBinding::Stdio.label(), "stdio");
        assert_eq!(TransportBinding::DualEndpoint(HttpOptions::default()).label(), "http/sse");
        assert_eq!(
            TransportBinding::SingleEndpoint(HttpOptions::default()).label(),
            "streamable-http"
        );
    }

    #[tokio::test]
    async fn test_bind_addr() {
        let options = HttpOptions {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..HttpOptions::default()
        };
        let addr: SocketAddr = "127.0.0.1:8080".parse().unwrap();
        assert_eq!(bind_addr(&options).await.unwrap(), addr);

        let options = HttpOptions {
            host: "::1".to_string(),
            port: 3000,
            ..HttpOptions::default()
        };
        let addr: SocketAddr = "[::1]:3000".parse().unwrap();
        assert_eq!(bind_addr(&options).await.unwrap(), addr);
    }

    #[tokio::test]
    async fn test_stdio_has_no_router() {
        let server = Arc::new(Server::new(
            medusa_mcp_core::ServerInfo::new("test", "0.0.0"),
            medusa_mcp_server::Catalog::default(),
        ));
        assert!(TransportBinding::Stdio.router(Arc::clone(&server), CancellationToken::new()).is_none());
        assert!(
            TransportBinding::SingleEndpoint(HttpOptions::default())
                .router(server, CancellationToken::new())
                .is_some()
        );
    }
}

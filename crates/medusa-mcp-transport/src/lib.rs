//! Local-pipe binding for the Medusa MCP server.
//!
//! The server reads JSON-RPC frames from stdin and writes replies to stdout,
//! one frame per line. This is the binding used when an MCP client launches
//! the server as a subprocess.
//!
//! ```no_run
//! use std::sync::Arc;
//! use medusa_mcp_core::ServerInfo;
//! use medusa_mcp_server::{Server, ToolProvider, compose};
//! use medusa_mcp_transport::{StdioTransport, serve};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run(providers: Vec<Arc<dyn ToolProvider>>) -> Result<(), medusa_mcp_transport::TransportError> {
//! let server = Arc::new(Server::new(ServerInfo::new("medusa-mcp", "0.1.0"), compose(&providers).await));
//! serve(server, StdioTransport::new(), CancellationToken::new()).await
//! # }
//! ```

#![warn(clippy::unwrap_used)]

pub mod error;
pub mod stdio;

pub use error::TransportError;
pub use stdio::{MAX_MESSAGE_SIZE, StdioTransport, serve};

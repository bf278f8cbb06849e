//! # medusa-mcp-core
//!
//! Protocol building blocks shared by every part of the Medusa MCP server:
//!
//! - **Protocol types**: JSON-RPC 2.0 request/response/notification framing
//! - **MCP types**: tool descriptors, content, tool results, server info
//! - **Error handling**: a single `McpError` type that maps onto JSON-RPC codes
//!
//! This crate has no async runtime dependency; transports and the server
//! core build on top of it.
//!
//! # Example
//!
//! ```rust
//! use medusa_mcp_core::protocol::{Message, Request};
//!
//! let request = Request::new("tools/list", 1u64);
//! let json = serde_json::to_string(&Message::Request(request)).unwrap();
//! assert!(json.contains("\"method\":\"tools/list\""));
//! ```

#![warn(clippy::unwrap_used)]

pub mod error;
pub mod protocol;
pub mod types;

pub use error::{JsonRpcError, McpError};
pub use protocol::{Message, Notification, Request, RequestId, Response};
pub use types::{
    CallToolResult, Content, InitializeResult, ServerCapabilities, ServerInfo, Tool, ToolOutput,
};

/// The newest MCP protocol revision this server speaks.
pub const LATEST_PROTOCOL_VERSION: &str = "2025-06-18";

/// Protocol revisions accepted during `initialize`, oldest first.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2024-11-05", "2025-03-26", "2025-06-18"];

/// Pick the protocol version to answer an `initialize` request with.
///
/// The client's requested version is echoed back when it is supported,
/// otherwise the server offers its latest revision and lets the client decide.
#[must_use]
pub fn negotiate_version(requested: Option<&str>) -> &'static str {
    requested
        .and_then(|v| SUPPORTED_PROTOCOL_VERSIONS.iter().find(|s| **s == v))
        .copied()
        .unwrap_or(LATEST_PROTOCOL_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negotiate_known_version() {
        assert_eq!(negotiate_version(Some("2024-11-05")), "2024-11-05");
    }

    #[test]
    fn test_negotiate_unknown_falls_back_to_latest() {
        assert_eq!(negotiate_version(Some("1999-01-01")), LATEST_PROTOCOL_VERSION);
        assert_eq!(negotiate_version(None), LATEST_PROTOCOL_VERSION);
    }
}

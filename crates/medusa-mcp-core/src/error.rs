//! Unified error handling.
//!
//! All protocol-level failures flow through [`McpError`]. Each variant knows
//! its JSON-RPC error code, so converting to a wire-format [`JsonRpcError`]
//! is a single `From` call.
//!
//! Two failure shapes exist for tool calls:
//!
//! | Scenario | Surfaced as |
//! |----------|-------------|
//! | Tool name not in the catalog | JSON-RPC error, `-32602` |
//! | Arguments fail the tool's schema | JSON-RPC error, `-32602` |
//! | The tool's handler fails | `CallToolResult` with `isError: true` |
//!
//! The last row lets the remote model read the failure and retry with
//! different input instead of treating it as a protocol fault.

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Standard JSON-RPC error codes.
pub mod codes {
    /// Invalid JSON was received.
    pub const PARSE_ERROR: i32 = -32700;
    /// The JSON sent is not a valid Request object.
    pub const INVALID_REQUEST: i32 = -32600;
    /// The method does not exist.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid method parameters.
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal JSON-RPC error.
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// The primary error type for the Medusa MCP server.
#[derive(Error, Diagnostic, Debug)]
pub enum McpError {
    /// Invalid JSON was received.
    #[error("Parse error: {message}")]
    #[diagnostic(
        code(mcp::protocol::parse_error),
        help("Ensure the message is valid JSON-RPC 2.0 format")
    )]
    Parse {
        /// Human-readable error message.
        message: String,
    },

    /// The JSON sent is not a valid Request object.
    #[error("Invalid request: {message}")]
    #[diagnostic(code(mcp::protocol::invalid_request))]
    InvalidRequest {
        /// Human-readable error message.
        message: String,
    },

    /// The method does not exist.
    #[error("Method not found: {method}")]
    #[diagnostic(code(mcp::protocol::method_not_found))]
    MethodNotFound {
        /// The method that was requested.
        method: String,
    },

    /// Invalid method parameters.
    #[error("Invalid params for '{method}': {message}")]
    #[diagnostic(code(mcp::protocol::invalid_params))]
    InvalidParams {
        /// The method whose parameters were rejected.
        method: String,
        /// What was wrong with them.
        message: String,
    },

    /// No tool with this name is in the catalog.
    #[error("Tool not found: {name}")]
    #[diagnostic(code(mcp::tool::not_found), help("Call tools/list to see available tools"))]
    ToolNotFound {
        /// The requested tool name.
        name: String,
    },

    /// Tool arguments did not satisfy the tool's input schema.
    #[error("Validation error for tool '{tool}': {message}")]
    #[diagnostic(code(mcp::tool::validation))]
    Validation {
        /// The tool being invoked.
        tool: String,
        /// The deserialization failure.
        message: String,
    },

    /// The tool's handler ran and failed.
    #[error("Tool '{tool}' failed: {message}")]
    #[diagnostic(code(mcp::tool::execution_error))]
    ToolExecution {
        /// The tool that failed.
        tool: String,
        /// The failure reported by the handler.
        message: String,
    },

    /// A tool provider could not be initialized.
    #[error("Provider '{provider}' failed to initialize: {message}")]
    #[diagnostic(code(mcp::provider::init_failed), severity(warning))]
    ProviderInit {
        /// The provider name.
        provider: String,
        /// Why initialization failed.
        message: String,
    },

    /// Internal error.
    #[error("Internal error: {message}")]
    #[diagnostic(code(mcp::internal), severity(error))]
    Internal {
        /// Human-readable error message.
        message: String,
    },
}

impl McpError {
    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create a method not found error.
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::MethodNotFound {
            method: method.into(),
        }
    }

    /// Create an invalid params error.
    pub fn invalid_params(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParams {
            method: method.into(),
            message: message.into(),
        }
    }

    /// Create a tool not found error.
    pub fn tool_not_found(name: impl Into<String>) -> Self {
        Self::ToolNotFound { name: name.into() }
    }

    /// Create a validation error for a tool's arguments.
    pub fn validation(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a tool execution error.
    pub fn tool_error(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecution {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a provider initialization error.
    pub fn provider_init(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProviderInit {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// The JSON-RPC error code for this error.
    #[must_use]
    pub const fn code(&self) -> i32 {
        match self {
            Self::Parse { .. } => codes::PARSE_ERROR,
            Self::InvalidRequest { .. } => codes::INVALID_REQUEST,
            Self::MethodNotFound { .. } => codes::METHOD_NOT_FOUND,
            Self::InvalidParams { .. } | Self::ToolNotFound { .. } | Self::Validation { .. } => {
                codes::INVALID_PARAMS
            }
            Self::ToolExecution { .. } | Self::ProviderInit { .. } | Self::Internal { .. } => {
                codes::INTERNAL_ERROR
            }
        }
    }
}

/// A JSON-RPC error object as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code.
    pub code: i32,
    /// Error message.
    pub message: String,
    /// Additional error data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl From<&McpError> for JsonRpcError {
    fn from(err: &McpError) -> Self {
        let data = match err {
            McpError::ToolNotFound { name } => Some(serde_json::json!({ "tool": name })),
            McpError::Validation { tool, .. } | McpError::ToolExecution { tool, .. } => {
                Some(serde_json::json!({ "tool": tool }))
            }
            McpError::MethodNotFound { method } | McpError::InvalidParams { method, .. } => {
                Some(serde_json::json!({ "method": method }))
            }
            _ => None,
        };

        Self {
            code: err.code(),
            message: err.to_string(),
            data,
        }
    }
}

impl From<McpError> for JsonRpcError {
    fn from(err: McpError) -> Self {
        Self::from(&err)
    }
}

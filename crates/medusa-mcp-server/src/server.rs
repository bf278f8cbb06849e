//! The protocol engine shared by every transport binding.
//!
//! [`Server`] owns the composed [`Catalog`] and answers JSON-RPC messages.
//! Bindings only move frames; every protocol decision happens here.

use medusa_mcp_core::error::JsonRpcError;
use medusa_mcp_core::protocol::{Message, Request, Response};
use medusa_mcp_core::types::{CallToolResult, InitializeResult, ServerCapabilities, ServerInfo, Tool};
use medusa_mcp_core::{McpError, negotiate_version};
use serde::Deserialize;
use serde_json::Value;

use crate::catalog::Catalog;

/// MCP method names handled by the server.
pub mod methods {
    /// Initialize the connection and negotiate the protocol version.
    pub const INITIALIZE: &str = "initialize";
    /// Liveness check.
    pub const PING: &str = "ping";
    /// List available tools.
    pub const TOOLS_LIST: &str = "tools/list";
    /// Call a tool.
    pub const TOOLS_CALL: &str = "tools/call";
}

/// MCP notification names the server recognizes.
pub mod notifications {
    /// Sent by the client once initialization completes.
    pub const INITIALIZED: &str = "notifications/initialized";
    /// Sent when the client abandons a request.
    pub const CANCELLED: &str = "notifications/cancelled";
}

#[derive(Debug, Deserialize)]
struct InitializeParams {
    #[serde(rename = "protocolVersion")]
    protocol_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

/// The MCP server core.
#[derive(Debug)]
pub struct Server {
    info: ServerInfo,
    catalog: Catalog,
}

impl Server {
    /// Create a server answering with `info` and offering `catalog`.
    #[must_use]
    pub const fn new(info: ServerInfo, catalog: Catalog) -> Self {
        Self { info, catalog }
    }

    /// Server identity.
    #[must_use]
    pub const fn info(&self) -> &ServerInfo {
        &self.info
    }

    /// The immutable tool catalog.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Every tool in the catalog, in catalog order.
    #[must_use]
    pub fn list_tools(&self) -> Vec<Tool> {
        self.catalog.tools().cloned().collect()
    }

    /// Call a tool by name.
    ///
    /// Fails with [`McpError::ToolNotFound`] or [`McpError::Validation`]
    /// before any handler runs. A handler's own failure is returned as a
    /// result with `isError` set.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<Value>,
    ) -> Result<CallToolResult, McpError> {
        let descriptor = self
            .catalog
            .get(name)
            .ok_or_else(|| McpError::tool_not_found(name))?;

        let arguments = match arguments {
            None | Some(Value::Null) => Value::Object(serde_json::Map::new()),
            Some(args) => args,
        };

        let call = descriptor.invoke(arguments)?;
        match call.await {
            Ok(output) => Ok(output.into()),
            Err(err) => {
                tracing::warn!(tool = %name, error = %err, "Tool handler failed");
                Ok(CallToolResult::error(err.to_string()))
            }
        }
    }

    /// Handle one inbound message, returning the reply if one is due.
    ///
    /// Requests always get a response. Notifications and stray responses
    /// from the client get none.
    pub async fn handle(&self, message: Message) -> Option<Message> {
        match message {
            Message::Request(request) => Some(Message::Response(self.handle_request(request).await)),
            Message::Notification(notification) => {
                match &*notification.method {
                    notifications::INITIALIZED => {
                        tracing::info!("Client sent initialized notification");
                    }
                    notifications::CANCELLED => {
                        let request_id = notification
                            .params
                            .as_ref()
                            .and_then(|p| p.get("requestId"))
                            .cloned()
                            .unwrap_or(Value::Null);
                        tracing::debug!(
                            request_id = %request_id,
                            "Client cancelled a request; an in-flight call still runs to completion"
                        );
                    }
                    method => tracing::debug!(method = %method, "Ignoring notification"),
                }
                None
            }
            Message::Response(response) => {
                tracing::warn!(id = ?response.id, "Received unexpected response message");
                None
            }
        }
    }

    /// Handle one request.
    pub async fn handle_request(&self, request: Request) -> Response {
        let method: &str = &request.method;
        tracing::debug!(method = %method, id = %request.id, "Handling request");

        let result = match method {
            methods::INITIALIZE => self.initialize(request.params.as_ref()),
            methods::PING => Ok(serde_json::json!({})),
            methods::TOOLS_LIST => Ok(serde_json::json!({ "tools": self.list_tools() })),
            methods::TOOLS_CALL => self.tools_call(request.params).await,
            other => Err(McpError::method_not_found(other)),
        };

        match result {
            Ok(value) => Response::success(request.id, value),
            Err(err) => {
                tracing::debug!(method = %method, error = %err, "Request failed");
                Response::error(request.id, JsonRpcError::from(&err))
            }
        }
    }

    fn initialize(&self, params: Option<&Value>) -> Result<Value, McpError> {
        let requested = params
            .map(InitializeParams::deserialize)
            .transpose()
            .map_err(|e| McpError::invalid_params(methods::INITIALIZE, e.to_string()))?
            .and_then(|p| p.protocol_version);

        let version = negotiate_version(requested.as_deref());
        tracing::info!(protocol_version = %version, "Client initialized");

        let result = InitializeResult {
            protocol_version: version.to_string(),
            capabilities: ServerCapabilities::default(),
            server_info: self.info.clone(),
        };
        serde_json::to_value(result).map_err(|e| McpError::internal(e.to_string()))
    }

    async fn tools_call(&self, params: Option<Value>) -> Result<Value, McpError> {
        let params = params
            .ok_or_else(|| McpError::invalid_params(methods::TOOLS_CALL, "missing params"))?;
        let params: CallToolParams = serde_json::from_value(params)
            .map_err(|e| McpError::invalid_params(methods::TOOLS_CALL, e.to_string()))?;

        let result = self.call_tool(&params.name, params.arguments).await?;
        serde_json::to_value(result).map_err(|e| McpError::internal(e.to_string()))
    }
}

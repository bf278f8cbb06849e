//! MCP types for tools, tool results and server identity.
//!
//! Only the tool capability is modelled; this server exposes no resources
//! or prompts.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of the `tools/list` reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    /// Catalog key, unique across all providers.
    pub name: String,
    /// Shown to the model when it picks a tool.
    pub description: String,
    /// JSON Schema object the arguments must satisfy.
    pub input_schema: Value,
}

impl Tool {
    /// Describe a tool.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// A content block in a tool result. Only text is produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    /// Plain text, usually pretty-printed JSON from the backend.
    Text {
        /// The text.
        text: String,
    },
}

impl Content {
    /// Wrap `text` in a text block.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// The text of this block.
    #[must_use]
    pub fn as_text(&self) -> &str {
        match self {
            Self::Text { text } => text,
        }
    }
}

/// The `tools/call` reply body.
///
/// `isError` is written only when it is `true`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    /// Result blocks, in order.
    pub content: Vec<Content>,
    /// Set when the tool ran and failed.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl CallToolResult {
    /// A single text block.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![Content::text(text)],
            is_error: false,
        }
    }

    /// A failure the model can read and react to.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![Content::text(message)],
            is_error: true,
        }
    }

    /// Whether the tool reported a failure.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.is_error
    }
}

/// What a tool handler hands back.
///
/// A recoverable error is still a successful protocol exchange; it is
/// returned to the model with `isError: true`.
#[derive(Debug, Clone)]
pub enum ToolOutput {
    /// Successful output.
    Success(CallToolResult),
    /// Recoverable error (visible to the model for self-correction).
    RecoverableError {
        /// The error message.
        message: String,
    },
}

impl ToolOutput {
    /// Create a text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Success(CallToolResult::text(text))
    }

    /// Create a result holding pretty-printed JSON.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        let json = serde_json::to_string_pretty(value)?;
        Ok(Self::text(json))
    }

    /// Create a recoverable error.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::RecoverableError {
            message: message.into(),
        }
    }
}

impl From<ToolOutput> for CallToolResult {
    fn from(output: ToolOutput) -> Self {
        match output {
            ToolOutput::Success(result) => result,
            ToolOutput::RecoverableError { message } => Self::error(message),
        }
    }
}

/// `serverInfo` in the `initialize` reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Display name of the server.
    pub name: String,
    /// Build version.
    pub version: String,
}

impl ServerInfo {
    /// Name and version.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// `capabilities` in the `initialize` reply.
///
/// Only tools are offered, and the catalog is fixed once the server starts,
/// so `listChanged` is always `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerCapabilities {
    /// The tool capability.
    pub tools: ToolsCapability,
}

/// Flags under `capabilities.tools`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsCapability {
    /// Whether `notifications/tools/list_changed` is ever sent.
    pub list_changed: bool,
}

/// The `initialize` reply body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    /// The revision both sides will speak.
    pub protocol_version: String,
    /// What this server offers.
    pub capabilities: ServerCapabilities,
    /// Who this server is.
    pub server_info: ServerInfo,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tool_wire_format() {
        let tool = Tool::new(
            "list_products",
            "List products",
            serde_json::json!({ "type": "object", "properties": {} }),
        );
        let json = serde_json::to_value(&tool).unwrap();
        assert_eq!(json["name"], "list_products");
        assert_eq!(json["description"], "List products");
        assert_eq!(json["inputSchema"]["type"], "object");
    }

    #[test]
    fn test_recoverable_error_sets_is_error() {
        let result: CallToolResult = ToolOutput::error("upstream returned 502").into();
        assert!(result.is_error());
        assert_eq!(result.content[0].as_text(), "upstream returned 502");

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["isError"], true);
        assert_eq!(json["content"][0]["type"], "text");
    }

    #[test]
    fn test_success_omits_is_error() {
        let result: CallToolResult = ToolOutput::text("ok").into();
        let json = serde_json::to_string(&result).unwrap();
        assert!(!json.contains("isError"));
    }

    #[test]
    fn test_initialize_result_wire_format() {
        let result = InitializeResult {
            protocol_version: "2025-06-18".into(),
            capabilities: ServerCapabilities::default(),
            server_info: ServerInfo::new("Medusa Store MCP Server", "0.1.0"),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["protocolVersion"], "2025-06-18");
        assert_eq!(json["capabilities"]["tools"]["listChanged"], false);
        assert_eq!(json["serverInfo"]["name"], "Medusa Store MCP Server");
    }
}

//! Tool descriptors and the immutable tool catalog.
//!
//! A [`ToolDescriptor`] pairs the advertised [`Tool`] metadata with a handler.
//! Arguments are validated by deserializing them into the handler's typed
//! argument struct; the same type supplies the advertised JSON schema.
//!
//! ```rust
//! use medusa_mcp_core::ToolOutput;
//! use medusa_mcp_server::catalog::ToolDescriptor;
//! use schemars::JsonSchema;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, JsonSchema)]
//! struct GetProduct {
//!     /// Product identifier.
//!     id: String,
//! }
//!
//! let tool = ToolDescriptor::new("get_product", "Fetch one product", |args: GetProduct| async move {
//!     Ok(ToolOutput::text(format!("product {}", args.id)))
//! });
//! assert_eq!(tool.name(), "get_product");
//! assert_eq!(tool.tool().input_schema["required"][0], "id");
//! ```

use futures::future::{BoxFuture, FutureExt};
use medusa_mcp_core::{McpError, Tool, ToolOutput};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;

use crate::compose::ProviderReport;

/// The future returned once a tool's arguments have been validated.
pub type ToolFuture = BoxFuture<'static, Result<ToolOutput, McpError>>;

/// A type-erased tool handler.
///
/// Validation runs synchronously and fails before any handler work starts;
/// the returned future performs the actual call.
pub type BoxedToolFn = Box<dyn Fn(Value) -> Result<ToolFuture, McpError> + Send + Sync>;

/// A callable tool: metadata plus its validating handler.
pub struct ToolDescriptor {
    tool: Tool,
    handler: BoxedToolFn,
}

impl ToolDescriptor {
    /// Create a tool whose input schema and validation come from `A`.
    pub fn new<A, F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        handler: F,
    ) -> Self
    where
        A: JsonSchema + DeserializeOwned + Send + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ToolOutput, McpError>> + Send + 'static,
    {
        let name = name.into();
        let mut schema = schemars::schema_for!(A).to_value();
        if let Some(object) = schema.as_object_mut() {
            object.remove("$schema");
            object.remove("title");
        }

        let tool_name = name.clone();
        let handler: BoxedToolFn = Box::new(move |arguments| {
            let args = serde_json::from_value::<A>(arguments)
                .map_err(|e| McpError::validation(&tool_name, e.to_string()))?;
            Ok(handler(args).boxed())
        });

        Self {
            tool: Tool::new(name, description, schema),
            handler,
        }
    }

    /// The tool's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.tool.name
    }

    /// The metadata advertised in `tools/list`.
    #[must_use]
    pub const fn tool(&self) -> &Tool {
        &self.tool
    }

    /// Validate `arguments` and start the call.
    pub fn invoke(&self, arguments: Value) -> Result<ToolFuture, McpError> {
        (self.handler)(arguments)
    }
}

impl std::fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.tool.name)
            .finish_non_exhaustive()
    }
}

/// The composed, ordered set of tools offered for the life of the process.
///
/// Built once by [`compose`](crate::compose::compose) and never mutated
/// afterwards, so it is shared across sessions without locking.
#[derive(Debug, Default)]
pub struct Catalog {
    tools: Vec<ToolDescriptor>,
    index: HashMap<String, usize>,
    reports: Vec<ProviderReport>,
}

impl Catalog {
    pub(crate) fn new(tools: Vec<ToolDescriptor>, reports: Vec<ProviderReport>) -> Self {
        let index = tools
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name().to_string(), i))
            .collect();
        Self {
            tools,
            index,
            reports,
        }
    }

    /// Look up a tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    /// Tool metadata in catalog order.
    pub fn tools(&self) -> impl Iterator<Item = &Tool> {
        self.tools.iter().map(ToolDescriptor::tool)
    }

    /// Tool names in catalog order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().map(ToolDescriptor::name)
    }

    /// Number of tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the catalog holds no tools.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Per-provider composition outcome, in provider order.
    #[must_use]
    pub fn reports(&self) -> &[ProviderReport] {
        &self.reports
    }

    /// Whether any provider was excluded during composition.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.reports.iter().any(ProviderReport::is_excluded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;

    #[derive(Deserialize, JsonSchema)]
    struct Echo {
        text: String,
    }

    fn echo_tool() -> ToolDescriptor {
        ToolDescriptor::new("echo", "Echo text back", |args: Echo| async move {
            Ok(ToolOutput::text(args.text))
        })
    }

    #[test]
    fn test_schema_is_derived_from_argument_type() {
        let tool = echo_tool();
        let schema = &tool.tool().input_schema;
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["text"]["type"], "string");
        assert!(schema.get("$schema").is_none());
    }

    #[tokio::test]
    async fn test_invoke_with_valid_arguments() {
        let tool = echo_tool();
        let output = tool
            .invoke(serde_json::json!({ "text": "hi" }))
            .unwrap()
            .await
            .unwrap();
        let result: medusa_mcp_core::CallToolResult = output.into();
        assert_eq!(result.content[0].as_text(), "hi");
    }

    #[test]
    fn test_invalid_arguments_fail_validation() {
        let tool = echo_tool();
        let Err(err) = tool.invoke(serde_json::json!({ "text": 42 })) else {
            panic!("expected validation failure");
        };
        assert!(matches!(err, McpError::Validation { ref tool, .. } if tool == "echo"));
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog = Catalog::new(vec![echo_tool()], Vec::new());
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get("echo").is_some());
        assert!(catalog.get("missing").is_none());
        assert!(!catalog.is_degraded());
    }
}

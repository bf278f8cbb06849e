//! Catalog composition from independent tool providers.
//!
//! Providers are initialized one at a time in the order given. A provider
//! whose initialization fails is left out of the catalog and reported as
//! [`ProviderReport::Excluded`]; the rest still contribute their tools.

use async_trait::async_trait;
use medusa_mcp_core::McpError;
use serde::Serialize;
use std::sync::Arc;

use crate::catalog::{Catalog, ToolDescriptor};

/// A source of tools, typically wrapping one backend API.
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// Provider name, used in logs and health reports.
    fn name(&self) -> &str;

    /// Prepare the provider (authenticate, warm up clients).
    ///
    /// Providers without an initialization step keep the default, which
    /// always succeeds.
    async fn initialize(&self) -> Result<(), McpError> {
        Ok(())
    }

    /// The provider's tools, in declaration order.
    fn tools(&self) -> Vec<ToolDescriptor>;
}

/// Outcome of composing one provider into the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ProviderReport {
    /// The provider initialized and contributed these tools.
    Included {
        /// Provider name.
        name: String,
        /// Names of the contributed tools, in declaration order.
        tools: Vec<String>,
    },
    /// The provider failed to initialize and contributed nothing.
    Excluded {
        /// Provider name.
        name: String,
        /// The initialization failure.
        reason: String,
    },
}

impl ProviderReport {
    /// The provider this report describes.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Included { name, .. } | Self::Excluded { name, .. } => name,
        }
    }

    /// Whether the provider was left out of the catalog.
    #[must_use]
    pub const fn is_excluded(&self) -> bool {
        matches!(self, Self::Excluded { .. })
    }
}

/// Build the catalog from `providers`, in priority order.
///
/// The catalog is the concatenation of each included provider's tools. When
/// two tools share a name, the later one replaces the earlier and takes the
/// later position.
pub async fn compose(providers: &[Arc<dyn ToolProvider>]) -> Catalog {
    let mut tools: Vec<ToolDescriptor> = Vec::new();
    let mut reports = Vec::with_capacity(providers.len());

    for provider in providers {
        let name = provider.name().to_string();

        if let Err(err) = provider.initialize().await {
            tracing::warn!(
                provider = %name,
                error = %err,
                "Provider failed to initialize, its tools are excluded"
            );
            reports.push(ProviderReport::Excluded {
                name,
                reason: err.to_string(),
            });
            continue;
        }

        let provided = provider.tools();
        let tool_names = provided.iter().map(|t| t.name().to_string()).collect();

        for tool in provided {
            if let Some(pos) = tools.iter().position(|t| t.name() == tool.name()) {
                tracing::warn!(
                    provider = %name,
                    tool = %tool.name(),
                    "Duplicate tool name, later registration replaces the earlier one"
                );
                tools.remove(pos);
            }
            tools.push(tool);
        }

        tracing::info!(provider = %name, "Provider included");
        reports.push(ProviderReport::Included {
            name,
            tools: tool_names,
        });
    }

    tracing::info!(tools = tools.len(), "Tool catalog composed");
    Catalog::new(tools, reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use medusa_mcp_core::ToolOutput;
    use pretty_assertions::assert_eq;
    use schemars::JsonSchema;
    use serde::Deserialize;

    #[derive(Deserialize, JsonSchema)]
    struct NoArgs {}

    fn tool(name: &'static str, reply: &'static str) -> ToolDescriptor {
        ToolDescriptor::new(name, "test tool", move |_: NoArgs| async move {
            Ok(ToolOutput::text(reply))
        })
    }

    struct FixedProvider {
        name: &'static str,
        tools: Vec<&'static str>,
        fail_init: bool,
    }

    #[async_trait]
    impl ToolProvider for FixedProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn initialize(&self) -> Result<(), McpError> {
            if self.fail_init {
                Err(McpError::provider_init(self.name, "backend unreachable"))
            } else {
                Ok(())
            }
        }

        fn tools(&self) -> Vec<ToolDescriptor> {
            self.tools.iter().map(|n| tool(*n, self.name)).collect()
        }
    }

    fn provider(name: &'static str, tools: &[&'static str], fail_init: bool) -> Arc<dyn ToolProvider> {
        Arc::new(FixedProvider {
            name,
            tools: tools.to_vec(),
            fail_init,
        })
    }

    #[tokio::test]
    async fn test_store_then_admin_order() {
        let catalog = compose(&[
            provider("store", &["list_products", "get_product"], false),
            provider("admin", &["list_orders"], false),
        ])
        .await;

        let names: Vec<&str> = catalog.names().collect();
        assert_eq!(names, vec!["list_products", "get_product", "list_orders"]);
        assert!(!catalog.is_degraded());
    }

    #[tokio::test]
    async fn test_failed_admin_is_excluded() {
        let catalog = compose(&[
            provider("store", &["list_products", "get_product"], false),
            provider("admin", &["list_orders"], true),
        ])
        .await;

        let names: Vec<&str> = catalog.names().collect();
        assert_eq!(names, vec!["list_products", "get_product"]);
        assert!(catalog.is_degraded());

        let report = &catalog.reports()[1];
        assert_eq!(report.name(), "admin");
        assert!(report.is_excluded());
    }

    #[tokio::test]
    async fn test_all_providers_failing_yields_empty_catalog() {
        let catalog = compose(&[provider("admin", &["list_orders"], true)]).await;
        assert!(catalog.is_empty());
        assert_eq!(catalog.reports().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_name_later_wins() {
        let catalog = compose(&[
            provider("first", &["shared", "only_first"], false),
            provider("second", &["shared"], false),
        ])
        .await;

        let names: Vec<&str> = catalog.names().collect();
        assert_eq!(names, vec!["only_first", "shared"]);

        let output = catalog
            .get("shared")
            .unwrap()
            .invoke(serde_json::json!({}))
            .unwrap()
            .await
            .unwrap();
        let result: medusa_mcp_core::CallToolResult = output.into();
        assert_eq!(result.content[0].as_text(), "second");
    }

    #[test]
    fn test_report_serialization() {
        let report = ProviderReport::Excluded {
            name: "admin".into(),
            reason: "bad credentials".into(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "status": "excluded", "name": "admin", "reason": "bad credentials" })
        );
    }
}

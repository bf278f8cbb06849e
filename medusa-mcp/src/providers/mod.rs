//! Tool providers backed by a Medusa commerce backend.
//!
//! Two providers share one [`MedusaClient`], in priority order:
//!
//! | Provider | Init | Tools |
//! |---|---|---|
//! | `store` | none | `list_products`, `get_product`, `list_regions` |
//! | `admin` | logs in with `MEDUSA_USERNAME`/`MEDUSA_PASSWORD` | `list_orders`, `get_order`, `list_customers` |
//!
//! Tools answer with the backend's JSON, pretty-printed. A failed backend
//! call is a recoverable tool error, not a protocol error.

mod admin;
mod client;
mod store;

use std::sync::Arc;

use medusa_mcp_core::{McpError, ToolOutput};
use medusa_mcp_server::ToolProvider;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

pub use admin::{ADMIN_LOGIN_PATH, AdminProvider};
pub use client::{ClientError, MedusaClient, PUBLISHABLE_KEY_HEADER};
pub use store::StoreProvider;

use crate::config::MedusaConfig;

/// Build the providers for `config`: store first, then admin.
pub fn medusa_providers(config: &MedusaConfig) -> Result<Vec<Arc<dyn ToolProvider>>, ClientError> {
    let client = Arc::new(MedusaClient::new(config)?);
    let credentials = config
        .credentials()
        .map(|(email, password)| (email.to_string(), password.to_string()));

    let store: Arc<dyn ToolProvider> = Arc::new(StoreProvider::new(Arc::clone(&client)));
    let admin: Arc<dyn ToolProvider> = Arc::new(AdminProvider::new(client, credentials));
    Ok(vec![store, admin])
}

/// Paging arguments shared by the list tools.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct Page {
    /// Maximum number of records to return.
    pub limit: Option<u32>,
    /// Number of records to skip.
    pub offset: Option<u32>,
}

impl Page {
    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset {
            query.push(("offset", offset.to_string()));
        }
        query
    }
}

/// Arguments naming one record.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ById {
    /// Record identifier.
    pub id: String,
}

/// Turn a backend call into tool output.
fn respond(tool: &str, result: Result<Value, ClientError>) -> Result<ToolOutput, McpError> {
    match result {
        Ok(value) => ToolOutput::json(&value).map_err(|e| McpError::internal(e.to_string())),
        Err(err) => {
            tracing::warn!(tool = %tool, error = %err, "Medusa call failed");
            Ok(ToolOutput::error(err.to_string()))
        }
    }
}

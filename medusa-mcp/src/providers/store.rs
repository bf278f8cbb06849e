//! Storefront tools. No initialization step, so this provider is always
//! part of the catalog.

use std::sync::Arc;

use async_trait::async_trait;
use medusa_mcp_server::{ToolDescriptor, ToolProvider};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::{ById, ClientError, MedusaClient, Page, respond};

/// Arguments of `list_products`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListProducts {
    /// Maximum number of products to return.
    pub limit: Option<u32>,
    /// Number of products to skip.
    pub offset: Option<u32>,
    /// Free-text search over product titles and descriptions.
    pub q: Option<String>,
}

/// Storefront API provider.
#[derive(Debug, Clone)]
pub struct StoreProvider {
    client: Arc<MedusaClient>,
}

impl StoreProvider {
    /// Create the provider over a shared client.
    #[must_use]
    pub const fn new(client: Arc<MedusaClient>) -> Self {
        Self { client }
    }
}

async fn fetch_products(client: &MedusaClient, args: ListProducts) -> Result<Value, ClientError> {
    let mut query = Page {
        limit: args.limit,
        offset: args.offset,
    }
    .query();
    if let Some(q) = args.q.filter(|q| !q.is_empty()) {
        query.push(("q", q));
    }
    client.store_get(client.endpoint("/store/products")?, &query).await
}

async fn fetch_product(client: &MedusaClient, args: ById) -> Result<Value, ClientError> {
    client.store_get(client.resource("/store/products", &args.id)?, &[]).await
}

async fn fetch_regions(client: &MedusaClient, args: Page) -> Result<Value, ClientError> {
    client.store_get(client.endpoint("/store/regions")?, &args.query()).await
}

#[async_trait]
impl ToolProvider for StoreProvider {
    fn name(&self) -> &str {
        "store"
    }

    fn tools(&self) -> Vec<ToolDescriptor> {
        let client = Arc::clone(&self.client);
        let list_products = ToolDescriptor::new(
            "list_products",
            "List products in the store, optionally filtered by a search term",
            move |args: ListProducts| {
                let client = Arc::clone(&client);
                async move { respond("list_products", fetch_products(&client, args).await) }
            },
        );

        let client = Arc::clone(&self.client);
        let get_product = ToolDescriptor::new(
            "get_product",
            "Get a single product by its ID",
            move |args: ById| {
                let client = Arc::clone(&client);
                async move { respond("get_product", fetch_product(&client, args).await) }
            },
        );

        let client = Arc::clone(&self.client);
        let list_regions = ToolDescriptor::new(
            "list_regions",
            "List the store's regions with their currencies and countries",
            move |args: Page| {
                let client = Arc::clone(&client);
                async move { respond("list_regions", fetch_regions(&client, args).await) }
            },
        );

        vec![list_products, get_product, list_regions]
    }
}

//! Admin tools.
//!
//! Initialization logs in with the configured credentials and keeps the
//! returned bearer token for every later call. Without credentials, or when
//! the backend rejects them, initialization fails and composition leaves
//! these tools out.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use medusa_mcp_core::{McpError, ToolOutput};
use medusa_mcp_server::{ToolDescriptor, ToolProvider};
use serde_json::{Value, json};
use url::Url;

use super::{ById, ClientError, MedusaClient, Page, respond};

/// Admin login endpoint.
pub const ADMIN_LOGIN_PATH: &str = "/auth/user/emailpass";

const PROVIDER: &str = "admin";

struct AdminSession {
    client: Arc<MedusaClient>,
    token: OnceLock<String>,
}

impl AdminSession {
    /// Run one admin call, or report that the session never logged in.
    async fn call(
        &self,
        tool: &str,
        url: Result<Url, ClientError>,
        query: &[(&str, String)],
    ) -> Result<ToolOutput, McpError> {
        let Some(token) = self.token.get() else {
            return Ok(ToolOutput::error("Admin session is not authenticated"));
        };
        let result = async { self.client.admin_get(url?, token, query).await }.await;
        respond(tool, result)
    }
}

/// Admin API provider.
pub struct AdminProvider {
    session: Arc<AdminSession>,
    credentials: Option<(String, String)>,
}

impl AdminProvider {
    /// Create the provider. `credentials` is `(email, password)`.
    #[must_use]
    pub fn new(client: Arc<MedusaClient>, credentials: Option<(String, String)>) -> Self {
        Self {
            session: Arc::new(AdminSession {
                client,
                token: OnceLock::new(),
            }),
            credentials,
        }
    }

    /// Whether a login has succeeded.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.token.get().is_some()
    }
}

impl std::fmt::Debug for AdminProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminProvider")
            .field("base_url", &self.session.client.base_url().as_str())
            .field("has_credentials", &self.credentials.is_some())
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

#[async_trait]
impl ToolProvider for AdminProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn initialize(&self) -> Result<(), McpError> {
        let Some((email, password)) = &self.credentials else {
            return Err(McpError::provider_init(
                PROVIDER,
                "MEDUSA_USERNAME and MEDUSA_PASSWORD must be set",
            ));
        };

        let response = self
            .session
            .client
            .post_json(ADMIN_LOGIN_PATH, &json!({ "email": email, "password": password }))
            .await
            .map_err(|e| McpError::provider_init(PROVIDER, format!("login failed: {e}")))?;

        let token = response
            .get("token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| McpError::provider_init(PROVIDER, "login response carried no token"))?;

        if self.session.token.set(token.to_string()).is_err() {
            tracing::debug!("Admin session already authenticated");
        }
        tracing::info!(user = %email, "Authenticated with Medusa admin API");
        Ok(())
    }

    fn tools(&self) -> Vec<ToolDescriptor> {
        let session = Arc::clone(&self.session);
        let list_orders = ToolDescriptor::new(
            "list_orders",
            "List orders, most recent first",
            move |args: Page| {
                let session = Arc::clone(&session);
                async move {
                    let mut query = args.query();
                    query.push(("order", "-created_at".to_string()));
                    let url = session.client.endpoint("/admin/orders");
                    session.call("list_orders", url, &query).await
                }
            },
        );

        let session = Arc::clone(&self.session);
        let get_order = ToolDescriptor::new(
            "get_order",
            "Get a single order by its ID",
            move |args: ById| {
                let session = Arc::clone(&session);
                async move {
                    let url = session.client.resource("/admin/orders", &args.id);
                    session.call("get_order", url, &[]).await
                }
            },
        );

        let session = Arc::clone(&self.session);
        let list_customers = ToolDescriptor::new(
            "list_customers",
            "List customers",
            move |args: Page| {
                let session = Arc::clone(&session);
                async move {
                    let url = session.client.endpoint("/admin/customers");
                    session.call("list_customers", url, &args.query()).await
                }
            },
        );

        vec![list_orders, get_order, list_customers]
    }
}

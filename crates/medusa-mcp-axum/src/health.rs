//! Health endpoint shared by both HTTP bindings.

use axum::Json;
use axum::extract::State;
use medusa_mcp_server::{ProviderReport, Server};
use serde::Serialize;

/// Path of the unauthenticated health endpoint.
pub const HEALTH_PATH: &str = "/health";

/// What the health endpoint needs to know about a binding.
pub trait BindingState: Clone + Send + Sync + 'static {
    /// The server core behind the binding.
    fn server(&self) -> &Server;

    /// Transport label reported in health output.
    fn transport_label(&self) -> &'static str;

    /// Whether bearer authentication is enforced.
    fn auth_enabled(&self) -> bool;

    /// Live sessions (legacy) or open streams (single endpoint).
    fn active_connections(&self) -> usize;
}

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthReport {
    /// `"ok"`, or `"degraded"` when a provider was excluded.
    pub status: &'static str,
    /// Which binding is serving.
    pub transport: &'static str,
    /// `"enabled"` or `"disabled"`.
    pub auth: &'static str,
    /// Connection count for the binding.
    #[serde(rename = "activeConnections")]
    pub active_connections: usize,
    /// Number of tools in the catalog.
    pub tools: usize,
    /// Per-provider composition outcome.
    pub providers: Vec<ProviderReport>,
}

impl HealthReport {
    /// Snapshot the health of `state`.
    pub fn collect<S: BindingState>(state: &S) -> Self {
        let catalog = state.server().catalog();
        Self {
            status: if catalog.is_degraded() { "degraded" } else { "ok" },
            transport: state.transport_label(),
            auth: if state.auth_enabled() {
                "enabled"
            } else {
                "disabled"
            },
            active_connections: state.active_connections(),
            tools: catalog.len(),
            providers: catalog.reports().to_vec(),
        }
    }
}

/// `GET /health`.
pub async fn health<S: BindingState>(State(state): State<S>) -> Json<HealthReport> {
    Json(HealthReport::collect(&state))
}

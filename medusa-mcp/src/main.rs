//! `medusa-mcp` binary: read configuration, compose the catalog, serve.

use std::sync::Arc;

use medusa_mcp::{Config, TransportBinding, build_server, logging};
use miette::IntoDiagnostic;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> miette::Result<()> {
    let config = Config::from_env()?;
    logging::init(config.log_format);
    tracing::debug!(?config, "Configuration loaded");

    let binding = TransportBinding::from_config(&config);
    let server = Arc::new(build_server(&config.medusa).await.into_diagnostic()?);

    let shutdown = CancellationToken::new();
    install_signal_handlers(&shutdown);

    binding.serve(server, shutdown).await?;
    tracing::info!("Medusa MCP server stopped");
    Ok(())
}

fn install_signal_handlers(shutdown: &CancellationToken) {
    let token = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
            return;
        }
        tracing::info!("Ctrl+C received, shutting down");
        token.cancel();
    });

    #[cfg(unix)]
    {
        let token = shutdown.clone();
        tokio::spawn(async move {
            use tokio::signal::unix::{SignalKind, signal};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                    tracing::info!("SIGTERM received, shutting down");
                    token.cancel();
                }
                Err(e) => tracing::warn!(error = %e, "Failed to install SIGTERM handler"),
            }
        });
    }
}

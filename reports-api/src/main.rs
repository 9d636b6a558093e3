//! Reports API Server Entry Point
//!
//! Bootstraps configuration and telemetry, wires the dispatcher to an
//! in-memory search backend and starts the Axum HTTP server.

use std::sync::Arc;

use reports_api::telemetry::{init_tracing, TelemetryConfig};
use reports_api::{
    create_router, ActionDispatcher, ApiError, ApiResult, ReportHandlers, ReportsConfig,
};
use reports_core::InMemorySearchBackend;

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::default();
    init_tracing(&telemetry_config)?;

    let config = ReportsConfig::from_env();
    let backend = Arc::new(InMemorySearchBackend::new());
    let handlers = ReportHandlers::new(
        backend,
        config.definitions_index.clone(),
        config.instances_index.clone(),
    );
    let dispatcher = ActionDispatcher::with_fresh_metrics(handlers)?;
    let app = create_router(dispatcher, &config);

    let addr = config.socket_addr()?;
    tracing::info!(
        %addr,
        base_uri = %config.base_uri,
        service = %telemetry_config.service_name,
        "Starting reports API server"
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

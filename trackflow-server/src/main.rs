//! trackflow-server — the batch controller microservice.
//!
//! Accepts track batches on `POST /batch` and dispatches them through
//! the fixed analyzer → transcriber → generator pipeline, reporting each
//! stage's results to the caller's callback URL.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use trackflow::adapter::HttpServiceAdapter;
use trackflow::dispatcher::BatchDispatcher;
use trackflow::registry::{default_stage_order, ServiceRegistry};
use trackflow::reporter::HttpResultReporter;
use trackflow_server::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting trackflow-server");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let registry = Arc::new(ServiceRegistry::from_env());
    let stage_order = default_stage_order();
    for stage in &stage_order {
        let usable = registry.get(stage).is_some_and(trackflow::registry::StageConfig::is_usable);
        info!(stage = %stage, configured = usable, "Pipeline stage");
    }

    let dispatcher = Arc::new(BatchDispatcher::new(
        registry,
        stage_order,
        Arc::new(HttpServiceAdapter::new()),
        Arc::new(HttpResultReporter::new()),
    ));

    let app = build_router(AppState::new(dispatcher));

    let addr = std::env::var("TRACKFLOW_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{addr}");

    axum::serve(listener, app).await?;

    Ok(())
}

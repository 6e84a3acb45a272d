use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{Router, http::HeaderValue, routing::get};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::{self, AppState};
use crate::config::TripMindConfig;
use crate::resilience::Cache;
use crate::workflow::TripPlanner;

/// Full application router: service info at `/`, the API under `/api`
pub fn app(state: Arc<AppState>, frontend_url: &str) -> Result<Router> {
    Ok(Router::new()
        .route("/", get(api::service_info))
        .nest("/api", api::router(state))
        .layer(cors(frontend_url)?)
        .layer(TraceLayer::new_for_http()))
}

fn cors(frontend_url: &str) -> Result<CorsLayer> {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if frontend_url == "*" {
        return Ok(cors.allow_origin(Any));
    }
    let origin = HeaderValue::from_str(frontend_url)
        .with_context(|| format!("Invalid frontend origin: {frontend_url}"))?;
    Ok(cors.allow_origin(origin))
}

pub async fn run(config: TripMindConfig, planner: TripPlanner, cache: Arc<Cache>) -> Result<()> {
    let state = Arc::new(AppState::new(&config, planner, cache));
    let app = app(state.clone(), &config.server.frontend_url)?;

    // drop idle client windows once per window
    let sweeper = {
        let state = state.clone();
        let period = state.limiter.window();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                state.limiter.purge_idle();
            }
        })
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Web server running at http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Web server failed")?;

    sweeper.abort();
    tracing::info!("Web server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

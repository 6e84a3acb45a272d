use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::{
    Router,
    extract::{ConnectInfo, FromRequestParts, State},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::config::TripMindConfig;
use crate::error::TripError;
use crate::resilience::{Cache, RateLimiter};
use crate::workflow::{TripPlan, TripPlanner, normalize_query};

/// Shared state behind every handler
pub struct AppState {
    pub planner: TripPlanner,
    pub cache: Arc<Cache>,
    pub limiter: RateLimiter,
    pub metrics: Metrics,
    trust_forwarded_for: bool,
}

impl AppState {
    pub fn new(config: &TripMindConfig, planner: TripPlanner, cache: Arc<Cache>) -> Self {
        Self {
            planner,
            cache,
            limiter: RateLimiter::new(config.rate_limit.requests, config.rate_limit.window()),
            metrics: Metrics::new(),
            trust_forwarded_for: config.server.trust_forwarded_for,
        }
    }
}

/// Request counters since startup
#[derive(Debug)]
pub struct Metrics {
    requests: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    rejected: AtomicU64,
    started_at: DateTime<Utc>,
}

impl Metrics {
    fn new() -> Self {
        Self {
            requests: AtomicU64::new(0),
            successes: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            started_at: Utc::now(),
        }
    }

    fn record(&self, plan: &TripPlan) {
        if plan.success {
            self.successes.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_total: self.requests.load(Ordering::Relaxed),
            successful: self.successes.load(Ordering::Relaxed),
            failed: self.failures.load(Ordering::Relaxed),
            rate_limited: self.rejected.load(Ordering::Relaxed),
            started_at: self.started_at,
            uptime_seconds: (Utc::now() - self.started_at).num_seconds(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub successful: u64,
    pub failed: u64,
    pub rate_limited: u64,
    pub started_at: DateTime<Utc>,
    pub uptime_seconds: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TripRequest {
    pub location: String,
}

/// Caller identity for inbound rate limiting.
///
/// The peer IP, or `"unknown"` without connect info. The first
/// `X-Forwarded-For` hop is used instead only when
/// `server.trust_forwarded_for` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(pub String);

impl FromRequestParts<Arc<AppState>> for ClientId {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if state.trust_forwarded_for {
            if let Some(ip) = forwarded_for(parts) {
                return Ok(ClientId(ip.to_string()));
            }
        }

        if let Some(ConnectInfo(addr)) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
            return Ok(ClientId(addr.ip().to_string()));
        }

        Ok(ClientId("unknown".to_string()))
    }
}

fn forwarded_for(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/plan-trip", post(plan_trip))
        .route("/metrics", get(metrics))
        .route("/cache", delete(clear_cache))
        .with_state(state)
}

pub async fn service_info() -> Json<Value> {
    Json(json!({
        "name": "TripMind",
        "version": crate::VERSION,
        "status": "running",
        "endpoints": ["/api/health", "/api/plan-trip", "/api/metrics"],
    }))
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "cache_entries": state.cache.len(),
    }))
}

async fn plan_trip(
    State(state): State<Arc<AppState>>,
    ClientId(client): ClientId,
    Json(request): Json<TripRequest>,
) -> Response {
    let Some(location) = normalize_query(&request.location) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "Location cannot be empty" })),
        )
            .into_response();
    };

    state.metrics.requests.fetch_add(1, Ordering::Relaxed);

    if !state.limiter.allow_request(&client) {
        state.metrics.rejected.fetch_add(1, Ordering::Relaxed);
        let retry_after = state.limiter.time_until_next_request(&client);
        warn!(
            "Rate limit exceeded for {}, retry in {:.1}s",
            client,
            retry_after.as_secs_f64()
        );
        let error = TripError::rate_limited(format!("client {client} exceeded its quota"));
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(TripPlan::rejected(location, &error)),
        )
            .into_response();
    }

    info!("Trip request from {}: {}", client, location);
    let plan = state.planner.process_query(location).await;
    state.metrics.record(&plan);
    Json(plan).into_response()
}

async fn metrics(State(state): State<Arc<AppState>>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

async fn clear_cache(State(state): State<Arc<AppState>>) -> Json<Value> {
    let cleared = state.cache.len();
    state.cache.clear();
    info!("Cleared {} cache entries", cleared);
    Json(json!({ "cleared": cleared }))
}

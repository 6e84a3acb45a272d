//! `TripMind` - tourism assistant for location queries
//!
//! A query is classified into weather, places or both, routed through the
//! matching workers and folded into one response envelope. Every upstream
//! call goes through a shared TTL cache and a bounded retry policy; the
//! geocoder is additionally throttled by a rate limiter.

pub mod agents;
pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod resilience;
pub mod services;
pub mod web;
pub mod workflow;

// Re-export core types for public API
pub use agents::{PlacesAgent, WeatherAgent};
pub use config::TripMindConfig;
pub use error::{TripError, UpstreamError};
pub use models::{GeoPoint, NamedPlace, PlacesReport, WeatherReport};
pub use resilience::{Cache, RateLimiter, RetryPolicy};
pub use services::{Geocoder, PlacesProvider, WeatherProvider};
pub use workflow::{Intent, TripPlan, TripPlanner, classify, normalize_query};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, TripError>;

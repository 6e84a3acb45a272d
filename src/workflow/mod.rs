//! Workflow engine
//!
//! ```text
//! Start -> Classified -> FetchingWeather | FetchingPlaces | FetchingBoth -> Aggregated -> Done
//! ```
//!
//! Every fetch branch converges on `Aggregated`, failures included. Worker
//! errors are contained inside the branch that raised them, so
//! [`TripPlanner::process_query`] always returns an envelope.

pub mod intent;
pub mod state;

pub use intent::{Intent, classify};
pub use state::{NO_INFORMATION, Stage, WorkflowState};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::agents::{PlacesAgent, WeatherAgent};
use crate::config::TripMindConfig;
use crate::error::TripError;
use crate::models::{PlacesReport, WeatherReport};
use crate::resilience::{Cache, RetryPolicy};
use crate::services::{NominatimClient, OpenMeteoClient, OverpassClient};

/// Final answer to one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripPlan {
    pub success: bool,
    pub response: String,
    pub intent: Option<Intent>,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub places: Option<PlacesReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

impl TripPlan {
    /// Envelope for a query refused before the workflow ran
    #[must_use]
    pub fn rejected(location: impl Into<String>, error: &TripError) -> Self {
        Self {
            success: false,
            response: error.user_message().to_string(),
            intent: None,
            location: location.into(),
            weather: None,
            places: None,
            error_type: Some(error.kind().to_string()),
        }
    }
}

impl From<WorkflowState> for TripPlan {
    fn from(state: WorkflowState) -> Self {
        let parts = state.into_parts();
        match parts.failure {
            Some(error) => Self {
                success: false,
                response: parts.response,
                intent: parts.intent,
                location: parts.location,
                weather: None,
                places: None,
                error_type: Some(error.kind().to_string()),
            },
            None => Self {
                success: true,
                response: parts.response,
                intent: parts.intent,
                location: parts.location,
                weather: parts.weather,
                places: parts.places,
                error_type: None,
            },
        }
    }
}

/// Trimmed query text, or `None` when nothing but whitespace was given
#[must_use]
pub fn normalize_query(raw: &str) -> Option<&str> {
    let query = raw.trim();
    (!query.is_empty()).then_some(query)
}

/// Orchestrates the weather and places workers for one query at a time
pub struct TripPlanner {
    weather: WeatherAgent,
    places: PlacesAgent,
}

impl TripPlanner {
    pub fn new(weather: WeatherAgent, places: PlacesAgent) -> Self {
        Self { weather, places }
    }

    /// Wire the HTTP providers around one shared cache
    pub fn from_config(config: &TripMindConfig, cache: Arc<Cache>) -> Result<Self> {
        let retry = RetryPolicy::from_config(&config.retry);

        let geocoder = Arc::new(NominatimClient::new(
            &config.geocoding,
            Arc::clone(&cache),
            retry,
        )?);
        let weather = Arc::new(OpenMeteoClient::new(
            &config.weather,
            Arc::clone(&cache),
            retry,
        )?);
        let places = Arc::new(OverpassClient::new(&config.places, cache, retry)?);

        Ok(Self::new(
            WeatherAgent::new(geocoder.clone(), weather),
            PlacesAgent::new(geocoder, places, config.places.radius_meters),
        ))
    }

    /// Shared cache with the configured TTL
    pub fn cache_from_config(config: &TripMindConfig) -> Arc<Cache> {
        Arc::new(Cache::new(config.cache.ttl()))
    }

    /// Answer one query. Never fails: errors come back in-band with
    /// `success: false`.
    #[instrument(skip(self))]
    pub async fn process_query(&self, location: &str) -> TripPlan {
        info!("Processing query for location: {}", location);
        let state = self.run(WorkflowState::new(location)).await;
        let plan = TripPlan::from(state);

        if plan.success {
            info!("Query processed successfully: {}", location);
        } else {
            warn!("Query for '{}' failed: {}", location, plan.response);
        }
        plan
    }

    /// Drive `state` from its current stage to `Done`
    pub async fn run(&self, mut state: WorkflowState) -> WorkflowState {
        loop {
            let next = match state.stage {
                Stage::Start => {
                    let intent = classify(state.location());
                    info!("Intent analyzed: {} for location: {}", intent, state.location());
                    state.set_intent(intent);
                    Stage::Classified
                }
                Stage::Classified => Stage::fetching(state.intent().unwrap_or(Intent::Both)),
                Stage::FetchingWeather => {
                    self.fetch_weather(&mut state).await;
                    Stage::Aggregated
                }
                Stage::FetchingPlaces => {
                    self.fetch_places(&mut state).await;
                    Stage::Aggregated
                }
                Stage::FetchingBoth => {
                    // places only runs once weather succeeded
                    self.fetch_weather(&mut state).await;
                    if !state.failed() {
                        self.fetch_places(&mut state).await;
                    }
                    Stage::Aggregated
                }
                Stage::Aggregated => {
                    state.aggregate();
                    Stage::Done
                }
                Stage::Done => return state,
            };
            state.stage = next;
        }
    }

    async fn fetch_weather(&self, state: &mut WorkflowState) {
        if state.failed() {
            return;
        }
        match self.weather.get_weather(state.location()).await {
            Ok(report) => {
                info!("Weather data fetched successfully");
                state.set_weather(report);
            }
            Err(error) => state.fail(contain(error, TripError::weather_unavailable)),
        }
    }

    async fn fetch_places(&self, state: &mut WorkflowState) {
        if state.failed() {
            return;
        }
        match self.places.get_places(state.location()).await {
            Ok(report) => {
                info!("Places data fetched successfully");
                state.set_places(report);
            }
            Err(error) => state.fail(contain(error, TripError::places_unavailable)),
        }
    }
}

/// Collapse a branch failure to not-found or this branch's unavailable kind
fn contain(error: TripError, unavailable: fn(String) -> TripError) -> TripError {
    match error {
        TripError::LocationNotFound { .. } => error,
        other => {
            let contained = unavailable(other.to_string());
            if contained.kind() != other.kind() {
                warn!("Reclassified branch failure '{}' as {}", other, contained.kind());
            }
            contained
        }
    }
}

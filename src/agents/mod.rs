//! Child workers
//!
//! A worker turns a raw location string into one report by chaining
//! geocode -> provider fetch -> formatting. Every failure leaves a worker
//! already classified as a [`TripError`].

pub mod places_agent;
pub mod weather_agent;

pub use places_agent::{MAX_ATTRACTIONS, PlacesAgent, select_attractions};
pub use weather_agent::WeatherAgent;

use tracing::{error, warn};

use crate::error::{TripError, UpstreamError};
use crate::models::GeoPoint;
use crate::services::Geocoder;

/// Geocode `location`. Not-found passes through as
/// [`TripError::LocationNotFound`]; anything else becomes `unavailable`.
async fn resolve(
    geocoder: &dyn Geocoder,
    location: &str,
    unavailable: fn(String) -> TripError,
) -> Result<GeoPoint, TripError> {
    geocoder
        .geocode(location)
        .await
        .map_err(|err| classify_geocoding_error(location, err, unavailable))
}

fn classify_geocoding_error(
    location: &str,
    err: UpstreamError,
    unavailable: fn(String) -> TripError,
) -> TripError {
    if err.is_not_found() {
        warn!("Location not found: {}", location);
        TripError::location_not_found(location)
    } else {
        error!("Geocoding failed for '{}': {}", location, err);
        unavailable(format!("geocoding failed for '{location}'"))
    }
}

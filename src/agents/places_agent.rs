use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use super::resolve;
use crate::error::{Result, TripError};
use crate::models::{NamedPlace, PlacesReport};
use crate::services::{Geocoder, PlacesProvider};

/// Upper bound on attractions in a report
pub const MAX_ATTRACTIONS: usize = 5;

/// Categories picked before any other named place
const NOTABLE_CATEGORIES: [&str; 12] = [
    "attraction",
    "museum",
    "gallery",
    "viewpoint",
    "zoo",
    "theme_park",
    "park",
    "monument",
    "palace",
    "castle",
    "fort",
    "memorial",
];

/// Fetches and formats tourist attractions for a location
pub struct PlacesAgent {
    geocoder: Arc<dyn Geocoder>,
    provider: Arc<dyn PlacesProvider>,
    radius_meters: u32,
}

impl PlacesAgent {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        provider: Arc<dyn PlacesProvider>,
        radius_meters: u32,
    ) -> Self {
        Self {
            geocoder,
            provider,
            radius_meters,
        }
    }

    #[instrument(name = "places_agent", skip(self))]
    pub async fn get_places(&self, location: &str) -> Result<PlacesReport> {
        let point = resolve(
            self.geocoder.as_ref(),
            location,
            TripError::places_unavailable,
        )
        .await?;

        let candidates = self
            .provider
            .places_near(&point, self.radius_meters)
            .await
            .map_err(|err| {
                error!("Places API error for '{}': {}", location, err);
                TripError::places_unavailable("Failed to fetch tourist attractions")
            })?;

        let places = select_attractions(&candidates, MAX_ATTRACTIONS);
        if places.is_empty() {
            warn!("No places found for: {}", location);
        }

        let report = PlacesReport::new(point.city_name(), places);
        info!(
            "Places agent successfully processed: {}, found {} places",
            location,
            report.places.len()
        );
        Ok(report)
    }
}

/// Pick up to `limit` distinct names: notable categories first, in provider
/// order, then any remaining named entry in provider order.
#[must_use]
pub fn select_attractions(candidates: &[NamedPlace], limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut selected = Vec::with_capacity(limit);

    let notable = candidates
        .iter()
        .filter(|place| place.has_category_like(&NOTABLE_CATEGORIES));

    for place in notable.chain(candidates.iter()) {
        if selected.len() >= limit {
            break;
        }
        if seen.insert(place.name.as_str()) {
            selected.push(place.name.clone());
        }
    }

    selected
}

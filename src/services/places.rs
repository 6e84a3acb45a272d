//! Overpass points-of-interest client

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

use super::{PlacesProvider, check_status};
use crate::config::PlacesConfig;
use crate::error::UpstreamError;
use crate::models::{GeoPoint, NamedPlace};
use crate::resilience::{Cache, RetryPolicy, cached_call};

/// Tags whose values are reported as categories, in this order
const CATEGORY_TAGS: [&str; 3] = ["tourism", "leisure", "historic"];

pub struct OverpassClient {
    client: Client,
    base_url: String,
    cache: Arc<Cache>,
    retry: RetryPolicy,
}

#[derive(Debug, Deserialize)]
struct InterpreterResponse {
    #[serde(default)]
    elements: Vec<Element>,
}

#[derive(Debug, Deserialize)]
struct Element {
    #[serde(default)]
    tags: HashMap<String, String>,
}

impl Element {
    fn into_named_place(mut self) -> Option<NamedPlace> {
        let name = self.tags.remove("name").filter(|n| !n.trim().is_empty())?;
        let categories = CATEGORY_TAGS
            .iter()
            .filter_map(|tag| self.tags.remove(*tag))
            .collect();
        Some(NamedPlace { name, categories })
    }
}

impl OverpassClient {
    pub fn new(
        config: &PlacesConfig,
        cache: Arc<Cache>,
        retry: RetryPolicy,
    ) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("TripMind/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            cache,
            retry,
        })
    }

    async fn fetch(&self, point: &GeoPoint, radius: u32) -> Result<Vec<NamedPlace>, UpstreamError> {
        let query = build_query(point, radius);
        debug!("Overpass query: {}", query);

        let response = self
            .client
            .post(&self.base_url)
            .form(&[("data", query.as_str())])
            .send()
            .await?;
        let response = check_status("Overpass", response).await?;
        let body: InterpreterResponse = response.json().await?;

        Ok(body
            .elements
            .into_iter()
            .filter_map(Element::into_named_place)
            .collect())
    }
}

/// Tourism, park and historic nodes and ways within `radius` meters
fn build_query(point: &GeoPoint, radius: u32) -> String {
    let around = format!("(around:{radius},{},{})", point.latitude, point.longitude);
    format!(
        "[out:json];(\
node[\"tourism\"]{around};\
way[\"tourism\"]{around};\
node[\"leisure\"=\"park\"]{around};\
way[\"leisure\"=\"park\"]{around};\
node[\"historic\"]{around};\
way[\"historic\"]{around};\
);out body;"
    )
}

#[async_trait]
impl PlacesProvider for OverpassClient {
    #[instrument(skip(self), fields(lat = point.latitude, lon = point.longitude))]
    async fn places_near(
        &self,
        point: &GeoPoint,
        radius_meters: u32,
    ) -> Result<Vec<NamedPlace>, UpstreamError> {
        let key = format!("{}:{radius_meters}", point.cache_key("places"));
        let places = cached_call(&self.cache, &key, &self.retry, || {
            self.fetch(point, radius_meters)
        })
        .await?;
        info!(
            "Found {} named places within {}m of {}",
            places.len(),
            radius_meters,
            point.format_coordinates()
        );
        Ok(places)
    }
}

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use super::{Geocoder, check_status};
use crate::config::GeocodingConfig;
use crate::error::UpstreamError;
use crate::models::GeoPoint;
use crate::resilience::{Cache, RateLimiter, RetryPolicy, cached_call};

const LIMITER_KEY: &str = "nominatim";

/// Nominatim search client
pub struct NominatimClient {
    client: Client,
    base_url: String,
    email: String,
    cache: Arc<Cache>,
    retry: RetryPolicy,
    limiter: RateLimiter,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    lat: String,
    lon: String,
    display_name: String,
}

impl NominatimClient {
    pub fn new(
        config: &GeocodingConfig,
        cache: Arc<Cache>,
        retry: RetryPolicy,
    ) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            email: config.email.clone(),
            cache,
            retry,
            // the public instance allows one request per second
            limiter: RateLimiter::spacing(Duration::from_millis(config.min_interval_ms)),
        })
    }

    fn search_url(&self, location: &str) -> String {
        format!(
            "{}?q={}&format=json&limit=1&email={}",
            self.base_url,
            urlencoding::encode(location),
            urlencoding::encode(&self.email)
        )
    }

    async fn search(&self, location: &str) -> Result<GeoPoint, UpstreamError> {
        self.limiter.acquire(LIMITER_KEY).await;

        let url = self.search_url(location);
        debug!("Nominatim request URL: {}", url);
        let start_time = Instant::now();

        let response = self.client.get(&url).send().await?;
        let response = check_status("Nominatim", response).await?;
        let results: Vec<SearchResult> = response.json().await?;

        debug!(
            "Nominatim answered in {:.3}s",
            start_time.elapsed().as_secs_f64()
        );

        let Some(first) = results.into_iter().next() else {
            warn!("Location not found: {}", location);
            return Err(UpstreamError::not_found(format!(
                "Location '{location}' not found"
            )));
        };

        let latitude = parse_coordinate(&first.lat, "latitude")?;
        let longitude = parse_coordinate(&first.lon, "longitude")?;
        Ok(GeoPoint::new(latitude, longitude, first.display_name))
    }
}

fn parse_coordinate(raw: &str, what: &str) -> Result<f64, UpstreamError> {
    raw.parse::<f64>()
        .map_err(|_| UpstreamError::invalid_response(format!("Invalid {what}: {raw}")))
}

#[async_trait]
impl Geocoder for NominatimClient {
    #[instrument(skip(self))]
    async fn geocode(&self, location: &str) -> Result<GeoPoint, UpstreamError> {
        let key = format!("geocode:{}", location.trim().to_lowercase());
        let point = cached_call(&self.cache, &key, &self.retry, || self.search(location)).await?;
        info!(
            "Geocoded '{}' to {} ({})",
            location,
            point.display_name,
            point.format_coordinates()
        );
        Ok(point)
    }
}

//! Open-Meteo current weather client

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use super::{WeatherProvider, check_status};
use crate::config::WeatherConfig;
use crate::error::UpstreamError;
use crate::models::{CurrentWeather, GeoPoint};
use crate::resilience::{Cache, RetryPolicy, cached_call};

pub struct OpenMeteoClient {
    client: Client,
    base_url: String,
    cache: Arc<Cache>,
    retry: RetryPolicy,
}

impl OpenMeteoClient {
    pub fn new(
        config: &WeatherConfig,
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

    fn forecast_url(&self, point: &GeoPoint) -> String {
        format!(
            "{}?latitude={}&longitude={}&current=temperature_2m,precipitation_probability&temperature_unit=celsius",
            self.base_url, point.latitude, point.longitude
        )
    }

    async fn fetch(&self, point: &GeoPoint) -> Result<CurrentWeather, UpstreamError> {
        let url = self.forecast_url(point);
        debug!("OpenMeteo API request URL: {}", url);
        let start_time = Instant::now();

        let response = self.client.get(&url).send().await?;
        let response = check_status("Open-Meteo", response).await?;
        let forecast: openmeteo::ForecastResponse = response.json().await?;

        let total_duration = start_time.elapsed();
        if total_duration.as_secs() > 5 {
            warn!(
                "Slow API response detected: {:.3}s",
                total_duration.as_secs_f64()
            );
        }

        forecast.into_current()
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoClient {
    #[instrument(skip(self), fields(lat = point.latitude, lon = point.longitude))]
    async fn current_weather(&self, point: &GeoPoint) -> Result<CurrentWeather, UpstreamError> {
        let key = point.cache_key("weather");
        let weather = cached_call(&self.cache, &key, &self.retry, || self.fetch(point)).await?;
        info!(
            "Current weather at {}: {} ({}% precipitation)",
            point.format_coordinates(),
            weather.format_temperature(),
            weather.precipitation_probability
        );
        Ok(weather)
    }
}

/// `OpenMeteo` API response structures
mod openmeteo {
    use super::{CurrentWeather, UpstreamError};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct ForecastResponse {
        pub current: Option<CurrentData>,
    }

    #[derive(Debug, Deserialize)]
    pub struct CurrentData {
        #[serde(rename = "temperature_2m")]
        pub temperature: Option<f64>,
        pub precipitation_probability: Option<f64>,
    }

    impl ForecastResponse {
        pub fn into_current(self) -> Result<CurrentWeather, UpstreamError> {
            let current = self.current.ok_or_else(|| {
                UpstreamError::invalid_response("No current weather data available from OpenMeteo")
            })?;
            let temperature = current.temperature.ok_or_else(|| {
                UpstreamError::invalid_response("OpenMeteo response has no temperature")
            })?;
            // a missing probability is reported as no chance of rain
            let precipitation_probability =
                current.precipitation_probability.unwrap_or(0.0).clamp(0.0, 100.0).round() as u8;

            Ok(CurrentWeather {
                temperature,
                precipitation_probability,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_current_block() {
        let body = r#"{"latitude":48.86,"longitude":2.34,"current":{"time":"2024-05-01T12:00","interval":900,"temperature_2m":18.0,"precipitation_probability":20}}"#;
        let response: openmeteo::ForecastResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            response.into_current().unwrap(),
            CurrentWeather {
                temperature: 18.0,
                precipitation_probability: 20
            }
        );
    }

    #[test]
    fn test_missing_probability_defaults_to_zero() {
        let body = r#"{"current":{"temperature_2m":-3.5,"precipitation_probability":null}}"#;
        let response: openmeteo::ForecastResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.into_current().unwrap().precipitation_probability, 0);
    }

    #[test]
    fn test_missing_current_is_invalid_response() {
        let response: openmeteo::ForecastResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(
            response.into_current(),
            Err(UpstreamError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn test_forecast_url() {
        let client = OpenMeteoClient::new(
            &WeatherConfig::default(),
            Arc::new(Cache::new(Duration::from_secs(60))),
            RetryPolicy::default(),
        )
        .unwrap();
        let url = client.forecast_url(&GeoPoint::new(48.8566, 2.3522, "Paris"));
        assert_eq!(
            url,
            "https://api.open-meteo.com/v1/forecast?latitude=48.8566&longitude=2.3522&current=temperature_2m,precipitation_probability&temperature_unit=celsius"
        );
    }
}

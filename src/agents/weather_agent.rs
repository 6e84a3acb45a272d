use std::sync::Arc;
use tracing::{error, info, instrument};

use super::resolve;
use crate::error::{Result, TripError};
use crate::models::WeatherReport;
use crate::services::{Geocoder, WeatherProvider};

/// Fetches and formats current weather for a location
pub struct WeatherAgent {
    geocoder: Arc<dyn Geocoder>,
    provider: Arc<dyn WeatherProvider>,
}

impl WeatherAgent {
    pub fn new(geocoder: Arc<dyn Geocoder>, provider: Arc<dyn WeatherProvider>) -> Self {
        Self { geocoder, provider }
    }

    #[instrument(name = "weather_agent", skip(self))]
    pub async fn get_weather(&self, location: &str) -> Result<WeatherReport> {
        let point = resolve(
            self.geocoder.as_ref(),
            location,
            TripError::weather_unavailable,
        )
        .await?;

        let weather = self.provider.current_weather(&point).await.map_err(|err| {
            error!("Weather API error for '{}': {}", location, err);
            TripError::weather_unavailable("Failed to fetch weather information")
        })?;

        let report = WeatherReport::new(point.city_name(), &weather);
        info!("Weather agent successfully processed: {}", location);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::fakes::{FakeGeocoder, FakeWeather, count};
    use crate::error::UpstreamError;

    #[tokio::test]
    async fn test_weather_report_for_resolved_location() {
        let geocoder = Arc::new(FakeGeocoder::found("Paris, Île-de-France, France"));
        let provider = Arc::new(FakeWeather::reporting(18.0, 20));
        let agent = WeatherAgent::new(geocoder, provider);

        let report = agent.get_weather("Paris").await.unwrap();
        assert_eq!(report.location, "Paris");
        assert_eq!(report.temperature, 18.0);
        assert_eq!(report.precipitation_probability, 20);
        assert_eq!(
            report.summary,
            "In Paris it's currently 18.0°C with a chance of 20% to rain."
        );
    }

    #[tokio::test]
    async fn test_not_found_skips_provider() {
        let geocoder = Arc::new(FakeGeocoder::failing(UpstreamError::not_found("nothing")));
        let provider = Arc::new(FakeWeather::reporting(18.0, 20));
        let agent = WeatherAgent::new(geocoder, provider.clone());

        let err = agent.get_weather("INVALIDXYZ123").await.unwrap_err();
        assert_eq!(err, TripError::location_not_found("INVALIDXYZ123"));
        assert_eq!(count(&provider.calls), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_is_wrapped() {
        let geocoder = Arc::new(FakeGeocoder::found("Oslo, Norway"));
        let provider = Arc::new(FakeWeather::failing(UpstreamError::RetriesExhausted {
            attempts: 3,
            message: "timed out".into(),
        }));
        let agent = WeatherAgent::new(geocoder, provider);

        let err = agent.get_weather("Oslo").await.unwrap_err();
        assert!(matches!(err, TripError::WeatherUnavailable { .. }));
        // the upstream detail stays in the logs
        assert!(!err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_geocoder_outage_is_weather_unavailable() {
        let geocoder = Arc::new(FakeGeocoder::failing(UpstreamError::transport("reset")));
        let provider = Arc::new(FakeWeather::reporting(1.0, 0));
        let agent = WeatherAgent::new(geocoder, provider.clone());

        let err = agent.get_weather("Lima").await.unwrap_err();
        assert!(matches!(err, TripError::WeatherUnavailable { .. }));
        assert_eq!(count(&provider.calls), 0);
    }
}

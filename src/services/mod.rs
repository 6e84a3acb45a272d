//! Upstream provider adapters
//!
//! Each provider is a trait with a single coarse-grained operation so the
//! workers can be exercised against fakes. The HTTP implementations go through
//! the shared [`Cache`](crate::resilience::Cache) and a
//! [`RetryPolicy`](crate::resilience::RetryPolicy).

pub mod geocoding;
pub mod places;
pub mod weather;

pub use geocoding::NominatimClient;
pub use places::OverpassClient;
pub use weather::OpenMeteoClient;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};

use crate::error::UpstreamError;
use crate::models::{CurrentWeather, GeoPoint, NamedPlace};

/// Resolves free text to a point
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, location: &str) -> Result<GeoPoint, UpstreamError>;
}

/// Current conditions at a point
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current_weather(&self, point: &GeoPoint) -> Result<CurrentWeather, UpstreamError>;
}

/// Named points of interest around a point, in provider order
#[async_trait]
pub trait PlacesProvider: Send + Sync {
    async fn places_near(
        &self,
        point: &GeoPoint,
        radius_meters: u32,
    ) -> Result<Vec<NamedPlace>, UpstreamError>;
}

/// Map a non-success status to the upstream taxonomy, passing successes through
async fn check_status(provider: &str, response: Response) -> Result<Response, UpstreamError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(match status {
        StatusCode::TOO_MANY_REQUESTS => {
            UpstreamError::rate_limited(format!("{provider} rate limit exceeded"))
        }
        StatusCode::NOT_FOUND => UpstreamError::not_found(format!("{provider}: {body}")),
        s if s.is_server_error() || s == StatusCode::REQUEST_TIMEOUT => {
            UpstreamError::transport(format!("{provider} returned {s}"))
        }
        s => UpstreamError::Status {
            status: s.as_u16(),
            message: format!("{provider} error: {body}"),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http;
    use rstest::rstest;

    fn response(status: u16, body: &'static str) -> Response {
        Response::from(
            http::Response::builder()
                .status(status)
                .body(body)
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let passed = check_status("Nominatim", response(200, "[]")).await.unwrap();
        assert_eq!(passed.status(), StatusCode::OK);
        assert_eq!(passed.text().await.unwrap(), "[]");
    }

    #[rstest]
    #[case(429, true)]
    #[case(503, true)]
    #[case(500, true)]
    #[case(408, true)]
    #[case(404, false)]
    #[case(400, false)]
    #[tokio::test]
    async fn test_status_retry_class(#[case] status: u16, #[case] transient: bool) {
        let err = check_status("Overpass", response(status, "nope"))
            .await
            .unwrap_err();
        assert_eq!(err.is_transient(), transient, "status {status} gave {err:?}");
    }

    #[tokio::test]
    async fn test_status_variants() {
        assert!(matches!(
            check_status("Nominatim", response(429, "")).await,
            Err(UpstreamError::RateLimited { .. })
        ));
        assert!(matches!(
            check_status("Open-Meteo", response(503, "down")).await,
            Err(UpstreamError::Transport { .. })
        ));
        assert!(matches!(
            check_status("Nominatim", response(404, "")).await,
            Err(UpstreamError::NotFound { .. })
        ));
        assert!(matches!(
            check_status("Overpass", response(400, "bad query")).await,
            Err(UpstreamError::Status { status: 400, ref message }) if message.contains("bad query")
        ));
    }

    #[tokio::test]
    async fn test_undecodable_body_is_invalid_response() {
        let err: UpstreamError = response(200, "<html>oops</html>")
            .json::<Vec<String>>()
            .await
            .unwrap_err()
            .into();
        assert!(matches!(err, UpstreamError::InvalidResponse { .. }));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_reqwest_status_error_is_status() {
        let err: UpstreamError = response(401, "").error_for_status().unwrap_err().into();
        assert!(matches!(err, UpstreamError::Status { status: 401, .. }));
        assert!(!err.is_transient());
    }
}

//! Error types and handling for `TripMind`
//!
//! Two layers of classification live here. [`UpstreamError`] describes what
//! went wrong talking to an external provider and decides whether a call may be
//! retried. [`TripError`] is the user-facing taxonomy every worker returns and
//! the planner folds into its response envelope.

use thiserror::Error;

/// Classified failure of a single upstream call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UpstreamError {
    /// The provider answered but had nothing for the query
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// The provider (or our own outbound limiter) refused the call
    #[error("Rate limited: {message}")]
    RateLimited { message: String },

    /// Connection, timeout or server-side failure
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// The provider answered with a body we could not use
    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    /// Non-retryable HTTP status
    #[error("Unexpected status {status}: {message}")]
    Status { status: u16, message: String },

    /// A transient failure persisted through every allowed attempt
    #[error("Gave up after {attempts} attempts: {message}")]
    RetriesExhausted { attempts: u32, message: String },
}

impl UpstreamError {
    /// Create a new not-found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a new rate-limited error
    pub fn rate_limited<S: Into<String>>(message: S) -> Self {
        Self::RateLimited {
            message: message.into(),
        }
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a new invalid-response error
    pub fn invalid_response<S: Into<String>>(message: S) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Whether the retry wrapper may attempt the call again
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Transport { .. })
    }

    /// Whether the provider positively reported that nothing matched
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::invalid_response(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Status {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            // timeouts, connect failures, broken bodies
            Self::transport(err.to_string())
        }
    }
}

/// Failure taxonomy surfaced by the workers and the planner
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TripError {
    /// Geocoding could not resolve the query
    #[error("Location not found: {location}")]
    LocationNotFound { location: String },

    /// Weather provider failed
    #[error("Weather unavailable: {message}")]
    WeatherUnavailable { message: String },

    /// Places provider failed
    #[error("Places unavailable: {message}")]
    PlacesUnavailable { message: String },

    /// Request rejected by a rate limiter
    #[error("Rate limited: {message}")]
    RateLimited { message: String },

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Anything else
    #[error("Unexpected error: {message}")]
    Unknown { message: String },
}

impl TripError {
    /// Create a new location-not-found error
    pub fn location_not_found<S: Into<String>>(location: S) -> Self {
        Self::LocationNotFound {
            location: location.into(),
        }
    }

    /// Create a new weather-unavailable error
    pub fn weather_unavailable<S: Into<String>>(message: S) -> Self {
        Self::WeatherUnavailable {
            message: message.into(),
        }
    }

    /// Create a new places-unavailable error
    pub fn places_unavailable<S: Into<String>>(message: S) -> Self {
        Self::PlacesUnavailable {
            message: message.into(),
        }
    }

    /// Create a new rate-limited error
    pub fn rate_limited<S: Into<String>>(message: S) -> Self {
        Self::RateLimited {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new unknown error
    pub fn unknown<S: Into<String>>(message: S) -> Self {
        Self::Unknown {
            message: message.into(),
        }
    }

    /// Get the fixed user-facing message for this error
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            TripError::LocationNotFound { .. } => "I don't know this place exists",
            TripError::WeatherUnavailable { .. } => {
                "Unable to fetch weather information at the moment"
            }
            TripError::PlacesUnavailable { .. } => {
                "Unable to fetch places information at the moment"
            }
            TripError::RateLimited { .. } => "Too many requests. Please try again in a moment.",
            TripError::Config { .. } | TripError::Unknown { .. } => {
                "An unexpected error occurred. Please try again."
            }
        }
    }

    /// Stable machine-readable error type
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            TripError::LocationNotFound { .. } => "location_not_found",
            TripError::WeatherUnavailable { .. } => "weather_api_error",
            TripError::PlacesUnavailable { .. } => "places_api_error",
            TripError::RateLimited { .. } => "rate_limit_error",
            TripError::Config { .. } | TripError::Unknown { .. } => "unknown_error",
        }
    }
}

/// Result type used by the workers and the planner
pub type Result<T> = std::result::Result<T, TripError>;

//! Configuration management for `TripMind`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::TripError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for `TripMind`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TripMindConfig {
    /// Geocoder (Nominatim) settings
    pub geocoding: GeocodingConfig,
    /// Weather provider (Open-Meteo) settings
    pub weather: WeatherConfig,
    /// Places provider (Overpass) settings
    pub places: PlacesConfig,
    /// Response cache settings
    pub cache: CacheConfig,
    /// Inbound request throttling
    pub rate_limit: RateLimitConfig,
    /// Upstream retry settings
    pub retry: RetryConfig,
    /// HTTP server settings
    pub server: ServerConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Nominatim geocoding settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    /// Base URL of the search endpoint
    pub base_url: String,
    /// User agent required by the Nominatim usage policy
    pub user_agent: String,
    /// Contact email sent with each request
    pub email: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Minimum spacing between outbound requests in milliseconds
    pub min_interval_ms: u64,
}

/// Open-Meteo weather settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Base URL of the forecast endpoint
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

/// Overpass places settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacesConfig {
    /// Base URL of the interpreter endpoint
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Search radius around the geocoded point, in meters
    pub radius_meters: u32,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Time to live of a cached upstream result, in seconds
    pub ttl_seconds: u64,
}

/// Inbound rate limiting
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests admitted per client within one window
    pub requests: u32,
    /// Window length in seconds
    pub window_seconds: u64,
}

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per upstream call
    pub max_retries: u32,
    /// Base delay in seconds, multiplied by the attempt number
    pub delay_seconds: f64,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origin allowed by CORS, `*` for any
    pub frontend_url: String,
    /// Take the client identity from `X-Forwarded-For`. Only safe behind a
    /// proxy that overwrites the header.
    pub trust_forwarded_for: bool,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
}

// Default value functions
fn default_geocoding_base_url() -> String {
    "https://nominatim.openstreetmap.org/search".to_string()
}

fn default_user_agent() -> String {
    "tripmind-ai-production".to_string()
}

fn default_email() -> String {
    "demo@example.com".to_string()
}

fn default_weather_base_url() -> String {
    "https://api.open-meteo.com/v1/forecast".to_string()
}

fn default_places_base_url() -> String {
    "https://overpass-api.de/api/interpreter".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoding_base_url(),
            user_agent: default_user_agent(),
            email: default_email(),
            timeout_seconds: 10,
            min_interval_ms: 1000,
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            timeout_seconds: 10,
        }
    }
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            base_url: default_places_base_url(),
            timeout_seconds: 15,
            radius_meters: 10_000,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_seconds: 3600 }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests: 10,
            window_seconds: 60,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay_seconds: 1.0,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            frontend_url: "http://localhost:5500".to_string(),
            trust_forwarded_for: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

impl RateLimitConfig {
    #[must_use]
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }
}

impl RetryConfig {
    #[must_use]
    pub fn base_delay(&self) -> Duration {
        Duration::from_secs_f64(self.delay_seconds)
    }
}

impl TripMindConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // TRIPMIND_CACHE__TTL_SECONDS=60 overrides cache.ttl_seconds
        builder = builder.add_source(
            Environment::with_prefix("TRIPMIND")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: TripMindConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tripmind").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.geocoding.base_url.is_empty() {
            self.geocoding.base_url = default_geocoding_base_url();
        }
        if self.geocoding.user_agent.is_empty() {
            self.geocoding.user_agent = default_user_agent();
        }
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.places.base_url.is_empty() {
            self.places.base_url = default_places_base_url();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        for (name, timeout) in [
            ("Geocoding", self.geocoding.timeout_seconds),
            ("Weather", self.weather.timeout_seconds),
            ("Places", self.places.timeout_seconds),
        ] {
            if timeout == 0 || timeout > 300 {
                return Err(TripError::config(format!(
                    "{name} timeout must be between 1 and 300 seconds"
                ))
                .into());
            }
        }

        if self.cache.ttl_seconds == 0 {
            return Err(TripError::config("Cache TTL must be at least 1 second").into());
        }

        if self.rate_limit.requests == 0 {
            return Err(TripError::config("Rate limit must admit at least one request").into());
        }

        if self.rate_limit.window_seconds == 0 {
            return Err(TripError::config("Rate limit window must be at least 1 second").into());
        }

        if self.retry.max_retries == 0 || self.retry.max_retries > 10 {
            return Err(TripError::config("Max retries must be between 1 and 10").into());
        }

        if !self.retry.delay_seconds.is_finite()
            || self.retry.delay_seconds < 0.0
            || self.retry.delay_seconds > 60.0
        {
            return Err(TripError::config("Retry delay must be between 0 and 60 seconds").into());
        }

        if self.places.radius_meters == 0 || self.places.radius_meters > 50_000 {
            return Err(TripError::config("Places radius must be between 1 and 50000 meters").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(TripError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(TripError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("Geocoding", &self.geocoding.base_url),
            ("Weather", &self.weather.base_url),
            ("Places", &self.places.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(TripError::config(format!(
                    "{name} base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = TripMindConfig::default();
        assert_eq!(config.cache.ttl_seconds, 3600);
        assert_eq!(config.rate_limit.requests, 10);
        assert_eq!(config.rate_limit.window_seconds, 60);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.base_delay(), Duration::from_secs(1));
        assert!(!config.server.trust_forwarded_for);
        assert_eq!(config.places.radius_meters, 10_000);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = TripMindConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = TripMindConfig::default();
        config.weather.timeout_seconds = 500;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout must be between"));

        let mut config = TripMindConfig::default();
        config.retry.max_retries = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_rejects_bad_url() {
        let mut config = TripMindConfig::default();
        config.places.base_url = "overpass".to_string();
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("Places base URL"));
    }

    #[test]
    fn test_apply_defaults_fills_empty_strings() {
        let mut config = TripMindConfig::default();
        config.weather.base_url.clear();
        config.logging.format.clear();
        config.apply_defaults();
        assert_eq!(config.weather.base_url, "https://api.open-meteo.com/v1/forecast");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_load_from_file_with_partial_sections() {
        let path = std::env::temp_dir().join(format!(
            "tripmind-config-test-{}.toml",
            std::process::id()
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[cache]\nttl_seconds = 120\n\n[retry]\ndelay_seconds = 0.5").unwrap();

        let config = TripMindConfig::load_from_path(Some(path.clone())).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.cache.ttl_seconds, 120);
        assert_eq!(config.retry.base_delay(), Duration::from_millis(500));
        // untouched sections keep their defaults
        assert_eq!(config.rate_limit.requests, 10);
        assert_eq!(config.geocoding.user_agent, "tripmind-ai-production");
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = TripMindConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("tripmind"));
            assert!(path.to_string_lossy().ends_with("config.toml"));
        }
    }
}

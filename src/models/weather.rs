//! Weather data model and display methods

use serde::{Deserialize, Serialize};

/// Current conditions returned by the weather provider
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CurrentWeather {
    /// Temperature in Celsius
    pub temperature: f64,
    /// Chance of precipitation in percent (0-100)
    pub precipitation_probability: u8,
}

impl CurrentWeather {
    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{:.1}°C", self.temperature)
    }
}

/// Output of the weather worker
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherReport {
    /// City display name
    pub location: String,
    pub temperature: f64,
    pub precipitation_probability: u8,
    /// Sentence merged into the final response
    pub summary: String,
}

impl WeatherReport {
    #[must_use]
    pub fn new(city: &str, weather: &CurrentWeather) -> Self {
        let summary = format!(
            "In {city} it's currently {} with a chance of {}% to rain.",
            weather.format_temperature(),
            weather.precipitation_probability
        );
        Self {
            location: city.to_string(),
            temperature: weather.temperature,
            precipitation_probability: weather.precipitation_probability,
            summary,
        }
    }
}

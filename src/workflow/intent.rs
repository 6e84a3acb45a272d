//! Keyword-based intent classification

use serde::{Deserialize, Serialize};
use std::fmt;

/// Query fragments that ask for weather
pub const WEATHER_KEYWORDS: [&str; 4] = ["weather", "temperature", "rain", "forecast"];

/// Query fragments that ask for places to visit
pub const PLACES_KEYWORDS: [&str; 6] = ["places", "visit", "attractions", "plan", "trip", "go"];

/// Which information a query asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Weather,
    Places,
    Both,
}

impl Intent {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Weather => "weather",
            Intent::Places => "places",
            Intent::Both => "both",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a raw query. Keywords match as case-insensitive substrings;
/// queries that match both sets or neither ask for everything.
#[must_use]
pub fn classify(text: &str) -> Intent {
    let text = text.to_lowercase();
    let has_weather = WEATHER_KEYWORDS.iter().any(|k| text.contains(k));
    let has_places = PLACES_KEYWORDS.iter().any(|k| text.contains(k));

    match (has_weather, has_places) {
        (true, false) => Intent::Weather,
        (false, true) => Intent::Places,
        _ => Intent::Both,
    }
}

//! Per-request workflow record

use super::intent::Intent;
use crate::error::TripError;
use crate::models::{PlacesReport, WeatherReport};

/// Answer used when no worker produced any text
pub const NO_INFORMATION: &str = "I couldn't find information for this location.";

/// Position in the workflow graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Classified,
    FetchingWeather,
    FetchingPlaces,
    FetchingBoth,
    Aggregated,
    Done,
}

impl Stage {
    /// Fetch stage for a classified intent
    #[must_use]
    pub fn fetching(intent: Intent) -> Self {
        match intent {
            Intent::Weather => Stage::FetchingWeather,
            Intent::Places => Stage::FetchingPlaces,
            Intent::Both => Stage::FetchingBoth,
        }
    }
}

/// Mutable record threaded through one request.
///
/// Created per query and dropped once the envelope is built; never shared.
#[derive(Debug)]
pub struct WorkflowState {
    pub(crate) stage: Stage,
    location: String,
    intent: Option<Intent>,
    weather: Option<WeatherReport>,
    places: Option<PlacesReport>,
    failure: Option<TripError>,
    response: Option<String>,
}

impl WorkflowState {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            stage: Stage::Start,
            location: location.into(),
            intent: None,
            weather: None,
            places: None,
            failure: None,
            response: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn intent(&self) -> Option<Intent> {
        self.intent
    }

    pub fn failed(&self) -> bool {
        self.failure.is_some()
    }

    pub fn failure_message(&self) -> Option<&'static str> {
        self.failure.as_ref().map(TripError::user_message)
    }

    pub fn response(&self) -> Option<&str> {
        self.response.as_deref()
    }

    pub(crate) fn set_intent(&mut self, intent: Intent) {
        debug_assert!(self.intent.is_none(), "intent is classified once");
        self.intent = Some(intent);
    }

    pub(crate) fn set_weather(&mut self, report: WeatherReport) {
        debug_assert!(self.weather.is_none());
        self.weather = Some(report);
    }

    pub(crate) fn set_places(&mut self, report: PlacesReport) {
        debug_assert!(self.places.is_none());
        self.places = Some(report);
    }

    /// Record a failure. The first one wins.
    pub(crate) fn fail(&mut self, error: TripError) {
        if self.failure.is_none() {
            self.failure = Some(error);
        }
    }

    /// Write the final response from whatever was collected.
    pub(crate) fn aggregate(&mut self) {
        debug_assert!(self.response.is_none(), "response is written once");

        let response = match self.failure_message() {
            Some(message) => message.to_string(),
            None => {
                let parts: Vec<&str> = self
                    .weather
                    .iter()
                    .map(|w| w.summary.as_str())
                    .chain(self.places.iter().map(|p| p.summary.as_str()))
                    .collect();
                if parts.is_empty() {
                    NO_INFORMATION.to_string()
                } else {
                    parts.join(" ")
                }
            }
        };
        self.response = Some(response);
    }

    /// Split into the pieces of the final envelope
    pub(crate) fn into_parts(self) -> StateParts {
        StateParts {
            location: self.location,
            intent: self.intent,
            weather: self.weather,
            places: self.places,
            failure: self.failure,
            response: self.response.unwrap_or_else(|| NO_INFORMATION.to_string()),
        }
    }
}

pub(crate) struct StateParts {
    pub location: String,
    pub intent: Option<Intent>,
    pub weather: Option<WeatherReport>,
    pub places: Option<PlacesReport>,
    pub failure: Option<TripError>,
    pub response: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CurrentWeather;

    fn weather_report() -> WeatherReport {
        WeatherReport::new(
            "Paris",
            &CurrentWeather {
                temperature: 18.0,
                precipitation_probability: 20,
            },
        )
    }

    #[test]
    fn test_aggregate_joins_weather_then_places() {
        let mut state = WorkflowState::new("Paris");
        state.set_places(PlacesReport::new("Paris", vec!["Louvre".into()]));
        state.set_weather(weather_report());
        state.aggregate();

        let response = state.response().unwrap();
        assert!(response.starts_with("In Paris it's currently 18.0°C"));
        assert!(response.ends_with("to rain. In Paris these are the places you can go,\n\n- Louvre"));
    }

    #[test]
    fn test_aggregate_failure_hides_partial_data() {
        let mut state = WorkflowState::new("Paris");
        state.set_weather(weather_report());
        state.fail(TripError::places_unavailable("down"));
        state.aggregate();

        assert_eq!(
            state.response(),
            Some("Unable to fetch places information at the moment")
        );
    }

    #[test]
    fn test_aggregate_without_results() {
        let mut state = WorkflowState::new("Paris");
        state.aggregate();
        assert_eq!(state.response(), Some(NO_INFORMATION));
    }

    #[test]
    fn test_first_failure_wins() {
        let mut state = WorkflowState::new("Atlantis");
        state.fail(TripError::location_not_found("Atlantis"));
        state.fail(TripError::places_unavailable("down"));
        assert_eq!(state.failure_message(), Some("I don't know this place exists"));
    }

    #[test]
    fn test_stage_dispatch() {
        assert_eq!(Stage::fetching(Intent::Weather), Stage::FetchingWeather);
        assert_eq!(Stage::fetching(Intent::Places), Stage::FetchingPlaces);
        assert_eq!(Stage::fetching(Intent::Both), Stage::FetchingBoth);
    }
}

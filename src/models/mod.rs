//! Data models for `TripMind`
//!
//! - Location: geocoded coordinates and display names
//! - Weather: current conditions and the weather worker's report
//! - Places: named points of interest and the places worker's report

pub mod location;
pub mod places;
pub mod weather;

pub use location::GeoPoint;
pub use places::{NamedPlace, PlacesReport};
pub use weather::{CurrentWeather, WeatherReport};

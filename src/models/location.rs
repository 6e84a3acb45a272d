//! Geocoded location model

use serde::{Deserialize, Serialize};

/// Result of resolving a free-text location
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GeoPoint {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Full display name as reported by the geocoder
    pub display_name: String,
}

impl GeoPoint {
    /// Create a new point
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, display_name: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            display_name: display_name.into(),
        }
    }

    /// Short name used in sentences: the text before the first comma
    #[must_use]
    pub fn city_name(&self) -> &str {
        self.display_name
            .split(',')
            .next()
            .unwrap_or_default()
            .trim()
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// Round coordinates for cache key generation
    #[must_use]
    pub fn rounded_coordinates(&self, precision: u32) -> (f64, f64) {
        let multiplier = 10_f64.powi(i32::try_from(precision).unwrap_or(4));
        let lat = (self.latitude * multiplier).round() / multiplier;
        let lon = (self.longitude * multiplier).round() / multiplier;
        (lat, lon)
    }

    /// Cache key for a provider call made at this point
    #[must_use]
    pub fn cache_key(&self, prefix: &str) -> String {
        let (lat, lon) = self.rounded_coordinates(4);
        format!("{prefix}:{lat:.4}:{lon:.4}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_name_takes_first_segment() {
        let point = GeoPoint::new(48.8566, 2.3522, "Paris, Île-de-France, France");
        assert_eq!(point.city_name(), "Paris");
    }

    #[test]
    fn test_city_name_without_comma() {
        let point = GeoPoint::new(0.0, 0.0, "Null Island");
        assert_eq!(point.city_name(), "Null Island");
    }

    #[test]
    fn test_location_cache_key() {
        let point = GeoPoint::new(46.818_234_9, 8.227_456_1, "Interlaken");
        assert_eq!(point.cache_key("weather"), "weather:46.8182:8.2275");
    }

    #[test]
    fn test_location_rounded_coordinates() {
        let point = GeoPoint::new(46.818_234, 8.227_456, "Test");
        let (lat, lon) = point.rounded_coordinates(2);
        assert_eq!(lat, 46.82);
        assert_eq!(lon, 8.23);
    }
}

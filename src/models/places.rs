//! Points of interest

use serde::{Deserialize, Serialize};

/// A named entity reported by the places provider
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NamedPlace {
    pub name: String,
    /// Category values (tourism, leisure and historic tags) in provider order
    pub categories: Vec<String>,
}

impl NamedPlace {
    #[must_use]
    pub fn new(name: impl Into<String>, categories: &[&str]) -> Self {
        Self {
            name: name.into(),
            categories: categories.iter().map(|c| (*c).to_string()).collect(),
        }
    }

    /// Whether any category contains one of `wanted`
    #[must_use]
    pub fn has_category_like(&self, wanted: &[&str]) -> bool {
        self.categories
            .iter()
            .any(|category| wanted.iter().any(|w| category.contains(w)))
    }
}

/// Output of the places worker
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlacesReport {
    /// City display name
    pub location: String,
    /// At most five attraction names, notable ones first
    pub places: Vec<String>,
    /// Text merged into the final response
    pub summary: String,
}

impl PlacesReport {
    #[must_use]
    pub fn new(city: &str, places: Vec<String>) -> Self {
        let summary = if places.is_empty() {
            format!("I couldn't find tourist attractions in {city}.")
        } else {
            let list = places
                .iter()
                .map(|place| format!("- {place}"))
                .collect::<Vec<_>>()
                .join("\n");
            format!("In {city} these are the places you can go,\n\n{list}")
        };
        Self {
            location: city.to_string(),
            places,
            summary,
        }
    }
}

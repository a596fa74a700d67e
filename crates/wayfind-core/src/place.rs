//! The unified place shape returned to callers.

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// Id prefix for coverage-sourced records: `fsq:<native id>`.
pub const COVERAGE_ID_PREFIX: &str = "fsq";

/// Where a [`PlaceCard`] came from.
///
/// Canonical records are curated and win over coverage records describing the
/// same place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceSource {
    Canonical,
    Coverage,
}

impl PlaceSource {
    /// Sort rank for source precedence; lower wins.
    #[must_use]
    pub fn precedence(self) -> u8 {
        match self {
            PlaceSource::Canonical => 0,
            PlaceSource::Coverage => 1,
        }
    }
}

impl std::fmt::Display for PlaceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaceSource::Canonical => write!(f, "canonical"),
            PlaceSource::Coverage => write!(f, "coverage"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceStatus {
    Active,
    Closed,
    Inactive,
}

impl PlaceStatus {
    /// Maps a free-form status column to a lifecycle flag.
    ///
    /// Missing or unrecognized values are treated as active.
    #[must_use]
    pub fn from_label(label: Option<&str>) -> Self {
        let Some(raw) = label else {
            return PlaceStatus::Active;
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "closed" | "permanently_closed" | "permanently closed" => PlaceStatus::Closed,
            "inactive" | "hidden" | "archived" | "deleted" => PlaceStatus::Inactive,
            _ => PlaceStatus::Active,
        }
    }
}

/// A source-agnostic, response-scoped projection of a place.
///
/// Built fresh on every request; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceCard {
    /// Unique within one response. Canonical rows use their primary key;
    /// coverage rows use `fsq:<native id>`.
    pub id: String,
    pub source: PlaceSource,
    /// Native identifier inside the origin system.
    pub source_id: String,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_icon: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub postcode: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub status: PlaceStatus,
    /// Meters from the caller, set only when a caller location is supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_meters: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photos: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,
    /// Coverage-store native id a canonical record was curated from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage_id: Option<String>,
}

impl PlaceCard {
    /// Both coordinates, when present and finite.
    #[must_use]
    pub fn coordinates(&self) -> Option<GeoPoint> {
        GeoPoint::from_parts(self.latitude, self.longitude)
    }

    /// Lower-cased, trimmed name used as the fuzzy identity key.
    #[must_use]
    pub fn name_key(&self) -> String {
        self.name.trim().to_lowercase()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == PlaceStatus::Active
    }

    /// Sets `distance_meters` relative to `origin`; cleared when the card has
    /// no usable coordinates.
    pub fn annotate_distance(&mut self, origin: &GeoPoint) {
        self.distance_meters = self.coordinates().map(|p| origin.distance_to(&p));
    }
}

/// Builds the response id for a coverage record.
#[must_use]
pub fn coverage_place_id(native_id: &str) -> String {
    format!("{COVERAGE_ID_PREFIX}:{native_id}")
}

/// Splits a response id back into provenance and native id.
///
/// `fsq:abc` is a coverage record; anything else is a canonical primary key.
#[must_use]
pub fn parse_place_id(id: &str) -> (PlaceSource, &str) {
    match id.split_once(':') {
        Some((prefix, native)) if prefix == COVERAGE_ID_PREFIX && !native.is_empty() => {
            (PlaceSource::Coverage, native)
        }
        _ => (PlaceSource::Canonical, id),
    }
}

/// A [`PlaceCard`] with a relevance score, produced by text search only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(flatten)]
    pub place: PlaceCard,
    pub match_score: f64,
}

#[cfg(test)]
pub(crate) fn sample_card(id: &str, name: &str, source: PlaceSource) -> PlaceCard {
    PlaceCard {
        id: id.to_string(),
        source,
        source_id: id.to_string(),
        name: name.to_string(),
        latitude: Some(30.2672),
        longitude: Some(-97.7431),
        category: "Dining and Drinking".to_string(),
        subcategory: None,
        category_icon: None,
        address: None,
        city: None,
        region: None,
        country: None,
        postcode: None,
        phone: None,
        website: None,
        status: PlaceStatus::Active,
        distance_meters: None,
        popularity: None,
        photos: Vec::new(),
        cover_image_url: None,
        coverage_id: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coverage_ids_are_prefixed_and_deterministic() {
        assert_eq!(coverage_place_id("4b0588"), "fsq:4b0588");
        assert_eq!(coverage_place_id("4b0588"), coverage_place_id("4b0588"));
    }

    #[test]
    fn parse_place_id_routes_by_prefix() {
        assert_eq!(
            parse_place_id("fsq:4b0588"),
            (PlaceSource::Coverage, "4b0588")
        );
        assert_eq!(
            parse_place_id("6f1c2a7e-0000-4000-8000-000000000001"),
            (
                PlaceSource::Canonical,
                "6f1c2a7e-0000-4000-8000-000000000001"
            )
        );
        assert_eq!(parse_place_id("fsq:"), (PlaceSource::Canonical, "fsq:"));
    }

    #[test]
    fn status_labels_map_to_lifecycle() {
        assert_eq!(PlaceStatus::from_label(None), PlaceStatus::Active);
        assert_eq!(PlaceStatus::from_label(Some("ACTIVE")), PlaceStatus::Active);
        assert_eq!(PlaceStatus::from_label(Some("closed")), PlaceStatus::Closed);
        assert_eq!(
            PlaceStatus::from_label(Some("hidden")),
            PlaceStatus::Inactive
        );
    }

    #[test]
    fn annotate_distance_requires_coordinates() {
        let origin = GeoPoint {
            lat: 30.2672,
            lng: -97.7431,
        };
        let mut card = sample_card("1", "Cafe", PlaceSource::Canonical);
        card.annotate_distance(&origin);
        assert!(card.distance_meters.unwrap() < 1e-6);

        card.longitude = None;
        card.annotate_distance(&origin);
        assert!(card.distance_meters.is_none());
    }

    #[test]
    fn search_result_flattens_place_fields() {
        let result = SearchResult {
            place: sample_card("1", "Cafe", PlaceSource::Coverage),
            match_score: 0.75,
        };
        let json = serde_json::to_value(&result).expect("serialize SearchResult");
        assert_eq!(json["name"].as_str(), Some("Cafe"));
        assert_eq!(json["source"].as_str(), Some("coverage"));
        assert!((json["match_score"].as_f64().unwrap() - 0.75).abs() < 1e-9);
        assert!(json.get("distance_meters").is_none());
    }
}

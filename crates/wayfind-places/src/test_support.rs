//! Card builders shared by unit tests.

use wayfind_core::{PlaceCard, PlaceSource, PlaceStatus};

pub(crate) fn card(id: &str, name: &str, source: PlaceSource, lat: f64, lng: f64) -> PlaceCard {
    PlaceCard {
        id: id.to_string(),
        source,
        source_id: id.strip_prefix("fsq:").unwrap_or(id).to_string(),
        name: name.to_string(),
        latitude: Some(lat),
        longitude: Some(lng),
        category: "Place".to_string(),
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

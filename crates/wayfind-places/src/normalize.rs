//! Row-to-[`PlaceCard`] mapping for each backend.
//!
//! Pure functions: no store access, and the same input always yields the same
//! card.

use wayfind_core::{
    coverage_place_id, parse_category_list, parse_category_text, ParsedCategory, PlaceCard,
    PlaceSource, PlaceStatus,
};
use wayfind_db::{CanonicalPlaceRow, CoveragePlaceRow};
use wayfind_search::{CategoryLabels, IndexDocument, SearchHit};

/// Maps a curated `places` row.
#[must_use]
pub fn normalize_canonical(row: &CanonicalPlaceRow) -> PlaceCard {
    let ParsedCategory {
        category,
        subcategory,
    } = parse_category_text(row.category.as_deref());

    PlaceCard {
        id: row.id.clone(),
        source: PlaceSource::Canonical,
        source_id: row.id.clone(),
        name: clean_name(row.name.as_deref()),
        latitude: row.latitude,
        longitude: row.longitude,
        category,
        subcategory,
        category_icon: None,
        address: non_blank(row.address.as_deref()),
        city: non_blank(row.city.as_deref()),
        region: non_blank(row.state.as_deref()),
        country: non_blank(row.country.as_deref()),
        postcode: non_blank(row.postal_code.as_deref()),
        phone: non_blank(row.phone.as_deref()),
        website: non_blank(row.website.as_deref()),
        status: PlaceStatus::from_label(row.status.as_deref()),
        distance_meters: None,
        popularity: row.view_count,
        photos: row
            .photos
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter(|p| !p.trim().is_empty())
            .cloned()
            .collect(),
        cover_image_url: non_blank(row.cover_image_url.as_deref()),
        coverage_id: non_blank(row.fsq_place_id.as_deref()),
    }
}

/// Maps a raw `fsq_places` row. Any closure date marks the card closed.
#[must_use]
pub fn normalize_coverage(row: &CoveragePlaceRow) -> PlaceCard {
    let ParsedCategory {
        category,
        subcategory,
    } = parse_category_list(row.fsq_category_labels.as_deref().unwrap_or_default());

    PlaceCard {
        id: coverage_place_id(&row.fsq_place_id),
        source: PlaceSource::Coverage,
        source_id: row.fsq_place_id.clone(),
        name: clean_name(row.name.as_deref()),
        latitude: row.latitude,
        longitude: row.longitude,
        category,
        subcategory,
        category_icon: None,
        address: non_blank(row.address.as_deref()),
        city: non_blank(row.locality.as_deref()),
        region: non_blank(row.region.as_deref()),
        country: non_blank(row.country.as_deref()),
        postcode: non_blank(row.postcode.as_deref()),
        phone: non_blank(row.tel.as_deref()),
        website: non_blank(row.website.as_deref()),
        status: closure_status(row.date_closed.as_deref()),
        distance_meters: None,
        popularity: None,
        photos: Vec::new(),
        cover_image_url: None,
        coverage_id: None,
    }
}

/// Maps a search index hit.
///
/// Documents tagged `canonical` keep their primary key as id; everything
/// else is treated as coverage and gets the prefixed id.
#[must_use]
pub fn normalize_index_hit(hit: &SearchHit) -> PlaceCard {
    let doc = &hit.document;
    let is_canonical = doc
        .source
        .as_deref()
        .is_some_and(|s| s.eq_ignore_ascii_case("canonical"));

    let (latitude, longitude) = match doc.location.as_deref() {
        Some([lat, lng, ..]) => (Some(*lat), Some(*lng)),
        _ => (None, None),
    };

    let ParsedCategory {
        category,
        subcategory,
    } = index_category(doc);

    let (id, source, source_id, coverage_id) = if is_canonical {
        (
            doc.id.clone(),
            PlaceSource::Canonical,
            doc.id.clone(),
            non_blank(doc.fsq_place_id.as_deref()),
        )
    } else {
        let native = non_blank(doc.fsq_place_id.as_deref()).unwrap_or_else(|| doc.id.clone());
        (
            coverage_place_id(&native),
            PlaceSource::Coverage,
            native,
            None,
        )
    };

    PlaceCard {
        id,
        source,
        source_id,
        name: clean_name(doc.name.as_deref()),
        latitude,
        longitude,
        category,
        subcategory,
        category_icon: None,
        address: non_blank(doc.address.as_deref()),
        city: non_blank(doc.locality.as_deref()),
        region: non_blank(doc.region.as_deref()),
        country: non_blank(doc.country.as_deref()),
        postcode: non_blank(doc.postcode.as_deref()),
        phone: non_blank(doc.tel.as_deref()),
        website: non_blank(doc.website.as_deref()),
        status: closure_status(doc.date_closed.as_deref()),
        distance_meters: hit.geo_distance_meters.as_ref().map(|g| g.location),
        popularity: doc.popularity,
        photos: Vec::new(),
        cover_image_url: None,
        coverage_id,
    }
}

/// Explicit `category`/`subcategory` fields win over parsed labels.
fn index_category(doc: &IndexDocument) -> ParsedCategory {
    let from_labels = match &doc.category_labels {
        Some(CategoryLabels::One(label)) => parse_category_text(Some(label.as_str())),
        Some(CategoryLabels::Many(labels)) => parse_category_list(labels.as_slice()),
        None => ParsedCategory::default(),
    };

    match non_blank(doc.category.as_deref()) {
        Some(raw) => {
            let parsed = parse_category_text(Some(raw.as_str()));
            ParsedCategory {
                category: parsed.category,
                subcategory: non_blank(doc.subcategory.as_deref())
                    .or(parsed.subcategory)
                    .or(from_labels.subcategory),
            }
        }
        None => ParsedCategory {
            category: from_labels.category,
            subcategory: non_blank(doc.subcategory.as_deref()).or(from_labels.subcategory),
        },
    }
}

fn closure_status(date_closed: Option<&str>) -> PlaceStatus {
    if non_blank(date_closed).is_some() {
        PlaceStatus::Closed
    } else {
        PlaceStatus::Active
    }
}

fn clean_name(raw: Option<&str>) -> String {
    raw.map(str::trim).unwrap_or_default().to_string()
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToOwned::to_owned)
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;

use wayfind_search::GeoDistance;

use super::*;

fn canonical_row() -> CanonicalPlaceRow {
    CanonicalPlaceRow {
        id: "6f1c2a7e-0000-4000-8000-000000000001".to_string(),
        name: Some("  Franklin Barbecue ".to_string()),
        latitude: Some(30.2701),
        longitude: Some(-97.7313),
        category: Some("Dining and Drinking > Restaurant > BBQ Joint".to_string()),
        address: Some("900 E 11th St".to_string()),
        city: Some("Austin".to_string()),
        state: Some("TX".to_string()),
        country: Some("US".to_string()),
        postal_code: Some("78702".to_string()),
        phone: Some(String::new()),
        website: None,
        status: Some("active".to_string()),
        cover_image_url: None,
        photos: Some(vec!["https://img/1.jpg".to_string(), " ".to_string()]),
        fsq_place_id: Some("4a3f".to_string()),
        view_count: Some(120.0),
    }
}

fn coverage_row() -> CoveragePlaceRow {
    CoveragePlaceRow {
        fsq_place_id: "4b0588".to_string(),
        name: Some("Jo's Coffee".to_string()),
        latitude: Some(30.25),
        longitude: Some(-97.75),
        address: Some("1300 S Congress Ave".to_string()),
        locality: Some("Austin".to_string()),
        region: Some("TX".to_string()),
        postcode: None,
        country: Some("US".to_string()),
        tel: None,
        website: None,
        fsq_category_labels: Some(vec![
            "Dining and Drinking > Cafe, Coffee, and Tea House".to_string(),
        ]),
        date_closed: None,
    }
}

fn hit(doc: IndexDocument) -> SearchHit {
    SearchHit {
        document: doc,
        text_match: Some(100),
        geo_distance_meters: None,
    }
}

#[test]
fn canonical_rows_map_fields_and_parse_category() {
    let card = normalize_canonical(&canonical_row());
    assert_eq!(card.id, "6f1c2a7e-0000-4000-8000-000000000001");
    assert_eq!(card.source, PlaceSource::Canonical);
    assert_eq!(card.name, "Franklin Barbecue");
    assert_eq!(card.category, "Dining and Drinking");
    assert_eq!(card.subcategory.as_deref(), Some("BBQ Joint"));
    assert_eq!(card.region.as_deref(), Some("TX"));
    assert_eq!(card.postcode.as_deref(), Some("78702"));
    assert!(card.phone.is_none(), "blank strings become None");
    assert_eq!(card.photos, vec!["https://img/1.jpg".to_string()]);
    assert_eq!(card.coverage_id.as_deref(), Some("4a3f"));
    assert_eq!(card.popularity, Some(120.0));
}

#[test]
fn canonical_normalization_is_deterministic() {
    let row = canonical_row();
    assert_eq!(normalize_canonical(&row), normalize_canonical(&row));
}

#[test]
fn coverage_rows_get_prefixed_ids() {
    let card = normalize_coverage(&coverage_row());
    assert_eq!(card.id, "fsq:4b0588");
    assert_eq!(card.source_id, "4b0588");
    assert_eq!(card.source, PlaceSource::Coverage);
    assert_eq!(card.city.as_deref(), Some("Austin"));
    assert_eq!(
        card.subcategory.as_deref(),
        Some("Cafe, Coffee, and Tea House")
    );
    assert_eq!(card.status, PlaceStatus::Active);
    assert_eq!(normalize_coverage(&coverage_row()), card);
}

#[test]
fn coverage_closure_marker_closes_place() {
    let mut row = coverage_row();
    row.date_closed = Some("2023-04-01".to_string());
    assert_eq!(normalize_coverage(&row).status, PlaceStatus::Closed);
}

#[test]
fn missing_labels_and_name_use_safe_defaults() {
    let mut row = coverage_row();
    row.fsq_category_labels = None;
    row.name = None;
    let card = normalize_coverage(&row);
    assert_eq!(card.category, wayfind_core::DEFAULT_CATEGORY);
    assert!(card.subcategory.is_none());
    assert_eq!(card.name, "");
}

#[test]
fn coverage_index_hit_uses_native_id_and_geo_distance() {
    let mut h = hit(IndexDocument {
        id: "doc-77".to_string(),
        source: Some("coverage".to_string()),
        fsq_place_id: Some("4b0588".to_string()),
        name: Some("Jo's Coffee".to_string()),
        location: Some(vec![30.25, -97.75]),
        category_labels: Some(CategoryLabels::One(
            "Dining and Drinking > Cafe".to_string(),
        )),
        ..IndexDocument::default()
    });
    h.geo_distance_meters = Some(GeoDistance { location: 412.0 });

    let card = normalize_index_hit(&h);
    assert_eq!(card.id, "fsq:4b0588");
    assert_eq!(card.source, PlaceSource::Coverage);
    assert_eq!(card.latitude, Some(30.25));
    assert_eq!(card.longitude, Some(-97.75));
    assert_eq!(card.category, "Dining and Drinking");
    assert_eq!(card.subcategory.as_deref(), Some("Cafe"));
    assert_eq!(card.distance_meters, Some(412.0));
}

#[test]
fn canonical_index_hit_keeps_primary_key() {
    let card = normalize_index_hit(&hit(IndexDocument {
        id: "6f1c2a7e".to_string(),
        source: Some("canonical".to_string()),
        fsq_place_id: Some("4a3f".to_string()),
        name: Some("Franklin Barbecue".to_string()),
        location: Some(vec![30.27, -97.73]),
        category: Some("Dining and Drinking".to_string()),
        subcategory: Some("BBQ Joint".to_string()),
        popularity: Some(9.0),
        ..IndexDocument::default()
    }));
    assert_eq!(card.id, "6f1c2a7e");
    assert_eq!(card.source, PlaceSource::Canonical);
    assert_eq!(card.coverage_id.as_deref(), Some("4a3f"));
    assert_eq!(card.category, "Dining and Drinking");
    assert_eq!(card.subcategory.as_deref(), Some("BBQ Joint"));
}

#[test]
fn index_hit_without_fsq_id_falls_back_to_document_id() {
    let card = normalize_index_hit(&hit(IndexDocument {
        id: "raw-9".to_string(),
        name: Some("Somewhere".to_string()),
        ..IndexDocument::default()
    }));
    assert_eq!(card.id, "fsq:raw-9");
    assert!(card.coordinates().is_none());
    assert_eq!(card.category, wayfind_core::DEFAULT_CATEGORY);
}

#[test]
fn hierarchical_category_field_is_cleaned() {
    let card = normalize_index_hit(&hit(IndexDocument {
        id: "x".to_string(),
        source: Some("canonical".to_string()),
        category: Some("Retail > Bookstore".to_string()),
        ..IndexDocument::default()
    }));
    assert_eq!(card.category, "Retail");
    assert_eq!(card.subcategory.as_deref(), Some("Bookstore"));
}

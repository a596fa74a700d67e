use super::*;

fn test_client(base_url: &str) -> TypesenseClient {
    TypesenseClient::with_base_url(Some("test-key"), 1_000, base_url, "places")
        .expect("client construction should not fail")
}

#[test]
fn search_url_targets_collection_documents() {
    let client = test_client("http://localhost:8108");
    let url = client
        .build_search_url(&SearchParams::new("tacos", "name"))
        .unwrap();
    assert_eq!(url.path(), "/collections/places/documents/search");
    assert!(url.as_str().contains("q=tacos"));
    assert!(url.as_str().contains("query_by=name"));
}

#[test]
fn base_url_keeps_path_prefix() {
    let client = test_client("http://localhost:8108/typesense/");
    let url = client
        .build_search_url(&SearchParams::new("*", "name"))
        .unwrap();
    assert_eq!(url.path(), "/typesense/collections/places/documents/search");
}

#[test]
fn filter_expression_is_percent_encoded() {
    let client = test_client("http://localhost:8108");
    let mut params = SearchParams::new("cafe & bar", "name");
    params.filter_by = Some("category:=[`Retail`] && source:=coverage".to_string());
    let url = client.build_search_url(&params).unwrap();
    assert!(!url.as_str().contains(' '), "spaces must be encoded: {url}");
    assert!(!url.as_str().contains("&&"), "ampersands must be encoded: {url}");
}

#[test]
fn invalid_base_url_is_rejected() {
    let err = TypesenseClient::with_base_url(None, 1_000, "not a url", "places").unwrap_err();
    assert!(matches!(err, SearchError::InvalidBaseUrl { .. }));
}

#[test]
fn debug_redacts_api_key() {
    let client = test_client("http://localhost:8108");
    let rendered = format!("{client:?}");
    assert!(!rendered.contains("test-key"));
}

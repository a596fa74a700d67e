//! Typesense request and response types.
//!
//! One collection holds both curated and coverage places; the `source` field
//! on each document tells them apart.

use serde::Deserialize;

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Parameters for `GET /collections/{name}/documents/search`.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    /// Free text; `*` matches everything.
    pub q: String,
    /// Comma-separated fields to search.
    pub query_by: String,
    pub query_by_weights: Option<String>,
    pub filter_by: Option<String>,
    pub sort_by: Option<String>,
    pub per_page: u32,
    pub page: u32,
    pub prefix: bool,
    pub num_typos: u8,
}

impl SearchParams {
    /// A first-page query with prefix matching on and typos off.
    #[must_use]
    pub fn new(q: impl Into<String>, query_by: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            query_by: query_by.into(),
            query_by_weights: None,
            filter_by: None,
            sort_by: None,
            per_page: 10,
            page: 1,
            prefix: true,
            num_typos: 0,
        }
    }

    /// Flattens into query-string pairs in a stable order.
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("q", self.q.clone()),
            ("query_by", self.query_by.clone()),
        ];
        if let Some(weights) = &self.query_by_weights {
            pairs.push(("query_by_weights", weights.clone()));
        }
        if let Some(filter) = &self.filter_by {
            pairs.push(("filter_by", filter.clone()));
        }
        if let Some(sort) = &self.sort_by {
            pairs.push(("sort_by", sort.clone()));
        }
        pairs.push(("per_page", self.per_page.to_string()));
        pairs.push(("page", self.page.to_string()));
        pairs.push(("prefix", self.prefix.to_string()));
        pairs.push(("num_typos", self.num_typos.to_string()));
        pairs
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub found: u64,
    #[serde(default)]
    pub hits: Vec<SearchHit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    pub document: IndexDocument,
    /// Engine relevance; larger is better. Not comparable across queries.
    #[serde(default)]
    pub text_match: Option<u64>,
    /// Present when the query sorted or filtered on a geopoint.
    #[serde(default)]
    pub geo_distance_meters: Option<GeoDistance>,
}

/// Per-field distance annotation, keyed by geopoint field name.
#[derive(Debug, Clone, Deserialize)]
pub struct GeoDistance {
    pub location: f64,
}

/// A place document as stored in the index.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IndexDocument {
    pub id: String,
    /// `canonical` or `coverage`; absent means coverage.
    #[serde(default)]
    pub source: Option<String>,
    /// Coverage native id, set on coverage documents and on canonical
    /// documents curated from a coverage record.
    #[serde(default)]
    pub fsq_place_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// `[lat, lng]`.
    #[serde(default)]
    pub location: Option<Vec<f64>>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub locality: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub postcode: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub tel: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub category_labels: Option<CategoryLabels>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub popularity: Option<f64>,
    #[serde(default)]
    pub date_closed: Option<String>,
}

/// Category labels are indexed either as one string or as an array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CategoryLabels {
    One(String),
    Many(Vec<String>),
}

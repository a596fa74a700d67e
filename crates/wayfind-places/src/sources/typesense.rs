//! Search index source backed by Typesense.

use std::collections::HashSet;

use async_trait::async_trait;
use wayfind_core::{GeoPoint, PlaceSource};
use wayfind_search::{SearchParams, TypesenseClient};

use super::{IndexMatch, IndexQuery, IndexSort, PlaceIndex, QueryFields};
use crate::error::SourceError;
use crate::normalize::normalize_index_hit;

const GEO_FIELD: &str = "location";
const MAX_PER_PAGE: usize = 250;

#[derive(Debug, Clone)]
pub struct TypesenseIndex {
    client: TypesenseClient,
}

impl TypesenseIndex {
    #[must_use]
    pub fn new(client: TypesenseClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PlaceIndex for TypesenseIndex {
    async fn search(&self, query: &IndexQuery) -> Result<Vec<IndexMatch>, SourceError> {
        let params = search_params(query);
        let response = self
            .client
            .search(&params)
            .await
            .map_err(|e| SourceError::Index(e.to_string()))?;

        let excluded: HashSet<&str> = query.exclude_ids.iter().map(String::as_str).collect();
        Ok(response
            .hits
            .iter()
            .map(|hit| IndexMatch {
                place: normalize_index_hit(hit),
                text_match: hit.text_match,
            })
            .filter(|m| query.source.is_none_or(|s| m.place.source == s))
            .filter(|m| {
                m.place.source != PlaceSource::Coverage
                    || !excluded.contains(m.place.source_id.as_str())
            })
            .collect())
    }
}

/// Translates a backend-neutral query into Typesense parameters.
pub(crate) fn search_params(query: &IndexQuery) -> SearchParams {
    let (query_by, weights) = match query.fields {
        QueryFields::Full => ("name,category_labels,locality", Some("4,2,1")),
        QueryFields::NameOnly => ("name", None),
    };

    let mut params = SearchParams::new(
        query.text.clone().unwrap_or_else(|| "*".to_string()),
        query_by,
    );
    params.query_by_weights = weights.map(ToOwned::to_owned);
    params.filter_by = filter_expression(query);
    params.sort_by = sort_expression(query.sort);
    params.per_page = u32::try_from(query.limit.clamp(1, MAX_PER_PAGE)).unwrap_or(1);
    params.prefix = query.prefix;
    params.num_typos = query.num_typos;
    params
}

fn filter_expression(query: &IndexQuery) -> Option<String> {
    let mut clauses = Vec::new();

    if let Some(scope) = &query.scope {
        let geo = scope.index_filter(GEO_FIELD);
        if geo.contains("||") {
            clauses.push(format!("({geo})"));
        } else {
            clauses.push(geo);
        }
    }
    if let Some(category) = &query.category {
        clauses.push(category.index_filter());
    }
    if let Some(source) = query.source {
        clauses.push(format!("source:={source}"));
    }
    if !query.exclude_ids.is_empty() {
        let ids = query
            .exclude_ids
            .iter()
            .map(|id| format!("`{}`", id.replace('`', "")))
            .collect::<Vec<_>>()
            .join(", ");
        clauses.push(format!("fsq_place_id:!=[{ids}]"));
    }

    if clauses.is_empty() {
        None
    } else {
        Some(clauses.join(" && "))
    }
}

fn sort_expression(sort: IndexSort) -> Option<String> {
    let geo = |p: GeoPoint| format!("{GEO_FIELD}({}, {}):asc", p.lat, p.lng);
    match sort {
        IndexSort::Unsorted => None,
        IndexSort::Distance(origin) => Some(geo(origin)),
        IndexSort::Relevance(None) => Some("_text_match:desc,popularity:desc".to_string()),
        IndexSort::Relevance(Some(origin)) => {
            Some(format!("_text_match:desc,popularity:desc,{}", geo(origin)))
        }
    }
}

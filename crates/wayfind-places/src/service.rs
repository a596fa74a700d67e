//! The hybrid fetcher: canonical first, coverage to fill gaps, one merged
//! and deduplicated answer.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use sqlx::PgPool;
use wayfind_core::{
    category_filter, parse_place_id, AppConfig, BoundingBox, CategoryFilter, GeoPoint, GeoScope,
    PlaceCard, PlaceSource, QueryError, SearchResult,
};
use wayfind_search::{worst_case_backoff_ms, SearchError, TypesenseClient};

use crate::dedupe::{dedupe_by_name, Deduplicator};
use crate::error::{PlacesError, SourceError};
use crate::labels::{apply_icon, CategoryLabelCache};
use crate::settings::SearchSettings;
use crate::sources::{
    CanonicalSource, CoverageStore, IndexMatch, IndexQuery, IndexSort, PgCanonicalStore,
    PgCoverageStore, PgLabelSource, PlaceIndex, QueryFields, TypesenseIndex,
};

/// Upper bound on hits requested from a backend for one text query.
const MAX_TEXT_CANDIDATES: usize = 250;
const INDEX_BACKOFF_BASE_MS: u64 = 200;

/// Where the coverage rows of a bounds fetch came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoveragePath {
    Index,
    Raw,
}

/// Per-request counters returned alongside bounds results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FetchMetrics {
    pub from_canonical: usize,
    pub from_coverage: usize,
    pub fallback_triggered: bool,
    pub total: usize,
    /// `None` when coverage was not queried or every coverage tier failed.
    pub coverage_path: Option<CoveragePath>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacesInBounds {
    pub places: Vec<PlaceCard>,
    pub metrics: FetchMetrics,
}

/// A viewport (or radius) fetch request.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundsQuery {
    pub scope: GeoScope,
    pub user_location: Option<GeoPoint>,
    pub category: Option<String>,
    /// Result cap; defaults to, and never exceeds, the configured fetch limit.
    pub limit: Option<usize>,
}

impl BoundsQuery {
    #[must_use]
    pub fn new(bbox: BoundingBox) -> Self {
        Self {
            scope: GeoScope::Bounds(bbox),
            user_location: None,
            category: None,
            limit: None,
        }
    }

    #[must_use]
    pub fn radius(center: GeoPoint, radius_meters: f64) -> Self {
        Self {
            scope: GeoScope::Radius {
                center,
                radius_meters,
            },
            user_location: Some(center),
            category: None,
            limit: None,
        }
    }

    #[must_use]
    pub fn with_location(mut self, location: GeoPoint) -> Self {
        self.user_location = Some(location);
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Place discovery over the canonical store, the coverage store, and the
/// search index.
///
/// Backend failures never leave this type as errors: a failing source
/// contributes nothing and the failure is logged. Only invalid caller input
/// is reported, as [`PlacesError::InvalidInput`].
#[derive(Clone)]
pub struct PlaceService {
    canonical: Arc<dyn CanonicalSource>,
    coverage: Arc<dyn CoverageStore>,
    index: Arc<dyn PlaceIndex>,
    labels: Arc<CategoryLabelCache>,
    settings: SearchSettings,
    dedup: Deduplicator,
}

impl std::fmt::Debug for PlaceService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaceService")
            .field("settings", &self.settings)
            .field("labels", &self.labels)
            .finish_non_exhaustive()
    }
}

impl PlaceService {
    #[must_use]
    pub fn new(
        canonical: Arc<dyn CanonicalSource>,
        coverage: Arc<dyn CoverageStore>,
        index: Arc<dyn PlaceIndex>,
        labels: Arc<CategoryLabelCache>,
        settings: SearchSettings,
    ) -> Self {
        Self {
            canonical,
            coverage,
            index,
            labels,
            dedup: Deduplicator::new(settings.dedup_radius_meters),
            settings,
        }
    }

    /// Wires the Postgres stores and the Typesense index from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] when the index client cannot be built.
    pub fn from_app_config(config: &AppConfig, pool: PgPool) -> Result<Self, SearchError> {
        let client = TypesenseClient::with_base_url(
            config.typesense_api_key.as_deref(),
            index_attempt_timeout_ms(config.backend_timeout_ms, config.index_max_retries),
            &config.typesense_url,
            &config.typesense_collection,
        )?
        .with_retry(config.index_max_retries, INDEX_BACKOFF_BASE_MS);

        let labels = CategoryLabelCache::new(Arc::new(PgLabelSource::new(pool.clone())));
        Ok(Self::new(
            Arc::new(PgCanonicalStore::new(pool.clone())),
            Arc::new(PgCoverageStore::new(pool)),
            Arc::new(TypesenseIndex::new(client)),
            Arc::new(labels),
            SearchSettings::from_app_config(config),
        ))
    }

    #[must_use]
    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Fetches places for a map viewport or radius.
    ///
    /// Queries the canonical store; when it returns fewer than the fallback
    /// threshold, fills from coverage (index first, raw table if the index
    /// fails), skipping coverage records the canonical rows were curated
    /// from. The merged list is deduplicated, annotated with distance and
    /// sorted nearest first when a location is given, and truncated.
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError::InvalidInput`] for malformed bounds, radius,
    /// location, or a zero limit.
    pub async fn fetch_places_in_bounds(
        &self,
        query: &BoundsQuery,
    ) -> Result<PlacesInBounds, PlacesError> {
        let scope = validate_scope(&query.scope)?;
        let user_location = validate_location(query.user_location)?;
        let limit = match query.limit {
            Some(0) => return Err(QueryError::ZeroLimit.into()),
            Some(n) => n.min(self.settings.fetch_limit),
            None => self.settings.fetch_limit,
        };
        let category = query.category.as_deref().and_then(category_filter);
        let category = category.as_ref();

        let mut metrics = FetchMetrics::default();

        let coverage_limit = self.settings.coverage_limit;
        let (canonical, coverage) = if self.settings.parallel_coverage {
            // Linked ids are unknown up front, so over-fetch by as many rows as
            // canonical can link and trim after the client-side exclusion.
            let (canonical, speculative) = tokio::join!(
                self.canonical_in_scope(&scope, category),
                self.coverage_in_scope(
                    &scope,
                    category,
                    &[],
                    user_location,
                    coverage_limit.saturating_add(self.settings.fetch_limit),
                ),
            );
            if canonical.len() < self.settings.fallback_threshold {
                (canonical, Some(speculative))
            } else {
                (canonical, None)
            }
        } else {
            let canonical = self.canonical_in_scope(&scope, category).await;
            if canonical.len() < self.settings.fallback_threshold {
                let exclude = linked_coverage_ids(&canonical);
                let coverage = self
                    .coverage_in_scope(&scope, category, &exclude, user_location, coverage_limit)
                    .await;
                (canonical, Some(coverage))
            } else {
                (canonical, None)
            }
        };

        metrics.from_canonical = canonical.len();
        let mut merged = canonical;

        if let Some((coverage, path)) = coverage {
            metrics.fallback_triggered = true;
            metrics.coverage_path = path;

            let linked: HashSet<String> = linked_coverage_ids(&merged).into_iter().collect();
            let fresh: Vec<PlaceCard> = coverage
                .into_iter()
                .filter(|card| !linked.contains(&card.source_id))
                .take(coverage_limit)
                .filter(PlaceCard::is_active)
                .collect();
            metrics.from_coverage = fresh.len();
            tracing::debug!(
                canonical = metrics.from_canonical,
                coverage = metrics.from_coverage,
                threshold = self.settings.fallback_threshold,
                "coverage fallback merged"
            );
            merged.extend(fresh);
        }

        let mut places: Vec<PlaceCard> = self
            .dedup
            .dedupe(merged)
            .into_iter()
            .filter(|card| card.coordinates().is_some())
            .collect();

        if let Some(origin) = user_location {
            for card in &mut places {
                card.annotate_distance(&origin);
            }
            places.sort_by(compare_distance);
        }
        places.truncate(limit);
        self.labels
            .decorate(&mut places, self.settings.backend_timeout)
            .await;

        metrics.total = places.len();
        tracing::info!(
            total = metrics.total,
            from_canonical = metrics.from_canonical,
            from_coverage = metrics.from_coverage,
            fallback_triggered = metrics.fallback_triggered,
            "fetched places in bounds"
        );

        Ok(PlacesInBounds { places, metrics })
    }

    /// Full text search, biased toward `user_location` when given.
    ///
    /// Uses the index; if the index fails, falls back to a name substring
    /// query on the raw coverage table. Results are deduplicated by name with
    /// canonical records first, then ranked by match score, popularity, and
    /// distance.
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError::InvalidInput`] for a blank query, zero limit,
    /// or invalid location.
    pub async fn search_places(
        &self,
        query: &str,
        user_location: Option<GeoPoint>,
        limit: usize,
    ) -> Result<Vec<SearchResult>, PlacesError> {
        let text = query.trim();
        if text.is_empty() {
            return Err(QueryError::BlankQuery.into());
        }
        if limit == 0 {
            return Err(QueryError::ZeroLimit.into());
        }
        let user_location = validate_location(user_location)?;
        let scope = self.search_scope(user_location)?;
        let candidates = limit.saturating_mul(2).min(MAX_TEXT_CANDIDATES);

        let mut index_query =
            IndexQuery::text(text, QueryFields::Full, typo_budget(text), candidates);
        index_query.scope = scope;
        index_query.sort = IndexSort::Relevance(user_location);

        let results = match self.timed("index", self.index.search(&index_query)).await {
            Ok(matches) => scored_index_matches(matches),
            Err(e) => {
                tracing::warn!(
                    source = "index",
                    error = %e,
                    query = text,
                    "index search failed, falling back to raw coverage table"
                );
                match self
                    .timed(
                        "coverage",
                        self.coverage.search_by_name(text, scope.as_ref(), candidates),
                    )
                    .await
                {
                    Ok(cards) => cards
                        .into_iter()
                        .map(|place| SearchResult {
                            match_score: text_match_score(text, &place.name),
                            place,
                        })
                        .collect(),
                    Err(e) => {
                        tracing::warn!(source = "coverage", error = %e, "raw name search failed");
                        Vec::new()
                    }
                }
            }
        };

        Ok(self.finish_search(results, user_location, limit).await)
    }

    /// Lightweight name-only prefix search for autocomplete.
    ///
    /// A blank query yields no suggestions. An index failure yields no
    /// suggestions rather than an error.
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError::InvalidInput`] for a zero limit or invalid
    /// location.
    pub async fn search_suggestions(
        &self,
        query: &str,
        limit: usize,
        user_location: Option<GeoPoint>,
    ) -> Result<Vec<SearchResult>, PlacesError> {
        if limit == 0 {
            return Err(QueryError::ZeroLimit.into());
        }
        let user_location = validate_location(user_location)?;
        let text = query.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let mut index_query = IndexQuery::text(
            text,
            QueryFields::NameOnly,
            typo_budget(text),
            limit.saturating_mul(2).min(MAX_TEXT_CANDIDATES),
        );
        index_query.scope = self.search_scope(user_location)?;
        index_query.sort = IndexSort::Relevance(user_location);

        let results = match self.timed("index", self.index.search(&index_query)).await {
            Ok(matches) => scored_index_matches(matches),
            Err(e) => {
                tracing::warn!(source = "index", error = %e, "suggestions unavailable");
                Vec::new()
            }
        };

        Ok(self.finish_search(results, user_location, limit).await)
    }

    /// Looks up one place by response id, routing `fsq:` ids to the coverage
    /// store and everything else to the canonical store.
    ///
    /// A backend failure is reported as not found.
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError::InvalidInput`] for a blank id.
    pub async fn get_place(&self, id: &str) -> Result<Option<PlaceCard>, PlacesError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(QueryError::BlankId.into());
        }

        let found = match parse_place_id(id) {
            (PlaceSource::Coverage, native) => {
                self.timed("coverage", self.coverage.place_by_id(native)).await
            }
            (PlaceSource::Canonical, key) => {
                self.timed("canonical", self.canonical.place_by_id(key)).await
            }
        };

        match found {
            Ok(Some(card)) => {
                let mut cards = [card];
                self.labels
                    .decorate(&mut cards, self.settings.backend_timeout)
                    .await;
                let [card] = cards;
                Ok(Some(card))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                tracing::warn!(id, error = %e, "place lookup failed");
                Ok(None)
            }
        }
    }

    async fn canonical_in_scope(
        &self,
        scope: &GeoScope,
        category: Option<&CategoryFilter>,
    ) -> Vec<PlaceCard> {
        let result = self
            .timed(
                "canonical",
                self.canonical
                    .places_in_scope(scope, category, self.settings.fetch_limit),
            )
            .await;
        match result {
            Ok(cards) => cards.into_iter().filter(PlaceCard::is_active).collect(),
            Err(e) => {
                tracing::warn!(source = "canonical", error = %e, "canonical query failed");
                Vec::new()
            }
        }
    }

    /// Index first; the raw table only when the index call fails.
    async fn coverage_in_scope(
        &self,
        scope: &GeoScope,
        category: Option<&CategoryFilter>,
        exclude_ids: &[String],
        user_location: Option<GeoPoint>,
        limit: usize,
    ) -> (Vec<PlaceCard>, Option<CoveragePath>) {
        let mut query = IndexQuery::browse(*scope, limit);
        query.category = category.cloned();
        query.source = Some(PlaceSource::Coverage);
        query.exclude_ids = exclude_ids.to_vec();
        if let Some(origin) = user_location {
            query.sort = IndexSort::Distance(origin);
        }

        match self.timed("index", self.index.search(&query)).await {
            Ok(matches) => {
                let cards = matches
                    .into_iter()
                    .map(|m| m.place)
                    .filter(|card| {
                        card.coordinates()
                            .is_some_and(|point| scope.contains(&point))
                    })
                    .collect();
                return (cards, Some(CoveragePath::Index));
            }
            Err(e) => {
                tracing::warn!(
                    source = "index",
                    error = %e,
                    "coverage index query failed, using raw coverage table"
                );
            }
        }

        let raw = self
            .timed(
                "coverage",
                self.coverage
                    .places_in_scope(scope, category, exclude_ids, limit),
            )
            .await;
        match raw {
            Ok(cards) => (cards, Some(CoveragePath::Raw)),
            Err(e) => {
                tracing::warn!(source = "coverage", error = %e, "raw coverage query failed");
                (Vec::new(), None)
            }
        }
    }

    async fn finish_search(
        &self,
        results: Vec<SearchResult>,
        user_location: Option<GeoPoint>,
        limit: usize,
    ) -> Vec<SearchResult> {
        let mut results = dedupe_by_name(results, |r| &r.place);
        if let Some(origin) = user_location {
            for result in &mut results {
                result.place.annotate_distance(&origin);
            }
        }
        results.sort_by(compare_search_results);
        results.truncate(limit);

        if let Some(labels) = self
            .labels
            .labels_or_log(self.settings.backend_timeout)
            .await
        {
            for result in &mut results {
                apply_icon(labels, &mut result.place);
            }
        }
        results
    }

    fn search_scope(&self, user_location: Option<GeoPoint>) -> Result<Option<GeoScope>, PlacesError> {
        user_location
            .map(|center| GeoScope::radius(center, self.settings.search_radius_meters))
            .transpose()
            .map_err(PlacesError::from)
    }

    /// Bounds a backend call by the configured timeout.
    async fn timed<T, F>(&self, source_name: &'static str, call: F) -> Result<T, SourceError>
    where
        F: Future<Output = Result<T, SourceError>>,
    {
        let timeout = self.settings.backend_timeout;
        tokio::time::timeout(timeout, call)
            .await
            .unwrap_or_else(|_| {
                Err(SourceError::Timeout {
                    source_name,
                    timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                })
            })
    }
}

/// Per-attempt HTTP timeout for the index client.
///
/// The whole retry sequence runs inside one backend timeout, so each attempt
/// gets an equal share of what is left after the worst-case back-off delays.
fn index_attempt_timeout_ms(backend_timeout_ms: u64, max_retries: u32) -> u64 {
    let attempts = u64::from(max_retries) + 1;
    let backoff = worst_case_backoff_ms(max_retries, INDEX_BACKOFF_BASE_MS);
    let usable = match backend_timeout_ms.saturating_sub(backoff) {
        0 => backend_timeout_ms,
        left => left,
    };
    (usable / attempts).max(1)
}

/// Typos tolerated for a query of this length.
#[must_use]
pub fn typo_budget(query: &str) -> u8 {
    match query.trim().chars().count() {
        0..=3 => 0,
        4..=7 => 1,
        _ => 2,
    }
}

/// Relevance of `name` for a raw substring match: exact beats prefix beats
/// substring.
#[must_use]
pub fn text_match_score(query: &str, name: &str) -> f64 {
    let query = query.trim().to_lowercase();
    let name = name.trim().to_lowercase();
    if query.is_empty() {
        0.0
    } else if name == query {
        1.0
    } else if name.starts_with(&query) {
        0.75
    } else if name.contains(&query) {
        0.5
    } else {
        0.25
    }
}

/// Scales engine scores into `(0, 1]` relative to the best hit.
#[allow(clippy::cast_precision_loss)]
fn scored_index_matches(matches: Vec<IndexMatch>) -> Vec<SearchResult> {
    let best = matches
        .iter()
        .filter_map(|m| m.text_match)
        .max()
        .unwrap_or(0);
    matches
        .into_iter()
        .map(|m| SearchResult {
            match_score: match m.text_match {
                Some(score) if best > 0 => score as f64 / best as f64,
                _ => 0.0,
            },
            place: m.place,
        })
        .collect()
}

fn linked_coverage_ids(cards: &[PlaceCard]) -> Vec<String> {
    cards.iter().filter_map(|c| c.coverage_id.clone()).collect()
}

fn validate_scope(scope: &GeoScope) -> Result<GeoScope, QueryError> {
    match scope {
        GeoScope::Bounds(b) => {
            BoundingBox::new(b.north, b.south, b.east, b.west).map(GeoScope::Bounds)
        }
        GeoScope::Radius {
            center,
            radius_meters,
        } => GeoScope::radius(GeoPoint::new(center.lat, center.lng)?, *radius_meters),
    }
}

fn validate_location(location: Option<GeoPoint>) -> Result<Option<GeoPoint>, QueryError> {
    location
        .map(|p| GeoPoint::new(p.lat, p.lng))
        .transpose()
}

/// Nearest first; cards without a distance go last.
fn compare_distance(a: &PlaceCard, b: &PlaceCard) -> Ordering {
    match (a.distance_meters, b.distance_meters) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_search_results(a: &SearchResult, b: &SearchResult) -> Ordering {
    b.match_score
        .total_cmp(&a.match_score)
        .then_with(|| {
            let pa = a.place.popularity.unwrap_or(0.0);
            let pb = b.place.popularity.unwrap_or(0.0);
            pb.total_cmp(&pa)
        })
        .then_with(|| compare_distance(&a.place, &b.place))
}

#[cfg(test)]
#[path = "service_test.rs"]
mod tests;

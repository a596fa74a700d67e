//! Postgres-backed sources.

use async_trait::async_trait;
use sqlx::PgPool;
use wayfind_core::{CategoryFilter, GeoScope, PlaceCard};
use wayfind_db::CategoryLabelRow;

use super::{CanonicalSource, CoverageStore, LabelSource};
use crate::error::SourceError;
use crate::normalize::{normalize_canonical, normalize_coverage};

#[derive(Debug, Clone)]
pub struct PgCanonicalStore {
    pool: PgPool,
}

impl PgCanonicalStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CanonicalSource for PgCanonicalStore {
    async fn places_in_scope(
        &self,
        scope: &GeoScope,
        category: Option<&CategoryFilter>,
        limit: usize,
    ) -> Result<Vec<PlaceCard>, SourceError> {
        let rows = wayfind_db::list_canonical_places(
            &self.pool,
            scope,
            category.map(|c| c.sql_patterns.as_slice()),
            to_sql_limit(limit),
        )
        .await
        .map_err(|e| SourceError::Canonical(e.to_string()))?;

        Ok(within_scope(rows.iter().map(normalize_canonical), scope))
    }

    async fn place_by_id(&self, id: &str) -> Result<Option<PlaceCard>, SourceError> {
        let row = wayfind_db::get_canonical_place(&self.pool, id)
            .await
            .map_err(|e| SourceError::Canonical(e.to_string()))?;
        Ok(row.as_ref().map(normalize_canonical))
    }
}

#[derive(Debug, Clone)]
pub struct PgCoverageStore {
    pool: PgPool,
}

impl PgCoverageStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CoverageStore for PgCoverageStore {
    async fn places_in_scope(
        &self,
        scope: &GeoScope,
        category: Option<&CategoryFilter>,
        exclude_ids: &[String],
        limit: usize,
    ) -> Result<Vec<PlaceCard>, SourceError> {
        let rows = wayfind_db::list_coverage_places(
            &self.pool,
            scope,
            category.map(|c| c.sql_patterns.as_slice()),
            exclude_ids,
            to_sql_limit(limit),
        )
        .await
        .map_err(|e| SourceError::Coverage(e.to_string()))?;

        Ok(within_scope(rows.iter().map(normalize_coverage), scope))
    }

    async fn search_by_name(
        &self,
        term: &str,
        scope: Option<&GeoScope>,
        limit: usize,
    ) -> Result<Vec<PlaceCard>, SourceError> {
        let rows = wayfind_db::search_coverage_places_by_name(
            &self.pool,
            term,
            scope,
            to_sql_limit(limit),
        )
        .await
        .map_err(|e| SourceError::Coverage(e.to_string()))?;

        let cards = rows.iter().map(normalize_coverage);
        Ok(match scope {
            Some(scope) => within_scope(cards, scope),
            None => cards.collect(),
        })
    }

    async fn place_by_id(&self, native_id: &str) -> Result<Option<PlaceCard>, SourceError> {
        let row = wayfind_db::get_coverage_place(&self.pool, native_id)
            .await
            .map_err(|e| SourceError::Coverage(e.to_string()))?;
        Ok(row.as_ref().map(normalize_coverage))
    }
}

#[derive(Debug, Clone)]
pub struct PgLabelSource {
    pool: PgPool,
}

impl PgLabelSource {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LabelSource for PgLabelSource {
    async fn load_labels(&self) -> Result<Vec<CategoryLabelRow>, SourceError> {
        wayfind_db::list_category_labels(&self.pool)
            .await
            .map_err(|e| SourceError::Canonical(e.to_string()))
    }
}

/// SQL filters radius scopes by their enclosing box; this applies the exact
/// distance check.
fn within_scope(cards: impl Iterator<Item = PlaceCard>, scope: &GeoScope) -> Vec<PlaceCard> {
    cards
        .filter(|card| {
            card.coordinates()
                .is_some_and(|point| scope.contains(&point))
        })
        .collect()
}

fn to_sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

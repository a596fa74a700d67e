//! Read operations for the raw third-party `fsq_places` table.
//!
//! These are the slow path: the search index is preferred and these queries
//! run only when it fails.

use sqlx::PgPool;
use wayfind_core::{like_pattern, GeoScope};

/// A row from the `fsq_places` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CoveragePlaceRow {
    pub fsq_place_id: String,
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    pub locality: Option<String>,
    pub region: Option<String>,
    pub postcode: Option<String>,
    pub country: Option<String>,
    pub tel: Option<String>,
    pub website: Option<String>,
    pub fsq_category_labels: Option<Vec<String>>,
    /// Closure marker; any value means the place is closed.
    pub date_closed: Option<String>,
}

const SELECT_COLUMNS: &str = "SELECT f.fsq_place_id, f.name, \
        f.latitude::float8 AS latitude, f.longitude::float8 AS longitude, \
        f.address, f.locality, f.region, f.postcode, f.country, f.tel, \
        f.website, f.fsq_category_labels, f.date_closed::text AS date_closed \
     FROM fsq_places f";

/// SQL for [`list_coverage_places`]. Binds: 4 scope values, category
/// patterns, excluded ids, limit.
pub(crate) fn list_sql(scope: &GeoScope) -> (String, Vec<f64>) {
    let predicate = scope.sql_predicate("f.latitude", "f.longitude", 1);
    let sql = format!(
        "{SELECT_COLUMNS} \
         WHERE {} \
           AND f.date_closed IS NULL \
           AND ($5::text[] IS NULL \
                OR array_to_string(f.fsq_category_labels, ';') ILIKE ANY($5::text[])) \
           AND NOT (f.fsq_place_id = ANY($6::text[])) \
         LIMIT $7",
        predicate.clause
    );
    (sql, predicate.binds)
}

/// SQL for [`search_coverage_places_by_name`]. Binds: name pattern, lowered
/// exact name, then (when scoped) 4 scope values, then the limit.
pub(crate) fn search_sql(scope: Option<&GeoScope>) -> (String, Vec<f64>) {
    let (scope_clause, binds, limit_param) = match scope {
        Some(scope) => {
            let predicate = scope.sql_predicate("f.latitude", "f.longitude", 3);
            (format!("AND {}", predicate.clause), predicate.binds, 7)
        }
        None => (String::new(), Vec::new(), 3),
    };
    let sql = format!(
        "{SELECT_COLUMNS} \
         WHERE f.name ILIKE $1 \
           AND f.date_closed IS NULL \
           {scope_clause} \
         ORDER BY (lower(f.name) = $2) DESC, length(f.name), f.name \
         LIMIT ${limit_param}"
    );
    (sql, binds)
}

/// List open coverage places inside `scope`, skipping any whose native id is
/// in `exclude_ids`.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn list_coverage_places(
    pool: &PgPool,
    scope: &GeoScope,
    category_patterns: Option<&[String]>,
    exclude_ids: &[String],
    limit: i64,
) -> Result<Vec<CoveragePlaceRow>, sqlx::Error> {
    let (sql, binds) = list_sql(scope);
    let mut query = sqlx::query_as::<_, CoveragePlaceRow>(&sql);
    for value in binds {
        query = query.bind(value);
    }
    query
        .bind(category_patterns.map(<[String]>::to_vec))
        .bind(exclude_ids.to_vec())
        .bind(limit)
        .fetch_all(pool)
        .await
}

/// Case-insensitive substring search on place name, optionally restricted to
/// `scope`. Exact name matches sort first, then shorter names.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn search_coverage_places_by_name(
    pool: &PgPool,
    term: &str,
    scope: Option<&GeoScope>,
    limit: i64,
) -> Result<Vec<CoveragePlaceRow>, sqlx::Error> {
    let (sql, binds) = search_sql(scope);
    let mut query = sqlx::query_as::<_, CoveragePlaceRow>(&sql)
        .bind(like_pattern(term.trim()))
        .bind(term.trim().to_lowercase());
    for value in binds {
        query = query.bind(value);
    }
    query.bind(limit).fetch_all(pool).await
}

/// Fetch a single coverage place by native id, including closed places.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn get_coverage_place(
    pool: &PgPool,
    fsq_place_id: &str,
) -> Result<Option<CoveragePlaceRow>, sqlx::Error> {
    let sql = format!("{SELECT_COLUMNS} WHERE f.fsq_place_id = $1");
    sqlx::query_as::<_, CoveragePlaceRow>(&sql)
        .bind(fsq_place_id)
        .fetch_optional(pool)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfind_core::{BoundingBox, GeoPoint};

    #[test]
    fn list_sql_excludes_closed_and_known_ids() {
        let scope = GeoScope::Bounds(BoundingBox::new(30.3, 30.2, -97.7, -97.8).unwrap());
        let (sql, binds) = list_sql(&scope);
        assert!(sql.contains("f.date_closed IS NULL"));
        assert!(sql.contains("NOT (f.fsq_place_id = ANY($6::text[]))"));
        assert!(sql.ends_with("LIMIT $7"));
        assert_eq!(binds.len(), 4);
    }

    #[test]
    fn list_sql_uses_or_across_antimeridian() {
        let scope = GeoScope::Bounds(BoundingBox::new(10.0, -10.0, -170.0, 170.0).unwrap());
        let (sql, _) = list_sql(&scope);
        assert!(sql.contains("(f.longitude >= $3 OR f.longitude <= $4)"));
    }

    #[test]
    fn search_sql_without_scope_binds_limit_third() {
        let (sql, binds) = search_sql(None);
        assert!(sql.contains("f.name ILIKE $1"));
        assert!(sql.ends_with("LIMIT $3"));
        assert!(binds.is_empty());
    }

    #[test]
    fn search_sql_with_scope_numbers_after_name_binds() {
        let center = GeoPoint::new(30.27, -97.74).unwrap();
        let scope = GeoScope::radius(center, 50_000.0).unwrap();
        let (sql, binds) = search_sql(Some(&scope));
        assert!(sql.contains("f.latitude >= $3 AND f.latitude <= $4"));
        assert!(sql.ends_with("LIMIT $7"));
        assert_eq!(binds.len(), 4);
    }
}

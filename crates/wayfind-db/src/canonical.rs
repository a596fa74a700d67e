//! Read operations for the curated `places` table.

use sqlx::PgPool;
use wayfind_core::GeoScope;

/// A row from the `places` table.
///
/// `category` is the raw hierarchical label; parsing happens at
/// normalization time.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CanonicalPlaceRow {
    pub id: String,
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub category: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub status: Option<String>,
    pub cover_image_url: Option<String>,
    pub photos: Option<Vec<String>>,
    /// Coverage-store id this row was curated from, if any.
    pub fsq_place_id: Option<String>,
    pub view_count: Option<f64>,
}

const SELECT_COLUMNS: &str = "SELECT p.id::text AS id, p.name, \
        p.latitude::float8 AS latitude, p.longitude::float8 AS longitude, \
        p.category, p.address, p.city, p.state, p.country, p.postal_code, \
        p.phone, p.website, p.status, p.cover_image_url, p.photos, \
        p.fsq_place_id, p.view_count::float8 AS view_count \
     FROM places p";

/// SQL for [`list_canonical_places`]. Binds: 4 scope values, the optional
/// category pattern array, then the limit.
pub(crate) fn list_sql(scope: &GeoScope) -> (String, Vec<f64>) {
    let predicate = scope.sql_predicate("p.latitude", "p.longitude", 1);
    let sql = format!(
        "{SELECT_COLUMNS} \
         WHERE {} \
           AND (p.status IS NULL OR lower(p.status) = 'active') \
           AND ($5::text[] IS NULL OR p.category ILIKE ANY($5::text[])) \
         ORDER BY p.view_count DESC NULLS LAST, p.name \
         LIMIT $6",
        predicate.clause
    );
    (sql, predicate.binds)
}

/// List active canonical places inside `scope`.
///
/// `category_patterns` are `ILIKE` patterns matched against the category
/// column; `None` disables the category filter. A radius scope is queried by
/// its enclosing box; callers apply the exact distance filter.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn list_canonical_places(
    pool: &PgPool,
    scope: &GeoScope,
    category_patterns: Option<&[String]>,
    limit: i64,
) -> Result<Vec<CanonicalPlaceRow>, sqlx::Error> {
    let (sql, binds) = list_sql(scope);
    let mut query = sqlx::query_as::<_, CanonicalPlaceRow>(&sql);
    for value in binds {
        query = query.bind(value);
    }
    query
        .bind(category_patterns.map(<[String]>::to_vec))
        .bind(limit)
        .fetch_all(pool)
        .await
}

/// Fetch a single canonical place by primary key, regardless of status.
///
/// Returns `None` if no row matches.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn get_canonical_place(
    pool: &PgPool,
    id: &str,
) -> Result<Option<CanonicalPlaceRow>, sqlx::Error> {
    let sql = format!("{SELECT_COLUMNS} WHERE p.id::text = $1");
    sqlx::query_as::<_, CanonicalPlaceRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
}

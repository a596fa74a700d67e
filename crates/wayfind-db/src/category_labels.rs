//! Read operations for the `category_labels` reference table.

use sqlx::PgPool;

/// Display metadata for one category or subcategory name.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CategoryLabelRow {
    /// Category or subcategory text as it appears on places.
    pub key: String,
    pub label: String,
    pub icon: Option<String>,
}

/// List every category label.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn list_category_labels(pool: &PgPool) -> Result<Vec<CategoryLabelRow>, sqlx::Error> {
    sqlx::query_as::<_, CategoryLabelRow>(
        "SELECT key, label, icon \
         FROM category_labels \
         ORDER BY key",
    )
    .fetch_all(pool)
    .await
}

//! Populate-once cache for category display metadata.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;
use wayfind_core::PlaceCard;
use wayfind_db::CategoryLabelRow;

use crate::error::SourceError;
use crate::sources::LabelSource;

/// Category labels keyed by lower-cased category/subcategory text.
pub type LabelMap = HashMap<String, CategoryLabelRow>;

/// Read-through cache over the `category_labels` table.
///
/// The first caller loads the table; concurrent callers wait on that same
/// load. A failed load leaves the cache empty so a later call retries. Once
/// filled it is never invalidated.
pub struct CategoryLabelCache {
    source: Arc<dyn LabelSource>,
    cell: OnceCell<LabelMap>,
}

impl CategoryLabelCache {
    #[must_use]
    pub fn new(source: Arc<dyn LabelSource>) -> Self {
        Self {
            source,
            cell: OnceCell::new(),
        }
    }

    /// Returns the label map, loading it on first use.
    ///
    /// # Errors
    ///
    /// Returns the [`SourceError`] from the label source when the load fails.
    pub async fn get(&self) -> Result<&LabelMap, SourceError> {
        self.cell
            .get_or_try_init(|| async {
                let rows = self.source.load_labels().await?;
                tracing::debug!(count = rows.len(), "loaded category labels");
                Ok(index_labels(rows))
            })
            .await
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    /// The label map, or `None` (logged) when it cannot be loaded within
    /// `timeout`. A load cut off by the timeout is not cached.
    pub async fn labels_or_log(&self, timeout: Duration) -> Option<&LabelMap> {
        match tokio::time::timeout(timeout, self.get()).await {
            Ok(Ok(labels)) => Some(labels),
            Ok(Err(e)) => {
                tracing::warn!(source = "category_labels", error = %e, "label load failed");
                None
            }
            Err(_) => {
                tracing::warn!(
                    source = "category_labels",
                    timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    "label load timed out"
                );
                None
            }
        }
    }

    /// Sets `category_icon` on each card from its subcategory, or failing
    /// that its category. Leaves cards untouched if labels cannot be loaded
    /// within `timeout`.
    pub async fn decorate(&self, cards: &mut [PlaceCard], timeout: Duration) {
        if let Some(labels) = self.labels_or_log(timeout).await {
            for card in cards {
                apply_icon(labels, card);
            }
        }
    }
}

impl std::fmt::Debug for CategoryLabelCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CategoryLabelCache")
            .field("loaded", &self.is_loaded())
            .finish_non_exhaustive()
    }
}

fn index_labels(rows: Vec<CategoryLabelRow>) -> LabelMap {
    rows.into_iter()
        .map(|row| (row.key.trim().to_lowercase(), row))
        .collect()
}

pub(crate) fn apply_icon(labels: &LabelMap, card: &mut PlaceCard) {
    card.category_icon = card
        .subcategory
        .iter()
        .chain(std::iter::once(&card.category))
        .filter_map(|name| labels.get(&name.trim().to_lowercase()))
        .find_map(|row| row.icon.clone());
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use wayfind_core::PlaceSource;

    use super::*;

    struct CountingLabels {
        calls: AtomicUsize,
        fail_first: bool,
    }

    #[async_trait]
    impl LabelSource for CountingLabels {
        async fn load_labels(&self) -> Result<Vec<CategoryLabelRow>, SourceError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            if self.fail_first && call == 0 {
                return Err(SourceError::Canonical("boom".to_string()));
            }
            Ok(vec![
                CategoryLabelRow {
                    key: "Dining and Drinking".to_string(),
                    label: "Food & Drink".to_string(),
                    icon: Some("utensils".to_string()),
                },
                CategoryLabelRow {
                    key: "Coffee Shop".to_string(),
                    label: "Coffee".to_string(),
                    icon: Some("coffee".to_string()),
                },
            ])
        }
    }

    const LOAD_TIMEOUT: Duration = Duration::from_secs(5);

    struct HangingLabels {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LabelSource for HangingLabels {
        async fn load_labels(&self) -> Result<Vec<CategoryLabelRow>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(3_600)).await;
            Ok(Vec::new())
        }
    }

    fn counting(fail_first: bool) -> Arc<CountingLabels> {
        Arc::new(CountingLabels {
            calls: AtomicUsize::new(0),
            fail_first,
        })
    }

    fn card(category: &str, subcategory: Option<&str>) -> PlaceCard {
        let mut card = crate::test_support::card("x", "X", PlaceSource::Coverage, 30.0, -97.0);
        category.clone_into(&mut card.category);
        card.subcategory = subcategory.map(ToOwned::to_owned);
        card
    }

    #[tokio::test]
    async fn concurrent_first_use_loads_once() {
        let source = counting(false);
        let cache = Arc::new(CategoryLabelCache::new(source.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.get().await.map(HashMap::len) })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), 2);
        }

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(cache.is_loaded());
    }

    #[tokio::test]
    async fn failed_load_is_not_cached() {
        let source = counting(true);
        let cache = CategoryLabelCache::new(source.clone());

        assert!(cache.get().await.is_err());
        assert!(!cache.is_loaded());
        assert_eq!(cache.get().await.unwrap().len(), 2);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn decorate_prefers_subcategory_icon() {
        let cache = CategoryLabelCache::new(counting(false));
        let mut cards = vec![
            card("Dining and Drinking", Some("Coffee Shop")),
            card("Dining and Drinking", Some("Taco Place")),
            card("Retail", None),
        ];
        cache.decorate(&mut cards, LOAD_TIMEOUT).await;
        assert_eq!(cards[0].category_icon.as_deref(), Some("coffee"));
        assert_eq!(cards[1].category_icon.as_deref(), Some("utensils"));
        assert!(cards[2].category_icon.is_none());
    }

    #[tokio::test]
    async fn decorate_leaves_cards_alone_when_load_fails() {
        let cache = CategoryLabelCache::new(counting(true));
        let mut cards = vec![card("Dining and Drinking", None)];
        cache.decorate(&mut cards, LOAD_TIMEOUT).await;
        assert!(cards[0].category_icon.is_none());
    }

    #[tokio::test]
    async fn hanging_load_is_cut_off_and_retried_later() {
        let source = Arc::new(HangingLabels {
            calls: AtomicUsize::new(0),
        });
        let cache = CategoryLabelCache::new(source.clone());
        let mut cards = vec![card("Dining and Drinking", None)];

        let started = std::time::Instant::now();
        cache.decorate(&mut cards, Duration::from_millis(50)).await;
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(cards[0].category_icon.is_none());
        assert!(!cache.is_loaded());

        assert!(cache.labels_or_log(Duration::from_millis(50)).await.is_none());
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }
}

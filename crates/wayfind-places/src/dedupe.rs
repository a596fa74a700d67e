//! Cross-source duplicate suppression.

use std::collections::{HashMap, HashSet};

use wayfind_core::{GeoPoint, PlaceCard};

/// Collapses cards that describe the same real-world place.
///
/// Two cards are the same place when their trimmed, lower-cased names match
/// and they sit within `radius_meters` of each other. Canonical cards win over
/// coverage cards. Cards without coordinates or without a name are never
/// merged away.
#[derive(Debug, Clone, Copy)]
pub struct Deduplicator {
    radius_meters: f64,
}

impl Deduplicator {
    #[must_use]
    pub fn new(radius_meters: f64) -> Self {
        Self { radius_meters }
    }

    /// Removes duplicates. Output is ordered by source precedence, then by
    /// input order. Applying it twice gives the same result as applying it once.
    #[must_use]
    pub fn dedupe(&self, records: Vec<PlaceCard>) -> Vec<PlaceCard> {
        let mut ordered = unique_ids(records);
        ordered.sort_by_key(|card| card.source.precedence());

        let mut kept_points: HashMap<String, Vec<GeoPoint>> = HashMap::new();
        let mut kept = Vec::with_capacity(ordered.len());

        for card in ordered {
            let key = card.name_key();
            let Some(point) = card.coordinates().filter(|_| !key.is_empty()) else {
                kept.push(card);
                continue;
            };

            let group = kept_points.entry(key).or_default();
            if group
                .iter()
                .any(|seen| seen.distance_to(&point) <= self.radius_meters)
            {
                tracing::trace!(id = %card.id, name = %card.name, "dropping near duplicate");
                continue;
            }
            group.push(point);
            kept.push(card);
        }

        kept
    }
}

/// First-seen-wins name dedupe for the text search path, with canonical cards
/// seen before coverage cards. Relative order within each source is kept.
#[must_use]
pub fn dedupe_by_name<T, F>(records: Vec<T>, card: F) -> Vec<T>
where
    F: Fn(&T) -> &PlaceCard,
{
    let mut ordered = records;
    ordered.sort_by_key(|r| card(r).source.precedence());

    let mut seen = HashSet::new();
    ordered
        .into_iter()
        .filter(|r| {
            let c = card(r);
            let key = c.name_key();
            if key.is_empty() {
                seen.insert(c.id.clone())
            } else {
                seen.insert(key)
            }
        })
        .collect()
}

fn unique_ids(records: Vec<PlaceCard>) -> Vec<PlaceCard> {
    let mut ids = HashSet::new();
    records
        .into_iter()
        .filter(|card| ids.insert(card.id.clone()))
        .collect()
}

//! Bounds/radius query builder.
//!
//! Turns a viewport or a point + radius into the predicate each backend
//! understands: numbered range predicates for Postgres and a `filter_by`
//! geo expression for the search index. Category names are translated through
//! the fixed [`CATEGORY_TABLE`] here so call sites never duplicate it.

use crate::error::QueryError;
use crate::geo::{check_latitude, check_longitude, GeoPoint, EARTH_RADIUS_METERS};

/// A map viewport in decimal degrees.
///
/// `west > east` is valid and means the box crosses the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    /// Validates and builds a bounding box.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] for non-finite or out-of-range edges, or when
    /// `south` is greater than `north`.
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Result<Self, QueryError> {
        let north = check_latitude("north", north)?;
        let south = check_latitude("south", south)?;
        let east = check_longitude("east", east)?;
        let west = check_longitude("west", west)?;
        if south > north {
            return Err(QueryError::InvertedLatitude { south, north });
        }
        Ok(Self {
            north,
            south,
            east,
            west,
        })
    }

    #[must_use]
    pub fn crosses_antimeridian(&self) -> bool {
        self.west > self.east
    }

    #[must_use]
    pub fn contains(&self, point: &GeoPoint) -> bool {
        if point.lat < self.south || point.lat > self.north {
            return false;
        }
        if self.crosses_antimeridian() {
            point.lng >= self.west || point.lng <= self.east
        } else {
            point.lng >= self.west && point.lng <= self.east
        }
    }

    /// Smallest box enclosing a circle of `radius_meters` around `center`.
    ///
    /// A circle reaching a pole spans every longitude.
    #[must_use]
    pub fn around(center: &GeoPoint, radius_meters: f64) -> Self {
        let lat_delta = (radius_meters / EARTH_RADIUS_METERS).to_degrees();
        let north = center.lat + lat_delta;
        let south = center.lat - lat_delta;

        if north >= 90.0 || south <= -90.0 {
            return Self {
                north: north.min(90.0),
                south: south.max(-90.0),
                east: 180.0,
                west: -180.0,
            };
        }

        let lng_delta = lat_delta / center.lat.to_radians().cos();
        if lng_delta >= 180.0 {
            return Self {
                north,
                south,
                east: 180.0,
                west: -180.0,
            };
        }

        Self {
            north,
            south,
            east: wrap_longitude(center.lng + lng_delta),
            west: wrap_longitude(center.lng - lng_delta),
        }
    }
}

fn wrap_longitude(lng: f64) -> f64 {
    if lng > 180.0 {
        lng - 360.0
    } else if lng < -180.0 {
        lng + 360.0
    } else {
        lng
    }
}

/// The geographic restriction of a query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeoScope {
    Bounds(BoundingBox),
    Radius { center: GeoPoint, radius_meters: f64 },
}

/// A Postgres predicate with `$n` placeholders and the values to bind, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlPredicate {
    pub clause: String,
    pub binds: Vec<f64>,
}

impl GeoScope {
    /// Builds a radius scope.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidRadius`] unless `radius_meters` is finite
    /// and positive.
    pub fn radius(center: GeoPoint, radius_meters: f64) -> Result<Self, QueryError> {
        if !radius_meters.is_finite() || radius_meters <= 0.0 {
            return Err(QueryError::InvalidRadius(radius_meters));
        }
        Ok(GeoScope::Radius {
            center,
            radius_meters,
        })
    }

    /// The box used for the relational range predicate. For a radius this is
    /// the enclosing box; callers post-filter with [`GeoScope::contains`].
    #[must_use]
    pub fn enclosing_bounds(&self) -> BoundingBox {
        match self {
            GeoScope::Bounds(bbox) => *bbox,
            GeoScope::Radius {
                center,
                radius_meters,
            } => BoundingBox::around(center, *radius_meters),
        }
    }

    #[must_use]
    pub fn contains(&self, point: &GeoPoint) -> bool {
        match self {
            GeoScope::Bounds(bbox) => bbox.contains(point),
            GeoScope::Radius {
                center,
                radius_meters,
            } => center.distance_to(point) <= *radius_meters,
        }
    }

    /// Range predicate over `lat_col`/`lng_col`, numbering placeholders from
    /// `first_param`.
    #[must_use]
    pub fn sql_predicate(&self, lat_col: &str, lng_col: &str, first_param: usize) -> SqlPredicate {
        let bbox = self.enclosing_bounds();
        let p = first_param;
        let lng_join = if bbox.crosses_antimeridian() {
            "OR"
        } else {
            "AND"
        };
        let clause = format!(
            "{lat_col} >= ${} AND {lat_col} <= ${} AND ({lng_col} >= ${} {lng_join} {lng_col} <= ${})",
            p,
            p + 1,
            p + 2,
            p + 3,
        );
        SqlPredicate {
            clause,
            binds: vec![bbox.south, bbox.north, bbox.west, bbox.east],
        }
    }

    /// Typesense `filter_by` geo expression over the geopoint `field`.
    #[must_use]
    pub fn index_filter(&self, field: &str) -> String {
        match self {
            GeoScope::Radius {
                center,
                radius_meters,
            } => format!(
                "{field}:({}, {}, {:.3} km)",
                center.lat,
                center.lng,
                radius_meters / 1_000.0
            ),
            GeoScope::Bounds(bbox) if bbox.crosses_antimeridian() => format!(
                "{} || {}",
                polygon_filter(field, bbox.north, bbox.south, bbox.west, 180.0),
                polygon_filter(field, bbox.north, bbox.south, -180.0, bbox.east),
            ),
            GeoScope::Bounds(bbox) => {
                polygon_filter(field, bbox.north, bbox.south, bbox.west, bbox.east)
            }
        }
    }
}

fn polygon_filter(field: &str, north: f64, south: f64, west: f64, east: f64) -> String {
    format!("{field}:({north}, {west}, {north}, {east}, {south}, {east}, {south}, {west})")
}

/// How a logical category maps onto each backend's matching convention.
#[derive(Debug)]
pub struct CategoryMapping {
    pub key: &'static str,
    pub aliases: &'static [&'static str],
    /// Substrings matched case-insensitively against the denormalized
    /// relational category column.
    pub sql_terms: &'static [&'static str],
    /// Faceted index field and the exact values it must equal.
    pub index_field: &'static str,
    pub index_values: &'static [&'static str],
}

pub const CATEGORY_TABLE: &[CategoryMapping] = &[
    CategoryMapping {
        key: "food",
        aliases: &["restaurant", "restaurants", "dining"],
        sql_terms: &["dining", "restaurant", "food"],
        index_field: "category",
        index_values: &["Dining and Drinking"],
    },
    CategoryMapping {
        key: "coffee",
        aliases: &["cafe", "cafes", "café"],
        sql_terms: &["coffee", "cafe", "café"],
        index_field: "subcategory",
        index_values: &["Cafe, Coffee, and Tea House", "Coffee Shop", "Café"],
    },
    CategoryMapping {
        key: "nightlife",
        aliases: &["bar", "bars", "drinks"],
        sql_terms: &["bar", "pub", "brewery", "nightlife"],
        index_field: "subcategory",
        index_values: &["Bar", "Pub", "Brewery", "Cocktail Bar", "Wine Bar", "Night Club"],
    },
    CategoryMapping {
        key: "shopping",
        aliases: &["retail", "shops", "stores"],
        sql_terms: &["retail", "shop", "store"],
        index_field: "category",
        index_values: &["Retail"],
    },
    CategoryMapping {
        key: "outdoors",
        aliases: &["parks", "park", "landmarks"],
        sql_terms: &["park", "outdoor", "landmark"],
        index_field: "category",
        index_values: &["Landmarks and Outdoors"],
    },
    CategoryMapping {
        key: "arts",
        aliases: &["entertainment", "museums", "culture"],
        sql_terms: &["arts", "entertainment", "museum", "theater"],
        index_field: "category",
        index_values: &["Arts and Entertainment"],
    },
    CategoryMapping {
        key: "health",
        aliases: &["medical", "wellness"],
        sql_terms: &["health", "medic", "pharmacy", "dental"],
        index_field: "category",
        index_values: &["Health and Medicine"],
    },
    CategoryMapping {
        key: "services",
        aliases: &["pros", "professional", "business"],
        sql_terms: &["service", "business", "professional"],
        index_field: "category",
        index_values: &["Business and Professional Services"],
    },
    CategoryMapping {
        key: "community",
        aliases: &["civic", "government"],
        sql_terms: &["community", "government", "library", "school"],
        index_field: "category",
        index_values: &["Community and Government"],
    },
    CategoryMapping {
        key: "travel",
        aliases: &["hotels", "lodging", "transport"],
        sql_terms: &["travel", "transport", "hotel", "lodging"],
        index_field: "category",
        index_values: &["Travel and Transportation"],
    },
    CategoryMapping {
        key: "sports",
        aliases: &["fitness", "gym", "recreation"],
        sql_terms: &["sport", "recreation", "gym", "fitness"],
        index_field: "category",
        index_values: &["Sports and Recreation"],
    },
];

/// A category restriction rendered for both backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryFilter {
    /// `ILIKE` patterns (already wrapped in `%` and escaped).
    pub sql_patterns: Vec<String>,
    pub index_field: String,
    pub index_values: Vec<String>,
}

impl CategoryFilter {
    /// Typesense exact-match facet expression, e.g. ``category:=[`Retail`]``.
    #[must_use]
    pub fn index_filter(&self) -> String {
        let values = self
            .index_values
            .iter()
            .map(|v| format!("`{}`", v.replace('`', "")))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}:=[{values}]", self.index_field)
    }
}

/// Translates a logical category name into backend filters.
///
/// Known names and aliases use [`CATEGORY_TABLE`]; anything else falls back
/// to a substring match on the relational column and an exact match on the
/// index `category` facet. Blank input yields `None`.
#[must_use]
pub fn category_filter(category: &str) -> Option<CategoryFilter> {
    let needle = category.trim();
    if needle.is_empty() {
        return None;
    }
    let lowered = needle.to_lowercase();

    let mapped = CATEGORY_TABLE
        .iter()
        .find(|m| m.key == lowered || m.aliases.contains(&lowered.as_str()));

    Some(match mapped {
        Some(m) => CategoryFilter {
            sql_patterns: m.sql_terms.iter().map(|t| like_pattern(t)).collect(),
            index_field: m.index_field.to_string(),
            index_values: m.index_values.iter().map(ToString::to_string).collect(),
        },
        None => CategoryFilter {
            sql_patterns: vec![like_pattern(needle)],
            index_field: "category".to_string(),
            index_values: vec![needle.to_string()],
        },
    })
}

/// Wraps `term` in `%…%`, escaping `LIKE` metacharacters.
#[must_use]
pub fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

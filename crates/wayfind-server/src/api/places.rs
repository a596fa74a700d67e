use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use wayfind_core::{meters_to_miles, BoundingBox, GeoPoint, PlaceCard, SearchResult};
use wayfind_places::{BoundsQuery, FetchMetrics};

use crate::middleware::RequestId;

use super::{map_places_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

const SEARCH_DEFAULT_LIMIT: usize = 20;
const SEARCH_MAX_LIMIT: usize = 100;
const SUGGEST_DEFAULT_LIMIT: usize = 8;
const SUGGEST_MAX_LIMIT: usize = 20;

/// A place card plus display-only units.
#[derive(Debug, Serialize)]
pub(super) struct PlaceItem {
    #[serde(flatten)]
    pub place: PlaceCard,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_miles: Option<f64>,
}

impl From<PlaceCard> for PlaceItem {
    fn from(place: PlaceCard) -> Self {
        Self {
            distance_miles: place.distance_meters.map(meters_to_miles),
            place,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct SearchItem {
    #[serde(flatten)]
    pub place: PlaceItem,
    pub match_score: f64,
}

impl From<SearchResult> for SearchItem {
    fn from(result: SearchResult) -> Self {
        Self {
            place: PlaceItem::from(result.place),
            match_score: result.match_score,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct PlacesInBoundsData {
    pub places: Vec<PlaceItem>,
    pub metrics: FetchMetrics,
}

/// Either a full viewport (`north`, `south`, `east`, `west`) or a circle
/// (`lat`, `lng`, `radius_m`). `lat`/`lng` alone with a viewport set the
/// caller location for distance sorting.
#[derive(Debug, Default, Deserialize)]
pub(super) struct PlacesParams {
    pub north: Option<f64>,
    pub south: Option<f64>,
    pub east: Option<f64>,
    pub west: Option<f64>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius_m: Option<f64>,
    pub category: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct SearchParams {
    pub q: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub limit: Option<usize>,
}

pub(super) async fn list_places(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<PlacesParams>,
) -> Result<Json<ApiResponse<PlacesInBoundsData>>, ApiError> {
    let query = bounds_query(&params).map_err(|msg| ApiError::validation(req_id.0.clone(), msg))?;

    let result = state
        .places
        .fetch_places_in_bounds(&query)
        .await
        .map_err(|e| map_places_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: PlacesInBoundsData {
            places: result.places.into_iter().map(PlaceItem::from).collect(),
            metrics: result.metrics,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn search_places(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiResponse<Vec<SearchItem>>>, ApiError> {
    let location = user_location(params.lat, params.lng)
        .map_err(|msg| ApiError::validation(req_id.0.clone(), msg))?;
    let limit = normalize_limit(params.limit, SEARCH_DEFAULT_LIMIT, SEARCH_MAX_LIMIT);

    let results = state
        .places
        .search_places(params.q.as_deref().unwrap_or_default(), location, limit)
        .await
        .map_err(|e| map_places_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: results.into_iter().map(SearchItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn place_suggestions(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiResponse<Vec<SearchItem>>>, ApiError> {
    let location = user_location(params.lat, params.lng)
        .map_err(|msg| ApiError::validation(req_id.0.clone(), msg))?;
    let limit = normalize_limit(params.limit, SUGGEST_DEFAULT_LIMIT, SUGGEST_MAX_LIMIT);

    let results = state
        .places
        .search_suggestions(params.q.as_deref().unwrap_or_default(), limit, location)
        .await
        .map_err(|e| map_places_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: results.into_iter().map(SearchItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_place(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<PlaceItem>>, ApiError> {
    let place = state
        .places
        .get_place(&id)
        .await
        .map_err(|e| map_places_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", format!("place {id} not found")))?;

    Ok(Json(ApiResponse {
        data: PlaceItem::from(place),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) fn bounds_query(params: &PlacesParams) -> Result<BoundsQuery, String> {
    let location = user_location(params.lat, params.lng)?;

    let query = match (params.north, params.south, params.east, params.west) {
        (Some(north), Some(south), Some(east), Some(west)) => {
            let bbox = BoundingBox::new(north, south, east, west).map_err(|e| e.to_string())?;
            let query = BoundsQuery::new(bbox);
            match location {
                Some(point) => query.with_location(point),
                None => query,
            }
        }
        (None, None, None, None) => match (location, params.radius_m) {
            (Some(center), Some(radius)) => BoundsQuery::radius(center, radius),
            _ => {
                return Err(
                    "provide north/south/east/west, or lat/lng with radius_m".to_string(),
                )
            }
        },
        _ => return Err("north, south, east and west must be given together".to_string()),
    };

    let query = match params.category.as_deref().map(str::trim) {
        Some(category) if !category.is_empty() => query.with_category(category),
        _ => query,
    };
    Ok(match params.limit {
        Some(limit) => query.with_limit(limit),
        None => query,
    })
}

fn user_location(lat: Option<f64>, lng: Option<f64>) -> Result<Option<GeoPoint>, String> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => GeoPoint::new(lat, lng).map(Some).map_err(|e| e.to_string()),
        (None, None) => Ok(None),
        _ => Err("lat and lng must be given together".to_string()),
    }
}

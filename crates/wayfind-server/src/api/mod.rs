mod places;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use wayfind_core::AppConfig;
use wayfind_places::{PlaceService, PlacesError};
use wayfind_search::{SearchError, TypesenseClient};

use crate::middleware::{request_id, RequestId, REQUEST_ID_HEADER};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub places: PlaceService,
    /// Separate handle used only for health probes, without retries.
    pub index: TypesenseClient,
}

impl AppState {
    /// Builds the place service and index probe from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] if the Typesense base URL is invalid.
    pub fn from_config(config: &AppConfig, pool: PgPool) -> Result<Self, SearchError> {
        let index = TypesenseClient::with_base_url(
            config.typesense_api_key.as_deref(),
            config.backend_timeout_ms,
            &config.typesense_url,
            &config.typesense_collection,
        )?
        .with_retry(0, 0);
        let places = PlaceService::from_app_config(config, pool.clone())?;
        Ok(Self {
            pool,
            places,
            index,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
    index: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }

    pub fn validation(request_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(request_id, "validation_error", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Clamps an optional page size into `1..=max`, defaulting to `default`.
pub(super) fn normalize_limit(limit: Option<usize>, default: usize, max: usize) -> usize {
    limit.unwrap_or(default).clamp(1, max)
}

pub(super) fn map_places_error(request_id: String, error: &PlacesError) -> ApiError {
    match error {
        PlacesError::InvalidInput(e) => {
            tracing::debug!(error = %e, "rejected place query");
            ApiError::validation(request_id, e.to_string())
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/places", get(places::list_places))
        .route("/api/v1/places/search", get(places::search_places))
        .route("/api/v1/places/suggestions", get(places::place_suggestions))
        .route("/api/v1/places/{id}", get(places::get_place))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

/// Database down is a 503; index down alone is reported but still a 200,
/// since the raw table can serve coverage.
async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);
    let (database, index) = tokio::join!(
        wayfind_db::health_check(&state.pool),
        state.index.health()
    );

    if let Err(e) = &database {
        tracing::warn!(error = %e, "health check: database unavailable");
    }
    if let Err(e) = &index {
        tracing::warn!(error = %e, "health check: search index unavailable");
    }

    let data = HealthData {
        status: if database.is_ok() && index.is_ok() {
            "ok"
        } else {
            "degraded"
        },
        database: if database.is_ok() { "ok" } else { "unavailable" },
        index: if index.is_ok() { "ok" } else { "unavailable" },
    };
    let status = if database.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(ApiResponse { data, meta }))
}

//! HTTP routes.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use driftscape_domain::{Direction, DomainError, GridCell, NavigatorId, WorkerRecord};
use driftscape_shared::{
    MoveQuery, PositionResponse, DESCRIPTION_SOURCE_HEADER, NAVIGATOR_ID_HEADER,
};

use crate::app::App;
use crate::use_cases::navigation::{CoordinatorError, Narration};

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/position", get(position))
        .route("/api/position", get(position_json))
        .route("/look", get(look))
        .route("/move", get(move_navigator))
        .route("/api/workers", get(list_workers))
}

async fn health() -> &'static str {
    "OK"
}

/// Plain `x,y`, the form interactive clients bootstrap from.
async fn position(State(app): State<Arc<App>>, headers: HeaderMap) -> Result<String, ApiError> {
    let navigator = navigator_from(&headers)?;
    Ok(app.coordinator.position(&navigator).await.to_pair_string())
}

async fn position_json(
    State(app): State<Arc<App>>,
    headers: HeaderMap,
) -> Result<Json<PositionResponse>, ApiError> {
    let navigator = navigator_from(&headers)?;
    let cell = app.coordinator.position(&navigator).await;
    Ok(Json(PositionResponse {
        x: cell.x,
        y: cell.y,
    }))
}

async fn look(State(app): State<Arc<App>>, headers: HeaderMap) -> Result<Response, ApiError> {
    let navigator = navigator_from(&headers)?;
    Ok(narration_response(app.coordinator.look(&navigator).await))
}

async fn move_navigator(
    State(app): State<Arc<App>>,
    headers: HeaderMap,
    Query(query): Query<MoveQuery>,
) -> Result<Response, ApiError> {
    let navigator = navigator_from(&headers)?;

    let narration = match (query.direction, query.x, query.y) {
        (Some(direction), None, None) => {
            let direction: Direction = direction.parse()?;
            app.coordinator.step(&navigator, direction).await?
        }
        (None, Some(x), Some(y)) => {
            let target = GridCell::parse_pair(&x, &y)?;
            app.coordinator.move_to(&navigator, target).await?
        }
        _ => {
            return Err(ApiError::BadRequest(
                "Use ?direction=north|south|east|west or ?x=..&y=..".to_string(),
            ))
        }
    };
    Ok(narration_response(narration))
}

async fn list_workers(State(app): State<Arc<App>>) -> Json<Vec<WorkerRecord>> {
    Json(app.lifecycle.records())
}

fn navigator_from(headers: &HeaderMap) -> Result<NavigatorId, ApiError> {
    match headers.get(NAVIGATOR_ID_HEADER) {
        None => Ok(NavigatorId::default()),
        Some(value) => {
            let raw = value
                .to_str()
                .map_err(|_| ApiError::BadRequest("Navigator id must be ASCII".to_string()))?;
            Ok(raw.parse()?)
        }
    }
}

/// Narration text, tagged with its source when the worker did not answer.
fn narration_response(narration: Narration) -> Response {
    let mut response = narration.text.into_response();
    if narration.source.is_degraded() {
        response.headers_mut().insert(
            HeaderName::from_static(DESCRIPTION_SOURCE_HEADER),
            HeaderValue::from_static(narration.source.as_str()),
        );
    }
    response
}

// =============================================================================
// Error Handling
// =============================================================================

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unavailable(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg).into_response(),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
            }
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(msg) | DomainError::Parse(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<CoordinatorError> for ApiError {
    fn from(e: CoordinatorError) -> Self {
        match e {
            CoordinatorError::Validation(e) => e.into(),
            unavailable @ CoordinatorError::PositionUnavailable { .. } => {
                tracing::warn!(error = %unavailable, "Move refused");
                ApiError::Unavailable(
                    "Your position is unknown right now, try again shortly".to_string(),
                )
            }
        }
    }
}

//! HTTP surface: the hospital search endpoints, CSV upload, the visitor
//! counter and a health check.
mod error;

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use nearcare_data::{FacilityDataset, VisitorCounter};
use serde::Serialize;
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub use error::ApiError;

use crate::ingest::ingest_csv;
use crate::search::{
    FilterBody, FilterResponse, NearbyParams, NearbyResponse, PageParams, SearchService,
};

/// Facility uploads are whole files, well past axum's 2 MB default.
pub const UPLOAD_BODY_LIMIT: usize = 64 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub search: Arc<SearchService>,
    pub dataset: Arc<FacilityDataset>,
    pub visitors: Arc<VisitorCounter>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
    pub count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorResponse {
    pub total_visitors: u64,
}

pub fn create_router(state: AppState) -> Router {
    let hospitals = Router::new()
        .route("/nearby", get(nearby_hospitals))
        .route("/search", post(search_hospitals))
        .route(
            "/upload",
            post(upload_hospitals).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        );

    let visitor = Router::new()
        .route("/visit", get(count_visit))
        .route("/total", get(total_visitors));

    Router::new()
        .route("/health", get(health))
        .nest("/api/hospitals", hospitals)
        .nest("/api/visitor", visitor)
        .fallback(route_not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

async fn nearby_hospitals(
    State(state): State<AppState>,
    Query(params): Query<NearbyParams>,
) -> Result<Json<NearbyResponse>, ApiError> {
    Ok(Json(state.search.nearby(&params).await?))
}

/// A missing or unreadable body is treated as an empty filter, which then
/// fails on the required country.
async fn search_hospitals(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
    body: Option<Json<FilterBody>>,
) -> Result<Json<FilterResponse>, ApiError> {
    let body = body.map(|Json(body)| body).unwrap_or_default();
    Ok(Json(state.search.search(&body, &params).await?))
}

async fn upload_hospitals(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<UploadResponse>, ApiError> {
    let report = ingest_csv(state.dataset.clone(), body.to_vec()).await?;
    info!(?report, "Facility upload stored");
    Ok(Json(UploadResponse {
        message: "Data uploaded successfully",
        count: report.accepted,
    }))
}

/// The counter file is a few bytes, so it is rewritten on the request task.
async fn count_visit(State(state): State<AppState>) -> Result<Json<VisitorResponse>, ApiError> {
    let total_visitors = state.visitors.visit().map_err(|e| {
        error!(error = %e, "Visitor update failed");
        ApiError::server_error("Error updating visitors", e)
    })?;
    Ok(Json(VisitorResponse { total_visitors }))
}

async fn total_visitors(
    State(state): State<AppState>,
) -> Result<Json<VisitorResponse>, ApiError> {
    let total_visitors = state.visitors.total().map_err(|e| {
        error!(error = %e, "Visitor read failed");
        ApiError::server_error("Error fetching visitors", e)
    })?;
    Ok(Json(VisitorResponse { total_visitors }))
}

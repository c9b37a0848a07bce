use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use log::{debug, error};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::error::ApiError;
use crate::analysis::legacy::{Insight, legacy_insights};
use crate::analysis::{InsightsPipeline, InsightsReport};
use crate::data::loader::from_json_rows;

/// Shared, read-only handler state.
#[derive(Debug, Default)]
pub struct AppState {
    pub pipeline: InsightsPipeline,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Body of both insights endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetRequest {
    /// Records-oriented rows: `[{column: value, ...}, ...]`.
    pub data: Vec<Value>,
    /// Declared column order.
    pub columns: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct LegacyResponse {
    pub insights: Vec<Insight>,
}

/// Liveness / info.
pub async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "Data Visualization AI Insights API is running",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": ["/api/insights", "/api/insights/legacy"],
    }))
}

pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
    }))
}

/// `POST /api/insights`
pub async fn insights(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DatasetRequest>, JsonRejection>,
) -> Result<Json<InsightsReport>, ApiError> {
    let Json(request) = payload?;
    let pipeline = state.pipeline;

    let report = run_blocking(move || {
        let dataset = from_json_rows(request.data, &request.columns)?;
        Ok(pipeline.analyze(&dataset))
    })
    .await?;

    Ok(Json(report))
}

/// `POST /api/insights/legacy`
pub async fn insights_legacy(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DatasetRequest>, JsonRejection>,
) -> Result<Json<LegacyResponse>, ApiError> {
    let Json(request) = payload?;
    let pipeline = state.pipeline;

    let insights = run_blocking(move || {
        let dataset = from_json_rows(request.data, &request.columns)?;
        let report = pipeline.analyze(&dataset);
        Ok(legacy_insights(&dataset, &report))
    })
    .await?;

    Ok(Json(LegacyResponse { insights }))
}

/// Run CPU-bound analysis off the async workers and log request failures.
async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let result = match tokio::task::spawn_blocking(work).await {
        Ok(result) => result,
        Err(join_err) => Err(ApiError::Analysis(join_err.to_string())),
    };
    match &result {
        Ok(_) => debug!("analysis finished"),
        Err(e) => error!("{e}"),
    }
    result
}

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, instrument, warn};

use crate::app::pipeline::{ForecastRun, RawSelection, build_dashboard, county_summaries, run_forecast, validate_selection};
use crate::domain::HistoricalRecord;
use crate::error::{DashError, SelectionError};
use crate::forecast::CountySummary;
use crate::models::Regressor;
use crate::web::{AppState, page};

/// Error body for every JSON endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable message
    pub error: String,
    /// Machine-readable category
    pub code: String,
    /// Always false
    pub success: bool,
}

/// A `DashError` on its way out of a JSON handler.
#[derive(Debug)]
pub struct ApiError(DashError);

impl From<DashError> for ApiError {
    fn from(err: DashError) -> Self {
        Self(err)
    }
}

impl From<SelectionError> for ApiError {
    fn from(err: SelectionError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            DashError::InvalidSelection(_) => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_selection"),
            DashError::Inference(_) => (StatusCode::INTERNAL_SERVER_ERROR, "inference_error"),
            DashError::MissingFile { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "missing_file"),
            DashError::MalformedData { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "malformed_data"),
            DashError::IncompatibleModel { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "incompatible_model"),
        };
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        } else {
            warn!(error = %self.0, "request rejected");
        }
        let body = ErrorResponse {
            error: self.0.to_string(),
            code: code.to_string(),
            success: false,
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SelectionQuery {
    pub county: Option<String>,
    pub horizon: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub counties: usize,
    pub records: usize,
    pub model: String,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub summary: CountySummary,
    pub records: Vec<HistoricalRecord>,
}

/// Health check endpoint
#[instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let (dataset, model) = state.resources.preload()?;
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        counties: dataset.county_count(),
        records: dataset.len(),
        model: model.describe(),
    }))
}

/// The dashboard page. Selection problems render inline; only load failures
/// produce an error page.
#[instrument(skip(state))]
pub async fn dashboard(State(state): State<AppState>, Query(query): Query<SelectionQuery>) -> Response {
    let raw = RawSelection {
        county: query.county,
        horizon: query.horizon,
    };
    match build_dashboard(&state.resources, &raw) {
        Ok(view) => Html(page::render_dashboard(&view)).into_response(),
        Err(err) => {
            error!(error = %err, "dashboard unavailable");
            (StatusCode::INTERNAL_SERVER_ERROR, Html(page::render_error(&err))).into_response()
        }
    }
}

#[instrument(skip(state))]
pub async fn list_counties(State(state): State<AppState>) -> Result<Json<Vec<CountySummary>>, ApiError> {
    let dataset = state.resources.dataset()?;
    Ok(Json(county_summaries(&dataset)))
}

#[instrument(skip(state))]
pub async fn county_history(
    State(state): State<AppState>,
    Query(query): Query<SelectionQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let dataset = state.resources.dataset()?;
    let county = query
        .county
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or(SelectionError::MissingCounty)?;
    let history = dataset.history(county)?;
    let summary = CountySummary::from_history(&history)
        .ok_or_else(|| SelectionError::UnknownCounty(county.to_string()))?;

    Ok(Json(HistoryResponse {
        summary,
        records: history.records.to_vec(),
    }))
}

#[instrument(skip(state))]
pub async fn county_forecast(
    State(state): State<AppState>,
    Query(query): Query<SelectionQuery>,
) -> Result<Json<ForecastRun>, ApiError> {
    let dataset = state.resources.dataset()?;
    let model = state.resources.model()?;
    let config = state.resources.config();

    let default_horizon = config.default_horizon.to_string();
    let (county, horizon) = validate_selection(
        &dataset,
        query.county.as_deref(),
        query.horizon.as_deref().unwrap_or(&default_horizon),
        config.max_horizon,
    )?;

    let run = run_forecast(&dataset, &model, &county, horizon, config.options)?;
    Ok(Json(run))
}

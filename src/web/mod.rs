//! HTTP front end: the dashboard page plus a small JSON API over the same
//! pipeline.

pub mod handlers;
pub mod page;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::app::resources::Resources;
use crate::domain::DashConfig;
use crate::error::AppError;
use crate::models::Regressor;
use handlers::{county_forecast, county_history, dashboard, health_check, list_counties};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    pub resources: Arc<Resources>,
}

impl AppState {
    pub fn new(resources: Resources) -> Self {
        Self {
            resources: Arc::new(resources),
        }
    }
}

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/health", get(health_check))
        .route("/api/counties", get(list_counties))
        .route("/api/history", get(county_history))
        .route("/api/forecast", get(county_forecast))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Load the inputs, bind and serve until the process is stopped.
///
/// Inputs are loaded before binding so a missing or broken file fails startup
/// with its own exit code instead of surfacing on the first request.
pub async fn serve(config: DashConfig) -> Result<(), AppError> {
    let addr = SocketAddr::new(config.host, config.port);
    let resources = Resources::new(config);

    let (dataset, model) = resources.preload()?;
    info!(
        counties = dataset.county_count(),
        records = dataset.len(),
        model = %model.describe(),
        "inputs loaded"
    );

    let app = create_router(AppState::new(resources));

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::new(4, format!("failed to bind {addr}: {e}")))?;
    info!("dashboard listening on http://{addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::new(4, format!("server error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::Value;
    use std::path::PathBuf;

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
    }

    fn server_with(data: &str, model: &str) -> TestServer {
        let resources = Resources::new(DashConfig {
            data_path: fixture(data),
            model_path: fixture(model),
            ..DashConfig::default()
        });
        TestServer::new(create_router(AppState::new(resources))).unwrap()
    }

    fn server() -> TestServer {
        server_with("ev_sample.csv", "forest_model.json")
    }

    #[tokio::test]
    async fn health_reports_loaded_inputs() {
        let server = server();
        let response = server.get("/health").await;
        response.assert_status(StatusCode::OK);

        let body: Value = response.json();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["counties"], 3);
        assert!(body["model"].as_str().unwrap().contains("random forest"));
    }

    #[tokio::test]
    async fn forecast_endpoint_returns_requested_months() {
        let server = server();
        let response = server
            .get("/api/forecast")
            .add_query_param("county", "King")
            .add_query_param("horizon", "3")
            .await;
        response.assert_status(StatusCode::OK);

        let body: Value = response.json();
        let points = body["points"].as_array().unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0]["period"], "2024-01");
        assert_eq!(points[2]["period"], "2024-03");
        assert_eq!(body["summary"]["county"], "King");
        assert_eq!(body["metrics"]["rows"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn forecast_defaults_to_six_months() {
        let server = server();
        let response = server.get("/api/forecast").add_query_param("county", "Pierce").await;
        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["points"].as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn unknown_county_is_unprocessable() {
        let server = server();
        let response = server
            .get("/api/forecast")
            .add_query_param("county", "Atlantis")
            .add_query_param("horizon", "3")
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let body: Value = response.json();
        assert_eq!(body["code"], "invalid_selection");
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("Atlantis"));
    }

    #[tokio::test]
    async fn horizon_outside_range_is_unprocessable() {
        let server = server();
        for bad in ["0", "13", "six"] {
            let response = server
                .get("/api/forecast")
                .add_query_param("county", "King")
                .add_query_param("horizon", bad)
                .await;
            response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        }
    }

    #[tokio::test]
    async fn history_requires_a_county() {
        let server = server();
        server.get("/api/history").await.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let response = server.get("/api/history").add_query_param("county", "Snohomish").await;
        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["records"].as_array().unwrap().len(), 7);
        assert_eq!(body["summary"]["first_period"], "2023-06");
    }

    #[tokio::test]
    async fn counties_lists_every_county() {
        let server = server();
        let response = server.get("/api/counties").await;
        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["county"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["King", "Pierce", "Snohomish"]);
    }

    #[tokio::test]
    async fn dashboard_page_lists_counties() {
        let server = server();
        let response = server.get("/").await;
        response.assert_status(StatusCode::OK);

        let html = response.text();
        assert!(html.contains("<option value=\"King\">King, WA</option>"));
        assert!(html.contains("Generate forecast"));
        assert!(html.contains("Dataset overview"));
        assert!(html.contains("max=\"12\""));
    }

    #[tokio::test]
    async fn dashboard_page_renders_a_forecast() {
        let server = server();
        let response = server
            .get("/")
            .add_query_param("county", "King")
            .add_query_param("horizon", "3")
            .await;
        response.assert_status(StatusCode::OK);

        let html = response.text();
        assert!(html.contains("<option value=\"King\" selected>King, WA</option>"));
        assert!(html.contains("Detailed forecast"));
        assert!(html.contains("January 2024"));
        assert!(html.contains("<svg"));
    }

    #[tokio::test]
    async fn dashboard_page_shows_selection_notice() {
        let server = server();
        let response = server
            .get("/")
            .add_query_param("county", "King")
            .add_query_param("horizon", "13")
            .await;
        response.assert_status(StatusCode::OK);

        let html = response.text();
        assert!(html.contains("Invalid selection"));
        assert!(html.contains("between 1 and 12"));
        assert!(!html.contains("Detailed forecast"));
    }

    #[tokio::test]
    async fn missing_model_is_a_server_error() {
        let server = server_with("ev_sample.csv", "nope.json");
        server.get("/").await.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

        let response = server.get("/health").await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json();
        assert_eq!(body["code"], "missing_file");
    }
}

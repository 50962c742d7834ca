//! # ESSA HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /catalog` - Reference tables and scoring legend
//! - `GET /projects` - List projects
//! - `POST /projects` - Create a project
//! - `GET /projects/{name}` - Project view (wizard step, stages, factors, scores)
//! - `DELETE /projects/{name}` - Delete a project
//! - `POST /projects/{name}/trl` - Step 1 form
//! - `POST /projects/{name}/scoping` - Step 2 form
//! - `POST /projects/{name}/factors` - Step 3 form
//! - `POST /projects/{name}/scores` - Step 4 form
//! - `POST /projects/{name}/step` - Wizard navigation
//! - `GET /projects/{name}/results` - Step 5 results
//! - `GET /projects/{name}/export?format=csv|json` - Results table download
//!
//! ## Configuration
//!
//! CORS origins and the request body limit come from the `[server]`
//! section of the config file.

mod handlers;
mod types;

pub use handlers::{
    CHECKSUM_HEADER, catalog_handler, create_project_handler, delete_project_handler,
    export_handler, factors_handler, get_project_handler, health_handler, list_projects_handler,
    results_handler, scores_handler, scoping_handler, step_handler, trl_handler,
};
pub use types::{
    ApiError, AverageJson, CatalogResponse, CreateProjectRequest, EntryJson, ErrorResponse,
    ExportFormat, ExportQuery, FactorJson, FactorsRequest, HealthResponse, LegendJson,
    ProjectSummary, ProjectView, ResultsResponse, StageJson, StepDirection, StepRequest,
    StepResponse, StepStatusJson, TrlJson, status_for,
};

use crate::config::ServerConfig;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use essa_core::{Catalog, EssaError, Workspace};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state: the projects and the catalog they are assessed against.
#[derive(Clone)]
pub struct AppState {
    pub workspace: Arc<RwLock<Workspace>>,
    pub catalog: Arc<Catalog>,
}

impl AppState {
    #[must_use]
    pub fn new(workspace: Workspace, catalog: Catalog) -> Self {
        Self {
            workspace: Arc::new(RwLock::new(workspace)),
            catalog: Arc::new(catalog),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build the CORS layer from the configured origins.
///
/// - `["*"]`: any origin
/// - empty: localhost only
/// - otherwise: the listed origins
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o.trim() == "*") {
        tracing::warn!("CORS: Allowing ALL origins (cors_origins = [\"*\"])");
        return CorsLayer::permissive();
    }
    if origins.is_empty() {
        tracing::info!("CORS: No origins configured, defaulting to localhost only");
        return build_localhost_cors();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            let trimmed = origin.trim();
            match trimmed.parse::<HeaderValue>() {
                Ok(value) => {
                    tracing::info!("CORS: Allowing origin: {}", trimmed);
                    Some(value)
                }
                Err(e) => {
                    tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect();

    if allowed.is_empty() {
        tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
        build_localhost_cors()
    } else {
        with_methods(CorsLayer::new().allow_origin(allowed))
    }
}

/// Localhost origins on the usual dev ports.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    with_methods(CorsLayer::new().allow_origin(origins))
}

fn with_methods(layer: CorsLayer) -> CorsLayer {
    layer
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner): tracing, CORS, body limit.
pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
    let project_routes = Router::new()
        .route(
            "/projects",
            get(handlers::list_projects_handler).post(handlers::create_project_handler),
        )
        .route(
            "/projects/{name}",
            get(handlers::get_project_handler).delete(handlers::delete_project_handler),
        )
        .route("/projects/{name}/trl", post(handlers::trl_handler))
        .route("/projects/{name}/scoping", post(handlers::scoping_handler))
        .route("/projects/{name}/factors", post(handlers::factors_handler))
        .route("/projects/{name}/scores", post(handlers::scores_handler))
        .route("/projects/{name}/step", post(handlers::step_handler))
        .route("/projects/{name}/results", get(handlers::results_handler))
        .route("/projects/{name}/export", get(handlers::export_handler));

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/catalog", get(handlers::catalog_handler))
        .merge(project_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer(&config.cors_origins))
                .layer(DefaultBodyLimit::max(config.body_limit_bytes)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server and run until Ctrl+C.
pub async fn run_server(state: AppState, config: &ServerConfig) -> Result<(), EssaError> {
    let addr = format!("{}:{}", config.host, config.port);
    let router = create_router(state, config);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| EssaError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("ESSA HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| EssaError::IoError(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Cannot listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Every mutating handler takes the workspace write lock for the whole
//! request, so each request sees and leaves a consistent project.

use super::{
    AppState,
    types::{
        ApiError, CatalogResponse, CreateProjectRequest, ExportFormat, ExportQuery,
        FactorsRequest, HealthResponse, ProjectSummary, ProjectView, ResultsResponse,
        StepDirection, StepRequest, StepResponse, StepStatusJson, TrlJson,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use essa_core::{
    Project, ScopingForm, ScoreForm, Session, StepForm, TrlForm, export_results,
    formats::csv,
};

/// Header carrying the export checksum (FNV-1a, hex).
pub const CHECKSUM_HEADER: &str = "x-essa-checksum";

/// Unwrap a JSON body, turning axum's rejection into our error shape.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

// =============================================================================
// HEALTH & CATALOG
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Reference tables: TRL levels, factors, default stages, legend.
pub async fn catalog_handler(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(CatalogResponse::from(state.catalog.as_ref())))
}

// =============================================================================
// PROJECTS
// =============================================================================

/// List projects alphabetically.
pub async fn list_projects_handler(State(state): State<AppState>) -> impl IntoResponse {
    let workspace = state.workspace.read().await;
    let projects: Vec<ProjectSummary> = workspace.sessions().map(ProjectSummary::from).collect();
    (StatusCode::OK, Json(projects))
}

/// Create a project on step 1.
pub async fn create_project_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreateProjectRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = body(payload)?;

    let mut project = match &request.stages {
        Some(stages) => Project::with_stages(&request.name, stages)?,
        None => Project::new(&request.name, &state.catalog)?,
    };
    project.set_description(request.description)?;
    let session = Session::with_project(project);
    let view = ProjectView::new(&session, &state.catalog);

    state.workspace.write().await.import(session, false)?;
    tracing::info!(project = %view.name, "Project created");

    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_project_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let workspace = state.workspace.read().await;
    let session = workspace.get(&name)?;
    Ok((StatusCode::OK, Json(ProjectView::new(session, &state.catalog))))
}

pub async fn delete_project_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let removed = state.workspace.write().await.delete(&name)?;
    tracing::info!(project = %removed.project().name(), "Project deleted");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// STEP FORMS
// =============================================================================

/// Apply one step form to a project and return the updated view.
async fn apply_form(state: &AppState, name: &str, form: StepForm) -> Result<ProjectView, ApiError> {
    let mut workspace = state.workspace.write().await;
    let session = workspace.get_mut(name)?;
    session.apply(&state.catalog, &form)?;
    tracing::debug!(project = %session.project().name(), step = %form.step(), "Form applied");
    Ok(ProjectView::new(session, &state.catalog))
}

/// Step 1: select the TRL. Returns the definition and actors.
pub async fn trl_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    payload: Result<Json<TrlForm>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let form = body(payload)?;
    let level = form.level;
    apply_form(&state, &name, StepForm::Trl(form)).await?;

    let info = state
        .catalog
        .trl(level)
        .ok_or(essa_core::EssaError::UnknownTrl(level.value()))?;
    Ok((StatusCode::OK, Json(TrlJson::from(info))))
}

/// Step 2: lifecycle and changed flags.
pub async fn scoping_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    payload: Result<Json<ScopingForm>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let form = body(payload)?;
    let view = apply_form(&state, &name, StepForm::Scoping(form)).await?;
    Ok((StatusCode::OK, Json(view)))
}

/// Step 3: factor selections. All selections apply or none do.
pub async fn factors_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    payload: Result<Json<FactorsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = body(payload)?;
    if !request.defaults && request.selections.is_empty() {
        return Err(ApiError::bad_request(
            "Request must set `defaults` or contain at least one selection",
        ));
    }

    let mut workspace = state.workspace.write().await;
    let session = workspace.get_mut(&name)?;
    let mut draft = session.project().clone();
    if request.defaults {
        draft.select_default_factors(&state.catalog);
    }
    for selection in &request.selections {
        selection.apply(&mut draft, &state.catalog)?;
    }
    *session.project_mut() = draft;

    Ok((StatusCode::OK, Json(ProjectView::new(session, &state.catalog))))
}

/// Step 4: scores. The batch applies atomically.
pub async fn scores_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    payload: Result<Json<ScoreForm>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let form = body(payload)?;
    let view = apply_form(&state, &name, StepForm::Scores(form)).await?;
    Ok((StatusCode::OK, Json(view)))
}

/// Move the wizard forward or back.
pub async fn step_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    payload: Result<Json<StepRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = body(payload)?;
    let mut workspace = state.workspace.write().await;
    let session = workspace.get_mut(&name)?;

    let step = match request.direction {
        StepDirection::Next => session.advance(),
        StepDirection::Back => session.back(),
    };

    Ok((
        StatusCode::OK,
        Json(StepResponse {
            step,
            title: step.title().to_string(),
            status: session.status().iter().map(StepStatusJson::from).collect(),
        }),
    ))
}

// =============================================================================
// RESULTS & EXPORT
// =============================================================================

/// Step 5: averages, worst stage(s), overall score and breakdown.
pub async fn results_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let workspace = state.workspace.read().await;
    let session = workspace.get(&name)?;
    let response = ResultsResponse::new(session.project())?;
    Ok((StatusCode::OK, Json(response)))
}

/// Download the results table as CSV (default) or JSON.
pub async fn export_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let workspace = state.workspace.read().await;
    let session = workspace.get(&name)?;
    let table = export_results(session.project())?;
    let checksum = format!("{:016x}", table.checksum());

    let mut response = match query.format {
        ExportFormat::Csv => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"essa-results.csv\""),
            ],
            csv::to_csv(&table),
        )
            .into_response(),
        ExportFormat::Json => (StatusCode::OK, Json(&table)).into_response(),
    };

    if let Ok(value) = HeaderValue::from_str(&checksum) {
        response.headers_mut().insert(CHECKSUM_HEADER, value);
    }
    tracing::info!(project = %table.project, rows = table.rows.len(), "Results exported");
    Ok(response)
}

//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.
//!
//! Step forms (`TrlForm`, `ScopingForm`, `FactorForm`, `ScoreForm`) come
//! straight from the core and reject unknown fields and out-of-range values
//! at deserialization. The response types here are plain views.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use essa_core::{
    Catalog, Category, ErrorKind, EssaError, FactorForm, FactorInfo, Mean, Project, ScoreEntry,
    ScoreLabel, Session, StageName, Step, StepStatus, TrlInfo,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Error class: validation, incomplete_data, not_found, conflict,
    /// format, io, config.
    pub kind: String,
}

/// An error on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    /// A 400 for a request body that could not be decoded.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorResponse {
                error: message.into(),
                kind: kind_name(ErrorKind::Validation).to_string(),
            },
        }
    }
}

impl From<EssaError> for ApiError {
    fn from(error: EssaError) -> Self {
        let kind = error.kind();
        Self {
            status: status_for(kind),
            body: ErrorResponse {
                error: error.to_string(),
                kind: kind_name(kind).to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(error = %self.body.error, "Request failed");
        } else {
            tracing::debug!(status = %self.status, error = %self.body.error, "Request rejected");
        }
        (self.status, Json(self.body)).into_response()
    }
}

/// HTTP status for an error class.
#[must_use]
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation | ErrorKind::Format => StatusCode::BAD_REQUEST,
        ErrorKind::IncompleteData => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Io | ErrorKind::Config => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn kind_name(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Validation => "validation",
        ErrorKind::IncompleteData => "incomplete_data",
        ErrorKind::NotFound => "not_found",
        ErrorKind::Conflict => "conflict",
        ErrorKind::Format => "format",
        ErrorKind::Io => "io",
        ErrorKind::Config => "config",
    }
}

// =============================================================================
// REQUESTS
// =============================================================================

/// Create a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Custom lifecycle instead of the catalog default.
    #[serde(default)]
    pub stages: Option<Vec<StageName>>,
}

/// Step 3 submission: the catalog defaults, explicit selections, or both
/// (selections are applied after the defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FactorsRequest {
    #[serde(default)]
    pub defaults: bool,
    #[serde(default)]
    pub selections: Vec<FactorForm>,
}

/// Wizard navigation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepDirection {
    Next,
    Back,
}

/// Move the wizard one step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepRequest {
    pub direction: StepDirection,
}

/// Export format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

/// Query string of the export endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: ExportFormat,
}

// =============================================================================
// PROJECT VIEWS
// =============================================================================

/// One row of the project listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub name: String,
    pub step: Step,
    pub trl: Option<u8>,
    pub complete: bool,
}

impl From<&Session> for ProjectSummary {
    fn from(session: &Session) -> Self {
        let project = session.project();
        Self {
            name: project.name().to_string(),
            step: session.step(),
            trl: project.trl().map(|t| t.value()),
            complete: project.is_complete(),
        }
    }
}

/// A TRL table row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrlJson {
    pub level: u8,
    pub definition: String,
    pub actors: Vec<String>,
    /// Actors joined for display, "N/A" when none.
    pub actors_line: String,
}

impl From<&TrlInfo> for TrlJson {
    fn from(info: &TrlInfo) -> Self {
        Self {
            level: info.level.value(),
            definition: info.definition.clone(),
            actors: info.actors.clone(),
            actors_line: info.actors_line(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageJson {
    pub name: String,
    pub changed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorJson {
    pub category: Category,
    pub name: String,
}

/// A scored pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryJson {
    pub stage: String,
    pub factor: String,
    pub score: u8,
    pub label: String,
    pub note: String,
}

impl From<&ScoreEntry> for EntryJson {
    fn from(entry: &ScoreEntry) -> Self {
        Self {
            stage: entry.stage.to_string(),
            factor: entry.factor.to_string(),
            score: entry.score.value(),
            label: entry.score.label().name().to_string(),
            note: entry.note.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepStatusJson {
    pub step: Step,
    pub title: String,
    pub complete: bool,
    pub current: bool,
}

impl From<&StepStatus> for StepStatusJson {
    fn from(status: &StepStatus) -> Self {
        Self {
            step: status.step,
            title: status.title.to_string(),
            complete: status.complete,
            current: status.current,
        }
    }
}

/// Everything about a project the wizard UI needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectView {
    pub name: String,
    pub description: String,
    pub trl: Option<TrlJson>,
    pub notes: String,
    pub step: Step,
    pub status: Vec<StepStatusJson>,
    pub stages: Vec<StageJson>,
    pub factors: Vec<FactorJson>,
    pub entries: Vec<EntryJson>,
    /// Active pairs still without a score.
    pub missing: usize,
    pub warnings: Vec<String>,
}

impl ProjectView {
    #[must_use]
    pub fn new(session: &Session, catalog: &Catalog) -> Self {
        let project = session.project();
        Self {
            name: project.name().to_string(),
            description: project.description().to_string(),
            trl: project.trl_info(catalog).map(TrlJson::from),
            notes: project.notes().to_string(),
            step: session.step(),
            status: session.status().iter().map(StepStatusJson::from).collect(),
            stages: project
                .scoping()
                .stages()
                .iter()
                .map(|s| StageJson {
                    name: s.name.to_string(),
                    changed: s.changed,
                })
                .collect(),
            factors: project
                .factors()
                .active()
                .map(|(category, name)| FactorJson {
                    category,
                    name: name.to_string(),
                })
                .collect(),
            entries: project.entries().iter().map(EntryJson::from).collect(),
            missing: project.missing_pairs().len(),
            warnings: project
                .scoping_warnings()
                .iter()
                .map(|w| w.message().to_string())
                .collect(),
        }
    }
}

/// Response to a navigation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResponse {
    pub step: Step,
    pub title: String,
    pub status: Vec<StepStatusJson>,
}

// =============================================================================
// RESULTS
// =============================================================================

/// An exact average with its display form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AverageJson {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    pub sum: u32,
    pub count: u32,
    /// Rounded to two decimals ("2.67").
    pub average: String,
    pub label: String,
}

impl AverageJson {
    #[must_use]
    pub fn new(name: impl Into<String>, category: Option<Category>, mean: Mean) -> Self {
        Self {
            name: name.into(),
            category,
            sum: mean.sum(),
            count: mean.count(),
            average: mean.to_string(),
            label: mean.label().name().to_string(),
        }
    }
}

/// Step 5 view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsResponse {
    pub project: String,
    pub by_stage: Vec<AverageJson>,
    pub by_factor: Vec<AverageJson>,
    /// Every stage tied at the highest average, in lifecycle order.
    pub worst_stages: Vec<String>,
    pub worst_average: String,
    pub overall: AverageJson,
    /// Factor scores of the first worst stage, highest first.
    pub breakdown: Vec<EntryJson>,
}

impl ResultsResponse {
    /// Build the view. Fails like [`Project::results`] on an incomplete grid.
    pub fn new(project: &Project) -> Result<Self, EssaError> {
        let results = project.results()?;
        let breakdown = match results.worst.stages.first() {
            Some(stage) => project.stage_breakdown(stage)?,
            None => Vec::new(),
        };

        Ok(Self {
            project: project.name().to_string(),
            by_stage: results
                .by_stage
                .iter()
                .map(|s| AverageJson::new(s.stage.as_str(), None, s.mean))
                .collect(),
            by_factor: results
                .by_factor
                .iter()
                .map(|f| AverageJson::new(f.factor.as_str(), Some(f.category), f.mean))
                .collect(),
            worst_stages: results.worst.stages.iter().map(|s| s.to_string()).collect(),
            worst_average: results.worst.mean.to_string(),
            overall: AverageJson::new("Overall", None, results.overall),
            breakdown: breakdown.iter().map(EntryJson::from).collect(),
        })
    }
}

// =============================================================================
// CATALOG
// =============================================================================

/// One row of the scoring legend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegendJson {
    pub score: u8,
    pub label: String,
    pub explanation: String,
}

/// The reference tables the questionnaire is built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogResponse {
    pub trl_levels: Vec<TrlJson>,
    pub factors: Vec<FactorInfo>,
    pub default_stages: Vec<String>,
    pub legend: Vec<LegendJson>,
}

impl From<&Catalog> for CatalogResponse {
    fn from(catalog: &Catalog) -> Self {
        Self {
            trl_levels: catalog.trl_levels.iter().map(TrlJson::from).collect(),
            factors: catalog.factors.clone(),
            default_stages: catalog.default_stages.iter().map(|s| s.to_string()).collect(),
            legend: ScoreLabel::ALL
                .iter()
                .map(|label| LegendJson {
                    score: label.upper(),
                    label: label.name().to_string(),
                    explanation: label.explanation().to_string(),
                })
                .collect(),
        }
    }
}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AppState;
use crate::models::*;
use crate::planner::{sequence, synthesize, PlannerError};

// ============================================================
// Error Handling
// ============================================================

/// Log an internal error and return a sanitized response to the client.
/// The full error is logged server-side for debugging, but clients only
/// see a generic message to avoid leaking internal details.
///
/// Some errors are validation errors that should be exposed to the client
/// (e.g., "Project not found"). These are returned as-is with a BAD_REQUEST
/// status.
fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    let msg = e.to_string();

    // Known validation errors that are safe to expose
    if msg.contains("not found") || msg.contains("must not be empty") {
        tracing::warn!("Validation error: {}", msg);
        return (StatusCode::BAD_REQUEST, msg);
    }

    tracing::error!("Internal error: {}", msg);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

fn planner_error(e: PlannerError) -> (StatusCode, String) {
    match e {
        PlannerError::EmptyIdea => (StatusCode::BAD_REQUEST, e.to_string()),
        PlannerError::ConfigurationMissing(_) => {
            tracing::warn!("{}", e);
            (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
        }
        PlannerError::Persistence(inner) => internal_error(format!("{:#}", inner)),
    }
}

/// Reject a client-supplied backlog that breaks the feature invariants.
fn invalid_features(features: &[Feature]) -> Result<(), (StatusCode, String)> {
    validate_backlog(features).map_err(|msg| {
        tracing::warn!("Validation error: {}", msg);
        (StatusCode::BAD_REQUEST, msg)
    })
}

fn project_not_found() -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, "Project not found".to_string())
}

// ============================================================
// Request / Response Types
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub idea: String,
    /// Defaults to the demo placeholder, which is never persisted.
    #[serde(default = "default_project_id")]
    pub project_id: String,
    #[serde(default)]
    pub use_ai: bool,
}

fn default_project_id() -> String {
    PLACEHOLDER_PROJECT_ID.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceRequest {
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstructionRequest {
    pub feature: Feature,
    #[serde(default)]
    pub tech_stack: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstructionResponse {
    #[serde(flatten)]
    pub instruction: Instruction,
    /// The instruction rendered as a Markdown prompt document.
    pub rendered: String,
}

impl From<Instruction> for InstructionResponse {
    fn from(instruction: Instruction) -> Self {
        let rendered = instruction.render();
        Self {
            instruction,
            rendered,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightRequest {
    pub idea: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightResponse {
    pub insight: String,
}

#[derive(Debug, Deserialize)]
pub struct InstructionQuery {
    pub tech_stack: Option<String>,
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Projects
// ============================================================

pub async fn list_projects(
    State(state): State<AppState>,
) -> Result<Json<Vec<Project>>, (StatusCode, String)> {
    state.db.get_all_projects().map(Json).map_err(internal_error)
}

pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Project>, (StatusCode, String)> {
    state
        .db
        .get_project(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(project_not_found)
}

pub async fn create_project(
    State(state): State<AppState>,
    Json(input): Json<CreateProjectInput>,
) -> Result<(StatusCode, Json<Project>), (StatusCode, String)> {
    if input.name.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Project name must not be empty".to_string()));
    }

    state
        .db
        .create_project(input)
        .map(|p| (StatusCode::CREATED, Json(p)))
        .map_err(internal_error)
}

pub async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state.db.delete_project(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(project_not_found())
    }
}

// ============================================================
// Project Features
// ============================================================

pub async fn list_project_features(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Feature>>, (StatusCode, String)> {
    state
        .db
        .get_project(id)
        .map_err(internal_error)?
        .ok_or_else(project_not_found)?;

    state
        .db
        .get_features_by_project(&id.to_string())
        .map(Json)
        .map_err(internal_error)
}

pub async fn get_project_waves(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Wave>>, (StatusCode, String)> {
    state
        .db
        .get_project(id)
        .map_err(internal_error)?
        .ok_or_else(project_not_found)?;

    let backlog = state
        .db
        .get_features_by_project(&id.to_string())
        .map_err(internal_error)?;

    Ok(Json(sequence(backlog)))
}

pub async fn get_feature_instruction(
    State(state): State<AppState>,
    Path((project_id, feature_id)): Path<(Uuid, String)>,
    Query(query): Query<InstructionQuery>,
) -> Result<Json<InstructionResponse>, (StatusCode, String)> {
    let project = state
        .db
        .get_project(project_id)
        .map_err(internal_error)?
        .ok_or_else(project_not_found)?;

    let feature = state
        .db
        .get_feature(&feature_id)
        .map_err(internal_error)?
        .filter(|f| f.project_id == project.id.to_string())
        .ok_or((StatusCode::NOT_FOUND, "Feature not found".to_string()))?;

    let tech_stack = query
        .tech_stack
        .or(project.tech_stack)
        .unwrap_or_default();

    Ok(Json(synthesize(&feature, &tech_stack).into()))
}

// ============================================================
// Planning Pipeline
// ============================================================

pub async fn run_analysis(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisOutcome>, (StatusCode, String)> {
    let mode = Mode::from_use_ai(req.use_ai);

    state
        .planner
        .run_analysis(&req.idea, &req.project_id, mode)
        .await
        .map(Json)
        .map_err(planner_error)
}

pub async fn sequence_waves(
    Json(req): Json<SequenceRequest>,
) -> Result<Json<Vec<Wave>>, (StatusCode, String)> {
    invalid_features(&req.features)?;
    Ok(Json(sequence(req.features)))
}

pub async fn synthesize_instruction(
    Json(req): Json<InstructionRequest>,
) -> Result<Json<InstructionResponse>, (StatusCode, String)> {
    invalid_features(std::slice::from_ref(&req.feature))?;
    Ok(Json(synthesize(&req.feature, &req.tech_stack).into()))
}

pub async fn quick_insight(
    State(state): State<AppState>,
    Json(req): Json<InsightRequest>,
) -> Result<Json<InsightResponse>, (StatusCode, String)> {
    if req.idea.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, PlannerError::EmptyIdea.to_string()));
    }

    let insight = state.planner.quick_insight(&req.idea).await;
    Ok(Json(InsightResponse { insight }))
}

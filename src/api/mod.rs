mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::Database;
use crate::planner::Planner;

pub use handlers::{
    AnalyzeRequest, InsightRequest, InsightResponse, InstructionRequest, InstructionResponse,
    SequenceRequest,
};

/// Shared state for every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub planner: Arc<Planner>,
}

pub fn create_router(db: Database, planner: Planner) -> Router {
    let state = AppState {
        db,
        planner: Arc::new(planner),
    };

    let api = Router::new()
        // Projects
        .route("/projects", get(handlers::list_projects).post(handlers::create_project))
        .route("/projects/{id}", get(handlers::get_project).delete(handlers::delete_project))
        .route("/projects/{id}/features", get(handlers::list_project_features))
        .route("/projects/{id}/waves", get(handlers::get_project_waves))
        .route(
            "/projects/{id}/features/{feature_id}/instruction",
            get(handlers::get_feature_instruction),
        )
        // Planning pipeline
        .route("/analyses", post(handlers::run_analysis))
        .route("/waves", post(handlers::sequence_waves))
        .route("/instructions", post(handlers::synthesize_instruction))
        .route("/insights", post(handlers::quick_insight))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

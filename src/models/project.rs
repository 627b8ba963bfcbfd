use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Project id used by demo calls. Features analyzed under it are never persisted.
pub const PLACEHOLDER_PROJECT_ID: &str = "demo-project-id";

/// A project owning persisted features.
///
/// Projects are the top-level organizational unit. The optional `tech_stack`
/// is the default stack used when instructions are generated for the
/// project's features.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub tech_stack: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectInput {
    pub name: String,
    pub description: Option<String>,
    /// Default stack for instruction synthesis (e.g. "React + Node").
    pub tech_stack: Option<String>,
}

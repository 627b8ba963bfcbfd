//! MCP server exposing the planning pipeline to AI agents.

mod types;
pub mod wave_render;

use std::sync::Arc;

pub use types::*;

use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use serde::Serialize;
use uuid::Uuid;

use crate::db::Database;
use crate::models::*;
use crate::planner::{sequence, synthesize, Planner, PlannerError};

#[derive(Clone)]
pub struct McpServer {
    db: Database,
    planner: Arc<Planner>,
    tool_router: ToolRouter<Self>,
}

impl McpServer {
    pub fn new(db: Database, planner: Planner) -> Self {
        Self {
            db,
            planner: Arc::new(planner),
            tool_router: Self::tool_router(),
        }
    }

    fn parse_uuid(s: &str) -> Result<Uuid, McpError> {
        Uuid::parse_str(s)
            .map_err(|e| McpError::invalid_params(format!("Invalid UUID: {}", e), None))
    }

    fn planner_err(e: PlannerError) -> McpError {
        match e {
            PlannerError::EmptyIdea | PlannerError::ConfigurationMissing(_) => {
                McpError::invalid_params(e.to_string(), None)
            }
            PlannerError::Persistence(inner) => {
                McpError::internal_error(format!("{:#}", inner), None)
            }
        }
    }

    fn require_project(&self, project_id: &str) -> Result<Project, McpError> {
        let id = Self::parse_uuid(project_id)?;
        self.db
            .get_project(id)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?
            .ok_or_else(|| McpError::invalid_params("Project not found", None))
    }

    fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // ============================================================
    // Test helpers - expose tool logic for testing
    // ============================================================

    pub async fn test_analyze_idea(
        &self,
        idea: &str,
        project_id: Option<&str>,
        use_ai: bool,
    ) -> Result<AnalysisResponse, McpError> {
        let project_id = match project_id {
            Some(id) => self.require_project(id)?.id.to_string(),
            None => PLACEHOLDER_PROJECT_ID.to_string(),
        };

        let outcome = self
            .planner
            .run_analysis(idea, &project_id, Mode::from_use_ai(use_ai))
            .await
            .map_err(Self::planner_err)?;

        Ok(AnalysisResponse::from(&outcome))
    }

    pub fn test_sequence_waves(&self, project_id: &str) -> Result<WavePlanResponse, McpError> {
        let project = self.require_project(project_id)?;

        let backlog = self
            .db
            .get_features_by_project(&project.id.to_string())
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        let waves = sequence(backlog);

        Ok(WavePlanResponse {
            project_id: project.id.to_string(),
            rendered: wave_render::render_plan(&waves),
            waves: waves.iter().map(WaveInfo::from).collect(),
        })
    }

    pub fn test_generate_instruction(
        &self,
        feature_id: &str,
        tech_stack: Option<&str>,
    ) -> Result<InstructionInfo, McpError> {
        let feature = self
            .db
            .get_feature(feature_id)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?
            .ok_or_else(|| McpError::invalid_params("Feature not found", None))?;

        let tech_stack = match tech_stack {
            Some(stack) => stack.to_string(),
            None => self
                .require_project(&feature.project_id)?
                .tech_stack
                .unwrap_or_default(),
        };

        let instruction = synthesize(&feature, &tech_stack);
        Ok(InstructionInfo::new(&feature.id, instruction))
    }

    pub fn test_create_project(
        &self,
        name: &str,
        description: Option<&str>,
        tech_stack: Option<&str>,
    ) -> Result<ProjectInfo, McpError> {
        if name.trim().is_empty() {
            return Err(McpError::invalid_params("Project name must not be empty", None));
        }

        let project = self
            .db
            .create_project(CreateProjectInput {
                name: name.to_string(),
                description: description.map(String::from),
                tech_stack: tech_stack.map(String::from),
            })
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        Ok(ProjectInfo::from(&project))
    }

    pub fn test_list_features(&self, project_id: &str) -> Result<FeatureListResponse, McpError> {
        let project = self.require_project(project_id)?;

        let features = self
            .db
            .get_features_by_project(&project.id.to_string())
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        Ok(FeatureListResponse {
            project_id: project.id.to_string(),
            features: features.iter().map(FeatureInfo::from).collect(),
        })
    }
}

#[tool_router]
impl McpServer {
    // ============================================================
    // Planning Tools
    // ============================================================

    #[tool(
        description = "Analyze a free-text product idea and propose up to a handful of risk-scored features. With use_ai=false (default) a deterministic keyword heuristic is used and no network calls are made. With use_ai=true the idea is checked against grounded web search (technical feasibility, market, compliance) and features are extracted by an AI model; the cited sources are returned. Pass project_id to save the features to that project; omit it for a dry run."
    )]
    async fn analyze_idea(
        &self,
        params: Parameters<AnalyzeIdeaRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let response = self
            .test_analyze_idea(&req.idea, req.project_id.as_deref(), req.use_ai)
            .await?;
        Self::json_result(&response)
    }

    #[tool(
        description = "Sequence a project's features into delivery waves. Features are ordered by business value (highest first) and packed into waves of at most 3, with at most one High-risk feature per wave. Wave 1 is the MVP. Returns the waves and an ASCII rendering."
    )]
    async fn sequence_waves(
        &self,
        params: Parameters<SequenceWavesRequest>,
    ) -> Result<CallToolResult, McpError> {
        let response = self.test_sequence_waves(&params.0.project_id)?;
        Self::json_result(&response)
    }

    #[tool(
        description = "Generate a Role/Task/Context/Format prompt for implementing one feature. The role is chosen from the tech stack; UI features are split into presentation and container components; large features ask for step-by-step reasoning. Returns the structured instruction and a rendered Markdown prompt."
    )]
    async fn generate_instruction(
        &self,
        params: Parameters<GenerateInstructionRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let response = self.test_generate_instruction(&req.feature_id, req.tech_stack.as_deref())?;
        Self::json_result(&response)
    }

    // ============================================================
    // Project Tools
    // ============================================================

    #[tool(
        description = "Create a project to own analyzed features. Optionally set a default tech stack used when generating instructions."
    )]
    async fn create_project(
        &self,
        params: Parameters<CreateProjectRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let response = self.test_create_project(
            &req.name,
            req.description.as_deref(),
            req.tech_stack.as_deref(),
        )?;
        Self::json_result(&response)
    }

    #[tool(description = "List a project's saved features in backlog order.")]
    async fn list_features(
        &self,
        params: Parameters<ListFeaturesRequest>,
    ) -> Result<CallToolResult, McpError> {
        let response = self.test_list_features(&params.0.project_id)?;
        Self::json_result(&response)
    }
}

#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: rmcp::model::Implementation {
                name: "leanwave".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                icons: None,
                website_url: None,
            },
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            instructions: Some(
                r#"leanwave turns product ideas into risk-scored features, delivery waves and agent-ready prompts.

WORKFLOW:
1. Call create_project with a name and, optionally, the tech stack
2. Call analyze_idea with the idea text and project_id to propose and save features
3. Call sequence_waves to see the delivery plan (wave 1 is the MVP)
4. Call generate_instruction for a feature to get the prompt for a coding agent

FEATURE FIELDS:
- size: S, M or L. L features get a chain-of-thought strategy.
- risk: Low, Medium or High. Waves hold at most one High-risk feature.
- business_value: 1 to 10. Sequencing puts higher values first.
- category: UI, Logic or Database.

NOTES:
- analyze_idea without project_id is a dry run: nothing is saved
- use_ai=true needs an API key; without it the call fails before any search
- An empty feature list with use_ai=true means the AI response was rejected;
  retry or use the heuristic"#
                    .into(),
            ),
            ..Default::default()
        }
    }
}

pub async fn run_stdio_server(db: Database, planner: Planner) -> anyhow::Result<()> {
    use tokio::io::{stdin, stdout};

    tracing::info!("Starting MCP server via stdio");

    let service = McpServer::new(db, planner);
    let server = service.serve((stdin(), stdout())).await?;

    let quit_reason = server.waiting().await?;
    tracing::info!("MCP server stopped: {:?}", quit_reason);

    Ok(())
}

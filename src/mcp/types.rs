//! Request and response types for MCP tools.

use std::collections::BTreeMap;

use rmcp::schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::models::{AnalysisOutcome, Feature, Instruction, Project, Source, Wave};

// ============================================================
// Request Types
// ============================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AnalyzeIdeaRequest {
    #[schemars(description = "Free-text description of the product idea")]
    pub idea: String,
    #[schemars(
        description = "The UUID of the project that will own the features. Omit for a dry run that persists nothing."
    )]
    #[serde(default)]
    pub project_id: Option<String>,
    #[schemars(
        description = "Use grounded search and AI extraction instead of the keyword heuristic. Requires a configured API key."
    )]
    #[serde(default)]
    pub use_ai: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SequenceWavesRequest {
    #[schemars(description = "The UUID of the project whose features should be sequenced")]
    pub project_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GenerateInstructionRequest {
    #[schemars(description = "The id of the feature to build a prompt for")]
    pub feature_id: String,
    #[schemars(
        description = "Target tech stack (e.g. 'React + Node'). Defaults to the project's tech stack."
    )]
    #[serde(default)]
    pub tech_stack: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateProjectRequest {
    #[schemars(description = "Project name")]
    pub name: String,
    #[schemars(description = "Short description of the project")]
    #[serde(default)]
    pub description: Option<String>,
    #[schemars(description = "Default tech stack used when generating instructions")]
    #[serde(default)]
    pub tech_stack: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListFeaturesRequest {
    #[schemars(description = "The UUID of the project to list features for")]
    pub project_id: String,
}

// ============================================================
// Response Types
// ============================================================

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct FeatureInfo {
    pub id: String,
    pub title: String,
    pub description: String,
    pub size: String,
    pub risk: String,
    pub business_value: u8,
    pub wow_factor: bool,
    pub category: String,
}

impl From<&Feature> for FeatureInfo {
    fn from(feature: &Feature) -> Self {
        Self {
            id: feature.id.clone(),
            title: feature.title.clone(),
            description: feature.description.clone(),
            size: feature.size.as_str().to_string(),
            risk: feature.risk.as_str().to_string(),
            business_value: feature.business_value,
            wow_factor: feature.wow_factor,
            category: feature.category.as_str().to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SourceInfo {
    pub title: String,
    pub uri: String,
}

impl From<&Source> for SourceInfo {
    fn from(source: &Source) -> Self {
        Self {
            title: source.title.clone(),
            uri: source.uri.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisResponse {
    /// "heuristic" or "grounded"
    pub mode: String,
    pub features: Vec<FeatureInfo>,
    /// Cited sources, numbered by position
    pub sources: Vec<SourceInfo>,
    pub queries: Vec<String>,
    /// Whether the features were saved to the project
    pub persisted: bool,
}

impl From<&AnalysisOutcome> for AnalysisResponse {
    fn from(outcome: &AnalysisOutcome) -> Self {
        Self {
            mode: outcome.mode.as_str().to_string(),
            features: outcome.features.iter().map(FeatureInfo::from).collect(),
            sources: outcome.sources.iter().map(SourceInfo::from).collect(),
            queries: outcome.queries.clone(),
            persisted: outcome.persisted,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct WaveInfo {
    pub number: usize,
    pub label: String,
    pub has_high_risk: bool,
    pub features: Vec<FeatureInfo>,
}

impl From<&Wave> for WaveInfo {
    fn from(wave: &Wave) -> Self {
        Self {
            number: wave.number,
            label: wave.label(),
            has_high_risk: wave.has_high_risk(),
            features: wave.features().iter().map(FeatureInfo::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct WavePlanResponse {
    pub project_id: String,
    pub waves: Vec<WaveInfo>,
    /// ASCII rendering of the plan
    pub rendered: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct InstructionInfo {
    pub feature_id: String,
    pub role: String,
    pub task: String,
    pub context: BTreeMap<String, String>,
    pub format: String,
    /// The Markdown prompt document to hand to a code-generation agent
    pub rendered: String,
}

impl InstructionInfo {
    pub fn new(feature_id: &str, instruction: Instruction) -> Self {
        let rendered = instruction.render();
        Self {
            feature_id: feature_id.to_string(),
            role: instruction.role,
            task: instruction.task,
            context: instruction.context,
            format: instruction.format,
            rendered,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ProjectInfo {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub tech_stack: Option<String>,
}

impl From<&Project> for ProjectInfo {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id.to_string(),
            name: project.name.clone(),
            description: project.description.clone(),
            tech_stack: project.tech_stack.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct FeatureListResponse {
    pub project_id: String,
    pub features: Vec<FeatureInfo>,
}

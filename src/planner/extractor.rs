//! Schema-constrained feature extraction with fail-closed validation.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::models::{Category, Feature, Risk, Size};

/// A generation capability that answers a prompt with text constrained by a JSON schema.
///
/// The returned text is untrusted: it may not parse or may violate the schema.
#[async_trait]
pub trait StructuredGenerate: Send + Sync {
    async fn generate(&self, prompt: &str, schema: &Value) -> anyhow::Result<String>;
}

/// Why a generation response was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    NotJson(String),
    NotAnArray,
    InvalidFeature { index: usize, reason: String },
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotJson(e) => write!(f, "response is not JSON: {}", e),
            Self::NotAnArray => write!(f, "response is not a JSON array"),
            Self::InvalidFeature { index, reason } => {
                write!(f, "feature {} is invalid: {}", index, reason)
            }
        }
    }
}

/// The response schema sent with every extraction request.
///
/// Uses the OpenAPI subset accepted by structured-output APIs.
pub fn feature_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "id": { "type": "STRING" },
                "project_id": { "type": "STRING" },
                "title": { "type": "STRING" },
                "description": { "type": "STRING" },
                "size": { "type": "STRING", "enum": ["S", "M", "L"] },
                "risk": { "type": "STRING", "enum": ["Low", "Medium", "High"] },
                "business_value": { "type": "INTEGER", "minimum": 1, "maximum": 10 },
                "wow_factor": { "type": "BOOLEAN" },
                "category": { "type": "STRING", "enum": ["UI", "Logic", "Database"] }
            },
            "required": ["title", "description", "size", "risk", "business_value", "wow_factor"]
        }
    })
}

/// Build the grounded extraction prompt.
pub fn build_prompt(idea: &str, context_block: &str) -> String {
    format!(
        r#"Analyze the following project description and break it down into technical features.

PROJECT: {idea}

CONTEXTUAL FACTS (GROUNDING DATA):
{context_block}

INSTRUCTIONS:
- Use the provided facts to validate feasibility and risk.
- If a technology mentioned in the facts is deprecated, mark risk as 'High'.
- If competitors exist, score business_value by how well the feature differentiates.
- Set wow_factor for features that would delight users.
- Use category 'UI' for screens and components, 'Logic' for domain rules, 'Database' for storage.

Return a JSON array of features matching the schema."#,
        idea = idea.trim(),
        context_block = context_block,
    )
}

/// Validate a raw generation response and repair ids and ownership.
///
/// Every element must satisfy the schema; a single invalid element rejects the
/// whole response. Model-supplied ids are never kept: each feature gets a fresh
/// token and `project_id` is always overwritten with the caller's value.
pub fn parse_features(raw: &str, project_id: &str) -> Result<Vec<Feature>, Rejection> {
    let value: Value =
        serde_json::from_str(raw.trim()).map_err(|e| Rejection::NotJson(e.to_string()))?;
    let items = value.as_array().ok_or(Rejection::NotAnArray)?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            validate_feature(item, project_id)
                .map_err(|reason| Rejection::InvalidFeature { index, reason })
        })
        .collect()
}

fn validate_feature(item: &Value, project_id: &str) -> Result<Feature, String> {
    let obj = item.as_object().ok_or("not an object")?;

    // Both ownership fields are checked for type only; they are replaced below.
    optional_str(obj, "id")?;
    optional_str(obj, "project_id")?;

    let title = required_text(obj, "title")?;
    let description = required_text(obj, "description")?;

    let size = required_enum(obj, "size", Size::from_str)?;
    let risk = required_enum(obj, "risk", Risk::from_str)?;
    let category = match optional_str(obj, "category")? {
        Some(s) => Category::from_str(s).ok_or_else(|| format!("unknown category {:?}", s))?,
        None => Category::default(),
    };

    let business_value = obj
        .get("business_value")
        .and_then(Value::as_u64)
        .and_then(|v| u8::try_from(v).ok())
        .ok_or("business_value must be an integer from 1 to 10")?;

    let wow_factor = obj
        .get("wow_factor")
        .and_then(Value::as_bool)
        .ok_or("wow_factor must be a boolean")?;

    let feature = Feature {
        id: Feature::new_id(),
        project_id: project_id.to_string(),
        title,
        description,
        size,
        risk,
        business_value,
        wow_factor,
        category,
    };
    feature.validate()?;
    Ok(feature)
}

fn optional_str<'a>(obj: &'a Map<String, Value>, field: &str) -> Result<Option<&'a str>, String> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(format!("{} must be a string", field)),
    }
}

fn required_text(obj: &Map<String, Value>, field: &str) -> Result<String, String> {
    match optional_str(obj, field)? {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(format!("{} must be a non-empty string", field)),
    }
}

fn required_enum<T>(
    obj: &Map<String, Value>,
    field: &str,
    parse: fn(&str) -> Option<T>,
) -> Result<T, String> {
    let s = optional_str(obj, field)?.ok_or_else(|| format!("{} is required", field))?;
    parse(s).ok_or_else(|| format!("unknown {} {:?}", field, s))
}

/// Extracts features through a structured-generation capability.
#[derive(Clone)]
pub struct FeatureExtractor {
    generator: Arc<dyn StructuredGenerate>,
}

impl FeatureExtractor {
    pub fn new(generator: Arc<dyn StructuredGenerate>) -> Self {
        Self { generator }
    }

    /// Extract features for an idea. Returns an empty list on any failure.
    pub async fn extract(&self, idea: &str, context_block: &str, project_id: &str) -> Vec<Feature> {
        let prompt = build_prompt(idea, context_block);
        let schema = feature_schema();

        let raw = match self.generator.generate(&prompt, &schema).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Feature generation failed: {:#}", e);
                return Vec::new();
            }
        };

        match parse_features(&raw, project_id) {
            Ok(features) => {
                tracing::info!(count = features.len(), "Extracted features");
                features
            }
            Err(rejection) => {
                tracing::warn!("Rejected generation response: {}", rejection);
                tracing::debug!("Rejected response body: {}", raw);
                Vec::new()
            }
        }
    }
}

//! HTTP client for the Gemini API.
//!
//! Implements the planner's collaborator traits:
//! - [`GroundedSearch`] through Google Search grounding
//! - [`StructuredGenerate`] through `responseSchema`-constrained JSON output
//! - [`InsightProvider`] through a low-latency model

mod types;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;

pub use types::*;

use crate::config::Config;
use crate::models::Source;
use crate::planner::{GroundedSearch, InsightProvider, SearchHit, StructuredGenerate};

/// Title given to cited sources that come back without one.
const UNTITLED_SOURCE: &str = "Web Source";

/// Gemini client errors.
#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: API key missing or invalid")]
    Unauthorized,

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Response contained no text")]
    EmptyResponse,
}

fn http_client(timeout: Duration) -> Result<Client, GeminiError> {
    Ok(Client::builder().timeout(timeout).build()?)
}

/// HTTP client for Gemini `generateContent`.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    search_model: String,
    extract_model: String,
    insight_model: String,
    client: Client,
}

impl GeminiClient {
    /// Create a client from configuration. Returns `None` without an API key.
    pub fn from_config(config: &Config) -> Result<Option<Self>, GeminiError> {
        let Some(api_key) = config.gemini_api_key.clone() else {
            return Ok(None);
        };

        Ok(Some(Self {
            base_url: config.gemini_url.trim_end_matches('/').to_string(),
            api_key,
            search_model: config.search_model.clone(),
            extract_model: config.extract_model.clone(),
            insight_model: config.insight_model.clone(),
            client: http_client(config.request_timeout)?,
        }))
    }

    /// Create with explicit endpoint, timeout and a single model for every call.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GeminiError> {
        let model = model.into();
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            search_model: model.clone(),
            extract_model: model.clone(),
            insight_model: model,
            client: http_client(timeout)?,
        })
    }

    /// Send one `generateContent` request.
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, GeminiError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);

        tracing::debug!("Sending request to Gemini model {}", model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Handle response, converting HTTP errors to GeminiError.
    async fn handle_response(
        &self,
        response: reqwest::Response,
    ) -> Result<GenerateResponse, GeminiError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            match status {
                StatusCode::BAD_REQUEST => Err(GeminiError::BadRequest(body)),
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(GeminiError::Unauthorized),
                StatusCode::TOO_MANY_REQUESTS => Err(GeminiError::RateLimited(body)),
                _ => Err(GeminiError::Server(format!("{}: {}", status, body))),
            }
        }
    }

    /// Grounded search for one query.
    pub async fn search_grounded(&self, query: &str) -> Result<SearchHit, GeminiError> {
        let mut request = GenerateRequest::text(format!(
            "Investigate the following topic and provide a concise factual summary based on real-world data: \"{}\".",
            query
        ));
        request.tools = Some(vec![Tool {
            google_search: GoogleSearch::default(),
        }]);

        let response = self.generate_content(&self.search_model, &request).await?;
        Ok(search_hit(&response))
    }

    /// Schema-constrained JSON generation. Returns the raw, unvalidated text.
    pub async fn generate_json(
        &self,
        prompt: &str,
        schema: &serde_json::Value,
    ) -> Result<String, GeminiError> {
        let mut request = GenerateRequest::text(prompt);
        request.generation_config = Some(GenerationConfig {
            response_mime_type: Some("application/json".to_string()),
            response_schema: Some(schema.clone()),
        });

        let response = self.generate_content(&self.extract_model, &request).await?;
        response.text().ok_or(GeminiError::EmptyResponse)
    }

    /// One-sentence feasibility check.
    pub async fn insight(&self, idea: &str) -> Result<String, GeminiError> {
        let request = GenerateRequest::text(format!(
            "Provide a 1-sentence ultra-fast technical feasibility check for: \"{}\". Be direct and witty.",
            idea.trim()
        ));

        let response = self.generate_content(&self.insight_model, &request).await?;
        response.text().ok_or(GeminiError::EmptyResponse)
    }
}

/// Convert a grounded response into a summary and its cited web sources.
fn search_hit(response: &GenerateResponse) -> SearchHit {
    let summary = response
        .text()
        .unwrap_or_else(|| "No summary available.".to_string());

    let sources = response
        .candidates
        .first()
        .and_then(|c| c.grounding_metadata.as_ref())
        .map(|meta| {
            meta.grounding_chunks
                .iter()
                .filter_map(|chunk| chunk.web.as_ref())
                .filter_map(|web| {
                    let uri = web.uri.clone().filter(|u| !u.is_empty())?;
                    Some(Source {
                        title: web
                            .title
                            .clone()
                            .filter(|t| !t.is_empty())
                            .unwrap_or_else(|| UNTITLED_SOURCE.to_string()),
                        uri,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    SearchHit { summary, sources }
}

#[async_trait]
impl GroundedSearch for GeminiClient {
    async fn search(&self, query: &str) -> anyhow::Result<SearchHit> {
        Ok(self.search_grounded(query).await?)
    }
}

#[async_trait]
impl StructuredGenerate for GeminiClient {
    async fn generate(&self, prompt: &str, schema: &serde_json::Value) -> anyhow::Result<String> {
        Ok(self.generate_json(prompt, schema).await?)
    }
}

#[async_trait]
impl InsightProvider for GeminiClient {
    async fn quick_insight(&self, idea: &str) -> anyhow::Result<String> {
        Ok(self.insight(idea).await?)
    }
}

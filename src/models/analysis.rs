use serde::{Deserialize, Serialize};

use super::{Feature, Source};

/// Summary used when a grounded search for a query fails.
pub const DEGRADED_SUMMARY: &str = "Search unavailable. Proceeding without external facts.";

/// How an analysis request produces its features. Selected once per request.
///
/// - `Heuristic`: keyword registry only, no network calls
/// - `Grounded`: retrieval, context compilation and schema-constrained extraction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Heuristic,
    Grounded,
}

impl Mode {
    pub fn from_use_ai(use_ai: bool) -> Self {
        if use_ai {
            Self::Grounded
        } else {
            Self::Heuristic
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Heuristic => "heuristic",
            Self::Grounded => "grounded",
        }
    }
}

/// Whether a retrieval produced real facts or fell back to the placeholder.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalStatus {
    Grounded,
    Degraded,
}

/// The result of one grounded search, aligned with the query that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetrievalResult {
    pub query: String,
    pub summary: String,
    pub sources: Vec<Source>,
    pub status: RetrievalStatus,
}

impl RetrievalResult {
    pub fn grounded(query: impl Into<String>, summary: String, sources: Vec<Source>) -> Self {
        Self {
            query: query.into(),
            summary,
            sources,
            status: RetrievalStatus::Grounded,
        }
    }

    pub fn degraded(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            summary: DEGRADED_SUMMARY.to_string(),
            sources: Vec::new(),
            status: RetrievalStatus::Degraded,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.status == RetrievalStatus::Degraded
    }
}

/// Everything one analysis request produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub mode: Mode,
    pub features: Vec<Feature>,
    /// Deduplicated citations, numbered positionally by consumers.
    pub sources: Vec<Source>,
    /// The issued search queries. Empty in heuristic mode.
    pub queries: Vec<String>,
    /// True when the features were handed to the feature store.
    pub persisted: bool,
}

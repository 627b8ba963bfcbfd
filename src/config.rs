//! Runtime configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

/// Default Gemini REST endpoint.
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const DEFAULT_SEARCH_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_EXTRACT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_INSIGHT_MODEL: &str = "gemini-2.5-flash-lite";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Configuration for the planner and its collaborators.
#[derive(Clone, Debug)]
pub struct Config {
    /// API key for grounded search and generation (from LEANWAVE_GEMINI_API_KEY,
    /// GEMINI_API_KEY or API_KEY). Grounded analysis is unavailable without it.
    pub gemini_api_key: Option<String>,
    /// Base URL of the generation API (from LEANWAVE_GEMINI_URL)
    pub gemini_url: String,
    /// Model used for grounded search (from LEANWAVE_SEARCH_MODEL)
    pub search_model: String,
    /// Model used for schema-constrained extraction (from LEANWAVE_EXTRACT_MODEL)
    pub extract_model: String,
    /// Low-latency model for quick insights (from LEANWAVE_INSIGHT_MODEL)
    pub insight_model: String,
    /// Per-request timeout (from LEANWAVE_TIMEOUT_SECS)
    pub request_timeout: Duration,
    /// Database file (from LEANWAVE_DB_PATH). `None` uses the platform data dir.
    pub database_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let gemini_api_key = ["LEANWAVE_GEMINI_API_KEY", "GEMINI_API_KEY", "API_KEY"]
            .iter()
            .find_map(|name| std::env::var(name).ok().filter(|key| !key.trim().is_empty()));

        let request_timeout = timeout_secs(std::env::var("LEANWAVE_TIMEOUT_SECS").ok());

        Self {
            gemini_api_key,
            gemini_url: env_or("LEANWAVE_GEMINI_URL", DEFAULT_GEMINI_URL),
            search_model: env_or("LEANWAVE_SEARCH_MODEL", DEFAULT_SEARCH_MODEL),
            extract_model: env_or("LEANWAVE_EXTRACT_MODEL", DEFAULT_EXTRACT_MODEL),
            insight_model: env_or("LEANWAVE_INSIGHT_MODEL", DEFAULT_INSIGHT_MODEL),
            request_timeout: Duration::from_secs(request_timeout),
            database_path: std::env::var("LEANWAVE_DB_PATH").ok().map(PathBuf::from),
        }
    }

    /// Create a config with no credentials (heuristic mode only).
    pub fn offline() -> Self {
        Self {
            gemini_api_key: None,
            gemini_url: DEFAULT_GEMINI_URL.to_string(),
            search_model: DEFAULT_SEARCH_MODEL.to_string(),
            extract_model: DEFAULT_EXTRACT_MODEL.to_string(),
            insight_model: DEFAULT_INSIGHT_MODEL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            database_path: None,
        }
    }

    /// Create a config with an API key (for testing).
    pub fn with_api_key(key: impl Into<String>) -> Self {
        Self {
            gemini_api_key: Some(key.into()),
            ..Self::offline()
        }
    }

    pub fn has_credentials(&self) -> bool {
        self.gemini_api_key.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Parse a timeout in whole seconds. Unset, unparsable or zero values use the default.
fn timeout_secs(raw: Option<String>) -> u64 {
    let Some(raw) = raw else {
        return DEFAULT_TIMEOUT_SECS;
    };

    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => secs,
        _ => {
            tracing::warn!(
                "Invalid LEANWAVE_TIMEOUT_SECS {:?}, using {}s",
                raw,
                DEFAULT_TIMEOUT_SECS
            );
            DEFAULT_TIMEOUT_SECS
        }
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

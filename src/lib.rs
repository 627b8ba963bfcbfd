//! leanwave turns a free-text product idea into risk-scored features, an
//! ordered plan of delivery waves, and Role/Task/Context/Format prompts for
//! code-generation agents.
//!
//! The pipeline lives in [`planner`]; [`gemini`] provides the network-backed
//! collaborators, [`db`] persists projects and features, and [`api`] and
//! [`mcp`] expose everything over HTTP and MCP.

pub mod api;
pub mod config;
pub mod db;
pub mod gemini;
pub mod mcp;
pub mod models;
pub mod planner;

use std::sync::Arc;

use config::Config;
use db::Database;
use gemini::GeminiClient;
use planner::Planner;

/// Build a planner wired to the configured collaborators.
///
/// Without an API key the planner supports heuristic analysis only; grounded
/// requests then fail fast with a configuration error.
pub fn planner_from_config(config: &Config, db: &Database) -> anyhow::Result<Planner> {
    let mut planner = Planner::heuristic().with_store(Arc::new(db.clone()));

    match GeminiClient::from_config(config)? {
        Some(client) => {
            let client = Arc::new(client);
            planner = planner
                .with_search(client.clone())
                .with_generator(client.clone())
                .with_insight(client);
        }
        None => {
            tracing::info!("No API key configured, grounded analysis disabled");
        }
    }

    Ok(planner)
}

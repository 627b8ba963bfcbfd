use thiserror::Error;

/// Errors surfaced by the planning pipeline.
///
/// Degraded retrieval and invalid extraction are recovered inside the
/// pipeline and never appear here.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(&'static str),

    #[error("Idea text must not be empty")]
    EmptyIdea,

    #[error("Failed to persist features: {0}")]
    Persistence(#[source] anyhow::Error),
}

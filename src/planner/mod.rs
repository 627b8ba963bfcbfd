//! The planning pipeline: from a free-text idea to sequenced, prompt-ready features.
//!
//! ```text
//! idea ─► plan_queries ─► RetrievalExecutor ─► compile ─► FeatureExtractor ─┐
//!   │                                                                      ├─► backlog
//!   └──────────────────► SourceRegistry (heuristic mode) ──────────────────┘      │
//!                                                 waves ◄─ sequence ◄─────────────┤
//!                                                           synthesize ◄──────────┘
//! ```
//!
//! Collaborators are injected as traits: [`GroundedSearch`], [`StructuredGenerate`],
//! [`InsightProvider`] and [`FeatureStore`].

mod context;
mod error;
mod extractor;
mod registry;
mod retrieval;
mod sequencer;
mod synthesizer;

use std::sync::Arc;

use async_trait::async_trait;

pub use context::{compile, CompiledContext};
pub use error::PlannerError;
pub use extractor::{
    build_prompt, feature_schema, parse_features, FeatureExtractor, Rejection, StructuredGenerate,
};
pub use registry::{KeywordRule, SourceRegistry, MAX_SUGGESTIONS};
pub use retrieval::{plan_queries, GroundedSearch, RetrievalExecutor, SearchHit};
pub use sequencer::{sequence, sequence_with_capacity};
pub use synthesizer::{select_persona, synthesize, Strategy, FORMAT_DIRECTIVE};

use crate::models::{AnalysisOutcome, Feature, Mode, PLACEHOLDER_PROJECT_ID};

/// Returned when a quick insight cannot be produced.
pub const INSIGHT_UNAVAILABLE: &str = "Insight unavailable.";

/// Persists analyzed features, upserting by feature id in one transaction.
pub trait FeatureStore: Send + Sync {
    fn upsert_features(&self, project_id: &str, features: &[Feature]) -> anyhow::Result<()>;
}

/// A low-latency model giving a one-sentence feasibility check of an idea.
#[async_trait]
pub trait InsightProvider: Send + Sync {
    async fn quick_insight(&self, idea: &str) -> anyhow::Result<String>;
}

/// Entry point of the pipeline.
///
/// Grounded mode needs both a search and a generation capability; without them
/// [`Planner::run_analysis`] fails before any retrieval is attempted. Heuristic
/// mode only uses the registry and never touches the network.
#[derive(Clone)]
pub struct Planner {
    registry: SourceRegistry,
    retrieval: Option<RetrievalExecutor>,
    extractor: Option<FeatureExtractor>,
    insight: Option<Arc<dyn InsightProvider>>,
    store: Option<Arc<dyn FeatureStore>>,
}

impl Planner {
    /// A planner with only the default keyword registry.
    pub fn heuristic() -> Self {
        Self {
            registry: SourceRegistry::default(),
            retrieval: None,
            extractor: None,
            insight: None,
            store: None,
        }
    }

    pub fn with_registry(mut self, registry: SourceRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_search(mut self, search: Arc<dyn GroundedSearch>) -> Self {
        self.retrieval = Some(RetrievalExecutor::new(search));
        self
    }

    pub fn with_generator(mut self, generator: Arc<dyn StructuredGenerate>) -> Self {
        self.extractor = Some(FeatureExtractor::new(generator));
        self
    }

    pub fn with_insight(mut self, insight: Arc<dyn InsightProvider>) -> Self {
        self.insight = Some(insight);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn FeatureStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn supports_grounded(&self) -> bool {
        self.retrieval.is_some() && self.extractor.is_some()
    }

    /// Analyze an idea and return its features, sources and issued queries.
    ///
    /// An empty feature list in grounded mode means the generation response
    /// was rejected; the gathered sources are still returned. Non-empty lists
    /// are persisted unless the project id is the demo placeholder or no store
    /// is configured.
    pub async fn run_analysis(
        &self,
        idea: &str,
        project_id: &str,
        mode: Mode,
    ) -> Result<AnalysisOutcome, PlannerError> {
        if idea.trim().is_empty() {
            return Err(PlannerError::EmptyIdea);
        }

        tracing::info!(mode = mode.as_str(), project_id, "Starting analysis");

        let mut outcome = match mode {
            Mode::Heuristic => AnalysisOutcome {
                mode,
                features: self.registry.suggest(idea, project_id),
                sources: Vec::new(),
                queries: Vec::new(),
                persisted: false,
            },
            Mode::Grounded => self.run_grounded(idea, project_id).await?,
        };

        if self.should_persist(&outcome.features, project_id) {
            if let Some(store) = &self.store {
                store
                    .upsert_features(project_id, &outcome.features)
                    .map_err(PlannerError::Persistence)?;
                outcome.persisted = true;
                tracing::info!(
                    count = outcome.features.len(),
                    project_id,
                    "Persisted analyzed features"
                );
            }
        }

        Ok(outcome)
    }

    async fn run_grounded(
        &self,
        idea: &str,
        project_id: &str,
    ) -> Result<AnalysisOutcome, PlannerError> {
        let retrieval = self
            .retrieval
            .as_ref()
            .ok_or(PlannerError::ConfigurationMissing("grounded search capability"))?;
        let extractor = self
            .extractor
            .as_ref()
            .ok_or(PlannerError::ConfigurationMissing("structured generation capability"))?;

        let queries = plan_queries(idea);
        let results = retrieval.retrieve_all(&queries).await;
        let context = compile(&results);
        let features = extractor.extract(idea, &context.block, project_id).await;

        if features.is_empty() {
            tracing::warn!("Grounded extraction produced no features");
        }

        Ok(AnalysisOutcome {
            mode: Mode::Grounded,
            features,
            sources: context.sources,
            queries,
            persisted: false,
        })
    }

    fn should_persist(&self, features: &[Feature], project_id: &str) -> bool {
        !features.is_empty() && !project_id.is_empty() && project_id != PLACEHOLDER_PROJECT_ID
    }

    /// One-sentence feasibility check. Never fails; degrades to [`INSIGHT_UNAVAILABLE`].
    pub async fn quick_insight(&self, idea: &str) -> String {
        let Some(insight) = &self.insight else {
            return INSIGHT_UNAVAILABLE.to_string();
        };

        match insight.quick_insight(idea).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => INSIGHT_UNAVAILABLE.to_string(),
            Err(e) => {
                tracing::warn!("Quick insight failed: {:#}", e);
                INSIGHT_UNAVAILABLE.to_string()
            }
        }
    }
}

impl Default for Planner {
    fn default() -> Self {
        Self::heuristic()
    }
}

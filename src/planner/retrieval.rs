//! Grounded retrieval: query planning and parallel search with per-query degradation.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;

use crate::models::{RetrievalResult, Source};

/// What a grounded search returns on success.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchHit {
    pub summary: String,
    pub sources: Vec<Source>,
}

/// A search capability that answers a query with a summary and cited sources.
#[async_trait]
pub trait GroundedSearch: Send + Sync {
    async fn search(&self, query: &str) -> anyhow::Result<SearchHit>;
}

/// The three topic queries issued for an idea, in slot order:
/// technical feasibility, market, compliance.
pub fn plan_queries(idea: &str) -> Vec<String> {
    let idea = idea.trim();
    vec![
        format!("Technical feasibility and deprecated libraries for: {}", idea),
        format!("Market competitors and similar products for: {}", idea),
        format!("Legal compliance and regulations for: {}", idea),
    ]
}

/// Runs grounded searches without ever failing outward.
#[derive(Clone)]
pub struct RetrievalExecutor {
    search: Arc<dyn GroundedSearch>,
}

impl RetrievalExecutor {
    pub fn new(search: Arc<dyn GroundedSearch>) -> Self {
        Self { search }
    }

    /// Search one query. Errors collapse to a degraded result.
    pub async fn retrieve(&self, query: &str) -> RetrievalResult {
        match self.search.search(query).await {
            Ok(hit) => RetrievalResult::grounded(query, hit.summary, hit.sources),
            Err(e) => {
                tracing::warn!("Search failed for query {:?}: {:#}", query, e);
                RetrievalResult::degraded(query)
            }
        }
    }

    /// Search all queries concurrently and wait for every one of them.
    ///
    /// Result `i` always belongs to query `i`, whatever order the searches
    /// complete in. One failing query never affects the others.
    pub async fn retrieve_all(&self, queries: &[String]) -> Vec<RetrievalResult> {
        let results = join_all(queries.iter().map(|q| self.retrieve(q))).await;

        let degraded = results.iter().filter(|r| r.is_degraded()).count();
        tracing::info!(
            queries = queries.len(),
            degraded,
            "Grounded retrieval finished"
        );

        results
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::models::{RetrievalStatus, DEGRADED_SUMMARY};

    /// Answers after a delay that shrinks with the query position, failing on "Legal".
    struct SlowSearch;

    #[async_trait]
    impl GroundedSearch for SlowSearch {
        async fn search(&self, query: &str) -> anyhow::Result<SearchHit> {
            let delay = if query.starts_with("Technical") { 30 } else { 5 };
            tokio::time::sleep(Duration::from_millis(delay)).await;

            if query.starts_with("Legal") {
                anyhow::bail!("quota exceeded");
            }

            Ok(SearchHit {
                summary: format!("facts about {}", query),
                sources: vec![Source {
                    title: "Source".to_string(),
                    uri: format!("https://example.com/{}", query.len()),
                }],
            })
        }
    }

    /// Holds every search until all three are in flight at once.
    struct RendezvousSearch(tokio::sync::Barrier);

    #[async_trait]
    impl GroundedSearch for RendezvousSearch {
        async fn search(&self, query: &str) -> anyhow::Result<SearchHit> {
            self.0.wait().await;
            Ok(SearchHit {
                summary: format!("facts about {}", query),
                sources: Vec::new(),
            })
        }
    }

    #[test]
    fn plans_three_queries_in_fixed_order() {
        let queries = plan_queries("  recipe app ");
        assert_eq!(queries.len(), 3);
        assert_eq!(
            queries[0],
            "Technical feasibility and deprecated libraries for: recipe app"
        );
        assert!(queries[1].starts_with("Market competitors"));
        assert!(queries[2].starts_with("Legal compliance"));
    }

    #[tokio::test]
    async fn results_align_with_query_slots() {
        let executor = RetrievalExecutor::new(Arc::new(SlowSearch));
        let queries = plan_queries("recipe app");

        let results = executor.retrieve_all(&queries).await;

        assert_eq!(results.len(), 3);
        for (query, result) in queries.iter().zip(&results) {
            assert_eq!(&result.query, query);
        }
        assert_eq!(results[0].status, RetrievalStatus::Grounded);
        assert_eq!(results[1].status, RetrievalStatus::Grounded);
    }

    #[tokio::test]
    async fn failing_query_degrades_without_affecting_others() {
        let executor = RetrievalExecutor::new(Arc::new(SlowSearch));
        let results = executor.retrieve_all(&plan_queries("recipe app")).await;

        let legal = &results[2];
        assert!(legal.is_degraded());
        assert_eq!(legal.summary, DEGRADED_SUMMARY);
        assert!(legal.sources.is_empty());
        assert!(!results[0].is_degraded());
        assert!(!results[1].is_degraded());
    }

    #[tokio::test]
    async fn queries_run_concurrently() {
        let search = RendezvousSearch(tokio::sync::Barrier::new(3));
        let executor = RetrievalExecutor::new(Arc::new(search));
        let queries = plan_queries("recipe app");

        // Sequential execution would park the first search at the barrier forever.
        let results = tokio::time::timeout(Duration::from_secs(5), executor.retrieve_all(&queries))
            .await
            .expect("searches did not overlap");

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.status == RetrievalStatus::Grounded));
    }
}

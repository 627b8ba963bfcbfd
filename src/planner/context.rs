//! Compiles retrieval results into one fact block and a deduplicated source list.

use std::collections::HashSet;

use crate::models::{RetrievalResult, Source};

/// Compiled grounding data handed to the extractor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledContext {
    pub block: String,
    pub sources: Vec<Source>,
}

/// Merge results in input order.
///
/// Each result becomes a `### FACT (query)` section. Sources are deduplicated by
/// `uri`: the first occurrence wins and output order is first-insertion order,
/// since consumers number sources positionally.
pub fn compile(results: &[RetrievalResult]) -> CompiledContext {
    let block = results
        .iter()
        .map(|r| format!("### FACT ({})\n{}", r.query, r.summary))
        .collect::<Vec<_>>()
        .join("\n\n");

    CompiledContext {
        block,
        sources: dedup_sources(results.iter().flat_map(|r| r.sources.iter())),
    }
}

fn dedup_sources<'a>(sources: impl Iterator<Item = &'a Source>) -> Vec<Source> {
    let mut seen: HashSet<&str> = HashSet::new();
    sources
        .filter(|s| seen.insert(s.uri.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(title: &str, uri: &str) -> Source {
        Source {
            title: title.to_string(),
            uri: uri.to_string(),
        }
    }

    #[test]
    fn first_occurrence_of_a_uri_wins() {
        let results = vec![
            RetrievalResult::grounded("q1", "s1".to_string(), vec![source("A", "u1")]),
            RetrievalResult::grounded("q2", "s2".to_string(), vec![source("B", "u2")]),
            RetrievalResult::grounded("q3", "s3".to_string(), vec![source("A2", "u1")]),
        ];

        let compiled = compile(&results);

        assert_eq!(compiled.sources, vec![source("A", "u1"), source("B", "u2")]);
    }

    #[test]
    fn block_labels_each_fact_in_input_order() {
        let results = vec![
            RetrievalResult::grounded("tech", "Rust is fine".to_string(), vec![]),
            RetrievalResult::degraded("legal"),
        ];

        let compiled = compile(&results);

        assert_eq!(
            compiled.block,
            concat!(
                "### FACT (tech)\nRust is fine\n\n",
                "### FACT (legal)\nSearch unavailable. Proceeding without external facts.",
            )
        );
        assert!(compiled.sources.is_empty());
    }

    #[test]
    fn empty_results_compile_to_empty_context() {
        assert_eq!(compile(&[]), CompiledContext::default());
    }
}

//! Role/Task/Context/Format instruction synthesis.

use std::collections::BTreeMap;

use crate::models::{Category, Feature, Instruction, Size};

/// Output restriction given to every downstream agent.
pub const FORMAT_DIRECTIVE: &str = "Respond only with fenced Markdown code blocks.";

/// Joins tasks for a text-reading agent.
const TASK_CONJUNCTION: &str = " AND ";

const UI_TASKS: &[&str] = &["Create presentation component", "Create container component"];
const LOGIC_TASKS: &[&str] = &["Implement domain logic"];

/// Strategy tag recorded in the instruction context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    ChainOfThought,
    Direct,
}

impl Strategy {
    pub fn for_size(size: Size) -> Self {
        match size {
            Size::L => Self::ChainOfThought,
            Size::S | Size::M => Self::Direct,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChainOfThought => "chain-of-thought",
            Self::Direct => "direct",
        }
    }
}

/// Stack keywords and the persona they select, checked in order.
const PERSONAS: &[(&[&str], &str)] = &[
    (&["solidity", "hardhat", "foundry", "smart contract"], "Senior Smart Contract Engineer"),
    (&["flutter", "swift", "kotlin", "react native", "android", "ios"], "Senior Mobile Engineer"),
    (
        &["react", "vue", "svelte", "angular", "next.js", "tailwind", "frontend"],
        "Senior Frontend Engineer",
    ),
    (
        &["rust", "go", "java", "node", "django", "rails", "spring", "backend", "api"],
        "Senior Backend Engineer",
    ),
    (&["spark", "pandas", "sql", "dbt", "airflow"], "Senior Data Engineer"),
];

/// Choose the persona for a tech stack.
///
/// Keywords are matched as case-insensitive whole words, so "Go" selects the
/// backend persona but "MongoDB" does not. An unknown stack gets a generic
/// persona naming it; an empty stack gets a plain software engineer.
pub fn select_persona(tech_stack: &str) -> String {
    let lowered = tech_stack.trim().to_lowercase();
    if lowered.is_empty() {
        return "Senior Software Engineer".to_string();
    }

    for (keywords, persona) in PERSONAS {
        if keywords.iter().any(|k| contains_word(&lowered, k)) {
            return (*persona).to_string();
        }
    }

    format!("Senior Software Engineer specializing in {}", tech_stack.trim())
}

fn contains_word(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        let boundary = |c: Option<char>| c.map_or(true, |c| !c.is_alphanumeric());
        boundary(before) && boundary(after)
    })
}

/// Build the instruction for one feature. Pure: same inputs, same output.
pub fn synthesize(feature: &Feature, tech_stack: &str) -> Instruction {
    let tasks = match feature.category {
        Category::Ui => UI_TASKS,
        Category::Logic | Category::Database => LOGIC_TASKS,
    };
    let strategy = Strategy::for_size(feature.size);

    let mut context = BTreeMap::new();
    context.insert("feature_id".to_string(), feature.id.clone());
    context.insert("title".to_string(), feature.title.clone());
    context.insert("description".to_string(), feature.description.clone());
    context.insert("category".to_string(), feature.category.as_str().to_string());
    context.insert("size".to_string(), feature.size.as_str().to_string());
    context.insert("risk".to_string(), feature.risk.as_str().to_string());
    context.insert("business_value".to_string(), feature.business_value.to_string());
    context.insert("wow_factor".to_string(), feature.wow_factor.to_string());
    context.insert("tech_stack".to_string(), tech_stack.to_string());
    context.insert("strategy".to_string(), strategy.as_str().to_string());

    Instruction {
        role: select_persona(tech_stack),
        task: tasks.join(TASK_CONJUNCTION),
        context,
        format: FORMAT_DIRECTIVE.to_string(),
    }
}

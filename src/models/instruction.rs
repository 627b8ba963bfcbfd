use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A Role/Task/Context/Format directive for a downstream code-generation agent.
///
/// Derived deterministically from one feature and a tech stack; it carries no
/// hidden state, so rendering the same instruction twice gives the same text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Instruction {
    /// Persona the agent should adopt.
    pub role: String,
    /// Tasks joined with an explicit conjunction, for a text-reading agent.
    pub task: String,
    /// Key/value snapshot of the feature, stack and strategy.
    pub context: BTreeMap<String, String>,
    pub format: String,
}

impl Instruction {
    /// Render the instruction as a Markdown prompt document.
    ///
    /// ```text
    /// # ROLE
    /// Act as a Senior Frontend Engineer.
    ///
    /// # TASK
    /// Create presentation component AND Create container component
    ///
    /// # CONTEXT
    /// - title: Item Gallery
    /// ...
    ///
    /// # FORMAT
    /// Respond only with fenced Markdown code blocks.
    /// ```
    pub fn render(&self) -> String {
        let mut output = String::new();

        output.push_str("# ROLE\n");
        output.push_str(&format!("Act as a {}.\n\n", self.role));

        output.push_str("# TASK\n");
        output.push_str(&self.task);
        output.push_str("\n\n");

        output.push_str("# CONTEXT\n");
        for (key, value) in &self.context {
            output.push_str(&format!("- {}: {}\n", key, value));
        }
        output.push('\n');

        output.push_str("# FORMAT\n");
        output.push_str(&self.format);
        output.push('\n');

        output
    }
}

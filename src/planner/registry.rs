//! Deterministic keyword registry used when grounded extraction is not selected.

use std::collections::HashSet;

use crate::models::{Category, Feature, FeatureTemplate, Risk, Size};

/// Maximum number of features the registry suggests for one idea.
pub const MAX_SUGGESTIONS: usize = 3;

/// A keyword group and the feature it suggests.
#[derive(Debug, Clone)]
pub struct KeywordRule {
    keywords: Vec<String>,
    template: FeatureTemplate,
}

impl KeywordRule {
    pub fn new<I, S>(keywords: I, template: FeatureTemplate) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            template,
        }
    }

    /// Whether any keyword is a substring of the already-lowercased idea.
    fn matches(&self, lowered_idea: &str) -> bool {
        self.keywords.iter().any(|k| lowered_idea.contains(k.as_str()))
    }
}

/// Ordered table of keyword rules plus a generic placeholder.
///
/// The table is data: build a registry with [`SourceRegistry::new`] to swap or
/// localize it. Declaration order decides which suggestions survive the cap.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    rules: Vec<KeywordRule>,
    placeholder: FeatureTemplate,
}

impl SourceRegistry {
    pub fn new(rules: Vec<KeywordRule>, placeholder: FeatureTemplate) -> Self {
        Self { rules, placeholder }
    }

    /// Suggest up to [`MAX_SUGGESTIONS`] features for an idea.
    ///
    /// Always returns at least one feature: the placeholder when nothing matches.
    pub fn suggest(&self, idea: &str, project_id: &str) -> Vec<Feature> {
        let lowered = idea.to_lowercase();
        let mut emitted_titles: HashSet<&str> = HashSet::new();
        let mut features = Vec::new();

        for rule in &self.rules {
            if !rule.matches(&lowered) {
                continue;
            }
            if emitted_titles.insert(rule.template.title.as_str()) {
                features.push(rule.template.instantiate(project_id));
            }
        }

        if features.is_empty() {
            tracing::debug!("No keyword group matched, suggesting placeholder feature");
            features.push(self.placeholder.instantiate(project_id));
        }

        features.truncate(MAX_SUGGESTIONS);
        features
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        let rules = vec![
            KeywordRule::new(
                ["nft", "wallet", "web3", "metamask", "blockchain"],
                template(
                    "Web3 Wallet Connection",
                    "Authenticate and interact with the system through a Web3 digital wallet.",
                    Size::M,
                    Risk::Low,
                    9,
                    true,
                    Category::Ui,
                ),
            ),
            KeywordRule::new(
                ["auction", "bid"],
                template(
                    "Auction System",
                    "Bidding logic, expiry timers and on-chain transfer of the auctioned asset.",
                    Size::L,
                    Risk::High,
                    10,
                    true,
                    Category::Logic,
                ),
            ),
            KeywordRule::new(
                ["sale", "buy", "marketplace", "ecommerce", "e-commerce", "shop", "store", "cart"],
                template(
                    "Shopping Cart",
                    "Lets users add products to a cart and complete the purchase.",
                    Size::L,
                    Risk::Medium,
                    10,
                    false,
                    Category::Ui,
                ),
            ),
            KeywordRule::new(
                ["user", "login", "profile", "authentication", "account", "sign in"],
                template(
                    "User Authentication",
                    "Sign-up, login and profile management for users.",
                    Size::M,
                    Risk::Low,
                    8,
                    false,
                    Category::Logic,
                ),
            ),
            KeywordRule::new(
                ["gallery", "display", "artwork", "products", "listing", "catalog"],
                template(
                    "Item Gallery",
                    "An interface to browse every available item or product.",
                    Size::M,
                    Risk::Low,
                    9,
                    false,
                    Category::Ui,
                ),
            ),
        ];

        let placeholder = template(
            "Core Feature",
            "Central capability derived from the project description.",
            Size::M,
            Risk::Medium,
            10,
            false,
            Category::Logic,
        );

        Self::new(rules, placeholder)
    }
}

fn template(
    title: &str,
    description: &str,
    size: Size,
    risk: Risk,
    business_value: u8,
    wow_factor: bool,
    category: Category,
) -> FeatureTemplate {
    FeatureTemplate {
        title: title.to_string(),
        description: description.to_string(),
        size,
        risk,
        business_value,
        wow_factor,
        category,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(features: &[Feature]) -> Vec<&str> {
        features.iter().map(|f| f.title.as_str()).collect()
    }

    #[test]
    fn marketplace_and_wallet_suggest_both_templates() {
        let registry = SourceRegistry::default();
        let features = registry.suggest("A marketplace where users pay from their wallet", "p1");

        let titles = titles(&features);
        assert!(titles.contains(&"Shopping Cart"));
        assert!(titles.contains(&"Web3 Wallet Connection"));
        assert!(features.len() <= MAX_SUGGESTIONS);

        let unique: HashSet<_> = titles.iter().collect();
        assert_eq!(unique.len(), titles.len());
    }

    #[test]
    fn matching_is_case_insensitive() {
        let registry = SourceRegistry::default();
        let features = registry.suggest("An AUCTION house", "p1");
        assert_eq!(titles(&features), vec!["Auction System"]);
    }

    #[test]
    fn no_match_yields_single_placeholder() {
        let registry = SourceRegistry::default();
        let features = registry.suggest("a quiet meditation timer", "p1");
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].title, "Core Feature");
        assert_eq!(features[0].project_id, "p1");
    }

    #[test]
    fn output_is_truncated_in_table_order() {
        let registry = SourceRegistry::default();
        let features = registry.suggest(
            "nft auction marketplace with user login and a gallery",
            "p1",
        );
        assert_eq!(
            titles(&features),
            vec!["Web3 Wallet Connection", "Auction System", "Shopping Cart"]
        );
    }

    #[test]
    fn duplicate_titles_are_emitted_once() {
        let shared = template(
            "Payments",
            "Take payments.",
            Size::M,
            Risk::Low,
            7,
            false,
            Category::Logic,
        );
        let registry = SourceRegistry::new(
            vec![
                KeywordRule::new(["pay"], shared.clone()),
                KeywordRule::new(["checkout"], shared),
            ],
            template("Other", "Other.", Size::S, Risk::Low, 1, false, Category::Logic),
        );

        let features = registry.suggest("pay at checkout", "p1");
        assert_eq!(titles(&features), vec!["Payments"]);
    }

    #[test]
    fn every_suggestion_gets_a_fresh_id_and_the_project() {
        let registry = SourceRegistry::default();
        let features = registry.suggest("wallet auction shop", "project-42");

        let ids: HashSet<_> = features.iter().map(|f| f.id.clone()).collect();
        assert_eq!(ids.len(), features.len());
        assert!(features.iter().all(|f| !f.id.is_empty()));
        assert!(features.iter().all(|f| f.project_id == "project-42"));
    }
}

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A candidate feature produced by analysis of a product idea.
///
/// Features are created by the grounded extractor or by the keyword registry
/// and are never mutated by sequencing: waves only reorder them. The `id` is an
/// opaque token that must be unique within one backlog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Feature {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub description: String,
    pub size: Size,
    pub risk: Risk,
    /// Perceived value from 1 to 10. Sequencing sorts on this, highest first.
    pub business_value: u8,
    pub wow_factor: bool,
    #[serde(default)]
    pub category: Category,
}

impl Feature {
    /// Generate a fresh opaque feature id.
    pub fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn is_high_risk(&self) -> bool {
        self.risk == Risk::High
    }

    /// Check the field invariants every stored or sequenced feature holds.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title must be a non-empty string".to_string());
        }
        if self.description.trim().is_empty() {
            return Err("description must be a non-empty string".to_string());
        }
        if !(1..=10).contains(&self.business_value) {
            return Err("business_value must be an integer from 1 to 10".to_string());
        }
        Ok(())
    }
}

/// Validate a client-supplied backlog.
///
/// Every feature must pass [`Feature::validate`] and carry a non-empty id that
/// no other feature in the slice uses.
pub fn validate_backlog(features: &[Feature]) -> Result<(), String> {
    let mut seen = HashSet::new();
    for (index, feature) in features.iter().enumerate() {
        if feature.id.trim().is_empty() {
            return Err(format!("feature {} must have a non-empty id", index));
        }
        if !seen.insert(feature.id.as_str()) {
            return Err(format!("feature id {:?} is duplicated", feature.id));
        }
        feature
            .validate()
            .map_err(|reason| format!("feature {} is invalid: {}", index, reason))?;
    }
    Ok(())
}

/// T-shirt size of a feature.
///
/// - `S`: a few hours of work
/// - `M`: a day or two
/// - `L`: large enough that the generated instruction asks for step-by-step reasoning
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Size {
    S,
    M,
    L,
}

impl Size {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S => "S",
            Self::M => "M",
            Self::L => "L",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "S" => Some(Self::S),
            "M" => Some(Self::M),
            "L" => Some(Self::L),
            _ => None,
        }
    }
}

/// Delivery risk tier. At most one `High` feature is placed in a wave.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Risk {
    Low,
    Medium,
    High,
}

impl Risk {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Low" => Some(Self::Low),
            "Medium" => Some(Self::Medium),
            "High" => Some(Self::High),
            _ => None,
        }
    }
}

/// What kind of code a feature mostly needs.
///
/// `Ui` features are split into presentation and container components when an
/// instruction is synthesized; everything else is domain logic.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    #[serde(rename = "UI")]
    Ui,
    #[default]
    Logic,
    Database,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ui => "UI",
            Self::Logic => "Logic",
            Self::Database => "Database",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "UI" => Some(Self::Ui),
            "Logic" => Some(Self::Logic),
            "Database" => Some(Self::Database),
            _ => None,
        }
    }
}

/// Template for a feature the keyword registry can emit.
///
/// Ids and project ownership are assigned when the template is instantiated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeatureTemplate {
    pub title: String,
    pub description: String,
    pub size: Size,
    pub risk: Risk,
    pub business_value: u8,
    pub wow_factor: bool,
    #[serde(default)]
    pub category: Category,
}

impl FeatureTemplate {
    pub fn instantiate(&self, project_id: &str) -> Feature {
        Feature {
            id: Feature::new_id(),
            project_id: project_id.to_string(),
            title: self.title.clone(),
            description: self.description.clone(),
            size: self.size,
            risk: self.risk,
            business_value: self.business_value,
            wow_factor: self.wow_factor,
            category: self.category,
        }
    }
}

/// A cited web source gathered during grounded retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Source {
    pub title: String,
    pub uri: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(id: &str, business_value: u8) -> Feature {
        Feature {
            id: id.to_string(),
            project_id: "p1".to_string(),
            title: "Bid Feed".to_string(),
            description: "Live bids".to_string(),
            size: Size::M,
            risk: Risk::Low,
            business_value,
            wow_factor: false,
            category: Category::Ui,
        }
    }

    #[test]
    fn business_value_must_be_in_range() {
        assert!(feature("a", 1).validate().is_ok());
        assert!(feature("a", 10).validate().is_ok());
        assert!(feature("a", 0).validate().is_err());
        assert!(feature("a", 11).validate().is_err());
    }

    #[test]
    fn blank_title_is_invalid() {
        let mut blank = feature("a", 5);
        blank.title = "  ".to_string();
        assert!(blank.validate().is_err());
    }

    #[test]
    fn backlog_rejects_duplicate_and_empty_ids() {
        assert!(validate_backlog(&[feature("a", 5), feature("b", 5)]).is_ok());
        assert!(validate_backlog(&[]).is_ok());

        let err = validate_backlog(&[feature("a", 5), feature("a", 6)]).unwrap_err();
        assert!(err.contains("duplicated"));
        assert!(validate_backlog(&[feature("", 5)]).is_err());
    }
}

use serde::Serialize;

use super::Feature;

/// Maximum number of features in one wave.
pub const WAVE_CAPACITY: usize = 3;

/// An ordered batch of features delivered in one increment.
///
/// Waves are built only by the sequencer. `has_high_risk` is derived from the
/// features pushed into the wave and is kept in the serialized form so clients
/// don't have to recompute it. Waves are never read back from clients.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Wave {
    /// 1-based position in the plan. Wave 1 is the MVP.
    pub number: usize,
    features: Vec<Feature>,
    has_high_risk: bool,
}

impl Wave {
    pub fn new(number: usize) -> Self {
        Self {
            number,
            features: Vec::new(),
            has_high_risk: false,
        }
    }

    pub(crate) fn push(&mut self, feature: Feature) {
        self.has_high_risk |= feature.is_high_risk();
        self.features.push(feature);
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Whether the wave already holds its one `High` risk feature.
    pub fn has_high_risk(&self) -> bool {
        self.has_high_risk
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn is_mvp(&self) -> bool {
        self.number == 1
    }

    pub fn label(&self) -> String {
        if self.is_mvp() {
            "Wave 1 (MVP)".to_string()
        } else {
            format!("Wave {}", self.number)
        }
    }
}

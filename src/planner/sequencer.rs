//! Greedy wave sequencing of a feature backlog.

use crate::models::{Feature, Wave, WAVE_CAPACITY};

/// Partition a backlog into waves of at most [`WAVE_CAPACITY`] features.
pub fn sequence(backlog: Vec<Feature>) -> Vec<Wave> {
    sequence_with_capacity(backlog, WAVE_CAPACITY)
}

/// Partition a backlog into ordered waves.
///
/// The backlog is stably sorted by business value (highest first). Each wave
/// is then filled in one pass over the remaining backlog: a feature is moved
/// into the wave unless the wave is full or the feature is High risk and the
/// wave already holds a High-risk feature, in which case it stays behind for
/// a later wave. Skipped features are not reconsidered within the same wave.
///
/// The first feature scanned always fits an empty wave, so every wave takes at
/// least one feature and the loop ends after at most `backlog.len()` waves.
/// A capacity of zero is treated as one.
pub fn sequence_with_capacity(mut backlog: Vec<Feature>, capacity: usize) -> Vec<Wave> {
    let capacity = capacity.max(1);
    backlog.sort_by(|a, b| b.business_value.cmp(&a.business_value));

    let mut waves = Vec::new();

    while !backlog.is_empty() {
        let mut wave = Wave::new(waves.len() + 1);
        let mut deferred = Vec::with_capacity(backlog.len());
        let mut remaining = backlog.into_iter();

        for feature in remaining.by_ref() {
            if wave.len() >= capacity {
                deferred.push(feature);
                break;
            }
            if feature.is_high_risk() && wave.has_high_risk() {
                deferred.push(feature);
                continue;
            }
            wave.push(feature);
        }

        deferred.extend(remaining);
        backlog = deferred;

        tracing::debug!(
            wave = wave.number,
            size = wave.len(),
            high_risk = wave.has_high_risk(),
            "Sequenced wave"
        );
        waves.push(wave);
    }

    waves
}

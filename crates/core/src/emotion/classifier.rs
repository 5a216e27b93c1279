use super::{EmotionResult, MoodPoint, RankedEmotion};
use crate::catalog::EmotionCatalog;

const LOG_TARGET: &str = "emotion::classifier";

pub const TOP_K: usize = 3;

/// Ranks the `TOP_K` catalogue entries nearest to `point`.
///
/// Equal distances keep catalogue declaration order. Each entry is weighted
/// by `1 / (1 + distance)` and the weights are normalized to percentages over
/// the selected entries only.
pub fn classify(point: MoodPoint, catalog: &EmotionCatalog) -> EmotionResult {
    let mut by_distance: Vec<(usize, f64)> = catalog
        .entries()
        .iter()
        .enumerate()
        .map(|(i, e)| (i, point.distance_to(e.valence, e.arousal)))
        .collect();
    by_distance.sort_by(|a, b| a.1.total_cmp(&b.1));
    by_distance.truncate(TOP_K);

    let weights: Vec<f64> = by_distance.iter().map(|(_, d)| 1.0 / (1.0 + d)).collect();
    let total: f64 = weights.iter().sum();

    let ranked: Vec<RankedEmotion> = by_distance
        .iter()
        .zip(&weights)
        .map(|(&(index, distance), weight)| {
            let share = 100.0 * weight / total;
            RankedEmotion {
                name: catalog.entries()[index].name.to_string(),
                distance,
                share,
                percentage: round_2dp(share),
            }
        })
        .collect();

    tracing::debug!(
        target: LOG_TARGET,
        valence = point.valence(),
        arousal = point.arousal(),
        top = ranked.first().map(|r| r.name.as_str()).unwrap_or_default(),
        "classified mood"
    );

    EmotionResult { mood: point, ranked }
}

fn round_2dp(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

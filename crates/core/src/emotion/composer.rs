use super::{EmotionCard, EmotionResult};
use crate::catalog::EmotionCatalog;

/// Secondary emotions need strictly more than this (rounded) percentage.
pub const SIGNIFICANCE_THRESHOLD_PCT: f64 = 5.0;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ComposeError {
    #[error("emotion {0:?} is not in the catalogue")]
    UnknownEmotion(String),
}

/// Picks the emotions worth showing and attaches their display text.
///
/// Rank 1 is always shown. Rank 2 is shown when it clears the threshold, and
/// rank 3 only when rank 2 was shown and rank 3 clears it too.
pub fn compose(
    result: &EmotionResult,
    catalog: &EmotionCatalog,
) -> Result<Vec<EmotionCard>, ComposeError> {
    let mut cards = Vec::with_capacity(result.ranked.len());
    for (rank, ranked) in result.ranked.iter().enumerate() {
        if rank > 0 && ranked.percentage <= SIGNIFICANCE_THRESHOLD_PCT {
            break;
        }
        let entry = catalog
            .get(&ranked.name)
            .ok_or_else(|| ComposeError::UnknownEmotion(ranked.name.clone()))?;
        cards.push(EmotionCard {
            name: ranked.name.clone(),
            percentage: ranked.percentage,
            emoji: entry.emoji.to_string(),
            description: entry.description.to_string(),
        });
    }
    Ok(cards)
}

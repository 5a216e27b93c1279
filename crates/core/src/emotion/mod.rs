mod classifier;
mod composer;

use serde::{Deserialize, Serialize};

pub use classifier::{classify, TOP_K};
pub use composer::{compose, ComposeError, SIGNIFICANCE_THRESHOLD_PCT};

/// A position in valence/arousal space, always inside `[0, 1]²`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(from = "RawPoint", into = "RawPoint")]
pub struct MoodPoint {
    valence: f64,
    arousal: f64,
}

#[derive(Clone, Copy, Serialize, Deserialize)]
struct RawPoint {
    valence: f64,
    arousal: f64,
}

impl From<RawPoint> for MoodPoint {
    fn from(raw: RawPoint) -> Self {
        Self::new(raw.valence, raw.arousal)
    }
}

impl From<MoodPoint> for RawPoint {
    fn from(point: MoodPoint) -> Self {
        Self {
            valence: point.valence,
            arousal: point.arousal,
        }
    }
}

impl MoodPoint {
    /// Clamps both coordinates into [0, 1]. NaN becomes the midpoint.
    pub fn new(valence: f64, arousal: f64) -> Self {
        Self {
            valence: clamp_unit(valence),
            arousal: clamp_unit(arousal),
        }
    }

    pub fn valence(&self) -> f64 {
        self.valence
    }

    pub fn arousal(&self) -> f64 {
        self.arousal
    }

    pub fn distance_to(&self, valence: f64, arousal: f64) -> f64 {
        (self.valence - valence).hypot(self.arousal - arousal)
    }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() {
        0.5
    } else {
        v.clamp(0.0, 1.0)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RankedEmotion {
    pub name: String,
    pub distance: f64,
    /// Unrounded share of the top-3 weight, in percent.
    pub share: f64,
    /// `share` rounded to two decimals for display.
    pub percentage: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EmotionResult {
    pub mood: MoodPoint,
    /// Nearest first.
    pub ranked: Vec<RankedEmotion>,
}

/// One surfaced emotion with its display text.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EmotionCard {
    pub name: String,
    pub percentage: f64,
    pub emoji: String,
    pub description: String,
}

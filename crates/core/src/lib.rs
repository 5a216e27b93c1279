//! Audio mood analysis: decode a clip, summarize it as an 89-value feature
//! vector, regress valence and arousal, rank the nearest catalogue emotions
//! and plot the result on the valence/arousal map.

#![deny(warnings)]

pub mod catalog;
pub mod config;
pub mod decode;
pub mod emotion;
pub mod engine;
pub mod features;
pub mod regress;
pub mod visualize;

pub use engine::{AnalysisOutcome, MoodEngine, MoodReport, NoMoodReason};

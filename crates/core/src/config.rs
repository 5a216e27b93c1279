use crate::visualize::PlotBounds;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_ANALYSIS_SECS: u32 = 45;
pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 22_050;
pub const ENV_VALENCE_MODEL: &str = "MOODSCOPE_VALENCE_MODEL";
pub const ENV_AROUSAL_MODEL: &str = "MOODSCOPE_AROUSAL_MODEL";
pub const ENV_BACKGROUND: &str = "MOODSCOPE_BACKGROUND";
pub const ENV_PLOT_BOUNDS: &str = "MOODSCOPE_PLOT_BOUNDS";
pub const ENV_CATALOG: &str = "MOODSCOPE_CATALOG";

/// Portion of a clip that is analyzed: the first `duration_secs` seconds,
/// resampled to `sample_rate` Hz mono.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisWindow {
    pub duration_secs: u32,
    pub sample_rate: u32,
}

impl AnalysisWindow {
    pub fn new(duration_secs: u32, sample_rate: u32) -> Result<Self, ConfigError> {
        if duration_secs == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        if sample_rate == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        Ok(Self {
            duration_secs,
            sample_rate,
        })
    }

    /// Number of output samples the window holds at the target rate.
    pub fn max_samples(&self) -> usize {
        self.frames_for_sample_rate(self.sample_rate)
    }

    /// Number of frames the window spans at an arbitrary source rate.
    pub fn frames_for_sample_rate(&self, sample_rate_hz: u32) -> usize {
        let frames = u64::from(self.duration_secs).saturating_mul(u64::from(sample_rate_hz));
        usize::try_from(frames).unwrap_or(usize::MAX)
    }
}

impl Default for AnalysisWindow {
    fn default() -> Self {
        Self {
            duration_secs: DEFAULT_ANALYSIS_SECS,
            sample_rate: DEFAULT_SAMPLE_RATE_HZ,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DecoderKind {
    #[default]
    Symphonia,
    Ffmpeg,
}

impl FromStr for DecoderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "symphonia" => Ok(Self::Symphonia),
            "ffmpeg" => Ok(Self::Ffmpeg),
            other => Err(ConfigError::UnknownDecoder(other.to_owned())),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BackgroundConfig {
    pub path: PathBuf,
    pub bounds: PlotBounds,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    pub valence_model: PathBuf,
    pub arousal_model: PathBuf,
    /// `None` renders onto a freshly generated base map.
    pub background: Option<BackgroundConfig>,
    /// `None` uses the built-in catalogue.
    pub catalog: Option<PathBuf>,
    pub window: AnalysisWindow,
    pub decoder: DecoderKind,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{which} model path missing (pass it explicitly or set {env_key})")]
    MissingModelPath {
        which: &'static str,
        env_key: &'static str,
    },
    #[error("analysis duration must be > 0 s")]
    ZeroDuration,
    #[error("sample rate must be > 0 Hz")]
    ZeroSampleRate,
    #[error("invalid plot bounds: {0}")]
    InvalidPlotBounds(String),
    #[error("a background image needs plot bounds ({})", ENV_PLOT_BOUNDS)]
    BackgroundWithoutBounds,
    #[error("unknown decoder: {0}")]
    UnknownDecoder(String),
}

pub trait Env {
    fn var(&self, key: &str) -> Option<String>;
}

#[derive(Clone, Debug, Default)]
pub struct StdEnv;

impl Env for StdEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MapEnv {
    vars: std::collections::BTreeMap<String, String>,
}

impl MapEnv {
    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_owned(), value.to_owned());
        self
    }
}

impl Env for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn resolve_optional_path(
    cli_value: Option<PathBuf>,
    env_key: &str,
    env: &impl Env,
) -> Option<PathBuf> {
    match cli_value {
        Some(v) => Some(v),
        None => env
            .var(env_key)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from),
    }
}

pub fn resolve_model_path(
    cli_value: Option<PathBuf>,
    which: &'static str,
    env_key: &'static str,
    env: &impl Env,
) -> Result<PathBuf, ConfigError> {
    resolve_optional_path(cli_value, env_key, env)
        .ok_or(ConfigError::MissingModelPath { which, env_key })
}

pub fn resolve_plot_bounds(
    cli_value: Option<String>,
    env: &impl Env,
) -> Result<Option<PlotBounds>, ConfigError> {
    let raw = match cli_value {
        Some(v) => Some(v),
        None => env.var(ENV_PLOT_BOUNDS),
    };
    raw.map(|s| s.parse::<PlotBounds>()).transpose()
}

/// Pairs a background path with its bounds; one without the other is only
/// allowed for the bounds (ignored when no background is given).
pub fn resolve_background(
    path: Option<PathBuf>,
    bounds: Option<PlotBounds>,
) -> Result<Option<BackgroundConfig>, ConfigError> {
    match (path, bounds) {
        (Some(path), Some(bounds)) => Ok(Some(BackgroundConfig { path, bounds })),
        (Some(_), None) => Err(ConfigError::BackgroundWithoutBounds),
        (None, _) => Ok(None),
    }
}

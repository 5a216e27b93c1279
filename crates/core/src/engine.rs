//! End-to-end analysis: audio bytes in, mood report out.
//!
//! All shared state is built once and held behind `Arc`s, so a `MoodEngine`
//! is cheap to clone into concurrent tasks.

use crate::catalog::{CatalogError, EmotionCatalog};
use crate::config::{AnalysisWindow, DecoderKind, EngineConfig};
use crate::decode::{decoder_for, AudioDecoder};
use crate::emotion::{classify, compose, ComposeError, EmotionCard, MoodPoint};
use crate::features::{FeatureError, FeatureExtractor};
use crate::regress::{ModelLoadError, MoodRegressor};
use crate::visualize::{render_base_map, SpaceVisualizer, VisualizeError};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const LOG_TARGET: &str = "engine";

/// Edge length of the generated background when no asset is configured.
pub const DEFAULT_BASE_MAP_SIZE: u32 = 1200;

#[derive(thiserror::Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Model(#[from] ModelLoadError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Background(#[from] VisualizeError),

    #[error("decoder {0:?} is not available in this build")]
    DecoderUnavailable(DecoderKind),
}

/// Failures that are not a "no mood" answer: they indicate a defect rather
/// than unusable input.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("feature extraction failed: {0}")]
    Features(#[from] FeatureError),

    #[error(transparent)]
    Compose(#[from] ComposeError),

    #[error("rendering failed: {0}")]
    Render(#[from] VisualizeError),

    #[error("analysis worker failed: {0}")]
    Worker(String),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NoMoodReason {
    Undecodable(String),
    Empty,
    Silent,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MoodReport {
    pub mood: MoodPoint,
    /// One to three emotions, nearest first.
    pub emotions: Vec<EmotionCard>,
    #[serde(with = "png_base64")]
    pub image_png: Vec<u8>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", content = "result", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Detected(MoodReport),
    NoMood(NoMoodReason),
}

mod png_base64 {
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(serde::de::Error::custom)
    }
}

#[derive(Clone)]
pub struct MoodEngine {
    decoder: Arc<dyn AudioDecoder>,
    extractor: Arc<FeatureExtractor>,
    regressor: Arc<MoodRegressor>,
    catalog: Arc<EmotionCatalog>,
    visualizer: Arc<SpaceVisualizer>,
    window: AnalysisWindow,
}

impl std::fmt::Debug for MoodEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MoodEngine")
            .field("window", &self.window)
            .field("catalog_entries", &self.catalog.len())
            .finish_non_exhaustive()
    }
}

impl MoodEngine {
    pub fn new(
        decoder: Arc<dyn AudioDecoder>,
        regressor: Arc<MoodRegressor>,
        catalog: Arc<EmotionCatalog>,
        visualizer: Arc<SpaceVisualizer>,
        window: AnalysisWindow,
    ) -> Self {
        Self {
            decoder,
            extractor: Arc::new(FeatureExtractor::new(window.sample_rate)),
            regressor,
            catalog,
            visualizer,
            window,
        }
    }

    /// Loads every startup asset named by `config`. Any failure is fatal.
    pub fn from_config(config: &EngineConfig) -> Result<Self, StartupError> {
        let regressor = MoodRegressor::from_paths(&config.valence_model, &config.arousal_model)?;
        let catalog = match &config.catalog {
            Some(path) => EmotionCatalog::from_json_path(path)?,
            None => EmotionCatalog::builtin(),
        };
        let visualizer = match &config.background {
            Some(bg) => SpaceVisualizer::from_path(&bg.path, bg.bounds)?,
            None => {
                tracing::info!(
                    target: LOG_TARGET,
                    size = DEFAULT_BASE_MAP_SIZE,
                    "no background configured, generating base map"
                );
                SpaceVisualizer::from_base_map(render_base_map(
                    &catalog,
                    DEFAULT_BASE_MAP_SIZE,
                    DEFAULT_BASE_MAP_SIZE,
                ))?
            }
        };
        let decoder =
            decoder_for(config.decoder).ok_or(StartupError::DecoderUnavailable(config.decoder))?;

        tracing::info!(
            target: LOG_TARGET,
            decoder = ?config.decoder,
            catalog_entries = catalog.len(),
            window_secs = config.window.duration_secs,
            sample_rate = config.window.sample_rate,
            "engine ready"
        );
        Ok(Self::new(
            decoder,
            Arc::new(regressor),
            Arc::new(catalog),
            Arc::new(visualizer),
            config.window,
        ))
    }

    pub fn window(&self) -> AnalysisWindow {
        self.window
    }

    pub fn catalog(&self) -> &EmotionCatalog {
        &self.catalog
    }

    pub fn visualizer(&self) -> &SpaceVisualizer {
        &self.visualizer
    }

    /// Decodes `audio` and analyzes the first window of it. Undecodable,
    /// empty and silent input come back as [`AnalysisOutcome::NoMood`].
    pub async fn analyze(&self, audio: Bytes) -> Result<AnalysisOutcome, EngineError> {
        let clip = match self.decoder.decode(audio, self.window).await {
            Ok(clip) => clip,
            Err(e) => {
                tracing::warn!(target: LOG_TARGET, error = %e, "audio could not be decoded");
                return Ok(AnalysisOutcome::NoMood(NoMoodReason::Undecodable(
                    e.to_string(),
                )));
            }
        };
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.analyze_pcm(&clip.samples))
            .await
            .map_err(|e| EngineError::Worker(e.to_string()))?
    }

    /// Analyzes mono samples already at the window's sample rate.
    pub fn analyze_pcm(&self, samples: &[f32]) -> Result<AnalysisOutcome, EngineError> {
        let features = match self.extractor.extract(samples) {
            Ok(features) => features,
            Err(FeatureError::Empty) => {
                tracing::info!(target: LOG_TARGET, "decoded clip is empty");
                return Ok(AnalysisOutcome::NoMood(NoMoodReason::Empty));
            }
            Err(FeatureError::Silent { peak }) => {
                tracing::info!(target: LOG_TARGET, peak, "decoded clip is silent");
                return Ok(AnalysisOutcome::NoMood(NoMoodReason::Silent));
            }
            Err(e) => return Err(e.into()),
        };

        let mood = self.regressor.predict(&features);
        let result = classify(mood, &self.catalog);
        let emotions = compose(&result, &self.catalog)?;
        let image_png = self.visualizer.render_png(mood)?;

        tracing::debug!(
            target: LOG_TARGET,
            valence = mood.valence(),
            arousal = mood.arousal(),
            shown = emotions.len(),
            "mood detected"
        );
        Ok(AnalysisOutcome::Detected(MoodReport {
            mood,
            emotions,
            image_png,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackgroundConfig;
    use crate::decode::{DecodeError, PcmClip};
    use crate::features::FeatureVector;
    use crate::regress::MoodModel;
    use crate::visualize::PlotBounds;
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use std::io::Write;
    use std::path::PathBuf;

    struct Fixed(f64);

    impl MoodModel for Fixed {
        fn predict(&self, _: &FeatureVector) -> f64 {
            self.0
        }
    }

    /// Ignores its input and hands back a prepared clip or failure.
    struct CannedDecoder(Option<Vec<f32>>);

    impl AudioDecoder for CannedDecoder {
        fn decode(
            &self,
            _audio: Bytes,
            window: AnalysisWindow,
        ) -> BoxFuture<'_, crate::decode::Result<PcmClip>> {
            let canned = self.0.clone();
            async move {
                canned
                    .map(|samples| PcmClip::new(window.sample_rate, samples))
                    .ok_or_else(|| DecodeError::Unsupported("not audio".into()))
            }
            .boxed()
        }
    }

    fn tone(secs: f32) -> Vec<f32> {
        (0..(secs * 22_050.0) as usize)
            .map(|i| 0.4 * (2.0 * std::f32::consts::PI * 330.0 * i as f32 / 22_050.0).sin())
            .collect()
    }

    fn engine(decoded: Option<Vec<f32>>, valence: f64, arousal: f64) -> MoodEngine {
        let catalog = EmotionCatalog::builtin();
        let visualizer =
            SpaceVisualizer::from_base_map(render_base_map(&catalog, 300, 300)).unwrap();
        MoodEngine::new(
            Arc::new(CannedDecoder(decoded)),
            Arc::new(MoodRegressor::new(
                Arc::new(Fixed(valence)),
                Arc::new(Fixed(arousal)),
            )),
            Arc::new(catalog),
            Arc::new(visualizer),
            AnalysisWindow::default(),
        )
    }

    #[test]
    fn silence_and_empty_input_are_no_mood() {
        let engine = engine(None, 0.5, 0.5);
        assert_eq!(
            engine.analyze_pcm(&vec![0.0; 22_050]).unwrap(),
            AnalysisOutcome::NoMood(NoMoodReason::Silent)
        );
        assert_eq!(
            engine.analyze_pcm(&[]).unwrap(),
            AnalysisOutcome::NoMood(NoMoodReason::Empty)
        );
    }

    #[test]
    fn neutral_prediction_ranks_neutral_first() {
        let engine = engine(None, 0.5, 0.5);
        let AnalysisOutcome::Detected(report) = engine.analyze_pcm(&tone(2.0)).unwrap() else {
            panic!("expected a detected mood");
        };
        assert_eq!(report.mood, MoodPoint::new(0.5, 0.5));
        assert_eq!(report.emotions[0].name, "Neutral");
        assert!(!report.emotions.is_empty() && report.emotions.len() <= 3);
        let img = image::load_from_memory(&report.image_png).unwrap();
        assert_eq!((img.width(), img.height()), (300, 300));
    }

    #[test]
    fn out_of_range_models_are_clamped() {
        let engine = engine(None, 1.7, -3.0);
        let AnalysisOutcome::Detected(report) = engine.analyze_pcm(&tone(1.0)).unwrap() else {
            panic!("expected a detected mood");
        };
        assert_eq!(report.mood, MoodPoint::new(1.0, 0.0));
    }

    #[tokio::test]
    async fn undecodable_bytes_are_no_mood() {
        let engine = engine(None, 0.5, 0.5);
        let outcome = engine.analyze(Bytes::from_static(b"not audio")).await.unwrap();
        assert!(matches!(
            outcome,
            AnalysisOutcome::NoMood(NoMoodReason::Undecodable(_))
        ));
    }

    #[tokio::test]
    async fn decoded_audio_flows_through() {
        let engine = engine(Some(tone(1.5)), 0.92, 0.92);
        let outcome = engine.analyze(Bytes::from_static(b"ignored")).await.unwrap();
        let AnalysisOutcome::Detected(report) = outcome else {
            panic!("expected a detected mood");
        };
        assert_eq!(report.emotions[0].name, "Ecstatic");
        assert_eq!(report.emotions[0].emoji, "🎉");
    }

    #[test]
    fn report_serializes_with_base64_image() {
        let outcome = AnalysisOutcome::Detected(MoodReport {
            mood: MoodPoint::new(0.2, 0.3),
            emotions: Vec::new(),
            image_png: vec![1, 2, 3],
        });
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "detected");
        assert_eq!(json["result"]["image_png"], "AQID");
        let back: AnalysisOutcome = serde_json::from_value(json).unwrap();
        assert_eq!(back, outcome);

        let json = serde_json::to_value(AnalysisOutcome::NoMood(NoMoodReason::Silent)).unwrap();
        assert_eq!(json, serde_json::json!({"status": "no_mood", "result": "silent"}));
    }

    fn write_linear(dir: &tempfile::TempDir, name: &str, intercept: f64) -> PathBuf {
        let path = dir.path().join(name);
        let coefficients = vec![0.0; crate::features::FEATURE_COUNT];
        let json = serde_json::json!({
            "kind": "linear",
            "n_features": crate::features::FEATURE_COUNT,
            "intercept": intercept,
            "coefficients": coefficients,
        });
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(json.to_string().as_bytes()).unwrap();
        path
    }

    fn config(dir: &tempfile::TempDir) -> EngineConfig {
        EngineConfig {
            valence_model: write_linear(dir, "valence.json", 0.8),
            arousal_model: write_linear(dir, "arousal.json", 0.2),
            background: None,
            catalog: None,
            window: AnalysisWindow::default(),
            decoder: DecoderKind::Symphonia,
        }
    }

    #[test]
    fn from_config_builds_a_working_engine() {
        let dir = tempfile::tempdir().unwrap();
        let engine = MoodEngine::from_config(&config(&dir)).unwrap();
        assert_eq!(engine.catalog().len(), 26);
        let AnalysisOutcome::Detected(report) = engine.analyze_pcm(&tone(1.0)).unwrap() else {
            panic!("expected a detected mood");
        };
        assert_eq!(report.mood, MoodPoint::new(0.8, 0.2));
        assert_eq!(report.emotions[0].name, "Relaxed");
    }

    #[test]
    fn missing_model_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(&dir);
        config.arousal_model = dir.path().join("missing.json");
        assert!(matches!(
            MoodEngine::from_config(&config),
            Err(StartupError::Model(ModelLoadError::Io { .. }))
        ));
    }

    #[test]
    fn background_asset_is_loaded_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bg.png");
        let map = render_base_map(&EmotionCatalog::builtin(), 320, 240);
        map.image.save(&path).unwrap();

        let mut config = config(&dir);
        config.background = Some(BackgroundConfig {
            path: path.clone(),
            bounds: map.bounds,
        });
        let engine = MoodEngine::from_config(&config).unwrap();
        assert_eq!(engine.visualizer().background().dimensions(), (320, 240));

        config.background = Some(BackgroundConfig {
            path,
            bounds: PlotBounds::new(0.0, 1000.0, 0.0, 1000.0).unwrap(),
        });
        assert!(matches!(
            MoodEngine::from_config(&config),
            Err(StartupError::Background(VisualizeError::BoundsOutsideImage { .. }))
        ));
    }
}

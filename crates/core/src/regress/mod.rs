//! Valence/arousal regression over the 89-value feature vector.
//!
//! Models are trained offline and shipped as JSON artifacts tagged by
//! `kind`; see [`ModelArtifact`].

mod forest;
mod linear;

pub use forest::{DecisionTree, ForestModel, TREE_LEAF};
pub use linear::LinearModel;

use crate::emotion::MoodPoint;
use crate::features::{FeatureVector, FEATURE_COUNT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const LOG_TARGET: &str = "regress";

/// A fitted scalar regressor over one emotional dimension.
pub trait MoodModel: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> f64;
}

#[derive(thiserror::Error, Debug)]
pub enum ModelLoadError {
    #[error("failed to read model {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("model expects {actual} features, extractor produces {}", FEATURE_COUNT)]
    FeatureCount { actual: usize },

    #[error("forest has no trees")]
    EmptyForest,

    #[error("tree {tree} is malformed: {reason}")]
    InvalidTree { tree: usize, reason: String },

    #[error("expected {expected} coefficients, got {actual}")]
    CoefficientCount { expected: usize, actual: usize },

    #[error("model has a non-finite parameter")]
    NonFiniteParameter,
}

pub type Result<T> = std::result::Result<T, ModelLoadError>;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    Forest(ForestModel),
    Linear(LinearModel),
}

impl ModelArtifact {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Forest(_) => "forest",
            Self::Linear(_) => "linear",
        }
    }

    pub fn n_features(&self) -> usize {
        match self {
            Self::Forest(m) => m.n_features,
            Self::Linear(m) => m.n_features,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_features() != FEATURE_COUNT {
            return Err(ModelLoadError::FeatureCount {
                actual: self.n_features(),
            });
        }
        match self {
            Self::Forest(m) => m.validate(),
            Self::Linear(m) => m.validate(),
        }
    }

    pub fn from_json(path: &Path, json: &str) -> Result<Self> {
        let artifact: Self = serde_json::from_str(json).map_err(|source| ModelLoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        artifact.validate()?;
        Ok(artifact)
    }
}

impl MoodModel for ModelArtifact {
    fn predict(&self, features: &FeatureVector) -> f64 {
        match self {
            Self::Forest(m) => m.predict(features),
            Self::Linear(m) => m.predict(features),
        }
    }
}

/// Reads and validates a model artifact. Any failure here is fatal at startup.
pub fn load_model(path: impl AsRef<Path>) -> Result<ModelArtifact> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|source| ModelLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let artifact = ModelArtifact::from_json(path, &json)?;
    tracing::info!(
        target: LOG_TARGET,
        path = %path.display(),
        kind = artifact.kind(),
        "loaded mood model"
    );
    Ok(artifact)
}

/// Pairs the valence and arousal models and keeps their output in [0, 1].
#[derive(Clone)]
pub struct MoodRegressor {
    valence: Arc<dyn MoodModel>,
    arousal: Arc<dyn MoodModel>,
}

impl std::fmt::Debug for MoodRegressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MoodRegressor").finish_non_exhaustive()
    }
}

impl MoodRegressor {
    pub fn new(valence: Arc<dyn MoodModel>, arousal: Arc<dyn MoodModel>) -> Self {
        Self { valence, arousal }
    }

    pub fn from_paths(valence: impl AsRef<Path>, arousal: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(
            Arc::new(load_model(valence)?),
            Arc::new(load_model(arousal)?),
        ))
    }

    pub fn predict(&self, features: &FeatureVector) -> MoodPoint {
        let valence = sanitize("valence", self.valence.predict(features));
        let arousal = sanitize("arousal", self.arousal.predict(features));
        MoodPoint::new(valence, arousal)
    }
}

fn sanitize(dimension: &'static str, raw: f64) -> f64 {
    if raw.is_nan() {
        tracing::warn!(target: LOG_TARGET, dimension, "model returned NaN, using midpoint");
        return 0.5;
    }
    raw
}

//! The fixed 89-value audio descriptor used by the mood models.
//!
//! Every track is summarized over the whole analysis window with librosa
//! compatible parameters: 2048-sample frames, 512-sample hop, centered
//! frames and a periodic Hann window. One STFT is shared by the spectral,
//! tonal, timbre and separation groups.

mod filters;
mod hpss;
mod rhythm;
mod spectral;
mod spectrum;
mod stats;
mod temporal;
mod timbre;
mod tonal;

use self::filters::{Dct, Filterbank};
use self::spectral::{SpectralShape, CONTRAST_BANDS};
use self::spectrum::Stft;
use self::stats::{column_mean_std, mean_std};
use self::tonal::{N_CHROMA, N_TONNETZ};
use crate::config::DEFAULT_SAMPLE_RATE_HZ;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const LOG_TARGET: &str = "features";

pub const FEATURE_COUNT: usize = 89;
pub const N_FFT: usize = 2048;
pub const HOP_LENGTH: usize = 512;
pub const N_MELS: usize = 128;

/// Clips whose peak absolute amplitude stays below this carry no usable signal.
pub const SILENCE_PEAK: f32 = 0.001;

/// Column names in vector order; also the header of the CSV export.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "zcr_mean",
    "zcr_std",
    "rms_mean",
    "rms_std",
    "spectral_centroid_mean",
    "spectral_centroid_std",
    "spectral_bandwidth_mean",
    "spectral_bandwidth_std",
    "spectral_rolloff_mean",
    "spectral_rolloff_std",
    "spectral_contrast_0_mean",
    "spectral_contrast_1_mean",
    "spectral_contrast_2_mean",
    "spectral_contrast_3_mean",
    "spectral_contrast_4_mean",
    "spectral_contrast_5_mean",
    "spectral_contrast_6_mean",
    "spectral_contrast_0_std",
    "spectral_contrast_1_std",
    "spectral_contrast_2_std",
    "spectral_contrast_3_std",
    "spectral_contrast_4_std",
    "spectral_contrast_5_std",
    "spectral_contrast_6_std",
    "tempo",
    "chroma_0_mean",
    "chroma_1_mean",
    "chroma_2_mean",
    "chroma_3_mean",
    "chroma_4_mean",
    "chroma_5_mean",
    "chroma_6_mean",
    "chroma_7_mean",
    "chroma_8_mean",
    "chroma_9_mean",
    "chroma_10_mean",
    "chroma_11_mean",
    "chroma_0_std",
    "chroma_1_std",
    "chroma_2_std",
    "chroma_3_std",
    "chroma_4_std",
    "chroma_5_std",
    "chroma_6_std",
    "chroma_7_std",
    "chroma_8_std",
    "chroma_9_std",
    "chroma_10_std",
    "chroma_11_std",
    "tonnetz_0_mean",
    "tonnetz_1_mean",
    "tonnetz_2_mean",
    "tonnetz_3_mean",
    "tonnetz_4_mean",
    "tonnetz_5_mean",
    "tonnetz_0_std",
    "tonnetz_1_std",
    "tonnetz_2_std",
    "tonnetz_3_std",
    "tonnetz_4_std",
    "tonnetz_5_std",
    "mfcc_1_mean",
    "mfcc_2_mean",
    "mfcc_3_mean",
    "mfcc_4_mean",
    "mfcc_5_mean",
    "mfcc_6_mean",
    "mfcc_7_mean",
    "mfcc_8_mean",
    "mfcc_9_mean",
    "mfcc_10_mean",
    "mfcc_11_mean",
    "mfcc_12_mean",
    "mfcc_13_mean",
    "mfcc_1_std",
    "mfcc_2_std",
    "mfcc_3_std",
    "mfcc_4_std",
    "mfcc_5_std",
    "mfcc_6_std",
    "mfcc_7_std",
    "mfcc_8_std",
    "mfcc_9_std",
    "mfcc_10_std",
    "mfcc_11_std",
    "mfcc_12_std",
    "mfcc_13_std",
    "harmonic_ratio",
    "percussive_ratio",
];

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FeatureError {
    #[error("audio clip is empty")]
    Empty,

    #[error("audio clip is silent (peak amplitude {peak})")]
    Silent { peak: f32 },

    #[error("input sample {index} is not finite")]
    NonFiniteSample { index: usize },

    #[error("feature {index} ({}) is not finite", feature_name(.index))]
    NonFinite { index: usize },

    #[error("expected {} features, got {actual}", FEATURE_COUNT)]
    Length { actual: usize },

    #[error("fft failed: {0}")]
    Fft(String),
}

pub type Result<T> = std::result::Result<T, FeatureError>;

fn feature_name(index: &usize) -> &'static str {
    FEATURE_NAMES.get(*index).copied().unwrap_or("?")
}

/// Exactly 89 finite values in `FEATURE_NAMES` order.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn from_slice(values: &[f64]) -> Result<Self> {
        let array: [f64; FEATURE_COUNT] = values
            .try_into()
            .map_err(|_| FeatureError::Length {
                actual: values.len(),
            })?;
        if let Some(index) = array.iter().position(|v| !v.is_finite()) {
            return Err(FeatureError::NonFinite { index });
        }
        Ok(Self(array))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }

    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.0.iter().copied())
    }
}

impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.as_slice().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FeatureVector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let values = Vec::<f64>::deserialize(deserializer)?;
        Self::from_slice(&values).map_err(serde::de::Error::custom)
    }
}

/// Stateless after construction; the filterbanks are built once per sample rate.
#[derive(Clone, Debug)]
pub struct FeatureExtractor {
    sample_rate: u32,
    mel: Filterbank,
    chroma: Filterbank,
    dct: Dct,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE_HZ)
    }
}

impl FeatureExtractor {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            mel: Filterbank::mel(sample_rate, N_FFT, N_MELS),
            chroma: Filterbank::chroma(sample_rate, N_FFT, N_CHROMA),
            dct: Dct::new(N_MELS, timbre::N_MFCC),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Summarizes a mono clip at `sample_rate()`. Either all 89 values are
    /// produced or the whole extraction fails.
    pub fn extract(&self, samples: &[f32]) -> Result<FeatureVector> {
        if samples.is_empty() {
            return Err(FeatureError::Empty);
        }
        if let Some(index) = samples.iter().position(|s| !s.is_finite()) {
            return Err(FeatureError::NonFiniteSample { index });
        }
        let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        if peak < SILENCE_PEAK {
            return Err(FeatureError::Silent { peak });
        }

        let y: Vec<f64> = samples.iter().map(|&s| f64::from(s)).collect();
        let stft = Stft::compute(&y, N_FFT, HOP_LENGTH)?;
        let magnitude = stft.magnitude();
        let power = stft.power();
        let freqs = stft.bin_frequencies(self.sample_rate);

        let mut out = Vec::with_capacity(FEATURE_COUNT);

        // Temporal
        push_mean_std(&mut out, &temporal::zero_crossing_rate(&y, N_FFT, HOP_LENGTH));
        push_mean_std(&mut out, &temporal::rms(&y, N_FFT, HOP_LENGTH));

        // Spectral
        let shape = SpectralShape::compute(&magnitude, &freqs);
        push_mean_std(&mut out, &shape.centroid);
        push_mean_std(&mut out, &shape.bandwidth);
        push_mean_std(&mut out, &shape.rolloff);
        push_columns(
            &mut out,
            &spectral::spectral_contrast(&magnitude, &freqs),
            CONTRAST_BANDS + 1,
        );

        // Rhythm
        let log_mel = timbre::log_mel(&power, &self.mel);
        let onset = rhythm::onset_strength(&log_mel, N_FFT, HOP_LENGTH);
        out.push(rhythm::estimate_tempo(&onset, self.sample_rate, HOP_LENGTH)?);

        // Tonal
        let chroma = tonal::chroma(&power, &self.chroma);
        push_columns(&mut out, &chroma, N_CHROMA);
        push_columns(&mut out, &tonal::tonnetz(&chroma), N_TONNETZ);

        // Timbre
        push_columns(&mut out, &timbre::mfcc(&log_mel, &self.dct), timbre::N_MFCC);

        // Harmonic / percussive
        let ratios = hpss::source_ratios(&y, &stft)?;
        out.push(ratios.harmonic);
        out.push(ratios.percussive);

        let vector = FeatureVector::from_slice(&out)?;
        tracing::debug!(
            target: LOG_TARGET,
            frames = stft.frames.len(),
            tempo = vector.get(TEMPO_INDEX),
            "extracted features"
        );
        Ok(vector)
    }
}

const TEMPO_INDEX: usize = 24;

fn push_mean_std(out: &mut Vec<f64>, track: &[f64]) {
    let (mean, std) = mean_std(track);
    out.push(mean);
    out.push(std);
}

/// All column means first, then all column standard deviations.
fn push_columns(out: &mut Vec<f64>, frames: &[Vec<f64>], dims: usize) {
    let (means, stds) = column_mean_std(frames, dims);
    out.extend(means);
    out.extend(stds);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, amplitude: f32, secs: f32, sr: u32) -> Vec<f32> {
        let n = (secs * sr as f32) as usize;
        (0..n)
            .map(|i| amplitude * (2.0 * std::f32::consts::PI * freq * i as f32 / sr as f32).sin())
            .collect()
    }

    #[test]
    fn names_are_unique_and_ordered() {
        let mut seen = std::collections::HashSet::new();
        assert!(FEATURE_NAMES.iter().all(|n| seen.insert(*n)));
        assert_eq!(FEATURE_NAMES[0], "zcr_mean");
        assert_eq!(FEATURE_NAMES[TEMPO_INDEX], "tempo");
        assert_eq!(FEATURE_NAMES[FEATURE_COUNT - 1], "percussive_ratio");
    }

    #[test]
    fn vector_rejects_wrong_length_and_nan() {
        assert_eq!(
            FeatureVector::from_slice(&[0.0; 88]),
            Err(FeatureError::Length { actual: 88 })
        );
        let mut values = [0.5; FEATURE_COUNT];
        values[30] = f64::NAN;
        assert_eq!(
            FeatureVector::from_slice(&values),
            Err(FeatureError::NonFinite { index: 30 })
        );
    }

    #[test]
    fn vector_serializes_as_a_flat_array() {
        let v = FeatureVector::from_slice(&[1.5; FEATURE_COUNT]).unwrap();
        let json = serde_json::to_string(&v).unwrap();
        let back: FeatureVector = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
        assert!(serde_json::from_str::<FeatureVector>("[1.0, 2.0]").is_err());
    }

    #[test]
    fn empty_and_silent_clips_fail_as_a_whole() {
        let extractor = FeatureExtractor::default();
        assert_eq!(extractor.extract(&[]), Err(FeatureError::Empty));
        assert!(matches!(
            extractor.extract(&vec![0.0; 22_050]),
            Err(FeatureError::Silent { .. })
        ));
        assert!(matches!(
            extractor.extract(&vec![0.0005; 22_050]),
            Err(FeatureError::Silent { .. })
        ));
    }

    #[test]
    fn non_finite_input_is_rejected() {
        let mut clip = sine(440.0, 0.5, 0.5, 22_050);
        clip[100] = f32::NAN;
        assert_eq!(
            FeatureExtractor::default().extract(&clip),
            Err(FeatureError::NonFiniteSample { index: 100 })
        );
    }

    #[test]
    fn tone_produces_complete_finite_vector() {
        let clip = sine(440.0, 0.5, 3.0, 22_050);
        let features = FeatureExtractor::default().extract(&clip).unwrap();
        assert_eq!(features.as_slice().len(), FEATURE_COUNT);
        assert!(features.as_slice().iter().all(|v| v.is_finite()));

        let named: std::collections::HashMap<_, _> = features.named().collect();
        assert!((named["spectral_centroid_mean"] - 440.0).abs() < 150.0);
        assert!(named["rms_mean"] > 0.2 && named["rms_mean"] < 0.4);
        assert!(named["harmonic_ratio"] > named["percussive_ratio"]);
        // 440 Hz is an A.
        assert!((named["chroma_9_mean"] - 1.0).abs() < 0.05);
    }

    #[test]
    fn extraction_is_deterministic() {
        let clip = sine(220.0, 0.3, 1.0, 22_050);
        let extractor = FeatureExtractor::default();
        assert_eq!(extractor.extract(&clip), extractor.extract(&clip));
    }
}

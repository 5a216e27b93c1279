#[cfg(feature = "ffmpeg-sidecar")]
mod ffmpeg;
mod native;

use crate::config::{AnalysisWindow, DecoderKind};
use bytes::Bytes;
use futures::future::BoxFuture;
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "ffmpeg-sidecar")]
pub use self::ffmpeg::FfmpegDecoder;
pub use self::native::SymphoniaDecoder;

const RESAMPLE_CHUNK: usize = 4096;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl PcmFormat {
    pub const fn mono(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: 1,
        }
    }
}

/// Decoded analysis window: mono f32 samples at the window's rate.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PcmClip {
    pub format: PcmFormat,
    pub samples: Vec<f32>,
    pub duration: Duration,
}

impl PcmClip {
    pub fn new(sample_rate: u32, samples: Vec<f32>) -> Self {
        let duration = duration_from_samples(sample_rate, samples.len());
        Self {
            format: PcmFormat::mono(sample_rate),
            samples,
            duration,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("unsupported audio: {0}")]
    Unsupported(String),

    #[error("no audio track found")]
    NoAudioTrack,

    #[error("corrupt audio stream: {0}")]
    Corrupt(String),

    #[error("resampling failed: {0}")]
    Resample(String),

    #[error("decode worker failed: {0}")]
    Worker(String),

    #[error("ffmpeg unavailable: {0}")]
    FfmpegUnavailable(String),

    #[error("ffmpeg failed: {0}")]
    FfmpegFailed(String),

    #[error("invalid pcm output: {0}")]
    InvalidPcm(String),
}

pub type Result<T> = std::result::Result<T, DecodeError>;

pub trait AudioDecoder: Send + Sync {
    /// Decodes `audio` into the first `window.duration_secs` seconds of mono
    /// samples at `window.sample_rate`.
    fn decode(&self, audio: Bytes, window: AnalysisWindow) -> BoxFuture<'_, Result<PcmClip>>;
}

/// The decoder backing `kind`, or `None` when it was compiled out.
pub fn decoder_for(kind: DecoderKind) -> Option<Arc<dyn AudioDecoder>> {
    match kind {
        DecoderKind::Symphonia => Some(Arc::new(SymphoniaDecoder::new())),
        #[cfg(feature = "ffmpeg-sidecar")]
        DecoderKind::Ffmpeg => Some(Arc::new(FfmpegDecoder::new().with_auto_download(true))),
        #[cfg(not(feature = "ffmpeg-sidecar"))]
        DecoderKind::Ffmpeg => None,
    }
}

/// Averages interleaved frames into a single channel.
pub fn mix_to_mono(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    let scale = 1.0 / channels as f32;
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() * scale)
        .collect()
}

fn sinc_resampler(ratio: f64) -> Result<SincFixedIn<f32>> {
    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    SincFixedIn::<f32>::new(ratio, 1.0, params, RESAMPLE_CHUNK, 1)
        .map_err(|e| DecodeError::Resample(e.to_string()))
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

/// Output samples by which the resampler's response lags the input, negative
/// when it leads. Measured on an impulse placed where its resampled position
/// is a whole output sample whenever the rate ratio allows it.
fn resampler_shift(from_hz: u32, to_hz: u32) -> Result<isize> {
    let ratio = f64::from(to_hz) / f64::from(from_hz);
    let period = (from_hz / gcd(from_hz, to_hz)) as usize;
    let at = if period <= RESAMPLE_CHUNK / 2 {
        (RESAMPLE_CHUNK / 2 / period) * period
    } else {
        RESAMPLE_CHUNK / 2
    };

    let mut resampler = sinc_resampler(ratio)?;
    let mut impulse = vec![0.0f32; RESAMPLE_CHUNK];
    impulse[at] = 1.0;
    let mut response = resampler
        .process(&[impulse.as_slice()], None)
        .map_err(|e| DecodeError::Resample(e.to_string()))?
        .swap_remove(0);
    let flushed = resampler
        .process_partial::<&[f32]>(None, None)
        .map_err(|e| DecodeError::Resample(e.to_string()))?;
    response.extend_from_slice(&flushed[0]);

    let peak = response
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
        .map(|(i, _)| i)
        .unwrap_or(0);
    Ok(peak as isize - (at as f64 * ratio).round() as isize)
}

/// Band-limited resampling of a mono signal. The output is aligned with the
/// input (filter delay removed) and holds `ceil(len * to / from)` samples.
pub fn resample_mono(samples: &[f32], from_hz: u32, to_hz: u32) -> Result<Vec<f32>> {
    if from_hz == to_hz || samples.is_empty() {
        return Ok(samples.to_vec());
    }
    if from_hz == 0 || to_hz == 0 {
        return Err(DecodeError::Resample(format!(
            "invalid rates {from_hz} -> {to_hz}"
        )));
    }

    let ratio = f64::from(to_hz) / f64::from(from_hz);
    let shift = resampler_shift(from_hz, to_hz)?;
    let lag = shift.max(0) as usize;
    let lead = shift.min(0).unsigned_abs();
    let mut resampler = sinc_resampler(ratio)?;

    let expected = (samples.len() as f64 * ratio).ceil() as usize;
    let mut out: Vec<f32> = Vec::with_capacity(lead + expected + lag + RESAMPLE_CHUNK);
    // A leading response has already consumed its first outputs; pad them.
    out.resize(lead, 0.0);

    let mut chunks = samples.chunks_exact(RESAMPLE_CHUNK);
    for chunk in chunks.by_ref() {
        let block = resampler
            .process(&[chunk], None)
            .map_err(|e| DecodeError::Resample(e.to_string()))?;
        out.extend_from_slice(&block[0]);
    }
    let tail = chunks.remainder();
    if !tail.is_empty() {
        let block = resampler
            .process_partial(Some(&[tail]), None)
            .map_err(|e| DecodeError::Resample(e.to_string()))?;
        out.extend_from_slice(&block[0]);
    }
    // Flush until the delayed tail has been emitted.
    while out.len() < expected + lag {
        let block = resampler
            .process_partial::<&[f32]>(None, None)
            .map_err(|e| DecodeError::Resample(e.to_string()))?;
        if block[0].is_empty() {
            break;
        }
        out.extend_from_slice(&block[0]);
    }

    let mut aligned = out.split_off(lag.min(out.len()));
    aligned.truncate(expected);
    Ok(aligned)
}

pub fn duration_from_samples(sample_rate_hz: u32, samples: usize) -> Duration {
    if sample_rate_hz == 0 {
        return Duration::from_secs(0);
    }
    let micros = (u128::from(samples as u64) * 1_000_000u128) / u128::from(sample_rate_hz);
    Duration::from_micros(micros.min(u128::from(u64::MAX)) as u64)
}

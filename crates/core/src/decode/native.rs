use super::{mix_to_mono, resample_mono, AudioDecoder, DecodeError, PcmClip, Result};
use crate::config::AnalysisWindow;
use bytes::Bytes;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

const LOG_TARGET: &str = "decode::native";

/// Pure-Rust decoder covering the container/codec set compiled into
/// symphonia (wav, flac, ogg/vorbis, mp3, aac/mp4).
#[derive(Clone, Debug, Default)]
pub struct SymphoniaDecoder {
    extension_hint: Option<String>,
}

impl SymphoniaDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lets the prober try a given container first (e.g. `"mp3"`).
    pub fn with_extension_hint<S: Into<String>>(mut self, ext: S) -> Self {
        self.extension_hint = Some(ext.into());
        self
    }

    pub fn decode_blocking(&self, audio: Bytes, window: AnalysisWindow) -> Result<PcmClip> {
        let (interleaved, source_rate, channels) = self.decode_interleaved(audio, window)?;
        let mono = mix_to_mono(&interleaved, channels);
        let mut samples = resample_mono(&mono, source_rate, window.sample_rate)?;
        samples.truncate(window.max_samples());
        tracing::debug!(
            target: LOG_TARGET,
            source_rate,
            channels,
            samples = samples.len(),
            "decoded clip"
        );
        Ok(PcmClip::new(window.sample_rate, samples))
    }

    fn decode_interleaved(
        &self,
        audio: Bytes,
        window: AnalysisWindow,
    ) -> Result<(Vec<f32>, u32, usize)> {
        let mss = MediaSourceStream::new(Box::new(Cursor::new(audio)), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = self.extension_hint.as_deref() {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| DecodeError::Unsupported(e.to_string()))?;
        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(DecodeError::NoAudioTrack)?;
        let track_id = track.id;
        let source_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| DecodeError::Unsupported("unknown sample rate".to_owned()))?;
        let mut channels = track
            .codec_params
            .channels
            .map(|c| c.count())
            .unwrap_or(1);

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| DecodeError::Unsupported(e.to_string()))?;

        let frame_limit = window.frames_for_sample_rate(source_rate);
        let mut samples: Vec<f32> = Vec::new();
        let mut sample_buf: Option<SampleBuffer<f32>> = None;

        while samples.len() / channels.max(1) < frame_limit {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => return Err(DecodeError::Corrupt(e.to_string())),
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    tracing::warn!(target: LOG_TARGET, error = %e, "skipping undecodable packet");
                    continue;
                }
                Err(e) => return Err(DecodeError::Corrupt(e.to_string())),
            };

            let spec = *decoded.spec();
            channels = spec.channels.count().max(1);
            let needs_alloc = sample_buf
                .as_ref()
                .map_or(true, |b| b.capacity() < decoded.capacity() * channels);
            if needs_alloc {
                sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
            }
            if let Some(buf) = sample_buf.as_mut() {
                buf.copy_interleaved_ref(decoded);
                samples.extend_from_slice(buf.samples());
            }
        }

        samples.truncate(frame_limit.saturating_mul(channels));
        Ok((samples, source_rate, channels))
    }
}

impl AudioDecoder for SymphoniaDecoder {
    fn decode(&self, audio: Bytes, window: AnalysisWindow) -> BoxFuture<'_, Result<PcmClip>> {
        let this = self.clone();
        async move {
            tokio::task::spawn_blocking(move || this.decode_blocking(audio, window))
                .await
                .map_err(|e| DecodeError::Worker(e.to_string()))?
        }
        .boxed()
    }
}

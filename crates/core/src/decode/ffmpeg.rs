use super::{AudioDecoder, DecodeError, PcmClip, Result};
use crate::config::AnalysisWindow;
use bytes::Bytes;
use ffmpeg_sidecar::{download, paths::ffmpeg_path};
use futures::future::BoxFuture;
use futures::FutureExt;

/// Decodes through an `ffmpeg` child process, which covers containers the
/// pure-Rust decoder does not (opus, wma, video files with audio tracks).
#[derive(Clone, Debug, Default)]
pub struct FfmpegDecoder {
    auto_download: bool,
}

impl FfmpegDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a static ffmpeg build on first use when none is installed.
    pub fn with_auto_download(mut self, enabled: bool) -> Self {
        self.auto_download = enabled;
        self
    }

    fn ensure_ffmpeg_available(&self) -> Result<()> {
        if !self.auto_download {
            return Ok(());
        }
        download::auto_download().map_err(|e| DecodeError::FfmpegUnavailable(e.to_string()))
    }

    fn parse_f32le_mono(raw: &[u8]) -> Result<Vec<f32>> {
        if raw.len() % 4 != 0 {
            return Err(DecodeError::InvalidPcm(format!(
                "f32le byte length must be multiple of 4, got {}",
                raw.len()
            )));
        }
        Ok(raw
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }

    fn ffmpeg_args(window: AnalysisWindow) -> Vec<String> {
        [
            "-hide_banner",
            "-nostdin",
            "-loglevel",
            "error",
            "-i",
            "pipe:0",
            "-vn",
            "-sn",
            "-dn",
            "-t",
        ]
        .iter()
        .map(|s| (*s).to_owned())
        .chain([
            window.duration_secs.to_string(),
            "-ac".to_owned(),
            "1".to_owned(),
            "-ar".to_owned(),
            window.sample_rate.to_string(),
            "-f".to_owned(),
            "f32le".to_owned(),
            "-acodec".to_owned(),
            "pcm_f32le".to_owned(),
            "pipe:1".to_owned(),
        ])
        .collect()
    }

    async fn decode_with_ffmpeg(&self, audio: Bytes, window: AnalysisWindow) -> Result<Vec<f32>> {
        let mut child = tokio::process::Command::new(ffmpeg_path())
            .args(Self::ffmpeg_args(window))
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .map_err(|e| DecodeError::FfmpegUnavailable(e.to_string()))?;

        let mut stdin = child.stdin.take().ok_or_else(|| {
            DecodeError::FfmpegFailed("ffmpeg stdin unavailable (pipe not created)".to_owned())
        })?;
        let mut stdout = child.stdout.take().ok_or_else(|| {
            DecodeError::FfmpegFailed("ffmpeg stdout unavailable (pipe not created)".to_owned())
        })?;
        let mut stderr = child.stderr.take().ok_or_else(|| {
            DecodeError::FfmpegFailed("ffmpeg stderr unavailable (pipe not created)".to_owned())
        })?;

        // ffmpeg stops reading once `-t` is reached, so a broken pipe on stdin is expected.
        let stdin_task = tokio::spawn(async move {
            use tokio::io::AsyncWriteExt;
            match stdin.write_all(&audio).await {
                Ok(()) => stdin.shutdown().await,
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
                Err(e) => Err(e),
            }
        });

        let stdout_task = tokio::spawn(async move {
            use tokio::io::AsyncReadExt;
            let mut buf = Vec::new();
            stdout.read_to_end(&mut buf).await?;
            Ok::<Vec<u8>, std::io::Error>(buf)
        });

        let stderr_task = tokio::spawn(async move {
            use tokio::io::AsyncReadExt;
            let mut buf = Vec::new();
            stderr.read_to_end(&mut buf).await?;
            Ok::<Vec<u8>, std::io::Error>(buf)
        });

        let status = child
            .wait()
            .await
            .map_err(|e| DecodeError::FfmpegFailed(e.to_string()))?;

        stdin_task
            .await
            .map_err(|e| DecodeError::Worker(e.to_string()))?
            .map_err(|e| DecodeError::FfmpegFailed(e.to_string()))?;

        let stdout_bytes = stdout_task
            .await
            .map_err(|e| DecodeError::Worker(e.to_string()))?
            .map_err(|e| DecodeError::FfmpegFailed(e.to_string()))?;

        let stderr_bytes = stderr_task
            .await
            .map_err(|e| DecodeError::Worker(e.to_string()))?
            .map_err(|e| DecodeError::FfmpegFailed(e.to_string()))?;

        if !status.success() {
            let stderr_s = String::from_utf8_lossy(&stderr_bytes).trim().to_owned();
            return Err(DecodeError::FfmpegFailed(format!(
                "exit_code={:?} stderr={stderr_s}",
                status.code()
            )));
        }

        Self::parse_f32le_mono(&stdout_bytes)
    }
}

impl AudioDecoder for FfmpegDecoder {
    fn decode(&self, audio: Bytes, window: AnalysisWindow) -> BoxFuture<'_, Result<PcmClip>> {
        async move {
            let this = self.clone();
            tokio::task::spawn_blocking(move || this.ensure_ffmpeg_available())
                .await
                .map_err(|e| DecodeError::Worker(e.to_string()))??;
            let mut samples = self.decode_with_ffmpeg(audio, window).await?;
            samples.truncate(window.max_samples());
            Ok(PcmClip::new(window.sample_rate, samples))
        }
        .boxed()
    }
}

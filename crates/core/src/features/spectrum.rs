//! Short-time Fourier transform on centered, Hann-windowed frames.

use super::FeatureError;
use realfft::num_complex::Complex;
use realfft::RealFftPlanner;

/// Periodic Hann window.
pub fn hann_window(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f64::consts::PI * i as f64 / size as f64).cos())
        .collect()
}

/// Number of centered frames for a signal of `len` samples.
pub fn frame_count(len: usize, hop: usize) -> usize {
    1 + len / hop
}

/// Pads `n_fft / 2` samples on both sides, either with zeros or by repeating
/// the edge samples.
pub fn center_pad(signal: &[f64], n_fft: usize, edge: bool) -> Vec<f64> {
    let pad = n_fft / 2;
    let (first, last) = if edge {
        (
            signal.first().copied().unwrap_or(0.0),
            signal.last().copied().unwrap_or(0.0),
        )
    } else {
        (0.0, 0.0)
    };
    let mut out = Vec::with_capacity(signal.len() + 2 * pad);
    out.resize(pad, first);
    out.extend_from_slice(signal);
    out.resize(signal.len() + 2 * pad, last);
    out
}

/// Complex spectrogram, frame-major: `frames[t][k]` for bin `k` of frame `t`.
#[derive(Clone, Debug)]
pub struct Stft {
    pub n_fft: usize,
    pub hop: usize,
    pub frames: Vec<Vec<Complex<f64>>>,
}

impl Stft {
    pub fn compute(signal: &[f64], n_fft: usize, hop: usize) -> Result<Self, FeatureError> {
        let padded = center_pad(signal, n_fft, false);
        let n_frames = frame_count(signal.len(), hop);
        let window = hann_window(n_fft);

        let mut planner = RealFftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(n_fft);
        let mut scratch = fft.make_scratch_vec();
        let mut frame_buf = fft.make_input_vec();
        let mut spectrum = fft.make_output_vec();

        let mut frames = Vec::with_capacity(n_frames);
        for t in 0..n_frames {
            let start = t * hop;
            for (i, slot) in frame_buf.iter_mut().enumerate() {
                *slot = padded.get(start + i).copied().unwrap_or(0.0) * window[i];
            }
            fft.process_with_scratch(&mut frame_buf, &mut spectrum, &mut scratch)
                .map_err(|e| FeatureError::Fft(e.to_string()))?;
            frames.push(spectrum.clone());
        }

        Ok(Self { n_fft, hop, frames })
    }

    pub fn n_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    pub fn magnitude(&self) -> Vec<Vec<f64>> {
        self.frames
            .iter()
            .map(|f| f.iter().map(|c| c.norm()).collect())
            .collect()
    }

    pub fn power(&self) -> Vec<Vec<f64>> {
        self.frames
            .iter()
            .map(|f| f.iter().map(|c| c.norm_sqr()).collect())
            .collect()
    }

    /// Center frequency of every bin in Hz.
    pub fn bin_frequencies(&self, sample_rate: u32) -> Vec<f64> {
        fft_frequencies(sample_rate, self.n_fft)
    }
}

pub fn fft_frequencies(sample_rate: u32, n_fft: usize) -> Vec<f64> {
    let step = f64::from(sample_rate) / n_fft as f64;
    (0..=n_fft / 2).map(|k| k as f64 * step).collect()
}

/// Inverse STFT by windowed overlap-add, undoing the center padding and
/// returning exactly `length` samples.
pub fn istft(
    frames: &[Vec<Complex<f64>>],
    n_fft: usize,
    hop: usize,
    length: usize,
) -> Result<Vec<f64>, FeatureError> {
    if frames.is_empty() {
        return Ok(vec![0.0; length]);
    }
    let window = hann_window(n_fft);
    let mut planner = RealFftPlanner::<f64>::new();
    let ifft = planner.plan_fft_inverse(n_fft);
    let mut scratch = ifft.make_scratch_vec();
    let mut spectrum = ifft.make_input_vec();
    let mut time_frame = ifft.make_output_vec();

    let out_len = (frames.len() - 1) * hop + n_fft;
    let mut output = vec![0.0f64; out_len];
    let mut window_sum = vec![0.0f64; out_len];
    let scale = 1.0 / n_fft as f64;

    for (t, frame) in frames.iter().enumerate() {
        for (k, slot) in spectrum.iter_mut().enumerate() {
            *slot = frame.get(k).copied().unwrap_or_default();
        }
        // A real signal has purely real DC and Nyquist bins.
        let last = spectrum.len() - 1;
        spectrum[0].im = 0.0;
        spectrum[last].im = 0.0;

        ifft.process_with_scratch(&mut spectrum, &mut time_frame, &mut scratch)
            .map_err(|e| FeatureError::Fft(e.to_string()))?;

        let start = t * hop;
        for i in 0..n_fft {
            output[start + i] += time_frame[i] * scale * window[i];
            window_sum[start + i] += window[i] * window[i];
        }
    }

    for (o, w) in output.iter_mut().zip(&window_sum) {
        if *w > f64::EPSILON {
            *o /= *w;
        }
    }

    let offset = n_fft / 2;
    let mut signal: Vec<f64> = output.into_iter().skip(offset).take(length).collect();
    signal.resize(length, 0.0);
    Ok(signal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(freq: f64, sr: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * std::f64::consts::PI * freq * i as f64 / sr).sin())
            .collect()
    }

    #[test]
    fn frame_count_matches_centered_framing() {
        assert_eq!(frame_count(22_050, 512), 44);
        assert_eq!(frame_count(0, 512), 1);
    }

    #[test]
    fn edge_padding_repeats_boundary_samples() {
        let padded = center_pad(&[1.0, 2.0, 3.0], 4, true);
        assert_eq!(padded, vec![1.0, 1.0, 1.0, 2.0, 3.0, 3.0, 3.0]);
        let zeros = center_pad(&[1.0], 2, false);
        assert_eq!(zeros, vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn tone_energy_peaks_at_its_bin() {
        let sr = 22_050.0;
        let y = tone(1_000.0, sr, 8_192);
        let stft = Stft::compute(&y, 2048, 512).unwrap();
        let mag = stft.magnitude();
        let mid = &mag[mag.len() / 2];
        let peak = mid
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(k, _)| k)
            .unwrap();
        let freqs = stft.bin_frequencies(22_050);
        assert!((freqs[peak] - 1_000.0).abs() < sr / 2048.0);
    }

    #[test]
    fn istft_reconstructs_signal() {
        let y = tone(440.0, 22_050.0, 10_000);
        let stft = Stft::compute(&y, 2048, 512).unwrap();
        let back = istft(&stft.frames, 2048, 512, y.len()).unwrap();
        assert_eq!(back.len(), y.len());
        for i in (0..y.len()).step_by(331) {
            assert!((back[i] - y[i]).abs() < 1e-6, "sample {i}");
        }
    }
}

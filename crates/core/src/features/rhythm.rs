//! Onset envelope and global tempo estimation.

use super::spectrum::hann_window;
use super::FeatureError;
use realfft::num_complex::Complex;
use realfft::RealFftPlanner;

const START_BPM: f64 = 120.0;
const STD_BPM_OCTAVES: f64 = 1.0;
const MAX_TEMPO: f64 = 320.0;
const AUTOCORR_WINDOW_SECS: f64 = 8.0;

/// Mean positive first difference of the log-mel spectrogram across bands,
/// shifted so each value lines up with the frame whose onset it measures.
pub fn onset_strength(log_mel: &[Vec<f64>], n_fft: usize, hop: usize) -> Vec<f64> {
    let n = log_mel.len();
    let offset = 1 + n_fft / (2 * hop);
    let mut env = vec![0.0f64; n];
    for t in 1..n {
        let idx = offset + t - 1;
        if idx >= n {
            break;
        }
        let (prev, cur) = (&log_mel[t - 1], &log_mel[t]);
        let bands = cur.len().max(1) as f64;
        env[idx] = cur
            .iter()
            .zip(prev)
            .map(|(c, p)| (c - p).max(0.0))
            .sum::<f64>()
            / bands;
    }
    env
}

fn autocorrelation_tempogram(
    onset: &[f64],
    win_length: usize,
) -> Result<Vec<f64>, FeatureError> {
    let half = win_length / 2;
    let mut padded = vec![0.0f64; onset.len() + 2 * half];
    padded[half..half + onset.len()].copy_from_slice(onset);

    let window = hann_window(win_length);
    let n = (2 * win_length).next_power_of_two();
    let mut planner = RealFftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n);
    let ifft = planner.plan_fft_inverse(n);
    let mut time_buf = fft.make_input_vec();
    let mut spec = fft.make_output_vec();
    let mut acf = ifft.make_output_vec();
    let mut scratch_fwd = fft.make_scratch_vec();
    let mut scratch_inv = ifft.make_scratch_vec();

    let mut mean = vec![0.0f64; win_length];
    for t in 0..onset.len() {
        time_buf.iter_mut().for_each(|v| *v = 0.0);
        for i in 0..win_length {
            time_buf[i] = padded[t + i] * window[i];
        }
        fft.process_with_scratch(&mut time_buf, &mut spec, &mut scratch_fwd)
            .map_err(|e| FeatureError::Fft(e.to_string()))?;
        spec.iter_mut()
            .for_each(|c| *c = Complex::new(c.norm_sqr(), 0.0));
        ifft.process_with_scratch(&mut spec, &mut acf, &mut scratch_inv)
            .map_err(|e| FeatureError::Fft(e.to_string()))?;

        let peak = acf[0];
        if peak > f64::MIN_POSITIVE {
            for (m, a) in mean.iter_mut().zip(&acf[..win_length]) {
                *m += (a / peak).max(0.0);
            }
        }
    }
    let frames = onset.len().max(1) as f64;
    mean.iter_mut().for_each(|m| *m /= frames);
    Ok(mean)
}

/// Global tempo in BPM from the onset envelope: the autocorrelation lag that
/// best combines periodicity strength with a log-normal prior centered on
/// 120 BPM. A clip with no onsets has tempo 0.
pub fn estimate_tempo(onset: &[f64], sample_rate: u32, hop: usize) -> Result<f64, FeatureError> {
    if onset.iter().all(|&v| v == 0.0) {
        return Ok(0.0);
    }
    let frame_rate = f64::from(sample_rate) / hop as f64;
    let win_length = ((AUTOCORR_WINDOW_SECS * frame_rate).round() as usize).max(2);
    let tempogram = autocorrelation_tempogram(onset, win_length)?;

    let best = (1..win_length)
        .filter_map(|lag| {
            let bpm = 60.0 * frame_rate / lag as f64;
            if bpm > MAX_TEMPO {
                return None;
            }
            let prior = -0.5 * ((bpm.log2() - START_BPM.log2()) / STD_BPM_OCTAVES).powi(2);
            Some((bpm, (1e6 * tempogram[lag]).ln_1p() + prior))
        })
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(bpm, _)| bpm);

    Ok(best.unwrap_or(0.0))
}

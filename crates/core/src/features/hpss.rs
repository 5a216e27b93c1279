//! Harmonic/percussive source separation by median filtering.

use super::spectrum::{istft, Stft};
use super::FeatureError;
use realfft::num_complex::Complex;

const KERNEL: usize = 31;
const MASK_POWER: i32 = 2;
const RATIO_EPS: f64 = 1e-6;

/// Maps an out-of-range index back into `0..len` by mirroring around the
/// edges, including the edge sample (`d c b a | a b c d | d c b a`).
fn reflect(index: isize, len: usize) -> usize {
    let n = len as isize;
    let mut i = index;
    loop {
        if i < 0 {
            i = -i - 1;
        } else if i >= n {
            i = 2 * n - i - 1;
        } else {
            return i as usize;
        }
    }
}

fn median_filter(values: &[f64], kernel: usize) -> Vec<f64> {
    let len = values.len();
    if len == 0 {
        return Vec::new();
    }
    let half = (kernel / 2) as isize;
    let mut window = Vec::with_capacity(kernel);
    (0..len as isize)
        .map(|center| {
            window.clear();
            window.extend((center - half..=center + half).map(|i| values[reflect(i, len)]));
            let mid = window.len() / 2;
            let (_, median, _) = window.select_nth_unstable_by(mid, f64::total_cmp);
            *median
        })
        .collect()
}

/// Harmonic share of each bin: `h^p / (h^p + p^p)`, zero where both are zero.
fn soft_mask(target: f64, other: f64) -> f64 {
    let z = target.max(other);
    if z < f64::MIN_POSITIVE {
        return 0.0;
    }
    let t = (target / z).powi(MASK_POWER);
    let o = (other / z).powi(MASK_POWER);
    t / (t + o)
}

/// Mean absolute amplitude of the harmonic and percussive components,
/// each relative to the mean absolute amplitude of the full signal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SourceRatios {
    pub harmonic: f64,
    pub percussive: f64,
}

pub fn separate(y: &[f64], stft: &Stft) -> Result<(Vec<f64>, Vec<f64>), FeatureError> {
    let magnitude = stft.magnitude();
    let n_frames = magnitude.len();
    let n_bins = stft.n_bins();

    // Harmonic: smooth each bin across time.
    let mut harmonic = vec![vec![0.0f64; n_bins]; n_frames];
    let mut track = Vec::with_capacity(n_frames);
    for k in 0..n_bins {
        track.clear();
        track.extend(magnitude.iter().map(|frame| frame[k]));
        for (t, v) in median_filter(&track, KERNEL).into_iter().enumerate() {
            harmonic[t][k] = v;
        }
    }
    // Percussive: smooth each frame across frequency.
    let percussive: Vec<Vec<f64>> = magnitude.iter().map(|f| median_filter(f, KERNEL)).collect();

    let mut harm_frames = Vec::with_capacity(n_frames);
    let mut perc_frames = Vec::with_capacity(n_frames);
    for (t, frame) in stft.frames.iter().enumerate() {
        let (h, p) = (&harmonic[t], &percussive[t]);
        harm_frames.push(
            frame
                .iter()
                .enumerate()
                .map(|(k, c)| *c * soft_mask(h[k], p[k]))
                .collect::<Vec<Complex<f64>>>(),
        );
        perc_frames.push(
            frame
                .iter()
                .enumerate()
                .map(|(k, c)| *c * soft_mask(p[k], h[k]))
                .collect::<Vec<Complex<f64>>>(),
        );
    }

    let y_harm = istft(&harm_frames, stft.n_fft, stft.hop, y.len())?;
    let y_perc = istft(&perc_frames, stft.n_fft, stft.hop, y.len())?;
    Ok((y_harm, y_perc))
}

fn mean_abs(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|v| v.abs()).sum::<f64>() / values.len() as f64
}

pub fn source_ratios(y: &[f64], stft: &Stft) -> Result<SourceRatios, FeatureError> {
    let (y_harm, y_perc) = separate(y, stft)?;
    let denom = mean_abs(y) + RATIO_EPS;
    Ok(SourceRatios {
        harmonic: mean_abs(&y_harm) / denom,
        percussive: mean_abs(&y_perc) / denom,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflect_mirrors_including_edge() {
        assert_eq!(reflect(-1, 4), 0);
        assert_eq!(reflect(-2, 4), 1);
        assert_eq!(reflect(4, 4), 3);
        assert_eq!(reflect(5, 4), 2);
        assert_eq!(reflect(-7, 2), 1);
    }

    #[test]
    fn median_filter_removes_isolated_spike() {
        let mut v = vec![1.0; 50];
        v[20] = 100.0;
        let out = median_filter(&v, KERNEL);
        assert!(out.iter().all(|&x| x == 1.0));
    }

    #[test]
    fn soft_masks_are_complementary() {
        let (h, p) = (3.0, 1.0);
        assert!((soft_mask(h, p) + soft_mask(p, h) - 1.0).abs() < 1e-12);
        assert!((soft_mask(h, p) - 0.9).abs() < 1e-12);
        assert_eq!(soft_mask(0.0, 0.0), 0.0);
    }

    #[test]
    fn steady_tone_is_mostly_harmonic() {
        let sr = 22_050.0;
        let y: Vec<f64> = (0..sr as usize * 2)
            .map(|i| 0.5 * (2.0 * std::f64::consts::PI * 440.0 * i as f64 / sr).sin())
            .collect();
        let stft = Stft::compute(&y, 2048, 512).unwrap();
        let ratios = source_ratios(&y, &stft).unwrap();
        assert!(ratios.harmonic > 0.8, "{ratios:?}");
        assert!(ratios.percussive < 0.2, "{ratios:?}");
    }

    #[test]
    fn sparse_clicks_are_mostly_percussive() {
        let mut y = vec![0.0f64; 22_050 * 2];
        for i in (0..y.len()).step_by(5_000) {
            y[i] = 1.0;
        }
        let stft = Stft::compute(&y, 2048, 512).unwrap();
        let ratios = source_ratios(&y, &stft).unwrap();
        assert!(ratios.percussive > ratios.harmonic, "{ratios:?}");
    }

    #[test]
    fn silence_gives_zero_ratios() {
        let y = vec![0.0f64; 4_096];
        let stft = Stft::compute(&y, 2048, 512).unwrap();
        let ratios = source_ratios(&y, &stft).unwrap();
        assert_eq!(ratios, SourceRatios { harmonic: 0.0, percussive: 0.0 });
    }
}

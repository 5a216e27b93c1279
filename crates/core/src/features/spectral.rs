use super::filters::power_to_db;

pub const CONTRAST_BANDS: usize = 6;
const CONTRAST_FMIN: f64 = 200.0;
const CONTRAST_QUANTILE: f64 = 0.02;
const ROLLOFF_PERCENT: f64 = 0.85;

/// Centroid, bandwidth and rolloff tracks computed in one pass over a
/// magnitude spectrogram.
#[derive(Clone, Debug, Default)]
pub struct SpectralShape {
    pub centroid: Vec<f64>,
    pub bandwidth: Vec<f64>,
    pub rolloff: Vec<f64>,
}

impl SpectralShape {
    pub fn compute(magnitude: &[Vec<f64>], freqs: &[f64]) -> Self {
        let mut shape = Self {
            centroid: Vec::with_capacity(magnitude.len()),
            bandwidth: Vec::with_capacity(magnitude.len()),
            rolloff: Vec::with_capacity(magnitude.len()),
        };
        for frame in magnitude {
            let total: f64 = frame.iter().sum();
            if total <= 0.0 {
                shape.centroid.push(0.0);
                shape.bandwidth.push(0.0);
                shape.rolloff.push(0.0);
                continue;
            }

            let centroid = frame.iter().zip(freqs).map(|(m, f)| m * f).sum::<f64>() / total;
            let spread = frame
                .iter()
                .zip(freqs)
                .map(|(m, f)| (m / total) * (f - centroid).powi(2))
                .sum::<f64>();

            let threshold = ROLLOFF_PERCENT * total;
            let mut cumulative = 0.0;
            let mut rolloff = freqs.last().copied().unwrap_or(0.0);
            for (m, f) in frame.iter().zip(freqs) {
                cumulative += m;
                if cumulative >= threshold {
                    rolloff = *f;
                    break;
                }
            }

            shape.centroid.push(centroid);
            shape.bandwidth.push(spread.sqrt());
            shape.rolloff.push(rolloff);
        }
        shape
    }
}

/// Bin ranges of the octave sub-bands, one slot per contrast row: `[0, fmin)`,
/// then one octave each. A band with no bins below Nyquist is `None`, and the
/// highest band that has bins is extended to Nyquist. Each band after the
/// first also borrows the bin just below its lower edge.
fn contrast_bands(freqs: &[f64]) -> Vec<Option<(usize, usize)>> {
    let mut edges = vec![0.0];
    edges.extend((0..=CONTRAST_BANDS).map(|k| CONTRAST_FMIN * 2f64.powi(k as i32)));

    let mut bands: Vec<Option<(usize, usize)>> = (0..=CONTRAST_BANDS)
        .map(|k| {
            let (lo_hz, hi_hz) = (edges[k], edges[k + 1]);
            let first = freqs.iter().position(|&f| f >= lo_hz)?;
            let last = freqs.iter().rposition(|&f| f <= hi_hz)?;
            if last < first {
                return None;
            }
            let start = if k > 0 { first.saturating_sub(1) } else { first };
            Some((start, last + 1))
        })
        .collect();
    if let Some(top) = bands.iter_mut().rev().find_map(Option::as_mut) {
        top.1 = freqs.len();
    }
    bands
}

/// Peak-to-valley contrast in dB for `CONTRAST_BANDS + 1` bands, returned
/// frame-major (`out[t][band]`). Rows of bands above Nyquist stay 0.
pub fn spectral_contrast(magnitude: &[Vec<f64>], freqs: &[f64]) -> Vec<Vec<f64>> {
    let n_rows = CONTRAST_BANDS + 1;
    let bands = contrast_bands(freqs);
    let top = bands.iter().rposition(Option::is_some);
    let n_frames = magnitude.len();
    let mut rows = vec![vec![0.0f64; n_frames]; n_rows];

    for (k, band) in bands.iter().enumerate() {
        let Some((start, end)) = *band else {
            continue;
        };
        let band_bins = end - start;
        // All but the top band drop their highest bin from the statistics.
        let used = if Some(k) == top { band_bins } else { band_bins.saturating_sub(1) };
        if used == 0 {
            continue;
        }
        let q = ((CONTRAST_QUANTILE * band_bins as f64).round() as usize).max(1).min(used);

        let mut peaks = Vec::with_capacity(n_frames);
        let mut valleys = Vec::with_capacity(n_frames);
        let mut sorted = Vec::with_capacity(used);
        for frame in magnitude {
            sorted.clear();
            sorted.extend_from_slice(&frame[start..start + used]);
            sorted.sort_by(f64::total_cmp);
            valleys.push(sorted[..q].iter().sum::<f64>() / q as f64);
            peaks.push(sorted[used - q..].iter().sum::<f64>() / q as f64);
        }
        power_to_db(&mut peaks, 80.0);
        power_to_db(&mut valleys, 80.0);
        for (t, (p, v)) in peaks.iter().zip(&valleys).enumerate() {
            rows[k][t] = p - v;
        }
    }

    (0..n_frames)
        .map(|t| rows.iter().map(|r| r[t]).collect())
        .collect()
}

//! Filterbanks and transforms shared by the timbre, tonal and rhythm groups.
//!
//! The mel scale is the Slaney variant (linear below 1 kHz, logarithmic
//! above) with area-normalized triangles; the chroma bank places Gaussian
//! bumps on each pitch class, weighted by octave around C5, with C first.

use super::spectrum::fft_frequencies;

const MEL_F_SP: f64 = 200.0 / 3.0;
const MEL_MIN_LOG_HZ: f64 = 1_000.0;
const MEL_MIN_LOG_MEL: f64 = MEL_MIN_LOG_HZ / MEL_F_SP;
const AMIN: f64 = 1e-10;

fn mel_logstep() -> f64 {
    6.4f64.ln() / 27.0
}

pub fn hz_to_mel(hz: f64) -> f64 {
    if hz >= MEL_MIN_LOG_HZ {
        MEL_MIN_LOG_MEL + (hz / MEL_MIN_LOG_HZ).ln() / mel_logstep()
    } else {
        hz / MEL_F_SP
    }
}

pub fn mel_to_hz(mel: f64) -> f64 {
    if mel >= MEL_MIN_LOG_MEL {
        MEL_MIN_LOG_HZ * (mel_logstep() * (mel - MEL_MIN_LOG_MEL)).exp()
    } else {
        mel * MEL_F_SP
    }
}

/// Dense `n_rows x n_bins` weight matrix applied to each spectrum frame.
#[derive(Clone, Debug)]
pub struct Filterbank {
    weights: Vec<Vec<f64>>,
}

impl Filterbank {
    #[cfg(test)]
    pub fn rows(&self) -> usize {
        self.weights.len()
    }

    #[cfg(test)]
    pub fn weights(&self) -> &[Vec<f64>] {
        &self.weights
    }

    pub fn apply(&self, frame: &[f64]) -> Vec<f64> {
        self.weights
            .iter()
            .map(|row| row.iter().zip(frame).map(|(w, x)| w * x).sum())
            .collect()
    }

    pub fn apply_all(&self, frames: &[Vec<f64>]) -> Vec<Vec<f64>> {
        frames.iter().map(|f| self.apply(f)).collect()
    }

    /// Triangular mel filters spanning 0 Hz to Nyquist.
    pub fn mel(sample_rate: u32, n_fft: usize, n_mels: usize) -> Self {
        let fftfreqs = fft_frequencies(sample_rate, n_fft);
        let fmax = f64::from(sample_rate) / 2.0;
        let (mel_lo, mel_hi) = (hz_to_mel(0.0), hz_to_mel(fmax));
        let mel_f: Vec<f64> = (0..n_mels + 2)
            .map(|i| mel_to_hz(mel_lo + (mel_hi - mel_lo) * i as f64 / (n_mels + 1) as f64))
            .collect();

        let weights = (0..n_mels)
            .map(|i| {
                let (lo, center, hi) = (mel_f[i], mel_f[i + 1], mel_f[i + 2]);
                let enorm = 2.0 / (hi - lo);
                fftfreqs
                    .iter()
                    .map(|&f| {
                        let lower = (f - lo) / (center - lo);
                        let upper = (hi - f) / (hi - center);
                        lower.min(upper).max(0.0) * enorm
                    })
                    .collect()
            })
            .collect();
        Self { weights }
    }

    /// Pitch-class filters, one row per chroma bin starting at C.
    pub fn chroma(sample_rate: u32, n_fft: usize, n_chroma: usize) -> Self {
        const CENTER_OCTAVE: f64 = 5.0;
        const OCTAVE_WIDTH: f64 = 2.0;
        let nc = n_chroma as f64;

        // Fractional chroma position of every FFT bin; the DC bin is given a
        // position far below the first octave so it gets negligible weight.
        let step = f64::from(sample_rate) / n_fft as f64;
        let mut frqbins = Vec::with_capacity(n_fft);
        for k in 1..n_fft {
            let hz = k as f64 * step;
            frqbins.push(nc * (hz / (440.0 / 16.0)).log2());
        }
        frqbins.insert(0, frqbins[0] - 1.5 * nc);

        let mut binwidths: Vec<f64> = frqbins.windows(2).map(|w| (w[1] - w[0]).max(1.0)).collect();
        binwidths.push(1.0);

        let half = (nc / 2.0).round();
        let n_bins = n_fft / 2 + 1;
        let mut raw = vec![vec![0.0f64; n_fft]; n_chroma];
        for (k, (&fb, &bw)) in frqbins.iter().zip(&binwidths).enumerate() {
            let mut col_norm = 0.0;
            for (c, row) in raw.iter_mut().enumerate() {
                let d = (fb - c as f64 + half + 10.0 * nc).rem_euclid(nc) - half;
                let w = (-0.5 * (2.0 * d / bw).powi(2)).exp();
                row[k] = w;
                col_norm += w * w;
            }
            let col_norm = col_norm.sqrt();
            let octave_weight =
                (-0.5 * ((fb / nc - CENTER_OCTAVE) / OCTAVE_WIDTH).powi(2)).exp();
            for row in raw.iter_mut() {
                if col_norm > 0.0 {
                    row[k] /= col_norm;
                }
                row[k] *= octave_weight;
            }
        }

        // Rows are indexed from A; rotate so that C comes first.
        let shift = 3 * (n_chroma / 12);
        let weights = (0..n_chroma)
            .map(|c| raw[(c + shift) % n_chroma][..n_bins].to_vec())
            .collect();
        Self { weights }
    }
}

/// Converts power values to decibels in place (ref 1.0, amin 1e-10) and
/// floors everything at `top_db` below the maximum.
pub fn power_to_db(values: &mut [f64], top_db: f64) {
    let mut max = f64::NEG_INFINITY;
    for v in values.iter_mut() {
        *v = 10.0 * v.max(AMIN).log10();
        max = max.max(*v);
    }
    let floor = max - top_db;
    for v in values.iter_mut() {
        *v = v.max(floor);
    }
}

/// Same as [`power_to_db`] but with the floor taken over a whole matrix.
pub fn power_to_db_matrix(frames: &mut [Vec<f64>], top_db: f64) {
    let mut max = f64::NEG_INFINITY;
    for v in frames.iter_mut().flat_map(|f| f.iter_mut()) {
        *v = 10.0 * v.max(AMIN).log10();
        max = max.max(*v);
    }
    let floor = max - top_db;
    for v in frames.iter_mut().flat_map(|f| f.iter_mut()) {
        *v = v.max(floor);
    }
}

/// Orthonormal DCT-II basis truncated to the first `n_out` coefficients.
#[derive(Clone, Debug)]
pub struct Dct {
    basis: Vec<Vec<f64>>,
}

impl Dct {
    pub fn new(n_in: usize, n_out: usize) -> Self {
        let n = n_in as f64;
        let basis = (0..n_out)
            .map(|k| {
                let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
                (0..n_in)
                    .map(|i| {
                        scale
                            * (std::f64::consts::PI * k as f64 * (2.0 * i as f64 + 1.0) / (2.0 * n))
                                .cos()
                    })
                    .collect()
            })
            .collect();
        Self { basis }
    }

    pub fn apply(&self, input: &[f64]) -> Vec<f64> {
        self.basis
            .iter()
            .map(|row| row.iter().zip(input).map(|(b, x)| b * x).sum())
            .collect()
    }
}

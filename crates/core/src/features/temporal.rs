use super::spectrum::{center_pad, frame_count};

/// Magnitudes at or below this are treated as exact zeros when counting sign
/// changes, so numerical noise around silence is not read as crossings.
const ZERO_THRESHOLD: f64 = 1e-10;

/// Fraction of sign changes per frame. Frames are centered with edge padding;
/// zero counts as positive.
pub fn zero_crossing_rate(y: &[f64], frame_length: usize, hop: usize) -> Vec<f64> {
    let padded = center_pad(y, frame_length, true);
    let negative: Vec<bool> = padded
        .iter()
        .map(|&s| s.abs() > ZERO_THRESHOLD && s < 0.0)
        .collect();

    (0..frame_count(y.len(), hop))
        .map(|t| {
            let start = t * hop;
            let end = (start + frame_length).min(negative.len());
            let crossings = negative[start..end]
                .windows(2)
                .filter(|w| w[0] != w[1])
                .count();
            crossings as f64 / frame_length as f64
        })
        .collect()
}

/// Root-mean-square energy per zero-padded centered frame.
pub fn rms(y: &[f64], frame_length: usize, hop: usize) -> Vec<f64> {
    let padded = center_pad(y, frame_length, false);
    (0..frame_count(y.len(), hop))
        .map(|t| {
            let start = t * hop;
            let end = (start + frame_length).min(padded.len());
            let energy: f64 = padded[start..end].iter().map(|s| s * s).sum();
            (energy / frame_length as f64).sqrt()
        })
        .collect()
}

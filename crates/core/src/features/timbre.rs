use super::filters::{power_to_db_matrix, Dct, Filterbank};

pub const N_MFCC: usize = 13;

/// Log-power mel spectrogram (dB, 80 dB dynamic range), frame-major.
pub fn log_mel(power: &[Vec<f64>], mel: &Filterbank) -> Vec<Vec<f64>> {
    let mut mel_power = mel.apply_all(power);
    power_to_db_matrix(&mut mel_power, 80.0);
    mel_power
}

/// First `N_MFCC` cepstral coefficients of every log-mel frame.
pub fn mfcc(log_mel: &[Vec<f64>], dct: &Dct) -> Vec<Vec<f64>> {
    log_mel.iter().map(|frame| dct.apply(frame)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_log_mel_only_has_c0() {
        let dct = Dct::new(128, N_MFCC);
        let frames = vec![vec![-20.0; 128]; 3];
        let coeffs = mfcc(&frames, &dct);
        assert_eq!(coeffs.len(), 3);
        assert!(coeffs[0][0] < 0.0);
        assert!(coeffs[0][1..].iter().all(|c| c.abs() < 1e-9));
    }

    #[test]
    fn log_mel_is_bounded_by_top_db() {
        let mel = Filterbank::mel(22_050, 2048, 128);
        let mut frame = vec![0.0; 1025];
        frame[100] = 1.0;
        let lm = log_mel(&[frame], &mel);
        let max = lm[0].iter().cloned().fold(f64::MIN, f64::max);
        let min = lm[0].iter().cloned().fold(f64::MAX, f64::min);
        assert!(max - min <= 80.0 + 1e-9);
    }
}

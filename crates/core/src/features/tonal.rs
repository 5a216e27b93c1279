use super::filters::Filterbank;

pub const N_CHROMA: usize = 12;
pub const N_TONNETZ: usize = 6;

/// Pitch-class energy per frame, each frame scaled so its strongest class is 1.
pub fn chroma(power: &[Vec<f64>], bank: &Filterbank) -> Vec<Vec<f64>> {
    power
        .iter()
        .map(|frame| {
            let mut c = bank.apply(frame);
            let max = c.iter().fold(0.0f64, |m, v| m.max(v.abs()));
            if max > f64::MIN_POSITIVE {
                c.iter_mut().for_each(|v| *v /= max);
            }
            c
        })
        .collect()
}

/// Projection basis onto the tonal centroid space: circle of fifths, minor
/// thirds and major thirds as (x, y) pairs.
fn tonnetz_basis() -> [[f64; N_CHROMA]; N_TONNETZ] {
    const SCALE: [f64; N_TONNETZ] = [7.0 / 6.0, 7.0 / 6.0, 3.0 / 2.0, 3.0 / 2.0, 2.0 / 3.0, 2.0 / 3.0];
    const RADIUS: [f64; N_TONNETZ] = [1.0, 1.0, 1.0, 1.0, 0.5, 0.5];
    let mut basis = [[0.0; N_CHROMA]; N_TONNETZ];
    for (r, row) in basis.iter_mut().enumerate() {
        for (k, v) in row.iter_mut().enumerate() {
            let mut angle = SCALE[r] * k as f64;
            if r % 2 == 0 {
                angle -= 0.5;
            }
            *v = RADIUS[r] * (std::f64::consts::PI * angle).cos();
        }
    }
    basis
}

/// 6-D tonal centroid of each L1-normalized chroma frame.
pub fn tonnetz(chroma: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let basis = tonnetz_basis();
    chroma
        .iter()
        .map(|frame| {
            let l1: f64 = frame.iter().map(|v| v.abs()).sum();
            let norm = if l1 > f64::MIN_POSITIVE { l1 } else { 1.0 };
            basis
                .iter()
                .map(|row| row.iter().zip(frame).map(|(b, c)| b * c / norm).sum())
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chroma_frames_peak_at_one() {
        let bank = Filterbank::chroma(22_050, 2048, N_CHROMA);
        let mut frame = vec![0.0; 1025];
        frame[41] = 5.0;
        let c = chroma(&[frame], &bank);
        let max = c[0].iter().cloned().fold(f64::MIN, f64::max);
        assert!((max - 1.0).abs() < 1e-12);
        assert_eq!(
            c[0].iter().position(|&v| v == max),
            Some(9),
            "bin 41 (~441 Hz) is an A"
        );
    }

    #[test]
    fn silent_chroma_stays_zero() {
        let bank = Filterbank::chroma(22_050, 2048, N_CHROMA);
        let c = chroma(&[vec![0.0; 1025]], &bank);
        assert!(c[0].iter().all(|&v| v == 0.0));
        let t = tonnetz(&c);
        assert!(t[0].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn single_pitch_class_lands_on_unit_circles() {
        let mut frame = vec![0.0; N_CHROMA];
        frame[0] = 1.0;
        let t = tonnetz(&[frame]);
        let fifths = (t[0][0].powi(2) + t[0][1].powi(2)).sqrt();
        let major_thirds = (t[0][4].powi(2) + t[0][5].powi(2)).sqrt();
        assert!((fifths - 1.0).abs() < 1e-12);
        assert!((major_thirds - 0.5).abs() < 1e-12);
    }
}

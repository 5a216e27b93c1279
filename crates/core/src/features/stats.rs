//! Summary statistics over per-frame feature tracks.

/// Mean and population standard deviation (ddof = 0). Empty input yields zeros.
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

/// Per-dimension mean/std of a frame-major matrix (`frames[t][d]`).
pub fn column_mean_std(frames: &[Vec<f64>], dims: usize) -> (Vec<f64>, Vec<f64>) {
    let mut means = Vec::with_capacity(dims);
    let mut stds = Vec::with_capacity(dims);
    let mut column = Vec::with_capacity(frames.len());
    for d in 0..dims {
        column.clear();
        column.extend(frames.iter().map(|f| f.get(d).copied().unwrap_or(0.0)));
        let (m, s) = mean_std(&column);
        means.push(m);
        stds.push(s);
    }
    (means, stds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn population_std() {
        let (m, s) = mean_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((m - 5.0).abs() < 1e-12);
        assert!((s - 2.0).abs() < 1e-12);
    }

    #[test]
    fn empty_is_zero() {
        assert_eq!(mean_std(&[]), (0.0, 0.0));
    }

    #[test]
    fn columns_are_independent() {
        let frames = vec![vec![1.0, 10.0], vec![3.0, 10.0]];
        let (m, s) = column_mean_std(&frames, 2);
        assert_eq!(m, vec![2.0, 10.0]);
        assert_eq!(s, vec![1.0, 0.0]);
    }
}

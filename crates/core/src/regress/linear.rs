use super::{MoodModel, ModelLoadError};
use crate::features::FeatureVector;
use serde::{Deserialize, Serialize};

/// `intercept + Σ coefficients[i] · x[i]`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LinearModel {
    pub n_features: usize,
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearModel {
    pub fn validate(&self) -> Result<(), ModelLoadError> {
        if self.coefficients.len() != self.n_features {
            return Err(ModelLoadError::CoefficientCount {
                expected: self.n_features,
                actual: self.coefficients.len(),
            });
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ModelLoadError::NonFiniteParameter);
        }
        Ok(())
    }
}

impl MoodModel for LinearModel {
    fn predict(&self, features: &FeatureVector) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(features.as_slice())
                .map(|(c, x)| c * x)
                .sum::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FEATURE_COUNT;

    #[test]
    fn weighted_sum_plus_intercept() {
        let mut coefficients = vec![0.0; FEATURE_COUNT];
        coefficients[1] = 2.0;
        coefficients[88] = -1.0;
        let model = LinearModel {
            n_features: FEATURE_COUNT,
            intercept: 0.25,
            coefficients,
        };
        model.validate().unwrap();
        let mut values = [0.0; FEATURE_COUNT];
        values[1] = 0.5;
        values[88] = 0.25;
        let x = FeatureVector::from_slice(&values).unwrap();
        assert!((model.predict(&x) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn coefficient_count_must_match() {
        let model = LinearModel {
            n_features: FEATURE_COUNT,
            intercept: 0.0,
            coefficients: vec![0.0; 3],
        };
        assert!(matches!(
            model.validate(),
            Err(ModelLoadError::CoefficientCount { expected: 89, actual: 3 })
        ));
    }
}

use super::{MoodModel, ModelLoadError};
use crate::features::FeatureVector;
use serde::{Deserialize, Serialize};

/// Marks a leaf in `children_left` / `children_right`.
pub const TREE_LEAF: i64 = -1;

/// One regression tree in flattened array form: node `i` splits on
/// `feature[i]` at `threshold[i]` and holds `value[i]` when it is a leaf.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DecisionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<f64>,
}

impl DecisionTree {
    pub fn node_count(&self) -> usize {
        self.value.len()
    }

    fn validate(&self, tree: usize, n_features: usize) -> Result<(), ModelLoadError> {
        let invalid = |reason: String| ModelLoadError::InvalidTree { tree, reason };
        let n = self.value.len();
        if n == 0 {
            return Err(invalid("tree has no nodes".into()));
        }
        let lengths = [
            self.children_left.len(),
            self.children_right.len(),
            self.feature.len(),
            self.threshold.len(),
        ];
        if lengths.iter().any(|&len| len != n) {
            return Err(invalid(format!(
                "array lengths disagree: {lengths:?} vs {n} values"
            )));
        }

        for node in 0..n {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left == TREE_LEAF || right == TREE_LEAF {
                if left != right {
                    return Err(invalid(format!("node {node} has a single child")));
                }
                if !self.value[node].is_finite() {
                    return Err(invalid(format!("leaf {node} has a non-finite value")));
                }
                continue;
            }
            for child in [left, right] {
                // Children always come after their parent, so descent terminates.
                if child <= node as i64 || child >= n as i64 {
                    return Err(invalid(format!("node {node} has child {child} out of order")));
                }
            }
            let feature = self.feature[node];
            if feature < 0 || feature >= n_features as i64 {
                return Err(invalid(format!("node {node} splits on feature {feature}")));
            }
            if self.threshold[node].is_nan() {
                return Err(invalid(format!("node {node} has a NaN threshold")));
            }
        }
        Ok(())
    }

    /// Walks from the root to a leaf. Malformed arrays yield NaN.
    pub fn predict(&self, x: &[f64]) -> f64 {
        let mut node = 0usize;
        for _ in 0..=self.node_count() {
            let (Some(&left), Some(&right)) =
                (self.children_left.get(node), self.children_right.get(node))
            else {
                return f64::NAN;
            };
            if left == TREE_LEAF {
                return self.value.get(node).copied().unwrap_or(f64::NAN);
            }
            let feature = self.feature.get(node).copied().unwrap_or(-1);
            let (Some(&value), Some(&threshold)) = (
                usize::try_from(feature).ok().and_then(|f| x.get(f)),
                self.threshold.get(node),
            ) else {
                return f64::NAN;
            };
            let next = if value <= threshold { left } else { right };
            node = match usize::try_from(next) {
                Ok(next) => next,
                Err(_) => return f64::NAN,
            };
        }
        f64::NAN
    }
}

/// Tree ensemble averaged over its members.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ForestModel {
    pub n_features: usize,
    pub trees: Vec<DecisionTree>,
}

impl ForestModel {
    pub fn validate(&self) -> Result<(), ModelLoadError> {
        if self.trees.is_empty() {
            return Err(ModelLoadError::EmptyForest);
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(i, self.n_features)?;
        }
        Ok(())
    }
}

impl MoodModel for ForestModel {
    fn predict(&self, features: &FeatureVector) -> f64 {
        if self.trees.is_empty() {
            return f64::NAN;
        }
        let x = features.as_slice();
        let sum: f64 = self.trees.iter().map(|t| t.predict(x)).sum();
        sum / self.trees.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FEATURE_COUNT;

    /// Splits on `feature` at 0.5.
    fn stump(feature: i64, low: f64, high: f64) -> DecisionTree {
        DecisionTree {
            children_left: vec![1, -1, -1],
            children_right: vec![2, -1, -1],
            feature: vec![feature, -2, -2],
            threshold: vec![0.5, -2.0, -2.0],
            value: vec![0.5, low, high],
        }
    }

    fn features_with(first: f64) -> FeatureVector {
        let mut values = [0.0; FEATURE_COUNT];
        values[0] = first;
        FeatureVector::from_slice(&values).unwrap()
    }

    #[test]
    fn stump_goes_left_on_equal() {
        let tree = stump(0, 0.2, 0.8);
        assert_eq!(tree.predict(features_with(0.5).as_slice()), 0.2);
        assert_eq!(tree.predict(features_with(0.51).as_slice()), 0.8);
    }

    #[test]
    fn forest_averages_trees() {
        let forest = ForestModel {
            n_features: FEATURE_COUNT,
            trees: vec![stump(0, 0.2, 0.8), stump(0, 0.4, 1.0)],
        };
        forest.validate().unwrap();
        assert!((forest.predict(&features_with(0.0)) - 0.3).abs() < 1e-12);
        assert!((forest.predict(&features_with(1.0)) - 0.9).abs() < 1e-12);
    }

    #[test]
    fn backward_child_is_rejected() {
        let mut tree = stump(0, 0.2, 0.8);
        tree.children_right[0] = 0;
        let forest = ForestModel {
            n_features: FEATURE_COUNT,
            trees: vec![tree],
        };
        assert!(matches!(
            forest.validate(),
            Err(ModelLoadError::InvalidTree { tree: 0, .. })
        ));
    }

    #[test]
    fn split_feature_must_exist() {
        let forest = ForestModel {
            n_features: FEATURE_COUNT,
            trees: vec![stump(FEATURE_COUNT as i64, 0.2, 0.8)],
        };
        assert!(forest.validate().is_err());
    }

    #[test]
    fn mismatched_arrays_are_rejected() {
        let mut tree = stump(0, 0.2, 0.8);
        tree.threshold.pop();
        assert!(tree.validate(0, FEATURE_COUNT).is_err());
    }

    #[test]
    fn unvalidated_cycle_yields_nan_instead_of_looping() {
        let tree = DecisionTree {
            children_left: vec![0],
            children_right: vec![0],
            feature: vec![0],
            threshold: vec![0.5],
            value: vec![0.1],
        };
        assert!(tree.predict(features_with(0.0).as_slice()).is_nan());
    }
}

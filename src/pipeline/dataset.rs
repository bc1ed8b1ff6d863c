//! Validated training data for binary classification

use std::collections::HashSet;

use log::warn;

use super::error::ValidationError;

/// Name of the all-ones column that carries the intercept
pub const INTERCEPT_NAME: &str = "(Intercept)";

/// Training data for a binary classification problem.
///
/// `X` is stored row-major (N rows of P values). Column order matches
/// `variable_names`, and every later component relies on that alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    x: Vec<f64>,
    y: Vec<i8>,
    variable_names: Vec<String>,
    outcome_name: Option<String>,
    sample_weights: Option<Vec<f64>>,
    n_samples: usize,
    n_variables: usize,
}

impl Dataset {
    /// Build a dataset from feature rows, labels and column names.
    ///
    /// Labels are given as `f64` and must be exactly -1 or +1.
    pub fn new(
        x_rows: Vec<Vec<f64>>,
        y: Vec<f64>,
        variable_names: Vec<String>,
        outcome_name: Option<String>,
        sample_weights: Option<Vec<f64>>,
    ) -> Result<Self, ValidationError> {
        let n_samples = x_rows.len();
        if n_samples == 0 {
            return Err(ValidationError::EmptyDataset);
        }
        let n_variables = variable_names.len();
        if n_variables == 0 {
            return Err(ValidationError::NoVariables);
        }
        if y.len() != n_samples {
            return Err(ValidationError::DimensionMismatch {
                what: "Y",
                expected: n_samples,
                actual: y.len(),
            });
        }

        let mut seen = HashSet::with_capacity(n_variables);
        for name in &variable_names {
            if !seen.insert(name.as_str()) {
                return Err(ValidationError::DuplicateName(name.clone()));
            }
        }

        let mut x = Vec::with_capacity(n_samples * n_variables);
        for (row, values) in x_rows.into_iter().enumerate() {
            if values.len() != n_variables {
                return Err(ValidationError::DimensionMismatch {
                    what: "X row",
                    expected: n_variables,
                    actual: values.len(),
                });
            }
            for (col, &value) in values.iter().enumerate() {
                if !value.is_finite() {
                    return Err(ValidationError::NonFiniteFeature { row, col, value });
                }
            }
            x.extend(values);
        }

        let mut labels = Vec::with_capacity(n_samples);
        for (index, &value) in y.iter().enumerate() {
            if value == 1.0 {
                labels.push(1);
            } else if value == -1.0 {
                labels.push(-1);
            } else {
                return Err(ValidationError::InvalidLabel { index, value });
            }
        }

        if let Some(weights) = &sample_weights {
            if weights.len() != n_samples {
                return Err(ValidationError::DimensionMismatch {
                    what: "sample_weights",
                    expected: n_samples,
                    actual: weights.len(),
                });
            }
            for (index, &value) in weights.iter().enumerate() {
                if !value.is_finite() || value <= 0.0 {
                    return Err(ValidationError::InvalidWeight { index, value });
                }
            }
        }

        let dataset = Self {
            x,
            y: labels,
            variable_names,
            outcome_name,
            sample_weights,
            n_samples,
            n_variables,
        };

        match dataset.intercept_index() {
            Some(j) => {
                for i in 0..n_samples {
                    let value = dataset.value(i, j);
                    if value != 1.0 {
                        return Err(ValidationError::InterceptNotOnes { row: i, value });
                    }
                }
            }
            None => warn!("there is no column named '{}' in variable_names", INTERCEPT_NAME),
        }

        if dataset.n_pos() == 0 {
            warn!("Y does not contain any positive examples");
        }
        if dataset.n_neg() == 0 {
            warn!("Y does not contain any negative examples");
        }
        if let Some(weights) = &dataset.sample_weights {
            if lacks_weight_variation(weights) {
                warn!("sample_weights only has <2 unique values");
            }
        }

        Ok(dataset)
    }

    /// Number of samples (N)
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Number of variables including the intercept (P)
    pub fn n_variables(&self) -> usize {
        self.n_variables
    }

    /// Feature value `X[i, j]`
    #[inline]
    pub fn value(&self, i: usize, j: usize) -> f64 {
        self.x[i * self.n_variables + j]
    }

    /// Feature row `X[i, :]`
    pub fn row(&self, i: usize) -> &[f64] {
        let start = i * self.n_variables;
        &self.x[start..start + self.n_variables]
    }

    /// Label of sample `i` as -1 or +1
    #[inline]
    pub fn label(&self, i: usize) -> i8 {
        self.y[i]
    }

    pub fn labels(&self) -> &[i8] {
        &self.y
    }

    pub fn variable_names(&self) -> &[String] {
        &self.variable_names
    }

    pub fn outcome_name(&self) -> Option<&str> {
        self.outcome_name.as_deref()
    }

    pub fn sample_weights(&self) -> Option<&[f64]> {
        self.sample_weights.as_deref()
    }

    /// Weight of sample `i` (1.0 when no weights were supplied)
    pub fn weight(&self, i: usize) -> f64 {
        self.sample_weights.as_ref().map_or(1.0, |w| w[i])
    }

    /// True when every sample carries the same weight (or none was given)
    pub fn has_uniform_weights(&self) -> bool {
        match &self.sample_weights {
            None => true,
            Some(weights) => weights.windows(2).all(|w| w[0] == w[1]),
        }
    }

    /// Column index of the `(Intercept)` variable, if present
    pub fn intercept_index(&self) -> Option<usize> {
        self.variable_names.iter().position(|n| n == INTERCEPT_NAME)
    }

    /// Indicator of positive samples (`Y_i = +1`)
    pub fn pos_ind(&self) -> Vec<bool> {
        self.y.iter().map(|&y| y == 1).collect()
    }

    /// Indicator of negative samples (`Y_i = -1`)
    pub fn neg_ind(&self) -> Vec<bool> {
        self.y.iter().map(|&y| y == -1).collect()
    }

    pub fn n_pos(&self) -> usize {
        self.y.iter().filter(|&&y| y == 1).count()
    }

    pub fn n_neg(&self) -> usize {
        self.n_samples - self.n_pos()
    }

    /// Raw linear score `X_i . rho`
    pub fn linear_score(&self, i: usize, rho: &[f64]) -> f64 {
        self.row(i).iter().zip(rho).map(|(x, r)| x * r).sum()
    }

    /// Margin score `(Y_i X_i) . rho`, positive when sample `i` is on the right side
    pub fn margin_score(&self, i: usize, rho: &[f64]) -> f64 {
        f64::from(self.y[i]) * self.linear_score(i, rho)
    }
}

/// True when weights were given but they differ from 1 and take a single value
fn lacks_weight_variation(weights: &[f64]) -> bool {
    if weights.iter().all(|&w| w == 1.0) {
        return false;
    }
    let mut distinct = weights.to_vec();
    distinct.sort_by(|a, b| a.total_cmp(b));
    distinct.dedup();
    distinct.len() < 2
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn toy() -> Dataset {
        Dataset::new(
            vec![vec![1.0, 1.0], vec![1.0, 2.0], vec![1.0, -1.0]],
            vec![1.0, 1.0, -1.0],
            names(&[INTERCEPT_NAME, "x"]),
            Some("y".to_string()),
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_accessors() {
        let d = toy();
        assert_eq!(d.n_samples(), 3);
        assert_eq!(d.n_variables(), 2);
        assert_eq!(d.row(1), &[1.0, 2.0]);
        assert_eq!(d.intercept_index(), Some(0));
        assert_eq!(d.n_pos(), 2);
        assert_eq!(d.n_neg(), 1);
        assert_eq!(d.pos_ind(), vec![true, true, false]);
        assert!(d.has_uniform_weights());
        assert_eq!(d.margin_score(2, &[0.0, 3.0]), 3.0);
    }

    #[test]
    fn test_rejects_bad_label() {
        let err = Dataset::new(
            vec![vec![1.0], vec![1.0]],
            vec![1.0, 0.0],
            names(&[INTERCEPT_NAME]),
            None,
            None,
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::InvalidLabel { index: 1, value: 0.0 });
    }

    #[test]
    fn test_rejects_nan_feature() {
        let err = Dataset::new(
            vec![vec![1.0, f64::NAN]],
            vec![1.0],
            names(&[INTERCEPT_NAME, "x"]),
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::NonFiniteFeature { row: 0, col: 1, .. }));
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let err = Dataset::new(
            vec![vec![1.0, 2.0]],
            vec![1.0],
            names(&["a", "a"]),
            None,
            None,
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::DuplicateName("a".to_string()));
    }

    #[test]
    fn test_rejects_intercept_that_is_not_ones() {
        let err = Dataset::new(
            vec![vec![1.0], vec![0.5]],
            vec![1.0, -1.0],
            names(&[INTERCEPT_NAME]),
            None,
            None,
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::InterceptNotOnes { row: 1, value: 0.5 });
    }

    #[test]
    fn test_rejects_non_positive_weight() {
        let err = Dataset::new(
            vec![vec![1.0], vec![1.0]],
            vec![1.0, -1.0],
            names(&[INTERCEPT_NAME]),
            None,
            Some(vec![1.0, 0.0]),
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::InvalidWeight { index: 1, value: 0.0 });
    }

    #[test]
    fn test_rejects_ragged_rows() {
        let err = Dataset::new(
            vec![vec![1.0, 2.0], vec![1.0]],
            vec![1.0, -1.0],
            names(&[INTERCEPT_NAME, "x"]),
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::DimensionMismatch { what: "X row", .. }));
    }

    #[test]
    fn test_constant_non_unit_weights_lack_variation() {
        assert!(lacks_weight_variation(&[2.0; 4]));
        assert!(lacks_weight_variation(&[0.5]));
        assert!(!lacks_weight_variation(&[1.0; 4]));
        assert!(!lacks_weight_variation(&[1.0, 2.0, 2.0]));

        let d = Dataset::new(
            vec![vec![1.0, 1.0], vec![1.0, -1.0]],
            vec![1.0, -1.0],
            names(&[INTERCEPT_NAME, "x"]),
            None,
            Some(vec![2.0, 2.0]),
        )
        .unwrap();
        assert!(d.has_uniform_weights());
        assert!(lacks_weight_variation(d.sample_weights().unwrap()));
    }
}

//! Sample weight extraction and validation

use anyhow::{anyhow, bail, Result};
use log::warn;
use polars::prelude::*;

/// Extract sample weights from a DataFrame column.
///
/// # Arguments
/// * `df` - The DataFrame to extract weights from
/// * `weight_column` - Name of the weight column
///
/// # Returns
/// * `Ok(Vec<f64>)` - One weight per row
/// * `Err` - If the column doesn't exist, is non-numeric, or holds a missing,
///   NaN, infinite or non-positive value
pub fn get_weights(df: &DataFrame, weight_column: &str) -> Result<Vec<f64>> {
    let column = df
        .column(weight_column)
        .map_err(|_| anyhow!("Weight column '{}' not found in DataFrame", weight_column))?;

    let float_col = column.cast(&DataType::Float64).map_err(|_| {
        anyhow!(
            "Weight column '{}' must be numeric (cannot cast to Float64)",
            weight_column
        )
    })?;

    let ca = float_col
        .f64()
        .map_err(|_| anyhow!("Failed to access weight column '{}' as Float64", weight_column))?;

    let mut weights = Vec::with_capacity(df.height());
    for (row, opt_val) in ca.iter().enumerate() {
        let Some(w) = opt_val else {
            bail!(
                "Weight column '{}' has a missing value in row {}",
                weight_column,
                row
            );
        };
        if w.is_nan() {
            bail!(
                "Weight column '{}' contains NaN value. All weights must be valid numbers.",
                weight_column
            );
        }
        if w.is_infinite() {
            bail!(
                "Weight column '{}' contains infinite value. All weights must be finite.",
                weight_column
            );
        }
        if w <= 0.0 {
            bail!(
                "Weight column '{}' contains non-positive value: {}. All weights must be positive.",
                weight_column,
                w
            );
        }
        weights.push(w);
    }

    if weights.windows(2).all(|pair| pair[0] == pair[1]) {
        warn!(
            "weight column '{}' is constant; the objective is the same as unweighted",
            weight_column
        );
    }

    Ok(weights)
}

/// Sum of the weights in one class, given a class mask.
#[inline]
pub fn class_weight(weights: &[f64], mask: &[bool]) -> f64 {
    weights
        .iter()
        .zip(mask)
        .filter(|&(_, &m)| m)
        .map(|(w, _)| w)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with_weights(weights: &[f64]) -> DataFrame {
        let outcome: Vec<i64> = (0..weights.len() as i64).map(|i| i % 2).collect();
        df! {
            "y" => outcome,
            "w" => weights,
        }
        .unwrap()
    }

    #[test]
    fn test_weights_are_read_in_row_order() {
        let df = frame_with_weights(&[1.0, 2.0, 0.5, 1.5]);
        assert_eq!(get_weights(&df, "w").unwrap(), vec![1.0, 2.0, 0.5, 1.5]);
    }

    #[test]
    fn test_integer_weights_cast_to_float() {
        let df = df! {
            "y" => [1i64, 0, 1],
            "w" => [3i64, 1, 2],
        }
        .unwrap();
        assert_eq!(get_weights(&df, "w").unwrap(), vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn test_unknown_column() {
        let df = frame_with_weights(&[1.0, 1.0]);
        let err = get_weights(&df, "weight").unwrap_err();
        assert!(err.to_string().contains("not found in DataFrame"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        for (value, message) in [
            (0.0, "non-positive"),
            (-2.0, "non-positive"),
            (f64::NAN, "NaN"),
            (f64::INFINITY, "infinite"),
        ] {
            let df = frame_with_weights(&[1.0, value, 2.0]);
            let err = get_weights(&df, "w").unwrap_err();
            assert!(
                err.to_string().contains(message),
                "weight {} gave '{}'",
                value,
                err
            );
        }
    }

    #[test]
    fn test_null_weight_names_the_row() {
        let df = df! {
            "y" => [1i64, 0, 1],
            "w" => [Some(1.0), None, Some(2.0)],
        }
        .unwrap();
        let err = get_weights(&df, "w").unwrap_err();
        assert!(err.to_string().contains("missing value in row 1"));
    }

    #[test]
    fn test_class_weight_sums_masked_entries() {
        let weights = [1.0, 2.0, 0.5, 1.5];
        assert_eq!(class_weight(&weights, &[true, false, true, false]), 1.5);
        assert_eq!(class_weight(&weights, &[false; 4]), 0.0);
    }
}

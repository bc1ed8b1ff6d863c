//! Dataset loader for CSV training data
//!
//! The first column is the outcome, coded as 0/1 or -1/+1. Every other
//! column except an optional weight column is a feature. An `(Intercept)`
//! column of ones is inserted in front of the features.

use std::path::Path;

use anyhow::{bail, Context, Result};
use log::info;
use polars::prelude::*;

use super::dataset::{Dataset, INTERCEPT_NAME};
use super::error::ValidationError;
use super::weights::get_weights;

/// Load a training dataset from a CSV file
///
/// # Arguments
/// * `path` - CSV file; the first column holds the outcome
/// * `weight_column` - Optional column holding positive sample weights
pub fn load_dataset(path: &Path, weight_column: Option<&str>) -> Result<Dataset> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if extension != "csv" {
        bail!(
            "Unsupported file format: {}. Supported formats: csv",
            extension
        );
    }

    let df = LazyCsvReader::new(path)
        .with_has_header(true)
        .finish()
        .and_then(|lf| lf.collect())
        .with_context(|| format!("Failed to load CSV file: {}", path.display()))?;

    let dataset = dataset_from_frame(&df, weight_column)
        .with_context(|| format!("Invalid training data in {}", path.display()))?;
    info!(
        "loaded {} samples and {} variables from {}",
        dataset.n_samples(),
        dataset.n_variables(),
        path.display()
    );
    Ok(dataset)
}

/// Convert an in-memory frame into a validated [`Dataset`]
pub fn dataset_from_frame(df: &DataFrame, weight_column: Option<&str>) -> Result<Dataset> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    let Some((outcome_name, rest)) = names.split_first() else {
        bail!("CSV file has no columns");
    };
    if weight_column == Some(outcome_name.as_str()) {
        bail!("Weight column '{}' cannot be the outcome column", outcome_name);
    }

    let outcome = numeric_column(df, outcome_name)?;
    let y: Vec<f64> = outcome
        .into_iter()
        .map(|v| if v == 0.0 { -1.0 } else { v })
        .collect();

    let feature_names: Vec<String> = rest
        .iter()
        .filter(|name| Some(name.as_str()) != weight_column)
        .cloned()
        .collect();
    let has_intercept = feature_names.iter().any(|n| n == INTERCEPT_NAME);

    let mut columns = Vec::with_capacity(feature_names.len() + 1);
    let mut variable_names = Vec::with_capacity(feature_names.len() + 1);
    if !has_intercept {
        columns.push(vec![1.0; df.height()]);
        variable_names.push(INTERCEPT_NAME.to_string());
    }
    for name in &feature_names {
        columns.push(numeric_column(df, name)?);
        variable_names.push(name.clone());
    }

    let x_rows: Vec<Vec<f64>> = (0..df.height())
        .map(|i| columns.iter().map(|col| col[i]).collect())
        .collect();

    let sample_weights = weight_column
        .map(|col| get_weights(df, col))
        .transpose()?;

    let dataset = Dataset::new(
        x_rows,
        y,
        variable_names,
        Some(outcome_name.clone()),
        sample_weights,
    )?;
    Ok(dataset)
}

fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = df
        .column(name)
        .with_context(|| format!("Column '{}' not found", name))?
        .cast(&DataType::Float64)
        .with_context(|| format!("Column '{}' must be numeric", name))?;
    let ca = column
        .f64()
        .with_context(|| format!("Failed to access column '{}' as Float64", name))?;

    ca.iter()
        .enumerate()
        .map(|(row, value)| {
            value.ok_or_else(|| {
                anyhow::Error::from(ValidationError::MissingValue {
                    column: name.to_string(),
                    row,
                })
            })
        })
        .collect()
}

/// Display initial statistics about the dataset
pub fn display_dataset_stats(dataset: &Dataset) {
    println!("\n   Dataset Statistics:");
    println!("   Samples: {}", dataset.n_samples());
    println!(
        "   Variables: {} (including intercept: {})",
        dataset.n_variables(),
        dataset.intercept_index().is_some()
    );
    println!(
        "   Outcome '{}': {} positive, {} negative",
        dataset.outcome_name().unwrap_or("Y"),
        dataset.n_pos(),
        dataset.n_neg()
    );
    if !dataset.has_uniform_weights() {
        println!("   Sample weights: yes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_conversion_inserts_intercept() {
        let df = df! {
            "outcome" => [1i64, 0, 1, 0],
            "age" => [30.0, 40.0, 50.0, 60.0],
        }
        .unwrap();
        let d = dataset_from_frame(&df, None).unwrap();
        assert_eq!(d.variable_names(), &[INTERCEPT_NAME.to_string(), "age".to_string()]);
        assert_eq!(d.labels(), &[1, -1, 1, -1]);
        assert_eq!(d.row(1), &[1.0, 40.0]);
        assert_eq!(d.outcome_name(), Some("outcome"));
    }

    #[test]
    fn test_weight_column_is_not_a_feature() {
        let df = df! {
            "y" => [1.0, -1.0, 1.0],
            "x" => [1.0, 2.0, 3.0],
            "w" => [1.0, 2.0, 3.0],
        }
        .unwrap();
        let d = dataset_from_frame(&df, Some("w")).unwrap();
        assert_eq!(d.n_variables(), 2);
        assert_eq!(d.sample_weights(), Some(&[1.0, 2.0, 3.0][..]));
    }

    #[test]
    fn test_missing_feature_value() {
        let x = Series::new("x".into(), &[Some(1.0), None]);
        let mut df = df! { "y" => [1.0, -1.0] }.unwrap();
        let _ = df.with_column(x).unwrap();
        let err = dataset_from_frame(&df, None).unwrap_err();
        let validation = err.downcast_ref::<ValidationError>().unwrap();
        assert_eq!(
            validation,
            &ValidationError::MissingValue {
                column: "x".to_string(),
                row: 1
            }
        );
    }

    #[test]
    fn test_invalid_label() {
        let df = df! {
            "y" => [1.0, 2.0],
            "x" => [1.0, 2.0],
        }
        .unwrap();
        assert!(dataset_from_frame(&df, None).is_err());
    }

    #[test]
    fn test_rejects_non_csv() {
        let err = load_dataset(Path::new("data.parquet"), None).unwrap_err();
        assert!(err.to_string().contains("Unsupported file format"));
    }
}

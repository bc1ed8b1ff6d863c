//! Unit tests for the CSV dataset loader

use slimip::pipeline::{load_dataset, ValidationError, INTERCEPT_NAME};

#[path = "common/mod.rs"]
mod common;

use common::{write_temp_file, SCENARIO_CSV};

#[test]
fn test_load_scenario_csv() {
    let (_dir, path) = write_temp_file("scenario.csv", SCENARIO_CSV);
    let dataset = load_dataset(&path, None).unwrap();

    assert_eq!(dataset.n_samples(), 4);
    assert_eq!(dataset.n_variables(), 2);
    assert_eq!(dataset.variable_names(), &[INTERCEPT_NAME.to_string(), "x".to_string()]);
    assert_eq!(dataset.outcome_name(), Some("y"));
    assert_eq!(dataset.labels(), &[1, 1, -1, -1]);
    assert_eq!(dataset.row(2), &[1.0, -1.0]);
    assert!(dataset.has_uniform_weights());
}

#[test]
fn test_signed_labels_are_kept() {
    let (_dir, path) = write_temp_file("signed.csv", "y,a,b\n1,0.5,2\n-1,1.5,0\n");
    let dataset = load_dataset(&path, None).unwrap();

    assert_eq!(dataset.labels(), &[1, -1]);
    assert_eq!(dataset.row(0), &[1.0, 0.5, 2.0]);
}

#[test]
fn test_existing_intercept_column_is_not_duplicated() {
    let csv = "y,(Intercept),x\n1,1,3\n0,1,-3\n";
    let (_dir, path) = write_temp_file("intercept.csv", csv);
    let dataset = load_dataset(&path, None).unwrap();

    assert_eq!(dataset.n_variables(), 2);
    assert_eq!(dataset.intercept_index(), Some(0));
}

#[test]
fn test_weight_column() {
    let csv = "y,x,w\n1,1,2\n1,2,1\n0,-1,0.5\n0,-2,1\n";
    let (_dir, path) = write_temp_file("weighted.csv", csv);
    let dataset = load_dataset(&path, Some("w")).unwrap();

    assert_eq!(dataset.n_variables(), 2);
    assert!(!dataset.variable_names().iter().any(|n| n == "w"));
    assert_eq!(dataset.sample_weights(), Some(&[2.0, 1.0, 0.5, 1.0][..]));
    assert!(!dataset.has_uniform_weights());
}

#[test]
fn test_unknown_weight_column_errors() {
    let (_dir, path) = write_temp_file("scenario.csv", SCENARIO_CSV);
    assert!(load_dataset(&path, Some("missing")).is_err());
}

#[test]
fn test_negative_weight_errors() {
    let csv = "y,x,w\n1,1,1\n0,-1,-2\n";
    let (_dir, path) = write_temp_file("weighted.csv", csv);
    assert!(load_dataset(&path, Some("w")).is_err());
}

#[test]
fn test_empty_cell_is_a_missing_value() {
    let csv = "y,x,z\n1,1,4\n0,,2\n";
    let (_dir, path) = write_temp_file("holes.csv", csv);
    let err = load_dataset(&path, None).unwrap_err();

    let missing = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<ValidationError>())
        .cloned();
    assert_eq!(
        missing,
        Some(ValidationError::MissingValue {
            column: "x".to_string(),
            row: 1,
        })
    );
}

#[test]
fn test_label_outside_binary_coding_errors() {
    let (_dir, path) = write_temp_file("labels.csv", "y,x\n1,1\n2,3\n");
    let err = load_dataset(&path, None).unwrap_err();
    assert!(format!("{:#}", err).contains("labels.csv"));
}

#[test]
fn test_non_csv_extension_is_rejected() {
    let (_dir, path) = write_temp_file("data.parquet", "y,x\n1,1\n");
    let err = load_dataset(&path, None).unwrap_err();
    assert!(err.to_string().contains("Unsupported file format"));
}

//! Model summary and scorecard rendering

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use console::style;
use serde::Serialize;

use crate::pipeline::coefficients::CoefType;
use crate::pipeline::dataset::Dataset;
use crate::pipeline::solver::verify::is_zero;
use crate::pipeline::solver::SlimInfo;

/// One scored variable
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScorecardRow {
    pub name: String,
    /// Whole points for integer coefficients, the raw value for continuous ones
    pub points: f64,
}

/// Human-readable point system
///
/// Rows hold the non-zero, non-intercept coefficients sorted by descending
/// points. The intercept becomes the decision threshold: predict the
/// positive class when the total score exceeds `threshold`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scorecard {
    pub outcome: Option<String>,
    pub threshold: f64,
    pub rows: Vec<ScorecardRow>,
}

impl Scorecard {
    pub fn from_coefficients(rho: &[f64], dataset: &Dataset, info: &SlimInfo) -> Self {
        let points = |j: usize| match info.rho_type[j] {
            _ if is_zero(rho[j]) => 0.0,
            CoefType::Integer => rho[j].round(),
            CoefType::Continuous => rho[j],
        };
        let intercept = dataset.intercept_index();
        // 0.0 - 0.0 keeps the sign positive
        let threshold = intercept.map_or(0.0, |j| 0.0 - points(j));

        let mut rows: Vec<ScorecardRow> = dataset
            .variable_names()
            .iter()
            .enumerate()
            .filter(|&(j, _)| Some(j) != intercept && !is_zero(rho[j]))
            .map(|(j, name)| ScorecardRow {
                name: name.clone(),
                points: points(j),
            })
            .collect();
        // stable: ties keep column order
        rows.sort_by(|a, b| b.points.total_cmp(&a.points));

        Self {
            outcome: dataset.outcome_name().map(str::to_string),
            threshold,
            rows,
        }
    }

    pub fn predict_line(&self) -> String {
        match &self.outcome {
            Some(name) => format!(
                "PREDICT {} IF SCORE > {}",
                name.to_uppercase(),
                format_points(self.threshold)
            ),
            None => format!("PREDICT Y = +1 IF SCORE > {}", format_points(self.threshold)),
        }
    }

    pub fn total_line(&self) -> String {
        format!("ADD POINTS FROM ROWS 1 to {}", self.rows.len())
    }

    pub fn to_table(&self) -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new(self.predict_line()).add_attribute(Attribute::Bold),
            Cell::new(""),
            Cell::new(""),
        ]);

        for (i, row) in self.rows.iter().enumerate() {
            let unit = if row.points.abs() == 1.0 { "point" } else { "points" };
            table.add_row(vec![
                Cell::new(format!("{}. {}", i + 1, row.name)),
                Cell::new(format!("{} {}", format_points(row.points), unit))
                    .set_alignment(CellAlignment::Right)
                    .fg(if row.points > 0.0 { Color::Green } else { Color::Red }),
                Cell::new("+ .....").set_alignment(CellAlignment::Right),
            ]);
        }

        table.add_row(vec![
            Cell::new(self.total_line()).add_attribute(Attribute::Bold),
            Cell::new("SCORE").set_alignment(CellAlignment::Right),
            Cell::new("= .....").set_alignment(CellAlignment::Right),
        ]);
        table
    }
}

/// Whole numbers without a fraction, anything else to four decimals
fn format_points(points: f64) -> String {
    if points.fract() == 0.0 {
        format!("{:.0}", points)
    } else {
        format!("{:.4}", points)
    }
}

impl std::fmt::Display for Scorecard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_table())
    }
}

/// Training-set performance of a coefficient vector
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub rho: Vec<f64>,
    pub true_positives: usize,
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub mistakes: usize,
    pub error_rate: f64,
    pub true_positive_rate: f64,
    pub false_positive_rate: f64,
    pub l0_norm: usize,
    pub scorecard: Scorecard,
}

/// Summarize `rho` on `dataset`. Sample `i` is predicted positive iff
/// `X_i . rho > 0`.
pub fn summarize(rho: &[f64], dataset: &Dataset, info: &SlimInfo) -> ModelSummary {
    let (mut tp, mut tn, mut fp, mut fn_) = (0, 0, 0, 0);
    for i in 0..dataset.n_samples() {
        let predicted_positive = dataset.linear_score(i, rho) > 0.0;
        match (dataset.label(i) == 1, predicted_positive) {
            (true, true) => tp += 1,
            (true, false) => fn_ += 1,
            (false, true) => fp += 1,
            (false, false) => tn += 1,
        }
    }

    let ratio = |num: usize, den: usize| if den > 0 { num as f64 / den as f64 } else { 0.0 };
    let l0_norm = rho
        .iter()
        .zip(&info.l0_reg_ind)
        .filter(|&(&r, &reg)| reg && !is_zero(r))
        .count();

    ModelSummary {
        rho: rho.to_vec(),
        true_positives: tp,
        true_negatives: tn,
        false_positives: fp,
        false_negatives: fn_,
        mistakes: fp + fn_,
        error_rate: ratio(fp + fn_, dataset.n_samples()),
        true_positive_rate: ratio(tp, dataset.n_pos()),
        false_positive_rate: ratio(fp, dataset.n_neg()),
        l0_norm,
        scorecard: Scorecard::from_coefficients(rho, dataset, info),
    }
}

impl ModelSummary {
    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("◆").cyan(),
            style("SCORING SYSTEM").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();
        for line in self.scorecard.to_table().to_string().lines() {
            println!("    {}", line);
        }

        println!();
        println!(
            "    {} {}",
            style("◆").cyan(),
            style("TRAINING PERFORMANCE").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);
        table.add_row(vec![
            Cell::new("Error rate"),
            Cell::new(format!("{:.2}%", 100.0 * self.error_rate))
                .fg(if self.mistakes == 0 { Color::Green } else { Color::Yellow })
                .add_attribute(Attribute::Bold),
        ]);
        table.add_row(vec![
            Cell::new("TPR"),
            Cell::new(format!("{:.2}%", 100.0 * self.true_positive_rate)),
        ]);
        table.add_row(vec![
            Cell::new("FPR"),
            Cell::new(format!("{:.2}%", 100.0 * self.false_positive_rate)),
        ]);
        table.add_row(vec![Cell::new("True positives"), Cell::new(self.true_positives)]);
        table.add_row(vec![Cell::new("False positives"), Cell::new(self.false_positives)]);
        table.add_row(vec![Cell::new("True negatives"), Cell::new(self.true_negatives)]);
        table.add_row(vec![Cell::new("False negatives"), Cell::new(self.false_negatives)]);
        table.add_row(vec![
            Cell::new("Model size (L0)"),
            Cell::new(self.l0_norm).fg(Color::Cyan),
        ]);

        // Indent the table
        for line in table.to_string().lines() {
            println!("    {}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::dataset::INTERCEPT_NAME;
    use crate::pipeline::solver::{build_formulation, prepare_coefficients, SlimConfig};

    fn setup(outcome: Option<&str>) -> (Dataset, SlimInfo) {
        let d = Dataset::new(
            vec![
                vec![1.0, 1.0, 0.0],
                vec![1.0, 2.0, 1.0],
                vec![1.0, -1.0, 0.0],
                vec![1.0, -2.0, 1.0],
            ],
            vec![1.0, 1.0, -1.0, -1.0],
            vec![INTERCEPT_NAME.to_string(), "x".to_string(), "z".to_string()],
            outcome.map(str::to_string),
            None,
        )
        .unwrap();
        let config = SlimConfig::default();
        let coefs = prepare_coefficients(&d, &config).unwrap();
        let info = build_formulation(&d, &coefs, config).unwrap().info;
        (d, info)
    }

    #[test]
    fn test_perfect_separator() {
        let (d, info) = setup(Some("sick"));
        let s = summarize(&[0.0, 3.0, 0.0], &d, &info);
        assert_eq!(s.mistakes, 0);
        assert_eq!(s.true_positives, 2);
        assert_eq!(s.true_negatives, 2);
        assert_eq!(s.true_positive_rate, 1.0);
        assert_eq!(s.false_positive_rate, 0.0);
        assert_eq!(s.l0_norm, 1);
        assert_eq!(s.scorecard.predict_line(), "PREDICT SICK IF SCORE > 0");
    }

    #[test]
    fn test_intercept_only_model() {
        let (d, info) = setup(None);
        let s = summarize(&[1.0, 0.0, 0.0], &d, &info);
        assert_eq!(s.false_positives, 2);
        assert_eq!(s.error_rate, 0.5);
        assert_eq!(s.l0_norm, 0);
        assert!(s.scorecard.rows.is_empty());
        assert_eq!(s.scorecard.predict_line(), "PREDICT Y = +1 IF SCORE > -1");
    }

    #[test]
    fn test_zero_score_predicts_negative() {
        let (d, info) = setup(None);
        let s = summarize(&[0.0, 0.0, 0.0], &d, &info);
        assert_eq!(s.true_negatives, 2);
        assert_eq!(s.false_negatives, 2);
    }

    #[test]
    fn test_scorecard_sorted_by_points() {
        let (d, info) = setup(None);
        let card = Scorecard::from_coefficients(&[-2.0, -1.0, 4.0], &d, &info);
        assert_eq!(card.threshold, 2.0);
        let names: Vec<&str> = card.rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["z", "x"]);
        assert_eq!(card.total_line(), "ADD POINTS FROM ROWS 1 to 2");
        assert!(card.to_string().contains("4 points"));
    }

    #[test]
    fn test_solver_noise_counts_as_zero() {
        let (d, info) = setup(None);
        let s = summarize(&[0.0, 3.0, 4e-7], &d, &info);
        assert_eq!(s.l0_norm, 1);
        assert_eq!(s.scorecard.rows.len(), 1);
        assert_eq!(s.scorecard.predict_line(), "PREDICT Y = +1 IF SCORE > 0");
    }

    #[test]
    fn test_small_continuous_coefficient_is_kept() {
        let d = Dataset::new(
            vec![vec![1.0, 1.0, 0.0], vec![1.0, -1.0, 1.0]],
            vec![1.0, -1.0],
            vec![INTERCEPT_NAME.to_string(), "x".to_string(), "z".to_string()],
            None,
            None,
        )
        .unwrap();
        let config = SlimConfig::default();
        let mut coefs = prepare_coefficients(&d, &config).unwrap();
        coefs.set_type("z", CoefType::Continuous).unwrap();
        let info = build_formulation(&d, &coefs, config).unwrap().info;

        let s = summarize(&[0.0, 2.0, 0.25], &d, &info);
        assert_eq!(s.l0_norm, 2);
        let rows: Vec<(&str, f64)> = s
            .scorecard
            .rows
            .iter()
            .map(|r| (r.name.as_str(), r.points))
            .collect();
        assert_eq!(rows, vec![("x", 2.0), ("z", 0.25)]);
        assert!(s.scorecard.to_string().contains("0.2500 points"));
    }
}

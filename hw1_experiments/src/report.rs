//! Plain-text summaries printed after each experiment.

use crate::compare::{ComparisonReport, EnvironmentComparison};
use crate::sweep::{SweepPoint, SweepReport};
use std::fmt::Write;

const WIDE_RULE: usize = 60;
const NARROW_RULE: usize = 40;

fn rule(ch: char, width: usize) -> String {
    std::iter::repeat(ch).take(width).collect()
}

/// Two-decimal rendering for values that may be missing
pub fn format_optional(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", decimals, v),
        None => "n/a".to_string(),
    }
}

/// Line printed as each sweep run completes
pub fn sweep_progress_line(point: &SweepPoint) -> String {
    format!(
        "Steps: {}, Mean: {:.2}, Std: {:.2}",
        point.train_steps, point.mean, point.std
    )
}

/// Banner printed before each sweep run
pub fn sweep_banner(train_steps: u64) -> String {
    format!(
        "\n{}\nRunning experiment with {} training steps...\n{}",
        rule('=', 50),
        train_steps,
        rule('=', 50)
    )
}

/// Fixed-width results table, one row per successful run in sweep order
pub fn format_sweep_table(points: &[SweepPoint]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", rule('=', WIDE_RULE));
    let _ = writeln!(out, "Results Summary:");
    let _ = writeln!(out, "{}", rule('=', WIDE_RULE));
    let _ = writeln!(out, "{:<10} {:<15} {:<15}", "Steps", "Mean Return", "Std Return");
    let _ = writeln!(out, "{}", rule('-', NARROW_RULE));
    for point in points {
        let _ = writeln!(out, "{:<10} {:<15.2} {:<15.2}", point.train_steps, point.mean, point.std);
    }
    out
}

pub fn print_sweep_summary(report: &SweepReport) {
    println!();
    print!("{}", format_sweep_table(&report.points));

    if !report.failed_steps.is_empty() {
        println!("\nFailed runs (no metrics parsed):");
        for steps in &report.failed_steps {
            println!("  - steps={}", steps);
        }
    }
}

/// Per-iteration DAgger results plus the expert and BC anchors
pub fn format_environment_comparison(comparison: &EnvironmentComparison) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", rule('=', WIDE_RULE));
    let _ = writeln!(out, "{} DAgger Results:", comparison.env_name);
    let _ = writeln!(out, "{}", rule('=', WIDE_RULE));
    for (i, eval) in comparison.dagger.iterations.iter().enumerate() {
        let _ = writeln!(out, "Iter {}: Mean={:.2}, Std={:.2}", i, eval.mean, eval.std);
    }
    let _ = writeln!(
        out,
        "Expert: {}, BC: {}",
        format_optional(comparison.expert_return(), 2),
        format_optional(comparison.bc.mean, 2)
    );
    out
}

pub fn print_comparison_summary(report: &ComparisonReport) {
    for comparison in &report.environments {
        println!();
        print!("{}", format_environment_comparison(comparison));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::{BcResult, DaggerResult};
    use crate::metrics::EvalSummary;

    fn point(train_steps: u64, mean: f64, std: f64) -> SweepPoint {
        SweepPoint { train_steps, mean, std }
    }

    fn data_rows(table: &str) -> Vec<Vec<String>> {
        table
            .lines()
            .skip(5)
            .map(|line| line.split_whitespace().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn test_sweep_table_rows_in_input_order() {
        let table = format_sweep_table(&[point(100, 10.0, 1.0), point(500, 20.0, 2.0)]);

        assert!(table.contains("Results Summary:"));
        assert!(table.contains("Steps      Mean Return     Std Return"));
        assert_eq!(
            data_rows(&table),
            vec![vec!["100", "10.00", "1.00"], vec!["500", "20.00", "2.00"]]
        );
    }

    #[test]
    fn test_sweep_table_column_layout() {
        let table = format_sweep_table(&[point(10000, 4713.657, 12.3449)]);
        let row = table.lines().last().unwrap();
        assert_eq!(row, format!("{:<10} {:<15} {:<15}", "10000", "4713.66", "12.34"));
    }

    #[test]
    fn test_empty_sweep_table_has_only_header() {
        let table = format_sweep_table(&[]);
        assert_eq!(table.lines().count(), 5);
    }

    #[test]
    fn test_progress_line() {
        assert_eq!(
            sweep_progress_line(&point(2000, 1234.567, 8.9)),
            "Steps: 2000, Mean: 1234.57, Std: 8.90"
        );
    }

    #[test]
    fn test_environment_comparison_summary() {
        let comparison = EnvironmentComparison {
            env_name: "Ant-v2".to_string(),
            dagger: DaggerResult {
                iterations: vec![EvalSummary::new(1000.0, 50.0), EvalSummary::new(4500.5, 25.25)],
                expert_return: Some(4713.653),
            },
            bc: BcResult {
                mean: Some(3500.0),
                std: Some(100.0),
                expert_return: Some(4713.653),
            },
        };

        let text = format_environment_comparison(&comparison);
        assert!(text.contains("Ant-v2 DAgger Results:"));
        assert!(text.contains("Iter 0: Mean=1000.00, Std=50.00"));
        assert!(text.contains("Iter 1: Mean=4500.50, Std=25.25"));
        assert!(text.contains("Expert: 4713.65, BC: 3500.00"));
    }

    #[test]
    fn test_missing_anchors_render_as_na() {
        let comparison = EnvironmentComparison {
            env_name: "Humanoid-v2".to_string(),
            dagger: DaggerResult {
                iterations: vec![],
                expert_return: None,
            },
            bc: BcResult {
                mean: None,
                std: None,
                expert_return: None,
            },
        };

        let text = format_environment_comparison(&comparison);
        assert!(text.contains("Expert: n/a, BC: n/a"));
        assert!(!text.contains("Iter 0"));
    }
}

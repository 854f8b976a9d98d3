//! Behavior-cloning training-step sweep.
//!
//! Runs the trainer once per configured step count, scrapes the evaluation
//! return from each run, prints a summary table and plots return against
//! training steps.

use crate::{
    metrics::{self, EvalSummary},
    plot, report,
    settings::Settings,
    trainer::{Invocation, RunConfig, Trainer},
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, instrument, warn};

/// Result of one successful sweep run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub train_steps: u64,
    pub mean: f64,
    pub std: f64,
}

impl SweepPoint {
    pub fn eval(&self) -> EvalSummary {
        EvalSummary::new(self.mean, self.std)
    }
}

/// Everything the sweep produced, in sweep order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    pub env_name: String,
    pub points: Vec<SweepPoint>,
    /// Step counts whose output had no parseable metrics
    pub failed_steps: Vec<u64>,
}

/// Experiment name for one sweep run
pub fn exp_name(prefix: &str, train_steps: u64) -> String {
    format!("{}{}", prefix, train_steps)
}

/// Run every configured step count in order. Trainer output is captured
/// silently; a run whose metrics can't be parsed is reported and skipped.
#[instrument(skip_all, fields(env = %settings.sweep.environment.name))]
pub async fn execute_sweep(trainer: &dyn Trainer, settings: &Settings) -> Result<SweepReport> {
    let sweep = &settings.sweep;
    let mut report = SweepReport {
        env_name: sweep.environment.name.clone(),
        ..SweepReport::default()
    };

    for &train_steps in &sweep.steps {
        println!("{}", report::sweep_banner(train_steps));

        let run = RunConfig::behavior_cloning(
            sweep.environment.clone(),
            exp_name(&sweep.exp_name_prefix, train_steps),
            sweep.n_iter,
            train_steps,
        );
        let invocation = Invocation::build(&settings.trainer, &run);

        let output = trainer
            .train(&invocation)
            .await
            .with_context(|| format!("Trainer run for {} steps failed", train_steps))?;

        match metrics::extract_eval(&output.text) {
            Some(eval) => {
                let point = SweepPoint {
                    train_steps,
                    mean: eval.mean,
                    std: eval.std,
                };
                println!("{}", report::sweep_progress_line(&point));
                report.points.push(point);
            }
            None => {
                warn!("Failed to parse results for steps={}", train_steps);
                println!("Failed to parse results for steps={}", train_steps);
                println!("{}", output.text);
                report.failed_steps.push(train_steps);
            }
        }
    }

    Ok(report)
}

/// Run the sweep, print the summary and write the figure
#[instrument(skip_all)]
pub async fn run(trainer: &dyn Trainer, settings: &Settings) -> Result<SweepReport> {
    info!(
        "Starting BC sweep over {} step counts on {}",
        settings.sweep.steps.len(),
        settings.sweep.environment.name
    );

    let report = execute_sweep(trainer, settings).await?;

    report::print_sweep_summary(&report);

    if let Some(results_file) = &settings.sweep.results_file {
        save_results(&report, results_file).context("Failed to save sweep results")?;
    }

    if report.points.is_empty() {
        warn!("No sweep run produced metrics, skipping figure");
        return Ok(report);
    }

    plot::draw_sweep_figure(
        &settings.sweep.figure,
        settings.plot.sweep_size,
        &report.env_name,
        &report.points,
    )
    .context("Failed to draw sweep figure")?;
    println!("\nFigure saved to: {}", settings.sweep.figure.display());

    if settings.plot.show {
        plot::open_in_viewer(&settings.plot.viewer, &settings.sweep.figure);
    }

    Ok(report)
}

/// Save sweep results to a JSON file
pub fn save_results(report: &SweepReport, output_file: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize sweep results")?;

    std::fs::write(output_file, json)
        .with_context(|| format!("Failed to write results to: {:?}", output_file))?;

    info!("Sweep results saved to: {:?}", output_file);
    Ok(())
}

//! DAgger vs behavior-cloning comparison.
//!
//! For each configured environment this runs a multi-iteration DAgger job and
//! a single BC baseline, then plots the DAgger learning curve against the
//! expert's return and the BC return.

use crate::{
    metrics::{self, EvalSummary, Metric},
    plot, report,
    settings::{ComparisonEnvironment, EnvironmentConfig, Settings},
    trainer::{Invocation, RunConfig, Trainer},
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, instrument, warn};

/// Per-iteration evaluation of a DAgger run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DaggerResult {
    pub iterations: Vec<EvalSummary>,
    pub expert_return: Option<f64>,
}

/// Evaluation of a single BC baseline run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BcResult {
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub expert_return: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentComparison {
    pub env_name: String,
    pub dagger: DaggerResult,
    pub bc: BcResult,
}

impl EnvironmentComparison {
    /// Expert anchor, preferring the one logged by the DAgger run
    pub fn expert_return(&self) -> Option<f64> {
        self.dagger.expert_return.or(self.bc.expert_return)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub environments: Vec<EnvironmentComparison>,
}

/// Run DAgger for `n_iter` iterations and collect one evaluation per iteration
#[instrument(skip(trainer, settings, environment), fields(env = %environment.name))]
pub async fn run_dagger(
    trainer: &dyn Trainer,
    settings: &Settings,
    environment: &EnvironmentConfig,
    exp_name: &str,
    n_iter: u32,
) -> Result<DaggerResult> {
    println!("\n{}", "=".repeat(60));
    println!("Running DAgger on {} for {} iterations...", environment.name, n_iter);
    println!("{}", "=".repeat(60));

    let run = RunConfig::dagger(environment.clone(), exp_name, n_iter);
    let invocation = Invocation::build(&settings.trainer, &run);
    let output = trainer
        .train(&invocation)
        .await
        .with_context(|| format!("DAgger run on {} failed", environment.name))?;

    if settings.compare.echo_trainer_output {
        println!("{}", output.text);
    }

    let iterations = metrics::extract_eval_series(&output.text);
    let expert_return = metrics::extract_scalar(&output.text, Metric::InitialDataCollectionAverageReturn);

    if iterations.len() != n_iter as usize {
        warn!(
            "Expected {} DAgger evaluations on {}, parsed {}",
            n_iter,
            environment.name,
            iterations.len()
        );
    }
    if expert_return.is_none() {
        warn!("No expert return found in DAgger output for {}", environment.name);
    }

    Ok(DaggerResult {
        iterations,
        expert_return,
    })
}

/// Run the single-iteration BC baseline
#[instrument(skip(trainer, settings, environment), fields(env = %environment.name))]
pub async fn run_bc(
    trainer: &dyn Trainer,
    settings: &Settings,
    environment: &EnvironmentConfig,
    exp_name: &str,
) -> Result<BcResult> {
    println!("\nRunning BC baseline on {}...", environment.name);

    let run = RunConfig::behavior_cloning(
        environment.clone(),
        exp_name,
        1,
        settings.compare.bc_train_steps,
    );
    let invocation = Invocation::build(&settings.trainer, &run);
    let output = trainer
        .train(&invocation)
        .await
        .with_context(|| format!("BC baseline on {} failed", environment.name))?;

    let result = BcResult {
        mean: metrics::extract_scalar(&output.text, Metric::EvalAverageReturn),
        std: metrics::extract_scalar(&output.text, Metric::EvalStdReturn),
        expert_return: metrics::extract_scalar(&output.text, Metric::InitialDataCollectionAverageReturn),
    };

    if result.mean.is_none() {
        warn!("No BC evaluation return found for {}", environment.name);
    }

    Ok(result)
}

async fn compare_environment(
    trainer: &dyn Trainer,
    settings: &Settings,
    env: &ComparisonEnvironment,
) -> Result<EnvironmentComparison> {
    let environment = env.environment();
    let dagger = run_dagger(
        trainer,
        settings,
        &environment,
        &env.dagger_exp_name,
        settings.compare.dagger_iterations,
    )
    .await?;
    let bc = run_bc(trainer, settings, &environment, &env.bc_exp_name).await?;

    Ok(EnvironmentComparison {
        env_name: env.name.clone(),
        dagger,
        bc,
    })
}

/// Run DAgger then BC for every environment, in configuration order
pub async fn execute_comparison(trainer: &dyn Trainer, settings: &Settings) -> Result<ComparisonReport> {
    let mut report = ComparisonReport::default();
    for env in &settings.compare.environments {
        report
            .environments
            .push(compare_environment(trainer, settings, env).await?);
    }
    Ok(report)
}

/// Run the comparison, print the summary and write the two-panel figure
#[instrument(skip_all)]
pub async fn run(trainer: &dyn Trainer, settings: &Settings) -> Result<ComparisonReport> {
    info!(
        "Starting DAgger vs BC comparison on {} environments",
        settings.compare.environments.len()
    );

    let report = execute_comparison(trainer, settings).await?;

    report::print_comparison_summary(&report);

    if let Some(results_file) = &settings.compare.results_file {
        save_results(&report, results_file).context("Failed to save comparison results")?;
    }

    plot::draw_comparison_figure(
        &settings.compare.figure,
        settings.plot.compare_size,
        &report.environments,
    )
    .context("Failed to draw comparison figure")?;
    println!("\nFigure saved to: {}", settings.compare.figure.display());

    if settings.plot.show {
        plot::open_in_viewer(&settings.plot.viewer, &settings.compare.figure);
    }

    Ok(report)
}

/// Save comparison results to a JSON file
pub fn save_results(report: &ComparisonReport, output_file: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize comparison results")?;

    std::fs::write(output_file, json)
        .with_context(|| format!("Failed to write results to: {:?}", output_file))?;

    info!("Comparison results saved to: {:?}", output_file);
    Ok(())
}

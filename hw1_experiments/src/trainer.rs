//! External trainer invocation.
//!
//! A [`RunConfig`] describes one training run. [`Invocation::build`] turns it
//! into the program and argument list the trainer script expects, and a
//! [`Trainer`] runs that invocation to completion and hands back everything
//! it printed.

use crate::settings::{EnvironmentConfig, TrainerConfig};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// What the trainer should do with the expert data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum TrainingMode {
    /// Plain behavior cloning with a fixed number of gradient steps per iteration
    BehaviorCloning { train_steps: u64 },
    /// DAgger, relabelling on-policy rollouts with the expert
    Dagger,
}

/// One training run, built fresh for each trainer invocation
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub environment: EnvironmentConfig,
    pub exp_name: String,
    pub n_iter: u32,
    pub mode: TrainingMode,
}

impl RunConfig {
    pub fn behavior_cloning(
        environment: EnvironmentConfig,
        exp_name: impl Into<String>,
        n_iter: u32,
        train_steps: u64,
    ) -> Self {
        Self {
            environment,
            exp_name: exp_name.into(),
            n_iter,
            mode: TrainingMode::BehaviorCloning { train_steps },
        }
    }

    pub fn dagger(environment: EnvironmentConfig, exp_name: impl Into<String>, n_iter: u32) -> Self {
        Self {
            environment,
            exp_name: exp_name.into(),
            n_iter,
            mode: TrainingMode::Dagger,
        }
    }
}

/// A fully resolved command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

impl Invocation {
    /// Map a run onto the trainer's command line. Values are passed through
    /// unchanged; a bad path only shows up as the trainer's own failure.
    pub fn build(trainer: &TrainerConfig, run: &RunConfig) -> Self {
        let mut args = vec![
            trainer.script.to_string_lossy().into_owned(),
            "--expert_policy_file".to_string(),
            run.environment.expert_policy.to_string_lossy().into_owned(),
            "--env_name".to_string(),
            run.environment.name.clone(),
            "--exp_name".to_string(),
            run.exp_name.clone(),
            "--n_iter".to_string(),
            run.n_iter.to_string(),
        ];

        if run.mode == TrainingMode::Dagger {
            args.push("--do_dagger".to_string());
        }

        args.extend([
            "--expert_data".to_string(),
            run.environment.expert_data.to_string_lossy().into_owned(),
            "--video_log_freq".to_string(),
            trainer.video_log_freq.to_string(),
            "--eval_batch_size".to_string(),
            trainer.eval_batch_size.to_string(),
        ]);

        if let TrainingMode::BehaviorCloning { train_steps } = run.mode {
            args.push("--num_agent_train_steps_per_iter".to_string());
            args.push(train_steps.to_string());
        }

        Self {
            program: trainer.program.clone(),
            args,
            working_dir: trainer.working_dir.clone(),
        }
    }

    /// Value following `flag`, if the flag takes one
    pub fn arg_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|arg| arg == flag)
            .and_then(|idx| self.args.get(idx + 1))
            .map(String::as_str)
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.args.iter().any(|arg| arg == flag)
    }

    /// Human readable command line for logs
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Everything a finished trainer run left behind
#[derive(Debug, Clone)]
pub struct TrainerOutput {
    /// stdout followed by stderr
    pub text: String,
    pub exit_code: Option<i32>,
    pub success: bool,
    pub duration: Duration,
}

impl TrainerOutput {
    /// Output of a run that exited cleanly
    pub fn succeeded(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            exit_code: Some(0),
            success: true,
            duration: Duration::ZERO,
        }
    }
}

/// Runs trainer invocations to completion
#[async_trait]
pub trait Trainer: Send + Sync {
    async fn train(&self, invocation: &Invocation) -> Result<TrainerOutput>;
}

/// Spawns the trainer as a child process and captures both output streams
pub struct ProcessTrainer {
    timeout: Option<Duration>,
}

impl ProcessTrainer {
    pub fn new(config: &TrainerConfig) -> Self {
        Self {
            timeout: config.timeout_seconds.map(Duration::from_secs),
        }
    }
}

#[async_trait]
impl Trainer for ProcessTrainer {
    #[instrument(skip(self, invocation), fields(exp_name = invocation.arg_value("--exp_name")))]
    async fn train(&self, invocation: &Invocation) -> Result<TrainerOutput> {
        info!("Launching trainer: {}", invocation.command_line());

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);
        if let Some(dir) = &invocation.working_dir {
            cmd.current_dir(dir);
        }

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        // A timed-out child is dropped with its future and must not linger
        cmd.kill_on_drop(true);

        let start = Instant::now();
        let child = cmd
            .spawn()
            .with_context(|| format!("Failed to spawn trainer '{}'", invocation.program))?;

        let output = match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, child.wait_with_output()).await {
                Ok(result) => result.context("Failed to collect trainer output")?,
                Err(_) => {
                    warn!("Trainer exceeded {:?}, killing it", timeout);
                    return Err(anyhow!("Trainer timed out after {:?}", timeout));
                }
            },
            None => child
                .wait_with_output()
                .await
                .context("Failed to collect trainer output")?,
        };

        let duration = start.elapsed();
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        // Exit status is informational only, the text is parsed either way
        if !output.status.success() {
            warn!("Trainer exited with {}", output.status);
        }
        debug!("Trainer finished in {:?}", duration);

        Ok(TrainerOutput {
            text,
            exit_code: output.status.code(),
            success: output.status.success(),
            duration,
        })
    }
}

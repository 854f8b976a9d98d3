//! Configuration management with file layering and environment variable support.

use anyhow::{anyhow, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// How to launch the external trainer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainerConfig {
    /// Interpreter or executable to spawn
    pub program: String,
    /// First argument handed to `program`
    pub script: PathBuf,
    pub video_log_freq: i64,
    pub eval_batch_size: u64,
    /// Kill the trainer after this many seconds. Unset means wait forever.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            program: "python".to_string(),
            script: PathBuf::from("rob831/scripts/run_hw1.py"),
            video_log_freq: -1,
            eval_batch_size: 5_000,
            timeout_seconds: None,
            working_dir: None,
        }
    }
}

/// A simulated environment together with its expert artifacts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnvironmentConfig {
    pub name: String,
    pub expert_policy: PathBuf,
    pub expert_data: PathBuf,
}

impl EnvironmentConfig {
    pub fn new(name: &str, expert_policy: &str, expert_data: &str) -> Self {
        Self {
            name: name.to_string(),
            expert_policy: PathBuf::from(expert_policy),
            expert_data: PathBuf::from(expert_data),
        }
    }
}

/// BC training-step sweep
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SweepConfig {
    pub environment: EnvironmentConfig,
    pub steps: Vec<u64>,
    pub exp_name_prefix: String,
    pub n_iter: u32,
    pub figure: PathBuf,
    #[serde(default)]
    pub results_file: Option<PathBuf>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            environment: EnvironmentConfig::new(
                "Ant-v2",
                "rob831/policies/experts/Ant.pkl",
                "rob831/expert_data/expert_data_Ant-v2.pkl",
            ),
            steps: vec![100, 500, 1_000, 2_000, 5_000, 10_000],
            exp_name_prefix: "bc_ant_steps".to_string(),
            n_iter: 1,
            figure: PathBuf::from("figure1_bc_training_steps.png"),
            results_file: None,
        }
    }
}

/// One panel of the DAgger vs BC comparison
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComparisonEnvironment {
    pub name: String,
    pub expert_policy: PathBuf,
    pub expert_data: PathBuf,
    pub dagger_exp_name: String,
    pub bc_exp_name: String,
}

impl ComparisonEnvironment {
    pub fn environment(&self) -> EnvironmentConfig {
        EnvironmentConfig {
            name: self.name.clone(),
            expert_policy: self.expert_policy.clone(),
            expert_data: self.expert_data.clone(),
        }
    }
}

/// DAgger vs BC comparison
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompareConfig {
    pub environments: Vec<ComparisonEnvironment>,
    pub dagger_iterations: u32,
    pub bc_train_steps: u64,
    /// Print each DAgger run's captured output once it finishes
    pub echo_trainer_output: bool,
    pub figure: PathBuf,
    #[serde(default)]
    pub results_file: Option<PathBuf>,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            environments: vec![
                ComparisonEnvironment {
                    name: "Ant-v2".to_string(),
                    expert_policy: PathBuf::from("rob831/policies/experts/Ant.pkl"),
                    expert_data: PathBuf::from("rob831/expert_data/expert_data_Ant-v2.pkl"),
                    dagger_exp_name: "dagger_ant".to_string(),
                    bc_exp_name: "bc_ant_baseline".to_string(),
                },
                ComparisonEnvironment {
                    name: "Humanoid-v2".to_string(),
                    expert_policy: PathBuf::from("rob831/policies/experts/Humanoid.pkl"),
                    expert_data: PathBuf::from("rob831/expert_data/expert_data_Humanoid-v2.pkl"),
                    dagger_exp_name: "dagger_humanoid".to_string(),
                    bc_exp_name: "bc_humanoid_baseline".to_string(),
                },
            ],
            dagger_iterations: 100,
            bc_train_steps: 5_000,
            echo_trainer_output: true,
            figure: PathBuf::from("figure2_dagger_learning_curves.png"),
            results_file: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FigureSize {
    pub width: u32,
    pub height: u32,
}

/// Figure rendering and display
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlotConfig {
    /// Open written figures in `viewer`
    pub show: bool,
    pub viewer: String,
    pub sweep_size: FigureSize,
    pub compare_size: FigureSize,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            show: true,
            viewer: "xdg-open".to_string(),
            sweep_size: FigureSize { width: 1_500, height: 900 },
            compare_size: FigureSize { width: 2_100, height: 750 },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Main settings structure with all configuration sections
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Settings {
    pub trainer: TrainerConfig,
    pub sweep: SweepConfig,
    pub compare: CompareConfig,
    pub plot: PlotConfig,
    pub logging: LoggingConfig,
}

impl Settings {
    /// Load settings from the embedded defaults, an optional config file and
    /// environment variables.
    ///
    /// Without `config_path` an `experiments.toml` in the working directory is
    /// picked up if present. An explicit path must exist.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let local = match config_path {
            Some(path) => File::from(path).required(true),
            None => File::with_name("experiments").required(false),
        };

        let config = Config::builder()
            .add_source(File::from_str(
                include_str!("../config.toml"),
                FileFormat::Toml,
            ))
            .add_source(local)
            // HW1__TRAINER__PROGRAM=python3 and friends
            .add_source(
                Environment::with_prefix("HW1")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut settings: Settings = config.try_deserialize()?;

        Self::apply_env_overrides(&mut settings);

        settings.validate()?;

        Ok(settings)
    }

    /// Apply the short-form environment variable overrides
    fn apply_env_overrides(settings: &mut Settings) {
        if let Ok(program) = std::env::var("HW1_TRAINER_PROGRAM") {
            settings.trainer.program = program;
        }
        if let Ok(script) = std::env::var("HW1_TRAINER_SCRIPT") {
            settings.trainer.script = PathBuf::from(script);
        }
    }

    /// Validate settings for consistency
    pub fn validate(&self) -> Result<()> {
        if self.trainer.program.trim().is_empty() {
            return Err(anyhow!("Trainer program cannot be empty"));
        }
        if self.trainer.eval_batch_size == 0 {
            return Err(anyhow!("Eval batch size cannot be 0"));
        }
        if self.trainer.timeout_seconds == Some(0) {
            return Err(anyhow!("Trainer timeout cannot be 0 seconds"));
        }
        if !self.trainer.script.exists() {
            warn!("Trainer script does not exist: {:?}", self.trainer.script);
        }

        if self.sweep.steps.is_empty() {
            return Err(anyhow!("Sweep needs at least one step count"));
        }
        // The sweep figure uses a log-scaled axis
        if self.sweep.steps.contains(&0) {
            return Err(anyhow!("Sweep step counts must be positive"));
        }
        if self.sweep.n_iter == 0 {
            return Err(anyhow!("Sweep n_iter cannot be 0"));
        }

        if self.compare.environments.is_empty() {
            return Err(anyhow!("Comparison needs at least one environment"));
        }
        if self.compare.dagger_iterations == 0 {
            return Err(anyhow!("DAgger iterations cannot be 0"));
        }
        if self.compare.bc_train_steps == 0 {
            return Err(anyhow!("BC baseline training steps cannot be 0"));
        }

        for size in [self.plot.sweep_size, self.plot.compare_size] {
            if size.width == 0 || size.height == 0 {
                return Err(anyhow!("Figure size must be non-zero, got {}x{}", size.width, size.height));
            }
        }

        Ok(())
    }

    /// Render the effective settings as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

//! Main entry point for the hw1-experiments CLI.

use anyhow::Result;
use clap::Parser;
use hw1_experiments::{
    cli, compare, settings::Settings, sweep, telemetry, trainer::ProcessTrainer,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = cli::Cli::parse();

    // Load settings
    let mut settings = Settings::load(args.config.as_deref())?;

    // Initialize logging
    telemetry::init(&settings.logging.level)?;

    let trainer = ProcessTrainer::new(&settings.trainer);

    // Execute the requested command
    match args.command {
        cli::Commands::Sweep { steps, no_show } => {
            if let Some(steps) = steps {
                settings.sweep.steps = steps;
            }
            settings.plot.show &= !no_show;
            settings.validate()?;
            sweep::run(&trainer, &settings).await.map(|_| ())
        }
        cli::Commands::Compare { n_iter, no_show } => {
            if let Some(n_iter) = n_iter {
                settings.compare.dagger_iterations = n_iter;
            }
            settings.plot.show &= !no_show;
            settings.validate()?;
            compare::run(&trainer, &settings).await.map(|_| ())
        }
        cli::Commands::ShowConfig => {
            print!("{}", settings.to_toml()?);
            Ok(())
        }
    }
}

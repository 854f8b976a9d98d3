//! Command-line interface definitions using clap derive API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// BC and DAgger experiment driver
#[derive(Parser)]
#[command(name = "hw1-experiments")]
#[command(about = "Run BC/DAgger experiments through the external trainer and plot the results")]
#[command(version)]
pub struct Cli {
    /// Settings file layered over the built-in defaults
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sweep BC training steps per iteration
    Sweep {
        /// Step counts to sweep, comma separated
        #[arg(long, value_delimiter = ',')]
        steps: Option<Vec<u64>>,

        /// Write the figure without opening a viewer
        #[arg(long)]
        no_show: bool,
    },
    /// Compare DAgger learning curves against BC and the expert
    Compare {
        /// DAgger iterations per environment
        #[arg(long)]
        n_iter: Option<u32>,

        /// Write the figure without opening a viewer
        #[arg(long)]
        no_show: bool,
    },
    /// Print the effective settings as TOML
    ShowConfig,
}

//! hw1-experiments - BC and DAgger experiment driver
//!
//! Drives the external imitation-learning trainer, scrapes evaluation metrics
//! from its log output and renders comparison figures.

pub mod cli;
pub mod compare;
pub mod metrics;
pub mod plot;
pub mod report;
pub mod settings;
pub mod sweep;
pub mod telemetry;
pub mod trainer;

pub use trainer::Trainer;

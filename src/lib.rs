//! airbnb-pipeline - Driver for the NYC Airbnb MLflow pipeline
//!
//! Runs the pipeline components (each a separate MLflow project under
//! `components/`) in a fixed order, passing each one its parameters.
//!
//! # Architecture
//!
//! - The step order is fixed: data_get, data_clean, data_check, data_split,
//!   train_random_forest, test_model
//! - `main.execute_steps` only selects which of them run
//! - The first failing step stops the run
//!
//! # Modules
//!
//! - `adapters`: External runners (MLflow)
//! - `core`: Driver, step failures, scratch directory
//! - `domain`: Data structures (StepId, StepInvocation, RunReport)
//! - `config`: Run configuration and overrides
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Run every step listed in config.yaml
//! airbnb-pipeline
//!
//! # Run a subset with an override
//! airbnb-pipeline main.execute_steps=data_check,data_split etl.max_price=500
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use adapters::{ExperimentContext, MlflowRunner, ProjectRunner};
pub use config::RunConfig;
pub use crate::core::{resolve_steps, DriverError, PipelineDriver, StepFailure};
pub use domain::{ParamValue, RunReport, StepId, StepInvocation, StepSelection};

//! Adapter interfaces for external systems.
//!
//! Adapters run a component project on behalf of the driver. The driver only
//! sees success or failure; artifacts and run tracking belong to the runner.

pub mod mlflow;

use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::StepInvocation;

// Re-export the MLflow adapter
pub use mlflow::MlflowRunner;

/// Experiment grouping shared by every step of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentContext {
    /// Experiment project (`WANDB_PROJECT` for the components)
    pub project_name: String,

    /// Run group (`WANDB_RUN_GROUP` for the components)
    pub run_group: String,

    /// Scratch directory scoped to this pipeline run
    pub scratch_dir: PathBuf,
}

impl ExperimentContext {
    /// Environment handed to each component process
    pub fn env_vars(&self) -> Vec<(&'static str, String)> {
        vec![
            ("WANDB_PROJECT", self.project_name.clone()),
            ("WANDB_RUN_GROUP", self.run_group.clone()),
            ("TMPDIR", self.scratch_dir.display().to_string()),
        ]
    }
}

/// Trait for runners that execute a component project
#[async_trait]
pub trait ProjectRunner: Send + Sync {
    /// Human-readable runner name
    fn name(&self) -> &str;

    /// Run the project at `invocation.working_dir` and wait for it to finish
    async fn run(&self, invocation: &StepInvocation, context: &ExperimentContext) -> Result<()>;

    /// Check that the runner is usable
    async fn health_check(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_vars() {
        let context = ExperimentContext {
            project_name: "nyc_airbnb".to_string(),
            run_group: "dev".to_string(),
            scratch_dir: PathBuf::from("/tmp/run"),
        };

        let vars = context.env_vars();
        assert!(vars.contains(&("WANDB_PROJECT", "nyc_airbnb".to_string())));
        assert!(vars.contains(&("WANDB_RUN_GROUP", "dev".to_string())));
        assert!(vars.contains(&("TMPDIR", "/tmp/run".to_string())));
    }
}

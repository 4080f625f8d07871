//! MLflow adapter for component execution.
//!
//! Spawns `mlflow run <dir> -e <entry> -P key=value ...` and waits for it.
//! The component's own output is streamed to the terminal.

use std::process::Stdio;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{ExperimentContext, ProjectRunner};
use crate::domain::StepInvocation;

/// MLflow adapter using subprocess mode
pub struct MlflowRunner {
    /// Path to the mlflow binary (default: "mlflow")
    binary_path: String,

    /// Forwarded as `--env-manager` when set
    env_manager: Option<String>,
}

impl Default for MlflowRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MlflowRunner {
    /// Create an MLflow runner with the default binary path
    pub fn new() -> Self {
        Self::with_binary_path("mlflow")
    }

    /// Create an MLflow runner with a custom binary path
    pub fn with_binary_path(binary_path: impl Into<String>) -> Self {
        Self {
            binary_path: binary_path.into(),
            env_manager: None,
        }
    }

    /// Set the environment manager (`local`, `conda`, `virtualenv`)
    pub fn with_env_manager(mut self, env_manager: impl Into<String>) -> Self {
        self.env_manager = Some(env_manager.into());
        self
    }

    /// Arguments for `mlflow` (without the binary)
    pub fn command_args(&self, invocation: &StepInvocation) -> Vec<String> {
        let mut args = vec![
            "run".to_string(),
            invocation.working_dir.display().to_string(),
            "-e".to_string(),
            invocation.entry_point.clone(),
        ];

        if let Some(ref manager) = self.env_manager {
            args.push("--env-manager".to_string());
            args.push(manager.clone());
        }

        for (key, value) in &invocation.parameters {
            args.push("-P".to_string());
            args.push(format!("{}={}", key, value));
        }

        args
    }
}

#[async_trait]
impl ProjectRunner for MlflowRunner {
    fn name(&self) -> &str {
        "mlflow"
    }

    async fn run(&self, invocation: &StepInvocation, context: &ExperimentContext) -> Result<()> {
        let args = self.command_args(invocation);
        debug!(binary = %self.binary_path, ?args, "Spawning mlflow");

        let status = Command::new(&self.binary_path)
            .args(&args)
            .envs(context.env_vars())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .with_context(|| {
                format!(
                    "Failed to spawn mlflow for project '{}'",
                    invocation.working_dir.display()
                )
            })?;

        if !status.success() {
            let exit_code = status.code().unwrap_or(-1);
            anyhow::bail!(
                "mlflow run of '{}' failed with exit code {}",
                invocation.working_dir.display(),
                exit_code
            );
        }

        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        let output = Command::new(&self.binary_path)
            .arg("--version")
            .output()
            .await
            .context("Failed to run mlflow health check")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("mlflow health check failed: {}", stderr.trim());
        }

        Ok(())
    }
}

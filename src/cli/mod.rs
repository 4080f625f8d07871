//! Command-line interface for the pipeline driver.
//!
//! A single entry point: load the run configuration, apply overrides and run
//! the selected steps.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use crate::adapters::{MlflowRunner, ProjectRunner};
use crate::config::{RunConfig, DEFAULT_CONFIG_FILE};
use crate::core::{resolve_steps, PipelineDriver};

/// airbnb-pipeline - Run the NYC Airbnb MLflow pipeline components
#[derive(Parser, Debug)]
#[command(name = "airbnb-pipeline")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: <root>/config.yaml)
    #[arg(short, long, env = "AIRBNB_PIPELINE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Project root holding components/ (default: current directory).
    /// rf_config.yaml is still written to the current directory
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// mlflow binary
    #[arg(long, env = "MLFLOW_BIN", default_value = "mlflow")]
    pub mlflow: String,

    /// Environment manager forwarded to `mlflow run` (local, conda, virtualenv)
    #[arg(long)]
    pub env_manager: Option<String>,

    /// Print the resolved configuration and exit
    #[arg(long)]
    pub show_config: bool,

    /// Config overrides, e.g. main.execute_steps=data_get,data_clean etl.max_price=500
    #[arg(value_name = "KEY=VALUE")]
    pub overrides: Vec<String>,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let root = resolve_root(self.root.as_deref())?;
        let config_path = self
            .config
            .clone()
            .unwrap_or_else(|| root.join(DEFAULT_CONFIG_FILE));

        let config = RunConfig::load(&config_path, &self.overrides)?;

        if self.show_config {
            print!("{}", config.to_yaml()?);
            return Ok(());
        }

        let mut runner = MlflowRunner::with_binary_path(&self.mlflow);
        if let Some(ref manager) = self.env_manager {
            runner = runner.with_env_manager(manager);
        }
        let steps = resolve_steps(&config).ordered();
        info!(
            config = %config_path.display(),
            root = %root.display(),
            ?steps,
            "Loaded run configuration"
        );

        // Nothing will be delegated, so mlflow need not be installed
        if !steps.is_empty() {
            runner
                .health_check()
                .await
                .with_context(|| format!("mlflow is not usable ('{}')", self.mlflow))?;
        }

        let driver = PipelineDriver::new(runner, root);
        let report = driver.execute(&config).await?;

        eprintln!(
            "\n[Run {} completed: {} step(s) in {}s]",
            report.id,
            report.steps.len(),
            report.duration().num_seconds()
        );

        Ok(())
    }
}

/// Absolute project root
fn resolve_root(root: Option<&Path>) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;

    Ok(match root {
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => cwd.join(path),
        None => cwd,
    })
}

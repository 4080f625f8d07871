//! Pipeline driver.
//!
//! Walks the fixed step order, builds each selected step's invocation and
//! hands it to the runner. The first failure stops the run.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, error, field, info, instrument, warn, Span};
use uuid::Uuid;

use crate::adapters::{ExperimentContext, ProjectRunner};
use crate::config::RunConfig;
use crate::domain::{RunReport, StepId, StepInvocation, StepSelection};

use super::error::{DriverError, StepFailure};
use super::scratch::ScratchDir;

/// File the `pipeline` section is serialized to for training, relative to
/// the current directory
pub const RF_CONFIG_FILE: &str = "rf_config.yaml";

/// Prefix of the per-run scratch directory
const SCRATCH_PREFIX: &str = "airbnb-pipeline-";

/// Normalize `main.execute_steps` into a selection
pub fn resolve_steps(config: &RunConfig) -> StepSelection {
    StepSelection::from(&config.main.execute_steps)
}

/// Sequential driver over a [`ProjectRunner`]
pub struct PipelineDriver<R> {
    runner: R,

    /// Project root holding `components/`
    root: PathBuf,

    /// Where the training config is written; relative paths resolve
    /// against the current directory
    rf_config_path: PathBuf,
}

impl<R: ProjectRunner> PipelineDriver<R> {
    /// Create a driver for the project at `root`
    pub fn new(runner: R, root: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            root: root.into(),
            rf_config_path: PathBuf::from(RF_CONFIG_FILE),
        }
    }

    /// Write the training config somewhere other than `./rf_config.yaml`
    pub fn with_rf_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.rf_config_path = path.into();
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of the serialized training config
    pub fn rf_config_path(&self) -> Result<PathBuf> {
        if self.rf_config_path.is_absolute() {
            return Ok(self.rf_config_path.clone());
        }

        let cwd = std::env::current_dir().context("Failed to determine current directory")?;
        Ok(cwd.join(&self.rf_config_path))
    }

    /// Execute every selected step in the fixed order
    #[instrument(
        skip(self, config),
        fields(project = %config.main.project_name, run_id = field::Empty)
    )]
    pub async fn execute(&self, config: &RunConfig) -> Result<RunReport, DriverError> {
        let run_id = Uuid::new_v4();
        Span::current().record("run_id", field::display(run_id));
        let started_at = Utc::now();

        let selection = resolve_steps(config);
        for name in selection.unknown() {
            warn!(step = name, "Unknown step requested, it will not run");
        }
        info!(%run_id, steps = ?selection.names(), "Starting pipeline");

        let scratch = ScratchDir::acquire(SCRATCH_PREFIX).map_err(DriverError::Scratch)?;

        let context = ExperimentContext {
            project_name: config.main.project_name.clone(),
            run_group: config.main.experiment_name.clone(),
            scratch_dir: scratch.path().to_path_buf(),
        };

        let mut steps = Vec::new();
        for step in StepId::ALL {
            if !selection.contains(step) {
                debug!(%step, "Step not selected, skipping");
                continue;
            }

            let invocation = self.prepare(step, config).await?;
            self.run_step(&invocation, &context).await?;
            steps.push(step);
        }

        if let Err(e) = scratch.release() {
            warn!(error = %e, "Scratch directory cleanup failed");
        }

        let report = RunReport {
            id: run_id,
            project_name: context.project_name,
            run_group: context.run_group,
            started_at,
            completed_at: Utc::now(),
            steps,
        };
        info!(
            %run_id,
            steps = report.steps.len(),
            duration_ms = report.duration().num_milliseconds(),
            "Pipeline completed"
        );

        Ok(report)
    }

    /// Delegate one invocation to the runner
    pub async fn run_step(
        &self,
        invocation: &StepInvocation,
        context: &ExperimentContext,
    ) -> Result<(), StepFailure> {
        let step = invocation.step;
        info!(
            %step,
            runner = self.runner.name(),
            working_dir = %invocation.working_dir.display(),
            "Running step"
        );
        let step_start = Instant::now();

        match self.runner.run(invocation, context).await {
            Ok(()) => {
                let duration_ms = step_start.elapsed().as_millis() as u64;
                info!(%step, duration_ms, "Step completed");
                Ok(())
            }
            Err(e) => Err(step_failed(step, e)),
        }
    }

    /// Build the invocation for `step`, writing the training config if needed
    async fn prepare(&self, step: StepId, config: &RunConfig) -> Result<StepInvocation, StepFailure> {
        // Only training reads rf_config; other steps never touch the path
        let rf_config = if step == StepId::TrainRandomForest {
            let path = self.rf_config_path().map_err(|e| step_failed(step, e))?;
            write_rf_config(config, &path)
                .await
                .map_err(|e| step_failed(step, e))?;
            path
        } else {
            PathBuf::new()
        };

        Ok(StepInvocation::for_step(step, config, &self.root, &rf_config))
    }
}

/// Serialize the `pipeline` section to `path`
async fn write_rf_config(config: &RunConfig, path: &Path) -> Result<()> {
    let content = config.pipeline_yaml()?;

    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write training config: {}", path.display()))?;

    debug!(path = %path.display(), "Wrote training config");
    Ok(())
}

fn step_failed(step: StepId, source: anyhow::Error) -> StepFailure {
    let cause = format!("{:#}", source);
    error!(%step, error = %cause, "Step failed");
    StepFailure::new(step, source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MlflowRunner;
    use std::fmt;
    use std::sync::{Arc, Mutex};
    use tracing::field::{Field, Visit};
    use tracing::span;
    use tracing_subscriber::layer::{Context as LayerContext, Layer, SubscriberExt};

    const CONFIG_YAML: &str = r#"
main:
  project_name: nyc_airbnb
  experiment_name: dev
  execute_steps: []
  random_state: 42
data:
  sample: data/sample1.csv
  test_size: 0.3
  val_size: 0.2
  stratify: neighbourhood_group
etl:
  min_price: 10
  max_price: 500
data_check:
  kl_threshold: 0.2
pipeline:
  export_artifact: model_export
"#;

    /// Collects values recorded for `run_id` on any span
    #[derive(Clone, Default)]
    struct RunIdLayer {
        recorded: Arc<Mutex<Vec<String>>>,
    }

    struct RunIdVisitor(Option<String>);

    impl Visit for RunIdVisitor {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            if field.name() == "run_id" {
                self.0 = Some(format!("{:?}", value));
            }
        }
    }

    impl<S: tracing::Subscriber> Layer<S> for RunIdLayer {
        fn on_record(&self, _id: &span::Id, values: &span::Record<'_>, _ctx: LayerContext<'_, S>) {
            let mut visitor = RunIdVisitor(None);
            values.record(&mut visitor);
            if let Some(run_id) = visitor.0 {
                self.recorded.lock().unwrap().push(run_id);
            }
        }
    }

    #[test]
    fn test_driver_creation() {
        let driver = PipelineDriver::new(MlflowRunner::new(), "/project");
        assert_eq!(driver.runner().name(), "mlflow");
        assert_eq!(driver.root(), Path::new("/project"));
    }

    #[test]
    fn test_rf_config_defaults_to_current_dir() {
        let driver = PipelineDriver::new(MlflowRunner::new(), "/elsewhere/project");
        let path = driver.rf_config_path().unwrap();

        assert!(path.is_absolute());
        assert_eq!(path, std::env::current_dir().unwrap().join(RF_CONFIG_FILE));
    }

    #[tokio::test]
    async fn test_only_training_touches_rf_config() {
        let temp = tempfile::TempDir::new().unwrap();
        let rf_config = temp.path().join("missing-dir").join(RF_CONFIG_FILE);
        let driver = PipelineDriver::new(MlflowRunner::new(), temp.path())
            .with_rf_config_path(&rf_config);
        let config = RunConfig::from_yaml(CONFIG_YAML).unwrap();

        for step in [StepId::DataGet, StepId::DataSplit, StepId::TestModel] {
            let invocation = driver.prepare(step, &config).await.unwrap();
            assert!(!invocation.parameters.contains_key("rf_config"));
        }
        assert!(!rf_config.exists());

        let failure = driver
            .prepare(StepId::TrainRandomForest, &config)
            .await
            .unwrap_err();
        assert_eq!(failure.step, StepId::TrainRandomForest);
    }

    #[tokio::test]
    async fn test_execute_span_records_run_id() {
        let layer = RunIdLayer::default();
        let subscriber = tracing_subscriber::registry().with(layer.clone());
        let _guard = tracing::subscriber::set_default(subscriber);

        let driver = PipelineDriver::new(MlflowRunner::new(), "/project");
        let config = RunConfig::from_yaml(CONFIG_YAML).unwrap();
        let report = driver.execute(&config).await.unwrap();

        assert_eq!(*layer.recorded.lock().unwrap(), vec![report.id.to_string()]);
    }
}

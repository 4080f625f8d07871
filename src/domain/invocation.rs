//! Step invocations and their parameter mappings.
//!
//! The parameter names and artifact references below are the contract with
//! the external components and must not change.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::RunConfig;

use super::step::StepId;

/// Entry point every component exposes
pub const ENTRY_POINT: &str = "main";

/// Artifact namespace of the experiment project
pub const ARTIFACT_NAMESPACE: &str = "nyc_airbnb";

/// Directory under the project root holding the components
pub const COMPONENTS_DIR: &str = "components";

/// A scalar passed to a component as `-P key=value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Str(v) => f.write_str(v),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<&Path> for ParamValue {
    fn from(v: &Path) -> Self {
        Self::Str(v.display().to_string())
    }
}

/// Parameter mapping for one component run
pub type Parameters = BTreeMap<String, ParamValue>;

/// Build `namespace/name:version`
pub fn artifact_ref(name: &str, version: &str) -> String {
    format!("{}/{}:{}", ARTIFACT_NAMESPACE, name, version)
}

/// One delegated component run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepInvocation {
    pub step: StepId,

    /// `<root>/components/<step>`
    pub working_dir: PathBuf,

    pub entry_point: String,

    pub parameters: Parameters,
}

impl StepInvocation {
    /// Create an invocation with no parameters
    pub fn new(step: StepId, root: &Path) -> Self {
        Self {
            step,
            working_dir: root.join(COMPONENTS_DIR).join(step.as_str()),
            entry_point: ENTRY_POINT.to_string(),
            parameters: Parameters::new(),
        }
    }

    /// Add a parameter
    pub fn with_param(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.parameters.insert(key.to_string(), value.into());
        self
    }

    /// Build the invocation for `step` from configuration
    ///
    /// `rf_config` is the serialized `pipeline` section; only
    /// `train_random_forest` uses it.
    pub fn for_step(step: StepId, config: &RunConfig, root: &Path, rf_config: &Path) -> Self {
        let invocation = Self::new(step, root);

        match step {
            StepId::DataGet => invocation
                .with_param("input_file", root.join(&config.data.sample).as_path())
                .with_param("artifact_name", "raw_data.csv")
                .with_param("artifact_type", "raw_data")
                .with_param("artifact_description", "Input raw dataset from csv file"),

            StepId::DataClean => invocation
                .with_param("input_artifact", artifact_ref("raw_data.csv", "latest"))
                .with_param("output_artifact_name", "clean_data.csv")
                .with_param("output_artifact_type", "clean_data")
                .with_param(
                    "output_artifact_description",
                    "Clean dataset with outliers removed",
                )
                .with_param("min_price", config.etl.min_price)
                .with_param("max_price", config.etl.max_price),

            StepId::DataCheck => invocation
                .with_param("csv", artifact_ref("clean_data.csv", "latest"))
                .with_param("ref", artifact_ref("clean_data.csv", "reference"))
                .with_param("kl_threshold", config.data_check.kl_threshold)
                .with_param("min_price", config.etl.min_price)
                .with_param("max_price", config.etl.max_price),

            StepId::DataSplit => invocation
                .with_param("input_data", artifact_ref("clean_data.csv", "latest"))
                .with_param("test_size", config.data.test_size)
                .with_param("random_state", config.main.random_state)
                .with_param("stratify", config.data.stratify.as_str()),

            StepId::TrainRandomForest => invocation
                .with_param("trainval_artifact", artifact_ref("trainval_data.csv", "latest"))
                .with_param("val_size", config.data.val_size)
                .with_param("random_state", config.main.random_state)
                .with_param("stratify", config.data.stratify.as_str())
                .with_param("rf_config", rf_config)
                .with_param("output_artifact", config.export_artifact()),

            StepId::TestModel => invocation
                .with_param("mlflow_model", artifact_ref(config.export_artifact(), "prod"))
                .with_param("test_dataset", artifact_ref("test_data.csv", "latest")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG_YAML: &str = r#"
main:
  project_name: nyc_airbnb
  experiment_name: dev
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
  kl_threshold: 0.25
pipeline:
  export_artifact: model_export
"#;

    fn invocation(step: StepId) -> StepInvocation {
        let config = RunConfig::from_yaml(CONFIG_YAML).unwrap();
        StepInvocation::for_step(
            step,
            &config,
            Path::new("/project"),
            Path::new("/work/rf_config.yaml"),
        )
    }

    fn params(entries: &[(&str, ParamValue)]) -> Parameters {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_working_dir_and_entry_point() {
        for step in StepId::ALL {
            let inv = invocation(step);
            assert_eq!(
                inv.working_dir,
                PathBuf::from("/project/components").join(step.as_str())
            );
            assert_eq!(inv.entry_point, "main");
        }
    }

    #[test]
    fn test_data_get_parameters() {
        assert_eq!(
            invocation(StepId::DataGet).parameters,
            params(&[
                ("input_file", "/project/data/sample1.csv".into()),
                ("artifact_name", "raw_data.csv".into()),
                ("artifact_type", "raw_data".into()),
                ("artifact_description", "Input raw dataset from csv file".into()),
            ])
        );
    }

    #[test]
    fn test_data_clean_parameters() {
        assert_eq!(
            invocation(StepId::DataClean).parameters,
            params(&[
                ("input_artifact", "nyc_airbnb/raw_data.csv:latest".into()),
                ("output_artifact_name", "clean_data.csv".into()),
                ("output_artifact_type", "clean_data".into()),
                (
                    "output_artifact_description",
                    "Clean dataset with outliers removed".into(),
                ),
                ("min_price", ParamValue::Float(10.0)),
                ("max_price", ParamValue::Float(500.0)),
            ])
        );
    }

    #[test]
    fn test_data_check_parameters() {
        assert_eq!(
            invocation(StepId::DataCheck).parameters,
            params(&[
                ("csv", "nyc_airbnb/clean_data.csv:latest".into()),
                ("ref", "nyc_airbnb/clean_data.csv:reference".into()),
                ("kl_threshold", ParamValue::Float(0.25)),
                ("min_price", ParamValue::Float(10.0)),
                ("max_price", ParamValue::Float(500.0)),
            ])
        );
    }

    #[test]
    fn test_data_split_parameters() {
        assert_eq!(
            invocation(StepId::DataSplit).parameters,
            params(&[
                ("input_data", "nyc_airbnb/clean_data.csv:latest".into()),
                ("test_size", ParamValue::Float(0.3)),
                ("random_state", ParamValue::Int(42)),
                ("stratify", "neighbourhood_group".into()),
            ])
        );
    }

    #[test]
    fn test_train_random_forest_parameters() {
        assert_eq!(
            invocation(StepId::TrainRandomForest).parameters,
            params(&[
                ("trainval_artifact", "nyc_airbnb/trainval_data.csv:latest".into()),
                ("val_size", ParamValue::Float(0.2)),
                ("random_state", ParamValue::Int(42)),
                ("stratify", "neighbourhood_group".into()),
                ("rf_config", "/work/rf_config.yaml".into()),
                ("output_artifact", "model_export".into()),
            ])
        );
    }

    #[test]
    fn test_test_model_parameters() {
        assert_eq!(
            invocation(StepId::TestModel).parameters,
            params(&[
                ("mlflow_model", "nyc_airbnb/model_export:prod".into()),
                ("test_dataset", "nyc_airbnb/test_data.csv:latest".into()),
            ])
        );
    }

    #[test]
    fn test_param_display() {
        assert_eq!(ParamValue::Float(10.0).to_string(), "10");
        assert_eq!(ParamValue::Float(0.2).to_string(), "0.2");
        assert_eq!(ParamValue::Int(42).to_string(), "42");
        assert_eq!(ParamValue::Bool(false).to_string(), "false");
    }
}

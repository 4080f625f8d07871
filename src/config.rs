//! Run configuration.
//!
//! Configuration sources (highest priority first):
//! 1. Command-line overrides (`section.key=value`, `+section.key=value`)
//! 2. Config file (`config.yaml` in the project root by default)
//!
//! Overrides are applied to the raw YAML tree before it is deserialized, so
//! an override value goes through the same typing as a value in the file.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::domain::ExecuteSteps;

/// Default config file name, looked up in the project root
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Full run configuration (matches YAML structure)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub main: MainConfig,
    pub data: DataConfig,
    pub etl: EtlConfig,
    pub data_check: DataCheckConfig,
    /// Model hyperparameters, handed to the training component verbatim
    pub pipeline: Mapping,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MainConfig {
    /// Experiment project all runs are logged under
    pub project_name: String,
    /// Run group shared by every step of this invocation
    pub experiment_name: String,
    #[serde(default)]
    pub execute_steps: ExecuteSteps,
    pub random_state: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Sample CSV, relative to the project root
    pub sample: String,
    pub test_size: f64,
    pub val_size: f64,
    /// Column to stratify on, or "none"
    pub stratify: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtlConfig {
    pub min_price: f64,
    pub max_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataCheckConfig {
    pub kl_threshold: f64,
}

impl RunConfig {
    /// Load a config file and apply overrides
    pub fn load(path: &Path, overrides: &[String]) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut tree: Value = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        for raw in overrides {
            Override::parse(raw)?.apply(&mut tree)?;
        }

        Self::from_value(tree)
    }

    /// Parse configuration from YAML content (no overrides)
    pub fn from_yaml(content: &str) -> Result<Self> {
        let tree: Value = serde_yaml::from_str(content).context("Failed to parse config YAML")?;
        Self::from_value(tree)
    }

    fn from_value(tree: Value) -> Result<Self> {
        let config: Self =
            serde_yaml::from_value(tree).context("Invalid run configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.main.project_name.is_empty() {
            anyhow::bail!("main.project_name cannot be empty");
        }

        if self.main.experiment_name.is_empty() {
            anyhow::bail!("main.experiment_name cannot be empty");
        }

        match self.pipeline.get("export_artifact") {
            Some(Value::String(name)) if !name.is_empty() => Ok(()),
            Some(_) => anyhow::bail!("pipeline.export_artifact must be a non-empty string"),
            None => anyhow::bail!("pipeline.export_artifact is missing"),
        }
    }

    /// Name the trained model is exported under
    pub fn export_artifact(&self) -> &str {
        // validate() guarantees presence for loaded configs
        self.pipeline
            .get("export_artifact")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Render the `pipeline` section as YAML
    pub fn pipeline_yaml(&self) -> Result<String> {
        serde_yaml::to_string(&self.pipeline).context("Failed to serialize pipeline config")
    }

    /// Render the whole configuration as YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize run configuration")
    }
}

/// A single `key.path=value` assignment from the command line
#[derive(Debug, Clone, PartialEq)]
pub struct Override {
    /// Dotted path split into segments
    pub path: Vec<String>,
    pub value: Value,
    /// `+key=value` may create a key that is not in the file
    pub append: bool,
}

impl Override {
    /// Parse `[+]a.b.c=value`
    ///
    /// The value is read as a YAML scalar, so `10` is an integer, `0.2` a
    /// float, `true` a bool and `a,b` a single string.
    pub fn parse(raw: &str) -> Result<Self> {
        let (key, value) = raw
            .split_once('=')
            .with_context(|| format!("Override '{}' is not of the form key=value", raw))?;

        let (append, key) = match key.strip_prefix('+') {
            Some(rest) => (true, rest),
            None => (false, key),
        };

        let path: Vec<String> = key.split('.').map(str::to_string).collect();
        if path.iter().any(|segment| segment.is_empty()) {
            anyhow::bail!("Override '{}' has an empty key segment", raw);
        }

        let value = if value.is_empty() {
            Value::String(String::new())
        } else {
            serde_yaml::from_str(value)
                .with_context(|| format!("Override '{}' has an unparsable value", raw))?
        };

        Ok(Self {
            path,
            value,
            append,
        })
    }

    /// Apply the override to a raw config tree
    pub fn apply(&self, tree: &mut Value) -> Result<()> {
        let dotted = self.path.join(".");
        let (last, parents) = self
            .path
            .split_last()
            .with_context(|| format!("Override '{}' has no key", dotted))?;

        let mut node = tree;
        for segment in parents {
            node = node
                .get_mut(segment.as_str())
                .with_context(|| format!("Override '{}': no section '{}'", dotted, segment))?;
        }

        let section = node
            .as_mapping_mut()
            .with_context(|| format!("Override '{}': parent is not a mapping", dotted))?;

        let key = Value::String(last.clone());
        if !self.append && !section.contains_key(&key) {
            anyhow::bail!(
                "Override '{}': key not in config (use '+{}=...' to add it)",
                dotted,
                dotted
            );
        }

        section.insert(key, self.value.clone());
        Ok(())
    }
}

//! Pipeline steps and step selection.
//!
//! The execution order is fixed by [`StepId::ALL`]. The selection read from
//! configuration only decides membership, never order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the six pipeline components, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    /// Upload the sample CSV as the raw dataset
    DataGet,
    /// Drop outliers and write the clean dataset
    DataClean,
    /// Deterministic and drift checks on the clean dataset
    DataCheck,
    /// Split into trainval and test sets
    DataSplit,
    /// Train and export the random forest model
    TrainRandomForest,
    /// Score the exported model on the test set
    TestModel,
}

impl StepId {
    /// Fixed execution order
    pub const ALL: [StepId; 6] = [
        StepId::DataGet,
        StepId::DataClean,
        StepId::DataCheck,
        StepId::DataSplit,
        StepId::TrainRandomForest,
        StepId::TestModel,
    ];

    /// Name used in configuration and as the component directory
    pub fn as_str(&self) -> &'static str {
        match self {
            StepId::DataGet => "data_get",
            StepId::DataClean => "data_clean",
            StepId::DataCheck => "data_check",
            StepId::DataSplit => "data_split",
            StepId::TrainRandomForest => "train_random_forest",
            StepId::TestModel => "test_model",
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StepId::ALL
            .into_iter()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown step '{}'", s))
    }
}

/// `main.execute_steps` as written in the config file
///
/// Accepts both YAML shapes:
/// - List: `execute_steps: [data_get, data_clean]`
/// - String: `execute_steps: data_get,data_clean` (typical of a CLI override)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExecuteSteps {
    List(Vec<String>),
    Csv(String),
}

impl Default for ExecuteSteps {
    fn default() -> Self {
        Self::List(StepId::ALL.iter().map(|s| s.as_str().to_string()).collect())
    }
}

/// Normalized list of requested step names
///
/// Names are kept as given; an unrecognized name never matches any step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepSelection {
    names: Vec<String>,
}

impl StepSelection {
    /// Whether `step` was requested
    pub fn contains(&self, step: StepId) -> bool {
        self.names.iter().any(|name| name == step.as_str())
    }

    /// Requested names in the order they were given
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Selected steps in execution order
    pub fn ordered(&self) -> Vec<StepId> {
        StepId::ALL
            .into_iter()
            .filter(|step| self.contains(*step))
            .collect()
    }

    /// Names that match no known step
    pub fn unknown(&self) -> Vec<&str> {
        self.names
            .iter()
            .filter(|name| name.parse::<StepId>().is_err())
            .map(String::as_str)
            .collect()
    }
}

impl From<&ExecuteSteps> for StepSelection {
    fn from(steps: &ExecuteSteps) -> Self {
        let names: Vec<String> = match steps {
            ExecuteSteps::List(list) => list.iter().map(|s| s.trim().to_string()).collect(),
            ExecuteSteps::Csv(csv) => csv.split(',').map(|s| s.trim().to_string()).collect(),
        };

        Self {
            names: names.into_iter().filter(|n| !n.is_empty()).collect(),
        }
    }
}

//! Summary of a completed pipeline run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::step::StepId;

/// Outcome of a successful pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique identifier for this run (log correlation only)
    pub id: Uuid,

    /// Experiment project the steps were grouped under
    pub project_name: String,

    /// Run group shared by all steps
    pub run_group: String,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the last step finished
    pub completed_at: DateTime<Utc>,

    /// Steps that ran, in execution order
    pub steps: Vec<StepId>,
}

impl RunReport {
    /// Wall-clock duration of the run
    pub fn duration(&self) -> chrono::Duration {
        self.completed_at - self.started_at
    }

    /// Whether `step` ran
    pub fn ran(&self, step: StepId) -> bool {
        self.steps.contains(&step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_queries() {
        let started_at = Utc::now();
        let report = RunReport {
            id: Uuid::new_v4(),
            project_name: "nyc_airbnb".to_string(),
            run_group: "dev".to_string(),
            started_at,
            completed_at: started_at + chrono::Duration::seconds(5),
            steps: vec![StepId::DataGet, StepId::DataClean],
        };

        assert!(report.ran(StepId::DataClean));
        assert!(!report.ran(StepId::TestModel));
        assert_eq!(report.duration().num_seconds(), 5);
    }
}

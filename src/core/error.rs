//! Driver error types.

use thiserror::Error;

use crate::domain::StepId;

/// A step whose delegation failed
///
/// Carries the underlying cause unchanged; the pipeline stops here.
#[derive(Debug, Error)]
#[error("step '{step}' failed: {source:#}")]
pub struct StepFailure {
    pub step: StepId,

    #[source]
    pub source: anyhow::Error,
}

impl StepFailure {
    pub fn new(step: StepId, source: anyhow::Error) -> Self {
        Self { step, source }
    }
}

/// Errors surfaced by a pipeline run
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Failed to create scratch directory: {0}")]
    Scratch(#[source] std::io::Error),

    #[error(transparent)]
    Step(#[from] StepFailure),
}

impl DriverError {
    /// The failing step, if a step failed
    pub fn step(&self) -> Option<StepId> {
        match self {
            DriverError::Step(failure) => Some(failure.step),
            DriverError::Scratch(_) => None,
        }
    }
}

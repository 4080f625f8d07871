//! Core orchestration logic.
//!
//! This module contains:
//! - Driver: Fixed-order step execution
//! - Error: Step failure types
//! - Scratch: Run-scoped scratch directory

pub mod driver;
pub mod error;
pub mod scratch;

// Re-export commonly used types
pub use driver::{resolve_steps, PipelineDriver, RF_CONFIG_FILE};
pub use error::{DriverError, StepFailure};
pub use scratch::ScratchDir;

//! Domain types for the pipeline driver.
//!
//! This module contains the core data structures:
//! - Step: The fixed step enumeration and the step selection
//! - Invocation: One delegated component run and its parameters
//! - Run: Summary of a finished run

pub mod invocation;
pub mod run;
pub mod step;

// Re-export commonly used types
pub use invocation::{artifact_ref, ParamValue, Parameters, StepInvocation};
pub use run::RunReport;
pub use step::{ExecuteSteps, StepId, StepSelection};

//! Cleaning module - typed-table pipeline for raw listing data

pub mod clean;
pub mod parse;
pub mod pipeline;
pub mod types;
pub mod write;

pub use pipeline::{run_job, CleaningJob, JobOutcome};
pub use types::*;

// Library module for testable functions

pub mod artifact;
pub mod cleaning;
pub mod config;
pub mod error;

pub use error::{CleaningError, Result};

/// Closed-interval membership: min <= value <= max
/// NaN is never inside any range
pub fn in_closed_range(value: f64, min: f64, max: f64) -> bool {
    value >= min && value <= max
}

//! Problem files, synthetic problems and a runner for polynest.
//!
//! This crate provides:
//! - A JSON problem format (bin outline, parts with quantities, config overrides)
//! - Synthetic problem generation for stress testing
//! - A runner that drives the nester and reports in input coordinates

mod problem;
mod result;
mod runner;
mod synthetic;

pub use problem::{ConfigOverrides, PartSpec, Problem};
pub use result::{PlacementInfo, RunReport};
pub use runner::{NestRunner, RunnerConfig};
pub use synthetic::{SyntheticGenerator, SyntheticKind};

use thiserror::Error;

/// Errors from loading, running or saving problems.
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("nesting failed: {0}")]
    Nest(#[from] polynest_core::Error),

    #[error("invalid problem: {0}")]
    Problem(String),
}

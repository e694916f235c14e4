//! Run reports.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::BenchError;

/// Placement info for JSON output, in problem coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementInfo {
    /// Index of the expanded part.
    pub part: usize,
    /// Index of the part spec in the problem file.
    pub spec: usize,
    /// Which bin this placement belongs to (0-indexed).
    pub bin: usize,
    pub position: [f64; 2],
    pub rotation: f64,
}

/// Result of one nesting run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub problem: String,
    /// Genomes evaluated.
    pub evaluations: u32,
    /// Generation reached by the genetic search.
    pub generation: u32,
    /// Best fitness (lower is better).
    pub fitness: f64,
    pub bins_used: usize,
    pub parts_placed: usize,
    pub total_parts: usize,
    /// Placed part area over the area of the bins used (0.0 - 1.0).
    pub utilization: f64,
    /// Wall time in milliseconds.
    pub time_ms: u64,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub placements: Vec<PlacementInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub unplaced: Vec<usize>,
}

impl RunReport {
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), BenchError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Prints a summary table to stdout.
    pub fn print_summary(&self) {
        println!("\n{:=<72}", "");
        println!("NESTING RESULT: {}", self.problem);
        println!("{:=<72}", "");
        println!(
            "{:>8} {:>6} {:>12} {:>6} {:>10} {:>8} {:>10}",
            "Evals", "Gen", "Fitness", "Bins", "Placed", "Util%", "Time(ms)"
        );
        println!("{:-<72}", "");
        println!(
            "{:>8} {:>6} {:>12.6} {:>6} {:>10} {:>8.1} {:>10}",
            self.evaluations,
            self.generation,
            self.fitness,
            self.bins_used,
            format!("{}/{}", self.parts_placed, self.total_parts),
            self.utilization * 100.0,
            self.time_ms
        );
        if !self.unplaced.is_empty() {
            println!("unplaced parts: {:?}", self.unplaced);
        }
        println!("{:=<72}\n", "");
    }
}

//! Progress reporting for long-running nesting sessions.

/// Progress callback invoked after each genome evaluation.
pub type ProgressCallback = Box<dyn Fn(ProgressInfo) + Send + Sync>;

/// Snapshot of a running nesting session.
#[derive(Debug, Clone, Default)]
pub struct ProgressInfo {
    /// Number of genomes evaluated so far.
    pub evaluation: u32,
    /// Total evaluations requested (0 if open-ended).
    pub total_evaluations: u32,
    /// Genetic search generation.
    pub generation: u32,
    /// Best fitness so far.
    pub best_fitness: f64,
    /// Parts placed by the best result.
    pub items_placed: usize,
    /// Total number of parts.
    pub total_items: usize,
    /// Elapsed time in milliseconds.
    pub elapsed_ms: u64,
    /// Whether the result reported with this snapshot improved on the best.
    pub improved: bool,
    /// Whether the session is still running.
    pub running: bool,
}

impl ProgressInfo {
    pub fn new() -> Self {
        Self {
            running: true,
            ..Default::default()
        }
    }

    pub fn with_evaluation(mut self, current: u32, total: u32) -> Self {
        self.evaluation = current;
        self.total_evaluations = total;
        self
    }

    pub fn with_generation(mut self, generation: u32) -> Self {
        self.generation = generation;
        self
    }

    pub fn with_fitness(mut self, fitness: f64) -> Self {
        self.best_fitness = fitness;
        self
    }

    pub fn with_items(mut self, placed: usize, total: usize) -> Self {
        self.items_placed = placed;
        self.total_items = total;
        self
    }

    pub fn with_elapsed(mut self, elapsed_ms: u64) -> Self {
        self.elapsed_ms = elapsed_ms;
        self
    }

    pub fn with_improved(mut self, improved: bool) -> Self {
        self.improved = improved;
        self
    }

    /// Marks the session as finished.
    pub fn finished(mut self) -> Self {
        self.running = false;
        self
    }

    /// Progress fraction (0.0 to 1.0), 0 when open-ended.
    pub fn progress_percent(&self) -> f64 {
        if self.total_evaluations > 0 {
            f64::from(self.evaluation) / f64::from(self.total_evaluations)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let info = ProgressInfo::new()
            .with_evaluation(5, 20)
            .with_items(3, 4)
            .with_fitness(1.25);
        assert!(info.running);
        assert_eq!(info.progress_percent(), 0.25);
        assert!(!info.finished().running);
    }
}

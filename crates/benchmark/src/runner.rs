//! Runs a problem through the nester.

use instant::Instant;
use polynest_core::{PlacementResult, Polygon, ProgressInfo};
use polynest_d2::Nester;

use crate::problem::Problem;
use crate::result::{PlacementInfo, RunReport};
use crate::BenchError;

/// Configuration for runs.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Genome evaluations per run.
    pub evaluations: u32,
    /// Stop early after this many milliseconds (0 = unlimited).
    pub time_limit_ms: u64,
    /// Worker threads (`None` = one per core).
    pub threads: Option<usize>,
    /// Seed for the genetic search.
    pub seed: Option<u64>,
    /// Whether to print progress lines.
    pub show_progress: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            evaluations: 50,
            time_limit_ms: 0,
            threads: None,
            seed: None,
            show_progress: true,
        }
    }
}

impl RunnerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_evaluations(mut self, evaluations: u32) -> Self {
        self.evaluations = evaluations;
        self
    }

    pub fn with_time_limit(mut self, ms: u64) -> Self {
        self.time_limit_ms = ms;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }
}

/// Nesting runner.
pub struct NestRunner {
    config: RunnerConfig,
}

impl NestRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Nests `problem` and reports the best layout found.
    pub fn run(&self, problem: &Problem) -> Result<RunReport, BenchError> {
        let (parts, origin) = problem.expand();
        let bin = problem.bin_polygon();

        let mut nester = Nester::new(problem.nest_config())?;
        if let Some(threads) = self.config.threads {
            nester = nester.with_threads(threads);
        }
        if let Some(seed) = self.config.seed {
            nester = nester.with_seed(seed);
        }
        if self.config.show_progress {
            nester = nester.with_progress(Box::new(|info: ProgressInfo| {
                if info.improved {
                    println!(
                        "  eval {:>4}  gen {:>3}  fitness {:.6}  placed {}/{}",
                        info.evaluation, info.generation, info.best_fitness, info.items_placed, info.total_items
                    );
                }
            }));
        }

        if self.config.show_progress {
            println!("\nNesting {}: {} parts", problem.name, parts.len());
        }
        let start = Instant::now();
        nester.start(&bin, &parts)?;

        for _ in 0..self.config.evaluations {
            if self.config.time_limit_ms > 0 && start.elapsed().as_millis() as u64 >= self.config.time_limit_ms {
                log::debug!("time limit reached after {} evaluations", nester.evaluations());
                break;
            }
            nester.step()?;
        }
        let elapsed = start.elapsed().as_millis() as u64;
        nester.terminate();

        let best = nester
            .best()
            .ok_or_else(|| BenchError::Problem("no genome was evaluated".into()))?;
        let bounds = nester
            .bin_bounds()
            .ok_or_else(|| BenchError::Problem("nester has no bin".into()))?;

        Ok(RunReport {
            problem: problem.name.clone(),
            evaluations: nester.evaluations(),
            generation: nester.generation(),
            fitness: best.fitness,
            bins_used: best.bins_used(),
            parts_placed: best.placed_count(),
            total_parts: parts.len(),
            utilization: utilization(best, &parts, bounds.area),
            time_ms: elapsed,
            placements: to_placement_infos(best, &origin, |x, y| bounds.to_input(x, y)),
            unplaced: best.unplaced.iter().map(|&s| s as usize).collect(),
        })
    }
}

fn to_placement_infos(
    result: &PlacementResult,
    origin: &[usize],
    to_input: impl Fn(f64, f64) -> (f64, f64),
) -> Vec<PlacementInfo> {
    result
        .placements()
        .map(|(bin, p)| {
            let part = p.source as usize;
            let (x, y) = to_input(p.x, p.y);
            PlacementInfo {
                part,
                spec: origin.get(part).copied().unwrap_or(part),
                bin,
                position: [x, y],
                rotation: p.rotation,
            }
        })
        .collect()
}

/// Placed part area over the area of every bin used.
fn utilization(result: &PlacementResult, parts: &[Polygon], bin_area: f64) -> f64 {
    let bins = result.bins_used();
    if bins == 0 || bin_area <= 0.0 {
        return 0.0;
    }
    let placed: f64 = result
        .placements()
        .filter_map(|(_, p)| parts.get(p.source as usize))
        .map(Polygon::abs_area)
        .sum();
    placed / (bins as f64 * bin_area)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::PartSpec;

    fn problem() -> Problem {
        Problem {
            name: "squares".into(),
            bin: vec![[10.0, 10.0], [110.0, 10.0], [110.0, 110.0], [10.0, 110.0]],
            parts: vec![PartSpec::new(vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]], 2)],
            config: Default::default(),
        }
    }

    #[test]
    fn test_run_reports_input_coordinates() {
        let mut problem = problem();
        problem.config.rotations = Some(1);
        problem.config.population_size = Some(2);
        let config = RunnerConfig::new().with_evaluations(2).with_threads(1).with_seed(5).quiet();
        let report = NestRunner::new(config).run(&problem).unwrap();

        assert_eq!(report.evaluations, 2);
        assert_eq!(report.parts_placed, 2);
        assert_eq!(report.bins_used, 1);
        assert!((report.utilization - 0.02).abs() < 1e-9);
        for p in &report.placements {
            assert_eq!(p.spec, 0);
            assert!(p.position[0] >= 10.0 - 1e-6 && p.position[1] >= 10.0 - 1e-6);
        }
    }
}

//! 2D nesting session.
//!
//! A [`Nester`] drives the generation loop: the genetic search proposes a
//! genome, the NFP store turns the pairs it has not seen yet into pair jobs,
//! the worker pool computes them, and a single placement job then scores the
//! genome. Pair jobs always finish before the placement job is issued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use polynest_core::{
    Error, GeneticSearch, NestConfig, PackedConfig, PlacementResult, Polygon, PolygonNode, ProgressCallback,
    ProgressInfo, Result, RotationTable,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::codec::{decode_placement_result, PairJob, MAX_KEYED_SOURCE};
use crate::nfp_store::NfpStore;
use crate::tree::{BinBounds, TreeBuilder};
use crate::worker::WorkerPool;

/// State of a started session.
struct Session {
    bin: BinBounds,
    search: GeneticSearch,
    total_items: usize,
    started: Instant,
}

/// Nesting session over one bin and a set of parts.
pub struct Nester {
    config: NestConfig,
    packed: PackedConfig,
    table: Arc<RotationTable>,
    pool: WorkerPool,
    store: NfpStore,
    session: Option<Session>,
    best: Option<PlacementResult>,
    evaluations: u32,
    /// Evaluation count [`Nester::run`] is heading for; 0 when stepping by hand.
    planned: u32,
    stop: Arc<AtomicBool>,
    progress: Option<ProgressCallback>,
    seed: Option<u64>,
}

impl Nester {
    /// Creates a nester. Fails if the configuration does not fit the packed
    /// job format.
    pub fn new(config: NestConfig) -> Result<Self> {
        config.validate()?;
        let packed = PackedConfig::try_from(&config)?;
        let pool = WorkerPool::with_available_parallelism(config.clipper_scale);
        let stop = pool.stop_handle();
        Ok(Self {
            table: Arc::new(RotationTable::new(config.rotations)),
            config,
            packed,
            pool,
            store: NfpStore::new(),
            session: None,
            best: None,
            evaluations: 0,
            planned: 0,
            stop,
            progress: None,
            seed: None,
        })
    }

    /// Uses `threads` workers instead of one per core.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.pool = WorkerPool::new(threads, self.config.clipper_scale);
        self.pool.set_stop_handle(Arc::clone(&self.stop));
        self
    }

    /// Seeds the genetic search so that runs are reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Reports progress after every genome evaluation.
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn config(&self) -> &NestConfig {
        &self.config
    }

    /// Prepares the bin and the part forest and seeds the population.
    ///
    /// Part sources in results are indices into `parts`.
    pub fn start(&mut self, bin: &Polygon, parts: &[Polygon]) -> Result<()> {
        if parts.len() > MAX_KEYED_SOURCE as usize + 1 {
            return Err(Error::ConfigError(format!(
                "{} parts exceed the {} sources a cache key can address",
                parts.len(),
                MAX_KEYED_SOURCE + 1
            )));
        }

        let builder = TreeBuilder::new(&self.config);
        let bin = builder.generate_bounds(bin)?;
        let nodes = builder.generate_tree(parts);
        if nodes.is_empty() {
            return Err(Error::InvalidGeometry("no usable parts".into()));
        }
        log::debug!(
            "nesting {} parts ({} nodes) in a {}x{} bin",
            nodes.len(),
            nodes.iter().map(PolygonNode::count).sum::<usize>(),
            bin.bounds.width(),
            bin.bounds.height()
        );

        let search = match self.seed {
            Some(seed) => GeneticSearch::init_with_rng(
                nodes,
                bin.bounds,
                &self.config,
                Arc::clone(&self.table),
                StdRng::seed_from_u64(seed),
            )?,
            None => GeneticSearch::init(nodes, bin.bounds, &self.config, Arc::clone(&self.table))?,
        };

        self.stop.store(false, Ordering::Relaxed);
        self.store.clean();
        self.best = None;
        self.evaluations = 0;
        self.session = Some(Session {
            bin,
            search,
            total_items: parts.len(),
            started: Instant::now(),
        });
        Ok(())
    }

    /// Evaluates one genome: pair jobs first, then the placement job.
    ///
    /// Returns the genome's placement result. A result that arrives after
    /// [`Nester::stop_handle`] was set is discarded and `Cancelled` returned.
    pub fn step(&mut self) -> Result<PlacementResult> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| Error::Internal("nester was not started".into()))?;
        if self.stop.load(Ordering::Relaxed) {
            return Err(Error::Cancelled);
        }

        let index = session.search.next_individual();
        let genome = session.search.phenotype(index).clone();

        let jobs = self.store.init(
            session.search.nodes(),
            &genome,
            &session.bin.node,
            self.packed,
            &self.table,
        );
        let packets: Vec<Vec<u8>> = jobs.iter().map(PairJob::encode).collect();
        let pair_results = self.pool.run(packets)?;
        self.store.update(pair_results)?;

        let placement = self
            .store
            .placement_data(session.bin.area)
            .ok_or_else(|| Error::Internal("nfp store was not initialized".into()))?;
        let bytes = self
            .pool
            .run(vec![placement])?
            .pop()
            .ok_or_else(|| Error::Internal("placement job returned nothing".into()))?;
        let result = decode_placement_result(&bytes)?;

        if self.stop.load(Ordering::Relaxed) {
            return Err(Error::Cancelled);
        }

        session.search.set_fitness(index, result.fitness);
        self.evaluations += 1;
        let improved = self.best.as_ref().map_or(true, |best| result.fitness < best.fitness);
        if improved {
            log::debug!(
                "evaluation {}: fitness {:.6}, {} bins, {} unplaced",
                self.evaluations,
                result.fitness,
                result.bins_used(),
                result.unplaced.len()
            );
            self.best = Some(result.clone());
        }

        if let Some(info) = self.snapshot(&result) {
            if let Some(callback) = &self.progress {
                callback(info.with_improved(improved));
            }
        }
        Ok(result)
    }

    /// Runs `evaluations` steps, or fewer if stopped, and returns the best
    /// result found so far.
    pub fn run(&mut self, evaluations: u32) -> Result<Option<&PlacementResult>> {
        self.planned = self.evaluations + evaluations;
        let outcome = self.run_steps(evaluations);
        if outcome.is_ok() {
            if let (Some(callback), Some(best)) = (&self.progress, &self.best) {
                if let Some(info) = self.snapshot(best) {
                    callback(info.finished());
                }
            }
        }
        self.planned = 0;
        outcome?;
        Ok(self.best.as_ref())
    }

    fn run_steps(&mut self, evaluations: u32) -> Result<()> {
        for _ in 0..evaluations {
            match self.step() {
                Ok(_) => {}
                Err(Error::Cancelled) => {
                    log::debug!("nesting stopped after {} evaluations", self.evaluations);
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Progress snapshot against the best result, or `latest` if there is none yet.
    fn snapshot(&self, latest: &PlacementResult) -> Option<ProgressInfo> {
        let session = self.session.as_ref()?;
        let best = self.best.as_ref().unwrap_or(latest);
        Some(
            ProgressInfo::new()
                .with_evaluation(self.evaluations, self.planned)
                .with_generation(session.search.generation())
                .with_fitness(best.fitness)
                .with_items(best.placed_count(), session.total_items)
                .with_elapsed(session.started.elapsed().as_millis() as u64),
        )
    }

    /// Shared stop flag; setting it cancels the evaluation in flight.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Best result so far, in prepared-bin coordinates.
    pub fn best(&self) -> Option<&PlacementResult> {
        self.best.as_ref()
    }

    /// Number of genomes evaluated since [`Nester::start`].
    pub fn evaluations(&self) -> u32 {
        self.evaluations
    }

    /// Generation the genetic search is on; 0 before [`Nester::start`].
    pub fn generation(&self) -> u32 {
        self.session.as_ref().map_or(0, |s| s.search.generation())
    }

    /// Prepared bin; maps placements back to input coordinates.
    pub fn bin_bounds(&self) -> Option<&BinBounds> {
        self.session.as_ref().map(|s| &s.bin)
    }

    /// Stops the worker threads and drops the cache. A later
    /// [`Nester::step`] starts new workers.
    pub fn terminate(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        self.pool.terminate();
        self.store.clean();
        self.stop.store(false, Ordering::Relaxed);
    }
}

impl std::fmt::Debug for Nester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Nester")
            .field("config", &self.config)
            .field("pool", &self.pool)
            .field("evaluations", &self.evaluations)
            .field("best", &self.best.as_ref().map(|b| b.fitness))
            .finish()
    }
}

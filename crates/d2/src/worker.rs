//! Bounded pool of worker threads running job packets.
//!
//! A job is a flat byte buffer (see [`crate::codec`]) and so is its result;
//! nothing else crosses the thread boundary. Each worker owns its own
//! [`NfpEngine`] and [`PlacementEngine`], so no state is shared between
//! threads.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use polynest_core::{Error, Result};

use crate::codec::{decode_job, encode_pair_result, encode_placement_result, Job};
use crate::nfp::NfpEngine;
use crate::placement::PlacementEngine;

/// How often a waiting batch checks the stop flag.
const STOP_POLL: Duration = Duration::from_millis(20);

/// Runs one job packet and returns the encoded result.
pub fn process_job(nfp: &mut NfpEngine, placement: &mut PlacementEngine, bytes: &[u8]) -> Result<Vec<u8>> {
    match decode_job(bytes)? {
        Job::Pair(job) => {
            let loops = nfp.pair_nfp(&job)?;
            Ok(encode_pair_result(job.key, &loops))
        }
        Job::Placement(job) => Ok(encode_placement_result(&placement.place_paths(&job))),
    }
}

struct Task {
    batch: u64,
    index: usize,
    bytes: Vec<u8>,
}

struct Outcome {
    batch: u64,
    index: usize,
    worker: usize,
    result: Result<Vec<u8>>,
}

struct Worker {
    sender: Sender<Task>,
    handle: JoinHandle<()>,
}

fn spawn_worker(id: usize, clipper_scale: f64, results: Sender<Outcome>) -> Result<Worker> {
    let (sender, tasks) = mpsc::channel::<Task>();
    let handle = thread::Builder::new()
        .name(format!("polynest-worker-{}", id))
        .spawn(move || {
            let mut nfp = NfpEngine::new();
            let mut placement = PlacementEngine::new(clipper_scale);
            for task in tasks {
                let result = catch_unwind(AssertUnwindSafe(|| process_job(&mut nfp, &mut placement, &task.bytes)))
                    .unwrap_or_else(|_| {
                        // scratch state may be half-updated after a panic
                        nfp = NfpEngine::new();
                        placement = PlacementEngine::new(clipper_scale);
                        Err(Error::WorkerError(format!("worker {} panicked on job {}", id, task.index)))
                    });
                let outcome = Outcome {
                    batch: task.batch,
                    index: task.index,
                    worker: id,
                    result,
                };
                if results.send(outcome).is_err() {
                    break;
                }
            }
        })
        .map_err(|e| Error::WorkerError(format!("failed to spawn worker {}: {}", id, e)))?;
    Ok(Worker { sender, handle })
}

/// Fixed-size thread pool with round-robin dispatch and ordered results.
pub struct WorkerPool {
    size: usize,
    clipper_scale: f64,
    workers: Vec<Worker>,
    results: Option<(Sender<Outcome>, Receiver<Outcome>)>,
    batch: u64,
    /// Dispatched tasks whose outcome has not been received yet.
    in_flight: usize,
    stop: Arc<AtomicBool>,
}

impl WorkerPool {
    /// Creates a pool of `size` workers. Threads start on the first batch.
    pub fn new(size: usize, clipper_scale: f64) -> Self {
        Self {
            size: size.max(1),
            clipper_scale,
            workers: Vec::new(),
            results: None,
            batch: 0,
            in_flight: 0,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Creates a pool sized to the available hardware parallelism.
    pub fn with_available_parallelism(clipper_scale: f64) -> Self {
        let size = thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        Self::new(size, clipper_scale)
    }

    /// Number of workers the pool runs.
    pub fn size(&self) -> usize {
        self.size
    }

    /// True while worker threads are alive.
    pub fn is_running(&self) -> bool {
        !self.workers.is_empty()
    }

    /// Shares the stop flag. Setting it cancels the batch in flight.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Tasks handed to workers and not yet reported back. Nonzero between
    /// an aborted batch and the next [`WorkerPool::run`].
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn set_stop_handle(&mut self, stop: Arc<AtomicBool>) {
        self.stop = stop;
    }

    /// Runs every job and returns the results in job order.
    ///
    /// At most one job per worker is in flight; a worker gets the next queued
    /// job as soon as it reports back. The first failing job aborts the batch
    /// and its error is returned. Jobs of an aborted or cancelled batch that
    /// are still running are waited for, and their results discarded, at the
    /// start of the next batch.
    pub fn run(&mut self, jobs: Vec<Vec<u8>>) -> Result<Vec<Vec<u8>>> {
        if jobs.is_empty() {
            return Ok(Vec::new());
        }
        self.ensure_started()?;
        self.drain()?;
        self.batch += 1;
        let batch = self.batch;

        let total = jobs.len();
        let mut queue = jobs.into_iter().enumerate();
        let mut output: Vec<Option<Vec<u8>>> = Vec::with_capacity(total);
        output.resize_with(total, || None);

        for worker in 0..self.workers.len() {
            let Some((index, bytes)) = queue.next() else {
                break;
            };
            self.dispatch(worker, Task { batch, index, bytes })?;
        }

        let mut received = 0;
        while received < total {
            if self.stop.load(Ordering::Relaxed) {
                return Err(Error::Cancelled);
            }
            let Some(outcome) = self.receive()? else {
                continue;
            };
            if outcome.batch != batch {
                continue;
            }

            received += 1;
            output[outcome.index] = Some(outcome.result?);
            if let Some((index, bytes)) = queue.next() {
                self.dispatch(outcome.worker, Task { batch, index, bytes })?;
            }
        }

        output
            .into_iter()
            .enumerate()
            .map(|(i, bytes)| bytes.ok_or_else(|| Error::Internal(format!("job {} has no result", i))))
            .collect()
    }

    /// Stops every worker and waits for them to exit. The next
    /// [`WorkerPool::run`] starts a fresh set.
    pub fn terminate(&mut self) {
        let workers = std::mem::take(&mut self.workers);
        self.results = None;
        self.in_flight = 0;
        for worker in workers {
            drop(worker.sender);
            if worker.handle.join().is_err() {
                log::warn!("worker thread exited with a panic");
            }
        }
    }

    fn ensure_started(&mut self) -> Result<()> {
        if self.is_running() {
            return Ok(());
        }
        let (sender, receiver) = mpsc::channel();
        let workers = (0..self.size)
            .map(|id| spawn_worker(id, self.clipper_scale, sender.clone()))
            .collect::<Result<Vec<_>>>()?;
        log::debug!("started {} workers", workers.len());
        self.workers = workers;
        self.results = Some((sender, receiver));
        Ok(())
    }

    /// Waits up to one stop poll for an outcome.
    fn receive(&mut self) -> Result<Option<Outcome>> {
        let Some((_, receiver)) = &self.results else {
            return Err(Error::Internal("worker pool has no result channel".into()));
        };
        match receiver.recv_timeout(STOP_POLL) {
            Ok(outcome) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Ok(Some(outcome))
            }
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(Error::WorkerError("result channel closed".into())),
        }
    }

    /// Discards outcomes left over from an aborted batch.
    fn drain(&mut self) -> Result<()> {
        if self.in_flight > 0 {
            log::debug!("waiting for {} jobs of an aborted batch", self.in_flight);
        }
        while self.in_flight > 0 {
            if self.stop.load(Ordering::Relaxed) {
                return Err(Error::Cancelled);
            }
            self.receive()?;
        }
        Ok(())
    }

    fn dispatch(&mut self, worker: usize, task: Task) -> Result<()> {
        let worker = self
            .workers
            .get(worker)
            .ok_or_else(|| Error::Internal(format!("no worker {}", worker)))?;
        worker
            .sender
            .send(task)
            .map_err(|_| Error::WorkerError("worker channel closed".into()))?;
        self.in_flight += 1;
        Ok(())
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.terminate();
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("size", &self.size)
            .field("running", &self.is_running())
            .field("batch", &self.batch)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode_pair_result, NfpKey, PairJob};
    use polynest_core::{PackedConfig, Polygon, PolygonNode};

    fn pair_job(stationary: i32, size: f64) -> Vec<u8> {
        let mut config = PackedConfig::unpack(0);
        config.rotations = 1;
        PairJob {
            key: NfpKey::new(stationary, 99, 0, 0, false).pack(),
            config,
            stationary: PolygonNode::new(stationary, Polygon::rectangle(0.0, 0.0, size, size)),
            moving: PolygonNode::new(99, Polygon::rectangle(0.0, 0.0, 5.0, 5.0)),
        }
        .encode()
    }

    #[test]
    fn test_results_keep_job_order() {
        let mut pool = WorkerPool::new(3, 1e7);
        let jobs: Vec<Vec<u8>> = (0..8).map(|i| pair_job(i, 10.0 + f64::from(i))).collect();
        let results = pool.run(jobs).unwrap();
        assert_eq!(results.len(), 8);
        for (i, bytes) in results.iter().enumerate() {
            let (key, loops) = decode_pair_result(bytes).unwrap();
            assert_eq!(NfpKey::unpack(key).stationary, i as i32);
            let side = 15.0 + i as f64;
            assert!((loops[0].abs_area() - side * side).abs() < 1e-6);
        }
    }

    #[test]
    fn test_bad_packet_fails_batch() {
        let mut pool = WorkerPool::new(2, 1e7);
        let jobs = vec![pair_job(0, 10.0), vec![9u8; 16]];
        assert!(matches!(pool.run(jobs), Err(Error::BufferError(_))));

        // the pool stays usable afterwards
        assert_eq!(pool.run(vec![pair_job(1, 10.0)]).unwrap().len(), 1);
    }

    #[test]
    fn test_aborted_batch_is_drained() {
        let mut pool = WorkerPool::new(2, 1e7);
        let mut jobs = vec![vec![9u8; 16]];
        jobs.extend((0..6).map(|i| pair_job(i, 40.0)));
        assert!(matches!(pool.run(jobs), Err(Error::BufferError(_))));
        assert!(pool.in_flight() <= 1);

        let results = pool.run(vec![pair_job(7, 10.0), pair_job(8, 10.0)]).unwrap();
        assert_eq!(pool.in_flight(), 0);
        for (i, bytes) in results.iter().enumerate() {
            let (key, _) = decode_pair_result(bytes).unwrap();
            assert_eq!(NfpKey::unpack(key).stationary, 7 + i as i32);
        }
    }

    #[test]
    fn test_cancelled_batch() {
        let mut pool = WorkerPool::new(1, 1e7);
        pool.stop_handle().store(true, Ordering::Relaxed);
        assert!(matches!(pool.run(vec![pair_job(0, 10.0)]), Err(Error::Cancelled)));

        pool.stop_handle().store(false, Ordering::Relaxed);
        assert_eq!(pool.run(vec![pair_job(1, 10.0)]).unwrap().len(), 1);
        assert_eq!(pool.in_flight(), 0);
    }

    #[test]
    fn test_terminate_and_restart() {
        let mut pool = WorkerPool::new(2, 1e7);
        assert!(pool.run(Vec::new()).unwrap().is_empty());
        assert!(!pool.is_running());

        pool.run(vec![pair_job(0, 10.0)]).unwrap();
        assert!(pool.is_running());
        pool.terminate();
        assert!(!pool.is_running());
        assert_eq!(pool.run(vec![pair_job(0, 10.0)]).unwrap().len(), 1);
    }
}

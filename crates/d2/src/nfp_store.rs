//! Per-generation NFP cache.
//!
//! Each genome evaluation asks for the NFPs of every part against the bin and
//! against every part placed before it. Entries computed for earlier genomes
//! are carried over when the same key shows up again; everything else is
//! emitted as a pair job.

use std::collections::{BTreeMap, HashSet};

use polynest_core::{PackedConfig, Phenotype, PolygonNode, Result, RotationTable};

use crate::codec::{encode_nfp_cache, pair_result_key, NfpKey, PairJob, PlacementJob, EMPTY_RESULT_BYTES};

/// Encoded pair results keyed by packed [`NfpKey`].
#[derive(Debug, Default)]
pub struct NfpStore {
    cache: BTreeMap<u32, Vec<u8>>,
    parts: Vec<PolygonNode>,
    config: Option<PackedConfig>,
}

impl NfpStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached pair results.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn contains(&self, key: u32) -> bool {
        self.cache.contains_key(&key)
    }

    /// Rotated parts of the genome passed to the last [`NfpStore::init`].
    pub fn parts(&self) -> &[PolygonNode] {
        &self.parts
    }

    /// Prepares the cache for `genome` and returns the pair jobs still missing.
    ///
    /// `nodes` is the forest the genome indexes into. Only keys reachable from
    /// this genome survive; the rest of the previous cache is dropped.
    pub fn init(
        &mut self,
        nodes: &[PolygonNode],
        genome: &Phenotype,
        bin: &PolygonNode,
        config: PackedConfig,
        table: &RotationTable,
    ) -> Vec<PairJob> {
        let mut previous = std::mem::take(&mut self.cache);
        let mut emitted = HashSet::new();
        let mut jobs = Vec::new();

        self.config = Some(config);
        self.parts = genome
            .placement
            .iter()
            .zip(&genome.rotation)
            .filter_map(|(&index, &angle)| nodes.get(index).map(|node| node.rotated(table, angle)))
            .collect();

        let mut request = |key: NfpKey, stationary: &PolygonNode, moving: &PolygonNode, cache: &mut BTreeMap<u32, Vec<u8>>| {
            let packed = key.pack();
            if cache.contains_key(&packed) || emitted.contains(&packed) {
                return;
            }
            if let Some(bytes) = previous.remove(&packed) {
                cache.insert(packed, bytes);
                return;
            }
            emitted.insert(packed);
            jobs.push(PairJob {
                key: packed,
                config,
                stationary: stationary.clone(),
                moving: moving.clone(),
            });
        };

        for (i, part) in self.parts.iter().enumerate() {
            let rotation = table.index_of(part.rotation) as u32;
            let bin_key = NfpKey::new(bin.source, part.source, 0, rotation, true);
            request(bin_key, bin, part, &mut self.cache);

            for placed in &self.parts[..i] {
                let key = NfpKey::new(
                    placed.source,
                    part.source,
                    table.index_of(placed.rotation) as u32,
                    rotation,
                    false,
                );
                request(key, placed, part, &mut self.cache);
            }
        }

        log::debug!(
            "nfp store: {} cached, {} pair jobs, {} dropped",
            self.cache.len(),
            jobs.len(),
            previous.len()
        );
        jobs
    }

    /// Merges pair results returned by workers.
    ///
    /// Buffers too small to hold a loop are "could not compute" results and
    /// are skipped, so the pair stays missing for the placement step.
    pub fn update(&mut self, results: Vec<Vec<u8>>) -> Result<()> {
        for bytes in results {
            if bytes.len() <= EMPTY_RESULT_BYTES {
                continue;
            }
            let key = pair_result_key(&bytes)?;
            self.cache.insert(key, bytes);
        }
        Ok(())
    }

    /// Placement job packet holding the whole cache and the rotated genome.
    ///
    /// Returns `None` before the first [`NfpStore::init`].
    pub fn placement_data(&self, area: f64) -> Option<Vec<u8>> {
        let config = self.config?;
        let cache = encode_nfp_cache(self.cache.iter().map(|(&key, bytes)| (key, bytes.as_slice())));
        Some(PlacementJob::encode_with_cache(config, area, &cache, &self.parts))
    }

    /// Forgets every cached entry.
    pub fn clean(&mut self) {
        self.cache.clear();
        self.parts.clear();
        self.config = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode_job, encode_pair_result, Job};
    use polynest_core::{Polygon, BIN_SOURCE};

    fn setup() -> (Vec<PolygonNode>, PolygonNode, PackedConfig, RotationTable) {
        let nodes = (0..3)
            .map(|i| PolygonNode::new(i, Polygon::rectangle(0.0, 0.0, 10.0 + f64::from(i), 10.0)))
            .collect();
        let bin = PolygonNode::new(BIN_SOURCE, Polygon::rectangle(0.0, 0.0, 100.0, 100.0));
        let mut config = PackedConfig::unpack(0);
        config.rotations = 4;
        (nodes, bin, config, RotationTable::new(4))
    }

    fn answer(jobs: &[PairJob]) -> Vec<Vec<u8>> {
        jobs.iter()
            .map(|job| encode_pair_result(job.key, &[Polygon::rectangle(0.0, 0.0, 1.0, 1.0)]))
            .collect()
    }

    #[test]
    fn test_emits_every_pair_once() {
        let (nodes, bin, config, table) = setup();
        let genome = Phenotype::new(vec![2, 0, 1], vec![0.0, 90.0, 0.0]);
        let jobs = NfpStore::new().init(&nodes, &genome, &bin, config, &table);
        // 3 bin pairs + 3 part pairs
        assert_eq!(jobs.len(), 6);
        assert_eq!(jobs.iter().filter(|j| NfpKey::unpack(j.key).inside).count(), 3);

        let second = NfpKey::unpack(jobs[1].key);
        assert!(second.inside);
        assert_eq!(second.moving, 0);
        assert_eq!(second.moving_rotation, 1);

        let pair = NfpKey::unpack(jobs[2].key);
        assert_eq!((pair.stationary, pair.moving, pair.inside), (2, 0, false));
        assert_eq!(jobs[2].moving.rotation, 90.0);
    }

    #[test]
    fn test_cache_hit_short_circuits() {
        let (nodes, bin, config, table) = setup();
        let genome = Phenotype::new(vec![0, 1, 2], vec![0.0; 3]);
        let mut store = NfpStore::new();
        let jobs = store.init(&nodes, &genome, &bin, config, &table);
        store.update(answer(&jobs)).unwrap();
        assert_eq!(store.len(), 6);

        assert!(store.init(&nodes, &genome, &bin, config, &table).is_empty());
        assert_eq!(store.len(), 6);

        // swapping two parts only needs the reversed pair
        let swapped = Phenotype::new(vec![1, 0, 2], vec![0.0; 3]);
        let jobs = store.init(&nodes, &swapped, &bin, config, &table);
        assert_eq!(jobs.len(), 1);
        assert!(jobs.iter().all(|job| !store.contains(job.key)));
        let key = NfpKey::unpack(jobs[0].key);
        assert_eq!((key.stationary, key.moving), (1, 0));
    }

    #[test]
    fn test_unreachable_entries_are_dropped() {
        let (nodes, bin, config, table) = setup();
        let mut store = NfpStore::new();
        let jobs = store.init(&nodes, &Phenotype::new(vec![0, 1, 2], vec![0.0; 3]), &bin, config, &table);
        store.update(answer(&jobs)).unwrap();

        let rotated = Phenotype::new(vec![0, 1, 2], vec![180.0; 3]);
        let jobs = store.init(&nodes, &rotated, &bin, config, &table);
        assert_eq!(jobs.len(), 6);
        assert!(store.is_empty());
    }

    #[test]
    fn test_update_skips_sentinels() {
        let (nodes, bin, config, table) = setup();
        let mut store = NfpStore::new();
        let jobs = store.init(&nodes, &Phenotype::new(vec![0, 1], vec![0.0; 2]), &bin, config, &table);
        let mut results = answer(&jobs);
        results[0] = encode_pair_result(jobs[0].key, &[]);
        store.update(results).unwrap();
        assert_eq!(store.len(), jobs.len() - 1);
        assert!(!store.contains(jobs[0].key));
    }

    #[test]
    fn test_placement_data() {
        let (nodes, bin, config, table) = setup();
        let mut store = NfpStore::new();
        assert!(store.placement_data(1.0).is_none());

        let jobs = store.init(&nodes, &Phenotype::new(vec![1, 0], vec![90.0, 0.0]), &bin, config, &table);
        store.update(answer(&jobs)).unwrap();
        let bytes = store.placement_data(10_000.0).unwrap();
        let Job::Placement(job) = decode_job(&bytes).unwrap() else {
            panic!("expected a placement job");
        };
        assert_eq!(job.area, 10_000.0);
        assert_eq!(job.nfp_cache.len(), 3);
        assert_eq!(job.parts.len(), 2);
        assert_eq!(job.parts[0].source, 1);
        assert_eq!(job.parts[0].rotation, 90.0);
    }
}

//! Flat binary buffers exchanged with worker tasks.
//!
//! Every value is little-endian. Counts and cache keys are `u32` inside
//! forest and cache regions; packet headers are `f64` slots.
//!
//! | buffer            | layout                                                               |
//! |-------------------|----------------------------------------------------------------------|
//! | forest            | `u32 roots`, per node: `f64 source+1`, `f64 rotation`, `u32 points`, coordinates, `u32 children`, children |
//! | NFP cache         | repeated `u32 key`, `u32 length`, `length` bytes                     |
//! | pair job          | `f64 tag=0`, `f64 key`, `f64 config`, two-node forest                |
//! | placement job     | `f64 tag=1`, `f64 config`, `f64 area`, `f64 cache length`, cache, forest |
//! | pair result       | `f64 key`, `f64 loops`, per loop: `f64 points`, coordinates          |
//! | placement result  | `f64 fitness`, `f64 area`, `u32 bins`, per bin: `u32 count`, placements, `u32 unplaced`, `f64` sources |

use std::collections::HashMap;

use polynest_core::{
    Error, PackedConfig, Placement, PlacementResult, Point, Polygon, PolygonNode, Result,
};

/// Packet tag of a pair job.
pub const PAIR_TAG: f64 = 0.0;
/// Packet tag of a placement job.
pub const PLACEMENT_TAG: f64 = 1.0;

/// Pair results of this size or smaller carry no NFP loop.
pub const EMPTY_RESULT_BYTES: usize = 3 * 8;

const F64: usize = 8;
const U32: usize = 4;

// ============================================================================
// Readers and writers
// ============================================================================

/// Appends little-endian values to a byte buffer.
#[derive(Debug, Default)]
pub struct BufferWriter {
    bytes: Vec<u8>,
}

impl BufferWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    pub fn put_f64(&mut self, value: f64) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_u32(&mut self, value: u32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    pub fn put_points(&mut self, points: &[Point]) {
        for p in points {
            self.put_f64(p.x);
            self.put_f64(p.y);
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.bytes
    }
}

/// Reads little-endian values, failing with [`Error::BufferError`] on
/// truncated input.
#[derive(Debug)]
pub struct BufferReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> BufferReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(Error::BufferError(format!(
                "need {} bytes at offset {}, {} left",
                len,
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn f64(&mut self) -> Result<f64> {
        let mut raw = [0u8; F64];
        raw.copy_from_slice(self.take(F64)?);
        Ok(f64::from_le_bytes(raw))
    }

    pub fn u32(&mut self) -> Result<u32> {
        let mut raw = [0u8; U32];
        raw.copy_from_slice(self.take(U32)?);
        Ok(u32::from_le_bytes(raw))
    }

    /// Reads an `f64` slot that must hold a non-negative integer.
    pub fn count(&mut self) -> Result<usize> {
        let value = self.f64()?;
        if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
            return Err(Error::BufferError(format!("invalid count {}", value)));
        }
        Ok(value as usize)
    }

    pub fn points(&mut self, count: usize) -> Result<Vec<Point>> {
        if count.saturating_mul(2 * F64) > self.remaining() {
            return Err(Error::BufferError(format!("{} points do not fit", count)));
        }
        (0..count)
            .map(|_| Ok(Point::new(self.f64()?, self.f64()?)))
            .collect()
    }
}

// ============================================================================
// Polygon forest
// ============================================================================

fn write_node(w: &mut BufferWriter, node: &PolygonNode) {
    w.put_f64(f64::from(node.source + 1));
    w.put_f64(node.rotation);
    w.put_u32(node.polygon.len() as u32);
    w.put_points(node.polygon.points());
    write_forest(w, &node.children);
}

/// Writes `u32 rootCount` followed by every node depth-first.
pub fn write_forest(w: &mut BufferWriter, nodes: &[PolygonNode]) {
    w.put_u32(nodes.len() as u32);
    for node in nodes {
        write_node(w, node);
    }
}

fn read_node(r: &mut BufferReader<'_>) -> Result<PolygonNode> {
    let source = r.count()? as i32 - 1;
    let rotation = r.f64()?;
    let point_count = r.u32()? as usize;
    let points = r.points(point_count)?;
    let children = read_forest(r)?;
    Ok(PolygonNode::new(source, Polygon::new(points))
        .with_rotation(rotation)
        .with_children(children))
}

pub fn read_forest(r: &mut BufferReader<'_>) -> Result<Vec<PolygonNode>> {
    let count = r.u32()? as usize;
    // every node needs at least 24 bytes
    if count.saturating_mul(2 * F64 + 2 * U32) > r.remaining() {
        return Err(Error::BufferError(format!("{} nodes do not fit", count)));
    }
    (0..count).map(|_| read_node(r)).collect()
}

pub fn encode_forest(nodes: &[PolygonNode]) -> Vec<u8> {
    let mut w = BufferWriter::new();
    write_forest(&mut w, nodes);
    w.into_inner()
}

pub fn decode_forest(bytes: &[u8]) -> Result<Vec<PolygonNode>> {
    let mut r = BufferReader::new(bytes);
    let forest = read_forest(&mut r)?;
    if !r.is_empty() {
        return Err(Error::BufferError(format!("{} trailing bytes", r.remaining())));
    }
    Ok(forest)
}

// ============================================================================
// NFP cache keys
// ============================================================================

/// Identity of one cached no-fit polygon.
///
/// | bits    | field                              |
/// |---------|------------------------------------|
/// | 0..10   | stationary source + 1 (0 = bin)    |
/// | 10..19  | moving source + 1                  |
/// | 19..23  | stationary rotation index          |
/// | 23..27  | moving rotation index              |
/// | 27..32  | inside flag                        |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NfpKey {
    pub stationary: i32,
    pub moving: i32,
    pub stationary_rotation: u32,
    pub moving_rotation: u32,
    pub inside: bool,
}

const KEY_FIELDS: [(u32, u32); 5] = [(0, 10), (10, 9), (19, 4), (23, 4), (27, 5)];

/// Largest source id the key can address for the moving polygon.
pub const MAX_KEYED_SOURCE: i32 = (1 << 9) - 2;

impl NfpKey {
    pub fn new(stationary: i32, moving: i32, stationary_rotation: u32, moving_rotation: u32, inside: bool) -> Self {
        Self {
            stationary,
            moving,
            stationary_rotation,
            moving_rotation,
            inside,
        }
    }

    pub fn pack(&self) -> u32 {
        let values = [
            (self.stationary + 1) as u32,
            (self.moving + 1) as u32,
            self.stationary_rotation,
            self.moving_rotation,
            u32::from(self.inside),
        ];
        KEY_FIELDS
            .iter()
            .zip(values)
            .fold(0, |key, (&(offset, width), value)| key | ((value & mask(width)) << offset))
    }

    pub fn unpack(key: u32) -> Self {
        let field = |i: usize| {
            let (offset, width) = KEY_FIELDS[i];
            (key >> offset) & mask(width)
        };
        Self {
            stationary: field(0) as i32 - 1,
            moving: field(1) as i32 - 1,
            stationary_rotation: field(2),
            moving_rotation: field(3),
            inside: field(4) != 0,
        }
    }
}

#[inline]
fn mask(width: u32) -> u32 {
    (1u32 << width) - 1
}

// ============================================================================
// Pair results and the NFP cache
// ============================================================================

/// Serializes NFP loops under `key`. An empty loop list is the
/// "could not compute" sentinel.
pub fn encode_pair_result(key: u32, loops: &[Polygon]) -> Vec<u8> {
    let points: usize = loops.iter().map(Polygon::len).sum();
    let mut w = BufferWriter::with_capacity(2 * F64 + loops.len() * F64 + points * 2 * F64);
    w.put_f64(f64::from(key));
    w.put_f64(loops.len() as f64);
    for nfp in loops {
        w.put_f64(nfp.len() as f64);
        w.put_points(nfp.points());
    }
    w.into_inner()
}

/// Key stored in a pair result.
pub fn pair_result_key(bytes: &[u8]) -> Result<u32> {
    let key = BufferReader::new(bytes).count()?;
    u32::try_from(key).map_err(|_| Error::BufferError(format!("key {} out of range", key)))
}

pub fn decode_pair_result(bytes: &[u8]) -> Result<(u32, Vec<Polygon>)> {
    let key = pair_result_key(bytes)?;
    let mut r = BufferReader::new(bytes);
    r.take(F64)?;
    let loop_count = r.count()?;
    let mut loops = Vec::with_capacity(loop_count.min(r.remaining() / F64));
    for _ in 0..loop_count {
        let n = r.count()?;
        loops.push(Polygon::new(r.points(n)?));
    }
    Ok((key, loops))
}

/// Concatenates stored pair results into one cache region.
pub fn encode_nfp_cache<'a>(entries: impl IntoIterator<Item = (u32, &'a [u8])>) -> Vec<u8> {
    let mut w = BufferWriter::new();
    for (key, bytes) in entries {
        w.put_u32(key);
        w.put_u32(bytes.len() as u32);
        w.put_bytes(bytes);
    }
    w.into_inner()
}

/// Decoded NFP loops by packed key.
pub type NfpCache = HashMap<u32, Vec<Polygon>>;

pub fn decode_nfp_cache(bytes: &[u8]) -> Result<NfpCache> {
    let mut r = BufferReader::new(bytes);
    let mut cache = NfpCache::new();
    while !r.is_empty() {
        let key = r.u32()?;
        let len = r.u32()? as usize;
        let (_, loops) = decode_pair_result(r.take(len)?)?;
        cache.insert(key, loops);
    }
    Ok(cache)
}

// ============================================================================
// Job packets
// ============================================================================

/// Request for the NFP of one ordered pair of rotated nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct PairJob {
    pub key: u32,
    pub config: PackedConfig,
    pub stationary: PolygonNode,
    pub moving: PolygonNode,
}

impl PairJob {
    pub fn encode(&self) -> Vec<u8> {
        let mut w = BufferWriter::new();
        w.put_f64(PAIR_TAG);
        w.put_f64(f64::from(self.key));
        w.put_f64(f64::from(self.config.pack()));
        write_forest(&mut w, &[self.stationary.clone(), self.moving.clone()]);
        w.into_inner()
    }

    fn decode_body(r: &mut BufferReader<'_>) -> Result<Self> {
        let key = r.count()? as u32;
        let config = PackedConfig::unpack(r.count()? as u32);
        let mut nodes = read_forest(r)?;
        if nodes.len() != 2 {
            return Err(Error::BufferError(format!("pair job holds {} nodes", nodes.len())));
        }
        let moving = nodes.remove(1);
        let stationary = nodes.remove(0);
        Ok(Self {
            key,
            config,
            stationary,
            moving,
        })
    }
}

/// Request to evaluate one genome against the NFP cache.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementJob {
    pub config: PackedConfig,
    pub area: f64,
    pub nfp_cache: NfpCache,
    pub parts: Vec<PolygonNode>,
}

impl PlacementJob {
    /// Builds the packet around an already encoded cache region.
    pub fn encode_with_cache(config: PackedConfig, area: f64, cache: &[u8], parts: &[PolygonNode]) -> Vec<u8> {
        let mut w = BufferWriter::with_capacity(4 * F64 + cache.len());
        w.put_f64(PLACEMENT_TAG);
        w.put_f64(f64::from(config.pack()));
        w.put_f64(area);
        w.put_f64(cache.len() as f64);
        w.put_bytes(cache);
        write_forest(&mut w, parts);
        w.into_inner()
    }

    fn decode_body(r: &mut BufferReader<'_>) -> Result<Self> {
        let config = PackedConfig::unpack(r.count()? as u32);
        let area = r.f64()?;
        let cache_len = r.count()?;
        let nfp_cache = decode_nfp_cache(r.take(cache_len)?)?;
        let parts = read_forest(r)?;
        Ok(Self {
            config,
            area,
            nfp_cache,
            parts,
        })
    }
}

/// A decoded worker packet.
#[derive(Debug, Clone, PartialEq)]
pub enum Job {
    Pair(PairJob),
    Placement(PlacementJob),
}

pub fn decode_job(bytes: &[u8]) -> Result<Job> {
    let mut r = BufferReader::new(bytes);
    let tag = r.f64()?;
    if tag == PAIR_TAG {
        PairJob::decode_body(&mut r).map(Job::Pair)
    } else if tag == PLACEMENT_TAG {
        PlacementJob::decode_body(&mut r).map(Job::Placement)
    } else {
        Err(Error::BufferError(format!("unknown job tag {}", tag)))
    }
}

// ============================================================================
// Placement results
// ============================================================================

pub fn encode_placement_result(result: &PlacementResult) -> Vec<u8> {
    let mut w = BufferWriter::new();
    w.put_f64(result.fitness);
    w.put_f64(result.area);
    w.put_u32(result.bins.len() as u32);
    for bin in &result.bins {
        w.put_u32(bin.len() as u32);
        for p in bin {
            w.put_f64(f64::from(p.source + 1));
            w.put_f64(p.rotation);
            w.put_f64(p.x);
            w.put_f64(p.y);
        }
    }
    w.put_u32(result.unplaced.len() as u32);
    for source in &result.unplaced {
        w.put_f64(f64::from(source + 1));
    }
    w.into_inner()
}

pub fn decode_placement_result(bytes: &[u8]) -> Result<PlacementResult> {
    let mut r = BufferReader::new(bytes);
    let fitness = r.f64()?;
    let area = r.f64()?;
    let bin_count = r.u32()? as usize;
    let mut bins = Vec::with_capacity(bin_count.min(r.remaining() / U32));
    for _ in 0..bin_count {
        let count = r.u32()? as usize;
        let mut bin = Vec::with_capacity(count.min(r.remaining() / (4 * F64)));
        for _ in 0..count {
            let source = r.count()? as i32 - 1;
            bin.push(Placement::new(source, r.f64()?, r.f64()?, r.f64()?));
        }
        bins.push(bin);
    }
    let unplaced_count = r.u32()? as usize;
    let unplaced = (0..unplaced_count)
        .map(|_| Ok(r.count()? as i32 - 1))
        .collect::<Result<Vec<_>>>()?;
    Ok(PlacementResult {
        fitness,
        area,
        bins,
        unplaced,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PackedConfig {
        PackedConfig::unpack(0b1_0000011_0001010_00100_00000_0011)
    }

    fn deep_forest() -> Vec<PolygonNode> {
        let hole_of_hole = PolygonNode::new(2, Polygon::rectangle(30.0, 30.0, 5.0, 5.0));
        let hole = PolygonNode::new(1, Polygon::rectangle(20.0, 20.0, 40.0, 40.0)).with_children(vec![hole_of_hole]);
        let part = PolygonNode::new(0, Polygon::rectangle(0.0, 0.0, 100.0, 100.0))
            .with_rotation(90.0)
            .with_children(vec![hole]);
        let other = PolygonNode::new(3, Polygon::from_tuples(&[(0.5, 0.25), (7.125, 1.0), (3.0, 9.75)]));
        vec![part, other]
    }

    #[test]
    fn test_forest_layout() {
        let node = PolygonNode::new(4, Polygon::from_tuples(&[(1.0, 2.0), (3.0, 4.0), (5.0, 6.0)]));
        let bytes = encode_forest(&[node]);
        // roots + source + rotation + count + 6 coords + children
        assert_eq!(bytes.len(), 4 + 8 + 8 + 4 + 48 + 4);
        assert_eq!(&bytes[0..4], &1u32.to_le_bytes());
        assert_eq!(&bytes[4..12], &5.0f64.to_le_bytes());
        assert_eq!(&bytes[20..24], &3u32.to_le_bytes());
        assert_eq!(&bytes[24..32], &1.0f64.to_le_bytes());
    }

    #[test]
    fn test_forest_deep_round_trip() {
        let forest = deep_forest();
        let decoded = decode_forest(&encode_forest(&forest)).unwrap();
        assert_eq!(decoded, forest);
        assert_eq!(decoded[0].children[0].children[0].source, 2);
    }

    #[test]
    fn test_forest_truncated() {
        let bytes = encode_forest(&deep_forest());
        for cut in [1, 10, bytes.len() / 2, bytes.len() - 1] {
            assert!(matches!(decode_forest(&bytes[..cut]), Err(Error::BufferError(_))));
        }
        let mut padded = bytes.clone();
        padded.push(0);
        assert!(decode_forest(&padded).is_err());
    }

    #[test]
    fn test_nfp_key_fields() {
        let key = NfpKey::new(-1, 5, 0, 3, true);
        assert_eq!(key.pack(), 6 << 10 | 3 << 23 | 1 << 27);
        assert_eq!(NfpKey::unpack(key.pack()), key);

        let key = NfpKey::new(1022, MAX_KEYED_SOURCE, 15, 15, false);
        assert_eq!(NfpKey::unpack(key.pack()), key);
    }

    #[test]
    fn test_nfp_key_distinguishes_order() {
        let a = NfpKey::new(1, 2, 0, 1, false).pack();
        let b = NfpKey::new(2, 1, 1, 0, false).pack();
        assert_ne!(a, b);
    }

    #[test]
    fn test_pair_result_sentinel_size() {
        let empty = encode_pair_result(42, &[]);
        assert!(empty.len() <= EMPTY_RESULT_BYTES);
        let full = encode_pair_result(42, &[Polygon::rectangle(0.0, 0.0, 1.0, 1.0)]);
        assert!(full.len() > EMPTY_RESULT_BYTES);

        let (key, loops) = decode_pair_result(&full).unwrap();
        assert_eq!(key, 42);
        assert_eq!(loops, vec![Polygon::rectangle(0.0, 0.0, 1.0, 1.0)]);
        assert_eq!(pair_result_key(&empty).unwrap(), 42);
    }

    #[test]
    fn test_nfp_cache_region() {
        let a = encode_pair_result(7, &[Polygon::rectangle(0.0, 0.0, 2.0, 2.0)]);
        let b = encode_pair_result(9, &[Polygon::rectangle(1.0, 1.0, 2.0, 2.0), Polygon::rectangle(0.0, 0.0, 1.0, 1.0)]);
        let region = encode_nfp_cache([(7, a.as_slice()), (9, b.as_slice())]);
        assert_eq!(region.len(), 16 + a.len() + b.len());

        let cache = decode_nfp_cache(&region).unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(cache[&9].len(), 2);
        assert!(decode_nfp_cache(&region[..region.len() - 3]).is_err());
    }

    #[test]
    fn test_pair_job_packet() {
        let forest = deep_forest();
        let job = PairJob {
            key: NfpKey::new(0, 3, 1, 0, false).pack(),
            config: config(),
            stationary: forest[0].clone(),
            moving: forest[1].clone(),
        };
        let bytes = job.encode();
        assert_eq!(&bytes[0..8], &PAIR_TAG.to_le_bytes());
        assert_eq!(decode_job(&bytes).unwrap(), Job::Pair(job));
    }

    #[test]
    fn test_placement_job_packet() {
        let entry = encode_pair_result(3, &[Polygon::rectangle(0.0, 0.0, 4.0, 4.0)]);
        let cache = encode_nfp_cache([(3, entry.as_slice())]);
        let parts = deep_forest();
        let bytes = PlacementJob::encode_with_cache(config(), 2500.0, &cache, &parts);

        match decode_job(&bytes).unwrap() {
            Job::Placement(job) => {
                assert_eq!(job.config, config());
                assert_eq!(job.area, 2500.0);
                assert_eq!(job.nfp_cache.len(), 1);
                assert_eq!(job.parts, parts);
            }
            other => panic!("unexpected job {:?}", other),
        }
    }

    #[test]
    fn test_unknown_tag() {
        let mut w = BufferWriter::new();
        w.put_f64(7.0);
        assert!(matches!(decode_job(&w.into_inner()), Err(Error::BufferError(_))));
    }

    #[test]
    fn test_placement_result_buffer() {
        let result = PlacementResult {
            fitness: 1.25,
            area: 10000.0,
            bins: vec![vec![Placement::new(0, 0.0, 1.0, 2.0), Placement::new(1, 90.0, 3.5, 4.5)]],
            unplaced: vec![2],
        };
        let decoded = decode_placement_result(&encode_placement_result(&result)).unwrap();
        assert_eq!(decoded, result);
    }
}

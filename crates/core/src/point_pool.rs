//! Fixed-capacity scratch point allocator.
//!
//! Geometry inner loops (slide-distance searches in particular) need a
//! handful of temporary vectors per call. [`PointPool`] keeps a fixed array of
//! points and a `u64` occupancy mask; [`PointPool::alloc`] hands out a
//! contiguous run of slots as a [`Lease`] and [`PointPool::free`] clears its
//! bits again. Each task owns its own pool, so no synchronization is involved.

use crate::error::{Error, Result};
use crate::point::Point;

/// Number of points held by a pool (one bit per slot in the mask).
pub const POOL_CAPACITY: usize = 64;

/// A contiguous run of leased pool slots.
///
/// Not `Clone`: a lease is returned to the pool exactly once.
#[derive(Debug, PartialEq, Eq)]
pub struct Lease {
    start: usize,
    len: usize,
}

impl Lease {
    /// Number of points in the lease.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the lease holds no points.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn mask(&self) -> u64 {
        run_mask(self.len) << self.start
    }
}

#[inline]
fn run_mask(len: usize) -> u64 {
    if len >= POOL_CAPACITY {
        u64::MAX
    } else {
        (1u64 << len) - 1
    }
}

/// Bitmask allocator over a fixed array of scratch points.
#[derive(Debug)]
pub struct PointPool {
    points: [Point; POOL_CAPACITY],
    used: u64,
}

impl Default for PointPool {
    fn default() -> Self {
        Self::new()
    }
}

impl PointPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self {
            points: [Point::default(); POOL_CAPACITY],
            used: 0,
        }
    }

    /// Number of free slots.
    pub fn available(&self) -> usize {
        self.used.count_zeros() as usize
    }

    /// Leases `count` contiguous slots. The leased points are reset to the origin.
    pub fn alloc(&mut self, count: usize) -> Result<Lease> {
        if count == 0 || count > POOL_CAPACITY {
            return Err(Error::PoolExhausted {
                requested: count,
                available: self.available(),
            });
        }

        let mask = run_mask(count);
        let start = (0..=POOL_CAPACITY - count)
            .find(|&start| self.used & (mask << start) == 0)
            .ok_or(Error::PoolExhausted {
                requested: count,
                available: self.available(),
            })?;

        let lease = Lease { start, len: count };
        self.used |= lease.mask();
        for point in &mut self.points[start..start + count] {
            point.set(0.0, 0.0);
        }
        Ok(lease)
    }

    /// Returns the leased slots to the pool.
    pub fn free(&mut self, lease: Lease) {
        self.used &= !lease.mask();
    }

    /// Read access to a lease.
    pub fn points(&self, lease: &Lease) -> &[Point] {
        &self.points[lease.start..lease.start + lease.len]
    }

    /// Write access to a lease.
    pub fn points_mut(&mut self, lease: &Lease) -> &mut [Point] {
        &mut self.points[lease.start..lease.start + lease.len]
    }

    /// Leases `count` points for the duration of `f`.
    pub fn with_scratch<R>(&mut self, count: usize, f: impl FnOnce(&mut [Point]) -> R) -> Result<R> {
        let lease = self.alloc(count)?;
        let result = f(self.points_mut(&lease));
        self.free(lease);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_and_free() {
        let mut pool = PointPool::new();
        let a = pool.alloc(4).unwrap();
        let b = pool.alloc(8).unwrap();
        assert_eq!(pool.available(), POOL_CAPACITY - 12);

        pool.points_mut(&a)[0].set(1.0, 2.0);
        assert_eq!(pool.points(&a)[0], Point::new(1.0, 2.0));

        pool.free(a);
        pool.free(b);
        assert_eq!(pool.available(), POOL_CAPACITY);
    }

    #[test]
    fn test_reuses_freed_run() {
        let mut pool = PointPool::new();
        let a = pool.alloc(3).unwrap();
        let _b = pool.alloc(3).unwrap();
        pool.free(a);

        let c = pool.alloc(2).unwrap();
        assert_eq!(c.start, 0);
    }

    #[test]
    fn test_exhaustion() {
        let mut pool = PointPool::new();
        let _all = pool.alloc(POOL_CAPACITY).unwrap();
        assert!(matches!(
            pool.alloc(1),
            Err(Error::PoolExhausted { requested: 1, available: 0 })
        ));
        assert!(pool.alloc(0).is_err());
    }

    #[test]
    fn test_with_scratch_releases() {
        let mut pool = PointPool::new();
        let sum = pool
            .with_scratch(2, |points| {
                points[0].set(1.0, 1.0);
                points[1].set(2.0, 3.0);
                points[0].x + points[1].y
            })
            .unwrap();
        assert_eq!(sum, 4.0);
        assert_eq!(pool.available(), POOL_CAPACITY);
    }
}

//! # polynest 2D
//!
//! Polygon clipping, offsetting, no-fit polygons and the parallel nesting
//! loop of the polynest engine.
//!
//! ## Components
//!
//! - [`clipper`]: boolean operations on integer paths (sweep line clipper)
//! - [`offset`]: growing and shrinking polygons
//! - [`tree`]: input cleaning, the bin and the part/hole forest
//! - [`nfp`] and [`nfp_sliding`]: no-fit polygons
//! - [`codec`]: flat buffers exchanged with workers
//! - [`nfp_store`], [`placement`], [`worker`]: the per-genome pipeline
//! - [`nester`]: the session driving it all
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use polynest_core::{NestConfig, Polygon};
//! use polynest_d2::Nester;
//!
//! let config = NestConfig::new().with_rotations(4).with_spacing(1.0);
//! let mut nester = Nester::new(config).unwrap();
//!
//! let bin = Polygon::rectangle(0.0, 0.0, 500.0, 300.0);
//! let parts = vec![
//!     Polygon::rectangle(0.0, 0.0, 100.0, 50.0),
//!     Polygon::from_tuples(&[(0.0, 0.0), (80.0, 0.0), (40.0, 60.0)]),
//! ];
//! nester.start(&bin, &parts).unwrap();
//!
//! if let Some(best) = nester.run(50).unwrap() {
//!     println!("{} bins, {} parts placed", best.bins_used(), best.placed_count());
//! }
//! ```

pub mod clipper;
pub mod codec;
pub mod nester;
pub mod nfp;
pub mod nfp_sliding;
pub mod nfp_store;
pub mod offset;
pub mod placement;
pub mod tree;
pub mod worker;

// Re-exports
pub use clipper::{ClipType, ClippingEngine, IntPoint, Path, Paths, PolyFillType, PolyType};
pub use codec::{NfpCache, NfpKey, PairJob, PlacementJob};
pub use nester::Nester;
pub use nfp::{no_fit_polygon_rectangle, NfpEngine};
pub use nfp_store::NfpStore;
pub use offset::OffsetEngine;
pub use placement::PlacementEngine;
pub use tree::{BinBounds, TreeBuilder};
pub use worker::{process_job, WorkerPool};
pub use polynest_core::{Error, NestConfig, Placement, PlacementResult, Polygon, PolygonNode, Result};

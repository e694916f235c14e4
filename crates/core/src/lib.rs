//! # polynest core
//!
//! Geometry primitives, configuration and the genetic search shared by the
//! polynest nesting engine.
//!
//! ## Core Components
//!
//! - **Primitives**: [`Point`], [`BoundRect`], [`Polygon`], [`PolygonNode`]
//! - **Scratch memory**: [`PointPool`] hands out leased points from a fixed buffer
//! - **Rotation lookup**: [`RotationTable`], built once and shared read-only
//! - **Configuration**: [`NestConfig`] and its bit-packed wire form [`PackedConfig`]
//! - **Search**: [`GeneticSearch`] over placement order and rotation
//! - **Results**: [`PlacementResult`], [`Placement`], [`ProgressInfo`]
//!
//! ## Configuration
//!
//! ```rust
//! use polynest_core::{NestConfig, PackedConfig};
//!
//! let config = NestConfig::new()
//!     .with_spacing(2.0)
//!     .with_rotations(4)
//!     .with_population_size(20);
//! config.validate().unwrap();
//!
//! let word = PackedConfig::try_from(&config).unwrap().pack();
//! assert_eq!(PackedConfig::unpack(word).rotations, 4);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod bound_rect;
pub mod config;
pub mod error;
pub mod ga;
pub mod node;
pub mod point;
pub mod point_pool;
pub mod polygon;
pub mod progress;
pub mod result;
pub mod robust;
pub mod rotation;

// Re-exports
pub use bound_rect::BoundRect;
pub use config::{NestConfig, PackedConfig, MAX_KEYED_ROTATIONS};
pub use error::{Error, Result};
pub use ga::{GeneticSearch, Phenotype};
pub use node::{PolygonNode, BIN_SOURCE};
pub use point::{almost_equal, line_intersect, Point, TOLERANCE};
pub use point_pool::{Lease, PointPool, POOL_CAPACITY};
pub use polygon::{point_in_polygon, signed_area, Polygon};
pub use progress::{ProgressCallback, ProgressInfo};
pub use result::{Placement, PlacementResult};
pub use robust::{orient2d, orient2d_filtered, strip_collinear, Orientation};
pub use rotation::RotationTable;

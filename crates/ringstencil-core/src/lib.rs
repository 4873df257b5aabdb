//! # RingStencil Core
//!
//! Core traits and types for tiled box-stencil kernels.
//!
//! A box stencil replaces every point of a 2-D grid with the mean of a fixed
//! rectangular neighborhood, clamping out-of-range neighbors to the nearest
//! edge. The kernels in `ringstencil-kernels` compute it with many cooperating
//! groups of lanes that stage neighborhoods into group-shared scratch memory.
//! This crate holds what those kernels share.
//!
//! ## Core Abstractions
//!
//! - [`Element`] - Numeric sample type (integral or floating point)
//! - [`Window`] / [`Rect`] - Compile-time stencil window offsets
//! - [`GroupShape`] / [`Group`] - Compile-time group footprint
//! - [`GroupContext`] - Per-lane identity and the group-wide barrier
//! - [`SharedScratch`] - Group-local tile memory
//! - [`GridBuffer`] / [`OutputGrid`] - Input and output grids
//!
//! ## Example
//!
//! ```
//! use ringstencil_core::prelude::*;
//!
//! type Blur3 = Rect<-1, -1, 1, 1>;
//! assert_eq!(Blur3::TOTAL_RANGE, 9);
//!
//! let grid = GridBuffer::from_fn(5, 5, |x, y| (y * 5 + x) as i32).unwrap();
//! assert_eq!(grid.read(4, 4), 24);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod addressing;
pub mod context;
pub mod element;
pub mod error;
pub mod memory;
pub mod shape;
pub mod types;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::addressing::{clamp, div_up, flat_index, next_pow2};
    pub use crate::context::{BarrierPoisoned, GroupBarrier, GroupContext};
    pub use crate::element::Element;
    pub use crate::error::{Result, StencilError};
    pub use crate::memory::{
        GridBuffer, GridView, OutputGrid, OutputView, PooledScratch, ScratchPool, ScratchStats,
        SharedScratch, TransposedView,
    };
    pub use crate::shape::{Group, GroupShape, Rect, TileGeometry, Transposed, Window};
    pub use crate::types::{Dim2, GroupId, LaneId, Lens};
}

// Re-exports for convenience
pub use context::{BarrierPoisoned, GroupBarrier, GroupContext};
pub use element::Element;
pub use error::{Result, StencilError};
pub use memory::{
    GridBuffer, GridView, OutputGrid, OutputView, PooledScratch, ScratchPool, ScratchStats,
    SharedScratch, TransposedView,
};
pub use shape::{Group, GroupShape, Rect, TileGeometry, Transposed, Window};
pub use types::{Dim2, GroupId, LaneId, Lens};

//! # RingStencil Kernels
//!
//! Data-movement strategies for the clamped box stencil.
//!
//! Every kernel here is a per-lane function: the execution engine calls it
//! once for every lane of every group with that lane's [`GroupContext`] and
//! the group's [`SharedScratch`]. Kernels never allocate, never fail and
//! never clamp outside of loading: geometry is validated before launch.
//!
//! ## Strategies
//!
//! | Kernel | Scratch | Barriers |
//! |--------|---------|----------|
//! | [`direct::direct`] | none | none |
//! | [`big_tile::big_tile`] | footprint + halo | load / consume |
//! | [`strip::strip`] | `strip_x * strip_y` footprints + one halo | load / consume |
//! | [`sliding::sliding_flat`] | `RANGE_Y` rows | two per row |
//! | [`sliding::sliding_pow2`] | `next_pow2(RANGE_Y + G::Y)` rows | two per step |
//! | [`virtual_grid::virtual_big_tile`] | footprint + halo | two per logical group |
//! | [`virtual_grid::virtual_strip`] | strip + halo | two per logical strip |
//!
//! Tile loaders ([`loader`]) and consumers ([`consumer`]) are type
//! parameters of the tiled kernels, so any loader can be paired with any
//! consumer. All strategies sum the window through
//! [`window::window_average`] and agree bit for bit.
//!
//! [`GroupContext`]: ringstencil_core::GroupContext
//! [`SharedScratch`]: ringstencil_core::SharedScratch

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod big_tile;
pub mod consumer;
pub mod direct;
pub mod loader;
pub mod positions;
pub mod sliding;
pub mod strip;
pub mod tile;
pub mod virtual_grid;
pub mod window;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::big_tile::{big_tile, tile_cycle};
    pub use crate::consumer::{CubeConsumer, FlatConsumer, TileConsumer};
    pub use crate::direct::{direct, direct_point, reference, Addressing};
    pub use crate::loader::{
        AddCarryLoader, CubeLoader, DivRemLoader, FlatLoader, ShiftedAddCarryLoader, TileLoader,
    };
    pub use crate::positions::{
        AddCarryPositions, DivRemPositions, ShiftedAddCarryPositions, TilePos, TilePositions,
    };
    pub use crate::sliding::{
        prefill_flat, prefill_pow2, sliding_flat, sliding_flat_along, sliding_pow2, RowRing,
        SweepAxis,
    };
    pub use crate::strip::strip;
    pub use crate::tile::{StripShape, Tile, TileOrigin};
    pub use crate::virtual_grid::{virtual_big_tile, virtual_strip, VirtualIds};
    pub use crate::window::window_average;
}

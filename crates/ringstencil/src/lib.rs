//! # RingStencil
//!
//! Clamped box-stencil averaging over 2-D grids, computed by cooperating
//! groups of lanes that stage neighborhoods in group-shared scratch.
//!
//! Every output point is the mean of a fixed rectangular window around it.
//! Neighbors outside the grid take the value of the nearest edge sample.
//! Integral element types use truncating integer division.
//!
//! ## Variants
//!
//! A [`Variant`] picks how data moves:
//!
//! - **Direct** - every lane reads its window straight from the grid
//! - **Big tile** - each group loads its footprint plus halo once
//! - **Strip** - several footprints share one halo
//! - **Sliding window** - a ring of rows sweeps down (or across) a strip
//! - **Virtual grid** - a few physical groups serve a larger logical grid
//!
//! All variants produce bit-identical results.
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use ringstencil::prelude::*;
//!
//! type Blur = BoxStencil<Rect<-1, -1, 1, 1>, Group<8, 4>>;
//!
//! let runtime = Arc::new(CpuRuntime::new(RuntimeConfig::new()).unwrap());
//! let stencil = Blur::new(runtime);
//!
//! let grid = GridBuffer::filled(20, 11, 3.5f32).unwrap();
//! for variant in Variant::catalogue() {
//!     assert_eq!(stencil.run(variant, &grid).unwrap(), grid.as_slice());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod plan;
pub mod stencil;
pub mod variant;

pub use plan::LaunchPlan;
pub use stencil::BoxStencil;
pub use variant::Variant;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::plan::LaunchPlan;
    pub use crate::stencil::BoxStencil;
    pub use crate::variant::Variant;

    pub use ringstencil_core::prelude::*;
    pub use ringstencil_cpu::prelude::*;
    pub use ringstencil_kernels::sliding::SweepAxis;
}

// Re-export component crates
pub use ringstencil_cpu::CpuRuntime;
pub use ringstencil_kernels as kernels;

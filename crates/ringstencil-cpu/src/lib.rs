//! # RingStencil CPU Runtime
//!
//! Executes stencil kernels on the CPU the way a GPU would: a grid of
//! groups, each group a set of lanes sharing one scratch buffer and one
//! barrier.
//!
//! ## Execution model
//!
//! - Groups are scheduled on a rayon pool of `max_concurrent_groups`
//!   threads, so at most that many groups are resident at once.
//! - Each lane of a resident group runs on its own scoped OS thread.
//!   Barrier semantics require every lane of a group to be live at once.
//! - Scratch buffers are pooled per launch and reused by later groups.
//! - A panicking lane poisons its group barrier and fails the launch.
//!
//! ## Example
//!
//! ```
//! use ringstencil_core::Dim2;
//! use ringstencil_cpu::{CpuRuntime, LaunchConfig, RuntimeConfig};
//!
//! let runtime = CpuRuntime::new(RuntimeConfig::new().with_max_concurrent_groups(2)).unwrap();
//! let config = LaunchConfig::new("fill")
//!     .with_grid(Dim2::new_1d(2))
//!     .with_group(Dim2::new_1d(4))
//!     .with_shared_elems(4);
//!
//! let stats = runtime
//!     .launch::<f32, _>(&config, |ctx, scratch| {
//!         scratch.store(ctx.lane_flat() as usize, 1.0);
//!         ctx.sync_threads();
//!     })
//!     .unwrap();
//! assert_eq!(stats.lanes, 8);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod launch;
pub mod runtime;

pub use launch::{LaunchConfig, LaunchStats, MAX_LANES_PER_GROUP};
pub use runtime::{CpuRuntime, RuntimeConfig, RuntimeMetrics, DEFAULT_LANE_STACK_SIZE};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::launch::{LaunchConfig, LaunchStats};
    pub use crate::runtime::{CpuRuntime, RuntimeConfig, RuntimeMetrics};
}

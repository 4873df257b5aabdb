//! CPU runtime implementation.
//!
//! Groups are scheduled on a rayon pool sized to the maximum number of
//! concurrently resident groups. Inside a group every lane is a scoped OS
//! thread, because a group barrier needs all of its lanes live at once.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use parking_lot::RwLock;
use rayon::prelude::*;
use tracing::{debug, info, trace};

use ringstencil_core::error::{Result, StencilError};
use ringstencil_core::{
    BarrierPoisoned, Element, GroupBarrier, GroupContext, GroupId, LaneId, ScratchPool,
    SharedScratch,
};

use crate::launch::{LaunchConfig, LaunchStats};

/// Default stack size of a lane thread.
pub const DEFAULT_LANE_STACK_SIZE: usize = 256 * 1024;

/// Configuration of a [`CpuRuntime`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Groups allowed to execute at the same time.
    pub max_concurrent_groups: usize,
    /// Stack size of each lane thread.
    pub lane_stack_size: usize,
    /// Whether callers should count output writes per element.
    pub track_writes: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_concurrent_groups: thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            lane_stack_size: DEFAULT_LANE_STACK_SIZE,
            track_writes: false,
        }
    }
}

impl RuntimeConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of concurrently executing groups.
    pub fn with_max_concurrent_groups(mut self, groups: usize) -> Self {
        self.max_concurrent_groups = groups;
        self
    }

    /// Set the lane thread stack size.
    pub fn with_lane_stack_size(mut self, bytes: usize) -> Self {
        self.lane_stack_size = bytes;
        self
    }

    /// Enable or disable per-element write tracking.
    pub fn with_write_tracking(mut self, enabled: bool) -> Self {
        self.track_writes = enabled;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_groups == 0 {
            return Err(StencilError::config("max_concurrent_groups must be at least 1"));
        }
        if self.lane_stack_size < 16 * 1024 {
            return Err(StencilError::config(format!(
                "lane_stack_size of {} bytes is below the 16 KiB minimum",
                self.lane_stack_size
            )));
        }
        Ok(())
    }
}

/// Runtime metrics snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeMetrics {
    /// Completed launches.
    pub total_launches: u64,
    /// Launches that failed.
    pub failed_launches: u64,
    /// Groups executed.
    pub groups_executed: u64,
    /// Lanes executed.
    pub lanes_executed: u64,
    /// Group barrier crossings.
    pub barrier_crossings: u64,
    /// Scratch buffers handed out.
    pub scratch_acquired: u64,
    /// Scratch buffers reused without allocating.
    pub scratch_hits: u64,
}

/// CPU execution engine for stencil kernels.
pub struct CpuRuntime {
    /// Configuration.
    config: RuntimeConfig,
    /// Pool scheduling groups.
    pool: rayon::ThreadPool,
    /// Completed launches.
    total_launches: AtomicU64,
    /// Failed launches.
    failed_launches: AtomicU64,
    /// Groups executed.
    groups_executed: AtomicU64,
    /// Lanes executed.
    lanes_executed: AtomicU64,
    /// Barrier crossings.
    barrier_crossings: AtomicU64,
    /// Scratch acquisitions.
    scratch_acquired: AtomicU64,
    /// Scratch pool hits.
    scratch_hits: AtomicU64,
    /// Shutdown flag.
    shutdown: RwLock<bool>,
}

impl CpuRuntime {
    /// Create a runtime.
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        config.validate()?;

        info!(
            "Initializing CPU stencil runtime (max_concurrent_groups={}, lane_stack_size={})",
            config.max_concurrent_groups, config.lane_stack_size
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.max_concurrent_groups)
            .thread_name(|i| format!("ringstencil-group-{i}"))
            .build()
            .map_err(|e| StencilError::config(format!("failed to build group pool: {e}")))?;

        Ok(Self {
            config,
            pool,
            total_launches: AtomicU64::new(0),
            failed_launches: AtomicU64::new(0),
            groups_executed: AtomicU64::new(0),
            lanes_executed: AtomicU64::new(0),
            barrier_crossings: AtomicU64::new(0),
            scratch_acquired: AtomicU64::new(0),
            scratch_hits: AtomicU64::new(0),
            shutdown: RwLock::new(false),
        })
    }

    /// Create a runtime with the default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::new(RuntimeConfig::default())
    }

    /// Runtime configuration.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Check if runtime is shut down.
    pub fn is_shutdown(&self) -> bool {
        *self.shutdown.read()
    }

    /// Run `kernel` once for every lane of every group of `config`.
    ///
    /// Each group gets one scratch buffer of `config.shared_elems` cells,
    /// shared by its lanes. Returns when every group has finished. A lane
    /// that panics poisons its group barrier, so the rest of the group
    /// unwinds instead of waiting forever, and the launch fails with
    /// [`StencilError::LaunchFailed`].
    pub fn launch<T, F>(&self, config: &LaunchConfig, kernel: F) -> Result<LaunchStats>
    where
        T: Element,
        F: Fn(&GroupContext<'_>, &SharedScratch<T>) + Sync,
    {
        if self.is_shutdown() {
            return Err(StencilError::RuntimeShutdown);
        }
        config.validate()?;

        debug!(
            "Launching '{}' (grid={}x{}, group={}x{}, shared_elems={})",
            config.label,
            config.grid.x,
            config.grid.y,
            config.group.x,
            config.group.y,
            config.shared_elems
        );

        let start = Instant::now();
        let scratch_pool =
            ScratchPool::<T>::new(config.shared_elems, self.config.max_concurrent_groups);
        let crossings = AtomicU64::new(0);
        let groups = config.grid.flat();

        let result = self.pool.install(|| {
            (0..groups).into_par_iter().try_for_each(|group_flat| {
                self.run_group(config, group_flat, &scratch_pool, &crossings, &kernel)
            })
        });

        if let Err(e) = result {
            self.failed_launches.fetch_add(1, Ordering::Relaxed);
            debug!("Launch '{}' failed: {}", config.label, e);
            return Err(e);
        }

        let stats = LaunchStats {
            groups: config.groups(),
            lanes: config.groups() * config.lanes_per_group() as u64,
            barrier_crossings: crossings.load(Ordering::Relaxed),
            scratch: scratch_pool.stats(),
            elapsed: start.elapsed(),
        };

        self.total_launches.fetch_add(1, Ordering::Relaxed);
        self.groups_executed.fetch_add(stats.groups, Ordering::Relaxed);
        self.lanes_executed.fetch_add(stats.lanes, Ordering::Relaxed);
        self.barrier_crossings
            .fetch_add(stats.barrier_crossings, Ordering::Relaxed);
        self.scratch_acquired
            .fetch_add(stats.scratch.total_acquired as u64, Ordering::Relaxed);
        self.scratch_hits
            .fetch_add(stats.scratch.cache_hits as u64, Ordering::Relaxed);

        debug!(
            "Launch '{}' finished in {:?} ({} groups, {} barrier crossings)",
            config.label, stats.elapsed, stats.groups, stats.barrier_crossings
        );

        Ok(stats)
    }

    /// [`CpuRuntime::launch`] on tokio's blocking pool.
    pub async fn launch_async<T, F>(
        self: &Arc<Self>,
        config: LaunchConfig,
        kernel: F,
    ) -> Result<LaunchStats>
    where
        T: Element,
        F: Fn(&GroupContext<'_>, &SharedScratch<T>) + Send + Sync + 'static,
    {
        let runtime = Arc::clone(self);
        tokio::task::spawn_blocking(move || runtime.launch::<T, F>(&config, kernel))
            .await
            .map_err(|e| StencilError::launch(format!("launch task did not complete: {e}")))?
    }

    fn run_group<T, F>(
        &self,
        config: &LaunchConfig,
        group_flat: u32,
        scratch_pool: &ScratchPool<T>,
        crossings: &AtomicU64,
        kernel: &F,
    ) -> Result<()>
    where
        T: Element,
        F: Fn(&GroupContext<'_>, &SharedScratch<T>) + Sync,
    {
        let group_id = GroupId::from_flat(group_flat, config.grid.x);
        let lanes = config.lanes_per_group();
        let scratch = scratch_pool.acquire();
        let scratch: &SharedScratch<T> = &scratch;
        let barrier = GroupBarrier::new(lanes as usize);

        trace!("Running group {} of '{}'", group_flat, config.label);

        thread::scope(|s| {
            let mut handles = Vec::with_capacity(lanes as usize);
            let mut spawn_error = None;

            for lane in 0..lanes {
                let barrier = &barrier;
                let spawned = thread::Builder::new()
                    .name(format!("{}-g{}-l{}", config.label, group_flat, lane))
                    .stack_size(self.config.lane_stack_size)
                    .spawn_scoped(s, move || {
                        let ctx = GroupContext::new(
                            group_id,
                            LaneId::from_flat(lane, config.group.x),
                            config.group,
                            config.grid,
                            barrier,
                        )
                        .with_crossing_counter(crossings);

                        let outcome =
                            panic::catch_unwind(AssertUnwindSafe(|| kernel(&ctx, scratch)));
                        if outcome.is_err() {
                            barrier.poison();
                        }
                        outcome
                    });

                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(e) => {
                        // Lanes already running unwind at their next barrier.
                        barrier.poison();
                        spawn_error = Some(format!(
                            "could not spawn lane {} of group {}: {}",
                            lane, group_flat, e
                        ));
                        break;
                    }
                }
            }

            let mut failure = None;
            for (lane, handle) in handles.into_iter().enumerate() {
                let payload = match handle.join() {
                    Ok(Ok(())) => continue,
                    Ok(Err(payload)) | Err(payload) => payload,
                };
                if failure.is_none() && payload.downcast_ref::<BarrierPoisoned>().is_none() {
                    failure = Some(format!(
                        "lane {} of group {} in '{}' panicked: {}",
                        lane,
                        group_flat,
                        config.label,
                        panic_message(payload.as_ref())
                    ));
                }
            }

            match failure.or(spawn_error) {
                Some(msg) => Err(StencilError::launch(msg)),
                None if barrier.is_poisoned() => Err(StencilError::launch(format!(
                    "group {} of '{}' was aborted",
                    group_flat, config.label
                ))),
                None => Ok(()),
            }
        })
    }

    /// Get runtime metrics.
    pub fn metrics(&self) -> RuntimeMetrics {
        RuntimeMetrics {
            total_launches: self.total_launches.load(Ordering::Relaxed),
            failed_launches: self.failed_launches.load(Ordering::Relaxed),
            groups_executed: self.groups_executed.load(Ordering::Relaxed),
            lanes_executed: self.lanes_executed.load(Ordering::Relaxed),
            barrier_crossings: self.barrier_crossings.load(Ordering::Relaxed),
            scratch_acquired: self.scratch_acquired.load(Ordering::Relaxed),
            scratch_hits: self.scratch_hits.load(Ordering::Relaxed),
        }
    }

    /// Reject all further launches.
    pub fn shutdown(&self) {
        info!("Shutting down CPU stencil runtime");
        *self.shutdown.write() = true;
        let metrics = self.metrics();
        info!(
            "CPU stencil runtime shut down ({} launches, {} groups)",
            metrics.total_launches, metrics.groups_executed
        );
    }
}

impl std::fmt::Debug for CpuRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuRuntime")
            .field("config", &self.config)
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

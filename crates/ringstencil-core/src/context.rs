//! Group context providing lane identity and the group barrier to kernels.
//!
//! Every lane of a group receives its own `GroupContext`; all of them share
//! one [`GroupBarrier`]. The barrier is the only synchronization primitive
//! kernels use.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Condvar, Mutex};

use crate::types::{Dim2, GroupId, LaneId};

/// Unwind payload of a lane released from a poisoned barrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarrierPoisoned;

#[derive(Debug, Default)]
struct BarrierState {
    arrived: usize,
    generation: u64,
    poisoned: bool,
}

/// Reusable barrier for the lanes of one group.
///
/// Unlike `std::sync::Barrier` it can be poisoned: once a lane fails, every
/// lane waiting at (or later reaching) the barrier unwinds with
/// [`BarrierPoisoned`] instead of blocking forever.
///
/// The barrier also orders memory: everything a lane stored before `wait`
/// happens-before everything any lane does after the same `wait` returns.
#[derive(Debug)]
pub struct GroupBarrier {
    lanes: usize,
    state: Mutex<BarrierState>,
    cvar: Condvar,
}

impl GroupBarrier {
    /// Barrier for `lanes` participants.
    pub fn new(lanes: usize) -> Self {
        Self {
            lanes: lanes.max(1),
            state: Mutex::new(BarrierState::default()),
            cvar: Condvar::new(),
        }
    }

    /// Number of participants.
    pub fn lanes(&self) -> usize {
        self.lanes
    }

    /// Block until all lanes arrive. Returns `true` for exactly one lane
    /// (the last to arrive) per crossing.
    ///
    /// Unwinds with [`BarrierPoisoned`] if the barrier is poisoned.
    pub fn wait(&self) -> bool {
        let mut state = self.state.lock();
        if state.poisoned {
            drop(state);
            std::panic::resume_unwind(Box::new(BarrierPoisoned));
        }

        let generation = state.generation;
        state.arrived += 1;
        if state.arrived == self.lanes {
            state.arrived = 0;
            state.generation = state.generation.wrapping_add(1);
            self.cvar.notify_all();
            return true;
        }

        while state.generation == generation && !state.poisoned {
            self.cvar.wait(&mut state);
        }
        if state.generation == generation {
            drop(state);
            std::panic::resume_unwind(Box::new(BarrierPoisoned));
        }
        false
    }

    /// Release every waiting lane and make all future waits unwind.
    pub fn poison(&self) {
        let mut state = self.state.lock();
        state.poisoned = true;
        self.cvar.notify_all();
    }

    /// Whether [`GroupBarrier::poison`] was called.
    pub fn is_poisoned(&self) -> bool {
        self.state.lock().poisoned
    }
}

/// Per-lane view of the executing group.
///
/// # Lifetime
///
/// The context borrows the group's barrier for the duration of one group
/// activation.
pub struct GroupContext<'a> {
    /// Group identity within the (physical) grid.
    pub group_id: GroupId,
    /// Lane identity within the group.
    pub lane_id: LaneId,
    /// Group dimensions (lanes per axis).
    pub group_dim: Dim2,
    /// Grid dimensions (physical groups per axis).
    pub grid_dim: Dim2,
    /// Barrier shared by every lane of the group.
    barrier: &'a GroupBarrier,
    /// Barrier crossings counted by the group leader.
    crossings: Option<&'a AtomicU64>,
}

impl<'a> GroupContext<'a> {
    /// Create a context for one lane.
    pub fn new(
        group_id: GroupId,
        lane_id: LaneId,
        group_dim: Dim2,
        grid_dim: Dim2,
        barrier: &'a GroupBarrier,
    ) -> Self {
        Self {
            group_id,
            lane_id,
            group_dim,
            grid_dim,
            barrier,
            crossings: None,
        }
    }

    /// Count barrier crossings into `counter` (once per crossing per group).
    pub fn with_crossing_counter(mut self, counter: &'a AtomicU64) -> Self {
        self.crossings = Some(counter);
        self
    }

    // === Identity ===

    /// Flat lane id (`threadIdx.x` of a 1-D group).
    #[inline]
    pub fn lane_flat(&self) -> u32 {
        self.lane_id.linear(self.group_dim.x)
    }

    /// Flat group id (`blockIdx.x` of a 1-D grid).
    #[inline]
    pub fn group_flat(&self) -> u32 {
        self.group_id.linear(self.grid_dim.x)
    }

    /// Lanes per group.
    #[inline]
    pub fn group_size(&self) -> u32 {
        self.group_dim.flat()
    }

    /// Physical groups in the grid.
    #[inline]
    pub fn num_groups(&self) -> u32 {
        self.grid_dim.flat()
    }

    // === Synchronization ===

    /// Wait until every lane of the group has arrived.
    ///
    /// Stores to shared scratch made before the call are visible to every
    /// lane of the group after it returns.
    #[inline]
    pub fn sync_threads(&self) {
        if self.barrier.wait() {
            if let Some(counter) = self.crossings {
                counter.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

impl std::fmt::Debug for GroupContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupContext")
            .field("group_id", &self.group_id)
            .field("lane_id", &self.lane_id)
            .field("group_dim", &self.group_dim)
            .field("grid_dim", &self.grid_dim)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[test]
    fn test_lane_and_group_identity() {
        let barrier = GroupBarrier::new(1);
        let ctx = GroupContext::new(
            GroupId::new(2, 1),
            LaneId::new(3, 1),
            Dim2::new(4, 2),
            Dim2::new(5, 3),
            &barrier,
        );

        assert_eq!(ctx.lane_flat(), 7);
        assert_eq!(ctx.group_flat(), 7);
        assert_eq!(ctx.group_size(), 8);
        assert_eq!(ctx.num_groups(), 15);
    }

    #[test]
    fn test_single_lane_barrier_does_not_block() {
        let barrier = GroupBarrier::new(1);
        let counter = AtomicU64::new(0);
        let ctx = GroupContext::new(
            GroupId::default(),
            LaneId::default(),
            Dim2::new(1, 1),
            Dim2::new(1, 1),
            &barrier,
        )
        .with_crossing_counter(&counter);

        ctx.sync_threads();
        ctx.sync_threads();
        assert_eq!(counter.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_barrier_orders_lanes() {
        const LANES: u32 = 4;
        let barrier = GroupBarrier::new(LANES as usize);
        let counter = AtomicU64::new(0);
        let arrived = AtomicU32::new(0);

        std::thread::scope(|s| {
            for lane in 0..LANES {
                let barrier = &barrier;
                let counter = &counter;
                let arrived = &arrived;
                s.spawn(move || {
                    let ctx = GroupContext::new(
                        GroupId::default(),
                        LaneId::from_flat(lane, LANES),
                        Dim2::new_1d(LANES),
                        Dim2::new_1d(1),
                        barrier,
                    )
                    .with_crossing_counter(counter);

                    for round in 1..=3 {
                        arrived.fetch_add(1, Ordering::Relaxed);
                        ctx.sync_threads();
                        assert!(arrived.load(Ordering::Relaxed) >= round * LANES);
                        ctx.sync_threads();
                    }
                });
            }
        });

        assert_eq!(counter.load(Ordering::Relaxed), 6);
    }

    #[test]
    fn test_poison_releases_waiters() {
        let barrier = GroupBarrier::new(2);

        let result = std::thread::scope(|s| {
            let waiter = s.spawn(|| {
                std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| barrier.wait()))
            });
            while !barrier.is_poisoned() {
                std::thread::sleep(std::time::Duration::from_millis(1));
                barrier.poison();
            }
            waiter.join()
        });

        let payload = result.unwrap().unwrap_err();
        assert!(payload.downcast_ref::<BarrierPoisoned>().is_some());
    }

    #[test]
    fn test_wait_after_poison_unwinds() {
        let barrier = GroupBarrier::new(3);
        barrier.poison();
        let payload =
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| barrier.wait())).unwrap_err();
        assert!(payload.downcast_ref::<BarrierPoisoned>().is_some());
    }
}

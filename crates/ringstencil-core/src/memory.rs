//! Grid, output and group-shared scratch memory.
//!
//! Lanes of a group share their scratch buffer, and lanes of all groups share
//! the output grid, so both are built from atomic cells accessed with relaxed
//! ordering. Cross-lane visibility comes from the group barrier alone: a
//! value stored before [`GroupContext::sync_threads`](crate::GroupContext::sync_threads)
//! is visible to every lane of the group after it.

use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};

use parking_lot::Mutex;
use tracing::trace;

use crate::element::Element;
use crate::error::{Result, StencilError};
use crate::types::Lens;

/// Read access to a 2-D grid.
pub trait GridView<T>: Sync {
    /// Grid dimensions.
    fn lens(&self) -> Lens;

    /// Sample at `(x, y)`; both coordinates must already be in bounds.
    fn read(&self, x: i64, y: i64) -> T;
}

/// Write access to a 2-D output grid shared by many lanes.
pub trait OutputView<T>: Sync {
    /// Grid dimensions.
    fn lens(&self) -> Lens;

    /// Store `value` at `(x, y)`; both coordinates must be in bounds.
    fn write(&self, x: i64, y: i64, value: T);
}

/// Read-only, row-major input grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridBuffer<T> {
    lens: Lens,
    data: Vec<T>,
}

fn check_lens(width: i64, height: i64) -> Result<Lens> {
    if width < 1 || height < 1 {
        return Err(StencilError::EmptyDomain { width, height });
    }
    Ok(Lens::new(width, height))
}

impl<T: Element> GridBuffer<T> {
    /// Wrap `data` as a `width x height` grid.
    pub fn from_vec(width: i64, height: i64, data: Vec<T>) -> Result<Self> {
        let lens = check_lens(width, height)?;
        let expected = lens.flat_len() as usize;
        if data.len() != expected {
            return Err(StencilError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { lens, data })
    }

    /// Build a grid from a function of `(x, y)`.
    pub fn from_fn(width: i64, height: i64, mut f: impl FnMut(i64, i64) -> T) -> Result<Self> {
        let lens = check_lens(width, height)?;
        let mut data = Vec::with_capacity(lens.flat_len() as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Ok(Self { lens, data })
    }

    /// Grid filled with one value.
    pub fn filled(width: i64, height: i64, value: T) -> Result<Self> {
        Self::from_fn(width, height, |_, _| value)
    }

    /// Grid dimensions.
    pub fn lens(&self) -> Lens {
        self.lens
    }

    /// Sample at row-major index `index`.
    #[inline]
    pub fn at_flat(&self, index: usize) -> T {
        self.data[index]
    }

    /// Row-major samples.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Consume into the row-major samples.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl<T: Element> GridView<T> for GridBuffer<T> {
    #[inline]
    fn lens(&self) -> Lens {
        self.lens
    }

    #[inline]
    fn read(&self, x: i64, y: i64) -> T {
        self.data[self.lens.index(x, y)]
    }
}

/// Output grid written concurrently, each element by exactly one lane.
///
/// With write tracking enabled every store is also counted, so a launch can be
/// checked for gaps (elements never written) and overlaps (elements written
/// by more than one lane).
pub struct OutputGrid<T> {
    lens: Lens,
    cells: Vec<AtomicU64>,
    writes: Option<Vec<AtomicU32>>,
    _marker: PhantomData<T>,
}

impl<T: Element> OutputGrid<T> {
    /// Zero-initialized output grid.
    pub fn new(lens: Lens) -> Result<Self> {
        let lens = check_lens(lens.x, lens.y)?;
        let len = lens.flat_len() as usize;
        let zero = T::zero().to_bits();
        Ok(Self {
            lens,
            cells: (0..len).map(|_| AtomicU64::new(zero)).collect(),
            writes: None,
            _marker: PhantomData,
        })
    }

    /// Output grid that counts stores per element.
    pub fn with_write_tracking(lens: Lens) -> Result<Self> {
        let mut out = Self::new(lens)?;
        out.writes = Some((0..out.cells.len()).map(|_| AtomicU32::new(0)).collect());
        Ok(out)
    }

    /// Store at a row-major index.
    #[inline]
    pub fn write_flat(&self, index: usize, value: T) {
        self.cells[index].store(value.to_bits(), Ordering::Relaxed);
        if let Some(writes) = &self.writes {
            writes[index].fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Load at a row-major index.
    pub fn read_flat(&self, index: usize) -> T {
        T::from_bits(self.cells[index].load(Ordering::Relaxed))
    }

    /// Per-element store counts, if tracking is enabled.
    pub fn write_counts(&self) -> Option<Vec<u32>> {
        self.writes
            .as_ref()
            .map(|w| w.iter().map(|c| c.load(Ordering::Relaxed)).collect())
    }

    /// Consume into row-major samples.
    pub fn into_vec(self) -> Vec<T> {
        self.cells
            .into_iter()
            .map(|c| T::from_bits(c.into_inner()))
            .collect()
    }
}

impl<T: Element> OutputView<T> for OutputGrid<T> {
    #[inline]
    fn lens(&self) -> Lens {
        self.lens
    }

    #[inline]
    fn write(&self, x: i64, y: i64, value: T) {
        self.write_flat(self.lens.index(x, y), value);
    }
}

impl<T> std::fmt::Debug for OutputGrid<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputGrid")
            .field("lens", &self.lens)
            .field("tracking", &self.writes.is_some())
            .finish()
    }
}

/// A grid or output seen with its axes swapped.
///
/// Running a row sweep over transposed views sweeps the original along its
/// columns.
#[derive(Debug, Clone, Copy)]
pub struct TransposedView<'a, V: ?Sized>(pub &'a V);

impl<T, V: GridView<T> + ?Sized> GridView<T> for TransposedView<'_, V> {
    #[inline]
    fn lens(&self) -> Lens {
        self.0.lens().transposed()
    }

    #[inline]
    fn read(&self, x: i64, y: i64) -> T {
        self.0.read(y, x)
    }
}

impl<T, V: OutputView<T> + ?Sized> OutputView<T> for TransposedView<'_, V> {
    #[inline]
    fn lens(&self) -> Lens {
        self.0.lens().transposed()
    }

    #[inline]
    fn write(&self, x: i64, y: i64, value: T) {
        self.0.write(y, x, value);
    }
}

/// Group-local scratch memory (the tile).
///
/// Fixed capacity, addressed by flat index. Lanes write disjoint cells, meet
/// at the group barrier, then read.
pub struct SharedScratch<T> {
    cells: Vec<AtomicU64>,
    _marker: PhantomData<T>,
}

impl<T: Element> SharedScratch<T> {
    /// Allocate `len` zeroed cells.
    pub fn new(len: usize) -> Self {
        let zero = T::zero().to_bits();
        Self {
            cells: (0..len).map(|_| AtomicU64::new(zero)).collect(),
            _marker: PhantomData,
        }
    }

    /// Number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the scratch has no cells.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Store into cell `index`.
    #[inline]
    pub fn store(&self, index: usize, value: T) {
        self.cells[index].store(value.to_bits(), Ordering::Relaxed);
    }

    /// Load cell `index`.
    #[inline]
    pub fn load(&self, index: usize) -> T {
        T::from_bits(self.cells[index].load(Ordering::Relaxed))
    }

    /// Overwrite every cell.
    pub fn fill(&self, value: T) {
        let bits = value.to_bits();
        for cell in &self.cells {
            cell.store(bits, Ordering::Relaxed);
        }
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> Vec<T> {
        self.cells
            .iter()
            .map(|c| T::from_bits(c.load(Ordering::Relaxed)))
            .collect()
    }
}

impl<T> std::fmt::Debug for SharedScratch<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedScratch")
            .field("len", &self.cells.len())
            .finish()
    }
}

/// Pool of scratch buffers reused across group activations.
///
/// Groups of one launch all ask for the same capacity, so buffers released by
/// one wave of groups are handed to the next.
pub struct ScratchPool<T> {
    /// Capacity of every buffer in this pool.
    len: usize,
    /// Maximum number of idle buffers kept.
    max_idle: usize,
    /// Free list.
    free_list: Mutex<Vec<SharedScratch<T>>>,
    /// Statistics: total acquisitions.
    total_acquired: AtomicUsize,
    /// Statistics: acquisitions served from the free list.
    cache_hits: AtomicUsize,
}

impl<T: Element> ScratchPool<T> {
    /// Create a pool of `len`-cell buffers keeping at most `max_idle` idle.
    pub fn new(len: usize, max_idle: usize) -> Self {
        Self {
            len,
            max_idle,
            free_list: Mutex::new(Vec::with_capacity(max_idle)),
            total_acquired: AtomicUsize::new(0),
            cache_hits: AtomicUsize::new(0),
        }
    }

    /// Take a buffer from the pool, allocating if none is idle.
    ///
    /// Reused buffers keep their old contents; kernels overwrite every cell
    /// they read.
    pub fn acquire(&self) -> PooledScratch<'_, T> {
        self.total_acquired.fetch_add(1, Ordering::Relaxed);

        let scratch = {
            let mut free = self.free_list.lock();
            match free.pop() {
                Some(scratch) => {
                    self.cache_hits.fetch_add(1, Ordering::Relaxed);
                    scratch
                }
                None => {
                    trace!(len = self.len, "allocating scratch buffer");
                    SharedScratch::new(self.len)
                }
            }
        };

        PooledScratch {
            scratch: Some(scratch),
            pool: self,
        }
    }

    fn release(&self, scratch: SharedScratch<T>) {
        let mut free = self.free_list.lock();
        if free.len() < self.max_idle {
            free.push(scratch);
        }
    }

    /// Pool statistics.
    pub fn stats(&self) -> ScratchStats {
        ScratchStats {
            total_acquired: self.total_acquired.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            idle: self.free_list.lock().len(),
        }
    }
}

/// Scratch buffer borrowed from a [`ScratchPool`]; returned on drop.
pub struct PooledScratch<'a, T: Element> {
    scratch: Option<SharedScratch<T>>,
    pool: &'a ScratchPool<T>,
}

impl<T: Element> Deref for PooledScratch<'_, T> {
    type Target = SharedScratch<T>;

    fn deref(&self) -> &SharedScratch<T> {
        // Only taken in Drop.
        self.scratch.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl<T: Element> Drop for PooledScratch<'_, T> {
    fn drop(&mut self) {
        if let Some(scratch) = self.scratch.take() {
            self.pool.release(scratch);
        }
    }
}

/// Scratch pool statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScratchStats {
    /// Total acquisitions.
    pub total_acquired: usize,
    /// Acquisitions served without allocating.
    pub cache_hits: usize,
    /// Buffers currently idle.
    pub idle: usize,
}

impl ScratchStats {
    /// Fraction of acquisitions served from the pool.
    pub fn hit_rate(&self) -> f64 {
        if self.total_acquired == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.total_acquired as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    #[test]
    fn test_grid_rejects_empty_domain() {
        let err = GridBuffer::<f32>::from_vec(0, 4, vec![]).unwrap_err();
        assert_eq!(
            err,
            StencilError::EmptyDomain {
                width: 0,
                height: 4
            }
        );
        assert!(OutputGrid::<f32>::new(Lens::new(3, 0)).is_err());
    }

    #[test]
    fn test_grid_rejects_wrong_length() {
        let err = GridBuffer::from_vec(3, 3, vec![1i32; 8]).unwrap_err();
        assert_eq!(
            err,
            StencilError::BufferSizeMismatch {
                expected: 9,
                actual: 8
            }
        );
    }

    #[test]
    fn test_grid_row_major() {
        let grid = GridBuffer::from_fn(4, 3, |x, y| (y * 10 + x) as i64).unwrap();
        assert_eq!(grid.read(3, 2), 23);
        assert_eq!(grid.at_flat(5), 11);
        assert_eq!(grid.as_slice().len(), 12);
    }

    #[test]
    fn test_transposed_view() {
        let grid = GridBuffer::from_fn(4, 3, |x, y| (y * 10 + x) as i32).unwrap();
        let view = TransposedView(&grid);
        assert_eq!(GridView::<i32>::lens(&view), Lens::new(3, 4));
        assert_eq!(GridView::<i32>::read(&view, 2, 3), 23);

        let out = OutputGrid::<i32>::new(Lens::new(4, 3)).unwrap();
        OutputView::<i32>::write(&TransposedView(&out), 1, 3, 7);
        assert_eq!(out.read_flat(Lens::new(4, 3).index(3, 1)), 7);
    }

    #[test]
    fn test_output_write_tracking() {
        let out = OutputGrid::<f64>::with_write_tracking(Lens::new(2, 2)).unwrap();
        out.write(0, 0, 1.5);
        out.write(1, 1, 2.5);
        out.write(1, 1, 3.5);
        assert_eq!(out.write_counts(), Some(vec![1, 0, 0, 2]));
        assert_eq!(out.into_vec(), vec![1.5, 0.0, 0.0, 3.5]);
    }

    #[test]
    fn test_scratch_store_load() {
        let mut rng = StdRng::seed_from_u64(7);
        let scratch = SharedScratch::<f32>::new(64);
        let values: Vec<f32> = (0..64).map(|_| rng.gen_range(-1.0..1.0)).collect();
        for (i, v) in values.iter().enumerate() {
            scratch.store(i, *v);
        }
        assert_eq!(scratch.snapshot(), values);
        scratch.fill(0.5);
        assert!(scratch.snapshot().iter().all(|v| *v == 0.5));
    }

    #[test]
    fn test_scratch_pool_reuse() {
        let pool = ScratchPool::<i32>::new(16, 2);
        {
            let a = pool.acquire();
            let b = pool.acquire();
            assert_eq!(a.len(), 16);
            assert_eq!(b.len(), 16);
        }
        let stats = pool.stats();
        assert_eq!(stats.total_acquired, 2);
        assert_eq!(stats.cache_hits, 0);
        assert_eq!(stats.idle, 2);

        let _c = pool.acquire();
        let stats = pool.stats();
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.idle, 1);
        assert!((stats.hit_rate() - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_scratch_pool_caps_idle() {
        let pool = ScratchPool::<i32>::new(4, 1);
        {
            let _a = pool.acquire();
            let _b = pool.acquire();
            let _c = pool.acquire();
        }
        assert_eq!(pool.stats().idle, 1);
    }
}

//! Sliding-window evaluators.
//!
//! Instead of a full tile, a group keeps a ring of rows in scratch and
//! sweeps down a strip of the grid. Each step appends one new row (per lane
//! row), drops the oldest, and averages the window that just became
//! complete. Consecutive windows share all but one row, so no halo row is
//! ever loaded twice by the same group.
//!
//! Ring rows are numbered relative to the strip: ring row `r` holds grid row
//! `strip_offset_y + amin_y + r` (clamped) and lives in slot
//! `(first_slot + r) mod rows`.

use ringstencil_core::addressing::{clamp, div_up, next_pow2};
use ringstencil_core::{
    Dim2, Element, GridView, GroupContext, GroupId, GroupShape, OutputView, SharedScratch,
    TransposedView, Transposed, Window,
};

use crate::tile::TileOrigin;
use crate::window::window_average;

/// Axis a sweep advances along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SweepAxis {
    /// Advance one row at a time (down the columns of a strip).
    #[default]
    Rows,
    /// Advance one column at a time; runs the row sweep over transposed views.
    Columns,
}

impl SweepAxis {
    /// Short name.
    pub fn name(self) -> &'static str {
        match self {
            SweepAxis::Rows => "rows",
            SweepAxis::Columns => "columns",
        }
    }
}

/// Layout of the row ring in scratch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRing {
    /// Cells per ring row.
    pub width: usize,
    /// Physical rows in the ring.
    pub rows: usize,
    /// Slot holding ring row 0.
    pub first_slot: usize,
}

impl RowRing {
    /// Ring of the flat evaluator: `G::FLAT` columns, exactly `RANGE_Y` rows.
    pub fn flat<W: Window, G: GroupShape>() -> Self {
        Self::with_rows::<W>(G::FLAT, W::RANGE_Y)
    }

    /// Ring of the power-of-two evaluator: `G::X` columns and
    /// `next_pow2(RANGE_Y + G::Y)` rows.
    pub fn pow2<W: Window, G: GroupShape>() -> Self {
        Self::with_rows::<W>(G::X, next_pow2(W::RANGE_Y + G::Y))
    }

    fn with_rows<W: Window>(width: usize, rows: usize) -> Self {
        Self {
            width,
            rows,
            first_slot: W::AMIN_Y.rem_euclid(rows as i64) as usize,
        }
    }

    /// Scratch cells needed.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.width * self.rows
    }

    /// Slot of ring row `row`.
    #[inline]
    pub fn slot(&self, row: usize) -> usize {
        (self.first_slot + row) % self.rows
    }

    /// Copy of ring row `row`.
    pub fn read_row<T: Element>(&self, scratch: &SharedScratch<T>, row: usize) -> Vec<T> {
        let base = self.slot(row) * self.width;
        (0..self.width).map(|x| scratch.load(base + x)).collect()
    }
}

/// Number of columns a sliding group produces outputs for.
#[inline]
pub const fn working_width(lanes_x: usize, halo_x: usize) -> usize {
    lanes_x.saturating_sub(halo_x)
}

/// Pre-fill of the flat evaluator: lane `lane` loads its column of ring rows
/// `0..HALO_Y` one row at a time.
///
/// Returns the flat scratch position of ring row `HALO_Y` in this lane's
/// column, where the main sweep writes first.
pub fn prefill_flat<T, W, I>(
    scratch: &SharedScratch<T>,
    ring: &RowRing,
    lane: usize,
    origin: TileOrigin,
    input: &I,
) -> usize
where
    T: Element,
    W: Window,
    I: GridView<T> + ?Sized,
{
    let lens = input.lens();
    let ring_flat = ring.capacity();
    let read_gid_x = clamp(origin.x + lane as i64 + W::AMIN_X, lens.max_x());

    let mut write_pos = ring.first_slot * ring.width + lane;
    let mut gid_y = origin.y + W::AMIN_Y;
    for _ in 0..W::HALO_Y {
        scratch.store(write_pos, input.read(read_gid_x, clamp(gid_y, lens.max_y())));
        write_pos += ring.width;
        if write_pos >= ring_flat {
            write_pos -= ring_flat;
        }
        gid_y += 1;
    }
    write_pos
}

/// Pre-fill of the power-of-two evaluator: the lanes of a `G` group load
/// ring rows `0..HALO_Y` cooperatively, `G::Y` rows per chunk. The final
/// chunk is guarded when `HALO_Y` is not a multiple of `G::Y`.
pub fn prefill_pow2<T, W, G, I>(
    scratch: &SharedScratch<T>,
    ring: &RowRing,
    lane: usize,
    origin: TileOrigin,
    input: &I,
) where
    T: Element,
    W: Window,
    G: GroupShape,
    I: GridView<T> + ?Sized,
{
    let lens = input.lens();
    let mask = ring.rows - 1;
    let local_x = lane % G::X;
    let local_y = lane / G::X;
    let read_gid_x = clamp(origin.x + local_x as i64 + W::AMIN_X, lens.max_x());

    for chunk in 0..div_up(W::HALO_Y, G::Y) {
        let row = chunk * G::Y + local_y;
        if row >= W::HALO_Y {
            break;
        }
        let gid_y = clamp(origin.y + W::AMIN_Y + row as i64, lens.max_y());
        let slot = (ring.first_slot + row) & mask;
        scratch.store(slot * ring.width + local_x, input.read(read_gid_x, gid_y));
    }
}

/// Flat sliding-window kernel.
///
/// A 1-D group of `G::FLAT` lanes holds one ring column per lane and
/// produces outputs for the first `G::FLAT - HALO_X` columns; the remaining
/// lanes only supply the halo. Each group sweeps `windows_y` rows. `grid` is
/// the covering grid of strips, at least
/// `ceil(width / working_x) x ceil(height / windows_y)`, and the scratch must
/// hold [`RowRing::flat`] cells.
pub fn sliding_flat<T, W, G, I, O>(
    ctx: &GroupContext<'_>,
    scratch: &SharedScratch<T>,
    windows_y: usize,
    grid: Dim2,
    input: &I,
    output: &O,
) where
    T: Element,
    W: Window,
    G: GroupShape,
    I: GridView<T> + ?Sized,
    O: OutputView<T> + ?Sized,
{
    let () = W::ASSERT_VALID;
    let () = G::ASSERT_VALID;

    let lens = input.lens();
    let ring = RowRing::flat::<W, G>();
    let ring_flat = ring.capacity();
    let working_x = working_width(G::FLAT, W::HALO_X);

    let strip_id = GroupId::from_flat(ctx.group_flat(), grid.x.max(1));
    let origin = TileOrigin::new(
        strip_id.x as i64 * working_x as i64,
        strip_id.y as i64 * windows_y as i64,
    );

    let lane = ctx.lane_flat() as usize;
    let write_gid_x = origin.x + lane as i64;
    let read_gid_x = clamp(write_gid_x + W::AMIN_X, lens.max_x());
    let should_write_x = write_gid_x < lens.x && lane < working_x;

    let mut write_pos = prefill_flat::<T, W, I>(scratch, &ring, lane, origin, input);
    let mut write_gid_y = origin.y + W::AMAX_Y;
    let mut read_row = ring.first_slot * ring.width;
    let mut gid_y = origin.y;

    let iters = (windows_y as i64).min(lens.y - origin.y);
    for _ in 0..iters {
        // Previous window must be consumed before its oldest row is replaced.
        ctx.sync_threads();
        scratch.store(write_pos, input.read(read_gid_x, clamp(write_gid_y, lens.max_y())));
        ctx.sync_threads();

        if should_write_x {
            let value = window_average::<T, W>(|k, j| {
                let row = read_row + j * ring.width;
                let row = if row >= ring_flat { row - ring_flat } else { row };
                scratch.load(row + lane + k)
            });
            output.write(write_gid_x, gid_y, value);
        }

        gid_y += 1;
        write_gid_y += 1;
        write_pos += ring.width;
        if write_pos >= ring_flat {
            write_pos -= ring_flat;
        }
        read_row += ring.width;
        if read_row >= ring_flat {
            read_row -= ring_flat;
        }
    }
}

/// Flat sliding-window kernel sweeping along `axis`.
///
/// For [`SweepAxis::Columns`] the row sweep runs over the transposed input,
/// output and window, so `grid` covers the transposed domain.
pub fn sliding_flat_along<T, W, G, I, O>(
    ctx: &GroupContext<'_>,
    scratch: &SharedScratch<T>,
    axis: SweepAxis,
    windows_y: usize,
    grid: Dim2,
    input: &I,
    output: &O,
) where
    T: Element,
    W: Window,
    G: GroupShape,
    I: GridView<T> + ?Sized,
    O: OutputView<T> + ?Sized,
{
    match axis {
        SweepAxis::Rows => {
            sliding_flat::<T, W, G, I, O>(ctx, scratch, windows_y, grid, input, output)
        }
        SweepAxis::Columns => sliding_flat::<T, Transposed<W>, G, _, _>(
            ctx,
            scratch,
            windows_y,
            grid,
            &TransposedView(input),
            &TransposedView(output),
        ),
    }
}

/// Power-of-two sliding-window kernel.
///
/// A `G::X x G::Y` group advances `G::Y` rows per step over a ring of
/// `next_pow2(RANGE_Y + G::Y)` rows addressed by bitmask. Outputs cover the
/// first `G::X - HALO_X` columns; strips are `G::Y * windows_y` rows tall.
/// The scratch must hold [`RowRing::pow2`] cells.
pub fn sliding_pow2<T, W, G, I, O>(
    ctx: &GroupContext<'_>,
    scratch: &SharedScratch<T>,
    windows_y: usize,
    grid: Dim2,
    input: &I,
    output: &O,
) where
    T: Element,
    W: Window,
    G: GroupShape,
    I: GridView<T> + ?Sized,
    O: OutputView<T> + ?Sized,
{
    let () = W::ASSERT_VALID;
    let () = G::ASSERT_VALID;

    let lens = input.lens();
    let ring = RowRing::pow2::<W, G>();
    let mask = ring.rows - 1;
    let working_x = working_width(G::X, W::HALO_X);

    let strip_id = GroupId::from_flat(ctx.group_flat(), grid.x.max(1));
    let origin = TileOrigin::new(
        strip_id.x as i64 * working_x as i64,
        strip_id.y as i64 * (G::Y * windows_y) as i64,
    );

    let lane = ctx.lane_flat() as usize;
    let local_x = lane % G::X;
    let local_y = lane / G::X;
    let gid_x = origin.x + local_x as i64;
    let read_gid_x = clamp(gid_x + W::AMIN_X, lens.max_x());
    let should_write_x = gid_x < lens.x && local_x < working_x;

    prefill_pow2::<T, W, G, I>(scratch, &ring, lane, origin, input);

    for step in 0..windows_y {
        ctx.sync_threads();

        let load_row = W::HALO_Y + step * G::Y + local_y;
        let load_gid_y = clamp(origin.y + W::AMIN_Y + load_row as i64, lens.max_y());
        let slot = (ring.first_slot + load_row) & mask;
        scratch.store(slot * ring.width + local_x, input.read(read_gid_x, load_gid_y));

        ctx.sync_threads();

        let out_row = step * G::Y + local_y;
        let gid_y = origin.y + out_row as i64;
        if should_write_x && gid_y < lens.y {
            let value = window_average::<T, W>(|k, j| {
                let slot = (ring.first_slot + out_row + j) & mask;
                scratch.load(slot * ring.width + local_x + k)
            });
            output.write(gid_x, gid_y, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;
    use ringstencil_core::shape::{Group, Rect};
    use ringstencil_core::GridBuffer;

    fn check_prefills_agree<W: Window>() {
        type Flat = Group<8, 1>;
        type Pow2 = Group<8, 3>;

        let mut rng = StdRng::seed_from_u64(11);
        let input = GridBuffer::from_fn(13, 9, |_, _| rng.gen_range(0..500i32)).unwrap();

        for origin in [TileOrigin::new(0, 0), TileOrigin::new(5, 4), TileOrigin::new(6, 8)] {
            let flat_ring = RowRing::flat::<W, Flat>();
            let flat = SharedScratch::new(flat_ring.capacity());
            for lane in 0..Flat::FLAT {
                prefill_flat::<i32, W, _>(&flat, &flat_ring, lane, origin, &input);
            }

            let pow2_ring = RowRing::pow2::<W, Pow2>();
            let pow2 = SharedScratch::new(pow2_ring.capacity());
            for lane in 0..Pow2::FLAT {
                prefill_pow2::<i32, W, Pow2, _>(&pow2, &pow2_ring, lane, origin, &input);
            }

            let lens = input.lens();
            for row in 0..W::HALO_Y {
                let expected: Vec<i32> = (0..8)
                    .map(|x| {
                        input.read(
                            clamp(origin.x + x + W::AMIN_X, lens.max_x()),
                            clamp(origin.y + W::AMIN_Y + row as i64, lens.max_y()),
                        )
                    })
                    .collect();
                assert_eq!(flat_ring.read_row(&flat, row), expected, "flat row {row}");
                assert_eq!(pow2_ring.read_row(&pow2, row), expected, "pow2 row {row}");
            }
        }
    }

    #[test]
    fn test_prefills_leave_same_window() {
        check_prefills_agree::<Rect<-1, -1, 1, 1>>();
        check_prefills_agree::<Rect<-2, -4, 0, 3>>();
        check_prefills_agree::<Rect<0, 2, 3, 6>>();
        check_prefills_agree::<Rect<0, 0, 0, 0>>();
    }

    #[test]
    fn test_ring_geometry() {
        type W = Rect<-1, -2, 1, 2>;
        let flat = RowRing::flat::<W, Group<16, 2>>();
        assert_eq!((flat.width, flat.rows, flat.first_slot), (32, 5, 3));
        let pow2 = RowRing::pow2::<W, Group<16, 4>>();
        assert_eq!((pow2.width, pow2.rows, pow2.first_slot), (16, 16, 14));
        assert_eq!(pow2.slot(3), 1);
        assert_eq!(working_width(16, W::HALO_X), 14);
        assert_eq!(working_width(2, 5), 0);
    }
}

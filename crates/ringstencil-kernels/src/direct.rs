//! Direct (uncached) evaluator.
//!
//! Every lane reads its whole window straight from the input grid, clamping
//! each neighbor. No scratch memory, no barriers. This is the semantic
//! reference every cached strategy must reproduce.

use ringstencil_core::addressing::clamp;
use ringstencil_core::{
    Dim2, Element, GridView, GroupContext, GroupId, GroupShape, LaneId, OutputView, Window,
};

use crate::window::window_average;

/// How a lane derives its group and lane coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Addressing {
    /// Native 2-D group and lane ids.
    MultiDim,
    /// Flat group and lane ids decomposed by division/remainder.
    SingleDim,
}

impl Addressing {
    /// Short name.
    pub fn name(self) -> &'static str {
        match self {
            Addressing::MultiDim => "multi_dim",
            Addressing::SingleDim => "single_dim",
        }
    }

    /// Group and lane coordinates of the calling lane within the covering
    /// `grid` of groups.
    #[inline]
    pub fn locate<G: GroupShape>(self, ctx: &GroupContext<'_>, grid: Dim2) -> (GroupId, LaneId) {
        match self {
            Addressing::MultiDim => (ctx.group_id, ctx.lane_id),
            Addressing::SingleDim => (
                GroupId::from_flat(ctx.group_flat(), grid.x.max(1)),
                LaneId::from_flat(ctx.lane_flat(), G::X as u32),
            ),
        }
    }
}

/// Clamped window mean at `(x, y)` read directly from `input`.
#[inline]
pub fn direct_point<T, W, I>(input: &I, x: i64, y: i64) -> T
where
    T: Element,
    W: Window,
    I: GridView<T> + ?Sized,
{
    let lens = input.lens();
    let base_x = x + W::AMIN_X;
    let base_y = y + W::AMIN_Y;
    window_average::<T, W>(|k, j| {
        input.read(
            clamp(base_x + k as i64, lens.max_x()),
            clamp(base_y + j as i64, lens.max_y()),
        )
    })
}

/// Direct evaluator kernel: one output point per lane.
///
/// `grid` is the covering grid of groups, at least
/// `ceil(width / G::X) x ceil(height / G::Y)`.
pub fn direct<T, W, G, I, O>(
    ctx: &GroupContext<'_>,
    addressing: Addressing,
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
    let (group, lane) = addressing.locate::<G>(ctx, grid);
    let gid_x = group.x as i64 * G::X as i64 + lane.x as i64;
    let gid_y = group.y as i64 * G::Y as i64 + lane.y as i64;

    if gid_x < lens.x && gid_y < lens.y {
        output.write(gid_x, gid_y, direct_point::<T, W, I>(input, gid_x, gid_y));
    }
}

/// Sequential evaluation of the whole grid, row-major.
pub fn reference<T, W, I>(input: &I) -> Vec<T>
where
    T: Element,
    W: Window,
    I: GridView<T> + ?Sized,
{
    let () = W::ASSERT_VALID;

    let lens = input.lens();
    let mut out = Vec::with_capacity(lens.flat_len().max(0) as usize);
    for y in 0..lens.y {
        for x in 0..lens.x {
            out.push(direct_point::<T, W, I>(input, x, y));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringstencil_core::{GridBuffer, GroupBarrier, Rect};

    #[test]
    fn test_boundary_clamp_example() {
        type W = Rect<-1, -1, 1, 1>;
        let grid = GridBuffer::from_fn(5, 5, |x, y| (y * 5 + x) as i32).unwrap();
        assert_eq!(direct_point::<i32, W, _>(&grid, 0, 0), 2);
        assert_eq!(direct_point::<i32, W, _>(&grid, 2, 2), 12);
        assert_eq!(direct_point::<i32, W, _>(&grid, 4, 4), 22);
    }

    #[test]
    fn test_reference_keeps_shape() {
        type W = Rect<-2, 0, 0, 3>;
        let grid = GridBuffer::from_fn(7, 3, |x, y| (x * y) as f64).unwrap();
        assert_eq!(reference::<f64, W, _>(&grid).len(), 21);
    }

    #[test]
    fn test_addressing_strategies_agree() {
        use ringstencil_core::Group;
        type G = Group<4, 2>;
        let grid = Dim2::new(3, 2);
        let barrier = GroupBarrier::new(1);

        for group_flat in 0..grid.flat() {
            for lane_flat in 0..G::FLAT as u32 {
                let group = GroupId::from_flat(group_flat, grid.x);
                let lane = LaneId::from_flat(lane_flat, G::X as u32);

                let multi = GroupContext::new(group, lane, Dim2::new(4, 2), grid, &barrier);
                let single = GroupContext::new(
                    GroupId::new(group_flat, 0),
                    LaneId::new(lane_flat, 0),
                    Dim2::new_1d(G::FLAT as u32),
                    Dim2::new_1d(grid.flat()),
                    &barrier,
                );

                assert_eq!(
                    Addressing::MultiDim.locate::<G>(&multi, grid),
                    Addressing::SingleDim.locate::<G>(&single, grid)
                );
            }
        }
    }
}

//! Virtual grid: fewer physical groups than logical group activations.
//!
//! Physical group `p` of `P` serves logical ids `p, p + P, p + 2P, ...` of
//! the virtual grid in sequence, reusing one scratch buffer. The id is
//! advanced with add-and-carry, mirroring the add-carry tile loader one
//! level up.

use ringstencil_core::{
    Dim2, Element, GridView, GroupContext, GroupId, GroupShape, OutputView, SharedScratch,
    TileGeometry, Window,
};

use crate::big_tile::tile_cycle;
use crate::consumer::TileConsumer;
use crate::loader::TileLoader;
use crate::tile::{StripShape, Tile, TileOrigin};

/// Logical ids served by one physical group.
#[derive(Debug, Clone)]
pub struct VirtualIds {
    x: u32,
    y: u32,
    add_x: u32,
    add_y: u32,
    grid: Dim2,
}

impl VirtualIds {
    /// Ids served by physical group `start` when `physical` groups share the
    /// virtual `grid`.
    pub fn new(start: u32, physical: u32, grid: Dim2) -> Self {
        let span_x = grid.x.max(1);
        let physical = physical.max(1);
        let first = GroupId::from_flat(start, span_x);
        Self {
            x: first.x,
            y: first.y,
            add_x: physical % span_x,
            add_y: physical / span_x,
            grid: Dim2::new(span_x, grid.y),
        }
    }
}

impl Iterator for VirtualIds {
    type Item = GroupId;

    fn next(&mut self) -> Option<GroupId> {
        if self.y >= self.grid.y {
            return None;
        }
        let id = GroupId::new(self.x, self.y);

        self.x += self.add_x;
        self.y += self.add_y;
        if self.x >= self.grid.x {
            self.x -= self.grid.x;
            self.y += 1;
        }
        Some(id)
    }
}

/// Virtual big-tile kernel.
///
/// Each physical group walks its [`VirtualIds`] over `virtual_grid` (the
/// covering grid of groups) and runs one big-tile cycle per id. A trailing
/// barrier keeps the next load from overwriting a tile still being read.
pub fn virtual_big_tile<T, W, G, L, C, I, O>(
    ctx: &GroupContext<'_>,
    scratch: &SharedScratch<T>,
    virtual_grid: Dim2,
    input: &I,
    output: &O,
) where
    T: Element,
    W: Window,
    G: GroupShape,
    L: TileLoader,
    C: TileConsumer,
    I: GridView<T> + ?Sized,
    O: OutputView<T> + ?Sized,
{
    virtual_strip::<T, W, G, L, C, I, O>(
        ctx,
        scratch,
        StripShape::SINGLE,
        virtual_grid,
        input,
        output,
    );
}

/// Virtual strip kernel: [`virtual_big_tile`] over a virtual grid of strips.
pub fn virtual_strip<T, W, G, L, C, I, O>(
    ctx: &GroupContext<'_>,
    scratch: &SharedScratch<T>,
    strip: StripShape,
    virtual_grid: Dim2,
    input: &I,
    output: &O,
) where
    T: Element,
    W: Window,
    G: GroupShape,
    L: TileLoader,
    C: TileConsumer,
    I: GridView<T> + ?Sized,
    O: OutputView<T> + ?Sized,
{
    let () = W::ASSERT_VALID;
    let () = G::ASSERT_VALID;

    let tile = Tile::new(scratch, TileGeometry::strip::<W, G>(strip.x, strip.y));
    for id in VirtualIds::new(ctx.group_flat(), ctx.num_groups(), virtual_grid) {
        let origin = TileOrigin::of_strip::<G>(id, strip);
        tile_cycle::<T, W, G, L, C, I, O>(ctx, &tile, strip, origin, input, output);

        // Every lane must be done reading before the next id reloads the tile.
        ctx.sync_threads();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn divrem_ids(start: u32, physical: u32, grid: Dim2) -> Vec<GroupId> {
        (start..grid.flat())
            .step_by(physical as usize)
            .map(|flat| GroupId::from_flat(flat, grid.x))
            .collect()
    }

    #[test]
    fn test_addcarry_ids_match_divrem() {
        for grid in [Dim2::new(1, 1), Dim2::new(5, 3), Dim2::new(7, 1), Dim2::new(1, 9)] {
            for physical in 1..=(grid.flat() + 3) {
                for start in 0..physical {
                    let ids: Vec<_> = VirtualIds::new(start, physical, grid).collect();
                    assert_eq!(
                        ids,
                        divrem_ids(start, physical, grid),
                        "grid {grid:?}, physical {physical}, start {start}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_physical_groups_partition_virtual_grid() {
        let grid = Dim2::new(6, 4);
        let physical = 5;
        let mut seen: Vec<u32> = (0..physical)
            .flat_map(|p| VirtualIds::new(p, physical, grid))
            .map(|id| id.linear(grid.x))
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..grid.flat()).collect::<Vec<_>>());
    }

    #[test]
    fn test_single_physical_group_serves_everything() {
        let grid = Dim2::new(3, 2);
        assert_eq!(VirtualIds::new(0, 1, grid).count(), 6);
    }
}

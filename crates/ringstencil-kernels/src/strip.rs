//! Strip composition: one tile load shared by several adjacent footprints.
//!
//! The halo is loaded once per strip instead of once per footprint, so the
//! share of useful cells in every load grows with the strip.

use ringstencil_core::{
    Dim2, Element, GridView, GroupContext, GroupId, GroupShape, OutputView, SharedScratch,
    TileGeometry, Window,
};

use crate::big_tile::tile_cycle;
use crate::consumer::TileConsumer;
use crate::loader::TileLoader;
use crate::tile::{StripShape, Tile, TileOrigin};

/// Strip kernel: each group serves `strip.x * strip.y` footprints from a
/// single tile.
///
/// `grid` is the covering grid of strips, at least
/// `ceil(width / (strip.x * G::X)) x ceil(height / (strip.y * G::Y))`. The
/// scratch must hold [`TileGeometry::strip`] cells.
pub fn strip<T, W, G, L, C, I, O>(
    ctx: &GroupContext<'_>,
    scratch: &SharedScratch<T>,
    strip: StripShape,
    grid: Dim2,
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

    let strip_id = GroupId::from_flat(ctx.group_flat(), grid.x.max(1));
    let origin = TileOrigin::of_strip::<G>(strip_id, strip);
    let tile = Tile::new(scratch, TileGeometry::strip::<W, G>(strip.x, strip.y));

    tile_cycle::<T, W, G, L, C, I, O>(ctx, &tile, strip, origin, input, output);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consumer::FlatConsumer;
    use crate::direct::reference;
    use crate::loader::{DivRemLoader, ShiftedAddCarryLoader};
    use ringstencil_core::addressing::div_up;
    use ringstencil_core::shape::{Group, Rect};
    use ringstencil_core::{GridBuffer, OutputGrid};
    use ringstencil_cpu::{CpuRuntime, LaunchConfig, RuntimeConfig};

    type W = Rect<-2, -1, 1, 1>;
    type G = Group<4, 2>;

    fn run_strip<L: TileLoader>(input: &GridBuffer<f32>, shape: StripShape) -> Vec<f32> {
        let runtime = CpuRuntime::new(RuntimeConfig::new()).unwrap();
        let lens = input.lens();
        let (span_x, span_y) = shape.extent::<G>();
        let grid = Dim2::new(
            div_up(lens.x as usize, span_x) as u32,
            div_up(lens.y as usize, span_y) as u32,
        );
        let config = LaunchConfig::new("strip")
            .with_grid(Dim2::new_1d(grid.flat()))
            .with_group(Dim2::new_1d(G::FLAT as u32))
            .with_shared_elems(TileGeometry::strip::<W, G>(shape.x, shape.y).flat());

        let output = OutputGrid::new(lens).unwrap();
        runtime
            .launch::<f32, _>(&config, |ctx, scratch| {
                strip::<f32, W, G, L, FlatConsumer, _, _>(ctx, scratch, shape, grid, input, &output)
            })
            .unwrap();
        output.into_vec()
    }

    #[test]
    fn test_strip_shapes_match_reference() {
        let input = GridBuffer::from_fn(13, 9, |x, y| x as f32 * 0.5 - y as f32 * 1.25).unwrap();
        let expected = reference::<f32, W, _>(&input);

        for (x, y) in [(1, 1), (2, 1), (1, 3), (3, 2), (4, 5)] {
            let shape = StripShape::new(x, y);
            assert_eq!(run_strip::<ShiftedAddCarryLoader>(&input, shape), expected);
            assert_eq!(run_strip::<DivRemLoader>(&input, shape), expected);
        }
    }
}

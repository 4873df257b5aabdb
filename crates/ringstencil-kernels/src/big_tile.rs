//! Big-tile kernels: one tile load per group footprint.

use ringstencil_core::{
    Dim2, Element, GridView, GroupContext, GroupId, GroupShape, OutputView, SharedScratch,
    TileGeometry, Window,
};

use crate::consumer::TileConsumer;
use crate::loader::TileLoader;
use crate::tile::{StripShape, Tile, TileOrigin};

/// One load/consume cycle of a tile covering `strip` footprints at `origin`.
///
/// Load, barrier, then one consume per footprint of the strip. The caller
/// owns any barrier needed before the tile is reused.
#[inline]
pub fn tile_cycle<T, W, G, L, C, I, O>(
    ctx: &GroupContext<'_>,
    tile: &Tile<'_, T>,
    strip: StripShape,
    origin: TileOrigin,
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
    let lane = ctx.lane_flat() as usize;
    L::load::<T, W, G, I>(lane, tile, origin, input);

    // The tile must be complete before any lane reads it.
    ctx.sync_threads();

    let local_x = lane % G::X;
    let local_y = lane / G::X;
    for j in 0..strip.y {
        for k in 0..strip.x {
            C::consume::<T, W, O>(tile, origin, local_x + k * G::X, local_y + j * G::Y, output);
        }
    }
}

/// Big-tile kernel: each group loads its footprint plus halo and averages
/// from the tile.
///
/// Groups are addressed by flat id over the covering `grid`. The scratch must
/// hold [`TileGeometry::big_tile`] cells.
pub fn big_tile<T, W, G, L, C, I, O>(
    ctx: &GroupContext<'_>,
    scratch: &SharedScratch<T>,
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

    let group = GroupId::from_flat(ctx.group_flat(), grid.x.max(1));
    let origin = TileOrigin::of_strip::<G>(group, StripShape::SINGLE);
    let tile = Tile::new(scratch, TileGeometry::big_tile::<W, G>());

    tile_cycle::<T, W, G, L, C, I, O>(ctx, &tile, StripShape::SINGLE, origin, input, output);
}

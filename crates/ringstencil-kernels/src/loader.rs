//! Tile loaders.
//!
//! A loader stages the clamped region `[origin + amin, origin + sh_size +
//! amin)` of the input grid into a tile. Clamping happens here, once per
//! tile cell, so consumers never clamp. Loaders do not synchronize: the
//! caller places the barrier between load and consume.

use std::marker::PhantomData;

use ringstencil_core::addressing::{clamp, div_up};
use ringstencil_core::{Element, GridView, GroupShape, Window};

use crate::positions::{AddCarryPositions, DivRemPositions, ShiftedAddCarryPositions, TilePositions};
use crate::tile::{Tile, TileOrigin};

/// Strategy filling a tile cooperatively.
pub trait TileLoader {
    /// Short name used in labels.
    const NAME: &'static str;

    /// Load the cells owned by `lane` (flat id in a group of `G::FLAT`).
    fn load<T, W, G, I>(lane: usize, tile: &Tile<'_, T>, origin: TileOrigin, input: &I)
    where
        T: Element,
        W: Window,
        G: GroupShape,
        I: GridView<T> + ?Sized;
}

/// Flat-addressed loader driven by a [`TilePositions`] enumerator.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatLoader<P>(PhantomData<P>);

/// Flat loader decomposing every position by division/remainder.
pub type DivRemLoader = FlatLoader<DivRemPositions>;

/// Flat loader stepping positions with add-and-carry.
pub type AddCarryLoader = FlatLoader<AddCarryPositions>;

/// Flat loader stepping window-relative positions with add-and-carry.
pub type ShiftedAddCarryLoader = FlatLoader<ShiftedAddCarryPositions>;

impl<P: TilePositions> TileLoader for FlatLoader<P> {
    const NAME: &'static str = P::NAME;

    #[inline]
    fn load<T, W, G, I>(lane: usize, tile: &Tile<'_, T>, origin: TileOrigin, input: &I)
    where
        T: Element,
        W: Window,
        G: GroupShape,
        I: GridView<T> + ?Sized,
    {
        let lens = input.lens();
        let base_x = origin.x + W::AMIN_X;
        let base_y = origin.y + W::AMIN_Y;

        for pos in P::for_lane::<W>(lane, G::FLAT, tile.geometry()) {
            let gx = clamp(base_x + pos.x as i64, lens.max_x());
            let gy = clamp(base_y + pos.y as i64, lens.max_y());
            tile.set_flat(pos.flat, input.read(gx, gy));
        }
    }
}

/// Loader using native 2-D lane and tile coordinates, chunked by the group
/// extent along each axis.
#[derive(Debug, Clone, Copy, Default)]
pub struct CubeLoader;

impl TileLoader for CubeLoader {
    const NAME: &'static str = "cube";

    #[inline]
    fn load<T, W, G, I>(lane: usize, tile: &Tile<'_, T>, origin: TileOrigin, input: &I)
    where
        T: Element,
        W: Window,
        G: GroupShape,
        I: GridView<T> + ?Sized,
    {
        let lens = input.lens();
        let geometry = tile.geometry();
        let lane_x = lane % G::X;
        let lane_y = lane / G::X;
        let base_x = origin.x + W::AMIN_X;
        let base_y = origin.y + W::AMIN_Y;

        for i in 0..div_up(geometry.sh_size_y, G::Y) {
            let ty = lane_y + i * G::Y;
            if ty >= geometry.sh_size_y {
                break;
            }
            let gy = clamp(base_y + ty as i64, lens.max_y());
            for k in 0..div_up(geometry.sh_size_x, G::X) {
                let tx = lane_x + k * G::X;
                if tx >= geometry.sh_size_x {
                    break;
                }
                let gx = clamp(base_x + tx as i64, lens.max_x());
                tile.set(tx, ty, input.read(gx, gy));
            }
        }
    }
}

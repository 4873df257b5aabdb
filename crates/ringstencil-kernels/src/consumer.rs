//! Tile consumers ("write from shared").
//!
//! A consumer turns a loaded tile into outputs: the point at tile-local
//! footprint coordinates `(local_x, local_y)` reads the tile cells
//! `(local_x + k, local_y + j)` for every window offset. Footprints may
//! overhang the grid edge, so each store is bounds-checked.

use ringstencil_core::{Element, OutputView, Window};

use crate::tile::{Tile, TileOrigin};
use crate::window::window_average;

/// Strategy reading a loaded tile and writing one output point.
pub trait TileConsumer {
    /// Short name used in labels.
    const NAME: &'static str;

    /// Compute and store the output for footprint point `(local_x, local_y)`.
    fn consume<T, W, O>(
        tile: &Tile<'_, T>,
        origin: TileOrigin,
        local_x: usize,
        local_y: usize,
        output: &O,
    ) where
        T: Element,
        W: Window,
        O: OutputView<T> + ?Sized;
}

/// Consumer computing flat tile offsets by hand.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatConsumer;

impl TileConsumer for FlatConsumer {
    const NAME: &'static str = "flat";

    #[inline]
    fn consume<T, W, O>(
        tile: &Tile<'_, T>,
        origin: TileOrigin,
        local_x: usize,
        local_y: usize,
        output: &O,
    ) where
        T: Element,
        W: Window,
        O: OutputView<T> + ?Sized,
    {
        let lens = output.lens();
        let gid_x = origin.x + local_x as i64;
        let gid_y = origin.y + local_y as i64;
        if gid_x >= lens.x || gid_y >= lens.y {
            return;
        }

        let sh_size_x = tile.geometry().sh_size_x;
        let base = local_y * sh_size_x + local_x;
        let value = window_average::<T, W>(|k, j| tile.get_flat(base + j * sh_size_x + k));
        output.write(gid_x, gid_y, value);
    }
}

/// Consumer using native 2-D tile coordinates.
#[derive(Debug, Clone, Copy, Default)]
pub struct CubeConsumer;

impl TileConsumer for CubeConsumer {
    const NAME: &'static str = "cube";

    #[inline]
    fn consume<T, W, O>(
        tile: &Tile<'_, T>,
        origin: TileOrigin,
        local_x: usize,
        local_y: usize,
        output: &O,
    ) where
        T: Element,
        W: Window,
        O: OutputView<T> + ?Sized,
    {
        let lens = output.lens();
        let gid_x = origin.x + local_x as i64;
        let gid_y = origin.y + local_y as i64;
        if gid_x >= lens.x || gid_y >= lens.y {
            return;
        }

        let value = window_average::<T, W>(|k, j| tile.get(local_x + k, local_y + j));
        output.write(gid_x, gid_y, value);
    }
}

//! Compile-time stencil windows and group footprints.
//!
//! Window offsets and group sizes are type-level constants so every kernel is
//! monomorphized for its exact shape. Derived sizes (ranges, halos, tile
//! extents) are associated constants.
//!
//! ```
//! use ringstencil_core::shape::{Group, GroupShape, Rect, TileGeometry, Window};
//!
//! type W = Rect<-1, -2, 1, 0>;
//! type G = Group<8, 4>;
//!
//! assert_eq!(W::RANGE_X, 3);
//! assert_eq!(W::RANGE_Y, 3);
//! assert_eq!(G::FLAT, 32);
//!
//! let tile = TileGeometry::big_tile::<W, G>();
//! assert_eq!((tile.sh_size_x, tile.sh_size_y), (10, 6));
//! ```

use std::marker::PhantomData;

/// Inclusive stencil window `[AMIN_X, AMAX_X] x [AMIN_Y, AMAX_Y]` relative to
/// the focal point.
pub trait Window: Send + Sync + 'static {
    /// Smallest x offset.
    const AMIN_X: i64;
    /// Smallest y offset.
    const AMIN_Y: i64;
    /// Largest x offset.
    const AMAX_X: i64;
    /// Largest y offset.
    const AMAX_Y: i64;

    /// Samples per row of the window.
    const RANGE_X: usize = (Self::AMAX_X - Self::AMIN_X + 1) as usize;
    /// Samples per column of the window.
    const RANGE_Y: usize = (Self::AMAX_Y - Self::AMIN_Y + 1) as usize;
    /// Divisor of the average.
    const TOTAL_RANGE: usize = Self::RANGE_X * Self::RANGE_Y;
    /// Extra columns a tile needs beyond its footprint.
    const HALO_X: usize = Self::RANGE_X - 1;
    /// Extra rows a tile needs beyond its footprint.
    const HALO_Y: usize = Self::RANGE_Y - 1;

    /// Whether this window is seen with its axes swapped.
    ///
    /// Window sums run over the samples in the row-major order of the
    /// unswapped window, so a column sweep rounds exactly like a row sweep.
    const SWAPPED: bool = false;

    /// Post-monomorphization check that the window is not empty.
    const ASSERT_VALID: () = assert!(
        Self::AMIN_X <= Self::AMAX_X && Self::AMIN_Y <= Self::AMAX_Y,
        "stencil window must satisfy amin <= amax on both axes"
    );

    /// Whether the window is symmetric around the focal point.
    fn is_symmetric() -> bool {
        Self::AMIN_X == -Self::AMAX_X && Self::AMIN_Y == -Self::AMAX_Y
    }
}

/// Rectangular window given by its four offsets.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rect<const AMIN_X: i64, const AMIN_Y: i64, const AMAX_X: i64, const AMAX_Y: i64>;

impl<const AMIN_X: i64, const AMIN_Y: i64, const AMAX_X: i64, const AMAX_Y: i64> Window
    for Rect<AMIN_X, AMIN_Y, AMAX_X, AMAX_Y>
{
    const AMIN_X: i64 = AMIN_X;
    const AMIN_Y: i64 = AMIN_Y;
    const AMAX_X: i64 = AMAX_X;
    const AMAX_Y: i64 = AMAX_Y;
}

/// `W` with its axes swapped, for sweeping along columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct Transposed<W>(PhantomData<W>);

impl<W: Window> Window for Transposed<W> {
    const AMIN_X: i64 = W::AMIN_Y;
    const AMIN_Y: i64 = W::AMIN_X;
    const AMAX_X: i64 = W::AMAX_Y;
    const AMAX_Y: i64 = W::AMAX_X;
    const SWAPPED: bool = !W::SWAPPED;
}

/// Footprint of one group: `X * Y` lanes, one output point per lane.
pub trait GroupShape: Send + Sync + 'static {
    /// Lanes along x.
    const X: usize;
    /// Lanes along y.
    const Y: usize;
    /// Lanes per group.
    const FLAT: usize = Self::X * Self::Y;

    /// Post-monomorphization check that the group is not empty.
    const ASSERT_VALID: () = assert!(Self::X >= 1 && Self::Y >= 1, "group must have lanes");
}

/// Group footprint given by its two extents.
#[derive(Debug, Clone, Copy, Default)]
pub struct Group<const X: usize, const Y: usize>;

impl<const X: usize, const Y: usize> GroupShape for Group<X, Y> {
    const X: usize = X;
    const Y: usize = Y;
}

/// Extent of a shared tile: footprint plus halo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGeometry {
    /// Tile width (`sh_size_x`).
    pub sh_size_x: usize,
    /// Tile height (`sh_size_y`).
    pub sh_size_y: usize,
}

impl TileGeometry {
    /// Tile for a single group footprint.
    pub fn big_tile<W: Window, G: GroupShape>() -> Self {
        Self::strip::<W, G>(1, 1)
    }

    /// Tile for `strip_x * strip_y` adjacent footprints sharing one halo.
    pub fn strip<W: Window, G: GroupShape>(strip_x: usize, strip_y: usize) -> Self {
        Self {
            sh_size_x: strip_x * G::X + W::HALO_X,
            sh_size_y: strip_y * G::Y + W::HALO_Y,
        }
    }

    /// Number of tile cells (`sh_size_flat`).
    #[inline]
    pub const fn flat(&self) -> usize {
        self.sh_size_x * self.sh_size_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_ranges() {
        type W = Rect<-2, -1, 1, 3>;
        assert_eq!(W::RANGE_X, 4);
        assert_eq!(W::RANGE_Y, 5);
        assert_eq!(W::TOTAL_RANGE, 20);
        assert_eq!(W::HALO_X, 3);
        assert_eq!(W::HALO_Y, 4);
        assert!(!W::is_symmetric());
        assert!(Rect::<-1, -1, 1, 1>::is_symmetric());
    }

    #[test]
    fn test_identity_window() {
        type W = Rect<0, 0, 0, 0>;
        assert_eq!(W::TOTAL_RANGE, 1);
        assert_eq!(W::HALO_X, 0);
        assert_eq!(W::HALO_Y, 0);
    }

    #[test]
    fn test_transposed_window() {
        type T = Transposed<Rect<-2, 0, 1, 4>>;
        assert_eq!((T::AMIN_X, T::AMIN_Y, T::AMAX_X, T::AMAX_Y), (0, -2, 4, 1));
        assert_eq!(T::RANGE_X, 5);
        assert_eq!(T::RANGE_Y, 4);
        assert!(T::SWAPPED);
        assert!(!Transposed::<T>::SWAPPED);
    }

    #[test]
    fn test_strip_tile_shares_one_halo() {
        type W = Rect<-1, -1, 1, 1>;
        type G = Group<4, 2>;
        let single = TileGeometry::big_tile::<W, G>();
        assert_eq!(single, TileGeometry { sh_size_x: 6, sh_size_y: 4 });
        let strip = TileGeometry::strip::<W, G>(3, 2);
        assert_eq!(strip, TileGeometry { sh_size_x: 14, sh_size_y: 6 });
        assert_eq!(strip.flat(), 84);
    }
}

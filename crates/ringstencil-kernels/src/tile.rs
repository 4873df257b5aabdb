//! The tile: a grid region staged in group-shared scratch.
//!
//! One logical tile of `sh_size_x x sh_size_y` cells, addressable either by
//! flat index (row arithmetic done by the caller) or by native 2-D
//! coordinates. Both views address the same cells, so loaders and consumers
//! of either addressing style can be paired freely.

use ringstencil_core::{Element, GroupId, GroupShape, SharedScratch, TileGeometry};

/// Number of adjacent group footprints served by one tile load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StripShape {
    /// Footprints along x.
    pub x: usize,
    /// Footprints along y.
    pub y: usize,
}

impl StripShape {
    /// One footprint per tile (the big tile).
    pub const SINGLE: Self = Self { x: 1, y: 1 };

    /// `x * y` footprints per tile.
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Output points along each axis covered by one strip.
    pub fn extent<G: GroupShape>(&self) -> (usize, usize) {
        (self.x * G::X, self.y * G::Y)
    }
}

/// Global coordinates of the first output point covered by a tile.
///
/// The tile itself starts `(amin_x, amin_y)` away from the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TileOrigin {
    /// Column of the first output point.
    pub x: i64,
    /// Row of the first output point.
    pub y: i64,
}

impl TileOrigin {
    /// Create an origin.
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Origin of strip `id` (a group id when `strip` is [`StripShape::SINGLE`]).
    #[inline]
    pub fn of_strip<G: GroupShape>(id: GroupId, strip: StripShape) -> Self {
        let (span_x, span_y) = strip.extent::<G>();
        Self {
            x: id.x as i64 * span_x as i64,
            y: id.y as i64 * span_y as i64,
        }
    }
}

/// A tile view over group-shared scratch.
#[derive(Debug, Clone, Copy)]
pub struct Tile<'a, T> {
    scratch: &'a SharedScratch<T>,
    geometry: TileGeometry,
}

impl<'a, T: Element> Tile<'a, T> {
    /// View `scratch` as a tile of `geometry`.
    ///
    /// The scratch must hold at least `geometry.flat()` cells.
    pub fn new(scratch: &'a SharedScratch<T>, geometry: TileGeometry) -> Self {
        debug_assert!(
            scratch.len() >= geometry.flat(),
            "scratch of {} cells cannot hold a {}x{} tile",
            scratch.len(),
            geometry.sh_size_x,
            geometry.sh_size_y
        );
        Self { scratch, geometry }
    }

    /// Tile extent.
    #[inline]
    pub fn geometry(&self) -> TileGeometry {
        self.geometry
    }

    /// Flat addressing: load cell `index`.
    #[inline]
    pub fn get_flat(&self, index: usize) -> T {
        self.scratch.load(index)
    }

    /// Flat addressing: store cell `index`.
    #[inline]
    pub fn set_flat(&self, index: usize, value: T) {
        self.scratch.store(index, value);
    }

    /// 2-D addressing: load cell `(x, y)`.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> T {
        self.scratch.load(y * self.geometry.sh_size_x + x)
    }

    /// 2-D addressing: store cell `(x, y)`.
    #[inline]
    pub fn set(&self, x: usize, y: usize, value: T) {
        self.scratch.store(y * self.geometry.sh_size_x + x, value);
    }

    /// Copy of the tile contents, row by row.
    pub fn rows(&self) -> Vec<Vec<T>> {
        (0..self.geometry.sh_size_y)
            .map(|y| (0..self.geometry.sh_size_x).map(|x| self.get(x, y)).collect())
            .collect()
    }
}

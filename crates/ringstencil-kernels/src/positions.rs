//! Enumeration of the tile positions owned by one lane.
//!
//! A tile of `sh_size_flat` cells is filled by `lanes` lanes; lane `l` owns
//! the cells `l, l + lanes, l + 2 * lanes, ...`. The enumerators below walk
//! that set with different arithmetic and must agree position for position.

use ringstencil_core::{TileGeometry, Window};

/// One tile cell: flat index plus tile-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TilePos {
    /// Flat index, `y * sh_size_x + x`.
    pub flat: usize,
    /// Tile-local column.
    pub x: usize,
    /// Tile-local row.
    pub y: usize,
}

/// Strategy enumerating the positions a lane loads.
pub trait TilePositions: Iterator<Item = TilePos> + Sized {
    /// Short name used in labels.
    const NAME: &'static str;

    /// Positions owned by `lane` of `lanes` in a tile of `geometry`.
    fn for_lane<W: Window>(lane: usize, lanes: usize, geometry: TileGeometry) -> Self;
}

/// Division/remainder stepping: each position is decomposed from scratch.
#[derive(Debug, Clone)]
pub struct DivRemPositions {
    next: usize,
    stride: usize,
    sh_size_x: usize,
    sh_size_flat: usize,
}

impl TilePositions for DivRemPositions {
    const NAME: &'static str = "divrem";

    fn for_lane<W: Window>(lane: usize, lanes: usize, geometry: TileGeometry) -> Self {
        Self {
            next: lane,
            stride: lanes.max(1),
            sh_size_x: geometry.sh_size_x,
            sh_size_flat: geometry.flat(),
        }
    }
}

impl Iterator for DivRemPositions {
    type Item = TilePos;

    fn next(&mut self) -> Option<TilePos> {
        if self.next >= self.sh_size_flat {
            return None;
        }
        let flat = self.next;
        self.next += self.stride;
        Some(TilePos {
            flat,
            x: flat % self.sh_size_x,
            y: flat / self.sh_size_x,
        })
    }
}

/// Add-with-carry stepping: the stride is split once into a row and a
/// column increment, and the column wraps into the next row on overflow.
#[derive(Debug, Clone)]
pub struct AddCarryPositions {
    x: usize,
    y: usize,
    add_x: usize,
    add_y: usize,
    sh_size_x: usize,
    sh_size_y: usize,
}

impl TilePositions for AddCarryPositions {
    const NAME: &'static str = "addcarry";

    fn for_lane<W: Window>(lane: usize, lanes: usize, geometry: TileGeometry) -> Self {
        let sh_size_x = geometry.sh_size_x;
        Self {
            x: lane % sh_size_x,
            y: lane / sh_size_x,
            add_x: lanes % sh_size_x,
            add_y: lanes / sh_size_x,
            sh_size_x,
            sh_size_y: geometry.sh_size_y,
        }
    }
}

impl Iterator for AddCarryPositions {
    type Item = TilePos;

    fn next(&mut self) -> Option<TilePos> {
        if self.y >= self.sh_size_y {
            return None;
        }
        let pos = TilePos {
            flat: self.y * self.sh_size_x + self.x,
            x: self.x,
            y: self.y,
        };

        self.x += self.add_x;
        self.y += self.add_y;
        if self.x >= self.sh_size_x {
            self.x -= self.sh_size_x;
            self.y += 1;
        }
        Some(pos)
    }
}

/// Add-with-carry stepping in window-relative coordinates.
///
/// Coordinates start shifted by `(amin_x, amin_y)`, so they are directly the
/// offsets added to the group origin, and the carry triggers at
/// `sh_size_x + amin_x`.
#[derive(Debug, Clone)]
pub struct ShiftedAddCarryPositions {
    x: i64,
    y: i64,
    add_x: i64,
    add_y: i64,
    amin_x: i64,
    amin_y: i64,
    sh_size_x: i64,
    end_x: i64,
    end_y: i64,
}

impl TilePositions for ShiftedAddCarryPositions {
    const NAME: &'static str = "addcarry_shifted";

    fn for_lane<W: Window>(lane: usize, lanes: usize, geometry: TileGeometry) -> Self {
        let sh_size_x = geometry.sh_size_x as i64;
        let lane = lane as i64;
        let lanes = lanes as i64;
        Self {
            x: lane % sh_size_x + W::AMIN_X,
            y: lane / sh_size_x + W::AMIN_Y,
            add_x: lanes % sh_size_x,
            add_y: lanes / sh_size_x,
            amin_x: W::AMIN_X,
            amin_y: W::AMIN_Y,
            sh_size_x,
            end_x: sh_size_x + W::AMIN_X,
            end_y: geometry.sh_size_y as i64 + W::AMIN_Y,
        }
    }
}

impl Iterator for ShiftedAddCarryPositions {
    type Item = TilePos;

    fn next(&mut self) -> Option<TilePos> {
        if self.y >= self.end_y {
            return None;
        }
        let x = (self.x - self.amin_x) as usize;
        let y = (self.y - self.amin_y) as usize;
        let pos = TilePos {
            flat: y * self.sh_size_x as usize + x,
            x,
            y,
        };

        self.x += self.add_x;
        self.y += self.add_y;
        if self.x >= self.end_x {
            self.x -= self.sh_size_x;
            self.y += 1;
        }
        Some(pos)
    }
}

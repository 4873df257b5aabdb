//! Dimensions and identities for groups and lanes.

/// Grid dimensions as wide integers.
///
/// Flat indices are computed in `i64` so `width * height` never wraps for
/// any grid that fits in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lens {
    /// Width (number of columns).
    pub x: i64,
    /// Height (number of rows).
    pub y: i64,
}

impl Lens {
    /// Create grid dimensions.
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Largest valid column index.
    #[inline]
    pub const fn max_x(&self) -> i64 {
        self.x - 1
    }

    /// Largest valid row index.
    #[inline]
    pub const fn max_y(&self) -> i64 {
        self.y - 1
    }

    /// Total number of elements.
    #[inline]
    pub const fn flat_len(&self) -> i64 {
        self.x * self.y
    }

    /// Row-major flat index of `(x, y)`.
    #[inline]
    pub const fn index(&self, x: i64, y: i64) -> usize {
        (y * self.x + x) as usize
    }

    /// Whether `(x, y)` lies inside the grid.
    #[inline]
    pub const fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.x && y < self.y
    }

    /// Dimensions with the axes swapped.
    pub const fn transposed(&self) -> Self {
        Self {
            x: self.y,
            y: self.x,
        }
    }
}

/// A 2-D shape for group footprints and grid (group-count) shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Dim2 {
    /// Extent along x.
    pub x: u32,
    /// Extent along y.
    pub y: u32,
}

impl Dim2 {
    /// Create a 2-D shape.
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Create a 1-D shape (`y = 1`).
    pub const fn new_1d(x: u32) -> Self {
        Self { x, y: 1 }
    }

    /// Total count.
    #[inline]
    pub const fn flat(&self) -> u32 {
        self.x * self.y
    }
}

/// Group identity within the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GroupId {
    /// Column of the group.
    pub x: u32,
    /// Row of the group.
    pub y: u32,
}

impl GroupId {
    /// Create a 2-D group id.
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Decompose a flat id by division/remainder against the row span.
    #[inline]
    pub const fn from_flat(flat: u32, span_x: u32) -> Self {
        Self {
            x: flat % span_x,
            y: flat / span_x,
        }
    }

    /// Flat id for the given row span.
    #[inline]
    pub const fn linear(&self, span_x: u32) -> u32 {
        self.y * span_x + self.x
    }
}

/// Lane identity within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LaneId {
    /// Column of the lane.
    pub x: u32,
    /// Row of the lane.
    pub y: u32,
}

impl LaneId {
    /// Create a 2-D lane id.
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Decompose a flat lane id against the group width.
    #[inline]
    pub const fn from_flat(flat: u32, group_x: u32) -> Self {
        Self {
            x: flat % group_x,
            y: flat / group_x,
        }
    }

    /// Flat lane id for the given group width.
    #[inline]
    pub const fn linear(&self, group_x: u32) -> u32 {
        self.y * group_x + self.x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lens_indexing() {
        let lens = Lens::new(5, 3);
        assert_eq!(lens.flat_len(), 15);
        assert_eq!(lens.index(4, 2), 14);
        assert!(lens.contains(4, 2));
        assert!(!lens.contains(5, 0));
        assert!(!lens.contains(0, -1));
        assert_eq!(lens.transposed(), Lens::new(3, 5));
    }

    #[test]
    fn test_lens_is_wide() {
        let lens = Lens::new(100_000, 100_000);
        assert_eq!(lens.flat_len(), 10_000_000_000);
        assert_eq!(lens.index(99_999, 99_999), 9_999_999_999);
    }

    #[test]
    fn test_group_id_flat_roundtrip() {
        for flat in 0..35 {
            let id = GroupId::from_flat(flat, 7);
            assert!(id.x < 7);
            assert_eq!(id.linear(7), flat);
        }
    }

    #[test]
    fn test_lane_id_decomposition() {
        let lane = LaneId::from_flat(13, 4);
        assert_eq!(lane, LaneId::new(1, 3));
        assert_eq!(lane.linear(4), 13);
    }
}

//! Catalogue of data-movement strategies.

use std::fmt;

use ringstencil_kernels::sliding::SweepAxis;

/// One way of computing the stencil.
///
/// Every variant computes the same function; they differ only in how data
/// moves between the grid, scratch and lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Uncached evaluation with native 2-D group and lane ids.
    DirectMultiDim,
    /// Uncached evaluation with flat ids decomposed by division/remainder.
    DirectSingleDim,
    /// Big tile, division/remainder loader, flat consumer.
    BigTileDivRem,
    /// Big tile, add-carry loader, flat consumer.
    BigTileAddCarry,
    /// Big tile, 2-D loader and consumer.
    BigTileCube,
    /// `strip_x * strip_y` footprints per tile load.
    Strip {
        /// Footprints along x.
        strip_x: usize,
        /// Footprints along y.
        strip_y: usize,
    },
    /// Flat sliding window, `windows_y` sweep steps per strip.
    SlidingFlat {
        /// Output rows (or columns) per strip.
        windows_y: usize,
        /// Sweep direction.
        axis: SweepAxis,
    },
    /// Power-of-two sliding window, `windows_y` steps of `G::Y` rows.
    SlidingPow2 {
        /// Steps per strip.
        windows_y: usize,
    },
    /// Big tile over a virtual grid served by `physical_groups` groups.
    VirtualBigTile {
        /// Physical groups.
        physical_groups: u32,
    },
    /// Strip over a virtual grid of strips served by `physical_groups` groups.
    VirtualStrip {
        /// Footprints along x.
        strip_x: usize,
        /// Footprints along y.
        strip_y: usize,
        /// Physical groups.
        physical_groups: u32,
    },
}

impl Variant {
    /// Strategy name without parameters.
    pub fn name(&self) -> &'static str {
        match self {
            Variant::DirectMultiDim => "direct_multi_dim",
            Variant::DirectSingleDim => "direct_single_dim",
            Variant::BigTileDivRem => "big_tile_divrem",
            Variant::BigTileAddCarry => "big_tile_addcarry",
            Variant::BigTileCube => "big_tile_cube",
            Variant::Strip { .. } => "strip",
            Variant::SlidingFlat { .. } => "sliding_flat",
            Variant::SlidingPow2 { .. } => "sliding_pow2",
            Variant::VirtualBigTile { .. } => "virtual_big_tile",
            Variant::VirtualStrip { .. } => "virtual_strip",
        }
    }

    /// Whether the variant stages data in group-shared scratch.
    pub fn uses_scratch(&self) -> bool {
        !matches!(self, Variant::DirectMultiDim | Variant::DirectSingleDim)
    }

    /// A representative instance of every strategy.
    pub fn catalogue() -> Vec<Variant> {
        vec![
            Variant::DirectMultiDim,
            Variant::DirectSingleDim,
            Variant::BigTileDivRem,
            Variant::BigTileAddCarry,
            Variant::BigTileCube,
            Variant::Strip {
                strip_x: 2,
                strip_y: 2,
            },
            Variant::Strip {
                strip_x: 4,
                strip_y: 1,
            },
            Variant::SlidingFlat {
                windows_y: 8,
                axis: SweepAxis::Rows,
            },
            Variant::SlidingFlat {
                windows_y: 8,
                axis: SweepAxis::Columns,
            },
            Variant::SlidingPow2 { windows_y: 4 },
            Variant::VirtualBigTile { physical_groups: 3 },
            Variant::VirtualStrip {
                strip_x: 2,
                strip_y: 1,
                physical_groups: 2,
            },
        ]
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Strip { strip_x, strip_y } => {
                write!(f, "{}[{}x{}]", self.name(), strip_x, strip_y)
            }
            Variant::SlidingFlat { windows_y, axis } => {
                write!(f, "{}[{}, {}]", self.name(), windows_y, axis.name())
            }
            Variant::SlidingPow2 { windows_y } => write!(f, "{}[{}]", self.name(), windows_y),
            Variant::VirtualBigTile { physical_groups } => {
                write!(f, "{}[{} groups]", self.name(), physical_groups)
            }
            Variant::VirtualStrip {
                strip_x,
                strip_y,
                physical_groups,
            } => write!(
                f,
                "{}[{}x{}, {} groups]",
                self.name(),
                strip_x,
                strip_y,
                physical_groups
            ),
            _ => f.write_str(self.name()),
        }
    }
}

//! Launch planning: the geometry each variant needs to cover a domain.
//!
//! Kernels trust their geometry. Everything that can be wrong about it is
//! checked here, before anything is launched.

use ringstencil_core::addressing::div_up;
use ringstencil_core::error::{Result, StencilError};
use ringstencil_core::{Dim2, GroupShape, Lens, TileGeometry, Transposed, Window};
use ringstencil_cpu::{LaunchConfig, MAX_LANES_PER_GROUP};
use ringstencil_kernels::sliding::{working_width, RowRing, SweepAxis};

use crate::variant::Variant;

/// Validated geometry for running one variant over one domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchPlan {
    /// Strategy.
    pub variant: Variant,
    /// Domain dimensions.
    pub lens: Lens,
    /// Logical grid the kernel decomposes ids against: groups, strips or
    /// the virtual grid.
    pub covering: Dim2,
    /// Physical groups launched.
    pub launch_grid: Dim2,
    /// Lanes per group.
    pub group: Dim2,
    /// Scratch cells per group.
    pub shared_elems: usize,
}

impl LaunchPlan {
    /// Plan `variant` for window `W` and group `G` over a `lens` domain.
    pub fn for_variant<W: Window, G: GroupShape>(variant: Variant, lens: Lens) -> Result<Self> {
        if lens.x < 1 || lens.y < 1 {
            return Err(StencilError::EmptyDomain {
                width: lens.x,
                height: lens.y,
            });
        }
        if G::X == 0 || G::Y == 0 || G::FLAT > MAX_LANES_PER_GROUP as usize {
            return Err(StencilError::geometry(format!(
                "group {}x{} must have between 1 and {} lanes",
                G::X,
                G::Y,
                MAX_LANES_PER_GROUP
            )));
        }

        let width = lens.x as usize;
        let height = lens.y as usize;
        let flat_group = Dim2::new_1d(G::FLAT as u32);
        let group_grid = || -> Result<Dim2> {
            dim(div_up(width, G::X), div_up(height, G::Y))
        };

        let plan = match variant {
            Variant::DirectMultiDim => {
                let covering = group_grid()?;
                let group = Dim2::new(G::X as u32, G::Y as u32);
                Self::build(variant, lens, covering, covering, group, 0)
            }
            Variant::DirectSingleDim => {
                let covering = group_grid()?;
                Self::build(variant, lens, covering, flatten(covering)?, flat_group, 0)
            }
            Variant::BigTileDivRem | Variant::BigTileAddCarry | Variant::BigTileCube => {
                let covering = group_grid()?;
                let shared = TileGeometry::big_tile::<W, G>().flat();
                Self::build(variant, lens, covering, flatten(covering)?, flat_group, shared)
            }
            Variant::Strip { strip_x, strip_y } => {
                let covering = strip_grid::<G>(width, height, strip_x, strip_y)?;
                let shared = TileGeometry::strip::<W, G>(strip_x, strip_y).flat();
                Self::build(variant, lens, covering, flatten(covering)?, flat_group, shared)
            }
            Variant::SlidingFlat { windows_y, axis } => {
                let (covering, shared) = match axis {
                    SweepAxis::Rows => sliding_flat_geometry::<W, G>(width, height, windows_y)?,
                    SweepAxis::Columns => {
                        sliding_flat_geometry::<Transposed<W>, G>(height, width, windows_y)?
                    }
                };
                Self::build(variant, lens, covering, flatten(covering)?, flat_group, shared)
            }
            Variant::SlidingPow2 { windows_y } => {
                if windows_y == 0 {
                    return Err(StencilError::geometry("windows_y must be at least 1"));
                }
                let working_x = working_width(G::X, W::HALO_X);
                if working_x == 0 {
                    return Err(StencilError::geometry(format!(
                        "group width {} leaves no working columns for a window {} wide",
                        G::X,
                        W::RANGE_X
                    )));
                }
                let covering = dim(div_up(width, working_x), div_up(height, G::Y * windows_y))?;
                let shared = RowRing::pow2::<W, G>().capacity();
                Self::build(variant, lens, covering, flatten(covering)?, flat_group, shared)
            }
            Variant::VirtualBigTile { physical_groups } => {
                let covering = group_grid()?;
                let shared = TileGeometry::big_tile::<W, G>().flat();
                let physical = physical_grid(physical_groups)?;
                Self::build(variant, lens, covering, physical, flat_group, shared)
            }
            Variant::VirtualStrip {
                strip_x,
                strip_y,
                physical_groups,
            } => {
                let covering = strip_grid::<G>(width, height, strip_x, strip_y)?;
                let shared = TileGeometry::strip::<W, G>(strip_x, strip_y).flat();
                let physical = physical_grid(physical_groups)?;
                Self::build(variant, lens, covering, physical, flat_group, shared)
            }
        };
        Ok(plan)
    }

    fn build(
        variant: Variant,
        lens: Lens,
        covering: Dim2,
        launch_grid: Dim2,
        group: Dim2,
        shared_elems: usize,
    ) -> Self {
        Self {
            variant,
            lens,
            covering,
            launch_grid,
            group,
            shared_elems,
        }
    }

    /// Physical groups launched.
    pub fn groups(&self) -> u64 {
        self.launch_grid.x as u64 * self.launch_grid.y as u64
    }

    /// Engine launch configuration for this plan.
    pub fn launch_config(&self) -> LaunchConfig {
        LaunchConfig::new(self.variant.name())
            .with_grid(self.launch_grid)
            .with_group(self.group)
            .with_shared_elems(self.shared_elems)
    }
}

fn dim(x: usize, y: usize) -> Result<Dim2> {
    let x = u32::try_from(x)
        .map_err(|_| StencilError::geometry(format!("{x} groups along x overflow u32")))?;
    let y = u32::try_from(y)
        .map_err(|_| StencilError::geometry(format!("{y} groups along y overflow u32")))?;
    if x.checked_mul(y).is_none() {
        return Err(StencilError::geometry(format!(
            "covering grid {x}x{y} overflows a flat group id"
        )));
    }
    Ok(Dim2::new(x, y))
}

fn flatten(covering: Dim2) -> Result<Dim2> {
    covering
        .x
        .checked_mul(covering.y)
        .map(Dim2::new_1d)
        .ok_or_else(|| StencilError::geometry("covering grid overflows a flat group id"))
}

fn strip_grid<G: GroupShape>(
    width: usize,
    height: usize,
    strip_x: usize,
    strip_y: usize,
) -> Result<Dim2> {
    if strip_x == 0 || strip_y == 0 {
        return Err(StencilError::geometry(format!(
            "strip {strip_x}x{strip_y} must cover at least one footprint"
        )));
    }
    dim(div_up(width, strip_x * G::X), div_up(height, strip_y * G::Y))
}

fn sliding_flat_geometry<W: Window, G: GroupShape>(
    width: usize,
    height: usize,
    windows_y: usize,
) -> Result<(Dim2, usize)> {
    if windows_y == 0 {
        return Err(StencilError::geometry("windows_y must be at least 1"));
    }
    let working_x = working_width(G::FLAT, W::HALO_X);
    if working_x == 0 {
        return Err(StencilError::geometry(format!(
            "{} lanes leave no working columns for a window {} wide",
            G::FLAT,
            W::RANGE_X
        )));
    }
    let covering = dim(div_up(width, working_x), div_up(height, windows_y))?;
    Ok((covering, RowRing::flat::<W, G>().capacity()))
}

fn physical_grid(physical_groups: u32) -> Result<Dim2> {
    if physical_groups == 0 {
        return Err(StencilError::geometry("at least one physical group is required"));
    }
    Ok(Dim2::new_1d(physical_groups))
}

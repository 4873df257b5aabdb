//! Launch geometry and per-launch statistics.

use std::time::Duration;

use ringstencil_core::error::{Result, StencilError};
use ringstencil_core::memory::ScratchStats;
use ringstencil_core::Dim2;

/// Upper bound on lanes per group (matches a CUDA block).
pub const MAX_LANES_PER_GROUP: u32 = 1024;

/// Geometry of one launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchConfig {
    /// Label used in logs and lane thread names.
    pub label: String,
    /// Physical groups per axis.
    pub grid: Dim2,
    /// Lanes per group per axis.
    pub group: Dim2,
    /// Scratch cells per group.
    pub shared_elems: usize,
}

impl LaunchConfig {
    /// Single group of a single lane.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            grid: Dim2::new(1, 1),
            group: Dim2::new(1, 1),
            shared_elems: 0,
        }
    }

    /// Set the grid of physical groups.
    pub fn with_grid(mut self, grid: Dim2) -> Self {
        self.grid = grid;
        self
    }

    /// Set the group shape.
    pub fn with_group(mut self, group: Dim2) -> Self {
        self.group = group;
        self
    }

    /// Set the scratch cells per group.
    pub fn with_shared_elems(mut self, shared_elems: usize) -> Self {
        self.shared_elems = shared_elems;
        self
    }

    /// Number of groups.
    pub fn groups(&self) -> u64 {
        self.grid.x as u64 * self.grid.y as u64
    }

    /// Lanes per group.
    pub fn lanes_per_group(&self) -> u32 {
        self.group.flat()
    }

    /// Check the geometry can be executed.
    pub fn validate(&self) -> Result<()> {
        if self.grid.x == 0 || self.grid.y == 0 {
            return Err(StencilError::geometry(format!(
                "launch '{}' has an empty grid {}x{}",
                self.label, self.grid.x, self.grid.y
            )));
        }
        if self.group.x == 0 || self.group.y == 0 {
            return Err(StencilError::geometry(format!(
                "launch '{}' has an empty group {}x{}",
                self.label, self.group.x, self.group.y
            )));
        }
        let lanes = self.group.x as u64 * self.group.y as u64;
        if lanes > MAX_LANES_PER_GROUP as u64 {
            return Err(StencilError::geometry(format!(
                "launch '{}' asks for {} lanes per group (maximum is {})",
                self.label, lanes, MAX_LANES_PER_GROUP
            )));
        }
        if self.grid.x.checked_mul(self.grid.y).is_none() {
            return Err(StencilError::geometry(format!(
                "launch '{}' grid {}x{} overflows a flat group id",
                self.label, self.grid.x, self.grid.y
            )));
        }
        Ok(())
    }
}

/// What one launch executed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LaunchStats {
    /// Groups executed.
    pub groups: u64,
    /// Lanes executed.
    pub lanes: u64,
    /// Barrier crossings summed over groups.
    pub barrier_crossings: u64,
    /// Scratch pool usage.
    pub scratch: ScratchStats,
    /// Wall time.
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = LaunchConfig::new("blur")
            .with_grid(Dim2::new(4, 3))
            .with_group(Dim2::new(8, 2))
            .with_shared_elems(120);
        assert_eq!(config.groups(), 12);
        assert_eq!(config.lanes_per_group(), 16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_and_oversized() {
        let empty = LaunchConfig::new("x").with_grid(Dim2::new(0, 2));
        assert!(matches!(empty.validate(), Err(StencilError::InvalidGeometry(_))));

        let empty_group = LaunchConfig::new("x").with_group(Dim2::new(4, 0));
        assert!(empty_group.validate().is_err());

        let huge = LaunchConfig::new("x").with_group(Dim2::new(64, 32));
        assert!(huge.validate().is_err());
    }
}

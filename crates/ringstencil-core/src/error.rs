//! Error types for stencil launches.
//!
//! Kernels themselves never fail: they are total functions over geometry that
//! has already been validated. Every variant here is raised at the launch
//! boundary, before any lane runs.

use thiserror::Error;

/// Result type for stencil operations.
pub type Result<T> = std::result::Result<T, StencilError>;

/// Errors raised while building grids or launching groups.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StencilError {
    /// Width or height of zero.
    #[error("Empty domain: {width}x{height} (minimum is 1x1)")]
    EmptyDomain {
        /// Requested width.
        width: i64,
        /// Requested height.
        height: i64,
    },

    /// Buffer length does not match `width * height`.
    #[error("Buffer size mismatch: expected {expected} elements, got {actual}")]
    BufferSizeMismatch {
        /// Expected element count.
        expected: usize,
        /// Actual element count.
        actual: usize,
    },

    /// Launch geometry does not cover the domain or cannot hold the window.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Invalid runtime configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A lane or group failed while executing.
    #[error("Launch failed: {0}")]
    LaunchFailed(String),

    /// The runtime has been shut down.
    #[error("Runtime is shut down")]
    RuntimeShutdown,
}

impl StencilError {
    /// Create an invalid geometry error.
    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::InvalidGeometry(msg.into())
    }

    /// Create an invalid configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a launch failure error.
    pub fn launch(msg: impl Into<String>) -> Self {
        Self::LaunchFailed(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StencilError::EmptyDomain {
            width: 0,
            height: 3,
        };
        assert_eq!(err.to_string(), "Empty domain: 0x3 (minimum is 1x1)");

        let err = StencilError::BufferSizeMismatch {
            expected: 25,
            actual: 24,
        };
        assert!(err.to_string().contains("expected 25"));
    }

    #[test]
    fn test_error_constructors() {
        assert!(matches!(
            StencilError::geometry("grid too small"),
            StencilError::InvalidGeometry(_)
        ));
        assert!(matches!(
            StencilError::launch("lane panicked"),
            StencilError::LaunchFailed(_)
        ));
    }
}

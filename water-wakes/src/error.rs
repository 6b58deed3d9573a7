//! Error types for the wake simulation core.

use thiserror::Error;

/// Errors raised while setting up or advancing the height field.
#[derive(Debug, Error)]
pub enum WakeError {
    /// `round(size / spacing) + 1` produced fewer than two points per side.
    #[error("grid too small: size={size}, spacing={spacing} gives {n} point(s) per side (need >= 2)")]
    GridTooSmall {
        /// Physical extent of the surface
        size: f64,
        /// Distance between neighbouring grid points
        spacing: f64,
        /// Resulting grid dimension
        n: usize,
    },

    /// A scalar parameter is outside its accepted range.
    #[error("invalid parameter {name}={value}: {reason}")]
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// Offending value
        value: f64,
        /// What the parameter must satisfy
        reason: &'static str,
    },

    /// The kernel normalisation or one of its weights is unusable.
    #[error("degenerate kernel: {0}")]
    DegenerateKernel(String),

    /// The integrator produced a NaN or infinite height.
    #[error("non-finite height {value} at ({row}, {col}) on tick {tick}")]
    NonFinite {
        /// Row of the first offending cell
        row: usize,
        /// Column of the first offending cell
        col: usize,
        /// Tick on which it was detected
        tick: u64,
        /// The value found there
        value: f64,
    },

    /// A grid coordinate lies outside the N×N field.
    #[error("cell ({row}, {col}) is outside the {n}x{n} grid")]
    OutOfBounds {
        /// Requested row
        row: usize,
        /// Requested column
        col: usize,
        /// Grid dimension
        n: usize,
    },
}

impl WakeError {
    /// True for errors caused by the caller's configuration rather than by
    /// the state of a running simulation.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::GridTooSmall { .. } | Self::InvalidParameter { .. } | Self::DegenerateKernel(_)
        )
    }
}

/// Result alias used throughout the core.
pub type Result<T> = std::result::Result<T, WakeError>;

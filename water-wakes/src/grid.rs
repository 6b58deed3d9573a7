use crate::error::{Result, WakeError};

/// Square sampling grid laid over the water surface.
///
/// Rows run along world `z`, columns along world `x`, both starting at the
/// surface origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    pub n: usize,     // Points per side
    pub spacing: f64, // Distance between points (meters)
}

impl Grid {
    pub fn new(n: usize, spacing: f64) -> Result<Self> {
        if n < 2 {
            return Err(WakeError::GridTooSmall {
                size: (n.saturating_sub(1)) as f64 * spacing,
                spacing,
                n,
            });
        }
        if !(spacing > 0.0 && spacing.is_finite()) {
            return Err(WakeError::InvalidParameter {
                name: "spacing",
                value: spacing,
                reason: "must be positive and finite",
            });
        }
        Ok(Grid { n, spacing })
    }

    /// Grid covering a square of side `size`: `N = round(size / spacing) + 1`.
    pub fn from_extent(size: f64, spacing: f64) -> Result<Self> {
        if !(spacing > 0.0 && spacing.is_finite()) {
            return Err(WakeError::InvalidParameter {
                name: "spacing",
                value: spacing,
                reason: "must be positive and finite",
            });
        }
        if !(size >= 0.0 && size.is_finite()) {
            return Err(WakeError::InvalidParameter {
                name: "size",
                value: size,
                reason: "must be non-negative and finite",
            });
        }
        let steps = (size / spacing).round();
        let n = Some(steps)
            .filter(|s| s.is_finite() && *s < usize::MAX as f64)
            .and_then(|s| (s as usize).checked_add(1))
            .ok_or(WakeError::InvalidParameter {
                name: "size",
                value: size,
                reason: "too large for the grid spacing",
            })?;
        if n < 2 {
            return Err(WakeError::GridTooSmall { size, spacing, n });
        }
        Ok(Grid { n, spacing })
    }

    pub fn x_coord(&self, col: usize) -> f64 {
        self.spacing * (col as f64)
    }

    pub fn z_coord(&self, row: usize) -> f64 {
        self.spacing * (row as f64)
    }

    pub fn in_bounds(&self, row: usize, col: usize) -> bool {
        row < self.n && col < self.n
    }

    /// Side length of the sampled square.
    pub fn extent(&self) -> f64 {
        (self.n - 1) as f64 * self.spacing
    }

    pub fn cell_count(&self) -> usize {
        self.n * self.n
    }

    /// Nearest grid cell `(row, col)` to a world position, if it lies on the
    /// surface.
    pub fn cell_at(&self, x: f64, z: f64) -> Option<(usize, usize)> {
        let col = (x / self.spacing).round();
        let row = (z / self.spacing).round();
        if col < 0.0 || row < 0.0 || !col.is_finite() || !row.is_finite() {
            return None;
        }
        let (row, col) = (row as usize, col as usize);
        self.in_bounds(row, col).then_some((row, col))
    }
}

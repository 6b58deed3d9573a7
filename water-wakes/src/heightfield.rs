use ndarray::Array2;

use crate::error::{Result, WakeError};

pub struct HeightField {
    // Six components, each an independent N×N buffer
    pub height: Array2<f64>,
    pub previous_height: Array2<f64>,
    pub vertical_derivative: Array2<f64>,
    pub source: Array2<f64>,
    pub obstruction: Array2<f64>,
    pub height_difference: Array2<f64>,
}

impl HeightField {
    pub fn new(n: usize) -> Self {
        // Every buffer is a deep copy of the same flat surface
        let flat = Array2::<f64>::zeros((n, n));

        let mut field = HeightField {
            height: flat.clone(),
            previous_height: flat.clone(),
            vertical_derivative: flat.clone(),
            source: flat.clone(),
            obstruction: flat.clone(),
            height_difference: flat,
        };
        field.reset_obstruction();
        field
    }

    pub fn dim(&self) -> usize {
        self.height.nrows()
    }

    /// Clamp the outer ring of cells to zero displacement, leave the rest free.
    pub fn reset_obstruction(&mut self) {
        let n = self.dim();
        for ((row, col), mask) in self.obstruction.indexed_iter_mut() {
            let border = row == 0 || col == 0 || row == n - 1 || col == n - 1;
            *mask = if border { 0.0 } else { 1.0 };
        }
    }

    pub fn zero(&mut self) {
        // Back to a flat, undisturbed surface; the obstruction mask is kept
        self.height.fill(0.0);
        self.previous_height.fill(0.0);
        self.vertical_derivative.fill(0.0);
        self.source.fill(0.0);
        self.height_difference.fill(0.0);
    }

    fn check_cell(&self, row: usize, col: usize) -> Result<()> {
        let n = self.dim();
        if row >= n || col >= n {
            return Err(WakeError::OutOfBounds { row, col, n });
        }
        Ok(())
    }

    /// Queue a displacement at `(row, col)` for the next tick.
    pub fn inject_source(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        self.check_cell(row, col)?;
        self.source[[row, col]] += value;
        Ok(())
    }

    /// Set the mask value of a single cell (0 pins it flat, 1 leaves it free).
    pub fn set_obstruction(&mut self, row: usize, col: usize, mask: f64) -> Result<()> {
        self.check_cell(row, col)?;
        if !(0.0..=1.0).contains(&mask) {
            return Err(WakeError::InvalidParameter {
                name: "obstruction",
                value: mask,
                reason: "must be in [0, 1]",
            });
        }
        self.obstruction[[row, col]] = mask;
        Ok(())
    }

    /// Largest absolute displacement on the surface.
    pub fn peak_amplitude(&self) -> f64 {
        self.height.iter().map(|&h| h.abs()).fold(0.0_f64, f64::max)
    }

    /// Sum of squared displacements, a proxy for the wave energy.
    pub fn energy(&self) -> f64 {
        self.height.iter().map(|&h| h * h).sum()
    }

    /// Published heights flattened row-major, one entry per mesh vertex.
    pub fn flattened(&self) -> Vec<f64> {
        self.height_difference.iter().copied().collect()
    }

    /// First cell whose published height is NaN or infinite.
    pub fn first_non_finite(&self) -> Option<((usize, usize), f64)> {
        self.height_difference
            .indexed_iter()
            .find(|(_, h)| !h.is_finite())
            .map(|(idx, &h)| (idx, h))
    }
}

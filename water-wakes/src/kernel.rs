//! Precomputed iWave convolution kernel.
//!
//! The vertical derivative of the surface is the inverse transform of the
//! dispersion relation, damped by a Gaussian so that short wavelengths
//! stay resolvable on the grid:
//!
//! ```text
//! G(r) = Σ_n q_n² · exp(-σ q_n²) · J0(q_n r) / G₀,   q_n = n·Δq
//! G₀   = Σ_n q_n² · exp(-σ q_n²)
//! ```
//!
//! Weights depend only on `r = √(k² + l²)`, so the table is symmetric under
//! axis swaps and sign flips.

use ndarray::{Array2, Axis};
use rayon::prelude::*;

use crate::bessel::bessel_j0;
use crate::error::{Result, WakeError};

/// Quadrature step in wavenumber.
pub const DELTA_Q: f64 = 0.001;
/// Number of quadrature samples (`n = 1..=QUADRATURE_STEPS`).
pub const QUADRATURE_STEPS: usize = 10_000;
/// Kernel radius used when none is configured.
pub const DEFAULT_RADIUS: usize = 8;
/// Gaussian damping of short wavelengths used when none is configured.
pub const DEFAULT_SIGMA: f64 = 1.0;

/// Square `(2P+1)×(2P+1)` table of convolution weights, indexed by offset.
#[derive(Debug, Clone)]
pub struct KernelTable {
    radius: usize,
    sigma: f64,
    g_zero: f64,
    weights: Array2<f64>,
}

/// Dispersion integrand without the Bessel factor.
#[inline]
fn spectrum(q: f64, sigma: f64) -> f64 {
    q * q * (-sigma * q * q).exp()
}

fn normalisation(sigma: f64) -> f64 {
    (1..=QUADRATURE_STEPS)
        .map(|n| spectrum(n as f64 * DELTA_Q, sigma))
        .sum()
}

fn unnormalised_g(r: f64, sigma: f64) -> f64 {
    (1..=QUADRATURE_STEPS)
        .map(|n| {
            let q = n as f64 * DELTA_Q;
            spectrum(q, sigma) * bessel_j0(q * r)
        })
        .sum()
}

impl KernelTable {
    /// Build the table for kernel radius `radius` (P) and damping `sigma`.
    ///
    /// Each row is computed independently, so rows are filled in parallel.
    /// The call blocks until the whole table is ready.
    pub fn build(radius: usize, sigma: f64) -> Result<Self> {
        if radius == 0 {
            return Err(WakeError::InvalidParameter {
                name: "kernel_radius",
                value: 0.0,
                reason: "must be at least 1",
            });
        }
        if !(sigma > 0.0 && sigma.is_finite()) {
            return Err(WakeError::InvalidParameter {
                name: "sigma",
                value: sigma,
                reason: "must be positive and finite",
            });
        }

        let g_zero = normalisation(sigma);
        if !g_zero.is_finite() || g_zero.abs() < f64::EPSILON {
            return Err(WakeError::DegenerateKernel(format!(
                "normalisation G0={} for sigma={}",
                g_zero, sigma
            )));
        }

        let p = radius as isize;
        let side = 2 * radius + 1;
        let mut weights = Array2::<f64>::zeros((side, side));

        weights
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(row, mut line)| {
                let k = row as isize - p;
                for (col, w) in line.iter_mut().enumerate() {
                    let l = col as isize - p;
                    let r = ((k * k + l * l) as f64).sqrt();
                    *w = unnormalised_g(r, sigma) / g_zero;
                }
            });

        if let Some(((row, col), w)) = weights.indexed_iter().find(|(_, w)| !w.is_finite()) {
            return Err(WakeError::DegenerateKernel(format!(
                "weight {} at offset ({}, {})",
                w,
                row as isize - p,
                col as isize - p
            )));
        }

        tracing::debug!(
            radius,
            sigma,
            g_zero,
            centre = weights[[radius, radius]],
            "kernel table built"
        );

        Ok(Self {
            radius,
            sigma,
            g_zero,
            weights,
        })
    }

    pub fn radius(&self) -> usize {
        self.radius
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Normalisation constant `G₀`.
    pub fn g_zero(&self) -> f64 {
        self.g_zero
    }

    /// Full table, offset `(k, l)` stored at `[k+P, l+P]`.
    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    /// Stored weight for offset `(k, l)`, `|k|, |l| <= P`.
    ///
    /// # Panics
    /// If the offset lies outside the kernel window.
    #[inline]
    pub fn weight(&self, k: isize, l: isize) -> f64 {
        let p = self.radius as isize;
        assert!(
            k.abs() <= p && l.abs() <= p,
            "offset ({}, {}) outside kernel radius {}",
            k,
            l,
            p
        );
        self.weights[[(k + p) as usize, (l + p) as usize]]
    }

    /// Evaluate the normalised dispersion integral for an offset directly,
    /// without consulting the table.
    pub fn calculate_g(&self, k: isize, l: isize) -> f64 {
        let r = ((k * k + l * l) as f64).sqrt();
        unnormalised_g(r, self.sigma) / self.g_zero
    }

    /// Sum of every weight in the window.
    pub fn mass(&self) -> f64 {
        self.weights.sum()
    }
}

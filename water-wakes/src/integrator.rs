//! Damped leapfrog integration of the height field.
//!
//! Discretises `∂²h/∂t² = -g·vd - α·∂h/∂t`, with `vd` the kernel-filtered
//! height, as
//!
//! ```text
//! h[n+1] = (h[n]·(2 - α·dt) - h[n-1] - g·dt²·vd[n]) / (1 + α·dt)
//! ```

use ndarray::Zip;

use crate::convolution::{convolve, convolve_parallel, CornerPolicy};
use crate::error::{Result, WakeError};
use crate::heightfield::HeightField;
use crate::kernel::KernelTable;

/// Gravitational acceleration used when none is configured (m/s², pointing down).
pub const DEFAULT_GRAVITY: f64 = -9.81;
/// Damping used when none is configured.
pub const DEFAULT_ALPHA: f64 = 0.9;
/// Fixed tick interval used when none is configured (seconds).
pub const DEFAULT_DT: f64 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveParams {
    pub alpha: f64,   // Damping strength (1/s)
    pub gravity: f64, // Restoring-force scale (m/s²)
    pub dt: f64,      // Tick interval (s)
}

impl Default for WaveParams {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            gravity: DEFAULT_GRAVITY,
            dt: DEFAULT_DT,
        }
    }
}

impl WaveParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha >= 0.0 && self.alpha.is_finite()) {
            return Err(WakeError::InvalidParameter {
                name: "alpha",
                value: self.alpha,
                reason: "must be non-negative and finite",
            });
        }
        if !self.gravity.is_finite() {
            return Err(WakeError::InvalidParameter {
                name: "gravity",
                value: self.gravity,
                reason: "must be finite",
            });
        }
        if !(self.dt > 0.0 && self.dt.is_finite()) {
            return Err(WakeError::InvalidParameter {
                name: "dt",
                value: self.dt,
                reason: "must be positive and finite",
            });
        }
        Ok(())
    }
}

pub struct WaveIntegrator {
    pub params: WaveParams,
    pub corner_policy: CornerPolicy,
    pub parallel: bool,
}

impl WaveIntegrator {
    pub fn new(params: WaveParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            corner_policy: CornerPolicy::default(),
            parallel: false,
        })
    }

    pub fn with_corner_policy(mut self, policy: CornerPolicy) -> Self {
        self.corner_policy = policy;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    fn apply_sources(field: &mut HeightField) {
        // Inject, consume, then pin obstructed cells
        Zip::from(&mut field.height)
            .and(&mut field.source)
            .and(&field.obstruction)
            .for_each(|h, s, &mask| {
                *h += *s;
                *s = 0.0;
                *h *= mask;
            });
    }

    fn update_vertical_derivative(&self, field: &mut HeightField, kernel: &KernelTable) {
        if self.parallel {
            convolve_parallel(
                &field.height,
                kernel,
                self.corner_policy,
                &mut field.vertical_derivative,
            );
        } else {
            convolve(
                &field.height,
                kernel,
                self.corner_policy,
                &mut field.vertical_derivative,
            );
        }
    }

    fn integrate(&self, field: &mut HeightField) {
        let WaveParams { alpha, gravity, dt } = self.params;
        let adt = alpha * dt;
        let gdt2 = gravity * dt * dt;
        let denominator = 1.0 + adt;
        let ambient = 0.0; // Background swell, not modelled

        Zip::from(&mut field.height)
            .and(&mut field.previous_height)
            .and(&mut field.height_difference)
            .and(&field.vertical_derivative)
            .for_each(|h, prev, published, &vd| {
                let current = *h;
                let next = (current * (2.0 - adt) - *prev - gdt2 * vd) / denominator;
                *prev = current;
                *h = next;
                *published = ambient + next;
            });
    }

    /// Advance `field` by one tick.
    ///
    /// The convolution sees the whole field after injection before any cell
    /// is integrated. `tick` is only used to label a non-finite result.
    ///
    /// The obstruction mask is applied at injection, before integration, so
    /// the published border ring is not exactly zero: the leapfrog update can
    /// leave small heights there (order 1e-5 for an impulse of 0.05) until
    /// the next tick's mask clears them.
    pub fn step(&self, field: &mut HeightField, kernel: &KernelTable, tick: u64) -> Result<()> {
        Self::apply_sources(field);
        self.update_vertical_derivative(field, kernel);
        self.integrate(field);

        if let Some(((row, col), value)) = field.first_non_finite() {
            return Err(WakeError::NonFinite {
                row,
                col,
                tick,
                value,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::DEFAULT_SIGMA;
    use approx::assert_relative_eq;

    #[test]
    fn test_rejects_bad_params() {
        let bad = [
            WaveParams { alpha: -0.1, ..Default::default() },
            WaveParams { gravity: f64::INFINITY, ..Default::default() },
            WaveParams { dt: 0.0, ..Default::default() },
            WaveParams { dt: f64::NAN, ..Default::default() },
        ];
        for params in bad {
            assert!(WaveIntegrator::new(params).is_err(), "{:?}", params);
        }
    }

    #[test]
    fn test_flat_surface_is_fixed_point() {
        let kernel = KernelTable::build(2, DEFAULT_SIGMA).unwrap();
        let integrator = WaveIntegrator::new(WaveParams::default()).unwrap();
        let mut field = HeightField::new(8);

        for tick in 0..20 {
            integrator.step(&mut field, &kernel, tick).unwrap();
        }
        assert!(field.height.iter().all(|&h| h == 0.0));
        assert!(field.height_difference.iter().all(|&h| h == 0.0));
    }

    #[test]
    fn test_single_tick_response() {
        let kernel = KernelTable::build(1, DEFAULT_SIGMA).unwrap();
        let params = WaveParams { alpha: 0.9, gravity: -9.81, dt: 0.02 };
        let integrator = WaveIntegrator::new(params).unwrap();
        let mut field = HeightField::new(5);
        field.inject_source(2, 2, 1.0).unwrap();

        integrator.step(&mut field, &kernel, 0).unwrap();

        // Neighbours of the centre are still flat, so vd = centre weight
        let adt = 0.9 * 0.02;
        let expected = ((2.0 - adt) + 9.81 * 0.02 * 0.02 * kernel.weight(0, 0)) / (1.0 + adt);
        assert_relative_eq!(field.height[[2, 2]], expected, epsilon = 1e-12);
        assert_eq!(field.previous_height[[2, 2]], 1.0);
        assert_eq!(field.height_difference[[2, 2]], field.height[[2, 2]]);
        assert_eq!(field.source[[2, 2]], 0.0);

        for ((row, col), &h) in field.height.indexed_iter() {
            if row == 0 || col == 0 || row == 4 || col == 4 {
                assert_eq!(h, 0.0, "border cell ({}, {})", row, col);
            }
        }

        // The same impulse without damping moves further
        let undamped = WaveIntegrator::new(WaveParams { alpha: 0.0, ..params }).unwrap();
        let mut free = HeightField::new(5);
        free.inject_source(2, 2, 1.0).unwrap();
        undamped.step(&mut free, &kernel, 0).unwrap();
        assert!(field.height[[2, 2]] != 0.0);
        assert!(field.height[[2, 2]].abs() < free.height[[2, 2]].abs());
    }

    #[test]
    fn test_border_residual_stays_small() {
        let kernel = KernelTable::build(8, DEFAULT_SIGMA).unwrap();
        let integrator = WaveIntegrator::new(WaveParams::default()).unwrap();
        let n = 31;
        let mut field = HeightField::new(n);
        field.inject_source(15, 15, 0.05).unwrap();

        let mut worst = 0.0_f64;
        for tick in 0..100 {
            integrator.step(&mut field, &kernel, tick).unwrap();
            for ((row, col), &h) in field.height_difference.indexed_iter() {
                if row == 0 || col == 0 || row == n - 1 || col == n - 1 {
                    worst = worst.max(h.abs());
                }
            }
        }
        // Masked before integration, so the ring is only approximately flat
        assert!(worst < 1e-4, "border residual {}", worst);
    }

    #[test]
    fn test_obstruction_removes_source() {
        let kernel = KernelTable::build(1, DEFAULT_SIGMA).unwrap();
        let integrator = WaveIntegrator::new(WaveParams::default()).unwrap();
        let mut field = HeightField::new(5);
        field.inject_source(0, 2, 1.0).unwrap();

        integrator.step(&mut field, &kernel, 0).unwrap();
        assert!(field.height.iter().all(|&h| h == 0.0));
        assert_eq!(field.source[[0, 2]], 0.0);
    }

    #[test]
    fn test_parallel_step_matches_serial() {
        let kernel = KernelTable::build(2, DEFAULT_SIGMA).unwrap();
        let serial = WaveIntegrator::new(WaveParams::default()).unwrap();
        let parallel = WaveIntegrator::new(WaveParams::default())
            .unwrap()
            .with_parallel(true);

        let mut a = HeightField::new(11);
        let mut b = HeightField::new(11);
        a.inject_source(5, 4, 0.3).unwrap();
        b.inject_source(5, 4, 0.3).unwrap();
        for tick in 0..10 {
            serial.step(&mut a, &kernel, tick).unwrap();
            parallel.step(&mut b, &kernel, tick).unwrap();
        }
        assert_eq!(a.height, b.height);
        assert_eq!(a.previous_height, b.previous_height);
    }

    #[test]
    fn test_overflow_is_reported() {
        let kernel = KernelTable::build(1, DEFAULT_SIGMA).unwrap();
        let integrator = WaveIntegrator::new(WaveParams::default()).unwrap();
        let mut field = HeightField::new(5);
        field.inject_source(2, 2, f64::MAX).unwrap();

        let err = integrator.step(&mut field, &kernel, 7).unwrap_err();
        assert!(matches!(err, WakeError::NonFinite { tick: 7, .. }));
        assert!(!err.is_configuration());
    }
}

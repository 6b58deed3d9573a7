use ndarray::Array2;

use crate::clock::FixedTimestep;
use crate::config::{Config, DisturbanceConfig, WaveConfig};
use crate::error::{Result, WakeError};
use crate::grid::Grid;
use crate::heightfield::HeightField;
use crate::integrator::WaveIntegrator;
use crate::kernel::KernelTable;

/// A displacement scheduled for a grid cell at a simulated time.
#[derive(Clone, Debug, PartialEq)]
pub struct Disturbance {
    pub row: usize,
    pub col: usize,
    pub amplitude: f64,
    pub time: f64, // Simulated time at which it lands (s)
}

impl Disturbance {
    pub fn new(row: usize, col: usize, amplitude: f64) -> Self {
        Self::with_delay(row, col, amplitude, 0.0)
    }

    pub fn with_delay(row: usize, col: usize, amplitude: f64, time: f64) -> Self {
        Self {
            row,
            col,
            amplitude,
            time,
        }
    }

    /// Map a world-space disturbance onto its nearest grid cell.
    pub fn from_config(config: &DisturbanceConfig, grid: &Grid) -> Result<Self> {
        let (row, col) = grid
            .cell_at(config.x, config.z)
            .ok_or(WakeError::InvalidParameter {
                name: "disturbance position",
                value: config.x.max(config.z),
                reason: "must lie on the surface",
            })?;
        Ok(Self::with_delay(row, col, config.amplitude, config.time))
    }
}

pub struct Simulation {
    pub grid: Grid,
    pub kernel: KernelTable,
    pub field: HeightField,
    pub integrator: WaveIntegrator,
    clock: FixedTimestep,
    pending: Vec<Disturbance>, // Sorted by time, latest first
    current_tick: u64,
}

impl Simulation {
    /// Build the grid, the height field and the kernel table.
    ///
    /// The kernel is computed here, once, before any tick can run.
    pub fn new(grid: Grid, wave: &WaveConfig) -> Result<Self> {
        let integrator = WaveIntegrator::new(wave.params())?
            .with_corner_policy(wave.corner_policy)
            .with_parallel(wave.parallel);
        let kernel = KernelTable::build(wave.kernel_radius, wave.sigma)?;
        let field = HeightField::new(grid.n);

        tracing::info!(
            n = grid.n,
            radius = kernel.radius(),
            sigma = kernel.sigma(),
            g_zero = kernel.g_zero(),
            "height field initialised"
        );

        Ok(Self {
            grid,
            kernel,
            field,
            clock: FixedTimestep::new(integrator.params.dt),
            integrator,
            pending: Vec::new(),
            current_tick: 0,
        })
    }

    /// Set up a simulation from a full configuration, scheduling its
    /// disturbances.
    pub fn initialize(config: &Config) -> Result<Self> {
        let grid = Grid::from_extent(config.grid.size, config.grid.spacing)?;
        let mut sim = Self::new(grid, &config.wave)?;
        for disturbance in &config.disturbances {
            sim.schedule(Disturbance::from_config(disturbance, &grid)?)?;
        }
        Ok(sim)
    }

    /// Tick interval; the accumulator runs on the integrator's `dt`.
    pub fn dt(&self) -> f64 {
        self.clock.interval()
    }

    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    pub fn current_time(&self) -> f64 {
        // Simulated time from the number of completed ticks
        self.current_tick as f64 * self.dt()
    }

    /// Disturbances not yet delivered.
    pub fn pending(&self) -> &[Disturbance] {
        &self.pending
    }

    /// Queue a disturbance for the tick whose start time reaches `time`.
    pub fn schedule(&mut self, disturbance: Disturbance) -> Result<()> {
        if !self.grid.in_bounds(disturbance.row, disturbance.col) {
            return Err(WakeError::OutOfBounds {
                row: disturbance.row,
                col: disturbance.col,
                n: self.grid.n,
            });
        }
        self.pending.push(disturbance);
        self.pending.sort_by(|a, b| b.time.total_cmp(&a.time));
        Ok(())
    }

    /// Add a displacement to the source buffer for the next tick.
    pub fn inject(&mut self, row: usize, col: usize, amplitude: f64) -> Result<()> {
        self.field.inject_source(row, col, amplitude)
    }

    fn deliver_due(&mut self) -> Result<()> {
        let now = self.current_time();
        while let Some(next) = self.pending.last() {
            if next.time > now {
                break;
            }
            if let Some(d) = self.pending.pop() {
                tracing::debug!(
                    row = d.row,
                    col = d.col,
                    amplitude = d.amplitude,
                    t = now,
                    "disturbance delivered"
                );
                self.field.inject_source(d.row, d.col, d.amplitude)?;
            }
        }
        Ok(())
    }

    /// Run exactly one tick and return the published heights.
    pub fn step(&mut self) -> Result<&Array2<f64>> {
        // 1. Deliver due disturbances into the source buffer
        self.deliver_due()?;

        // 2. Inject, convolve, integrate
        self.integrator
            .step(&mut self.field, &self.kernel, self.current_tick)?;

        // 3. Increment tick
        self.current_tick += 1;

        Ok(&self.field.height_difference)
    }

    /// Feed `elapsed` seconds of host time; runs at most one tick.
    ///
    /// Returns whether a tick ran.
    pub fn advance(&mut self, elapsed: f64) -> Result<bool> {
        if self.clock.advance(elapsed) {
            self.step()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Heights published by the most recent tick. Border cells may carry
    /// small residual values, see [`WaveIntegrator::step`].
    pub fn height_difference(&self) -> &Array2<f64> {
        &self.field.height_difference
    }

    /// Run `ticks` ticks back to back, logging progress every
    /// `report_period` ticks.
    pub fn run(&mut self, ticks: u64, report_period: u64) -> Result<()> {
        tracing::info!(
            "Running {} ticks on a {}x{} grid (dt = {} s)",
            ticks,
            self.grid.n,
            self.grid.n,
            self.dt()
        );

        for _ in 0..ticks {
            self.step()?;

            if report_period > 0 && self.current_tick % report_period == 0 {
                tracing::info!(
                    "Tick {} (t={:.2}s) peak={:.4e}",
                    self.current_tick,
                    self.current_time(),
                    self.field.peak_amplitude()
                );
            }
        }

        Ok(())
    }
}

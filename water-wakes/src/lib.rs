//! # water-wakes
//!
//! Interactive water-surface wakes using the iWave height-field model.
//!
//! A precomputed convolution kernel, derived from the dispersion relation of
//! surface waves, supplies the vertical derivative of the surface; a damped
//! leapfrog integrator advances the heights one fixed tick at a time.
//! Objects entering the water are modelled as displacements injected into a
//! per-tick source buffer.
//!
//! ```no_run
//! use water_wakes::{Grid, Simulation, WaveConfig};
//!
//! let grid = Grid::from_extent(3.0, 0.1)?;
//! let mut sim = Simulation::new(grid, &WaveConfig::default())?;
//! sim.inject(15, 15, 0.2)?;
//! let heights = sim.step()?;
//! assert_eq!(heights.dim(), (31, 31));
//! # Ok::<(), water_wakes::WakeError>(())
//! ```

pub mod bessel;
pub mod clock;
pub mod config;
pub mod convolution;
pub mod error;
pub mod grid;
pub mod heightfield;
pub mod integrator;
pub mod kernel;
pub mod simulation;
pub mod surface;
pub mod visualisation;

pub use clock::FixedTimestep;
pub use config::{Config, WaveConfig};
pub use convolution::CornerPolicy;
pub use error::{Result, WakeError};
pub use grid::Grid;
pub use heightfield::HeightField;
pub use integrator::{WaveIntegrator, WaveParams};
pub use kernel::KernelTable;
pub use simulation::{Disturbance, Simulation};
pub use surface::SurfaceMesh;

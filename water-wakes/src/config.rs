use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::convolution::CornerPolicy;
use crate::grid::Grid;
use crate::integrator::{WaveParams, DEFAULT_ALPHA, DEFAULT_DT, DEFAULT_GRAVITY};
use crate::kernel::{DEFAULT_RADIUS, DEFAULT_SIGMA};

/// Surface extent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_size")]
    pub size: f64, // Side length of the square surface (m)
    #[serde(default = "default_spacing")]
    pub spacing: f64, // Distance between grid points (m)
}

fn default_size() -> f64 {
    3.0
}

fn default_spacing() -> f64 {
    0.1
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: default_size(),
            spacing: default_spacing(),
        }
    }
}

impl GridConfig {
    fn validate(&self) -> Result<()> {
        if self.spacing <= 0.0 || !self.spacing.is_finite() {
            return Err(anyhow!("Grid spacing must be positive, got {}", self.spacing));
        }
        if self.size <= 0.0 || !self.size.is_finite() {
            return Err(anyhow!("Grid size must be positive, got {}", self.size));
        }
        self.to_grid()?;
        Ok(())
    }

    pub fn to_grid(&self) -> Result<Grid> {
        Grid::from_extent(self.size, self.spacing).context("Invalid grid configuration")
    }
}

/// Wave model parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveConfig {
    #[serde(default = "default_alpha")]
    pub alpha: f64, // Damping strength
    #[serde(default = "default_gravity")]
    pub gravity: f64, // Restoring-force scale (m/s², negative = down)
    #[serde(default = "default_dt")]
    pub dt: f64, // Fixed tick interval (s)
    #[serde(default = "default_kernel_radius")]
    pub kernel_radius: usize,
    #[serde(default = "default_sigma")]
    pub sigma: f64, // Short-wavelength damping in the kernel
    #[serde(default)]
    pub corner_policy: CornerPolicy,
    #[serde(default)]
    pub parallel: bool,
}

fn default_alpha() -> f64 {
    DEFAULT_ALPHA
}

fn default_gravity() -> f64 {
    DEFAULT_GRAVITY
}

fn default_dt() -> f64 {
    DEFAULT_DT
}

fn default_kernel_radius() -> usize {
    DEFAULT_RADIUS
}

fn default_sigma() -> f64 {
    DEFAULT_SIGMA
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
            gravity: default_gravity(),
            dt: default_dt(),
            kernel_radius: default_kernel_radius(),
            sigma: default_sigma(),
            corner_policy: CornerPolicy::default(),
            parallel: false,
        }
    }
}

impl WaveConfig {
    fn validate(&self, n: usize) -> Result<()> {
        self.params()
            .validate()
            .context("Invalid wave parameters")?;
        if self.kernel_radius == 0 {
            return Err(anyhow!("kernel_radius must be at least 1"));
        }
        if self.kernel_radius >= n {
            return Err(anyhow!(
                "kernel_radius ({}) must be smaller than the grid dimension ({})",
                self.kernel_radius,
                n
            ));
        }
        if self.sigma <= 0.0 || !self.sigma.is_finite() {
            return Err(anyhow!("sigma must be positive, got {}", self.sigma));
        }
        Ok(())
    }

    pub fn params(&self) -> WaveParams {
        WaveParams {
            alpha: self.alpha,
            gravity: self.gravity,
            dt: self.dt,
        }
    }
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub total_time: f64, // Simulated wall-clock duration (s)
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f64, // Host frames per second feeding the accumulator
    #[serde(default = "default_report_period")]
    pub report_period: usize, // Log progress every this many ticks
}

fn default_frame_rate() -> f64 {
    60.0
}

fn default_report_period() -> usize {
    100
}

impl SimulationConfig {
    fn validate(&self) -> Result<()> {
        if self.total_time <= 0.0 || !self.total_time.is_finite() {
            return Err(anyhow!("total_time must be positive, got {}", self.total_time));
        }
        if self.frame_rate <= 0.0 || !self.frame_rate.is_finite() {
            return Err(anyhow!("frame_rate must be positive, got {}", self.frame_rate));
        }
        if self.report_period == 0 {
            return Err(anyhow!("report_period must be at least 1"));
        }
        Ok(())
    }

    /// Number of host frames in the session
    pub fn frame_count(&self) -> usize {
        (self.total_time * self.frame_rate).round() as usize
    }
}

/// A disturbance dropped onto the surface at a given time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisturbanceConfig {
    pub x: f64, // World position along the columns (m)
    pub z: f64, // World position along the rows (m)
    pub amplitude: f64,
    #[serde(default)]
    pub time: f64, // Default: 0.0
}

impl DisturbanceConfig {
    fn validate(&self, grid: &Grid) -> Result<()> {
        if grid.cell_at(self.x, self.z).is_none() {
            return Err(anyhow!(
                "Disturbance position ({}, {}) is outside the surface (extent {} m)",
                self.x,
                self.z,
                grid.extent()
            ));
        }
        if !self.amplitude.is_finite() {
            return Err(anyhow!("Disturbance amplitude must be finite, got {}", self.amplitude));
        }
        if self.time < 0.0 {
            return Err(anyhow!(
                "Disturbance time must be non-negative, got {}",
                self.time
            ));
        }
        Ok(())
    }
}

/// Frame output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualizationConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_frame_interval")]
    pub frame_interval: usize, // Ticks between saved frames
    #[serde(default = "default_image_width")]
    pub image_width: usize,
    #[serde(default = "default_image_height")]
    pub image_height: usize,
}

fn default_enabled() -> bool {
    true
}

fn default_output_dir() -> String {
    "output".to_string()
}

fn default_frame_interval() -> usize {
    5
}

fn default_image_width() -> usize {
    800
}

fn default_image_height() -> usize {
    800
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            output_dir: default_output_dir(),
            frame_interval: default_frame_interval(),
            image_width: default_image_width(),
            image_height: default_image_height(),
        }
    }
}

impl VisualizationConfig {
    fn validate(&self) -> Result<()> {
        if self.frame_interval == 0 {
            return Err(anyhow!("frame_interval must be at least 1"));
        }
        if self.image_width == 0 || self.image_height == 0 {
            return Err(anyhow!(
                "Image dimensions must be positive (width={}, height={})",
                self.image_width,
                self.image_height
            ));
        }
        Ok(())
    }
}

/// Complete session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub wave: WaveConfig,
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub disturbances: Vec<DisturbanceConfig>,
    #[serde(default)]
    pub visualization: VisualizationConfig,
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| anyhow!("Failed to parse TOML config: {}", e))?;

        // Validate before returning
        config.validate()?;

        Ok(config)
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<()> {
        self.grid.validate()?;
        let grid = self.grid.to_grid()?;
        self.wave.validate(grid.n)?;
        self.simulation.validate()?;
        self.visualization.validate()?;

        // Validate disturbances against the surface
        for (idx, disturbance) in self.disturbances.iter().enumerate() {
            disturbance
                .validate(&grid)
                .with_context(|| format!("Disturbance {}", idx))?;
        }

        if self.simulation.frame_rate * self.wave.dt < 1.0 {
            tracing::warn!(
                frame_rate = self.simulation.frame_rate,
                dt = self.wave.dt,
                "frames are longer than a tick; the simulation will run slower than real time"
            );
        }

        Ok(())
    }

    /// Log configuration summary
    pub fn log_summary(&self) {
        let n = self.grid.to_grid().map(|g| g.n).unwrap_or(0);
        tracing::info!(
            "Grid: {}x{} ({} m, spacing {} m)",
            n,
            n,
            self.grid.size,
            self.grid.spacing
        );
        tracing::info!(
            "Wave: alpha={}, g={} m/s², dt={} s, P={}, sigma={}, corners={:?}",
            self.wave.alpha,
            self.wave.gravity,
            self.wave.dt,
            self.wave.kernel_radius,
            self.wave.sigma,
            self.wave.corner_policy
        );
        tracing::info!(
            "Session: {} s at {} FPS ({} frames)",
            self.simulation.total_time,
            self.simulation.frame_rate,
            self.simulation.frame_count()
        );
        tracing::info!("Disturbances: {}", self.disturbances.len());
        for (i, d) in self.disturbances.iter().enumerate() {
            tracing::info!(
                "  Disturbance {}: position ({}, {}) m, amplitude {}, t={} s",
                i,
                d.x,
                d.z,
                d.amplitude,
                d.time
            );
        }
        if self.visualization.enabled {
            tracing::info!(
                "Frames: every {} ticks, {}x{} px into '{}'",
                self.visualization.frame_interval,
                self.visualization.image_width,
                self.visualization.image_height,
                self.visualization.output_dir
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[simulation]
total_time = 1.0
"#;

    #[test]
    fn test_defaults() {
        let config = Config::from_toml(MINIMAL).unwrap();
        assert_eq!(config.grid.size, 3.0);
        assert_eq!(config.grid.spacing, 0.1);
        assert_eq!(config.grid.to_grid().unwrap().n, 31);
        assert_eq!(config.wave.alpha, 0.9);
        assert_eq!(config.wave.gravity, -9.81);
        assert_eq!(config.wave.dt, 0.02);
        assert_eq!(config.wave.kernel_radius, 8);
        assert_eq!(config.wave.corner_policy, CornerPolicy::Drop);
        assert!(config.disturbances.is_empty());
        assert_eq!(config.simulation.frame_count(), 60);
    }

    #[test]
    fn test_full_file() {
        let config = Config::from_toml(
            r#"
[grid]
size = 2.0
spacing = 0.05

[wave]
alpha = 0.5
kernel_radius = 4
corner_policy = "mirror"
parallel = true

[simulation]
total_time = 3.0
frame_rate = 30.0

[[disturbances]]
x = 1.0
z = 1.0
amplitude = -0.2
time = 0.5

[visualization]
enabled = false
"#,
        )
        .unwrap();
        assert_eq!(config.grid.to_grid().unwrap().n, 41);
        assert_eq!(config.wave.corner_policy, CornerPolicy::Mirror);
        assert!(config.wave.parallel);
        assert_eq!(config.disturbances.len(), 1);
        assert_eq!(config.disturbances[0].time, 0.5);
        assert!(!config.visualization.enabled);
    }

    #[test]
    fn test_rejects_tiny_grid() {
        let err = Config::from_toml(
            r#"
[grid]
size = 0.01
spacing = 0.1

[simulation]
total_time = 1.0
"#,
        )
        .unwrap_err();
        assert!(format!("{:#}", err).contains("grid"));
    }

    #[test]
    fn test_rejects_kernel_wider_than_grid() {
        let err = Config::from_toml(
            r#"
[grid]
size = 0.4
spacing = 0.1

[simulation]
total_time = 1.0
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("kernel_radius"));
    }

    #[test]
    fn test_rejects_disturbance_off_surface() {
        let err = Config::from_toml(
            r#"
[simulation]
total_time = 1.0

[[disturbances]]
x = 5.0
z = 1.0
amplitude = 1.0
"#,
        )
        .unwrap_err();
        assert!(format!("{:#}", err).contains("outside the surface"));
    }

    #[test]
    fn test_rejects_bad_damping() {
        let err = Config::from_toml(
            r#"
[wave]
alpha = -1.0

[simulation]
total_time = 1.0
"#,
        )
        .unwrap_err();
        assert!(format!("{:#}", err).contains("alpha"));
    }

    #[test]
    fn test_missing_file() {
        assert!(Config::from_file("/nonexistent/wakes.toml").is_err());
    }
}

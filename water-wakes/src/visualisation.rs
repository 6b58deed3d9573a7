use ndarray::Array2;
use plotters::prelude::*;
use std::path::{Path, PathBuf};

pub struct SurfaceVisualiser {
    output_dir: PathBuf,
    width: u32,
    height: u32,
    // Diverging map: troughs blue, crests red
    gradient: Box<dyn colorgrad::Gradient>,
}

impl SurfaceVisualiser {
    pub fn new(output_dir: impl AsRef<Path>, width: u32, height: u32) -> std::io::Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&output_dir)?;

        let gradient = Box::new(colorgrad::preset::rd_yl_bu());

        Ok(Self {
            output_dir,
            width,
            height,
            gradient,
        })
    }

    pub fn frame_path(&self, tick: u64) -> PathBuf {
        self.output_dir.join(format!("surface_{:06}.png", tick))
    }

    /// Render one frame of published heights as a colour map.
    ///
    /// The colour scale is symmetric around zero and rescaled per frame.
    pub fn plot_heights(
        &self,
        data: &Array2<f64>,
        tick: u64,
        time: f64,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let path = self.frame_path(tick);
        let root = BitMapBackend::new(&path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let (rows, cols) = data.dim();
        let max_abs = data.iter().map(|&v| v.abs()).fold(0.0_f64, f64::max);

        let title = format!("surface at t={:.2}s (tick {}) peak={:.3e}", time, tick, max_abs);
        let mut chart = ChartBuilder::on(&root)
            .caption(&title, ("sans-serif", 24))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(40)
            .build_cartesian_2d(0..cols, 0..rows)?;

        chart
            .configure_mesh()
            .x_desc("column (x)")
            .y_desc("row (z)")
            .disable_mesh()
            .draw()?;

        chart.draw_series(data.indexed_iter().map(|((row, col), &value)| {
            let color = self.value_to_color(value, -max_abs, max_abs);
            Rectangle::new([(col, row), (col + 1, row + 1)], color.filled())
        }))?;

        root.present()?;
        // The backend borrows `path` until it is dropped
        drop(chart);
        drop(root);
        tracing::debug!("Saved frame: {}", path.display());
        Ok(path)
    }

    fn value_to_color(&self, value: f64, min_val: f64, max_val: f64) -> RGBColor {
        let normalized = if max_val > min_val {
            (value - min_val) / (max_val - min_val)
        } else {
            0.5
        };
        // Reverse so positive heights land on the red end
        let t = 1.0 - normalized.clamp(0.0, 1.0);
        let rgba = self.gradient.at(t as f32).to_rgba8();
        RGBColor(rgba[0], rgba[1], rgba[2])
    }
}

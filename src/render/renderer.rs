use std::path::Path;

use image::RgbImage;

use crate::config::AnnotateConfig;
use crate::dataset::Matrix;
use crate::error::{AnnotateError, Result};

use super::colormap::ColorMap;

#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub cmap: ColorMap,
    /// Lower bound of the color scale, the matrix minimum when unset.
    pub vmin: Option<f64>,
    /// Upper bound of the color scale, the matrix maximum when unset.
    pub vmax: Option<f64>,
    /// Inches.
    pub figsize: (f64, f64),
    pub dpi: u32,
}

impl RenderOptions {
    pub fn from_config(config: &AnnotateConfig) -> Result<Self> {
        Ok(Self {
            cmap: ColorMap::resolve(config.cmap.as_deref(), &config.custom_cmaps)?,
            vmin: config.vmin,
            vmax: config.vmax,
            figsize: config.figsize,
            dpi: config.dpi,
        })
    }

    pub fn pixel_size(&self) -> (u32, u32) {
        let px = |inches: f64| ((inches * self.dpi as f64).round() as u32).max(1);
        (px(self.figsize.0), px(self.figsize.1))
    }
}

/// Turns a matrix into an image file.
pub trait Renderer {
    fn render(&self, matrix: &Matrix, path: &Path, options: &RenderOptions) -> Result<()>;
}

/// Draws each matrix cell as a solid block, row 0 at the top. The output
/// format follows the file extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeatmapRenderer;

impl HeatmapRenderer {
    pub fn draw(matrix: &Matrix, options: &RenderOptions) -> RgbImage {
        let (width, height) = options.pixel_size();
        let (data_lo, data_hi) = matrix.finite_range().unwrap_or((0.0, 1.0));
        let lo = options.vmin.unwrap_or(data_lo);
        let hi = options.vmax.unwrap_or(data_hi);
        let span = hi - lo;

        let rows = matrix.rows() as u64;
        let cols = matrix.cols() as u64;
        RgbImage::from_fn(width, height, |x, y| {
            let col = (x as u64 * cols / width as u64) as usize;
            let row = (y as u64 * rows / height as u64) as usize;
            let value = matrix.get(row, col);
            let t = if !value.is_finite() {
                f64::NAN
            } else if span > 0.0 {
                (value - lo) / span
            } else {
                0.0
            };
            options.cmap.color(t)
        })
    }
}

impl Renderer for HeatmapRenderer {
    fn render(&self, matrix: &Matrix, path: &Path, options: &RenderOptions) -> Result<()> {
        let img = Self::draw(matrix, options);
        img.save(path).map_err(|e| match e {
            image::ImageError::Unsupported(_) => AnnotateError::Render(format!(
                "cannot write {}: {e}",
                path.display()
            )),
            other => AnnotateError::ImageError(other),
        })
    }
}

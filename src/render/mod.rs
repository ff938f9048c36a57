pub mod colormap;
pub mod renderer;

pub use colormap::ColorMap;
pub use renderer::{HeatmapRenderer, RenderOptions, Renderer};

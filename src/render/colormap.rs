use image::Rgb;

use crate::config::CustomColorMap;
use crate::error::{AnnotateError, Result};

const GRAY: &[&str] = &["#000000", "#ffffff"];
const VIRIDIS: &[&str] = &[
    "#440154", "#482878", "#3e4989", "#31688e", "#26828e", "#1f9e89", "#35b779", "#6ece58",
    "#b5de2b", "#fde725",
];
const HOT: &[&str] = &["#0b0000", "#ff0000", "#ffff00", "#ffffff"];
const COOLWARM: &[&str] = &["#3b4cc0", "#dddddd", "#b40426"];

const BUILTIN: &[(&str, &[&str])] = &[
    ("gray", GRAY),
    ("viridis", VIRIDIS),
    ("hot", HOT),
    ("coolwarm", COOLWARM),
];

pub const DEFAULT_COLORMAP: &str = "gray";

/// Color used for cells that are not finite numbers.
pub const MISSING_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Piecewise-linear gradient over evenly spaced color stops.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMap {
    name: String,
    stops: Vec<[u8; 3]>,
}

impl ColorMap {
    pub fn from_hex(name: &str, colors: &[impl AsRef<str>]) -> Result<Self> {
        if colors.len() < 2 {
            return Err(AnnotateError::Render(format!(
                "colormap {name:?} needs at least two colors"
            )));
        }
        let stops = colors
            .iter()
            .map(|c| parse_hex_color(c.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            name: name.to_string(),
            stops,
        })
    }

    /// Looks `name` up among the custom colormaps first, then the built-in
    /// ones. `None` selects the default.
    pub fn resolve(name: Option<&str>, custom: &[CustomColorMap]) -> Result<Self> {
        let name = name.unwrap_or(DEFAULT_COLORMAP);
        if let Some(cmap) = custom.iter().find(|c| c.name == name) {
            return Self::from_hex(&cmap.name, cmap.colors.as_slice());
        }
        match BUILTIN.iter().find(|(builtin, _)| *builtin == name) {
            Some((builtin, colors)) => Self::from_hex(builtin, *colors),
            None => Err(AnnotateError::Render(format!("unknown colormap {name:?}"))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Color at `t` in `[0, 1]`; values outside are clamped.
    pub fn color(&self, t: f64) -> Rgb<u8> {
        if !t.is_finite() {
            return MISSING_COLOR;
        }
        let segments = self.stops.len() - 1;
        let scaled = t.clamp(0.0, 1.0) * segments as f64;
        let i = (scaled.floor() as usize).min(segments - 1);
        let frac = scaled - i as f64;

        let (a, b) = (self.stops[i], self.stops[i + 1]);
        let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * frac).round() as u8;
        Rgb([mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2])])
    }
}

pub fn parse_hex_color(color: &str) -> Result<[u8; 3]> {
    let invalid = || AnnotateError::Config(format!("invalid color {color:?}, expected #rrggbb"));
    let hex = color.strip_prefix('#').ok_or_else(invalid)?;
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(invalid());
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
    Ok([channel(0)?, channel(2)?, channel(4)?])
}

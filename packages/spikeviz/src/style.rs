//! Colours, line styles, markers and figure geometry

use std::str::FromStr;

use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VizError};

/// Default property cycle (`C0` .. `C9`)
pub const COLOR_CYCLE: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

/// Parse a colour spec: cycle entries (`C3`), single letters (`k`, `r`),
/// a few names, or hex (`#1f77b4`, `#fff`).
pub fn parse_color(spec: &str) -> Result<RGBColor> {
    let s = spec.trim();
    let unknown = || VizError::UnknownColor(spec.to_string());

    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex).ok_or_else(unknown);
    }

    if let Some(idx) = s.strip_prefix('C') {
        if let Ok(i) = idx.parse::<usize>() {
            return Ok(COLOR_CYCLE[i % COLOR_CYCLE.len()]);
        }
    }

    let color = match s.to_ascii_lowercase().as_str() {
        "k" | "black" => RGBColor(0, 0, 0),
        "w" | "white" => RGBColor(255, 255, 255),
        "r" | "red" => RGBColor(255, 0, 0),
        "g" | "green" => RGBColor(0, 128, 0),
        "b" | "blue" => RGBColor(0, 0, 255),
        "c" | "cyan" => RGBColor(0, 191, 191),
        "m" | "magenta" => RGBColor(191, 0, 191),
        "y" | "yellow" => RGBColor(191, 191, 0),
        "gray" | "grey" => RGBColor(128, 128, 128),
        "lightgray" | "lightgrey" => RGBColor(211, 211, 211),
        "orange" => RGBColor(255, 165, 0),
        "purple" => RGBColor(128, 0, 128),
        _ => return Err(unknown()),
    };
    Ok(color)
}

fn parse_hex(hex: &str) -> Option<RGBColor> {
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        6 => Some(RGBColor(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        )),
        3 => {
            let expand = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
            Some(RGBColor(expand(0)?, expand(1)?, expand(2)?))
        }
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    DashDot,
}

impl LineStyle {
    /// On/off dash lengths in multiples of the line width; `None` for solid
    pub fn dash_pattern(&self) -> Option<&'static [f64]> {
        match self {
            LineStyle::Solid => None,
            LineStyle::Dashed => Some(&[3.7, 1.6]),
            LineStyle::Dotted => Some(&[1.0, 1.65]),
            LineStyle::DashDot => Some(&[6.4, 1.6, 1.0, 1.6]),
        }
    }
}

impl FromStr for LineStyle {
    type Err = VizError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "solid" | "-" => Ok(LineStyle::Solid),
            "dashed" | "--" => Ok(LineStyle::Dashed),
            "dotted" | ":" => Ok(LineStyle::Dotted),
            "dashdot" | "-." => Ok(LineStyle::DashDot),
            other => Err(VizError::UnknownLineStyle(other.to_string())),
        }
    }
}

/// Split the segment `from -> to` into the visible pieces of a dash pattern.
///
/// `pattern` is in the same units as the coordinates; a solid line is returned whole.
pub fn dash_segments(
    from: (f64, f64),
    to: (f64, f64),
    pattern: Option<&[f64]>,
) -> Vec<((f64, f64), (f64, f64))> {
    let pattern = match pattern {
        Some(p) if !p.is_empty() && p.iter().all(|d| *d > 0.0) => p,
        _ => return vec![(from, to)],
    };

    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let length = (dx * dx + dy * dy).sqrt();
    if length == 0.0 {
        return vec![(from, to)];
    }
    let point = |d: f64| (from.0 + dx * d / length, from.1 + dy * d / length);

    let mut segments = Vec::new();
    let mut pos = 0.0;
    let mut i = 0;
    while pos < length {
        let end = (pos + pattern[i % pattern.len()]).min(length);
        if i % 2 == 0 {
            segments.push((point(pos), point(end)));
        }
        pos = end;
        i += 1;
    }
    segments
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Marker {
    #[default]
    Circle,
    Square,
    TriangleUp,
    TriangleDown,
    Cross,
    Plus,
    Point,
}

impl FromStr for Marker {
    type Err = VizError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "o" | "circle" => Ok(Marker::Circle),
            "s" | "square" => Ok(Marker::Square),
            "^" | "triangle_up" => Ok(Marker::TriangleUp),
            "v" | "triangle_down" => Ok(Marker::TriangleDown),
            "x" | "cross" => Ok(Marker::Cross),
            "+" | "plus" => Ok(Marker::Plus),
            "." | "point" => Ok(Marker::Point),
            other => Err(VizError::UnknownMarker(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Time along x, one row per location along y
    #[default]
    Horizontal,
    /// Time along y
    Vertical,
}

impl FromStr for Orientation {
    type Err = VizError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "horizontal" => Ok(Orientation::Horizontal),
            "vertical" => Ok(Orientation::Vertical),
            other => Err(VizError::InvalidParameter(format!(
                "Orientation must be 'horizontal' or 'vertical', got '{}'",
                other
            ))),
        }
    }
}

/// Canvas geometry shared by every figure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureStyle {
    pub width: u32,
    pub height: u32,
    /// Converts marker areas given in points² into pixels
    pub dpi: f64,
    pub background: String,
    /// Draw titles, captions, axis labels and colour-bar ticks.
    /// Without annotations nothing needs a font.
    pub annotate: bool,
}

impl Default for FigureStyle {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            dpi: 100.0,
            background: "white".to_string(),
            annotate: true,
        }
    }
}

impl FigureStyle {
    pub fn background_color(&self) -> Result<RGBColor> {
        parse_color(&self.background)
    }

    /// Pixel radius of a marker whose area is `size` points²
    pub fn marker_radius(&self, size: f64) -> f64 {
        if size <= 0.0 {
            return 0.0;
        }
        0.5 * size.sqrt() * self.dpi / 72.0
    }

    pub fn validate(&self) -> Result<()> {
        if self.width < 16 || self.height < 16 {
            return Err(VizError::InvalidParameter(format!(
                "Figure size {}x{} is too small",
                self.width, self.height
            )));
        }
        if !(self.dpi > 0.0) {
            return Err(VizError::InvalidParameter(format!("Invalid dpi {}", self.dpi)));
        }
        self.background_color().map(|_| ())
    }
}

//! Named colormaps
//!
//! Each map is a list of colour stops sampled by linear interpolation. Appending
//! `_r` to any name reverses it (`RdBu_r` runs blue to red).

use plotters::style::RGBColor;

use crate::error::{Result, VizError};

#[derive(Clone, Copy)]
struct ColorStop {
    at: f64,
    color: RGBColor,
}

const fn stop(at: f64, r: u8, g: u8, b: u8) -> ColorStop {
    ColorStop {
        at,
        color: RGBColor(r, g, b),
    }
}

// ColorBrewer 11-class RdBu
const RDBU: [ColorStop; 11] = [
    stop(0.0, 103, 0, 31),
    stop(0.1, 178, 24, 43),
    stop(0.2, 214, 96, 77),
    stop(0.3, 244, 165, 130),
    stop(0.4, 253, 219, 199),
    stop(0.5, 247, 247, 247),
    stop(0.6, 209, 229, 240),
    stop(0.7, 146, 197, 222),
    stop(0.8, 67, 147, 195),
    stop(0.9, 33, 102, 172),
    stop(1.0, 5, 48, 97),
];

const COOLWARM: [ColorStop; 3] = [
    stop(0.0, 59, 76, 192),
    stop(0.5, 221, 221, 221),
    stop(1.0, 180, 4, 38),
];

const BWR: [ColorStop; 3] = [
    stop(0.0, 0, 0, 255),
    stop(0.5, 255, 255, 255),
    stop(1.0, 255, 0, 0),
];

const SEISMIC: [ColorStop; 5] = [
    stop(0.0, 0, 0, 76),
    stop(0.25, 0, 0, 255),
    stop(0.5, 255, 255, 255),
    stop(0.75, 255, 0, 0),
    stop(1.0, 127, 0, 0),
];

const VIRIDIS: [ColorStop; 5] = [
    stop(0.0, 68, 1, 84),
    stop(0.25, 59, 82, 139),
    stop(0.5, 33, 145, 140),
    stop(0.75, 94, 201, 98),
    stop(1.0, 253, 231, 37),
];

const GRAY: [ColorStop; 2] = [stop(0.0, 0, 0, 0), stop(1.0, 255, 255, 255)];

const HOT: [ColorStop; 4] = [
    stop(0.0, 10, 0, 0),
    stop(0.375, 255, 0, 0),
    stop(0.75, 255, 255, 0),
    stop(1.0, 255, 255, 255),
];

const REGISTRY: &[(&str, &[ColorStop])] = &[
    ("RdBu", &RDBU),
    ("coolwarm", &COOLWARM),
    ("bwr", &BWR),
    ("seismic", &SEISMIC),
    ("viridis", &VIRIDIS),
    ("gray", &GRAY),
    ("hot", &HOT),
];

/// Alternate spellings accepted by [`Colormap::by_name`] but not listed
const ALIASES: &[(&str, &str)] = &[("grey", "gray")];

/// Colour used for masked (NaN) cells
pub const BAD_COLOR: RGBColor = RGBColor(255, 255, 255);

#[derive(Clone)]
pub struct Colormap {
    name: String,
    stops: &'static [ColorStop],
    reversed: bool,
}

impl std::fmt::Debug for Colormap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Colormap")
            .field("name", &self.name)
            .field("stops", &self.stops.len())
            .finish()
    }
}

impl Colormap {
    pub fn by_name(name: &str) -> Result<Self> {
        let (base, reversed) = match name.strip_suffix("_r") {
            Some(base) => (base, true),
            None => (name, false),
        };
        let base = ALIASES
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(base))
            .map_or(base, |(_, target)| *target);
        let stops = REGISTRY
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(base))
            .map(|(_, stops)| *stops)
            .ok_or_else(|| VizError::UnknownColormap(name.to_string()))?;

        Ok(Self {
            name: name.to_string(),
            stops,
            reversed,
        })
    }

    /// Base names; every one also has a reversed `_r` form
    pub fn available() -> Vec<&'static str> {
        REGISTRY.iter().map(|(n, _)| *n).collect()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Colour for a normalized value; out-of-range values saturate, NaN is [`BAD_COLOR`]
    pub fn map(&self, value: f64) -> RGBColor {
        if value.is_nan() {
            return BAD_COLOR;
        }
        let t = value.clamp(0.0, 1.0);
        let t = if self.reversed { 1.0 - t } else { t };
        sample_gradient(self.stops, t)
    }
}

fn lerp(a: RGBColor, b: RGBColor, t: f64) -> RGBColor {
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round() as u8;
    RGBColor(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

fn sample_gradient(stops: &[ColorStop], value: f64) -> RGBColor {
    match stops {
        [] => BAD_COLOR,
        [only] => only.color,
        [first, ..] if value <= first.at => first.color,
        _ => {
            for window in stops.windows(2) {
                let (start, end) = (window[0], window[1]);
                if value <= end.at {
                    let span = (end.at - start.at).max(f64::EPSILON);
                    let t = ((value - start.at) / span).clamp(0.0, 1.0);
                    return lerp(start.color, end.color, t);
                }
            }
            stops[stops.len() - 1].color
        }
    }
}

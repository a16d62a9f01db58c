//! plotters glue: drawing figures into RGB buffers and image files

use std::ops::Range;
use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::error::Result;
use crate::style::FigureStyle;

/// Something that can draw itself onto a plotters drawing area.
///
/// The area has already been cleared to the figure background.
pub trait Figure {
    fn draw<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, Shift>,
        style: &FigureStyle,
    ) -> Result<()>;
}

/// Render into a packed RGB24 buffer (`width * height * 3` bytes, row-major)
pub fn render_rgb<F: Figure>(figure: &F, style: &FigureStyle) -> Result<Vec<u8>> {
    style.validate()?;
    let background = style.background_color()?;
    let mut buffer = vec![0u8; style.width as usize * style.height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&background)?;
        figure.draw(&root, style)?;
        root.present()?;
    }
    Ok(buffer)
}

/// Render to an image file; `.svg` selects the SVG backend, anything else a bitmap
pub fn save_figure<F: Figure>(figure: &F, path: &Path, style: &FigureStyle) -> Result<()> {
    style.validate()?;
    let background = style.background_color()?;
    ensure_parent_dir(path)?;

    let is_svg = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("svg"))
        .unwrap_or(false);

    if is_svg {
        let root = SVGBackend::new(path, (style.width, style.height)).into_drawing_area();
        root.fill(&background)?;
        figure.draw(&root, style)?;
        root.present()?;
    } else {
        let root = BitMapBackend::new(path, (style.width, style.height)).into_drawing_area();
        root.fill(&background)?;
        figure.draw(&root, style)?;
        root.present()?;
    }

    log::info!("Wrote figure to {}", path.display());
    Ok(())
}

pub(crate) fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Colour of pixel (x, y) in a buffer produced by [`render_rgb`]
pub fn pixel_at(buffer: &[u8], width: u32, x: u32, y: u32) -> Option<RGBColor> {
    let idx = (y as usize * width as usize + x as usize) * 3;
    buffer
        .get(idx..idx + 3)
        .map(|px| RGBColor(px[0], px[1], px[2]))
}

/// Data range `[lo, hi]` widened by `margin` of its span on both sides.
/// Degenerate ranges are opened up to a unit-wide window.
pub(crate) fn padded_range(lo: f64, hi: f64, margin: f64) -> Range<f64> {
    if !lo.is_finite() || !hi.is_finite() || lo > hi {
        return 0.0..1.0;
    }
    let span = hi - lo;
    if span == 0.0 {
        return (lo - 0.5)..(hi + 0.5);
    }
    (lo - span * margin)..(hi + span * margin)
}

/// Text style for titles and captions
pub(crate) fn title_font(size: u32) -> TextStyle<'static> {
    ("sans-serif", size).into_font().color(&BLACK)
}

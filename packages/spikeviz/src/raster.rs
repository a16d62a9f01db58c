//! Raster (event) plots: one row of tick marks per spike train

use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VizError};
use crate::render::{self, padded_range, title_font, Figure};
use crate::style::{dash_segments, parse_color, FigureStyle, LineStyle, Orientation};
use crate::units::{SpikeTrain, Unit};

/// A scalar applied to every row, or one value per row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> From<T> for OneOrMany<T> {
    fn from(value: T) -> Self {
        OneOrMany::One(value)
    }
}

impl<T: Clone> OneOrMany<T> {
    /// Expand to exactly `rows` values
    pub fn broadcast(&self, rows: usize, what: &str) -> Result<Vec<T>> {
        match self {
            OneOrMany::One(value) => Ok(vec![value.clone(); rows]),
            OneOrMany::Many(values) if values.len() == rows => Ok(values.clone()),
            OneOrMany::Many(values) => Err(VizError::ShapeMismatch(format!(
                "{} {} given for {} rows",
                values.len(),
                what,
                rows
            ))),
        }
    }
}

/// Row centres. A scalar offset `o` with several rows becomes `0, o, 2o, ...`;
/// a single row keeps `o` itself.
pub fn resolve_offsets(offsets: &OneOrMany<f64>, rows: usize) -> Result<Vec<f64>> {
    match offsets {
        OneOrMany::One(o) if rows > 1 => Ok((0..rows).map(|i| i as f64 * o).collect()),
        other => other.broadcast(rows, "line offsets"),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterOptions {
    pub title: Option<String>,
    pub xlabel: String,
    pub ylabel: String,
    pub orientation: Orientation,
    pub lineoffsets: OneOrMany<f64>,
    pub linelengths: OneOrMany<f64>,
    /// Pixels
    pub linewidths: OneOrMany<f64>,
    pub colors: OneOrMany<String>,
    pub linestyles: OneOrMany<String>,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            title: None,
            xlabel: "Time".to_string(),
            ylabel: "Neuron".to_string(),
            orientation: Orientation::Horizontal,
            lineoffsets: OneOrMany::One(1.0),
            linelengths: OneOrMany::One(0.5),
            linewidths: OneOrMany::One(1.5),
            colors: OneOrMany::One("C0".to_string()),
            linestyles: OneOrMany::One("solid".to_string()),
        }
    }
}

/// One train's tick marks, fully resolved
#[derive(Debug, Clone, PartialEq)]
pub struct EventRow {
    /// Event times in the figure's unit
    pub positions: Vec<f64>,
    pub offset: f64,
    pub length: f64,
    pub width: f64,
    pub color: RGBColor,
    pub style: LineStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RasterFigure {
    rows: Vec<EventRow>,
    title: Option<String>,
    xlabel: String,
    ylabel: String,
    orientation: Orientation,
    unit: Unit,
}

/// Lay out `trains` as an event plot.
///
/// All times are converted to the first train's unit.
pub fn raster_plot(trains: &[SpikeTrain], options: &RasterOptions) -> Result<RasterFigure> {
    let rows = trains.len();
    let unit = trains.first().map(|t| t.unit).unwrap_or_default();

    let offsets = resolve_offsets(&options.lineoffsets, rows)?;
    let lengths = options.linelengths.broadcast(rows, "line lengths")?;
    let widths = options.linewidths.broadcast(rows, "line widths")?;
    let colors = options.colors.broadcast(rows, "colors")?;
    let styles = options.linestyles.broadcast(rows, "line styles")?;

    let mut event_rows = Vec::with_capacity(rows);
    for (i, train) in trains.iter().enumerate() {
        if !lengths[i].is_finite() || lengths[i] < 0.0 {
            return Err(VizError::InvalidParameter(format!(
                "line length {} in row {}",
                lengths[i], i
            )));
        }
        if !(widths[i] > 0.0) || !widths[i].is_finite() {
            return Err(VizError::InvalidParameter(format!(
                "line width {} in row {}",
                widths[i], i
            )));
        }
        event_rows.push(EventRow {
            positions: train.times_in(unit)?,
            offset: offsets[i],
            length: lengths[i],
            width: widths[i],
            color: parse_color(&colors[i])?,
            style: styles[i].parse()?,
        });
    }

    log::debug!(
        "Raster plot with {} rows, {} events",
        rows,
        event_rows.iter().map(|r| r.positions.len()).sum::<usize>()
    );

    Ok(RasterFigure {
        rows: event_rows,
        title: options.title.clone(),
        xlabel: options.xlabel.clone(),
        ylabel: options.ylabel.clone(),
        orientation: options.orientation,
        unit,
    })
}

impl RasterFigure {
    pub fn rows(&self) -> &[EventRow] {
        &self.rows
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Earliest and latest event over all rows
    pub fn time_range(&self) -> Option<(f64, f64)> {
        self.rows
            .iter()
            .flat_map(|r| r.positions.iter().copied())
            .filter(|t| t.is_finite())
            .fold(None, |acc, t| match acc {
                None => Some((t, t)),
                Some((lo, hi)) => Some((lo.min(t), hi.max(t))),
            })
    }

    /// Extent covered by the tick marks across rows
    pub fn offset_range(&self) -> Option<(f64, f64)> {
        self.rows
            .iter()
            .map(|r| (r.offset - r.length / 2.0, r.offset + r.length / 2.0))
            .fold(None, |acc, (lo, hi)| match acc {
                None => Some((lo, hi)),
                Some((a, b)) => Some((a.min(lo), b.max(hi))),
            })
    }

    pub fn save(&self, path: &Path, style: &FigureStyle) -> Result<()> {
        render::save_figure(self, path, style)
    }

    pub fn render_rgb(&self, style: &FigureStyle) -> Result<Vec<u8>> {
        render::render_rgb(self, style)
    }
}

impl Figure for RasterFigure {
    fn draw<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, Shift>,
        style: &FigureStyle,
    ) -> Result<()> {
        let time = self
            .time_range()
            .map(|(lo, hi)| padded_range(lo, hi, 0.05))
            .unwrap_or(0.0..1.0);
        let offset = self
            .offset_range()
            .map(|(lo, hi)| padded_range(lo, hi, 0.05))
            .unwrap_or(0.0..1.0);

        let horizontal = self.orientation == Orientation::Horizontal;
        let (x_range, y_range) = if horizontal {
            (time, offset.clone())
        } else {
            (offset.clone(), time)
        };

        let mut builder = ChartBuilder::on(area);
        if style.annotate {
            builder.margin(10).x_label_area_size(35).y_label_area_size(45);
            if let Some(title) = &self.title {
                builder.caption(title, title_font(18));
            }
        }
        let mut chart = builder.build_cartesian_2d(x_range, y_range)?;
        if style.annotate {
            chart
                .configure_mesh()
                .disable_mesh()
                .x_desc(self.xlabel.as_str())
                .y_desc(self.ylabel.as_str())
                .draw()?;
        }

        // Dash patterns are in line widths; convert pixels to offset-axis units
        let (plot_w, plot_h) = chart.plotting_area().dim_in_pixel();
        let offset_px = if horizontal { plot_h } else { plot_w }.max(1) as f64;
        let units_per_px = (offset.end - offset.start) / offset_px;

        let place = |t: f64, o: f64| if horizontal { (t, o) } else { (o, t) };

        for row in &self.rows {
            let pattern: Option<Vec<f64>> = row
                .style
                .dash_pattern()
                .map(|p| p.iter().map(|d| d * row.width * units_per_px).collect());
            let stroke = row.color.stroke_width(row.width.round().max(1.0) as u32);
            let half = row.length / 2.0;

            let segments = row.positions.iter().flat_map(|&t| {
                dash_segments(
                    (t, row.offset - half),
                    (t, row.offset + half),
                    pattern.as_deref(),
                )
            });
            chart.draw_series(segments.map(|((t0, o0), (t1, o1))| {
                PathElement::new(vec![place(t0, o0), place(t1, o1)], stroke)
            }))?;
        }
        Ok(())
    }
}

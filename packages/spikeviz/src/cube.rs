//! Animated heatmap of a (time x X x Y) field cube
//!
//! Each frame shows one leading-axis slice through a diverging colormap whose
//! centre is pinned at zero, with a caption holding the frame index or the
//! elapsed time.

use ndarray::{Array2, Array3, Axis};
use plotters::coord::Shift;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};

use crate::animation::{elapsed_caption, frame_caption, FrameSource, Playback};
use crate::colormap::Colormap;
use crate::error::{Result, VizError};
use crate::export::{self, ExportOptions};
use crate::normalize::MidpointScaler;
use crate::render::title_font;
use crate::style::FigureStyle;
use crate::units::{Quantity, Unit};

/// Number of bands drawn in the colour bar
const COLORBAR_STEPS: usize = 128;

/// Dense field values indexed (time, x, y)
#[derive(Debug, Clone, PartialEq)]
pub struct FieldCube {
    data: Array3<f64>,
    dt: Option<Quantity>,
    unit: Option<Unit>,
}

impl FieldCube {
    pub fn new(data: Array3<f64>) -> Self {
        Self {
            data,
            dt: None,
            unit: None,
        }
    }

    /// Build from `frames[t][x][y]`, rejecting ragged input
    pub fn from_nested(frames: Vec<Vec<Vec<f64>>>) -> Result<Self> {
        let nt = frames.len();
        let nx = frames.first().map(|f| f.len()).unwrap_or(0);
        let ny = frames
            .first()
            .and_then(|f| f.first())
            .map(|r| r.len())
            .unwrap_or(0);

        let mut flat = Vec::with_capacity(nt * nx * ny);
        for (t, frame) in frames.into_iter().enumerate() {
            if frame.len() != nx {
                return Err(VizError::ShapeMismatch(format!(
                    "frame {} has {} rows, expected {}",
                    t,
                    frame.len(),
                    nx
                )));
            }
            for (x, row) in frame.into_iter().enumerate() {
                if row.len() != ny {
                    return Err(VizError::ShapeMismatch(format!(
                        "frame {} row {} has {} columns, expected {}",
                        t,
                        x,
                        row.len(),
                        ny
                    )));
                }
                flat.extend(row);
            }
        }

        Array3::from_shape_vec((nt, nx, ny), flat)
            .map(Self::new)
            .map_err(|e| VizError::ShapeMismatch(e.to_string()))
    }

    pub fn with_dt(mut self, dt: Quantity) -> Self {
        self.dt = Some(dt);
        self
    }

    /// Unit of the field values (colour bar label)
    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    pub fn data(&self) -> &Array3<f64> {
        &self.data
    }

    pub fn dt(&self) -> Option<&Quantity> {
        self.dt.as_ref()
    }

    pub fn unit(&self) -> Option<Unit> {
        self.unit
    }

    /// (frames, x, y)
    pub fn shape(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Smallest and largest finite value, ignoring NaN and infinities
    pub fn finite_range(&self) -> Option<(f64, f64)> {
        self.data
            .iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CubeOptions {
    pub title: Option<String>,
    /// Overrides the cube's own time step
    pub dt: Option<Quantity>,
    pub vmin: Option<f64>,
    pub vmax: Option<f64>,
    pub cmap: String,
    pub playback: Playback,
    /// Write the animation before returning
    pub export: Option<ExportOptions>,
    pub figure: FigureStyle,
}

impl Default for CubeOptions {
    fn default() -> Self {
        Self {
            title: None,
            dt: None,
            vmin: None,
            vmax: None,
            cmap: "RdBu_r".to_string(),
            playback: Playback::with_interval(50, 1000),
            export: None,
            figure: FigureStyle::default(),
        }
    }
}

/// State shown for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct CubeFrame {
    /// `None` for the seed image shown before playback
    pub index: Option<usize>,
    pub data: Array2<f64>,
    pub caption: String,
}

#[derive(Debug, Clone)]
pub struct CubeAnimation {
    cube: FieldCube,
    scaler: MidpointScaler,
    cmap: Colormap,
    dt: Option<Quantity>,
    title: Option<String>,
    playback: Playback,
    figure: FigureStyle,
}

/// Build a cube animation and, when requested, export it
pub fn animate_cube(cube: FieldCube, options: &CubeOptions) -> Result<CubeAnimation> {
    let animation = CubeAnimation::new(cube, options)?;
    if let Some(export_options) = &options.export {
        export::save(&animation, export_options)?;
    }
    Ok(animation)
}

impl CubeAnimation {
    pub fn new(cube: FieldCube, options: &CubeOptions) -> Result<Self> {
        let (nt, nx, ny) = cube.shape();
        if nt == 0 || nx == 0 || ny == 0 {
            return Err(VizError::ShapeMismatch(format!(
                "cube must have at least one frame and one cell, got {}x{}x{}",
                nt, nx, ny
            )));
        }
        options.playback.validate()?;
        options.figure.validate()?;

        let observed = cube.finite_range();
        let vmin = options.vmin.or(observed.map(|(lo, _)| lo));
        let vmax = options.vmax.or(observed.map(|(_, hi)| hi));
        let (vmin, vmax) = match (vmin, vmax) {
            (Some(lo), Some(hi)) => (lo, hi),
            (lo, hi) => {
                return Err(VizError::InvalidRange {
                    min: lo.unwrap_or(f64::NAN),
                    max: hi.unwrap_or(f64::NAN),
                })
            }
        };

        let scaler = MidpointScaler::new(vmin, 0.0, vmax)?;
        let cmap = Colormap::by_name(&options.cmap)?;
        let dt = options.dt.or(cube.dt);

        log::info!(
            "Animating cube {}x{}x{} (colour range [{}, {}], cmap {})",
            nt,
            nx,
            ny,
            vmin,
            vmax,
            cmap.name()
        );

        Ok(Self {
            cube,
            scaler,
            cmap,
            dt,
            title: options.title.clone(),
            playback: options.playback,
            figure: options.figure.clone(),
        })
    }

    pub fn scaler(&self) -> &MidpointScaler {
        &self.scaler
    }

    pub fn colormap(&self) -> &Colormap {
        &self.cmap
    }

    pub fn dt(&self) -> Option<&Quantity> {
        self.dt.as_ref()
    }

    pub fn cube(&self) -> &FieldCube {
        &self.cube
    }

    fn slice(&self, index: usize) -> Result<Array2<f64>> {
        let count = self.frame_count();
        if index >= count {
            return Err(VizError::InvalidParameter(format!(
                "frame {} out of range for {} frames",
                index, count
            )));
        }
        Ok(self.cube.data.index_axis(Axis(0), index).to_owned())
    }

    fn draw_colorbar<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> Result<()> {
        let (lo, hi) = (self.scaler.vmin(), self.scaler.vmax());
        let (lo, hi) = if hi > lo { (lo, hi) } else { (lo - 0.5, hi + 0.5) };
        let annotate = self.figure.annotate;

        let mut builder = ChartBuilder::on(area);
        if annotate {
            builder.margin(10).margin_right(5).right_y_label_area_size(45);
        }
        let mut chart = builder.build_cartesian_2d(0f64..1f64, lo..hi)?;

        let step = (hi - lo) / COLORBAR_STEPS as f64;
        chart.draw_series((0..COLORBAR_STEPS).map(|k| {
            let y0 = lo + k as f64 * step;
            let value = y0 + 0.5 * step;
            let color = self.cmap.map(self.scaler.scale(value));
            Rectangle::new([(0.0, y0), (1.0, y0 + step)], color.filled())
        }))?;

        if annotate {
            let tick_label = |v: &f64| format!("{:.2}", v);
            let mut mesh = chart.configure_mesh();
            mesh.disable_mesh()
                .disable_x_axis()
                .y_label_formatter(&tick_label);
            if let Some(unit) = self.cube.unit {
                mesh.y_desc(unit.symbol());
            }
            mesh.draw()?;
        }
        Ok(())
    }
}

impl FrameSource for CubeAnimation {
    type Frame = CubeFrame;

    fn frame_count(&self) -> usize {
        self.cube.data.len_of(Axis(0))
    }

    fn initial_frame(&self) -> Result<CubeFrame> {
        Ok(CubeFrame {
            index: None,
            data: self.slice(0)?,
            caption: String::new(),
        })
    }

    fn frame(&self, index: usize) -> Result<CubeFrame> {
        let caption = match &self.dt {
            Some(dt) => elapsed_caption(index, dt),
            None => frame_caption(index),
        };
        Ok(CubeFrame {
            index: Some(index),
            data: self.slice(index)?,
            caption,
        })
    }

    fn caption<'f>(&self, frame: &'f CubeFrame) -> &'f str {
        &frame.caption
    }

    fn draw_frame<DB: DrawingBackend>(
        &self,
        frame: &CubeFrame,
        area: &DrawingArea<DB, Shift>,
    ) -> Result<()> {
        let annotate = self.figure.annotate;
        let area = if annotate {
            area.titled(&frame.caption, title_font(18))?
        } else {
            area.clone()
        };

        let (width, _) = area.dim_in_pixel();
        let bar_width = if annotate { 90 } else { (width / 10).max(8) };
        let (plot_area, bar_area) = area.split_horizontally(width.saturating_sub(bar_width));

        let (nx, ny) = frame.data.dim();
        let mut builder = ChartBuilder::on(&plot_area);
        if annotate {
            builder.margin(10).x_label_area_size(30).y_label_area_size(40);
            if let Some(title) = &self.title {
                builder.caption(title, title_font(16));
            }
        }
        let mut chart = builder.build_cartesian_2d(0f64..ny as f64, 0f64..nx as f64)?;
        if annotate {
            chart.configure_mesh().disable_mesh().draw()?;
        }

        // Row 0 at the bottom (image origin in the lower-left corner)
        chart.draw_series(frame.data.indexed_iter().map(|((m, n), &value)| {
            let color = self.cmap.map(self.scaler.scale(value));
            Rectangle::new(
                [(n as f64, m as f64), (n as f64 + 1.0, m as f64 + 1.0)],
                color.filled(),
            )
        }))?;

        self.draw_colorbar(&bar_area)
    }

    fn playback(&self) -> &Playback {
        &self.playback
    }

    fn figure(&self) -> &FigureStyle {
        &self.figure
    }
}

//! Spike activity on a spatial grid, animated as a pulsing scatter plot
//!
//! Spike times of every (x, y) cell are binned into an occupancy cube
//! (time x X x Y) by rounding `t / dt`. A marker is drawn at the cell's grid
//! position only on frames whose bin received a spike.

use std::str::FromStr;

use ndarray::{Array3, Axis};
use plotters::coord::Shift;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};

use crate::animation::{elapsed_caption, FrameSource, Playback};
use crate::error::{Result, VizError};
use crate::export::{self, ExportOptions};
use crate::render::{padded_range, title_font};
use crate::style::{parse_color, FigureStyle, Marker};
use crate::units::{Quantity, QuantityArray, SpikeTrain, Unit};

/// Spike trains on an Nx x Ny grid, stored row-major
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityTable {
    nx: usize,
    ny: usize,
    cells: Vec<SpikeTrain>,
}

impl ActivityTable {
    pub fn new(nx: usize, ny: usize, cells: Vec<SpikeTrain>) -> Result<Self> {
        if cells.len() != nx * ny {
            return Err(VizError::ShapeMismatch(format!(
                "{} cells cannot fill a {}x{} grid",
                cells.len(),
                nx,
                ny
            )));
        }
        Ok(Self { nx, ny, cells })
    }

    /// Build from `rows[x][y]`, rejecting ragged input
    pub fn from_rows(rows: Vec<Vec<SpikeTrain>>) -> Result<Self> {
        let nx = rows.len();
        let ny = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut cells = Vec::with_capacity(nx * ny);
        for (m, row) in rows.into_iter().enumerate() {
            if row.len() != ny {
                return Err(VizError::ShapeMismatch(format!(
                    "row {} has {} cells, expected {}",
                    m,
                    row.len(),
                    ny
                )));
            }
            cells.extend(row);
        }
        Self::new(nx, ny, cells)
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    pub fn cell(&self, m: usize, n: usize) -> Option<&SpikeTrain> {
        if m < self.nx && n < self.ny {
            self.cells.get(m * self.ny + n)
        } else {
            None
        }
    }

    pub fn spike_count(&self) -> usize {
        self.cells.iter().map(|c| c.len()).sum()
    }
}

/// What to do with a spike whose rounded bin lies outside the sample range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutOfRangePolicy {
    /// Fail with [`VizError::IndexOutOfRange`]
    #[default]
    Reject,
    /// Move the spike to the first or last bin
    Clip,
    /// Skip the spike
    Drop,
}

impl FromStr for OutOfRangePolicy {
    type Err = VizError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "reject" => Ok(Self::Reject),
            "clip" => Ok(Self::Clip),
            "drop" => Ok(Self::Drop),
            other => Err(VizError::InvalidParameter(format!(
                "Out-of-range policy must be reject, clip or drop, got '{}'",
                other
            ))),
        }
    }
}

/// Sampling step, taken from the first two sample times
pub fn time_step(times: &QuantityArray) -> Result<Quantity> {
    if times.len() < 2 {
        return Err(VizError::ShapeMismatch(format!(
            "at least two sample times are needed to derive a time step, got {}",
            times.len()
        )));
    }
    let dt = times.values[1] - times.values[0];
    if !(dt > 0.0) || !dt.is_finite() {
        return Err(VizError::InvalidParameter(format!(
            "sample times must be increasing, got step {}",
            dt
        )));
    }
    Ok(Quantity::new(dt, times.unit))
}

/// Nearest bin of `timestamp`; exact halves round to the even bin (1.5 -> 2, 2.5 -> 2)
pub fn spike_bin(timestamp: f64, dt: f64) -> i64 {
    (timestamp / dt).round_ties_even() as i64
}

/// Bin every spike of `table` onto the sample grid.
///
/// `occupancy[bin, m, n] = marker_size` for each spike of cell (m, n); spikes
/// sharing a bin overwrite each other.
pub fn occupancy_cube(
    table: &ActivityTable,
    times: &QuantityArray,
    marker_size: f64,
    policy: OutOfRangePolicy,
) -> Result<Array3<f64>> {
    let dt = time_step(times)?;
    let nt = times.len();
    let (nx, ny) = table.shape();
    let mut cube = Array3::zeros((nt, nx, ny));
    let mut dropped = 0usize;

    for m in 0..nx {
        for n in 0..ny {
            let Some(train) = table.cell(m, n) else {
                continue;
            };
            for t in train.times_in(dt.unit)? {
                if !t.is_finite() {
                    return Err(VizError::InvalidParameter(format!(
                        "non-finite spike time in cell ({}, {})",
                        m, n
                    )));
                }
                let bin = spike_bin(t, dt.value);
                let index = if bin >= 0 && (bin as usize) < nt {
                    bin as usize
                } else {
                    match policy {
                        OutOfRangePolicy::Reject => {
                            return Err(VizError::IndexOutOfRange {
                                row: m,
                                col: n,
                                timestamp: t,
                                bin,
                                len: nt,
                            })
                        }
                        OutOfRangePolicy::Clip => bin.clamp(0, nt as i64 - 1) as usize,
                        OutOfRangePolicy::Drop => {
                            dropped += 1;
                            continue;
                        }
                    }
                };
                cube[[index, m, n]] = marker_size;
            }
        }
    }

    if dropped > 0 {
        log::debug!("Dropped {} spikes outside the {} sample bins", dropped, nt);
    }
    Ok(cube)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityOptions {
    pub title: Option<String>,
    pub marker: String,
    /// Marker area in points²
    pub marker_size: f64,
    pub marker_color: String,
    pub out_of_range: OutOfRangePolicy,
    pub playback: Playback,
    pub export: Option<ExportOptions>,
    pub figure: FigureStyle,
}

impl Default for ActivityOptions {
    fn default() -> Self {
        Self {
            title: None,
            marker: "o".to_string(),
            marker_size: 10.0,
            marker_color: "C0".to_string(),
            out_of_range: OutOfRangePolicy::default(),
            playback: Playback::with_interval(100, 1000),
            export: None,
            figure: FigureStyle::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActivityFrame {
    pub index: Option<usize>,
    /// Marker size per grid point, row-major (matches [`ActivityAnimation::coordinates`])
    pub sizes: Vec<f64>,
    pub caption: String,
}

#[derive(Debug, Clone)]
pub struct ActivityAnimation {
    occupancy: Array3<f64>,
    dt: Quantity,
    positions: Vec<f64>,
    position_unit: Unit,
    marker: Marker,
    color: RGBColor,
    title: Option<String>,
    playback: Playback,
    figure: FigureStyle,
}

/// Build a spike-activity animation and, when requested, export it
pub fn animate_spike_activity(
    table: &ActivityTable,
    times: &QuantityArray,
    positions: &QuantityArray,
    options: &ActivityOptions,
) -> Result<ActivityAnimation> {
    let animation = ActivityAnimation::new(table, times, positions, options)?;
    if let Some(export_options) = &options.export {
        export::save(&animation, export_options)?;
    }
    Ok(animation)
}

impl ActivityAnimation {
    pub fn new(
        table: &ActivityTable,
        times: &QuantityArray,
        positions: &QuantityArray,
        options: &ActivityOptions,
    ) -> Result<Self> {
        options.playback.validate()?;
        options.figure.validate()?;

        let (nx, ny) = table.shape();
        if positions.len() != nx || positions.len() != ny {
            return Err(VizError::ShapeMismatch(format!(
                "{} positions cannot span a {}x{} grid",
                positions.len(),
                nx,
                ny
            )));
        }
        if !options.marker_size.is_finite() || options.marker_size < 0.0 {
            return Err(VizError::InvalidParameter(format!(
                "marker size must be a non-negative number, got {}",
                options.marker_size
            )));
        }
        let marker = options.marker.parse::<Marker>()?;
        let color = parse_color(&options.marker_color)?;

        let dt = time_step(times)?;
        let occupancy = occupancy_cube(table, times, options.marker_size, options.out_of_range)?;

        log::info!(
            "Animating spike activity: {} spikes on a {}x{} grid over {} frames (dt = {})",
            table.spike_count(),
            nx,
            ny,
            times.len(),
            dt
        );

        Ok(Self {
            occupancy,
            dt,
            positions: positions.values.clone(),
            position_unit: positions.unit,
            marker,
            color,
            title: options.title.clone(),
            playback: options.playback,
            figure: options.figure.clone(),
        })
    }

    pub fn occupancy(&self) -> &Array3<f64> {
        &self.occupancy
    }

    pub fn dt(&self) -> &Quantity {
        &self.dt
    }

    /// Grid coordinates `(positions[n], positions[m])`, row-major over (m, n)
    pub fn coordinates(&self) -> Vec<(f64, f64)> {
        self.positions
            .iter()
            .flat_map(|&y| self.positions.iter().map(move |&x| (x, y)))
            .collect()
    }

    fn sizes(&self, index: usize) -> Result<Vec<f64>> {
        let count = self.frame_count();
        if index >= count {
            return Err(VizError::InvalidParameter(format!(
                "frame {} out of range for {} frames",
                index, count
            )));
        }
        Ok(self.occupancy.index_axis(Axis(0), index).iter().copied().collect())
    }
}

impl FrameSource for ActivityAnimation {
    type Frame = ActivityFrame;

    fn frame_count(&self) -> usize {
        self.occupancy.len_of(Axis(0))
    }

    fn initial_frame(&self) -> Result<ActivityFrame> {
        Ok(ActivityFrame {
            index: None,
            sizes: self.sizes(0)?,
            caption: String::new(),
        })
    }

    fn frame(&self, index: usize) -> Result<ActivityFrame> {
        Ok(ActivityFrame {
            index: Some(index),
            sizes: self.sizes(index)?,
            caption: elapsed_caption(index, &self.dt),
        })
    }

    fn caption<'f>(&self, frame: &'f ActivityFrame) -> &'f str {
        &frame.caption
    }

    fn draw_frame<DB: DrawingBackend>(
        &self,
        frame: &ActivityFrame,
        area: &DrawingArea<DB, Shift>,
    ) -> Result<()> {
        let annotate = self.figure.annotate;
        let area = if annotate {
            area.titled(&frame.caption, title_font(18))?
        } else {
            area.clone()
        };

        let lo = self.positions.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = self.positions.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = padded_range(lo, hi, 0.05);

        let mut builder = ChartBuilder::on(&area);
        if annotate {
            builder.margin(10).x_label_area_size(35).y_label_area_size(45);
            if let Some(title) = &self.title {
                builder.caption(title, title_font(16));
            }
        }
        let mut chart = builder.build_cartesian_2d(range.clone(), range)?;
        if annotate {
            chart
                .configure_mesh()
                .disable_mesh()
                .x_desc(format!("x ({})", self.position_unit))
                .y_desc(format!("y ({})", self.position_unit))
                .draw()?;
        }

        let color = self.color;
        let markers = self
            .coordinates()
            .into_iter()
            .zip(frame.sizes.iter().copied())
            .filter(|(_, size)| *size > 0.0)
            .map(|(coord, size)| {
                let radius = self.figure.marker_radius(size).round().max(1.0) as i32;
                (coord, radius)
            });

        match self.marker {
            Marker::Circle => {
                chart.draw_series(markers.map(|(c, r)| Circle::new(c, r, color.filled())))?;
            }
            Marker::Point => {
                chart.draw_series(
                    markers.map(|(c, r)| Circle::new(c, (r / 2).max(1), color.filled())),
                )?;
            }
            Marker::Square => {
                chart.draw_series(markers.map(|(c, r)| {
                    EmptyElement::at(c) + Rectangle::new([(-r, -r), (r, r)], color.filled())
                }))?;
            }
            Marker::TriangleUp => {
                chart.draw_series(
                    markers.map(|(c, r)| TriangleMarker::new(c, r, color.filled())),
                )?;
            }
            Marker::TriangleDown => {
                chart.draw_series(markers.map(|(c, r)| {
                    EmptyElement::at(c)
                        + Polygon::new(vec![(-r, -r / 2), (r, -r / 2), (0, r)], color.filled())
                }))?;
            }
            Marker::Cross => {
                chart.draw_series(
                    markers.map(|(c, r)| Cross::new(c, r, color.stroke_width(2))),
                )?;
            }
            Marker::Plus => {
                chart.draw_series(markers.map(|(c, r)| {
                    EmptyElement::at(c)
                        + PathElement::new(vec![(-r, 0), (r, 0)], color.stroke_width(2))
                        + PathElement::new(vec![(0, -r), (0, r)], color.stroke_width(2))
                }))?;
            }
        }
        Ok(())
    }

    fn playback(&self) -> &Playback {
        &self.playback
    }

    fn figure(&self) -> &FigureStyle {
        &self.figure
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::render_frame_rgb;

    fn train(times: &[f64]) -> SpikeTrain {
        SpikeTrain::new(times.to_vec(), Unit::Millisecond)
    }

    fn ms(values: &[f64]) -> QuantityArray {
        QuantityArray::new(values.to_vec(), Unit::Millisecond)
    }

    fn single_spike_table(t: f64) -> ActivityTable {
        ActivityTable::from_rows(vec![
            vec![train(&[t]), train(&[])],
            vec![train(&[]), train(&[])],
        ])
        .unwrap()
    }

    #[test]
    fn test_single_spike_lands_in_its_bin() {
        let cube = occupancy_cube(
            &single_spike_table(2.0),
            &ms(&[0.0, 1.0, 2.0, 3.0]),
            10.0,
            OutOfRangePolicy::Reject,
        )
        .unwrap();
        assert_eq!(cube.dim(), (4, 2, 2));
        assert_eq!(cube[[2, 0, 0]], 10.0);
        assert_eq!(cube.iter().filter(|v| **v != 0.0).count(), 1);
    }

    #[test]
    fn test_rounding_ties_to_even() {
        assert_eq!(spike_bin(1.5, 1.0), 2);
        assert_eq!(spike_bin(2.5, 1.0), 2);
        assert_eq!(spike_bin(2.6, 1.0), 3);
        assert_eq!(spike_bin(-0.4, 1.0), 0);
    }

    #[test]
    fn test_spike_units_converted_to_dt_unit() {
        let table = ActivityTable::new(1, 1, vec![SpikeTrain::new(vec![0.002], Unit::Second)]).unwrap();
        let cube = occupancy_cube(&table, &ms(&[0.0, 1.0, 2.0]), 5.0, OutOfRangePolicy::Reject).unwrap();
        assert_eq!(cube[[2, 0, 0]], 5.0);
    }

    #[test]
    fn test_incompatible_units() {
        let table = ActivityTable::new(1, 1, vec![SpikeTrain::new(vec![1.0], Unit::Degree)]).unwrap();
        let err = occupancy_cube(&table, &ms(&[0.0, 1.0]), 5.0, OutOfRangePolicy::Reject).unwrap_err();
        assert!(matches!(err, VizError::UnitMismatch { .. }));
    }

    #[test]
    fn test_collisions_overwrite() {
        let table = ActivityTable::new(1, 1, vec![train(&[1.9, 2.0, 2.1])]).unwrap();
        let cube = occupancy_cube(&table, &ms(&[0.0, 1.0, 2.0]), 7.0, OutOfRangePolicy::Reject).unwrap();
        assert_eq!(cube[[2, 0, 0]], 7.0);
        assert_eq!(cube.sum(), 7.0);
    }

    #[test]
    fn test_out_of_range_policies() {
        let table = ActivityTable::new(1, 1, vec![train(&[-3.0, 1.0, 9.0])]).unwrap();
        let times = ms(&[0.0, 1.0, 2.0]);

        let err = occupancy_cube(&table, &times, 1.0, OutOfRangePolicy::Reject).unwrap_err();
        match err {
            VizError::IndexOutOfRange { bin, len, .. } => {
                assert_eq!(bin, -3);
                assert_eq!(len, 3);
            }
            other => panic!("unexpected error {:?}", other),
        }

        let clipped = occupancy_cube(&table, &times, 1.0, OutOfRangePolicy::Clip).unwrap();
        assert_eq!(clipped.iter().copied().collect::<Vec<_>>(), vec![1.0, 1.0, 1.0]);

        let dropped = occupancy_cube(&table, &times, 1.0, OutOfRangePolicy::Drop).unwrap();
        assert_eq!(dropped.iter().copied().collect::<Vec<_>>(), vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_time_step_errors() {
        assert!(matches!(
            time_step(&ms(&[0.0])).unwrap_err(),
            VizError::ShapeMismatch(_)
        ));
        assert!(matches!(
            time_step(&ms(&[1.0, 1.0])).unwrap_err(),
            VizError::InvalidParameter(_)
        ));
        assert_eq!(time_step(&ms(&[0.0, 0.5, 7.0])).unwrap(), Quantity::new(0.5, Unit::Millisecond));
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let err = ActivityTable::from_rows(vec![vec![train(&[])], vec![]]).unwrap_err();
        assert!(matches!(err, VizError::ShapeMismatch(_)));
    }

    #[test]
    fn test_positions_must_match_grid() {
        let err = ActivityAnimation::new(
            &single_spike_table(1.0),
            &ms(&[0.0, 1.0, 2.0]),
            &QuantityArray::new(vec![0.0, 1.0, 2.0], Unit::Degree),
            &ActivityOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, VizError::ShapeMismatch(_)));
    }

    #[test]
    fn test_meshgrid_and_frames() {
        let anim = ActivityAnimation::new(
            &single_spike_table(1.0),
            &ms(&[0.0, 1.0, 2.0]),
            &QuantityArray::new(vec![-1.0, 1.0], Unit::Degree),
            &ActivityOptions::default(),
        )
        .unwrap();

        assert_eq!(
            anim.coordinates(),
            vec![(-1.0, -1.0), (1.0, -1.0), (-1.0, 1.0), (1.0, 1.0)]
        );
        assert_eq!(anim.frame_count(), 3);
        assert_eq!(anim.initial_frame().unwrap().caption, "");

        let frame = anim.frame(1).unwrap();
        assert_eq!(frame.sizes, vec![10.0, 0.0, 0.0, 0.0]);
        assert_eq!(frame.caption, "Time = 1.0 ms");
        assert_eq!(anim.frame(2).unwrap().sizes, vec![0.0; 4]);
    }

    #[test]
    fn test_identical_inputs_give_identical_frames() {
        let build = || {
            ActivityAnimation::new(
                &single_spike_table(2.0),
                &ms(&[0.0, 1.0, 2.0, 3.0]),
                &QuantityArray::new(vec![0.0, 1.0], Unit::Degree),
                &ActivityOptions::default(),
            )
            .unwrap()
        };
        let (a, b) = (build(), build());
        for j in 0..a.frame_count() {
            assert_eq!(a.frame(j).unwrap(), b.frame(j).unwrap());
        }
    }

    #[test]
    fn test_marker_visible_only_on_spike_frame() {
        let options = ActivityOptions {
            marker_size: 400.0,
            figure: FigureStyle {
                width: 100,
                height: 100,
                annotate: false,
                ..FigureStyle::default()
            },
            ..ActivityOptions::default()
        };
        let anim = ActivityAnimation::new(
            &single_spike_table(1.0),
            &ms(&[0.0, 1.0, 2.0]),
            &QuantityArray::new(vec![0.0, 1.0], Unit::Degree),
            &options,
        )
        .unwrap();

        let quiet = render_frame_rgb(&anim, &anim.frame(0).unwrap()).unwrap();
        assert!(quiet.iter().all(|&b| b == 255));

        let active = render_frame_rgb(&anim, &anim.frame(1).unwrap()).unwrap();
        assert!(active.iter().any(|&b| b != 255));
    }

    #[test]
    fn test_every_marker_style_renders() {
        for marker in ["o", ".", "s", "^", "v", "x", "+"] {
            let options = ActivityOptions {
                marker: marker.to_string(),
                marker_size: 100.0,
                figure: FigureStyle {
                    width: 64,
                    height: 64,
                    annotate: false,
                    ..FigureStyle::default()
                },
                ..ActivityOptions::default()
            };
            let anim = ActivityAnimation::new(
                &single_spike_table(0.0),
                &ms(&[0.0, 1.0]),
                &QuantityArray::new(vec![0.0, 1.0], Unit::Degree),
                &options,
            )
            .unwrap();
            let rgb = render_frame_rgb(&anim, &anim.frame(0).unwrap()).unwrap();
            assert!(rgb.iter().any(|&b| b != 255), "marker {} drew nothing", marker);
        }
    }
}

//! Frame-by-frame playback
//!
//! An animation is a [`FrameSource`]: a pure mapping from frame index to
//! frame state plus a way to draw that state. Playback order and timing come
//! from [`advance`], which steps an explicit [`PlaybackState`]; the [`Player`]
//! feeds rendered frames to a [`FrameSink`] (a window, a recorder) until the
//! sink reports it was closed or a loop limit is reached.

use std::time::Duration;

use plotters::coord::Shift;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VizError};
use crate::render::{render_rgb, Figure};
use crate::style::FigureStyle;
use crate::units::Quantity;

/// Frame timing, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Playback {
    /// Delay between consecutive frames
    pub interval_ms: u64,
    /// Start over after the last frame
    pub repeat: bool,
    /// Pause before a repeat starts (replaces the interval for that frame)
    pub repeat_delay_ms: u64,
}

impl Default for Playback {
    fn default() -> Self {
        Self {
            interval_ms: 200,
            repeat: true,
            repeat_delay_ms: 0,
        }
    }
}

impl Playback {
    pub fn with_interval(interval_ms: u64, repeat_delay_ms: u64) -> Self {
        Self {
            interval_ms,
            repeat: true,
            repeat_delay_ms,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval_ms == 0 {
            return Err(VizError::InvalidParameter(
                "Frame interval must be at least 1 ms".to_string(),
            ));
        }
        Ok(())
    }

    /// Frames per second implied by the interval
    pub fn fps(&self) -> f64 {
        1000.0 / self.interval_ms.max(1) as f64
    }
}

/// One scheduled frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub frame: usize,
    /// Wait before showing this frame
    pub delay: Duration,
    /// 0 for the first pass, 1 for the first repeat, ...
    pub pass: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackState {
    pub next_frame: usize,
    pub loops_completed: usize,
    pub finished: bool,
}

/// Step the playback state by one frame.
///
/// Returns the new state and the tick to show, or `None` once a non-repeating
/// animation has run out (or there is nothing to show).
pub fn advance(
    state: PlaybackState,
    frame_count: usize,
    playback: &Playback,
) -> (PlaybackState, Option<Tick>) {
    if state.finished || frame_count == 0 {
        return (state, None);
    }

    let frame = state.next_frame.min(frame_count - 1);
    let delay = if frame == 0 && state.loops_completed > 0 && playback.repeat_delay_ms > 0 {
        Duration::from_millis(playback.repeat_delay_ms)
    } else {
        Duration::from_millis(playback.interval_ms)
    };
    let tick = Tick {
        frame,
        delay,
        pass: state.loops_completed,
    };

    let next = if frame + 1 < frame_count {
        PlaybackState {
            next_frame: frame + 1,
            ..state
        }
    } else {
        PlaybackState {
            next_frame: 0,
            loops_completed: state.loops_completed + 1,
            finished: !playback.repeat,
        }
    };

    (next, Some(tick))
}

/// Endless (when repeating) iterator over the playback ticks
pub struct Schedule {
    state: PlaybackState,
    frame_count: usize,
    playback: Playback,
}

pub fn schedule(frame_count: usize, playback: &Playback) -> Schedule {
    Schedule {
        state: PlaybackState::default(),
        frame_count,
        playback: *playback,
    }
}

impl Iterator for Schedule {
    type Item = Tick;

    fn next(&mut self) -> Option<Tick> {
        let (state, tick) = advance(self.state, self.frame_count, &self.playback);
        self.state = state;
        tick
    }
}

/// An animation: per-frame state derived from immutable input
pub trait FrameSource {
    type Frame;

    fn frame_count(&self) -> usize;

    /// State displayed before playback starts
    fn initial_frame(&self) -> Result<Self::Frame>;

    fn frame(&self, index: usize) -> Result<Self::Frame>;

    fn caption<'f>(&self, frame: &'f Self::Frame) -> &'f str;

    fn draw_frame<DB: DrawingBackend>(
        &self,
        frame: &Self::Frame,
        area: &DrawingArea<DB, Shift>,
    ) -> Result<()>;

    fn playback(&self) -> &Playback;

    fn figure(&self) -> &FigureStyle;
}

struct FrameFigure<'a, S: FrameSource> {
    source: &'a S,
    frame: &'a S::Frame,
}

impl<S: FrameSource> Figure for FrameFigure<'_, S> {
    fn draw<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, Shift>,
        _style: &FigureStyle,
    ) -> Result<()> {
        self.source.draw_frame(self.frame, area)
    }
}

/// Render one frame of `source` into an RGB24 buffer
pub fn render_frame_rgb<S: FrameSource>(source: &S, frame: &S::Frame) -> Result<Vec<u8>> {
    render_rgb(&FrameFigure { source, frame }, source.figure())
}

/// Draw one frame of `source` onto an existing drawing area (already cleared)
pub fn draw_source_frame<S: FrameSource, DB: DrawingBackend>(
    source: &S,
    frame: &S::Frame,
    area: &DrawingArea<DB, Shift>,
) -> Result<()> {
    FrameFigure { source, frame }.draw(area, source.figure())
}

/// A rendered frame handed to a sink
pub struct PresentedFrame<'a> {
    /// `None` for the initial frame shown before playback
    pub index: Option<usize>,
    pub delay: Duration,
    pub caption: &'a str,
    pub width: u32,
    pub height: u32,
    pub rgb: &'a [u8],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkStatus {
    Open,
    Closed,
}

pub trait FrameSink {
    fn present(&mut self, frame: &PresentedFrame<'_>) -> Result<SinkStatus>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackReport {
    pub frames_presented: usize,
    pub loops_completed: usize,
    pub closed_by_sink: bool,
}

/// Drives a [`FrameSource`] into a [`FrameSink`].
///
/// Without a loop limit a repeating animation only stops when the sink closes.
pub struct Player<'a, S: FrameSource> {
    source: &'a S,
    realtime: bool,
    max_loops: Option<usize>,
}

impl<'a, S: FrameSource> Player<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            realtime: false,
            max_loops: None,
        }
    }

    /// Sleep for each tick's delay before presenting it
    pub fn realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    pub fn max_loops(mut self, loops: usize) -> Self {
        self.max_loops = Some(loops);
        self
    }

    pub fn run<K: FrameSink>(&self, sink: &mut K) -> Result<PlaybackReport> {
        let playback = *self.source.playback();
        playback.validate()?;
        let figure = self.source.figure();
        let frame_count = self.source.frame_count();
        let mut report = PlaybackReport::default();

        log::debug!(
            "Starting playback of {} frames every {} ms",
            frame_count,
            playback.interval_ms
        );

        let initial = self.source.initial_frame()?;
        let rgb = render_frame_rgb(self.source, &initial)?;
        let status = sink.present(&PresentedFrame {
            index: None,
            delay: Duration::ZERO,
            caption: self.source.caption(&initial),
            width: figure.width,
            height: figure.height,
            rgb: &rgb,
        })?;
        if status == SinkStatus::Closed {
            report.closed_by_sink = true;
            return Ok(report);
        }

        let mut state = PlaybackState::default();
        loop {
            if let Some(limit) = self.max_loops {
                if state.loops_completed >= limit {
                    break;
                }
            }

            let (next, tick) = advance(state, frame_count, &playback);
            let Some(tick) = tick else {
                break;
            };
            state = next;

            if self.realtime {
                std::thread::sleep(tick.delay);
            }

            let frame = self.source.frame(tick.frame)?;
            let rgb = render_frame_rgb(self.source, &frame)?;
            report.frames_presented += 1;

            let status = sink.present(&PresentedFrame {
                index: Some(tick.frame),
                delay: tick.delay,
                caption: self.source.caption(&frame),
                width: figure.width,
                height: figure.height,
                rgb: &rgb,
            })?;
            if status == SinkStatus::Closed {
                report.closed_by_sink = true;
                break;
            }
        }

        report.loops_completed = state.loops_completed;
        Ok(report)
    }
}

/// `"Frame = j"`
pub fn frame_caption(index: usize) -> String {
    format!("Frame = {}", index)
}

/// `"Time = {j * dt rounded to 2 places} {unit}"`
///
/// Rounds the exact stored value, so 0.015 (stored just below the tie) gives
/// 0.01 and 0.025 (stored just above) gives 0.03.
pub fn elapsed_caption(index: usize, dt: &Quantity) -> String {
    let elapsed = index as f64 * dt.value;
    let rounded = format!("{:.2}", elapsed)
        .parse::<f64>()
        .unwrap_or(elapsed);
    format!("Time = {} {}", float_text(rounded), dt.unit)
}

/// Shortest round-trip text that always shows a decimal point (`2.0`, `0.35`)
pub(crate) fn float_text(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

//! Raster plots, animated field heatmaps and spike-activity animations.
//!
//! - [`raster_plot`] lays out spike trains as an event plot
//! - [`MidpointScaler`] maps data onto a colour scale centred on a chosen value
//! - [`animate_cube`] turns a (time x X x Y) cube into an animated heatmap
//! - [`animate_spike_activity`] bins spikes on a grid and animates them as a scatter plot
//!
//! Animations implement [`FrameSource`]; play them through a [`Player`] into any
//! [`FrameSink`], or write them out with [`export::save`].

pub mod activity;
pub mod animation;
pub mod colormap;
pub mod cube;
pub mod document;
pub mod error;
pub mod export;
pub mod normalize;
pub mod raster;
pub mod render;
pub mod style;
pub mod units;

pub use activity::{
    animate_spike_activity, occupancy_cube, ActivityAnimation, ActivityFrame, ActivityOptions,
    ActivityTable, OutOfRangePolicy,
};
pub use animation::{
    FrameSink, FrameSource, Playback, PlaybackReport, Player, PresentedFrame, SinkStatus,
};
pub use colormap::Colormap;
pub use cube::{animate_cube, CubeAnimation, CubeFrame, CubeOptions, FieldCube};
pub use error::{Result, VizError};
pub use export::{ExportOptions, ExportSummary, Writer};
pub use normalize::MidpointScaler;
pub use raster::{raster_plot, EventRow, OneOrMany, RasterFigure, RasterOptions};
pub use render::Figure;
pub use style::{FigureStyle, LineStyle, Marker, Orientation};
pub use units::{Quantity, QuantityArray, SpikeTrain, Unit};

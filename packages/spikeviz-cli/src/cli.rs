use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use spikeviz::{ExportOptions, FigureStyle, Quantity, Unit};

#[derive(Parser)]
#[command(
    name = "spikeviz",
    version,
    about = "Raster plots and spike/field animations",
    long_about = "Render raster plots of spike trains and animate field cubes or spike activity.\n\
                  Inputs are JSON documents. Video export uses ffmpeg; set $SPIKEVIZ_FFMPEG or use --ffmpeg."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// Draw a raster (event) plot of spike trains
    Raster(RasterArgs),
    /// Animate a (time x X x Y) field cube as a heatmap
    Cube(CubeArgs),
    /// Animate spike activity on a spatial grid
    Activity(ActivityArgs),
    /// List available colormaps
    Colormaps(ColormapsArgs),
    /// Show version and encoder information
    Info(InfoArgs),
}

#[derive(Args)]
pub struct FigureArgs {
    /// Canvas size in pixels, WIDTHxHEIGHT
    #[arg(long, default_value = "640x480", value_parser = parse_size)]
    pub size: (u32, u32),

    /// Resolution used to convert marker areas (points²) to pixels
    #[arg(long, default_value_t = 100.0)]
    pub dpi: f64,

    /// Background colour
    #[arg(long, default_value = "white")]
    pub background: String,

    /// Omit titles, captions, axis labels and colour-bar text
    #[arg(long, default_value_t = false)]
    pub bare: bool,
}

impl FigureArgs {
    pub fn style(&self) -> FigureStyle {
        FigureStyle {
            width: self.size.0,
            height: self.size.1,
            dpi: self.dpi,
            background: self.background.clone(),
            annotate: !self.bare,
        }
    }
}

#[derive(Args)]
pub struct ExportArgs {
    /// Animation writer: ffmpeg, gif (pillow) or frames (png).
    /// Default: picked from the output extension
    #[arg(long)]
    pub writer: Option<String>,

    /// Frames per second (default: 1000 / interval)
    #[arg(long)]
    pub fps: Option<f64>,

    /// Path to the ffmpeg binary
    #[arg(long, env = "SPIKEVIZ_FFMPEG")]
    pub ffmpeg: Option<PathBuf>,
}

impl ExportArgs {
    pub fn options(&self, output: &Path) -> ExportOptions {
        ExportOptions {
            filename: output.to_path_buf(),
            writer: resolve_writer(self.writer.as_deref(), output),
            fps: self.fps,
            ffmpeg: self.ffmpeg.clone(),
        }
    }
}

#[derive(Args)]
pub struct RasterArgs {
    /// Spike trains: [{"times": [...], "unit": "ms"}, ...]
    #[arg(long)]
    pub input: PathBuf,

    /// Output image (.png or .svg)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Time along the y axis
    #[arg(long, default_value_t = false)]
    pub vertical: bool,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long, default_value = "Time")]
    pub xlabel: String,

    #[arg(long, default_value = "Neuron")]
    pub ylabel: String,

    /// Row spacing, or one centre per row
    #[arg(long, num_args = 1.., default_values_t = vec![1.0])]
    pub lineoffset: Vec<f64>,

    /// Tick length in data units, one value or one per row
    #[arg(long, num_args = 1.., default_values_t = vec![0.5])]
    pub linelength: Vec<f64>,

    /// Tick width in pixels, one value or one per row
    #[arg(long, num_args = 1.., default_values_t = vec![1.5])]
    pub linewidth: Vec<f64>,

    /// Tick colour, one value or one per row
    #[arg(long, num_args = 1.., default_values_t = vec!["C0".to_string()])]
    pub color: Vec<String>,

    /// solid, dashed, dotted or dashdot; one value or one per row
    #[arg(long, num_args = 1.., default_values_t = vec!["solid".to_string()])]
    pub linestyle: Vec<String>,

    #[command(flatten)]
    pub figure: FigureArgs,

    /// Suppress progress messages on stderr
    #[arg(long, default_value_t = false)]
    pub quiet: bool,
}

#[derive(Args)]
pub struct CubeArgs {
    /// Field cube: {"data": [[[...]]], "dt": {"value": 0.5, "unit": "ms"}}
    #[arg(long)]
    pub input: PathBuf,

    /// Output animation (.mp4, .gif, or .png for a frame sequence)
    #[arg(short, long)]
    pub output: PathBuf,

    #[arg(long)]
    pub title: Option<String>,

    /// Time step, e.g. "0.5ms" (overrides the document's dt)
    #[arg(long, value_parser = parse_quantity)]
    pub dt: Option<Quantity>,

    /// Lower colour limit (default: data minimum)
    #[arg(long, allow_hyphen_values = true)]
    pub vmin: Option<f64>,

    /// Upper colour limit (default: data maximum)
    #[arg(long, allow_hyphen_values = true)]
    pub vmax: Option<f64>,

    #[arg(long, default_value = "RdBu_r")]
    pub cmap: String,

    /// Delay between frames in milliseconds
    #[arg(long, default_value_t = 50)]
    pub interval: u64,

    /// Pause before the animation repeats, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub repeat_delay: u64,

    #[command(flatten)]
    pub figure: FigureArgs,

    #[command(flatten)]
    pub export: ExportArgs,

    /// Print an export summary as JSON on stdout
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Suppress progress messages on stderr
    #[arg(long, default_value_t = false)]
    pub quiet: bool,
}

#[derive(Args)]
pub struct ActivityArgs {
    /// Activity document with cells, times and positions
    #[arg(long)]
    pub input: PathBuf,

    /// Output animation (.mp4, .gif, or .png for a frame sequence)
    #[arg(short, long)]
    pub output: PathBuf,

    #[arg(long)]
    pub title: Option<String>,

    /// Marker: o, s, ^, v, x, + or .
    #[arg(long, default_value = "o")]
    pub marker: String,

    /// Marker area in points²
    #[arg(long, default_value_t = 10.0)]
    pub marker_size: f64,

    #[arg(long, default_value = "C0")]
    pub color: String,

    /// Spikes outside the sample range: reject, clip or drop
    #[arg(long, default_value = "reject")]
    pub out_of_range: String,

    /// Delay between frames in milliseconds
    #[arg(long, default_value_t = 100)]
    pub interval: u64,

    /// Pause before the animation repeats, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub repeat_delay: u64,

    #[command(flatten)]
    pub figure: FigureArgs,

    #[command(flatten)]
    pub export: ExportArgs,

    /// Print an export summary as JSON on stdout
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Suppress progress messages on stderr
    #[arg(long, default_value_t = false)]
    pub quiet: bool,
}

#[derive(Args)]
pub struct ColormapsArgs {
    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args)]
pub struct InfoArgs {
    /// Path to the ffmpeg binary
    #[arg(long, env = "SPIKEVIZ_FFMPEG")]
    pub ffmpeg: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

/// Parse a canvas size "WIDTHxHEIGHT".
pub fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("Invalid size '{}': expected WIDTHxHEIGHT", s))?;
    let w = w
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("Invalid size '{}': '{}' is not a valid width", s, w))?;
    let h = h
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("Invalid size '{}': '{}' is not a valid height", s, h))?;
    Ok((w, h))
}

/// Parse a quantity such as "0.5ms", "2 s" or "1e-3 s".
pub fn parse_quantity(s: &str) -> Result<Quantity, String> {
    let s = s.trim();
    let split = s
        .find(|c: char| c.is_alphabetic() && c != 'e' && c != 'E')
        .ok_or_else(|| format!("Invalid quantity '{}': missing unit", s))?;
    let (value, unit) = s.split_at(split);
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("Invalid quantity '{}': '{}' is not a number", s, value.trim()))?;
    let unit = unit.trim().parse::<Unit>().map_err(|e| e.to_string())?;
    Ok(Quantity::new(value, unit))
}

/// Writer named on the command line, else one matching the output extension.
pub fn resolve_writer(explicit: Option<&str>, output: &Path) -> String {
    if let Some(writer) = explicit {
        return writer.to_string();
    }
    let ext = output
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("gif") => "gif",
        Some("png") => "frames",
        _ => "ffmpeg",
    }
    .to_string()
}

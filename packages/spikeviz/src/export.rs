//! Writing animations to disk
//!
//! Three writers are available:
//! - `ffmpeg`: raw RGB24 frames piped through an external ffmpeg binary
//! - `gif` (alias `pillow`): animated GIF via the plotters GIF backend
//! - `frames` (alias `png`): one numbered PNG per frame

use std::env;
use std::fmt;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;

use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::animation::{draw_source_frame, render_frame_rgb, FrameSource};
use crate::error::{Result, VizError};
use crate::render::ensure_parent_dir;

/// Environment variable overriding the ffmpeg binary
pub const FFMPEG_ENV: &str = "SPIKEVIZ_FFMPEG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Writer {
    Ffmpeg,
    Gif,
    Frames,
}

impl FromStr for Writer {
    type Err = VizError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ffmpeg" => Ok(Writer::Ffmpeg),
            "gif" | "pillow" => Ok(Writer::Gif),
            "frames" | "png" => Ok(Writer::Frames),
            _ => Err(VizError::UnknownWriter(s.to_string())),
        }
    }
}

impl fmt::Display for Writer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Writer::Ffmpeg => "ffmpeg",
            Writer::Gif => "gif",
            Writer::Frames => "frames",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub filename: PathBuf,
    pub writer: String,
    /// Defaults to `1000 / interval`
    pub fps: Option<f64>,
    /// ffmpeg binary; falls back to `$SPIKEVIZ_FFMPEG`, then `ffmpeg` on PATH
    pub ffmpeg: Option<PathBuf>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            filename: PathBuf::from("anim.mp4"),
            writer: "ffmpeg".to_string(),
            fps: None,
            ffmpeg: None,
        }
    }
}

impl ExportOptions {
    pub fn new(filename: impl Into<PathBuf>, writer: &str) -> Self {
        Self {
            filename: filename.into(),
            writer: writer.to_string(),
            ..Self::default()
        }
    }
}

/// What an export produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportSummary {
    /// Output file, or the first frame for the `frames` writer
    pub path: PathBuf,
    pub writer: String,
    pub frames: usize,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

/// Write every frame of `source` once, in order
pub fn save<S: FrameSource>(source: &S, options: &ExportOptions) -> Result<ExportSummary> {
    let writer = options.writer.parse::<Writer>()?;
    source.playback().validate()?;
    source.figure().validate()?;

    let frame_count = source.frame_count();
    if frame_count == 0 {
        return Err(VizError::InvalidParameter(
            "Nothing to export: animation has no frames".to_string(),
        ));
    }

    let fps = options.fps.unwrap_or_else(|| source.playback().fps());
    if !(fps > 0.0) || !fps.is_finite() {
        return Err(VizError::InvalidParameter(format!("Invalid frame rate {}", fps)));
    }

    ensure_parent_dir(&options.filename)?;
    log::info!(
        "Exporting {} frames to {} with the {} writer",
        frame_count,
        options.filename.display(),
        writer
    );

    let summary = match writer {
        Writer::Ffmpeg => write_ffmpeg(source, options, fps)?,
        Writer::Gif => write_gif(source, &options.filename, fps)?,
        Writer::Frames => write_frames(source, &options.filename, fps)?,
    };

    log::info!(
        "Wrote {} ({} frames, {}x{} @ {} fps)",
        summary.path.display(),
        summary.frames,
        summary.width,
        summary.height,
        summary.fps
    );
    Ok(summary)
}

// ============================================================================
// ffmpeg
// ============================================================================

/// Binary to run: explicit option, then `$SPIKEVIZ_FFMPEG`, then plain `ffmpeg`
pub fn ffmpeg_binary(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    env::var_os(FFMPEG_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("ffmpeg"))
}

/// Locate the ffmpeg binary on disk, searching PATH for bare names
pub fn find_ffmpeg(explicit: Option<&Path>) -> Option<PathBuf> {
    let binary = ffmpeg_binary(explicit);
    if binary.components().count() > 1 {
        return binary.is_file().then_some(binary);
    }
    let path_var = env::var_os("PATH")?;
    env::split_paths(&path_var)
        .flat_map(|dir| {
            let candidate = dir.join(&binary);
            let exe = candidate.with_extension("exe");
            [candidate, exe]
        })
        .find(|p| p.is_file())
}

/// Largest even value not above `dim` (yuv420p needs even sizes)
fn even_dimension(dim: u32) -> u32 {
    let dim = dim.max(2);
    dim - dim % 2
}

/// Copy the top-left `width x height` block out of a `src_width`-wide RGB24 buffer
fn crop_rgb(buffer: &[u8], src_width: u32, width: u32, height: u32) -> Vec<u8> {
    let row = width as usize * 3;
    let src_row = src_width as usize * 3;
    let mut out = Vec::with_capacity(row * height as usize);
    for y in 0..height as usize {
        let start = y * src_row;
        out.extend_from_slice(&buffer[start..start + row]);
    }
    out
}

fn write_ffmpeg<S: FrameSource>(
    source: &S,
    options: &ExportOptions,
    fps: f64,
) -> Result<ExportSummary> {
    let figure = source.figure();
    let width = even_dimension(figure.width);
    let height = even_dimension(figure.height);
    if width != figure.width || height != figure.height {
        log::warn!(
            "Cropping frames from {}x{} to {}x{} for yuv420p compatibility",
            figure.width,
            figure.height,
            width,
            height
        );
    }

    let mut raw_file = NamedTempFile::new()?;
    let frame_count = source.frame_count();
    {
        let mut writer = BufWriter::new(raw_file.as_file_mut());
        for index in 0..frame_count {
            let frame = source.frame(index)?;
            let rgb = render_frame_rgb(source, &frame)?;
            if width == figure.width && height == figure.height {
                writer.write_all(&rgb)?;
            } else {
                writer.write_all(&crop_rgb(&rgb, figure.width, width, height))?;
            }
        }
        writer.flush()?;
    }
    let raw_path = raw_file.into_temp_path();

    let binary = ffmpeg_binary(options.ffmpeg.as_deref());
    log::debug!("Encoding {} frames with {}", frame_count, binary.display());

    let output = Command::new(&binary)
        .arg("-hide_banner")
        .arg("-loglevel")
        .arg("error")
        .arg("-y")
        .arg("-f")
        .arg("rawvideo")
        .arg("-pix_fmt")
        .arg("rgb24")
        .arg("-s")
        .arg(format!("{}x{}", width, height))
        .arg("-r")
        .arg(fps.to_string())
        .arg("-i")
        .arg(raw_path.as_os_str())
        .arg("-frames:v")
        .arg(frame_count.to_string())
        .arg("-pix_fmt")
        .arg("yuv420p")
        .arg(options.filename.as_os_str())
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                VizError::EncoderNotFound(format!(
                    "{} (install ffmpeg or set {})",
                    binary.display(),
                    FFMPEG_ENV
                ))
            } else {
                VizError::IoError(e)
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
        return Err(VizError::EncoderFailed(format!(
            "{} exited with {}: {}",
            binary.display(),
            output.status,
            stderr
        )));
    }

    raw_path.close()?;

    Ok(ExportSummary {
        path: options.filename.clone(),
        writer: Writer::Ffmpeg.to_string(),
        frames: frame_count,
        width,
        height,
        fps,
    })
}

// ============================================================================
// GIF and PNG sequences
// ============================================================================

fn write_gif<S: FrameSource>(source: &S, path: &Path, fps: f64) -> Result<ExportSummary> {
    let figure = source.figure();
    let background = figure.background_color()?;
    let delay_ms = (1000.0 / fps).round().max(1.0) as u32;
    let frame_count = source.frame_count();

    let root = BitMapBackend::gif(path, (figure.width, figure.height), delay_ms)
        .map_err(|e| VizError::Render(e.to_string()))?
        .into_drawing_area();
    for index in 0..frame_count {
        let frame = source.frame(index)?;
        root.fill(&background)?;
        draw_source_frame(source, &frame, &root)?;
        root.present()?;
    }

    Ok(ExportSummary {
        path: path.to_path_buf(),
        writer: Writer::Gif.to_string(),
        frames: frame_count,
        width: figure.width,
        height: figure.height,
        fps,
    })
}

/// `<dir>/<stem>_0007.png` for frame 7 of `anim.png`
pub fn frame_path(base: &Path, index: usize) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame".to_string());
    base.with_file_name(format!("{}_{:04}.png", stem, index))
}

fn write_frames<S: FrameSource>(source: &S, base: &Path, fps: f64) -> Result<ExportSummary> {
    let figure = source.figure();
    let background = figure.background_color()?;
    let frame_count = source.frame_count();

    for index in 0..frame_count {
        let frame = source.frame(index)?;
        let path = frame_path(base, index);
        let root = BitMapBackend::new(&path, (figure.width, figure.height)).into_drawing_area();
        root.fill(&background)?;
        draw_source_frame(source, &frame, &root)?;
        root.present()?;
    }

    Ok(ExportSummary {
        path: frame_path(base, 0),
        writer: Writer::Frames.to_string(),
        frames: frame_count,
        width: figure.width,
        height: figure.height,
        fps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_names() {
        assert_eq!("ffmpeg".parse::<Writer>().unwrap(), Writer::Ffmpeg);
        assert_eq!("pillow".parse::<Writer>().unwrap(), Writer::Gif);
        assert_eq!("PNG".parse::<Writer>().unwrap(), Writer::Frames);
        assert!(matches!(
            "imagemagick".parse::<Writer>().unwrap_err(),
            VizError::UnknownWriter(_)
        ));
    }

    #[test]
    fn test_even_dimension() {
        assert_eq!(even_dimension(640), 640);
        assert_eq!(even_dimension(641), 640);
        assert_eq!(even_dimension(1), 2);
    }

    #[test]
    fn test_crop_rgb() {
        // 3x2 image, keep 2x2
        let src: Vec<u8> = (0..18).collect();
        let cropped = crop_rgb(&src, 3, 2, 2);
        assert_eq!(cropped, vec![0, 1, 2, 3, 4, 5, 9, 10, 11, 12, 13, 14]);
    }

    #[test]
    fn test_frame_path() {
        let base = Path::new("/tmp/out/anim.png");
        assert_eq!(frame_path(base, 7), PathBuf::from("/tmp/out/anim_0007.png"));
    }

    #[test]
    fn test_explicit_ffmpeg_binary_wins() {
        let explicit = Path::new("/opt/ffmpeg/bin/ffmpeg");
        assert_eq!(ffmpeg_binary(Some(explicit)), explicit.to_path_buf());
        assert_eq!(find_ffmpeg(Some(Path::new("/definitely/missing/ffmpeg"))), None);
    }

    #[test]
    fn test_default_options() {
        let options = ExportOptions::default();
        assert_eq!(options.filename, PathBuf::from("anim.mp4"));
        assert_eq!(options.writer, "ffmpeg");
        let parsed: ExportOptions = serde_json::from_str(r#"{"writer": "gif"}"#).unwrap();
        assert_eq!(parsed.writer, "gif");
        assert_eq!(parsed.filename, PathBuf::from("anim.mp4"));
    }
}

use plotters::drawing::DrawingAreaErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VizError {
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error(
        "Spike at {timestamp} in cell ({row}, {col}) falls in bin {bin}, outside 0..{len}"
    )]
    IndexOutOfRange {
        row: usize,
        col: usize,
        timestamp: f64,
        bin: i64,
        len: usize,
    },

    #[error("Invalid normalization range: min {min} > max {max}")]
    InvalidRange { min: f64, max: f64 },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Cannot convert {from} to {to}")]
    UnitMismatch { from: String, to: String },

    #[error("Unknown colormap: {0}")]
    UnknownColormap(String),

    #[error("Unknown color: {0}")]
    UnknownColor(String),

    #[error("Unknown marker style: {0}")]
    UnknownMarker(String),

    #[error("Unknown line style: {0}")]
    UnknownLineStyle(String),

    #[error("Unknown animation writer: {0}")]
    UnknownWriter(String),

    #[error("Rendering failed: {0}")]
    Render(String),

    #[error("Encoder not found: {0}")]
    EncoderNotFound(String),

    #[error("Video encoding failed: {0}")]
    EncoderFailed(String),

    #[error("Failed to parse input document: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl<E> From<DrawingAreaErrorKind<E>> for VizError
where
    E: std::error::Error + Send + Sync,
{
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        VizError::Render(err.to_string())
    }
}

impl From<serde_json::Error> for VizError {
    fn from(err: serde_json::Error) -> Self {
        VizError::ParseError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, VizError>;

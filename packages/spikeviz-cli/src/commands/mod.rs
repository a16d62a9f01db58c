pub mod activity;
pub mod colormaps;
pub mod cube;
pub mod info;
pub mod raster;

use spikeviz::VizError;

use crate::exit_codes;

/// Print an error and pick the exit code for it.
pub(crate) fn report_error(err: &VizError) -> i32 {
    eprintln!("Error: {}", err);
    match err {
        VizError::EncoderNotFound(_) => exit_codes::ENCODER_NOT_FOUND,
        VizError::Render(_) | VizError::EncoderFailed(_) | VizError::IoError(_) => {
            exit_codes::EXECUTION_ERROR
        }
        _ => exit_codes::INPUT_ERROR,
    }
}

/// Like [`report_error`], but every failure counts as bad input.
pub(crate) fn report_input_error(err: &VizError) -> i32 {
    eprintln!("Error: {}", err);
    exit_codes::INPUT_ERROR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_mapping() {
        assert_eq!(
            report_error(&VizError::EncoderNotFound("ffmpeg".into())),
            exit_codes::ENCODER_NOT_FOUND
        );
        assert_eq!(
            report_error(&VizError::EncoderFailed("boom".into())),
            exit_codes::EXECUTION_ERROR
        );
        assert_eq!(
            report_error(&VizError::ShapeMismatch("ragged".into())),
            exit_codes::INPUT_ERROR
        );
        assert_eq!(
            report_error(&VizError::InvalidRange { min: 1.0, max: 0.0 }),
            exit_codes::INPUT_ERROR
        );
    }
}

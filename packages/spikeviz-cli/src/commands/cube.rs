use spikeviz::document::{load_json, CubeDocument};
use spikeviz::{export, CubeAnimation, CubeOptions, FrameSource, Playback};

use crate::cli::CubeArgs;
use crate::commands::{report_error, report_input_error};
use crate::exit_codes;
use crate::output;

pub fn execute(args: CubeArgs) -> i32 {
    let cube = match load_json::<CubeDocument>(&args.input).and_then(|doc| doc.into_cube()) {
        Ok(cube) => cube,
        Err(e) => return report_input_error(&e),
    };

    let options = CubeOptions {
        title: args.title.clone(),
        dt: args.dt,
        vmin: args.vmin,
        vmax: args.vmax,
        cmap: args.cmap.clone(),
        playback: Playback::with_interval(args.interval, args.repeat_delay),
        export: None,
        figure: args.figure.style(),
    };

    let animation = match CubeAnimation::new(cube, &options) {
        Ok(animation) => animation,
        Err(e) => return report_error(&e),
    };

    let export_options = args.export.options(&args.output);
    if !args.quiet {
        eprintln!(
            "Rendering {} frames to {} ({})...",
            animation.frame_count(),
            args.output.display(),
            export_options.writer
        );
    }

    let summary = match export::save(&animation, &export_options) {
        Ok(summary) => summary,
        Err(e) => return report_error(&e),
    };

    if args.json {
        if let Err(e) = output::print_json(&summary) {
            eprintln!("Error: {}", e);
            return exit_codes::EXECUTION_ERROR;
        }
    } else if !args.quiet {
        eprintln!("Wrote {}", summary.path.display());
    }
    exit_codes::SUCCESS
}

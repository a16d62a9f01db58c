use spikeviz::document::{load_json, ActivityDocument};
use spikeviz::{export, ActivityAnimation, ActivityOptions, FrameSource, OutOfRangePolicy, Playback};

use crate::cli::ActivityArgs;
use crate::commands::{report_error, report_input_error};
use crate::exit_codes;
use crate::output;

pub fn execute(args: ActivityArgs) -> i32 {
    let (table, times, positions) =
        match load_json::<ActivityDocument>(&args.input).and_then(|doc| doc.into_parts()) {
            Ok(parts) => parts,
            Err(e) => return report_input_error(&e),
        };

    let out_of_range = match args.out_of_range.parse::<OutOfRangePolicy>() {
        Ok(policy) => policy,
        Err(e) => return report_input_error(&e),
    };

    let options = ActivityOptions {
        title: args.title.clone(),
        marker: args.marker.clone(),
        marker_size: args.marker_size,
        marker_color: args.color.clone(),
        out_of_range,
        playback: Playback::with_interval(args.interval, args.repeat_delay),
        export: None,
        figure: args.figure.style(),
    };

    let animation = match ActivityAnimation::new(&table, &times, &positions, &options) {
        Ok(animation) => animation,
        Err(e) => return report_error(&e),
    };

    let export_options = args.export.options(&args.output);
    if !args.quiet {
        eprintln!(
            "Rendering {} frames of spike activity ({} spikes) to {} ({})...",
            animation.frame_count(),
            table.spike_count(),
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

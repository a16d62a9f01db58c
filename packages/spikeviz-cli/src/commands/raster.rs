use spikeviz::document::{load_json, RasterDocument};
use spikeviz::{raster_plot, OneOrMany, Orientation, RasterOptions};

use crate::cli::RasterArgs;
use crate::commands::{report_error, report_input_error};
use crate::exit_codes;

fn one_or_many<T: Clone>(values: &[T]) -> OneOrMany<T> {
    match values {
        [single] => OneOrMany::One(single.clone()),
        many => OneOrMany::Many(many.to_vec()),
    }
}

pub fn execute(args: RasterArgs) -> i32 {
    let trains: RasterDocument = match load_json(&args.input) {
        Ok(trains) => trains,
        Err(e) => return report_input_error(&e),
    };

    let options = RasterOptions {
        title: args.title.clone(),
        xlabel: args.xlabel.clone(),
        ylabel: args.ylabel.clone(),
        orientation: if args.vertical {
            Orientation::Vertical
        } else {
            Orientation::Horizontal
        },
        lineoffsets: one_or_many(&args.lineoffset),
        linelengths: one_or_many(&args.linelength),
        linewidths: one_or_many(&args.linewidth),
        colors: one_or_many(&args.color),
        linestyles: one_or_many(&args.linestyle),
    };

    let figure = match raster_plot(&trains, &options) {
        Ok(figure) => figure,
        Err(e) => return report_error(&e),
    };

    if !args.quiet {
        eprintln!(
            "Drawing {} spike trains to {}...",
            trains.len(),
            args.output.display()
        );
    }

    if let Err(e) = figure.save(&args.output, &args.figure.style()) {
        return report_error(&e);
    }

    if !args.quiet {
        eprintln!("Done.");
    }
    exit_codes::SUCCESS
}

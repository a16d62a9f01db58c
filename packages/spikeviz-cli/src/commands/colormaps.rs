use spikeviz::Colormap;

use crate::cli::ColormapsArgs;
use crate::exit_codes;
use crate::output;

pub fn execute(args: ColormapsArgs) -> i32 {
    let names = Colormap::available();

    if args.json {
        if let Err(e) = output::print_json(&names) {
            eprintln!("Error: {}", e);
            return exit_codes::EXECUTION_ERROR;
        }
    } else {
        for name in &names {
            println!("{}", name);
        }
        println!();
        println!("Append _r to any name for the reversed map (e.g. RdBu_r).");
    }

    exit_codes::SUCCESS
}

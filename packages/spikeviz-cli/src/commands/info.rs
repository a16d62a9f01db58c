use serde::Serialize;
use spikeviz::export::{find_ffmpeg, FFMPEG_ENV};

use crate::cli::InfoArgs;
use crate::exit_codes;
use crate::output;

#[derive(Serialize)]
struct InfoOutput {
    cli_version: String,
    ffmpeg_path: Option<String>,
    ffmpeg_found: bool,
    writers: Vec<&'static str>,
    platform: String,
    arch: String,
}

pub fn execute(args: InfoArgs) -> i32 {
    let ffmpeg = find_ffmpeg(args.ffmpeg.as_deref());

    let info = InfoOutput {
        cli_version: env!("CARGO_PKG_VERSION").to_string(),
        ffmpeg_path: ffmpeg.as_ref().map(|p| p.display().to_string()),
        ffmpeg_found: ffmpeg.is_some(),
        writers: vec!["ffmpeg", "gif", "frames"],
        platform: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
    };

    if args.json {
        if let Err(e) = output::print_json(&info) {
            eprintln!("Error: {}", e);
            return exit_codes::EXECUTION_ERROR;
        }
    } else {
        println!("spikeviz CLI v{}", info.cli_version);
        println!("Platform: {} ({})", info.platform, info.arch);
        println!();
        match &info.ffmpeg_path {
            Some(path) => println!("ffmpeg: {}", path),
            None => println!("ffmpeg: not found (gif and frames writers still work)"),
        }
        println!("Search order: --ffmpeg, ${}, PATH", FFMPEG_ENV);
        println!("Writers: {}", info.writers.join(", "));
    }

    exit_codes::SUCCESS
}

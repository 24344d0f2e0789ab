//! Command-line interface for jigsaw_scan
//!
//! Analyzes a photo of puzzle pieces, optionally against a reference image,
//! and prints the result as JSON with a human-readable summary on stderr.

use flexi_logger::Logger;
use jigsaw_scan::image_loader::load_image;
use jigsaw_scan::{AnalysisResult, PuzzleSession, ScanConfig};
use std::{env, path::PathBuf, process};

fn main() {
    let _logger = Logger::try_with_env_or_str("info")
        .and_then(|logger| logger.log_to_stderr().start())
        .unwrap_or_else(|e| panic!("Logger initialization failed with {}", e));

    let args: Vec<String> = env::args().collect();
    let mut image_path = None;
    let mut reference_path = None;
    let mut config_path = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--reference" | "-r" if i + 1 < args.len() => {
                reference_path = Some(PathBuf::from(&args[i + 1]));
                i += 1;
            }
            "--config" | "-c" if i + 1 < args.len() => {
                config_path = Some(PathBuf::from(&args[i + 1]));
                i += 1;
            }
            "--help" | "-h" => {
                print_help(&args[0]);
                process::exit(0);
            }
            arg if !arg.starts_with('-') && image_path.is_none() => {
                image_path = Some(PathBuf::from(arg));
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                eprintln!("Use --help for usage information");
                process::exit(1);
            }
        }
        i += 1;
    }

    let Some(image_path) = image_path else {
        print_help(&args[0]);
        process::exit(1);
    };

    let config = match config_path {
        Some(path) => ScanConfig::from_json_file(&path).unwrap_or_else(|e| fail(e)),
        None => ScanConfig::default(),
    };

    let image = load_image(&image_path).unwrap_or_else(|e| fail(e));
    let mut session = PuzzleSession::with_default_backend(config);
    if let Some(path) = reference_path {
        let reference = load_image(&path).unwrap_or_else(|e| fail(e));
        session.load_reference(reference);
    }

    print_result(&session.analyze(&image));
}

fn fail(error: jigsaw_scan::ScanError) -> ! {
    eprintln!("Analysis failed: {}", error);
    eprintln!("{}", error.user_message());
    process::exit(1);
}

fn print_help(program_name: &str) {
    eprintln!("Usage: {} [OPTIONS] <image_path>", program_name);
    eprintln!();
    eprintln!("Detect puzzle pieces and suggest an assembly strategy.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -r, --reference <PATH>  Picture of the finished puzzle for placement hints");
    eprintln!("  -c, --config <PATH>     JSON configuration (see generate_config)");
    eprintln!("  -h, --help              Show this help message");
}

fn print_result(result: &AnalysisResult) {
    match serde_json::to_string_pretty(result) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing result: {}", e),
    }

    eprintln!();
    eprintln!("{} ({:?} segmentation)", result.summary(), result.segment_mode);
    for (group, count) in result.color_group_counts() {
        eprintln!("  {:<14} {:>4}  {}", group.label(), count, group.hex());
    }
    eprintln!("  Edge pieces:   {:>4}", result.edge_pieces().len());
    eprintln!();
    for suggestion in &result.suggestions {
        eprintln!("- {}", suggestion);
    }
}

//! Generate the default configuration file
//!
//! Creates a JSON config with all default parameters

use jigsaw_scan::ScanConfig;
use std::{env, path::Path, process};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <output_config.json>", args[0]);
        process::exit(1);
    }

    let output_path = Path::new(&args[1]);
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = std::fs::create_dir_all(parent) {
            eprintln!("Error creating directory: {}", e);
            process::exit(1);
        }
    }

    let config = ScanConfig::default();
    match config.to_json_file(output_path) {
        Ok(()) => {
            eprintln!("Configuration saved to {}", output_path.display());
            eprintln!();
            eprintln!("Config summary:");
            eprintln!("  Grid fallback: {} px cells", config.segmentation.grid_size);
            eprintln!(
                "  Filter: min {} px, max {:.0}% of image",
                config.filter.min_dimension,
                config.filter.max_area_ratio * 100.0
            );
            eprintln!("  Edge margin: {:?}", config.edge.margin);
            eprintln!(
                "  Live: every {} ms at {} px",
                config.live.process_interval_ms, config.live.process_width
            );
        }
        Err(e) => {
            eprintln!("Error saving config: {}", e);
            process::exit(1);
        }
    }
}

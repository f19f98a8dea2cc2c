//! Stage-In CLI Entry Point
//!
//! Localizes the granules referenced by a STAC manifest by invoking the
//! shared stage-in workflow.
//!
//! # Usage
//!
//! ```bash
//! # Stage granules into the default download directory
//! stage-in catalog.json
//!
//! # Stage into an explicit directory
//! stage-in catalog.json /data/staged
//!
//! # Download the descriptor to a temporary file first
//! stage-in --prefetch catalog.json
//!
//! # Use a locally cached descriptor
//! stage-in --local cwl/stage-in.cwl catalog.json
//! ```

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use tropess_deploy::runner::{DescriptorSource, StageInJob, DEFAULT_DOWNLOAD_DIR};
use tropess_deploy::{setup_logging, APP_NAME, VERSION};

/// Command-line configuration parsed from arguments.
#[derive(Debug, Default)]
struct Config {
    manifest: Option<String>,
    download_dir: Option<String>,
    local_descriptor: Option<PathBuf>,
    prefetch: bool,
    dry_run: bool,
    verbose: bool,
}

/// Prints usage information.
fn print_usage() {
    println!("Usage: stage-in [OPTIONS] <STAC_MANIFEST> [DOWNLOAD_DIR]");
    println!();
    println!("Arguments:");
    println!("  <STAC_MANIFEST>   Manifest file or URL naming the granules to stage");
    println!("  [DOWNLOAD_DIR]    Where granules are downloaded (default: {})", DEFAULT_DOWNLOAD_DIR);
    println!();
    println!("Options:");
    println!("  --local PATH      Use a locally cached stage-in descriptor");
    println!("  --prefetch        Download the descriptor to a temporary file first");
    println!("  --dry-run         Preview the runner command without executing");
    println!("  --verbose         Enable debug logging");
    println!("  --help            Show this help message");
    println!("  --version         Show version information");
}

/// Parses command-line arguments into a Config struct.
fn parse_arguments(args: &[String]) -> Result<Config, String> {
    let mut config = Config::default();
    let mut positional_index = 0;
    let mut i = 1; // Skip program name

    while i < args.len() {
        let arg = &args[i];

        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("{} {}", APP_NAME, VERSION);
                std::process::exit(0);
            }
            "--local" => {
                i += 1;
                if i >= args.len() {
                    return Err("--local requires a path argument".to_string());
                }
                config.local_descriptor = Some(PathBuf::from(&args[i]));
            }
            "--prefetch" => {
                config.prefetch = true;
            }
            "--dry-run" => {
                config.dry_run = true;
            }
            "--verbose" | "-v" => {
                config.verbose = true;
            }
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            _ => {
                match positional_index {
                    0 => config.manifest = Some(arg.clone()),
                    1 => config.download_dir = Some(arg.clone()),
                    _ => return Err(format!("Unexpected argument: {}", arg)),
                }
                positional_index += 1;
            }
        }
        i += 1;
    }

    if config.manifest.is_none() {
        return Err("the STAC manifest argument is required".to_string());
    }

    if config.local_descriptor.is_some() && config.prefetch {
        return Err("--local and --prefetch are mutually exclusive".to_string());
    }

    Ok(config)
}

/// Main application entry point.
fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let config = parse_arguments(&args).map_err(|e| {
        eprintln!("Error: {}", e);
        eprintln!();
        print_usage();
        e
    })?;

    setup_logging(config.verbose);

    let manifest = config.manifest.ok_or("the STAC manifest argument is required")?;
    let mut job = StageInJob::new(manifest).with_dry_run(config.dry_run);

    if let Some(download_dir) = config.download_dir {
        job = job.with_download_dir(download_dir);
    }

    if let Some(local) = config.local_descriptor {
        job = job.with_source(DescriptorSource::Local(local));
    } else if config.prefetch {
        job = job.with_source(DescriptorSource::Prefetched);
    }

    job.run()?;

    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

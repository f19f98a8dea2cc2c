//! Workflow Test Runner CLI Entry Point
//!
//! Exercises a deployed workflow descriptor against a job-input document
//! inside a per-descriptor scratch tree, logging combined runner output.
//!
//! # Usage
//!
//! ```bash
//! # Test a descriptor against its sibling example_job_input.json
//! run-workflow py-tropess/process-unity-ops.cwl
//!
//! # Test against an explicit job input
//! run-workflow py-tropess/process-unity-ops.cwl inputs/one_day.json
//!
//! # Preview the runner command
//! run-workflow py-tropess/process-unity-ops.cwl --dry-run
//! ```

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use tropess_deploy::runner::TestRun;
use tropess_deploy::{setup_logging, APP_NAME, VERSION};

/// Command-line configuration parsed from arguments.
#[derive(Debug, Default)]
struct Config {
    descriptor: Option<PathBuf>,
    job_input: Option<PathBuf>,
    scratch_root: Option<PathBuf>,
    dry_run: bool,
    verbose: bool,
}

/// Prints usage information.
fn print_usage() {
    println!("Usage: run-workflow [OPTIONS] <WORKFLOW_CWL> [JOB_INPUT_JSON]");
    println!();
    println!("Arguments:");
    println!("  <WORKFLOW_CWL>     Path to the workflow descriptor to test");
    println!("  [JOB_INPUT_JSON]   Job input document (default: example_job_input.json");
    println!("                     next to the descriptor)");
    println!();
    println!("Options:");
    println!("  --scratch-dir PATH  Create scratch trees under PATH instead of .");
    println!("  --dry-run           Preview the runner command without executing");
    println!("  --verbose           Enable debug logging");
    println!("  --help              Show this help message");
    println!("  --version           Show version information");
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
            "--scratch-dir" => {
                i += 1;
                if i >= args.len() {
                    return Err("--scratch-dir requires a path argument".to_string());
                }
                config.scratch_root = Some(PathBuf::from(&args[i]));
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
                    0 => config.descriptor = Some(PathBuf::from(arg)),
                    1 => config.job_input = Some(PathBuf::from(arg)),
                    _ => return Err(format!("Unexpected argument: {}", arg)),
                }
                positional_index += 1;
            }
        }
        i += 1;
    }

    if config.descriptor.is_none() {
        return Err("the workflow descriptor argument is required".to_string());
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

    let descriptor = config
        .descriptor
        .ok_or("the workflow descriptor argument is required")?;

    let mut test_run =
        TestRun::new(descriptor, config.job_input)?.with_dry_run(config.dry_run);

    if let Some(scratch_root) = config.scratch_root {
        test_run = test_run.with_scratch_root(scratch_root);
    }

    test_run.run()?;

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

//! Application Build CLI Entry Point
//!
//! Builds the TROPESS applications for deployment in MDPS: clones their
//! source repositories, builds and pushes container images, and captures
//! the per-venue workflow artifacts back into this repository.
//!
//! # Usage
//!
//! ```bash
//! # Build every application at its default source
//! build-apps
//!
//! # Build one application from a tagged release
//! build-apps py_tropess --py_tropess @v1.4.2 --tag 1.4.2
//!
//! # Re-capture artifacts without rebuilding the image
//! build-apps py_tropess --skip-build
//! ```

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use tropess_deploy::config::MdpsConfig;
use tropess_deploy::deploy::{get_application, AppBuilder, APPLICATIONS, DEFAULT_IMAGE_TAG};
use tropess_deploy::{setup_logging, APP_NAME, VERSION};

/// Deployment directory used when none is specified.
const DEFAULT_DEPLOY_DIR: &str = "workflows";

/// Command-line configuration parsed from arguments.
#[derive(Debug, Default)]
struct Config {
    apps: Vec<String>,
    source_overrides: HashMap<String, String>,
    image_tag: Option<String>,
    skip_build: bool,
    deploy_base_dir: Option<PathBuf>,
    dry_run: bool,
    verbose: bool,
}

/// Prints usage information.
fn print_usage() {
    let app_names: Vec<&str> = APPLICATIONS.iter().map(|app| app.name).collect();

    println!("Usage: build-apps [OPTIONS] [APP...]");
    println!();
    println!("Arguments:");
    println!("  [APP...]   Applications to build other than the default of all: {:?}", app_names);
    println!();
    println!("Options:");
    for app in APPLICATIONS {
        println!("  --{} SRC   Source repository for {} other than the default.", app.name, app.name);
        println!("  {:width$}   Prefix a tag with @ to use a version at the default location.", "", width = app.name.len() + 6);
    }
    println!("  -t, --tag TAG          Image tag to use instead of default: {}", DEFAULT_IMAGE_TAG);
    println!("      --skip-build       Skip the image build if a previous run already built it");
    println!("      --deployment_dir DIR   Location where CWL artifacts are deployed");
    println!("                             (default: {})", DEFAULT_DEPLOY_DIR);
    println!("      --dry-run          Preview external commands without executing");
    println!("  -v, --verbose          Enable verbose logging");
    println!("      --help             Show this help message");
    println!("      --version          Show version information");
}

/// Parses command-line arguments into a Config struct.
fn parse_arguments(args: &[String]) -> Result<Config, String> {
    let mut config = Config::default();
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
            "-t" | "--tag" => {
                i += 1;
                if i >= args.len() {
                    return Err("--tag requires a value".to_string());
                }
                config.image_tag = Some(args[i].clone());
            }
            "--skip-build" => {
                config.skip_build = true;
            }
            "--deployment_dir" => {
                i += 1;
                if i >= args.len() {
                    return Err("--deployment_dir requires a path argument".to_string());
                }
                config.deploy_base_dir = Some(PathBuf::from(&args[i]));
            }
            "--dry-run" => {
                config.dry_run = true;
            }
            "--verbose" | "-v" => {
                config.verbose = true;
            }
            arg if arg.starts_with("--") => {
                // Per-application source override flags (--py_tropess SRC)
                let app_name = &arg[2..];
                if get_application(app_name).is_err() {
                    return Err(format!("Unknown option: {}", arg));
                }

                i += 1;
                if i >= args.len() {
                    return Err(format!("{} requires a source argument", arg));
                }
                config.source_overrides.insert(app_name.to_string(), args[i].clone());
            }
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            _ => {
                config.apps.push(arg.clone());
            }
        }
        i += 1;
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

    let mdps = MdpsConfig::load(None)?;

    let deploy_base_dir = config
        .deploy_base_dir
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DEPLOY_DIR));

    let image_tag = config
        .image_tag
        .unwrap_or_else(|| DEFAULT_IMAGE_TAG.to_string());

    // Default to building everything
    let app_list: Vec<String> = if config.apps.is_empty() {
        APPLICATIONS.iter().map(|app| app.name.to_string()).collect()
    } else {
        config.apps.clone()
    };

    for app_name in &app_list {
        let spec = get_application(app_name)?;

        let builder = AppBuilder::new(spec, mdps.clone(), &deploy_base_dir)
            .with_dry_run(config.dry_run);

        builder.init_repo(config.source_overrides.get(app_name).map(String::as_str))?;

        if !config.skip_build {
            builder.build_image(&image_tag)?;
        }

        builder.push_image(&image_tag)?;
        builder.update_artifacts()?;
    }

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

//! Data Query CLI Entry Point
//!
//! Queries TROPESS data in the MDPS catalog: collection overviews,
//! per-date archive status, and optional STAC catalog or DAAC delete
//! message export.
//!
//! # Usage
//!
//! ```bash
//! # List registered MUSES collection ids
//! query-data muses
//!
//! # Per-date overview of one collection group
//! query-data -c forward_stream tropess
//!
//! # Granule details for one day, exporting the STAC catalogs
//! query-data -c forward_stream -d 2021-07-04 --write_stac_catalog -o reports tropess
//! ```

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use tropess_deploy::catalog::{run_query, DataServicesClient, ProductFamily, QueryOptions};
use tropess_deploy::config::MdpsConfig;
use tropess_deploy::{setup_logging, APP_NAME, VERSION};

/// Default query result limit.
const DEFAULT_QUERY_LIMIT: usize = 1000;

/// Default MUSES collection version.
const DEFAULT_MUSES_VERSION: &str = "1";

/// Default TROPESS granule version.
const DEFAULT_TROPESS_VERSION: &str = "2";

/// Command-line configuration parsed from arguments.
#[derive(Debug)]
struct Config {
    debug: bool,
    family: ProductFamily,
    options: QueryOptions,
}

/// Prints usage information.
fn print_usage() {
    println!("Usage: query-data [OPTIONS] <COMMAND>");
    println!();
    println!("Commands:");
    println!("  muses     Query MUSES products");
    println!("  tropess   Query TROPESS products");
    println!();
    println!("Options:");
    println!("  -c, --collection_keyword KW   Collection group to query; without one only");
    println!("                                collection ids are listed");
    println!("  -s, --sensor_set SET          Filter by sensor set for the collection group");
    println!("  -d, --processing_date DATE    Single calendar date (YYYY-MM-DD)");
    println!("  -r, --date_range START STOP   Inclusive range of dates");
    println!("      --limit N                 Limit query results (default: {})", DEFAULT_QUERY_LIMIT);
    println!("      --write_stac_catalog      Write a STAC catalog file per collection");
    println!("      --write_delete_message    Write DAAC delete message files per granule");
    println!("  -o, --output_dir DIR          Where optional files are written");
    println!("      --muses_version VER       MUSES collection version (default: {})", DEFAULT_MUSES_VERSION);
    println!("      --tropess_version VER     TROPESS granule version (default: {})", DEFAULT_TROPESS_VERSION);
    println!("      --debug                   Enable verbose debug logging");
    println!("      --help                    Show this help message");
    println!("      --version                 Show version information");
}

/// Consumes the value following a flag.
fn take_value(args: &[String], i: &mut usize, flag: &str) -> Result<String, String> {
    *i += 1;
    if *i >= args.len() {
        return Err(format!("{} requires a value", flag));
    }
    Ok(args[*i].clone())
}

/// Parses command-line arguments into a Config struct.
fn parse_arguments(args: &[String]) -> Result<Config, String> {
    let mut debug = false;
    let mut family = None;
    let mut muses_version = DEFAULT_MUSES_VERSION.to_string();
    let mut tropess_version = DEFAULT_TROPESS_VERSION.to_string();

    let mut options = QueryOptions {
        limit: DEFAULT_QUERY_LIMIT,
        ..QueryOptions::default()
    };

    let mut i = 1; // Skip program name

    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("{} {}", APP_NAME, VERSION);
                std::process::exit(0);
            }
            "--debug" => debug = true,
            "-c" | "--collection_keyword" => {
                options.collection_group = Some(take_value(args, &mut i, "--collection_keyword")?)
            }
            "-s" | "--sensor_set" => {
                options.sensor_set = Some(take_value(args, &mut i, "--sensor_set")?)
            }
            "-d" | "--processing_date" => {
                options.processing_date = Some(take_value(args, &mut i, "--processing_date")?)
            }
            "-r" | "--date_range" => {
                let start = take_value(args, &mut i, "--date_range")?;
                let stop = take_value(args, &mut i, "--date_range")?;
                options.date_range = Some((start, stop));
            }
            "--limit" => {
                let value = take_value(args, &mut i, "--limit")?;
                options.limit = value
                    .parse()
                    .map_err(|_| format!("Invalid limit value: {}", value))?;
            }
            "--write_stac_catalog" => options.write_stac_catalog = true,
            "--write_delete_message" => options.write_delete_message = true,
            "-o" | "--output_dir" => {
                options.output_dir = Some(PathBuf::from(take_value(args, &mut i, "--output_dir")?))
            }
            "--muses_version" => muses_version = take_value(args, &mut i, "--muses_version")?,
            "--tropess_version" => tropess_version = take_value(args, &mut i, "--tropess_version")?,
            "muses" => family = Some(ProductFamily::Muses),
            "tropess" => family = Some(ProductFamily::Tropess),
            arg => return Err(format!("Unknown option or command: {}", arg)),
        }
        i += 1;
    }

    let family = family.ok_or("a command is required (muses or tropess)")?;

    if options.processing_date.is_some() && options.date_range.is_some() {
        return Err("--processing_date and --date_range are mutually exclusive".to_string());
    }

    options.version = match family {
        ProductFamily::Muses => muses_version,
        ProductFamily::Tropess => tropess_version,
    };

    Ok(Config {
        debug,
        family,
        options,
    })
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

    setup_logging(config.debug);

    let mdps = MdpsConfig::load(None)?;
    let client = DataServicesClient::connect(&mdps)?;

    run_query(&client, &mdps, config.family, &config.options)?;

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

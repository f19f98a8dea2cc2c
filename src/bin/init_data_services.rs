//! Data Services Initialization CLI Entry Point
//!
//! Registers a TROPESS collection group with MDPS data services: the
//! collection ids themselves, the custom metadata fields the products
//! carry, and DAAC archive delivery. Every operation is a dry run unless
//! `--do_update` is given.
//!
//! # Usage
//!
//! ```bash
//! # Preview the collection ids generated for a group
//! init-data-services register_collection -c forward_stream -v 2
//!
//! # Register them and verify the result
//! init-data-services -u register_collection -c forward_stream -v 2 --check
//!
//! # Define the custom metadata fields
//! init-data-services -u custom_metadata
//! ```

use std::env;
use std::process::ExitCode;

use tropess_deploy::catalog::admin::{self, DaacParams};
use tropess_deploy::catalog::{get_collection_group, DataServicesClient};
use tropess_deploy::config::MdpsConfig;
use tropess_deploy::{setup_logging, APP_NAME, VERSION};

/// Default MUSES collection version.
const DEFAULT_MUSES_VERSION: &str = "1";

/// Default session name for DAAC role assumption.
const DEFAULT_ROLE_SESSION_NAME: &str = "tropess_request";

/// Default Cumulus data source name.
const DEFAULT_PROVIDER: &str = "tropess_cloud";

#[derive(Debug)]
enum Command {
    RegisterCollection {
        collection_keyword: Option<String>,
        granule_version: Option<String>,
        muses_version: String,
        check: bool,
    },
    CustomMetadata,
    RegisterArchive {
        collection_keyword: Option<String>,
        granule_version: Option<String>,
        sns_arn: Option<String>,
        role_arn: Option<String>,
        role_session_name: String,
        provider: String,
        delete: bool,
    },
}

/// Command-line configuration parsed from arguments.
#[derive(Debug)]
struct Config {
    debug: bool,
    do_update: bool,
    command: Command,
}

/// Prints usage information.
fn print_usage() {
    println!("Usage: init-data-services [OPTIONS] <COMMAND> [COMMAND OPTIONS]");
    println!();
    println!("Commands:");
    println!("  register_collection   Register a collection group's ids with data services");
    println!("  custom_metadata       Define the custom metadata fields used by products");
    println!("  register_archive      Register collection ids for DAAC archive delivery");
    println!();
    println!("Options:");
    println!("  -u, --do_update   Perform the update instead of a dry run");
    println!("      --debug       Enable verbose debug logging");
    println!("      --help        Show this help message");
    println!("      --version     Show version information");
    println!();
    println!("register_collection options:");
    println!("  -c, --collection_keyword KW   Collection group being registered (required)");
    println!("  -v, --tropess_version VER     Granule version delivered to the DAAC (required)");
    println!("      --muses_version VER       MUSES collection version (default: {})", DEFAULT_MUSES_VERSION);
    println!("      --check                   Verify the generated ids are registered");
    println!();
    println!("register_archive options:");
    println!("  -c, --collection_keyword KW   Collection group being registered (required)");
    println!("  -v, --tropess_version VER     Granule version delivered to the DAAC (required)");
    println!("  -a, --sns_arn ARN             DAAC SNS topic receiving delivery messages (required)");
    println!("  -r, --role_arn ARN            IAM role assumed for delivery (required)");
    println!("  -s, --role_session_name NAME  Role session name (default: {})", DEFAULT_ROLE_SESSION_NAME);
    println!("  -p, --provider NAME           Cumulus data source (default: {})", DEFAULT_PROVIDER);
    println!("      --delete                  Delete existing archive configs first");
}

/// Consumes the value following a flag.
fn take_value(args: &[String], i: &mut usize, flag: &str) -> Result<String, String> {
    *i += 1;
    if *i >= args.len() {
        return Err(format!("{} requires a value", flag));
    }
    Ok(args[*i].clone())
}

/// Parses the register_collection subcommand options.
fn parse_register_collection(args: &[String], mut i: usize) -> Result<Command, String> {
    let mut collection_keyword = None;
    let mut granule_version = None;
    let mut muses_version = DEFAULT_MUSES_VERSION.to_string();
    let mut check = false;

    while i < args.len() {
        match args[i].as_str() {
            "-c" | "--collection_keyword" => {
                collection_keyword = Some(take_value(args, &mut i, "--collection_keyword")?)
            }
            "-v" | "--tropess_version" => {
                granule_version = Some(take_value(args, &mut i, "--tropess_version")?)
            }
            "--muses_version" => muses_version = take_value(args, &mut i, "--muses_version")?,
            "--check" => check = true,
            arg => return Err(format!("Unknown register_collection option: {}", arg)),
        }
        i += 1;
    }

    Ok(Command::RegisterCollection {
        collection_keyword,
        granule_version,
        muses_version,
        check,
    })
}

/// Parses the register_archive subcommand options.
fn parse_register_archive(args: &[String], mut i: usize) -> Result<Command, String> {
    let mut collection_keyword = None;
    let mut granule_version = None;
    let mut sns_arn = None;
    let mut role_arn = None;
    let mut role_session_name = DEFAULT_ROLE_SESSION_NAME.to_string();
    let mut provider = DEFAULT_PROVIDER.to_string();
    let mut delete = false;

    while i < args.len() {
        match args[i].as_str() {
            "-c" | "--collection_keyword" => {
                collection_keyword = Some(take_value(args, &mut i, "--collection_keyword")?)
            }
            "-v" | "--tropess_version" => {
                granule_version = Some(take_value(args, &mut i, "--tropess_version")?)
            }
            "-a" | "--sns_arn" => sns_arn = Some(take_value(args, &mut i, "--sns_arn")?),
            "-r" | "--role_arn" => role_arn = Some(take_value(args, &mut i, "--role_arn")?),
            "-s" | "--role_session_name" => {
                role_session_name = take_value(args, &mut i, "--role_session_name")?
            }
            "-p" | "--provider" => provider = take_value(args, &mut i, "--provider")?,
            "--delete" => delete = true,
            arg => return Err(format!("Unknown register_archive option: {}", arg)),
        }
        i += 1;
    }

    Ok(Command::RegisterArchive {
        collection_keyword,
        granule_version,
        sns_arn,
        role_arn,
        role_session_name,
        provider,
        delete,
    })
}

/// Parses command-line arguments into a Config struct.
fn parse_arguments(args: &[String]) -> Result<Config, String> {
    let mut debug = false;
    let mut do_update = false;
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
            "-u" | "--do_update" => do_update = true,
            "register_collection" => {
                return Ok(Config {
                    debug,
                    do_update,
                    command: parse_register_collection(args, i + 1)?,
                });
            }
            "custom_metadata" => {
                if i + 1 < args.len() {
                    return Err(format!("Unexpected argument: {}", args[i + 1]));
                }
                return Ok(Config {
                    debug,
                    do_update,
                    command: Command::CustomMetadata,
                });
            }
            "register_archive" => {
                return Ok(Config {
                    debug,
                    do_update,
                    command: parse_register_archive(args, i + 1)?,
                });
            }
            arg => return Err(format!("Unknown option or command: {}", arg)),
        }
        i += 1;
    }

    Err("a command is required (register_collection, custom_metadata, register_archive)".to_string())
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

    match config.command {
        Command::RegisterCollection {
            collection_keyword,
            granule_version,
            muses_version,
            check,
        } => {
            let group =
                get_collection_group(&collection_keyword.ok_or("--collection_keyword is required")?)?;
            let granule_version = granule_version.ok_or("--tropess_version is required")?;

            admin::register_collections(
                &client,
                &mdps,
                group,
                &granule_version,
                &muses_version,
                config.do_update,
                check,
            )?;
        }
        Command::CustomMetadata => {
            admin::define_custom_metadata(&client, config.do_update)?;
        }
        Command::RegisterArchive {
            collection_keyword,
            granule_version,
            sns_arn,
            role_arn,
            role_session_name,
            provider,
            delete,
        } => {
            let group =
                get_collection_group(&collection_keyword.ok_or("--collection_keyword is required")?)?;
            let granule_version = granule_version.ok_or("--tropess_version is required")?;

            let params = DaacParams {
                sns_arn: sns_arn.ok_or("--sns_arn is required")?,
                role_arn: role_arn.ok_or("--role_arn is required")?,
                role_session_name,
                provider,
            };

            admin::register_daac_archiving(
                &client,
                &mdps,
                group,
                &granule_version,
                &params,
                config.do_update,
                delete,
            )?;
        }
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

//! Processing Trigger CLI Entry Point
//!
//! Triggers TROPESS processing in MDPS: ingestion of MUSES data or
//! py-tropess product generation. Runs are dry runs unless `--trigger`
//! is given.
//!
//! # Usage
//!
//! ```bash
//! # Dry-run an ingest of one batch
//! trigger-app data_ingest -i batch_07/2021 -c forward_stream
//!
//! # Actually schedule py-tropess processing for one day
//! trigger-app --trigger py_tropess -c forward_stream -s CrIS-SNPP \
//!     -d 2021-07-04 -p standard
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tropess_deploy::airflow::ops::{self, DataIngestArgs, PyTropessArgs, TriggerContext};
use tropess_deploy::airflow::AirflowClient;
use tropess_deploy::catalog::DataServicesClient;
use tropess_deploy::config::MdpsConfig;
use tropess_deploy::{setup_logging, APP_NAME, VERSION};

/// Deployment directory used when none is specified.
const DEFAULT_DEPLOY_DIR: &str = "workflows";

/// Default MUSES collection version.
const DEFAULT_MUSES_VERSION: &str = "1";

/// Default TROPESS granule version.
const DEFAULT_TROPESS_VERSION: &str = "2";

#[derive(Debug)]
enum Command {
    DataIngest {
        input_path: Option<String>,
        collection_keyword: Option<String>,
        base_path: Option<String>,
        collection_version: Option<String>,
    },
    PyTropess {
        collection_keyword: Option<String>,
        processing_date: Option<String>,
        product_type: Option<String>,
        sensor_set: Option<String>,
        species: Option<String>,
        muses_version: String,
        tropess_version: String,
    },
}

/// Command-line configuration parsed from arguments.
#[derive(Debug)]
struct Config {
    debug: bool,
    trigger: bool,
    deploy_base_dir: PathBuf,
    command: Command,
}

/// Prints usage information.
fn print_usage() {
    println!("Usage: trigger-app [OPTIONS] <COMMAND> [COMMAND OPTIONS]");
    println!();
    println!("Commands:");
    println!("  data_ingest   Schedule ingestion of data from the TROPESS archive into MDPS");
    println!("  py_tropess    Initiate processing of data through py-tropess");
    println!();
    println!("Options:");
    println!("  --trigger              Submit the DAG run instead of performing a dry run");
    println!("  --deployment_dir DIR   Location of CWL artifacts (default: {})", DEFAULT_DEPLOY_DIR);
    println!("  --debug                Enable verbose debug logging");
    println!("  --help                 Show this help message");
    println!("  --version              Show version information");
    println!();
    println!("data_ingest options:");
    println!("  -i, --input_path PATH          Path under the base path with files to ingest (required)");
    println!("  -c, --collection_keyword KW    Collection group of the data being ingested (required)");
    println!("  -b, --base_path URL            Base URL path where data is sourced from");
    println!("  -v, --version VER              Collection version for the data being ingested");
    println!();
    println!("py_tropess options:");
    println!("  -c, --collection_keyword KW    Collection group of the data being processed (required)");
    println!("  -d, --date DATE                Calendar date of the MUSES data to process (required)");
    println!("  -p, --product TYPE             Product type: summary/standard/full (required)");
    println!("  -s, --sensor_set SET           Sensor set, required for multi-sensor groups");
    println!("      --species LIST             Comma separated species other than all valid ones");
    println!("      --muses_version VER        MUSES collection version (default: {})", DEFAULT_MUSES_VERSION);
    println!("      --tropess_version VER      Granule version delivered to the DAAC (default: {})", DEFAULT_TROPESS_VERSION);
}

/// Consumes the value following a flag.
fn take_value(args: &[String], i: &mut usize, flag: &str) -> Result<String, String> {
    *i += 1;
    if *i >= args.len() {
        return Err(format!("{} requires a value", flag));
    }
    Ok(args[*i].clone())
}

/// Parses the data_ingest subcommand options.
fn parse_data_ingest(args: &[String], mut i: usize) -> Result<Command, String> {
    let mut input_path = None;
    let mut collection_keyword = None;
    let mut base_path = None;
    let mut collection_version = None;

    while i < args.len() {
        match args[i].as_str() {
            "-i" | "--input_path" => input_path = Some(take_value(args, &mut i, "--input_path")?),
            "-c" | "--collection_keyword" => {
                collection_keyword = Some(take_value(args, &mut i, "--collection_keyword")?)
            }
            "-b" | "--base_path" => base_path = Some(take_value(args, &mut i, "--base_path")?),
            "-v" | "--version" => {
                collection_version = Some(take_value(args, &mut i, "--version")?)
            }
            arg => return Err(format!("Unknown data_ingest option: {}", arg)),
        }
        i += 1;
    }

    Ok(Command::DataIngest {
        input_path,
        collection_keyword,
        base_path,
        collection_version,
    })
}

/// Parses the py_tropess subcommand options.
fn parse_py_tropess(args: &[String], mut i: usize) -> Result<Command, String> {
    let mut collection_keyword = None;
    let mut processing_date = None;
    let mut product_type = None;
    let mut sensor_set = None;
    let mut species = None;
    let mut muses_version = DEFAULT_MUSES_VERSION.to_string();
    let mut tropess_version = DEFAULT_TROPESS_VERSION.to_string();

    while i < args.len() {
        match args[i].as_str() {
            "-c" | "--collection_keyword" => {
                collection_keyword = Some(take_value(args, &mut i, "--collection_keyword")?)
            }
            "-d" | "--date" => processing_date = Some(take_value(args, &mut i, "--date")?),
            "-p" | "--product" => product_type = Some(take_value(args, &mut i, "--product")?),
            "-s" | "--sensor_set" => sensor_set = Some(take_value(args, &mut i, "--sensor_set")?),
            "--species" => species = Some(take_value(args, &mut i, "--species")?),
            "--muses_version" => muses_version = take_value(args, &mut i, "--muses_version")?,
            "--tropess_version" => tropess_version = take_value(args, &mut i, "--tropess_version")?,
            arg => return Err(format!("Unknown py_tropess option: {}", arg)),
        }
        i += 1;
    }

    Ok(Command::PyTropess {
        collection_keyword,
        processing_date,
        product_type,
        sensor_set,
        species,
        muses_version,
        tropess_version,
    })
}

/// Parses command-line arguments into a Config struct.
fn parse_arguments(args: &[String]) -> Result<Config, String> {
    let mut debug = false;
    let mut trigger = false;
    let mut deploy_base_dir = PathBuf::from(DEFAULT_DEPLOY_DIR);
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
            "--trigger" => trigger = true,
            "--deployment_dir" => {
                deploy_base_dir = PathBuf::from(take_value(args, &mut i, "--deployment_dir")?)
            }
            "data_ingest" => {
                return Ok(Config {
                    debug,
                    trigger,
                    deploy_base_dir,
                    command: parse_data_ingest(args, i + 1)?,
                });
            }
            "py_tropess" => {
                return Ok(Config {
                    debug,
                    trigger,
                    deploy_base_dir,
                    command: parse_py_tropess(args, i + 1)?,
                });
            }
            arg => return Err(format!("Unknown option or command: {}", arg)),
        }
        i += 1;
    }

    Err("a command is required (data_ingest or py_tropess)".to_string())
}

/// Reads a default value from an application's example job input.
fn job_default(deploy_base_dir: &Path, app_dir: &str, key: &str) -> Option<String> {
    let job_file = deploy_base_dir.join(app_dir).join("example_job_input.json");
    let content = fs::read_to_string(job_file).ok()?;
    let document: serde_json::Value = serde_json::from_str(&content).ok()?;

    document.get(key)?.as_str().map(str::to_string)
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
    let context = TriggerContext {
        config: mdps,
        deploy_base_dir: config.deploy_base_dir.clone(),
        commit: config.trigger,
    };

    let airflow = AirflowClient::from_env()?;

    match config.command {
        Command::DataIngest {
            input_path,
            collection_keyword,
            base_path,
            collection_version,
        } => {
            // Values missing on the command line fall back to the job file
            let base_path = base_path.or_else(|| {
                job_default(&config.deploy_base_dir, ops::DATA_INGEST_DIR, "input_data_base_path")
            });
            let collection_version = collection_version.or_else(|| {
                job_default(&config.deploy_base_dir, ops::DATA_INGEST_DIR, "collection_version")
            });

            let ingest_args = DataIngestArgs {
                input_data_ingest_path: input_path.ok_or("--input_path is required")?,
                collection_group_keyword: collection_keyword
                    .ok_or("--collection_keyword is required")?,
                input_data_base_path: base_path
                    .ok_or("--base_path is required and has no job file default")?,
                collection_version: collection_version
                    .ok_or("--version is required and has no job file default")?,
            };

            ops::data_ingest(&context, &airflow, &ingest_args)?;
        }
        Command::PyTropess {
            collection_keyword,
            processing_date,
            product_type,
            sensor_set,
            species,
            muses_version,
            tropess_version,
        } => {
            let catalog_client = DataServicesClient::connect(&context.config)?;

            let tropess_args = PyTropessArgs {
                collection_group_keyword: collection_keyword
                    .ok_or("--collection_keyword is required")?,
                processing_date: processing_date.ok_or("--date is required")?,
                product_type: product_type.ok_or("--product is required")?,
                sensor_set,
                processing_species: species,
                muses_collection_version: muses_version,
                granule_version: tropess_version,
            };

            ops::py_tropess(&context, &airflow, &catalog_client, &tropess_args)?;
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

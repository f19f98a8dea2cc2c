//! TROPESS Deployment Tooling for MDPS
//!
//! Deployment and data-staging support for processing TROPESS products on
//! the Unity platform: staging input granules, exercising deployed
//! workflow descriptors, registering collections with data services,
//! building application images, and triggering processing runs.
//!
//! # Architecture
//!
//! The library is organized into seven modules:
//!
//! - [`config`]: MDPS environment settings and credential forwarding
//! - [`cwl`]: Workflow descriptor model and job-input templates
//! - [`stac`]: STAC manifest access and catalog summaries
//! - [`runner`]: Workflow runner invocation (stage-in and test harness)
//! - [`catalog`]: Product registry and data services client
//! - [`airflow`]: Processing DAG triggering
//! - [`deploy`]: Application builds and artifact capture
//!
//! Each console tool under `src/bin/` is a thin argument-parsing wrapper
//! over one of these modules.
//!
//! # Example
//!
//! ```rust,no_run
//! use tropess_deploy::runner::StageInJob;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Localize the granules referenced by a STAC manifest
//!     StageInJob::new("catalog.json")
//!         .with_download_dir("/data/staged")
//!         .run()?;
//!     Ok(())
//! }
//! ```

pub mod airflow;
pub mod catalog;
pub mod config;
pub mod cwl;
pub mod deploy;
pub mod error;
pub mod runner;
pub mod stac;

// Re-export commonly used types
pub use config::MdpsConfig;
pub use cwl::{load_descriptor, Descriptor};
pub use error::{DeployError, Result};
pub use runner::{StageInJob, TestRun};
pub use stac::Catalog;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "tropess-deploy";

/// Configures the logging system with appropriate formatting.
///
/// Shared by every console tool: INFO records print bare, WARN and ERROR
/// carry their level, `verbose` raises the default filter to debug.
pub fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            use std::io::Write;

            match record.level() {
                log::Level::Warn | log::Level::Error => {
                    writeln!(buf, "[{}] {}", record.level(), record.args())
                }
                _ => writeln!(buf, "{}", record.args()),
            }
        })
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_app_name() {
        assert_eq!(APP_NAME, "tropess-deploy");
    }

    #[test]
    fn test_module_exports_stage_in() {
        let job = StageInJob::new("catalog.json");
        assert_eq!(
            job.download_dir(),
            std::path::Path::new(runner::DEFAULT_DOWNLOAD_DIR)
        );
    }

    #[test]
    fn test_module_exports_config() {
        let config = MdpsConfig::from_lookup(|_| None);
        assert_eq!(config.project, "unity");
    }
}

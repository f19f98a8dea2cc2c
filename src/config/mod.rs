//! MDPS Environment Settings
//!
//! Resolves the project/venue/environment triple that scopes every MDPS
//! interaction, plus the credential and endpoint variables the tools read.
//!
//! Values come from the process environment, optionally seeded from a `.env`
//! file. Defaults match the operational deployment (`unity`/`ops`/`PROD`).

use std::env;
use std::path::Path;

use log::{debug, info};

use crate::error::{DeployError, Result};

/// Default MDPS project name.
pub const DEFAULT_PROJECT: &str = "unity";

/// Default MDPS venue name.
pub const DEFAULT_VENUE: &str = "ops";

/// Default MDPS environment name.
pub const DEFAULT_ENVIRONMENT: &str = "PROD";

/// Credential variables forwarded verbatim to the workflow runner.
///
/// Only variables from this allow-list are ever forwarded, and each one only
/// when it is set in the calling environment.
pub const CREDENTIAL_VARS: &[&str] = &[
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
    "AWS_SESSION_TOKEN",
];

/// Scoping settings for MDPS interactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MdpsConfig {
    /// MDPS project name (e.g. "unity")
    pub project: String,

    /// MDPS venue name (e.g. "ops", "test")
    pub venue: String,

    /// MDPS environment name (e.g. "PROD", "TEST")
    pub environment: String,
}

impl MdpsConfig {
    /// Loads settings from the process environment.
    ///
    /// When `env_file` is given it must exist and is loaded first; otherwise
    /// a `.env` file in the current directory is loaded if present.
    pub fn load(env_file: Option<&Path>) -> Result<Self> {
        match env_file {
            Some(path) => {
                dotenvy::from_path(path).map_err(|e| {
                    DeployError::config(format!(
                        "could not load environment file '{}': {}",
                        path.display(),
                        e
                    ))
                })?;
                debug!("Loaded environment from {}", path.display());
            }
            None => {
                if dotenvy::dotenv().is_ok() {
                    debug!("Loaded environment from .env");
                }
            }
        }

        Ok(Self::from_env())
    }

    /// Resolves settings from already-set environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Resolves settings through an arbitrary variable lookup.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let config = Self {
            project: get("PROJECT").unwrap_or_else(|| DEFAULT_PROJECT.to_string()),
            venue: get("VENUE").unwrap_or_else(|| DEFAULT_VENUE.to_string()),
            environment: get("ENVIRONMENT").unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
        };

        info!(
            "Using MDPS project = {}, venue = {}, environment = {}",
            config.project, config.venue, config.environment
        );

        config
    }
}

/// Returns the bearer token used for MDPS service requests.
pub fn auth_token() -> Result<String> {
    env::var("MDPS_AUTH_TOKEN")
        .map_err(|_| DeployError::config("MDPS_AUTH_TOKEN is not set"))
}

/// Returns the base URL of the MDPS data services API.
pub fn data_services_url() -> Result<String> {
    env::var("DATA_SERVICES_URL")
        .map_err(|_| DeployError::config("DATA_SERVICES_URL is not set"))
}

/// Returns the Airflow API base URL for the processing system.
pub fn airflow_api_url() -> Result<String> {
    env::var("AIRFLOW_API_URL")
        .map_err(|_| DeployError::config("AIRFLOW_API_URL is not set"))
}

/// Credential variables that are set in the calling environment.
pub fn credential_env() -> Vec<(String, String)> {
    credential_env_from(|name| env::var(name).ok())
}

/// Filters the credential allow-list through an arbitrary variable lookup.
pub fn credential_env_from(get: impl Fn(&str) -> Option<String>) -> Vec<(String, String)> {
    CREDENTIAL_VARS
        .iter()
        .filter_map(|name| get(name).map(|value| (name.to_string(), value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_defaults() {
        let config = MdpsConfig::from_lookup(|_| None);

        assert_eq!(config.project, "unity");
        assert_eq!(config.venue, "ops");
        assert_eq!(config.environment, "PROD");
    }

    #[test]
    fn test_config_overrides() {
        let vars: HashMap<&str, &str> =
            [("PROJECT", "tropess"), ("VENUE", "test")].into_iter().collect();

        let config = MdpsConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.project, "tropess");
        assert_eq!(config.venue, "test");
        assert_eq!(config.environment, "PROD");
    }

    #[test]
    fn test_credential_env_only_set_vars() {
        let vars: HashMap<&str, &str> = [
            ("AWS_ACCESS_KEY_ID", "AKIA123"),
            ("AWS_SESSION_TOKEN", "token"),
        ]
        .into_iter()
        .collect();

        let forwarded = credential_env_from(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(forwarded.len(), 2);
        assert!(forwarded.contains(&("AWS_ACCESS_KEY_ID".to_string(), "AKIA123".to_string())));
        assert!(!forwarded.iter().any(|(name, _)| name == "AWS_SECRET_ACCESS_KEY"));
    }

    #[test]
    fn test_credential_env_ignores_unlisted_vars() {
        let vars: HashMap<&str, &str> = [("HOME", "/home/ops")].into_iter().collect();

        let forwarded = credential_env_from(|name| vars.get(name).map(|v| v.to_string()));
        assert!(forwarded.is_empty());
    }

    #[test]
    fn test_load_missing_env_file() {
        let result = MdpsConfig::load(Some(Path::new("/nonexistent/config.env")));
        assert!(result.is_err());
    }
}

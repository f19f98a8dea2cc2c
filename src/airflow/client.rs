//! Airflow API Client
//!
//! Thin client for the dagRuns endpoint of the MDPS Airflow deployment.
//! The DAG itself is fixed; each run carries the process workflow URL, a
//! STAC manifest reference, and the application arguments serialized as a
//! single JSON string inside the run configuration.

use std::env;
use std::time::Duration;

use chrono::Utc;
use log::{debug, info};
use serde_json::Value;

use crate::config;
use crate::error::{DeployError, Result};

/// DAG triggered for all TROPESS processing.
pub const DEFAULT_DAG_NAME: &str = "cwl_dag_modular";

/// EC2 instance type requested for processing pods.
pub const REQUEST_INSTANCE_TYPE: &str = "t3.medium";

/// Storage requested for processing pods.
pub const REQUEST_STORAGE: &str = "10Gi";

/// Timeout for trigger requests.
const TRIGGER_TIMEOUT: Duration = Duration::from_secs(15);

/// One DAG run to submit.
#[derive(Debug, Clone)]
pub struct DagRun {
    /// Unique run identifier, formed from the trigger inputs
    pub run_id: String,

    /// URL of the process workflow descriptor
    pub process_workflow: String,

    /// Application arguments, serialized into the run configuration
    pub process_args: Value,

    /// STAC manifest reference handed to the stage-in step
    pub stac_json: String,

    /// Resolve the container image through ECR
    pub use_ecr: bool,

    /// Authenticate STAC asset downloads with the venue credentials
    pub use_stac_auth: bool,
}

impl DagRun {
    /// Builds the dagRuns request payload.
    pub fn payload(&self, logical_date: &str) -> Result<Value> {
        Ok(serde_json::json!({
            "dag_run_id": self.run_id,
            "logical_date": logical_date,
            "conf": {
                "process_args": serde_json::to_string(&self.process_args)?,
                "process_workflow": self.process_workflow,
                "stac_json": self.stac_json,
                "request_instance_type": REQUEST_INSTANCE_TYPE,
                "request_storage": REQUEST_STORAGE,
                "use_ecr": self.use_ecr,
                "unity_stac_auth_type": self.use_stac_auth,
            },
        }))
    }
}

/// Client for the MDPS Airflow API.
pub struct AirflowClient {
    http: reqwest::blocking::Client,
    api_url: String,
    dag_name: String,
    token: String,
}

impl AirflowClient {
    /// Connects using `AIRFLOW_API_URL` and the venue bearer token.
    ///
    /// `AIRFLOW_DAG_NAME` overrides the DAG triggered.
    pub fn from_env() -> Result<Self> {
        let api_url = config::airflow_api_url()?;
        let dag_name = env::var("AIRFLOW_DAG_NAME").unwrap_or_else(|_| DEFAULT_DAG_NAME.to_string());
        let token = config::auth_token()?;

        let http = reqwest::blocking::Client::builder()
            .timeout(TRIGGER_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            api_url,
            dag_name,
            token,
        })
    }

    /// URL of the dagRuns endpoint.
    pub fn trigger_url(&self) -> String {
        format!(
            "{}/dags/{}/dagRuns",
            self.api_url.trim_end_matches('/'),
            self.dag_name
        )
    }

    /// Submits a DAG run, or logs it as a dry run.
    pub fn trigger(&self, run: &DagRun, commit: bool) -> Result<()> {
        let trigger_url = self.trigger_url();
        info!("Using Airflow API URL: {}", trigger_url);

        let logical_date = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let payload = run.payload(&logical_date)?;

        debug!("DAG parameters:");
        debug!("{}", serde_json::to_string_pretty(&payload)?);

        if !commit {
            info!("Airflow DAG dry-run only");
            return Ok(());
        }

        info!("Triggering Airflow DAG at: {}", trigger_url);

        let response = self
            .http
            .post(&trigger_url)
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .json(&payload)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeployError::api(
                format!("Error triggering Airflow DAG at {}", trigger_url),
                status.as_u16(),
                response.text().unwrap_or_default(),
            ));
        }

        debug!("Response JSON:");
        debug!("{}", response.text().unwrap_or_default());

        Ok(())
    }
}

/// Checks that a deploy-files URL answers a plain GET.
pub fn verify_file_url(url: &str) -> Result<()> {
    let response = reqwest::blocking::get(url)?;
    let status = response.status();

    if !status.is_success() {
        return Err(DeployError::api(
            format!("Invalid file url: {}", url),
            status.as_u16(),
            response.text().unwrap_or_default(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_run() -> DagRun {
        DagRun {
            run_id: "TROPESS-py_tropess_1.4.2-forward_stream".to_string(),
            process_workflow: "https://example.com/process-unity-ops.cwl".to_string(),
            process_args: serde_json::json!({
                "product_type": "standard",
                "granule_version": "2",
            }),
            stac_json: "https://example.com/catalog.json".to_string(),
            use_ecr: true,
            use_stac_auth: true,
        }
    }

    #[test]
    fn test_payload_shape() {
        let payload = sample_run().payload("2026-08-05T00:00:00Z").unwrap();

        assert_eq!(payload["dag_run_id"], "TROPESS-py_tropess_1.4.2-forward_stream");
        assert_eq!(payload["logical_date"], "2026-08-05T00:00:00Z");
        assert_eq!(payload["conf"]["request_instance_type"], "t3.medium");
        assert_eq!(payload["conf"]["request_storage"], "10Gi");
        assert_eq!(payload["conf"]["use_ecr"], true);
    }

    #[test]
    fn test_trigger_url_joins_dag_path() {
        let client = AirflowClient {
            http: reqwest::blocking::Client::new(),
            api_url: "https://airflow.example.com/api/v1/".to_string(),
            dag_name: DEFAULT_DAG_NAME.to_string(),
            token: "token".to_string(),
        };

        assert_eq!(
            client.trigger_url(),
            "https://airflow.example.com/api/v1/dags/cwl_dag_modular/dagRuns"
        );
    }

    #[test]
    fn test_payload_process_args_single_line() {
        let payload = sample_run().payload("2026-08-05T00:00:00Z").unwrap();

        // Serialized into the conf as one JSON string, not an object
        let args = payload["conf"]["process_args"].as_str().unwrap();
        assert!(!args.contains('\n'));

        let parsed: Value = serde_json::from_str(args).unwrap();
        assert_eq!(parsed["product_type"], "standard");
    }
}

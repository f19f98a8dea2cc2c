//! Trigger Operations
//!
//! The two processing entry points: scheduling ingestion of MUSES data
//! into MDPS, and scheduling py-tropess product generation from already
//! ingested MUSES collections. Both resolve the per-venue workflow
//! artifact, verify every remote reference, and then hand a DAG run to
//! the Airflow client.

use std::path::PathBuf;

use log::info;
use serde_json::json;

use crate::catalog::{products, DataServicesClient};
use crate::catalog::client::processing_date_filter;
use crate::config::MdpsConfig;
use crate::cwl;
use crate::error::{DeployError, Result};
use crate::stac;

use super::client::{verify_file_url, AirflowClient, DagRun};

/// Raw-content base URL where deployed artifact files are published.
pub const DEPLOY_FILES_BASE_URL: &str =
    "https://raw.githubusercontent.com/unity-sds/mdps-tropess-deploy/refs/heads/main/workflows/";

/// Artifact directory of the data-ingest application.
pub const DATA_INGEST_DIR: &str = "mdps-muses-data-ingest";

/// Artifact directory of the py-tropess application.
pub const PY_TROPESS_DIR: &str = "py-tropess";

/// Expected layout under the ingest base path.
const EXPECTED_INGEST_SUBDIRS: &[&str] = &["L2_Products", "L2_Products_Lite"];

/// Shared context for trigger operations.
pub struct TriggerContext {
    pub config: MdpsConfig,

    /// Directory holding the deployed workflow artifacts
    pub deploy_base_dir: PathBuf,

    /// Submit the DAG run; otherwise every operation is a dry run
    pub commit: bool,
}

impl TriggerContext {
    /// Relative artifact path of an application's per-venue workflow.
    pub fn workflow_artifact(&self, app_dir: &str) -> String {
        format!(
            "{}/process-{}-{}.cwl",
            app_dir, self.config.project, self.config.venue
        )
    }

    /// Resolves the published workflow URL and its docker tag.
    ///
    /// The artifact must exist in the local deployment checkout; its
    /// docker tag identifies the application build in run ids. The
    /// published URL is verified with a GET before use.
    pub fn process_workflow_url(&self, app_dir: &str) -> Result<(String, String)> {
        let artifact = self.workflow_artifact(app_dir);
        let local_path = self.deploy_base_dir.join(&artifact);

        if !local_path.is_file() {
            return Err(DeployError::validation(format!(
                "Could not find process workflow descriptor: {}",
                local_path.display()
            )));
        }

        let descriptor = cwl::load_descriptor(&local_path)?;
        let docker_tag = descriptor.docker_tag().ok_or_else(|| {
            DeployError::validation(format!(
                "Descriptor {} has no docker image tag",
                local_path.display()
            ))
        })?;

        let workflow_url = format!("{}{}", DEPLOY_FILES_BASE_URL, artifact);
        verify_file_url(&workflow_url)?;
        info!("Using workflow descriptor: {}", workflow_url);

        Ok((workflow_url, docker_tag.to_string()))
    }
}

/// Arguments of the data-ingest trigger.
#[derive(Debug, Clone)]
pub struct DataIngestArgs {
    /// Path under the base path with files to be ingested
    pub input_data_ingest_path: String,

    pub collection_group_keyword: String,

    /// Base URL path where data is sourced from
    pub input_data_base_path: String,

    pub collection_version: String,
}

/// Run id for a data-ingest DAG run.
pub fn data_ingest_run_id(docker_tag: &str, collection_keyword: &str, ingest_path: &str) -> String {
    format!(
        "TROPESS-data_ingest_{}-{}:{}",
        docker_tag,
        collection_keyword,
        ingest_path.replace('/', "-")
    )
}

/// Validates that an ingest path at least names the expected layout.
fn check_ingest_path(ingest_path: &str) -> Result<()> {
    if ingest_path.trim().is_empty() {
        return Err(DeployError::validation("Ingest path must not be empty"));
    }

    info!("Ingesting data from path: {}", ingest_path);
    info!("Expecting the path to contain:");
    for subdir in EXPECTED_INGEST_SUBDIRS {
        info!(" - {}", subdir);
    }

    Ok(())
}

/// Schedules ingestion of data from the TROPESS archive into MDPS.
pub fn data_ingest(
    context: &TriggerContext,
    airflow: &AirflowClient,
    args: &DataIngestArgs,
) -> Result<()> {
    products::get_collection_group(&args.collection_group_keyword)?;
    check_ingest_path(&args.input_data_ingest_path)?;

    let process_args = json!({
        "input_data_ingest_path": args.input_data_ingest_path,
        "collection_group_keyword": args.collection_group_keyword,
        "input_data_base_path": args.input_data_base_path,
        "collection_version": args.collection_version,
    });

    let (workflow_url, docker_tag) = context.process_workflow_url(DATA_INGEST_DIR)?;

    // Ingest stages nothing in, so the published empty manifest is used
    let stac_json_url = format!("{}{}/stage_in.json", DEPLOY_FILES_BASE_URL, DATA_INGEST_DIR);
    verify_file_url(&stac_json_url)?;
    info!("Using STAC JSON: {}", stac_json_url);

    let run = DagRun {
        run_id: data_ingest_run_id(
            &docker_tag,
            &args.collection_group_keyword,
            &args.input_data_ingest_path,
        ),
        process_workflow: workflow_url,
        process_args,
        stac_json: stac_json_url,
        use_ecr: true,
        use_stac_auth: false,
    };

    airflow.trigger(&run, context.commit)
}

/// Arguments of the py-tropess trigger.
#[derive(Debug, Clone)]
pub struct PyTropessArgs {
    pub collection_group_keyword: String,

    /// Calendar date of the MUSES data to process (`YYYY-MM-DD`)
    pub processing_date: String,

    /// Product type to create (summary/standard/full)
    pub product_type: String,

    /// Required when the collection group has multiple sensor sets
    pub sensor_set: Option<String>,

    /// Species to generate other than all valid ones
    pub processing_species: Option<String>,

    pub muses_collection_version: String,

    pub granule_version: String,
}

/// Run id for a py-tropess DAG run.
pub fn py_tropess_run_id(
    docker_tag: &str,
    collection_keyword: &str,
    sensor_set: Option<&str>,
    processing_date: &str,
    product_type: &str,
    processing_species: Option<&str>,
) -> String {
    let mut run_id = format!(
        "TROPESS-py_tropess_{}-{}-{}-{}-{}",
        docker_tag,
        collection_keyword,
        sensor_set.unwrap_or("all"),
        processing_date,
        product_type
    );

    if let Some(species) = processing_species {
        run_id.push('-');
        run_id.push_str(&species.replace(' ', ""));
    }

    run_id
}

/// Finds the MUSES input catalog for one processing date.
///
/// Errors when the group resolves to more than one MUSES collection
/// (a sensor set must be chosen) or when the query yields no netCDF
/// granules. Returns the query result's first link as the manifest URL.
pub fn query_input_data(
    catalog_client: &DataServicesClient,
    context: &TriggerContext,
    args: &PyTropessArgs,
) -> Result<String> {
    let group = products::get_collection_group(&args.collection_group_keyword)?;

    let muses_ids = products::muses_collection_ids(
        &context.config,
        group,
        &args.muses_collection_version,
        args.sensor_set.as_deref(),
    )?;

    if muses_ids.len() > 1 {
        return Err(DeployError::validation(format!(
            "Multiple sensor sets for the {} collection group, add a sensor_set argument to filter",
            group.keyword
        )));
    }

    let filter = processing_date_filter(Some(&args.processing_date), None)?;
    let result = catalog_client.query_collection(&muses_ids[0], filter.as_deref(), 10_000)?;

    let nc_files = stac::netcdf_assets(&result);
    if nc_files.is_empty() {
        return Err(DeployError::validation("Found 0 files to process"));
    }

    info!("Found {} files to process:", nc_files.len());
    for filename in &nc_files {
        info!(" - {}", filename);
    }

    result
        .stage_in_href()
        .map(str::to_string)
        .ok_or_else(|| DeployError::validation("Catalog query result carries no links"))
}

/// Schedules py-tropess processing of ingested MUSES data.
pub fn py_tropess(
    context: &TriggerContext,
    airflow: &AirflowClient,
    catalog_client: &DataServicesClient,
    args: &PyTropessArgs,
) -> Result<()> {
    products::get_product_type(&args.product_type)?;

    let stac_json_url = query_input_data(catalog_client, context, args)?;

    let mut process_args = json!({
        "product_type": args.product_type,
        "granule_version": args.granule_version,
    });

    // Only set when a real species list was given
    if let Some(species) = species_filter(args.processing_species.as_deref()) {
        process_args["processing_species"] = json!(species);
    }

    let (workflow_url, docker_tag) = context.process_workflow_url(PY_TROPESS_DIR)?;

    let run = DagRun {
        run_id: py_tropess_run_id(
            &docker_tag,
            &args.collection_group_keyword,
            args.sensor_set.as_deref(),
            &args.processing_date,
            &args.product_type,
            species_filter(args.processing_species.as_deref()),
        ),
        process_workflow: workflow_url,
        process_args,
        stac_json: stac_json_url,
        use_ecr: true,
        use_stac_auth: true,
    };

    airflow.trigger(&run, context.commit)
}

/// Treats "null" and empty strings as no species filter.
fn species_filter(species: Option<&str>) -> Option<&str> {
    match species {
        Some(value) if !value.trim().is_empty() && value != "null" => Some(value),
        _ => None,
    }
}

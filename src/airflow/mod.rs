//! Processing Trigger Module
//!
//! Schedules TROPESS processing by triggering the shared CWL DAG in the
//! MDPS Airflow deployment. Every trigger is a dry run unless explicitly
//! committed; the inputs (workflow artifact, STAC manifest, catalog
//! contents) are verified before anything is submitted.
//!
//! # Structure
//!
//! - [`client`]: Airflow API client and DAG-run payload
//! - [`ops`]: The data-ingest and py-tropess trigger operations

pub mod client;
pub mod ops;

pub use client::{AirflowClient, DagRun, DEFAULT_DAG_NAME, REQUEST_INSTANCE_TYPE, REQUEST_STORAGE};
pub use ops::{DataIngestArgs, PyTropessArgs, TriggerContext, DEPLOY_FILES_BASE_URL};

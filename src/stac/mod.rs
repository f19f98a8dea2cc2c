//! STAC Manifest Module
//!
//! Minimal access to the externally-defined STAC documents the tooling
//! touches: the stage-in manifests handed to the workflow runner and the
//! query results returned by the data catalog. Only the fields the tools
//! read are modeled; everything else passes through untouched.
//!
//! # Structure
//!
//! - [`model`]: Catalog/link/feature structures and manifest resolution
//! - [`summary`]: Per-date archive summaries and property checks

pub mod model;
pub mod summary;

pub use model::{resolve_manifest_ref, Catalog, Feature, Link};
pub use summary::{constant_property, date_status, is_archived, netcdf_assets, DateStatus};

//! Workflow Descriptor Module
//!
//! Data structures and parsing for the CWL documents that wrap each
//! deployed application. The descriptors are executed by the external
//! workflow runner; this module only reads them (docker image reference,
//! input defaults) and regenerates the job-input templates shipped next to
//! them.
//!
//! # Structure
//!
//! - [`model`]: Descriptor data structures
//! - [`parser`]: YAML loading, validation, job-input templates

pub mod model;
pub mod parser;

pub use model::{Descriptor, DockerRequirement, InputParameter, OutputParameter, Requirements};
pub use parser::{load_descriptor, merge_job_template};

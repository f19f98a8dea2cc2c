//! Workflow Runner Invocation Module
//!
//! Wraps the external `cwltool` runner: argument template construction,
//! container-runtime substitution, credential forwarding, the stage-in
//! wrapper, and the scratch-directory harness used to exercise deployed
//! descriptors.
//!
//! # Structure
//!
//! - [`runtime`]: Container runtime detection and credential forwarding
//! - [`invoke`]: Runner command construction and execution
//! - [`stage_in`]: Data stage-in wrapper
//! - [`harness`]: Generic descriptor test runner

pub mod harness;
pub mod invoke;
pub mod runtime;
pub mod stage_in;

pub use harness::TestRun;
pub use invoke::{RunnerInvocation, RUNNER_BIN};
pub use runtime::{runtime_flags, PODMAN_PATH};
pub use stage_in::{DescriptorSource, StageInJob, DEFAULT_DOWNLOAD_DIR};

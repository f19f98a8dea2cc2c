//! Descriptor Test Harness
//!
//! Runs a deployed descriptor against its example job input inside a
//! per-descriptor scratch tree, duplicating combined runner output to a log
//! file for later inspection. Used to exercise artifacts before they are
//! handed to the processing system.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::{DeployError, Result};

use super::invoke::RunnerInvocation;

/// Conventional job-input document shipped next to each descriptor.
pub const DEFAULT_JOB_INPUT: &str = "example_job_input.json";

/// A single test execution of a workflow descriptor.
#[derive(Debug, Clone)]
pub struct TestRun {
    descriptor: PathBuf,
    job_input: PathBuf,
    scratch_root: PathBuf,
    dry_run: bool,
}

impl TestRun {
    /// Creates a test run for a descriptor.
    ///
    /// The job input defaults to `example_job_input.json` next to the
    /// descriptor. Both files must exist.
    pub fn new(descriptor: impl Into<PathBuf>, job_input: Option<PathBuf>) -> Result<Self> {
        let descriptor = descriptor.into();

        if !descriptor.is_file() {
            return Err(DeployError::validation(format!(
                "Could not find workflow descriptor: {}",
                descriptor.display()
            )));
        }

        let job_input = job_input.unwrap_or_else(|| {
            descriptor
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(DEFAULT_JOB_INPUT)
        });

        if !job_input.is_file() {
            return Err(DeployError::validation(format!(
                "Could not find job input document: {}. Supply one explicitly or create it next to the descriptor.",
                job_input.display()
            )));
        }

        Ok(Self {
            descriptor,
            job_input,
            scratch_root: PathBuf::from("."),
            dry_run: false,
        })
    }

    /// Sets the directory scratch trees are created under.
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = root.into();
        self
    }

    /// Enables or disables dry run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Name of the scratch tree, taken from the descriptor file stem.
    fn scratch_name(&self) -> String {
        self.descriptor
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("workflow")
            .to_string()
    }

    /// Returns the scratch directory this run works in.
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_root.join(self.scratch_name())
    }

    /// Creates the scratch tree and invokes the runner from within it.
    pub fn run(&self) -> Result<()> {
        let scratch = self.scratch_dir();
        let inputs_dir = scratch.join("inputs");
        let outputs_dir = scratch.join("outputs");

        fs::create_dir_all(&inputs_dir)?;
        fs::create_dir_all(&outputs_dir)?;

        let log_file = scratch.join(format!("{}.log", self.scratch_name()));

        info!(
            "Testing {} with job input {}",
            self.descriptor.display(),
            self.job_input.display()
        );
        info!("Scratch directory: {}", scratch.display());

        // The runner executes from the inputs directory, so every path it
        // receives must be absolute.
        let descriptor = fs::canonicalize(&self.descriptor)?;
        let job_input = fs::canonicalize(&self.job_input)?;
        let outputs_dir = fs::canonicalize(&outputs_dir)?;
        let log_file = absolute_in(&log_file)?;

        RunnerInvocation::new(descriptor.display().to_string())
            .with_outdir(outputs_dir)
            .with_job_input(job_input)
            .with_working_dir(inputs_dir)
            .with_log_file(log_file)
            .with_dry_run(self.dry_run)
            .run()
    }
}

/// Absolute form of a path whose parent already exists.
fn absolute_in(path: &Path) -> Result<PathBuf> {
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => Ok(fs::canonicalize(parent)?.join(name)),
        _ => Ok(path.to_path_buf()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_artifacts(dir: &Path) -> PathBuf {
        let descriptor = dir.join("process-unity-ops.cwl");
        fs::write(&descriptor, "cwlVersion: v1.2\nclass: CommandLineTool\n").unwrap();
        fs::write(dir.join(DEFAULT_JOB_INPUT), "{}").unwrap();
        descriptor
    }

    #[test]
    fn test_missing_descriptor() {
        let result = TestRun::new("/nonexistent/process.cwl", None);

        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Could not find workflow descriptor"));
    }

    #[test]
    fn test_missing_job_input() {
        let temp_dir = tempdir().unwrap();
        let descriptor = temp_dir.path().join("process.cwl");
        fs::write(&descriptor, "cwlVersion: v1.2\n").unwrap();

        let result = TestRun::new(&descriptor, None);

        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Could not find job input document"));
    }

    #[test]
    fn test_sibling_job_input_default() {
        let temp_dir = tempdir().unwrap();
        let descriptor = write_artifacts(temp_dir.path());

        let run = TestRun::new(&descriptor, None).unwrap();
        assert_eq!(run.job_input, temp_dir.path().join(DEFAULT_JOB_INPUT));
    }

    #[test]
    fn test_explicit_job_input() {
        let temp_dir = tempdir().unwrap();
        let descriptor = write_artifacts(temp_dir.path());

        let other_input = temp_dir.path().join("other_input.json");
        fs::write(&other_input, "{}").unwrap();

        let run = TestRun::new(&descriptor, Some(other_input.clone())).unwrap();
        assert_eq!(run.job_input, other_input);
    }

    #[test]
    fn test_scratch_tree_layout() {
        let temp_dir = tempdir().unwrap();
        let descriptor = write_artifacts(temp_dir.path());

        let run = TestRun::new(&descriptor, None)
            .unwrap()
            .with_scratch_root(temp_dir.path())
            .with_dry_run(true);

        run.run().unwrap();

        let scratch = temp_dir.path().join("process-unity-ops");
        assert!(scratch.join("inputs").is_dir());
        assert!(scratch.join("outputs").is_dir());
    }
}

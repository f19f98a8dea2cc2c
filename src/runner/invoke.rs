//! Runner Command Construction and Execution
//!
//! Builds the fixed argument template around the external workflow runner
//! and executes it as a blocking child process. Credential variables from
//! the allow-list are forwarded explicitly; combined child output can be
//! duplicated to a log file (tee) for the test harness.

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;

use log::{debug, info};

use crate::config::credential_env;
use crate::error::{DeployError, Result};

use super::runtime::runtime_flags;

/// Name of the external workflow runner binary.
pub const RUNNER_BIN: &str = "cwltool";

/// A single invocation of the workflow runner.
///
/// The argument template is fixed: `--outdir` first, then the container
/// runtime substitution flag when applicable, then the descriptor, then
/// either a job-input document or `--name value` parameter pairs.
#[derive(Debug, Clone)]
pub struct RunnerInvocation {
    descriptor: String,
    outdir: Option<PathBuf>,
    job_input: Option<PathBuf>,
    parameters: Vec<(String, String)>,
    working_dir: Option<PathBuf>,
    log_file: Option<PathBuf>,
    dry_run: bool,
}

impl RunnerInvocation {
    /// Creates an invocation for a descriptor path or URL.
    pub fn new(descriptor: impl Into<String>) -> Self {
        Self {
            descriptor: descriptor.into(),
            outdir: None,
            job_input: None,
            parameters: Vec::new(),
            working_dir: None,
            log_file: None,
            dry_run: false,
        }
    }

    /// Sets the runner output directory.
    pub fn with_outdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.outdir = Some(dir.into());
        self
    }

    /// Sets a job-input document passed after the descriptor.
    pub fn with_job_input(mut self, path: impl Into<PathBuf>) -> Self {
        self.job_input = Some(path.into());
        self
    }

    /// Adds a named parameter (`--name value`).
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push((name.into(), value.into()));
        self
    }

    /// Sets the directory the runner executes from.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Duplicates combined runner output to a log file.
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Enables or disables dry run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Assembles the runner argument list.
    pub fn arguments(&self, runtime_flags: &[String]) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(outdir) = &self.outdir {
            args.push("--outdir".to_string());
            args.push(outdir.display().to_string());
        }

        args.extend(runtime_flags.iter().cloned());
        args.push(self.descriptor.clone());

        if let Some(job_input) = &self.job_input {
            args.push(job_input.display().to_string());
        }

        for (name, value) in &self.parameters {
            args.push(format!("--{}", name));
            args.push(value.clone());
        }

        args
    }

    /// Executes the runner and waits for it to finish.
    ///
    /// In dry run mode the command line is printed without executing.
    /// A nonzero exit status becomes an error.
    pub fn run(&self) -> Result<()> {
        let args = self.arguments(&runtime_flags());
        let command_line = format!("{} {}", RUNNER_BIN, args.join(" "));

        if self.dry_run {
            info!("[DRY RUN] {}", command_line);
            return Ok(());
        }

        info!("Invoking: {}", command_line);

        let mut cmd = Command::new(RUNNER_BIN);
        cmd.args(&args);
        cmd.envs(credential_env());

        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
            debug!("Executing in directory: {}", dir.display());
        }

        let status = match &self.log_file {
            Some(log_path) => run_with_tee(cmd, log_path)?,
            None => cmd.status().map_err(|e| {
                DeployError::validation(format!(
                    "Failed to launch {}: {}. Check that it is installed and on the PATH.",
                    RUNNER_BIN, e
                ))
            })?,
        };

        if status.success() {
            info!("{} completed successfully", RUNNER_BIN);
            Ok(())
        } else {
            Err(DeployError::ToolFailed {
                tool: RUNNER_BIN.to_string(),
                status: status.code().unwrap_or(-1),
            })
        }
    }
}

/// Runs a command while duplicating its combined output to a log file.
fn run_with_tee(mut cmd: Command, log_path: &PathBuf) -> Result<std::process::ExitStatus> {
    let log = File::create(log_path)?;
    let log = Arc::new(Mutex::new(log));

    let mut child = cmd
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            DeployError::validation(format!(
                "Failed to launch {}: {}. Check that it is installed and on the PATH.",
                RUNNER_BIN, e
            ))
        })?;

    let stdout = child.stdout.take().expect("stdout was piped");
    let stderr = child.stderr.take().expect("stderr was piped");

    let out_log = Arc::clone(&log);
    let out_thread = thread::spawn(move || tee_stream(stdout, out_log, false));

    let err_log = Arc::clone(&log);
    let err_thread = thread::spawn(move || tee_stream(stderr, err_log, true));

    let status = child.wait()?;

    // Reader threads end when the child closes its pipes
    let _ = out_thread.join();
    let _ = err_thread.join();

    info!("Runner output logged to {}", log_path.display());
    Ok(status)
}

/// Copies one child stream to the terminal and the shared log file.
fn tee_stream(stream: impl Read, log: Arc<Mutex<File>>, to_stderr: bool) {
    let reader = BufReader::new(stream);

    for line in reader.lines() {
        let Ok(line) = line else { break };

        if to_stderr {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }

        if let Ok(mut file) = log.lock() {
            let _ = writeln!(file, "{}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_template_order() {
        let invocation = RunnerInvocation::new("stage-in.cwl")
            .with_outdir("downloads")
            .with_parameter("stac_json", "catalog.json")
            .with_parameter("unity_client_id", "abc123");

        let args = invocation.arguments(&["--podman".to_string()]);

        assert_eq!(
            args,
            vec![
                "--outdir",
                "downloads",
                "--podman",
                "stage-in.cwl",
                "--stac_json",
                "catalog.json",
                "--unity_client_id",
                "abc123",
            ]
        );
    }

    #[test]
    fn test_argument_template_without_runtime_flag() {
        let invocation = RunnerInvocation::new("process.cwl");
        let args = invocation.arguments(&[]);

        assert_eq!(args, vec!["process.cwl"]);
    }

    #[test]
    fn test_argument_template_job_input_before_parameters() {
        let invocation = RunnerInvocation::new("process.cwl")
            .with_job_input("example_job_input.json")
            .with_parameter("product_type", "summary");

        let args = invocation.arguments(&[]);

        assert_eq!(
            args,
            vec![
                "process.cwl",
                "example_job_input.json",
                "--product_type",
                "summary",
            ]
        );
    }

    #[test]
    fn test_dry_run_does_not_execute() {
        let invocation = RunnerInvocation::new("process.cwl").with_dry_run(true);
        assert!(invocation.run().is_ok());
    }

    #[test]
    fn test_tee_writes_log_file() {
        use tempfile::tempdir;

        let temp_dir = tempdir().unwrap();
        let log_path = temp_dir.path().join("run.log");

        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo out_line; echo err_line >&2"]);

        let status = run_with_tee(cmd, &log_path).unwrap();
        assert!(status.success());

        let content = std::fs::read_to_string(&log_path).unwrap();
        assert!(content.contains("out_line"));
        assert!(content.contains("err_line"));
    }
}

//! Application Build and Artifact Capture
//!
//! Builds the deployable applications from their source repositories,
//! pushes the container images into the venue registry, and captures the
//! per-venue workflow artifacts back into this repository: the
//! `process-{project}-{venue}.cwl` descriptor and a regenerated
//! `example_job_input.json` that preserves manually edited values.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::Command;

use log::{debug, info};

use crate::config::MdpsConfig;
use crate::cwl;
use crate::error::{DeployError, Result};

/// Namespace for locally built container images.
pub const IMAGE_NAMESPACE: &str = "tropess";

/// Image tag used when none is given.
pub const DEFAULT_IMAGE_TAG: &str = "latest";

/// Directory under the deployment dir holding per-app build state.
pub const STATE_DIR: &str = ".app_state";

/// Descriptor filename produced by an application build.
const SOURCE_CWL_FILENAME: &str = "process.cwl";

/// A deployable application and its defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSpec {
    /// Name used on the command line
    pub name: &'static str,

    /// Default source repository
    pub source_repo: &'static str,

    /// Directory under the deployment dir where artifacts are captured
    pub artifact_dir: &'static str,
}

/// Applications built by this deployment.
pub static APPLICATIONS: &[AppSpec] = &[
    AppSpec {
        name: "muses_ingest",
        source_repo: "git@github.jpl.nasa.gov:MUSES-Processing/mdps-muses-data-ingest.git",
        artifact_dir: "mdps-muses-data-ingest",
    },
    AppSpec {
        name: "py_tropess",
        source_repo: "git@github.jpl.nasa.gov:MUSES-Processing/py-tropess.git",
        artifact_dir: "py-tropess",
    },
];

/// Looks up an application by name.
pub fn get_application(name: &str) -> Result<&'static AppSpec> {
    APPLICATIONS
        .iter()
        .find(|app| app.name == name)
        .ok_or_else(|| DeployError::validation(format!("Unknown application: {}", name)))
}

/// Resolves a source argument to a repository and optional checkout tag.
///
/// `@v1.2` selects tag `v1.2` of the default repository; any other value
/// replaces the repository; no value uses the default.
pub fn resolve_source(spec: &AppSpec, source: Option<&str>) -> (String, Option<String>) {
    match source {
        Some(value) if value.starts_with('@') => {
            (spec.source_repo.to_string(), Some(value[1..].to_string()))
        }
        Some(value) => (value.to_string(), None),
        None => (spec.source_repo.to_string(), None),
    }
}

/// Builds and captures artifacts for one application.
pub struct AppBuilder {
    spec: &'static AppSpec,
    config: MdpsConfig,
    deploy_base_dir: PathBuf,
    dry_run: bool,
}

impl AppBuilder {
    /// Creates a builder working under a deployment directory.
    pub fn new(spec: &'static AppSpec, config: MdpsConfig, deploy_base_dir: impl Into<PathBuf>) -> Self {
        Self {
            spec,
            config,
            deploy_base_dir: deploy_base_dir.into(),
            dry_run: false,
        }
    }

    /// Enables or disables dry run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Per-application build state directory.
    fn state_dir(&self) -> PathBuf {
        self.deploy_base_dir.join(STATE_DIR).join(self.spec.name)
    }

    /// Where the application source is checked out.
    fn checkout_dir(&self) -> PathBuf {
        self.state_dir().join("repo")
    }

    /// Local image reference for a tag.
    pub fn image_ref(&self, tag: &str) -> String {
        format!("{}/{}:{}", IMAGE_NAMESPACE, self.spec.artifact_dir, tag)
    }

    /// Clones the application source into the build state directory.
    ///
    /// An existing checkout is removed first so stale history cannot leak
    /// into the build.
    pub fn init_repo(&self, source: Option<&str>) -> Result<()> {
        let (repo, checkout_tag) = resolve_source(self.spec, source);

        match &checkout_tag {
            Some(tag) => info!(
                "Initializing {} from {} @ {} for {}/{}",
                self.spec.name, repo, tag, self.config.project, self.config.venue
            ),
            None => info!(
                "Initializing {} from {} for {}/{}",
                self.spec.name, repo, self.config.project, self.config.venue
            ),
        }

        let checkout_dir = self.checkout_dir();
        if checkout_dir.exists() {
            debug!("Removing existing checkout dir {}", checkout_dir.display());
            if !self.dry_run {
                fs::remove_dir_all(&checkout_dir)?;
            }
        }

        if !self.dry_run {
            fs::create_dir_all(self.state_dir())?;
        }

        let mut args = vec!["clone".to_string()];
        if let Some(tag) = &checkout_tag {
            args.push("--branch".to_string());
            args.push(tag.clone());
            args.push("--depth".to_string());
            args.push("1".to_string());
        }
        args.push(repo);
        args.push(checkout_dir.display().to_string());

        self.run_tool("git", &args)
    }

    /// Builds the application container image.
    pub fn build_image(&self, tag: &str) -> Result<()> {
        info!(
            "Building {} for {}/{}",
            self.spec.name, self.config.project, self.config.venue
        );

        self.run_tool(
            "docker",
            &[
                "build".to_string(),
                "-t".to_string(),
                self.image_ref(tag),
                self.checkout_dir().display().to_string(),
            ],
        )
    }

    /// Pushes the image into the venue container registry.
    ///
    /// The registry host comes from `CONTAINER_REGISTRY`. Returns the
    /// pushed remote reference.
    pub fn push_image(&self, tag: &str) -> Result<String> {
        let registry = env::var("CONTAINER_REGISTRY")
            .map_err(|_| DeployError::config("CONTAINER_REGISTRY is not set"))?;

        let local_ref = self.image_ref(tag);
        let remote_ref = format!("{}/{}", registry.trim_end_matches('/'), local_ref);

        info!(
            "Pushing image for {} into {}/{}",
            self.spec.name, self.config.project, self.config.venue
        );

        self.run_tool("docker", &["tag".to_string(), local_ref, remote_ref.clone()])?;
        self.run_tool("docker", &["push".to_string(), remote_ref.clone()])?;

        Ok(remote_ref)
    }

    /// Captures the per-venue workflow artifacts into the repository.
    pub fn update_artifacts(&self) -> Result<()> {
        info!(
            "Capturing {} artifacts for {}/{}",
            self.spec.name, self.config.project, self.config.venue
        );

        let source_cwl = self.checkout_dir().join(SOURCE_CWL_FILENAME);
        if !source_cwl.is_file() {
            return Err(DeployError::validation(format!(
                "Application checkout has no {}: {}",
                SOURCE_CWL_FILENAME,
                source_cwl.display()
            )));
        }

        let artifact_dir = self.deploy_base_dir.join(self.spec.artifact_dir);
        fs::create_dir_all(&artifact_dir)?;

        let dest_cwl = artifact_dir.join(format!(
            "process-{}-{}.cwl",
            self.config.project, self.config.venue
        ));
        fs::copy(&source_cwl, &dest_cwl)?;
        info!("Captured descriptor to {}", dest_cwl.display());

        // Regenerate the job input from the captured descriptor, keeping
        // any values that were edited by hand
        let descriptor = cwl::load_descriptor(&dest_cwl)?;
        cwl::parser::write_job_input(&descriptor, artifact_dir.join("example_job_input.json"))?;

        Ok(())
    }

    /// Runs an external tool, surfacing a nonzero exit as an error.
    fn run_tool(&self, program: &str, args: &[String]) -> Result<()> {
        let command_line = format!("{} {}", program, args.join(" "));

        if self.dry_run {
            info!("[DRY RUN] {}", command_line);
            return Ok(());
        }

        debug!("Running: {}", command_line);

        let status = Command::new(program).args(args).status().map_err(|e| {
            DeployError::validation(format!(
                "Failed to launch {}: {}. Check that it is installed and on the PATH.",
                program, e
            ))
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(DeployError::ToolFailed {
                tool: program.to_string(),
                status: status.code().unwrap_or(-1),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_config() -> MdpsConfig {
        MdpsConfig {
            project: "unity".to_string(),
            venue: "ops".to_string(),
            environment: "PROD".to_string(),
        }
    }

    fn builder(deploy_base_dir: &std::path::Path) -> AppBuilder {
        AppBuilder::new(get_application("py_tropess").unwrap(), test_config(), deploy_base_dir)
    }

    #[test]
    fn test_get_application() {
        assert!(get_application("muses_ingest").is_ok());
        assert!(get_application("py_tropess").is_ok());
        assert!(get_application("unknown_app").is_err());
    }

    #[test]
    fn test_resolve_source_default() {
        let spec = get_application("py_tropess").unwrap();
        let (repo, tag) = resolve_source(spec, None);

        assert_eq!(repo, spec.source_repo);
        assert_eq!(tag, None);
    }

    #[test]
    fn test_resolve_source_tag_of_default() {
        let spec = get_application("py_tropess").unwrap();
        let (repo, tag) = resolve_source(spec, Some("@v1.4.2"));

        assert_eq!(repo, spec.source_repo);
        assert_eq!(tag.as_deref(), Some("v1.4.2"));
    }

    #[test]
    fn test_resolve_source_override() {
        let spec = get_application("py_tropess").unwrap();
        let (repo, tag) = resolve_source(spec, Some("/local/checkout/py-tropess"));

        assert_eq!(repo, "/local/checkout/py-tropess");
        assert_eq!(tag, None);
    }

    #[test]
    fn test_image_ref() {
        let temp_dir = tempdir().unwrap();
        let builder = builder(temp_dir.path());

        assert_eq!(builder.image_ref("1.4.2"), "tropess/py-tropess:1.4.2");
    }

    #[test]
    fn test_state_dir_layout() {
        let temp_dir = tempdir().unwrap();
        let builder = builder(temp_dir.path());

        assert_eq!(
            builder.checkout_dir(),
            temp_dir.path().join(".app_state/py_tropess/repo")
        );
    }

    #[test]
    fn test_init_repo_dry_run() {
        let temp_dir = tempdir().unwrap();
        let builder = builder(temp_dir.path()).with_dry_run(true);

        assert!(builder.init_repo(Some("@v1.0")).is_ok());
    }

    #[test]
    fn test_update_artifacts_missing_checkout() {
        let temp_dir = tempdir().unwrap();
        let builder = builder(temp_dir.path());

        let result = builder.update_artifacts();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("has no process.cwl"));
    }

    #[test]
    fn test_update_artifacts_captures_descriptor() {
        let temp_dir = tempdir().unwrap();
        let builder = builder(temp_dir.path());

        let checkout = builder.checkout_dir();
        fs::create_dir_all(&checkout).unwrap();
        fs::write(
            checkout.join("process.cwl"),
            r#"
cwlVersion: v1.2
class: CommandLineTool
baseCommand: [papermill, /home/jovyan/process.ipynb, output_nb.ipynb]
requirements:
  DockerRequirement:
    dockerPull: tropess/py-tropess:1.4.2
inputs:
  product_type:
    type: string
    default: summary
outputs:
  output:
    type: Directory
    outputBinding:
      glob: process_output
"#,
        )
        .unwrap();

        builder.update_artifacts().unwrap();

        let artifact_dir = temp_dir.path().join("py-tropess");
        assert!(artifact_dir.join("process-unity-ops.cwl").is_file());

        let job_input: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(artifact_dir.join("example_job_input.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(job_input["product_type"], "summary");
    }
}

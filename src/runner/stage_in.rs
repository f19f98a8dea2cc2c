//! Data Stage-In Wrapper
//!
//! Localizes remote granules ahead of processing by invoking the shared
//! stage-in workflow with a STAC manifest. The workflow descriptor itself
//! is hosted remotely; it can be handed to the runner by URL, prefetched
//! into a temporary file, or supplied from a local checkout.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::error::{DeployError, Result};
use crate::stac::resolve_manifest_ref;

use super::invoke::RunnerInvocation;

/// Remote location of the shared stage-in workflow descriptor.
pub const STAGE_IN_DESCRIPTOR_URL: &str =
    "https://raw.githubusercontent.com/unity-sds/unity-data-services/main/cwl/stage-in/stage-in.cwl";

/// Client identifier registered for unauthenticated DAAC downloads.
pub const UNITY_CLIENT_ID: &str = "71g0c73jl77gsqhtlfg2ht388c";

/// Download directory used when the caller does not supply one.
pub const DEFAULT_DOWNLOAD_DIR: &str = "downloads";

/// Where the stage-in workflow descriptor comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorSource {
    /// Hand the remote URL straight to the runner
    Remote,

    /// Download the descriptor to a temporary file first
    Prefetched,

    /// Use a locally cached copy
    Local(PathBuf),
}

/// One stage-in run: a manifest, a download directory, a descriptor source.
#[derive(Debug, Clone)]
pub struct StageInJob {
    manifest: String,
    download_dir: PathBuf,
    source: DescriptorSource,
    dry_run: bool,
}

impl StageInJob {
    /// Creates a stage-in job for a manifest path or URL.
    ///
    /// The download directory defaults to [`DEFAULT_DOWNLOAD_DIR`]; a
    /// warning is logged at run time when the default is still in effect.
    pub fn new(manifest: impl Into<String>) -> Self {
        Self {
            manifest: manifest.into(),
            download_dir: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
            source: DescriptorSource::Remote,
            dry_run: false,
        }
    }

    /// Sets the directory granules are downloaded into.
    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    /// Sets the descriptor source.
    pub fn with_source(mut self, source: DescriptorSource) -> Self {
        self.source = source;
        self
    }

    /// Enables or disables dry run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Returns the download directory in effect.
    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Resolves descriptors and invokes the runner.
    pub fn run(&self) -> Result<()> {
        if self.download_dir == Path::new(DEFAULT_DOWNLOAD_DIR) {
            warn!(
                "No download directory given, defaulting to ./{}",
                DEFAULT_DOWNLOAD_DIR
            );
        }

        let manifest_ref = resolve_manifest_ref(&self.manifest);
        info!("Staging in data from: {}", manifest_ref);

        fs::create_dir_all(&self.download_dir)?;

        // Guard keeps a prefetched descriptor alive until the runner exits
        let mut _prefetched: Option<PrefetchedDescriptor> = None;

        let descriptor = match &self.source {
            DescriptorSource::Remote => STAGE_IN_DESCRIPTOR_URL.to_string(),
            DescriptorSource::Local(path) => {
                if !path.is_file() {
                    return Err(DeployError::validation(format!(
                        "Could not find local stage-in descriptor: {}",
                        path.display()
                    )));
                }
                path.display().to_string()
            }
            DescriptorSource::Prefetched => {
                let guard = PrefetchedDescriptor::fetch(STAGE_IN_DESCRIPTOR_URL)?;
                let path = guard.path.display().to_string();
                _prefetched = Some(guard);
                path
            }
        };

        RunnerInvocation::new(descriptor)
            .with_outdir(&self.download_dir)
            .with_parameter("stac_json", manifest_ref)
            .with_parameter("download_dir", self.download_dir.display().to_string())
            .with_parameter("unity_client_id", UNITY_CLIENT_ID)
            .with_dry_run(self.dry_run)
            .run()
    }
}

/// A descriptor downloaded to a temporary file.
///
/// The file is removed when the guard drops, so cleanup happens on every
/// exit path out of [`StageInJob::run`], runner failures included.
struct PrefetchedDescriptor {
    path: PathBuf,
}

impl PrefetchedDescriptor {
    fn fetch(url: &str) -> Result<Self> {
        info!("Prefetching stage-in descriptor from {}", url);

        let response = reqwest::blocking::get(url)?;
        let status = response.status();
        if !status.is_success() {
            return Err(DeployError::api(
                "fetching stage-in descriptor",
                status.as_u16(),
                response.text().unwrap_or_default(),
            ));
        }

        let scratch_dir = env::temp_dir().join("tropess_deploy");
        fs::create_dir_all(&scratch_dir)?;

        let path = scratch_dir.join(format!("stage-in-{}.cwl", std::process::id()));
        fs::write(&path, response.bytes()?)?;
        debug!("Descriptor prefetched to {}", path.display());

        Ok(Self { path })
    }
}

impl Drop for PrefetchedDescriptor {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            debug!(
                "Could not remove prefetched descriptor {}: {}",
                self.path.display(),
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_download_dir() {
        let job = StageInJob::new("catalog.json");
        assert_eq!(job.download_dir(), Path::new(DEFAULT_DOWNLOAD_DIR));
    }

    #[test]
    fn test_download_dir_override() {
        let job = StageInJob::new("catalog.json").with_download_dir("/data/staged");
        assert_eq!(job.download_dir(), Path::new("/data/staged"));
    }

    #[test]
    fn test_missing_local_descriptor() {
        let temp_dir = tempdir().unwrap();

        let result = StageInJob::new("catalog.json")
            .with_download_dir(temp_dir.path().join("downloads"))
            .with_source(DescriptorSource::Local(PathBuf::from(
                "/nonexistent/stage-in.cwl",
            )))
            .with_dry_run(true)
            .run();

        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Could not find local stage-in descriptor"));
    }

    #[test]
    fn test_dry_run_remote_creates_download_dir() {
        let temp_dir = tempdir().unwrap();
        let download_dir = temp_dir.path().join("downloads");

        let result = StageInJob::new("https://example.com/catalog.json")
            .with_download_dir(&download_dir)
            .with_dry_run(true)
            .run();

        assert!(result.is_ok());
        assert!(download_dir.is_dir());
    }

    #[test]
    fn test_prefetched_guard_removes_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("stage-in.cwl");
        std::fs::write(&path, "cwlVersion: v1.2").unwrap();

        {
            let _guard = PrefetchedDescriptor { path: path.clone() };
        }

        assert!(!path.exists());
    }
}

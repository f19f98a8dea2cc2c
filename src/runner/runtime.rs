//! Container Runtime Detection
//!
//! The workflow runner defaults to Docker for pulling and running the
//! application images. Hosts without a Docker daemon (shared processing
//! nodes) carry podman instead, and the runner accepts a substitution flag
//! for it. The flag is added if and only if the podman binary is
//! discoverable on the PATH.

use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info};
use once_cell::sync::Lazy;

/// Lazily-probed path to the podman binary, if any.
pub static PODMAN_PATH: Lazy<Option<PathBuf>> = Lazy::new(|| {
    let found = find_in_path("podman");

    match &found {
        Some(path) => info!("Using podman container runtime: {}", path.display()),
        None => debug!("podman not found on PATH, runner will use docker"),
    }

    found
});

/// Locates a binary on the system PATH.
fn find_in_path(name: &str) -> Option<PathBuf> {
    let output = Command::new("which").arg(name).output().ok()?;

    if !output.status.success() {
        return None;
    }

    let path_str = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if path_str.is_empty() {
        return None;
    }

    Some(PathBuf::from(path_str))
}

/// Runner flags for the detected container runtime.
pub fn runtime_flags() -> Vec<String> {
    runtime_flags_for(PODMAN_PATH.as_deref())
}

/// Runner flags for a given probe result.
pub fn runtime_flags_for(podman: Option<&Path>) -> Vec<String> {
    match podman {
        Some(_) => vec!["--podman".to_string()],
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_with_runtime_present() {
        let flags = runtime_flags_for(Some(Path::new("/usr/bin/podman")));
        assert_eq!(flags, vec!["--podman"]);
    }

    #[test]
    fn test_flags_without_runtime() {
        let flags = runtime_flags_for(None);
        assert!(flags.is_empty());
    }

    #[test]
    fn test_find_in_path_missing_binary() {
        assert!(find_in_path("definitely-not-a-real-binary-name").is_none());
    }
}

//! Descriptor Loading and Job-Input Templates
//!
//! Handles reading descriptors from disk and regenerating the
//! `example_job_input.json` documents shipped next to them. Template
//! regeneration preserves values that were edited by hand: the descriptor
//! supplies the parameter set, the existing file supplies the values.

use std::fs;
use std::path::Path;

use log::{debug, info};
use serde_json::Value;

use crate::error::{DeployError, Result};

use super::model::Descriptor;

/// Loads a descriptor from a YAML file.
///
/// The file is read, parsed, and validated against the fixed schema the
/// application generator emits.
pub fn load_descriptor(path: impl AsRef<Path>) -> Result<Descriptor> {
    let path = path.as_ref();

    let yaml_content = fs::read_to_string(path).map_err(|e| {
        DeployError::validation(format!(
            "Failed to read workflow descriptor '{}': {}. Check that the file exists and is readable.",
            path.display(),
            e
        ))
    })?;

    debug!("Descriptor loaded ({} bytes)", yaml_content.len());

    let descriptor: Descriptor = serde_yaml::from_str(&yaml_content).map_err(|e| {
        DeployError::validation(format!(
            "Failed to parse workflow descriptor '{}': {}",
            path.display(),
            e
        ))
    })?;

    descriptor.validate().map_err(DeployError::Validation)?;

    info!(
        "Loaded descriptor {} ({} inputs, image {})",
        path.display(),
        descriptor.inputs.len(),
        descriptor.docker_image().unwrap_or("<none>")
    );

    Ok(descriptor)
}

/// Merges a freshly generated job-input template with an existing document.
///
/// Parameters present in the existing document keep their values; template
/// entries fill in anything new. Parameters that no longer exist in the
/// descriptor are dropped.
pub fn merge_job_template(descriptor: &Descriptor, existing: Option<&Value>) -> Value {
    let mut template = descriptor.job_template();

    if let Some(Value::Object(existing_map)) = existing {
        for (name, value) in existing_map {
            if template.contains_key(name) {
                template.insert(name.clone(), value.clone());
            }
        }
    }

    Value::Object(template)
}

/// Rewrites the job-input document next to a descriptor.
///
/// Reads the existing document if present so manually modified values are
/// preserved, then writes the merged result back.
pub fn write_job_input(descriptor: &Descriptor, job_input_path: impl AsRef<Path>) -> Result<()> {
    let job_input_path = job_input_path.as_ref();

    let existing = match fs::read_to_string(job_input_path) {
        Ok(content) => Some(serde_json::from_str::<Value>(&content)?),
        Err(_) => None,
    };

    let merged = merge_job_template(descriptor, existing.as_ref());
    fs::write(job_input_path, serde_json::to_string_pretty(&merged)?)?;

    info!("Wrote job input template to {}", job_input_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const DESCRIPTOR_YAML: &str = r#"
cwlVersion: v1.2
class: CommandLineTool
baseCommand: [papermill, /home/jovyan/process.ipynb, output_nb.ipynb]
requirements:
  DockerRequirement:
    dockerPull: tropess/mdps-muses-data-ingest:2.1.0
inputs:
  collection_version:
    type: string
    default: "1"
  input_data_ingest_path:
    type: string
outputs:
  output:
    type: Directory
    outputBinding:
      glob: process_output
"#;

    #[test]
    fn test_load_descriptor_missing_file() {
        let result = load_descriptor("/nonexistent/process.cwl");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Failed to read"));
    }

    #[test]
    fn test_load_descriptor_invalid_yaml() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("bad.cwl");
        fs::write(&path, "class: [[[").unwrap();

        assert!(load_descriptor(&path).is_err());
    }

    #[test]
    fn test_load_descriptor_valid() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("process.cwl");
        fs::write(&path, DESCRIPTOR_YAML).unwrap();

        let descriptor = load_descriptor(&path).unwrap();
        assert_eq!(descriptor.docker_tag(), Some("2.1.0"));
    }

    #[test]
    fn test_merge_preserves_existing_values() {
        let descriptor: Descriptor = serde_yaml::from_str(DESCRIPTOR_YAML).unwrap();
        let existing = serde_json::json!({
            "collection_version": "7",
            "stale_parameter": true,
        });

        let merged = merge_job_template(&descriptor, Some(&existing));

        assert_eq!(merged["collection_version"], "7");
        assert_eq!(merged["input_data_ingest_path"], "");
        assert!(merged.get("stale_parameter").is_none());
    }

    #[test]
    fn test_merge_without_existing() {
        let descriptor: Descriptor = serde_yaml::from_str(DESCRIPTOR_YAML).unwrap();

        let merged = merge_job_template(&descriptor, None);
        assert_eq!(merged["collection_version"], "1");
    }

    #[test]
    fn test_write_job_input_round() {
        let temp_dir = tempdir().unwrap();
        let descriptor: Descriptor = serde_yaml::from_str(DESCRIPTOR_YAML).unwrap();
        let path = temp_dir.path().join("example_job_input.json");

        fs::write(&path, r#"{"input_data_ingest_path": "batch_07/"}"#).unwrap();
        write_job_input(&descriptor, &path).unwrap();

        let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["input_data_ingest_path"], "batch_07/");
        assert_eq!(written["collection_version"], "1");
    }
}

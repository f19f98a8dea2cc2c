//! Workflow Descriptor Data Model
//!
//! Serde model for the fixed descriptor schema produced by the application
//! generator: a container image, a fixed command line, named inputs with
//! optional defaults, and globbed outputs.
//!
//! # Example YAML Format
//!
//! ```yaml
//! cwlVersion: v1.2
//! class: CommandLineTool
//! baseCommand: [papermill, /home/jovyan/process.ipynb, output_nb.ipynb]
//! arguments: ["-f", "/tmp/inputs.json"]
//! requirements:
//!   DockerRequirement:
//!     dockerPull: registry.example.com/tropess/py-tropess:1.4.2
//!   InitialWorkDirRequirement:
//!     listing:
//!       - entryname: /tmp/inputs.json
//!         entry: $(inputs)
//!   NetworkAccess:
//!     networkAccess: true
//! inputs:
//!   product_type:
//!     type: string
//!     default: summary
//! outputs:
//!   output:
//!     type: Directory
//!     outputBinding:
//!       glob: process_output
//!   process_output_nb:
//!     type: File
//!     outputBinding:
//!       glob: output_nb.ipynb
//! ```

use std::collections::BTreeMap;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single named input parameter of a descriptor.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct InputParameter {
    /// CWL type name (e.g. "string", "int", "File")
    #[serde(rename = "type")]
    pub kind: String,

    /// Default value supplied when the job input omits this parameter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// Where an output is collected from after the runner finishes.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OutputBinding {
    /// Glob pattern relative to the runner's output directory
    pub glob: String,
}

/// A single named output of a descriptor.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OutputParameter {
    /// CWL type name ("Directory" for the product tree, "File" for the
    /// executed notebook)
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(rename = "outputBinding")]
    pub output_binding: OutputBinding,
}

/// Container image requirement.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DockerRequirement {
    /// Full image reference including tag
    #[serde(rename = "dockerPull")]
    pub docker_pull: String,
}

/// A file materialized into the working directory before execution.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct WorkDirEntry {
    pub entryname: String,
    pub entry: String,
}

/// Working-directory materialization requirement.
///
/// The generated descriptors use this to write the resolved inputs as a
/// JSON parameter file for the notebook executor.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct InitialWorkDirRequirement {
    pub listing: Vec<WorkDirEntry>,
}

/// Network access requirement flag.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NetworkAccess {
    #[serde(rename = "networkAccess")]
    pub network_access: bool,
}

/// Requirements block of a descriptor.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Requirements {
    #[serde(rename = "DockerRequirement", default, skip_serializing_if = "Option::is_none")]
    pub docker: Option<DockerRequirement>,

    #[serde(
        rename = "InitialWorkDirRequirement",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub initial_workdir: Option<InitialWorkDirRequirement>,

    #[serde(rename = "NetworkAccess", default, skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkAccess>,
}

/// A workflow descriptor consumed by the external runner.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Descriptor {
    /// Document class; the generated artifacts are always CommandLineTool
    pub class: String,

    #[serde(rename = "cwlVersion")]
    pub cwl_version: String,

    /// Command to run inside the container (string or list in YAML)
    #[serde(rename = "baseCommand", deserialize_with = "single_or_vec", default)]
    pub base_command: Vec<String>,

    /// Fixed trailing arguments
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<String>,

    /// Named inputs with optional defaults
    #[serde(default)]
    pub inputs: BTreeMap<String, InputParameter>,

    /// Named outputs collected by glob
    #[serde(default)]
    pub outputs: BTreeMap<String, OutputParameter>,

    #[serde(default)]
    pub requirements: Requirements,
}

/// Deserializes either a single string or array of strings into Vec<String>
fn single_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let val = Value::deserialize(deserializer)?;
    match val {
        Value::Null => Ok(Vec::new()),
        Value::String(s) if s.is_empty() => Ok(Vec::new()),
        Value::String(s) => Ok(vec![s]),
        Value::Array(arr) => arr
            .into_iter()
            .map(|v| match v {
                Value::String(s) => Ok(s),
                _ => Err(de::Error::custom("Expected string in array")),
            })
            .collect(),
        _ => Err(de::Error::custom("Expected string or array of strings")),
    }
}

impl Descriptor {
    /// Returns the full container image reference, if declared.
    pub fn docker_image(&self) -> Option<&str> {
        self.requirements
            .docker
            .as_ref()
            .map(|d| d.docker_pull.as_str())
    }

    /// Returns the image tag portion of the container reference.
    ///
    /// The tag is taken from the final path segment so registry host ports
    /// are not mistaken for tags.
    pub fn docker_tag(&self) -> Option<&str> {
        let image = self.docker_image()?;
        let last_segment = image.rsplit('/').next().unwrap_or(image);
        last_segment.rsplit_once(':').map(|(_, tag)| tag)
    }

    /// Builds a job-input template from the declared inputs.
    ///
    /// Inputs with defaults carry their default value; the rest get an
    /// empty placeholder of the matching JSON shape so the template remains
    /// a valid job-input document.
    pub fn job_template(&self) -> serde_json::Map<String, Value> {
        self.inputs
            .iter()
            .map(|(name, input)| {
                let value = match &input.default {
                    Some(default) => default.clone(),
                    None => placeholder_for(&input.kind),
                };
                (name.clone(), value)
            })
            .collect()
    }

    /// Validates the descriptor against the fixed schema.
    pub fn validate(&self) -> Result<(), String> {
        if self.class != "CommandLineTool" {
            return Err(format!(
                "Unsupported descriptor class '{}', expected 'CommandLineTool'",
                self.class
            ));
        }

        if self.cwl_version.trim().is_empty() {
            return Err("Descriptor is missing cwlVersion".to_string());
        }

        if self.base_command.is_empty() {
            return Err("Descriptor has no baseCommand".to_string());
        }

        for (name, output) in &self.outputs {
            if output.output_binding.glob.trim().is_empty() {
                return Err(format!("Output '{}' has an empty glob", name));
            }
        }

        Ok(())
    }
}

/// Placeholder JSON value for an input with no default.
fn placeholder_for(kind: &str) -> Value {
    match kind.trim_end_matches('?') {
        "string" => Value::String(String::new()),
        "int" | "long" => Value::from(0),
        "float" | "double" => Value::from(0.0),
        "boolean" => Value::Bool(false),
        "File" | "Directory" => serde_json::json!({ "class": kind, "path": "" }),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_descriptor() -> Descriptor {
        serde_yaml::from_str(
            r#"
cwlVersion: v1.2
class: CommandLineTool
baseCommand: [papermill, /home/jovyan/process.ipynb, output_nb.ipynb]
arguments: ["-f", "/tmp/inputs.json"]
requirements:
  DockerRequirement:
    dockerPull: registry.example.com/tropess/py-tropess:1.4.2
  NetworkAccess:
    networkAccess: true
inputs:
  product_type:
    type: string
    default: summary
  granule_version:
    type: string
outputs:
  output:
    type: Directory
    outputBinding:
      glob: process_output
  process_output_nb:
    type: File
    outputBinding:
      glob: output_nb.ipynb
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_descriptor() {
        let descriptor = sample_descriptor();

        assert_eq!(descriptor.class, "CommandLineTool");
        assert_eq!(descriptor.base_command[0], "papermill");
        assert_eq!(descriptor.inputs.len(), 2);
        assert_eq!(descriptor.outputs.len(), 2);
        assert!(descriptor.requirements.network.as_ref().unwrap().network_access);
    }

    #[test]
    fn test_base_command_single_string() {
        let descriptor: Descriptor = serde_yaml::from_str(
            r#"
cwlVersion: v1.2
class: CommandLineTool
baseCommand: papermill
inputs: {}
outputs: {}
"#,
        )
        .unwrap();

        assert_eq!(descriptor.base_command, vec!["papermill"]);
    }

    #[test]
    fn test_docker_tag() {
        let descriptor = sample_descriptor();

        assert_eq!(
            descriptor.docker_image(),
            Some("registry.example.com/tropess/py-tropess:1.4.2")
        );
        assert_eq!(descriptor.docker_tag(), Some("1.4.2"));
    }

    #[test]
    fn test_docker_tag_registry_port() {
        let mut descriptor = sample_descriptor();
        descriptor.requirements.docker = Some(DockerRequirement {
            docker_pull: "registry.example.com:5000/tropess/py-tropess".to_string(),
        });

        // Port on the registry host is not a tag
        assert_eq!(descriptor.docker_tag(), None);
    }

    #[test]
    fn test_docker_tag_missing_requirement() {
        let mut descriptor = sample_descriptor();
        descriptor.requirements.docker = None;

        assert_eq!(descriptor.docker_tag(), None);
    }

    #[test]
    fn test_job_template_defaults_and_placeholders() {
        let descriptor = sample_descriptor();
        let template = descriptor.job_template();

        assert_eq!(template["product_type"], Value::String("summary".to_string()));
        assert_eq!(template["granule_version"], Value::String(String::new()));
    }

    #[test]
    fn test_job_template_file_placeholder() {
        let descriptor: Descriptor = serde_yaml::from_str(
            r#"
cwlVersion: v1.2
class: CommandLineTool
baseCommand: papermill
inputs:
  catalog:
    type: File
outputs: {}
"#,
        )
        .unwrap();

        let template = descriptor.job_template();
        assert_eq!(template["catalog"]["class"], "File");
    }

    #[test]
    fn test_validate_ok() {
        assert!(sample_descriptor().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_workflow_class() {
        let mut descriptor = sample_descriptor();
        descriptor.class = "Workflow".to_string();

        let result = descriptor.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Unsupported descriptor class"));
    }

    #[test]
    fn test_validate_rejects_empty_glob() {
        let mut descriptor = sample_descriptor();
        descriptor.outputs.get_mut("output").unwrap().output_binding.glob = "  ".to_string();

        assert!(descriptor.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_missing_base_command() {
        let mut descriptor = sample_descriptor();
        descriptor.base_command.clear();

        assert!(descriptor.validate().is_err());
    }
}

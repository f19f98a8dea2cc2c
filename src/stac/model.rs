//! STAC Catalog Data Model
//!
//! The manifests are externally defined JSON; this model keeps unknown
//! fields out of the way and exposes the handful of accessors the tools
//! need (first link href, feature properties, asset names).

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// A link entry in a STAC document.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Link {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel: Option<String>,

    pub href: String,
}

/// A feature (granule) entry in a STAC query result.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Feature {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub properties: BTreeMap<String, Value>,

    #[serde(default)]
    pub assets: BTreeMap<String, Value>,
}

/// A STAC catalog or item collection.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Catalog {
    #[serde(default)]
    pub links: Vec<Link>,

    #[serde(default)]
    pub features: Vec<Feature>,
}

impl Catalog {
    /// Parses a catalog from a JSON string.
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Loads a catalog from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        debug!(
            "Read STAC document {} ({} bytes)",
            path.as_ref().display(),
            content.len()
        );
        Self::from_json(&content)
    }

    /// Writes the catalog to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        info!("Writing STAC result to: {}", path.display());
        fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }

    /// Returns the download URL the stage-in workflow should use.
    pub fn stage_in_href(&self) -> Option<&str> {
        self.links.first().map(|link| link.href.as_str())
    }
}

/// Resolves a manifest argument to the reference handed to the runner.
///
/// When the argument names an existing file that parses as a manifest with
/// at least one link, the first link's href is extracted. Anything else
/// (a URL, a path the runner should read itself) passes through literally.
pub fn resolve_manifest_ref(arg: &str) -> String {
    let path = Path::new(arg);
    if !path.is_file() {
        return arg.to_string();
    }

    match Catalog::load(path) {
        Ok(catalog) => match catalog.stage_in_href() {
            Some(href) => {
                info!("Extracted download URL from manifest: {}", href);
                href.to_string()
            }
            None => arg.to_string(),
        },
        Err(e) => {
            debug!("Manifest {} not parseable as STAC ({}), passing through", arg, e);
            arg.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_stage_in_href() {
        let catalog: Catalog = serde_json::from_str(
            r#"{"links": [{"rel": "self", "href": "https://example.com/catalog.json"},
                          {"rel": "next", "href": "https://example.com/page2.json"}]}"#,
        )
        .unwrap();

        assert_eq!(catalog.stage_in_href(), Some("https://example.com/catalog.json"));
    }

    #[test]
    fn test_stage_in_href_empty() {
        let catalog = Catalog::default();
        assert_eq!(catalog.stage_in_href(), None);
    }

    #[test]
    fn test_resolve_manifest_ref_extracts_first_link() {
        let temp_dir = tempdir().unwrap();
        let manifest = temp_dir.path().join("stage_in.json");
        fs::write(
            &manifest,
            r#"{"links": [{"href": "s3://bucket/granules/catalog.json"}], "features": []}"#,
        )
        .unwrap();

        let resolved = resolve_manifest_ref(manifest.to_str().unwrap());
        assert_eq!(resolved, "s3://bucket/granules/catalog.json");
    }

    #[test]
    fn test_resolve_manifest_ref_passthrough_url() {
        let arg = "https://example.com/catalog.json";
        assert_eq!(resolve_manifest_ref(arg), arg);
    }

    #[test]
    fn test_resolve_manifest_ref_passthrough_unparseable_file() {
        let temp_dir = tempdir().unwrap();
        let manifest = temp_dir.path().join("notes.txt");
        fs::write(&manifest, "not json").unwrap();

        let arg = manifest.to_str().unwrap();
        assert_eq!(resolve_manifest_ref(arg), arg);
    }

    #[test]
    fn test_resolve_manifest_ref_passthrough_no_links() {
        let temp_dir = tempdir().unwrap();
        let manifest = temp_dir.path().join("empty.json");
        fs::write(&manifest, r#"{"links": [], "features": []}"#).unwrap();

        let arg = manifest.to_str().unwrap();
        assert_eq!(resolve_manifest_ref(arg), arg);
    }

    #[test]
    fn test_save_and_load_round() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("out.stac");

        let catalog: Catalog = serde_json::from_str(
            r#"{"links": [{"href": "x"}], "features": [{"id": "g1", "properties": {}, "assets": {}}]}"#,
        )
        .unwrap();
        catalog.save(&path).unwrap();

        let loaded = Catalog::load(&path).unwrap();
        assert_eq!(loaded.features.len(), 1);
        assert_eq!(loaded.features[0].id, "g1");
    }
}

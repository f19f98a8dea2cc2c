//! Data Services Administration
//!
//! One-time venue setup operations: registering collection ids for a
//! collection group, defining the custom metadata fields the processing
//! outputs carry, and installing DAAC archive delivery configuration.
//! Every operation is a dry run unless explicitly committed.

use log::{error, info, warn};
use serde_json::{json, Map, Value};

use crate::config::MdpsConfig;
use crate::error::Result;

use super::client::{ArchiveConfig, DataServicesClient};
use super::products::{self, CollectionGroup};

/// Listing page size when checking registration results.
const COLLECTION_LIST_LIMIT: usize = 10_000;

/// Custom metadata fields used by TROPESS products in the MDPS data store.
pub fn custom_metadata_definition() -> Map<String, Value> {
    let keyword_fields = [
        "tag",
        "project",
        "short_name",
        "long_name",
        "doi",
        "collection_group",
        "product_stage",
        "product_type",
        "sensor_set",
        "species",
        "product_version",
        "processing_batch",
        "processing_profile",
    ];

    let mut fields = Map::new();
    for name in keyword_fields {
        fields.insert(name.to_string(), json!({ "type": "keyword" }));
    }
    fields.insert("processing_datetime".to_string(), json!({ "type": "date" }));
    fields.insert("retrieval_step".to_string(), json!({ "type": "date" }));

    fields
}

/// Collection ids to register for a group: TROPESS products plus the MUSES
/// input collections they are produced from.
pub fn registration_ids(
    config: &MdpsConfig,
    group: &CollectionGroup,
    granule_version: &str,
    muses_version: &str,
) -> Result<Vec<String>> {
    let mut ids = products::tropess_collection_ids(config, group, granule_version, None)?;
    ids.extend(products::muses_collection_ids(config, group, muses_version, None)?);
    Ok(ids)
}

/// Registers the collection ids of a group with data services.
///
/// Without `do_update` the generated ids are only listed. With `check`,
/// the registered set is read back and each id verified against it.
pub fn register_collections(
    client: &DataServicesClient,
    config: &MdpsConfig,
    group: &CollectionGroup,
    granule_version: &str,
    muses_version: &str,
    do_update: bool,
    check: bool,
) -> Result<()> {
    let ids = registration_ids(config, group, granule_version, muses_version)?;

    if do_update {
        for id in &ids {
            client.create_collection(id)?;
        }
        info!("{} collection ids requested", ids.len());
    } else {
        info!("Generated collection ids for group {}:", group.keyword);
        for id in &ids {
            info!(" - {}", id);
        }
        info!("Dry run only, pass --do_update to register");
    }

    if check {
        check_registered(client, &ids)?;
    }

    Ok(())
}

/// Verifies that generated collection ids appear in the registered set.
pub fn check_registered(client: &DataServicesClient, ids: &[String]) -> Result<()> {
    if ids.is_empty() {
        warn!("No collection ids to check");
        return Ok(());
    }

    let registered = client.get_collections(COLLECTION_LIST_LIMIT)?;

    for id in ids {
        if registered.contains(id) {
            info!("{} created successfully", id);
        } else {
            error!("Collection id {} is not registered with MDPS", id);
        }
    }

    Ok(())
}

/// Defines the custom metadata fields for the venue.
///
/// Previously defined fields must be included in the definition call, so
/// the existing fields are queried first and merged under our definitions.
pub fn define_custom_metadata(client: &DataServicesClient, do_update: bool) -> Result<()> {
    info!("Querying MDPS data services for existing custom metadata");
    let existing = client.existing_custom_metadata(COLLECTION_LIST_LIMIT)?;

    let mut fields = existing.clone();
    fields.extend(custom_metadata_definition());

    info!(
        "Custom metadata fields definition:\n{}",
        serde_json::to_string_pretty(&Value::Object(fields.clone()))?
    );

    if fields == existing {
        info!("Proposed fields match existing fields");
    }

    if do_update {
        info!("Committing custom metadata definition");
        client.define_custom_metadata(&fields)?;
    } else {
        info!("No custom metadata committed, dry run only");
    }

    Ok(())
}

/// DAAC delivery parameters for archive registration.
#[derive(Debug, Clone)]
pub struct DaacParams {
    pub sns_arn: String,
    pub role_arn: String,
    pub role_session_name: String,
    pub provider: String,
}

/// Registers DAAC archive delivery for every product of a group.
///
/// With `delete`, existing configurations are removed first. Each
/// configuration is echoed back after registration.
pub fn register_daac_archiving(
    client: &DataServicesClient,
    config: &MdpsConfig,
    group: &CollectionGroup,
    granule_version: &str,
    params: &DaacParams,
    do_update: bool,
    delete: bool,
) -> Result<()> {
    let short_names = group.tropess_short_names(None)?;
    let collection_ids = products::mdps_collection_ids(config, &short_names, granule_version);

    if delete {
        for (daac_id, mdps_id) in short_names.iter().zip(&collection_ids) {
            info!("Deleting DAAC archive id: {} from {}", daac_id, mdps_id);
            client.delete_archive_config(mdps_id, daac_id)?;
        }
    }

    for (daac_id, mdps_id) in short_names.iter().zip(&collection_ids) {
        let archive_config = ArchiveConfig::new(
            daac_id.clone(),
            granule_version.to_string(),
            params.sns_arn.clone(),
            params.provider.clone(),
            params.role_arn.clone(),
            params.role_session_name.clone(),
        );

        info!("Registering DAAC archive id: {} to {}", daac_id, mdps_id);
        info!(
            "Archive configuration:\n{}",
            serde_json::to_string_pretty(&archive_config)?
        );

        if do_update {
            info!("Committing archive configuration");
            client.put_archive_config(mdps_id, &archive_config)?;
        } else {
            info!("No archive configuration committed, dry run only");
        }
    }

    if do_update {
        for collection_id in &collection_ids {
            let archive_config = client.get_archive_config(collection_id)?;
            info!(
                "Archive config for {}:\n{}",
                collection_id,
                serde_json::to_string_pretty(&archive_config)?
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::products::get_collection_group;

    fn test_config() -> MdpsConfig {
        MdpsConfig {
            project: "unity".to_string(),
            venue: "test".to_string(),
            environment: "TEST".to_string(),
        }
    }

    #[test]
    fn test_custom_metadata_definition_fields() {
        let fields = custom_metadata_definition();

        assert_eq!(fields.len(), 15);
        assert_eq!(fields["species"]["type"], "keyword");
        assert_eq!(fields["processing_datetime"]["type"], "date");
        assert_eq!(fields["retrieval_step"]["type"], "date");
    }

    #[test]
    fn test_registration_ids_include_muses_inputs() {
        let group = get_collection_group("reanalysis").unwrap();
        let ids = registration_ids(&test_config(), group, "2", "1").unwrap();

        // 3 products x 1 sensor set x 4 species, plus one MUSES collection
        assert_eq!(ids.len(), 13);
        assert!(ids
            .iter()
            .any(|id| id == "URN:NASA:UNITY:unity:test:MUSES-AIROMI-RS___1"));
        assert!(ids
            .iter()
            .any(|id| id == "URN:NASA:UNITY:unity:test:TRPSDL2O3AIROMIRS___2"));
    }

    #[test]
    fn test_registration_ids_use_separate_versions() {
        let group = get_collection_group("reanalysis").unwrap();
        let ids = registration_ids(&test_config(), group, "2", "1").unwrap();

        for id in &ids {
            if id.contains("MUSES") {
                assert!(id.ends_with("___1"));
            } else {
                assert!(id.ends_with("___2"));
            }
        }
    }
}

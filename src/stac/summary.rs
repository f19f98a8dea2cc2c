//! Catalog Summaries
//!
//! Aggregations over query results used by the reporting tools: per-date
//! granule and archive counts, consistency checks on feature metadata, and
//! the netCDF asset listing used to sanity-check processing inputs.

use std::collections::BTreeMap;

use serde_json::Value;

use super::model::{Catalog, Feature};

/// Archive status value reported once the DAAC has confirmed delivery.
const ARCHIVED_STATUS: &str = "cnm_r_success";

/// Granule and archive counts for one processing date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateStatus {
    /// Number of granules carrying this processing date
    pub count: usize,

    /// How many of them have been archived at the DAAC
    pub num_archived: usize,
}

/// Returns true when a granule has been confirmed archived.
pub fn is_archived(feature: &Feature) -> bool {
    feature
        .properties
        .get("archive_status")
        .and_then(Value::as_str)
        .map(|status| status == ARCHIVED_STATUS)
        .unwrap_or(false)
}

/// Aggregates granule counts per processing date.
///
/// Dates are keyed by the `YYYY-MM-DD` prefix of the granule's
/// `processing_datetime` property; granules without one are skipped.
pub fn date_status(catalog: &Catalog) -> BTreeMap<String, DateStatus> {
    let mut status: BTreeMap<String, DateStatus> = BTreeMap::new();

    for feature in &catalog.features {
        let Some(datetime) = feature
            .properties
            .get("processing_datetime")
            .and_then(Value::as_str)
        else {
            continue;
        };

        let date = datetime.chars().take(10).collect::<String>();
        let entry = status.entry(date).or_default();
        entry.count += 1;
        if is_archived(feature) {
            entry.num_archived += 1;
        }
    }

    status
}

/// Extracts a property that must hold the same value on every granule.
///
/// Granules missing the property are skipped. An inconsistent value is an
/// error; so is a required property that no granule defines.
pub fn constant_property(
    catalog: &Catalog,
    name: &str,
    required: bool,
) -> Result<Option<String>, String> {
    let mut value: Option<String> = None;

    for feature in &catalog.features {
        let Some(current) = feature.properties.get(name).and_then(Value::as_str) else {
            continue;
        };

        match &value {
            Some(previous) if previous != current => {
                return Err(format!(
                    "{} does not have a consistent value {} for {}, expected {}",
                    name, current, feature.id, previous
                ));
            }
            Some(_) => {}
            None => value = Some(current.to_string()),
        }
    }

    if value.is_none() && required {
        return Err(format!("No granules define the {} metadata", name));
    }

    Ok(value)
}

/// Lists the netCDF asset names across all granules.
pub fn netcdf_assets(catalog: &Catalog) -> Vec<String> {
    catalog
        .features
        .iter()
        .flat_map(|feature| feature.assets.keys())
        .filter(|name| name.ends_with(".nc"))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_with(features: &str) -> Catalog {
        serde_json::from_str(&format!(r#"{{"links": [], "features": {}}}"#, features)).unwrap()
    }

    #[test]
    fn test_is_archived() {
        let catalog = catalog_with(
            r#"[{"id": "a", "properties": {"archive_status": "cnm_r_success"}, "assets": {}},
                {"id": "b", "properties": {"archive_status": "cnm_s_failure"}, "assets": {}},
                {"id": "c", "properties": {}, "assets": {}}]"#,
        );

        assert!(is_archived(&catalog.features[0]));
        assert!(!is_archived(&catalog.features[1]));
        assert!(!is_archived(&catalog.features[2]));
    }

    #[test]
    fn test_date_status_counts() {
        let catalog = catalog_with(
            r#"[{"id": "a", "properties": {"processing_datetime": "2021-07-04T00:00:00Z",
                                           "archive_status": "cnm_r_success"}, "assets": {}},
                {"id": "b", "properties": {"processing_datetime": "2021-07-04T06:00:00Z"}, "assets": {}},
                {"id": "c", "properties": {"processing_datetime": "2021-07-05T00:00:00Z"}, "assets": {}}]"#,
        );

        let status = date_status(&catalog);

        assert_eq!(status.len(), 2);
        assert_eq!(status["2021-07-04"], DateStatus { count: 2, num_archived: 1 });
        assert_eq!(status["2021-07-05"], DateStatus { count: 1, num_archived: 0 });
    }

    #[test]
    fn test_date_status_skips_undated() {
        let catalog = catalog_with(r#"[{"id": "a", "properties": {}, "assets": {}}]"#);
        assert!(date_status(&catalog).is_empty());
    }

    #[test]
    fn test_constant_property_consistent() {
        let catalog = catalog_with(
            r#"[{"id": "a", "properties": {"collection_group": "forward_stream"}, "assets": {}},
                {"id": "b", "properties": {"collection_group": "forward_stream"}, "assets": {}}]"#,
        );

        let value = constant_property(&catalog, "collection_group", true).unwrap();
        assert_eq!(value.as_deref(), Some("forward_stream"));
    }

    #[test]
    fn test_constant_property_inconsistent() {
        let catalog = catalog_with(
            r#"[{"id": "a", "properties": {"sensor_set": "CrIS-SNPP"}, "assets": {}},
                {"id": "b", "properties": {"sensor_set": "AIRS-OMI"}, "assets": {}}]"#,
        );

        assert!(constant_property(&catalog, "sensor_set", true).is_err());
    }

    #[test]
    fn test_constant_property_required_missing() {
        let catalog = catalog_with(r#"[{"id": "a", "properties": {}, "assets": {}}]"#);

        assert!(constant_property(&catalog, "short_name", true).is_err());
        assert_eq!(constant_property(&catalog, "short_name", false).unwrap(), None);
    }

    #[test]
    fn test_netcdf_assets() {
        let catalog = catalog_with(
            r#"[{"id": "a", "properties": {},
                 "assets": {"TROPESS_CrIS-SNPP_L2_O3.nc": {}, "metadata.json": {}}},
                {"id": "b", "properties": {},
                 "assets": {"TROPESS_CrIS-SNPP_L2_CO.nc": {}}}]"#,
        );

        let files = netcdf_assets(&catalog);
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.ends_with(".nc")));
    }
}

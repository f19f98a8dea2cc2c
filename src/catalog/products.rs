//! Product Registry and Naming Conventions
//!
//! The TROPESS product line is organized into collection groups, each
//! processed from MUSES retrievals for one or more sensor sets and
//! delivered as per-species granules. Short names identify collections at
//! the DAAC; MDPS collection ids wrap a short name in the project/venue URN.
//!
//! Naming:
//! - TROPESS short name: `TRPS{product}L2{species}{sensor}{group}`
//! - MUSES short name:   `MUSES-{sensor}-{group}`
//! - MDPS collection id: `URN:NASA:UNITY:{project}:{venue}:{short_name}___{version}`

use crate::config::MdpsConfig;
use crate::error::{DeployError, Result};

/// A sensor combination MUSES retrievals are produced from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorSet {
    /// Canonical keyword (e.g. "CrIS-SNPP")
    pub keyword: &'static str,

    /// Short code used inside product short names
    pub short_name: &'static str,

    /// Directory-structure alias accepted on the command line
    pub alias: &'static str,
}

/// A group of collections processed and delivered together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionGroup {
    /// Keyword used on the command line
    pub keyword: &'static str,

    /// Short code used inside product short names
    pub short_name: &'static str,

    pub sensor_sets: &'static [SensorSet],

    /// Species delivered for this group
    pub species: &'static [&'static str],
}

/// A TROPESS product type and its short-name code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductType {
    pub keyword: &'static str,
    pub code: &'static str,
}

/// Product types deliverable to the DAAC.
pub const PRODUCT_TYPES: &[ProductType] = &[
    ProductType { keyword: "summary", code: "Y" },
    ProductType { keyword: "standard", code: "D" },
    ProductType { keyword: "full", code: "F" },
];

const CRIS_SNPP: SensorSet = SensorSet {
    keyword: "CrIS-SNPP",
    short_name: "CRS",
    alias: "CrIS_SNPP",
};

const CRIS_JPSS1: SensorSet = SensorSet {
    keyword: "CrIS-JPSS1",
    short_name: "CR1",
    alias: "CrIS_JPSS1",
};

const AIRS_OMI: SensorSet = SensorSet {
    keyword: "AIRS-OMI",
    short_name: "AIROMI",
    alias: "AIRS_OMI",
};

/// Collection groups known to this deployment.
pub static COLLECTION_GROUPS: &[CollectionGroup] = &[
    CollectionGroup {
        keyword: "forward_stream",
        short_name: "FS",
        sensor_sets: &[CRIS_SNPP, CRIS_JPSS1],
        species: &["O3", "CO", "NH3", "PAN"],
    },
    CollectionGroup {
        keyword: "reanalysis",
        short_name: "RS",
        sensor_sets: &[AIRS_OMI],
        species: &["O3", "CO", "CH4", "HDO"],
    },
];

/// Looks up a collection group by keyword.
pub fn get_collection_group(keyword: &str) -> Result<&'static CollectionGroup> {
    COLLECTION_GROUPS
        .iter()
        .find(|group| group.keyword == keyword)
        .ok_or_else(|| {
            DeployError::validation(format!("Invalid collection group keyword: {}", keyword))
        })
}

/// Looks up a product type by keyword.
pub fn get_product_type(keyword: &str) -> Result<&'static ProductType> {
    PRODUCT_TYPES
        .iter()
        .find(|product| product.keyword == keyword)
        .ok_or_else(|| {
            DeployError::validation(format!(
                "Invalid product type: {}. Expected one of summary/standard/full.",
                keyword
            ))
        })
}

impl CollectionGroup {
    /// Finds a sensor set by canonical keyword or directory alias.
    pub fn find_sensor_set(&self, query: &str) -> Result<&'static SensorSet> {
        self.sensor_sets
            .iter()
            .find(|ss| ss.keyword == query || ss.alias == query)
            .ok_or_else(|| {
                DeployError::validation(format!(
                    "Could not determine sensor set from string: \"{}\"",
                    query
                ))
            })
    }

    /// Sensor sets selected by an optional keyword/alias filter.
    pub fn selected_sensor_sets(
        &self,
        sensor_set: Option<&str>,
    ) -> Result<Vec<&'static SensorSet>> {
        match sensor_set {
            Some(query) => Ok(vec![self.find_sensor_set(query)?]),
            None => Ok(self.sensor_sets.iter().collect()),
        }
    }

    /// All TROPESS short names for this group.
    ///
    /// Enumerates every product type, selected sensor set, and species
    /// combination in registry order.
    pub fn tropess_short_names(&self, sensor_set: Option<&str>) -> Result<Vec<String>> {
        let sensor_sets = self.selected_sensor_sets(sensor_set)?;

        let mut short_names = Vec::new();
        for product in PRODUCT_TYPES {
            for sensor in &sensor_sets {
                for species in self.species {
                    short_names.push(format_short_name(product, species, sensor, self));
                }
            }
        }

        Ok(short_names)
    }

    /// All MUSES short names for this group.
    pub fn muses_short_names(&self, sensor_set: Option<&str>) -> Result<Vec<String>> {
        let sensor_sets = self.selected_sensor_sets(sensor_set)?;

        Ok(sensor_sets
            .iter()
            .map(|sensor| format!("MUSES-{}-{}", sensor.short_name, self.short_name))
            .collect())
    }
}

/// Formats a TROPESS product short name, aka the DAAC collection ID.
pub fn format_short_name(
    product: &ProductType,
    species: &str,
    sensor: &SensorSet,
    group: &CollectionGroup,
) -> String {
    format!(
        "TRPS{}L2{}{}{}",
        product.code, species, sensor.short_name, group.short_name
    )
}

/// Wraps a short name in the MDPS collection id URN for a venue.
pub fn mdps_collection_id(config: &MdpsConfig, short_name: &str, version: &str) -> String {
    format!(
        "URN:NASA:UNITY:{}:{}:{}___{}",
        config.project, config.venue, short_name, version
    )
}

/// MDPS collection ids for a list of short names.
pub fn mdps_collection_ids(
    config: &MdpsConfig,
    short_names: &[String],
    version: &str,
) -> Vec<String> {
    short_names
        .iter()
        .map(|short_name| mdps_collection_id(config, short_name, version))
        .collect()
}

/// MDPS collection ids for the MUSES inputs of a group.
pub fn muses_collection_ids(
    config: &MdpsConfig,
    group: &CollectionGroup,
    version: &str,
    sensor_set: Option<&str>,
) -> Result<Vec<String>> {
    let short_names = group.muses_short_names(sensor_set)?;
    Ok(mdps_collection_ids(config, &short_names, version))
}

/// MDPS collection ids for the TROPESS products of a group.
pub fn tropess_collection_ids(
    config: &MdpsConfig,
    group: &CollectionGroup,
    version: &str,
    sensor_set: Option<&str>,
) -> Result<Vec<String>> {
    let short_names = group.tropess_short_names(sensor_set)?;
    Ok(mdps_collection_ids(config, &short_names, version))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> MdpsConfig {
        MdpsConfig {
            project: "unity".to_string(),
            venue: "ops".to_string(),
            environment: "PROD".to_string(),
        }
    }

    #[test]
    fn test_get_collection_group() {
        assert!(get_collection_group("forward_stream").is_ok());
        assert!(get_collection_group("nonexistent").is_err());
    }

    #[test]
    fn test_find_sensor_set_by_keyword_and_alias() {
        let group = get_collection_group("forward_stream").unwrap();

        assert_eq!(group.find_sensor_set("CrIS-SNPP").unwrap().short_name, "CRS");
        assert_eq!(group.find_sensor_set("CrIS_JPSS1").unwrap().short_name, "CR1");
        assert!(group.find_sensor_set("MOPITT").is_err());
    }

    #[test]
    fn test_short_name_format() {
        let group = get_collection_group("forward_stream").unwrap();
        let product = get_product_type("standard").unwrap();
        let sensor = group.find_sensor_set("CrIS-SNPP").unwrap();

        assert_eq!(format_short_name(product, "O3", sensor, group), "TRPSDL2O3CRSFS");
    }

    #[test]
    fn test_tropess_short_names_all_combinations() {
        let group = get_collection_group("forward_stream").unwrap();
        let short_names = group.tropess_short_names(None).unwrap();

        // 3 products x 2 sensor sets x 4 species
        assert_eq!(short_names.len(), 24);
        assert!(short_names.contains(&"TRPSYL2O3CRSFS".to_string()));
        assert!(short_names.contains(&"TRPSFL2PANCR1FS".to_string()));
    }

    #[test]
    fn test_tropess_short_names_sensor_filter() {
        let group = get_collection_group("forward_stream").unwrap();
        let short_names = group.tropess_short_names(Some("CrIS-SNPP")).unwrap();

        assert_eq!(short_names.len(), 12);
        assert!(short_names.iter().all(|name| name.contains("CRS")));
    }

    #[test]
    fn test_muses_short_names() {
        let group = get_collection_group("forward_stream").unwrap();
        let short_names = group.muses_short_names(None).unwrap();

        assert_eq!(short_names, vec!["MUSES-CRS-FS", "MUSES-CR1-FS"]);
    }

    #[test]
    fn test_mdps_collection_id() {
        let id = mdps_collection_id(&test_config(), "TRPSDL2O3CRSFS", "2");
        assert_eq!(id, "URN:NASA:UNITY:unity:ops:TRPSDL2O3CRSFS___2");
    }

    #[test]
    fn test_muses_collection_ids_single_sensor_group() {
        let group = get_collection_group("reanalysis").unwrap();
        let ids = muses_collection_ids(&test_config(), group, "1", None).unwrap();

        assert_eq!(ids, vec!["URN:NASA:UNITY:unity:ops:MUSES-AIROMI-RS___1"]);
    }

    #[test]
    fn test_invalid_product_type() {
        assert!(get_product_type("weekly").is_err());
    }
}

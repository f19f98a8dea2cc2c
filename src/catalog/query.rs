//! Catalog Queries and Reporting
//!
//! Drives the read-only side of the data catalog: per-collection
//! overviews, per-date archive status, granule detail listings, STAC
//! catalog export, and the CNM delete messages sent when products must be
//! withdrawn from the DAAC.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use colored::Colorize;
use log::{info, warn};
use serde_json::json;

use crate::config::MdpsConfig;
use crate::error::Result;
use crate::stac::{self, Catalog};

use super::client::{processing_date_filter, DataServicesClient};
use super::products::{self, CollectionGroup};

/// Which side of the product line a query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductFamily {
    /// MUSES input retrievals
    Muses,

    /// Delivered TROPESS products
    Tropess,
}

impl ProductFamily {
    /// Collection-id prefix used when listing without a group.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Muses => "MUSES",
            Self::Tropess => "TRPS",
        }
    }

    /// Collection ids of this family for a group.
    pub fn collection_ids(
        &self,
        config: &MdpsConfig,
        group: &CollectionGroup,
        version: &str,
        sensor_set: Option<&str>,
    ) -> Result<Vec<String>> {
        match self {
            Self::Muses => products::muses_collection_ids(config, group, version, sensor_set),
            Self::Tropess => products::tropess_collection_ids(config, group, version, sensor_set),
        }
    }
}

/// Options shared by the query subcommands.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Collection group keyword; without one only ids are listed
    pub collection_group: Option<String>,

    pub sensor_set: Option<String>,

    /// Single processing date (`YYYY-MM-DD`)
    pub processing_date: Option<String>,

    /// Inclusive date range, mutually exclusive with `processing_date`
    pub date_range: Option<(String, String)>,

    /// Collection version of the queried family
    pub version: String,

    pub limit: usize,

    pub write_stac_catalog: bool,

    pub write_delete_message: bool,

    pub output_dir: Option<PathBuf>,
}

/// Runs a query against one product family and reports the results.
pub fn run_query(
    client: &DataServicesClient,
    config: &MdpsConfig,
    family: ProductFamily,
    opts: &QueryOptions,
) -> Result<()> {
    let Some(group_keyword) = &opts.collection_group else {
        display_collection_ids(client, family.prefix(), opts.limit)?;
        return Ok(());
    };

    let group = products::get_collection_group(group_keyword)?;
    let collection_ids =
        family.collection_ids(config, group, &opts.version, opts.sensor_set.as_deref())?;

    let filter = processing_date_filter(
        opts.processing_date.as_deref(),
        opts.date_range
            .as_ref()
            .map(|(start, stop)| (start.as_str(), stop.as_str())),
    )?;

    let mut catalogs = Vec::new();
    for collection_id in &collection_ids {
        catalogs.push(client.query_collection(collection_id, filter.as_deref(), opts.limit)?);
    }

    display_collection_summary(&collection_ids, &catalogs, opts.processing_date.as_deref())?;

    if let Some(output_dir) = &opts.output_dir {
        if !output_dir.exists() {
            fs::create_dir_all(output_dir)?;
        }
    }

    if opts.write_stac_catalog {
        match &opts.output_dir {
            Some(output_dir) => write_stac_files(&collection_ids, &catalogs, output_dir)?,
            None => warn!("Can not write STAC catalog files because output directory was not defined"),
        }
    }

    if opts.write_delete_message {
        match &opts.output_dir {
            Some(output_dir) => {
                write_delete_messages(&collection_ids, &catalogs, &opts.version, output_dir)?
            }
            None => warn!("Can not write delete message files because output directory was not defined"),
        }
    }

    Ok(())
}

/// Lists catalog collection ids matching a family prefix.
pub fn display_collection_ids(
    client: &DataServicesClient,
    prefix: &str,
    limit: usize,
) -> Result<()> {
    for collection_id in client.get_collections(limit)? {
        if collection_id.contains(&format!(":{}", prefix)) {
            info!("* {}", collection_id);
        }
    }

    Ok(())
}

/// Prints one summary block per non-empty collection.
pub fn display_collection_summary(
    collection_ids: &[String],
    catalogs: &[Catalog],
    processing_date: Option<&str>,
) -> Result<()> {
    for (collection_id, catalog) in collection_ids.iter().zip(catalogs) {
        if catalog.features.is_empty() {
            println!("{} is empty.", collection_id);
            continue;
        }

        println!();
        display_overview(collection_id, catalog, processing_date)?;

        if processing_date.is_none() {
            display_dates(catalog);
        } else {
            display_date_details(catalog, collection_id);
        }
    }

    Ok(())
}

/// Two-column overview of a collection's constant metadata.
fn display_overview(
    collection_id: &str,
    catalog: &Catalog,
    processing_date: Option<&str>,
) -> Result<()> {
    let mut rows: Vec<(String, String)> = vec![("Collection ID".to_string(), collection_id.to_string())];

    let mut push_constant = |label: &str, property: &str| -> Result<()> {
        let value = stac::constant_property(catalog, property, false)
            .map_err(crate::error::DeployError::Validation)?;
        rows.push((label.to_string(), value.unwrap_or_default()));
        Ok(())
    };

    push_constant("Collection Group", "collection_group")?;
    push_constant("Sensor Set", "sensor_set")?;
    push_constant("Product Stage", "product_stage")?;

    let stage = stac::constant_property(catalog, "product_stage", false)
        .map_err(crate::error::DeployError::Validation)?;
    if stage.as_deref() != Some("MUSES") {
        push_constant("Product Type", "product_type")?;
        push_constant("Short Name", "short_name")?;
        push_constant("Long Name", "long_name")?;
    }

    push_constant("Product Version", "product_version")?;

    if let Some(date) = processing_date {
        rows.push(("Date".to_string(), date.to_string()));
    }

    for (label, value) in rows {
        let padded = format!("{:<18}", label);
        println!("  {} {}", padded.as_str().bold(), value);
    }

    Ok(())
}

/// Per-date granule and archive counts.
fn display_dates(catalog: &Catalog) {
    let status = stac::date_status(catalog);

    let rows: Vec<Vec<String>> = status
        .iter()
        .map(|(date, info)| {
            vec![
                date.clone(),
                info.count.to_string(),
                info.num_archived.to_string(),
            ]
        })
        .collect();

    print!("{}", render_table(&["Date", "Num Species", "Num Archived"], &rows));
}

/// Per-granule details for a single date.
fn display_date_details(catalog: &Catalog, collection_id: &str) {
    let rows: Vec<Vec<String>> = catalog
        .features
        .iter()
        .map(|feature| {
            let id = feature
                .id
                .trim_start_matches(collection_id)
                .trim_start_matches(':')
                .to_string();

            let species = feature
                .properties
                .get("species")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("")
                .to_string();

            vec![
                id,
                species,
                feature.assets.len().to_string(),
                stac::is_archived(feature).to_string(),
            ]
        })
        .collect();

    print!(
        "{}",
        render_table(&["ID", "Species", "Num Files", "Is Archived"], &rows)
    );
}

/// Renders an aligned plain-text table.
fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if cell.len() > widths[i] {
                widths[i] = cell.len();
            }
        }
    }

    let mut out = String::new();

    let header_line: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:<width$}", h, width = widths[i]))
        .collect();
    out.push_str(&format!("  {}\n", header_line.join("  ")));

    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&format!("  {}\n", separator.join("  ")));

    for row in rows {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{:<width$}", cell, width = widths[i]))
            .collect();
        out.push_str(&format!("  {}\n", line.join("  ")));
    }

    out
}

/// Writes one STAC catalog file per queried collection.
pub fn write_stac_files(
    collection_ids: &[String],
    catalogs: &[Catalog],
    output_dir: &Path,
) -> Result<()> {
    for (collection_id, catalog) in collection_ids.iter().zip(catalogs) {
        let output_filename = output_dir.join(format!("{}.stac", collection_id));
        catalog.save(&output_filename)?;
    }

    Ok(())
}

/// Builds the CNM delete message for one granule.
fn delete_message(
    product_id: &str,
    message_id: &str,
    short_name: &str,
    collection_version: &str,
    submission_time: &str,
) -> serde_json::Value {
    json!({
        "product": {
            "files": [],
            "name": product_id,
        },
        "identifier": message_id,
        "collection": {
            "name": short_name,
            "version": collection_version,
        },
        "provider": "tropess_cloud",
        "version": "1.3",
        "submissionTime": submission_time,
    })
}

/// Writes a CNM delete message per granule of each queried collection.
pub fn write_delete_messages(
    collection_ids: &[String],
    catalogs: &[Catalog],
    collection_version: &str,
    output_dir: &Path,
) -> Result<()> {
    let now = Local::now();
    let submission_time = now.format("%Y-%m-%dT%H:%M:%S").to_string();
    let id_time = now.format("%Y%m%dT%H%M%S").to_string();

    for (collection_id, catalog) in collection_ids.iter().zip(catalogs) {
        if catalog.features.is_empty() {
            continue;
        }

        let short_name = stac::constant_property(catalog, "short_name", true)
            .map_err(crate::error::DeployError::Validation)?
            .unwrap_or_default();

        for feature in &catalog.features {
            let product_id = feature
                .id
                .trim_start_matches(collection_id.as_str())
                .trim_start_matches(':');
            let message_id = format!("delete-{}-{}", product_id, id_time);

            let message = delete_message(
                product_id,
                &message_id,
                &short_name,
                collection_version,
                &submission_time,
            );

            let output_filename = output_dir.join(format!("{}.json", message_id));
            info!("Writing delete message to: {}", output_filename.display());
            fs::write(&output_filename, serde_json::to_string(&message)?)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_table_alignment() {
        let table = render_table(
            &["Date", "Count"],
            &[
                vec!["2021-07-04".to_string(), "8".to_string()],
                vec!["2021-07-05".to_string(), "12".to_string()],
            ],
        );

        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("Date"));
        assert!(lines[1].contains("----------"));
        assert!(lines[2].contains("2021-07-04"));
    }

    #[test]
    fn test_delete_message_shape() {
        let message = delete_message(
            "TROPESS_CrIS-SNPP_L2_Standard_O3_20210704",
            "delete-TROPESS_CrIS-SNPP_L2_Standard_O3_20210704-20260805T120000",
            "TRPSDL2O3CRSFS",
            "2",
            "2026-08-05T12:00:00",
        );

        assert_eq!(message["collection"]["name"], "TRPSDL2O3CRSFS");
        assert_eq!(message["collection"]["version"], "2");
        assert_eq!(message["provider"], "tropess_cloud");
        assert_eq!(message["version"], "1.3");
        assert!(message["product"]["files"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_product_family_prefix() {
        assert_eq!(ProductFamily::Muses.prefix(), "MUSES");
        assert_eq!(ProductFamily::Tropess.prefix(), "TRPS");
    }

    #[test]
    fn test_write_delete_messages_skips_empty() {
        use tempfile::tempdir;

        let temp_dir = tempdir().unwrap();
        let ids = vec!["URN:NASA:UNITY:unity:ops:TRPSDL2O3CRSFS___2".to_string()];
        let catalogs = vec![Catalog::default()];

        write_delete_messages(&ids, &catalogs, "2", temp_dir.path()).unwrap();

        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_write_delete_messages_one_per_granule() {
        use tempfile::tempdir;

        let temp_dir = tempdir().unwrap();
        let collection_id = "URN:NASA:UNITY:unity:ops:TRPSDL2O3CRSFS___2";
        let catalog: Catalog = serde_json::from_str(&format!(
            r#"{{"links": [], "features": [
                {{"id": "{0}:granule_a", "properties": {{"short_name": "TRPSDL2O3CRSFS"}}, "assets": {{}}}},
                {{"id": "{0}:granule_b", "properties": {{"short_name": "TRPSDL2O3CRSFS"}}, "assets": {{}}}}
            ]}}"#,
            collection_id
        ))
        .unwrap();

        write_delete_messages(
            &[collection_id.to_string()],
            &[catalog],
            "2",
            temp_dir.path(),
        )
        .unwrap();

        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 2);
    }
}

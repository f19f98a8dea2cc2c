//! Data Services API Client
//!
//! Blocking client for the MDPS data services (DAPA) API: collection
//! listing and creation, granule queries, custom metadata, and DAAC
//! archive configuration. All operations are single requests; any
//! non-success response becomes an error carrying the response body.

use std::time::Duration;

use log::{debug, info};
use reqwest::blocking::{Client, RequestBuilder};
use serde::Serialize;
use serde_json::{Map, Value};
use url::Url;

use chrono::NaiveDate;

use crate::config::{self, MdpsConfig};
use crate::error::{DeployError, Result};
use crate::stac::Catalog;

/// Request timeout for data services calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// File extensions archived at the DAAC by default.
pub const DEFAULT_ARCHIVING_TYPES: &[&str] = &[".nc"];

/// DAAC archive configuration for one collection.
#[derive(Serialize, Debug, Clone)]
pub struct ArchiveConfig {
    pub daac_collection_id: String,
    pub daac_data_version: String,
    pub daac_sns_topic_arn: String,
    pub daac_provider: String,
    pub daac_role_arn: String,
    pub daac_role_session_name: String,
    pub archiving_types: Vec<ArchivingType>,
}

/// One archived data type and its file extensions.
#[derive(Serialize, Debug, Clone)]
pub struct ArchivingType {
    pub data_type: String,
    pub file_extension: Vec<String>,
}

impl ArchiveConfig {
    /// Builds a configuration archiving the default file types.
    pub fn new(
        daac_collection_id: impl Into<String>,
        daac_data_version: impl Into<String>,
        daac_sns_topic_arn: impl Into<String>,
        daac_provider: impl Into<String>,
        daac_role_arn: impl Into<String>,
        daac_role_session_name: impl Into<String>,
    ) -> Self {
        Self {
            daac_collection_id: daac_collection_id.into(),
            daac_data_version: daac_data_version.into(),
            daac_sns_topic_arn: daac_sns_topic_arn.into(),
            daac_provider: daac_provider.into(),
            daac_role_arn: daac_role_arn.into(),
            daac_role_session_name: daac_role_session_name.into(),
            archiving_types: vec![ArchivingType {
                data_type: "data".to_string(),
                file_extension: DEFAULT_ARCHIVING_TYPES
                    .iter()
                    .map(|ext| ext.to_string())
                    .collect(),
            }],
        }
    }
}

/// Client for the MDPS data services API.
pub struct DataServicesClient {
    http: Client,
    endpoint: Url,
    token: String,
    venue: String,
}

impl DataServicesClient {
    /// Connects using the environment's endpoint and bearer token.
    pub fn connect(config: &MdpsConfig) -> Result<Self> {
        let mut endpoint_str = config::data_services_url()?;
        if !endpoint_str.ends_with('/') {
            endpoint_str.push('/');
        }

        let endpoint = Url::parse(&endpoint_str)?;
        let token = config::auth_token()?;

        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        info!("Using data services endpoint: {}", endpoint);

        Ok(Self {
            http,
            endpoint,
            token,
            venue: config.venue.clone(),
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.endpoint.join(path)?)
    }

    fn send(&self, context: &str, request: RequestBuilder) -> Result<Value> {
        let response = request.bearer_auth(&self.token).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeployError::api(
                context,
                status.as_u16(),
                response.text().unwrap_or_default(),
            ));
        }

        Ok(response.json()?)
    }

    /// Lists collection ids registered with data services.
    pub fn get_collections(&self, limit: usize) -> Result<Vec<String>> {
        let url = self.url("am-uds-dapa/collections")?;
        let request = self.http.get(url).query(&[("limit", limit.to_string())]);

        let body = self.send("listing collections", request)?;

        let ids = body
            .get("features")
            .and_then(Value::as_array)
            .map(|features| {
                features
                    .iter()
                    .filter_map(|feature| feature.get("id").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(ids)
    }

    /// Queries granules of a collection as a STAC item collection.
    pub fn query_collection(
        &self,
        collection_id: &str,
        filter: Option<&str>,
        limit: usize,
    ) -> Result<Catalog> {
        debug!(
            "Searching data catalog for collection {} (filter: {:?})",
            collection_id, filter
        );

        let url = self.url(&format!("am-uds-dapa/collections/{}/items", collection_id))?;

        let mut request = self.http.get(url).query(&[("limit", limit.to_string())]);
        if let Some(filter) = filter {
            request = request.query(&[("filter", filter)]);
        }

        let body = self.send("querying data catalog", request)?;

        if body.get("features").is_none() {
            return Err(DeployError::validation(format!(
                "Error querying data catalog: {}",
                body
            )));
        }

        Ok(serde_json::from_value(body)?)
    }

    /// Registers a collection id with data services.
    ///
    /// Creation is asynchronous on the service side; a successful request
    /// does not mean the collection is queryable yet.
    pub fn create_collection(&self, collection_id: &str) -> Result<()> {
        info!("Registering collection id: {}", collection_id);

        let url = self.url("am-uds-dapa/collections")?;
        let body = serde_json::json!({ "id": collection_id });

        self.send("creating collection", self.http.post(url).json(&body))?;
        Ok(())
    }

    /// Returns the custom metadata fields defined on one collection.
    pub fn collection_metadata(&self, collection_id: &str) -> Result<Map<String, Value>> {
        let url = self.url(&format!(
            "am-uds-dapa/collections/{}/variables",
            collection_id
        ))?;

        let body = self.send("reading custom metadata", self.http.get(url))?;

        match body {
            Value::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }

    /// Merges the custom metadata fields defined across all collections.
    pub fn existing_custom_metadata(&self, limit: usize) -> Result<Map<String, Value>> {
        let mut merged = Map::new();

        for collection_id in self.get_collections(limit)? {
            merged.extend(self.collection_metadata(&collection_id)?);
        }

        Ok(merged)
    }

    /// Defines custom metadata fields for all future ingests to the venue.
    pub fn define_custom_metadata(&self, fields: &Map<String, Value>) -> Result<()> {
        let url = self.url(&format!("am-uds-dapa/admin/custom_metadata/{}", self.venue))?;

        self.send(
            "defining custom metadata",
            self.http.put(url).json(&Value::Object(fields.clone())),
        )?;
        Ok(())
    }

    /// Returns the DAAC archive configuration of a collection.
    pub fn get_archive_config(&self, collection_id: &str) -> Result<Value> {
        let url = self.url(&format!(
            "am-uds-dapa/collections/{}/archive",
            collection_id
        ))?;

        self.send("reading archive configuration", self.http.get(url))
    }

    /// Installs a DAAC archive configuration on a collection.
    pub fn put_archive_config(&self, collection_id: &str, config: &ArchiveConfig) -> Result<Value> {
        let url = self.url(&format!(
            "am-uds-dapa/collections/{}/archive",
            collection_id
        ))?;

        self.send(
            "installing archive configuration",
            self.http.put(url).json(config),
        )
    }

    /// Removes a DAAC archive configuration from a collection.
    pub fn delete_archive_config(
        &self,
        collection_id: &str,
        daac_collection_id: &str,
    ) -> Result<Value> {
        let url = self.url(&format!(
            "am-uds-dapa/collections/{}/archive",
            collection_id
        ))?;
        let body = serde_json::json!({ "daac_collection_id": daac_collection_id });

        self.send(
            "deleting archive configuration",
            self.http.delete(url).json(&body),
        )
    }
}

/// Builds the `processing_datetime` query filter for a date selection.
///
/// Dates must be `YYYY-MM-DD`. A range filter is inclusive on both ends;
/// with neither a date nor a range there is no filter.
pub fn processing_date_filter(
    date: Option<&str>,
    range: Option<(&str, &str)>,
) -> Result<Option<String>> {
    fn checked(date: &str) -> Result<String> {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map(|parsed| parsed.format("%Y-%m-%d").to_string())
            .map_err(|_| {
                DeployError::validation(format!(
                    "Invalid date value: {}. Expected YYYY-MM-DD.",
                    date
                ))
            })
    }

    match (date, range) {
        (_, Some((start, stop))) => {
            let start = checked(start)?;
            let stop = checked(stop)?;
            Ok(Some(format!(
                "processing_datetime>='{}' and processing_datetime<='{}'",
                start, stop
            )))
        }
        (Some(date), None) => {
            let date = checked(date)?;
            Ok(Some(format!("processing_datetime='{}'", date)))
        }
        (None, None) => Ok(None),
    }
}

//! Data Catalog Module
//!
//! Everything that talks about TROPESS collections: the built-in product
//! registry (collection groups, sensor sets, short names), the blocking
//! client for the MDPS data services API, administrative registration
//! operations, and the query/reporting helpers behind the console tools.
//!
//! # Structure
//!
//! - [`products`]: Collection groups, sensor sets, naming conventions
//! - [`client`]: Data services API client
//! - [`admin`]: Collection registration, custom metadata, DAAC archiving
//! - [`query`]: Catalog queries, summaries, and report output

pub mod admin;
pub mod client;
pub mod products;
pub mod query;

pub use client::{processing_date_filter, ArchiveConfig, DataServicesClient};
pub use products::{get_collection_group, CollectionGroup, SensorSet, COLLECTION_GROUPS};
pub use query::{run_query, ProductFamily, QueryOptions};

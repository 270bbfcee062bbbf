//! Search backends.
//!
//! A query is serialized for exactly one backend:
//! - Portal sharing API search (`arcgis`), the default
//! - Hub Search OGC items API (`arcgis-hub`)

mod ogc;
mod portal;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use ogc::{OgcSearch, ogc_item_query_params};
pub use portal::{PortalSearch, portal_q, portal_search_params};

use super::types::{EntityType, HubSearchOptions, HubSearchResponse, Query};
use crate::error::{Error, Result};

/// Backend type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BackendType {
    /// Portal sharing API search
    #[default]
    #[serde(rename = "arcgis")]
    ArcgisPortal,
    /// Hub Search OGC API
    #[serde(rename = "arcgis-hub")]
    ArcgisHub,
}

impl fmt::Display for BackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendType::ArcgisPortal => write!(f, "arcgis"),
            BackendType::ArcgisHub => write!(f, "arcgis-hub"),
        }
    }
}

impl std::str::FromStr for BackendType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "arcgis" | "portal" => Ok(BackendType::ArcgisPortal),
            "arcgis-hub" | "hub" | "ogc" => Ok(BackendType::ArcgisHub),
            _ => Err(format!(
                "Unknown search api '{}'. Valid options: arcgis, arcgis-hub",
                s
            )),
        }
    }
}

/// Common interface for search backends.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    fn backend_type(&self) -> BackendType;

    /// Entity types this backend can search.
    fn supports(&self, entity: EntityType) -> bool;

    /// Run one page of the query.
    async fn search(&self, query: &Query, options: &HubSearchOptions) -> Result<HubSearchResponse>;
}

/// Create the backend selected by `options.api`.
pub fn create_backend(options: &HubSearchOptions) -> Box<dyn SearchBackend> {
    match options.api.as_ref().map(|api| (api.api_type, api.url.as_str())) {
        Some((BackendType::ArcgisHub, url)) => Box::new(OgcSearch::new(url)),
        _ => Box::new(PortalSearch),
    }
}

/// Error for an entity type the selected backend cannot search.
pub(crate) fn not_implemented(entity: EntityType, backend: BackendType) -> Error {
    Error::hub(
        "hubSearch",
        format!(
            "Search via \"{}\" filter against \"{}\" api is not implemented",
            entity, backend
        ),
    )
}

//! Portal sharing REST API access.

mod client;
mod types;

use serde::{Deserialize, Serialize};

pub use client::{PortalClient, PortalClientBuilder};
pub use types::{PortalGroup, PortalItem, PortalSearchResponse};

/// Where and how to reach the Portal and Hub APIs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubRequestOptions {
    /// Sharing API url, e.g. `https://www.arcgis.com/sharing/rest`.
    pub portal: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hub_api_url: Option<String>,
    #[serde(default)]
    pub is_portal: bool,
}

impl HubRequestOptions {
    /// Portal root without the `/sharing/rest` suffix.
    pub fn portal_root(&self) -> &str {
        self.portal
            .trim_end_matches('/')
            .trim_end_matches("/sharing/rest")
    }
}

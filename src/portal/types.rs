use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::UserMembership;

/// Portal item record (sharing API `IItem`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PortalItem {
    pub id: String,
    pub owner: String,
    pub org_id: Option<String>,
    pub title: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub type_keywords: Vec<String>,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub description: Option<String>,
    pub snippet: Option<String>,
    pub access: String,
    pub url: Option<String>,
    pub created: i64,
    pub modified: i64,
    pub extent: Vec<Vec<f64>>,
    pub thumbnail: Option<String>,
    pub culture: Option<String>,
    pub access_information: Option<String>,
    pub license_info: Option<String>,
    pub item_control: Option<String>,
    pub num_views: Option<u64>,
    pub size: Option<i64>,
    pub properties: Option<Value>,
}

/// Portal group record (sharing API `IGroup`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PortalGroup {
    pub id: String,
    pub title: String,
    pub owner: String,
    pub description: Option<String>,
    pub snippet: Option<String>,
    pub access: String,
    pub tags: Vec<String>,
    pub thumbnail: Option<String>,
    pub created: i64,
    pub modified: i64,
    pub is_invitation_only: bool,
    pub is_view_only: bool,
    pub protected: bool,
    pub user_membership: Option<UserMembership>,
    pub member_count: Option<u64>,
    pub type_keywords: Vec<String>,
}

/// Envelope returned by the sharing `search` endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PortalSearchResponse {
    pub total: u64,
    pub start: i64,
    pub num: i64,
    pub next_start: i64,
    pub results: Vec<Value>,
    pub aggregations: Option<Value>,
}

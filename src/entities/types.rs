use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::content::HubFamily;
use crate::permissions::{EntityPermissionPolicy, FeatureFlags};
use crate::search::HubCatalog;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityLinks {
    #[serde(rename = "self")]
    pub self_url: String,
    pub site_relative: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_relative: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// Fields shared by every Hub entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubEntityBase {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub owner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(default)]
    pub access: String,
    #[serde(default)]
    pub type_keywords: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub culture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub created_date: DateTime<Utc>,
    pub created_date_source: String,
    pub updated_date: DateTime<Utc>,
    pub updated_date_source: String,
    #[serde(default)]
    pub can_edit: bool,
    #[serde(default)]
    pub can_delete: bool,
    #[serde(default)]
    pub is_discussable: bool,
    #[serde(default)]
    pub features: FeatureFlags,
    #[serde(default)]
    pub links: EntityLinks,
    #[serde(default)]
    pub permissions: Vec<EntityPermissionPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProjectStatus {
    #[default]
    NotStarted,
    InProgress,
    OnHold,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubProject {
    #[serde(flatten)]
    pub base: HubEntityBase,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<HubCatalog>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubInitiative {
    #[serde(flatten)]
    pub base: HubEntityBase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<HubCatalog>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubSite {
    #[serde(flatten)]
    pub base: HubEntityBase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdomain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<HubCatalog>,
    #[serde(default)]
    pub is_umbrella: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubPage {
    #[serde(flatten)]
    pub base: HubEntityBase,
    #[serde(default)]
    pub site_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubTemplate {
    #[serde(flatten)]
    pub base: HubEntityBase,
    #[serde(default)]
    pub is_deployed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployed_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubDiscussion {
    #[serde(flatten)]
    pub base: HubEntityBase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubGroup {
    #[serde(flatten)]
    pub base: HubEntityBase,
    #[serde(default)]
    pub is_invitation_only: bool,
    #[serde(default)]
    pub is_view_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_count: Option<u64>,
}

/// Any Hub entity, tagged with its kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entityType", rename_all = "camelCase")]
pub enum HubEntity {
    Site(HubSite),
    Project(HubProject),
    Initiative(HubInitiative),
    Page(HubPage),
    Group(HubGroup),
    Template(HubTemplate),
    Discussion(HubDiscussion),
}

impl HubEntity {
    pub fn base(&self) -> &HubEntityBase {
        match self {
            HubEntity::Site(e) => &e.base,
            HubEntity::Project(e) => &e.base,
            HubEntity::Initiative(e) => &e.base,
            HubEntity::Page(e) => &e.base,
            HubEntity::Group(e) => &e.base,
            HubEntity::Template(e) => &e.base,
            HubEntity::Discussion(e) => &e.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut HubEntityBase {
        match self {
            HubEntity::Site(e) => &mut e.base,
            HubEntity::Project(e) => &mut e.base,
            HubEntity::Initiative(e) => &mut e.base,
            HubEntity::Page(e) => &mut e.base,
            HubEntity::Group(e) => &mut e.base,
            HubEntity::Template(e) => &mut e.base,
            HubEntity::Discussion(e) => &mut e.base,
        }
    }

    pub fn id(&self) -> &str {
        &self.base().id
    }

    pub fn family(&self) -> HubFamily {
        match self {
            HubEntity::Site(_) => HubFamily::Site,
            HubEntity::Project(_) => HubFamily::Project,
            HubEntity::Initiative(_) => HubFamily::Initiative,
            HubEntity::Page(_) => HubFamily::Document,
            HubEntity::Group(_) => HubFamily::Team,
            HubEntity::Template(_) => HubFamily::Template,
            HubEntity::Discussion(_) => HubFamily::Discussion,
        }
    }

    /// Group entities are backed by a Portal group rather than an item.
    pub fn is_group(&self) -> bool {
        matches!(self, HubEntity::Group(_))
    }
}

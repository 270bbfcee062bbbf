//! Typed Hub entities composed from Portal items and groups.

pub mod compute;
mod fetch;
mod instance;
mod types;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::portal::PortalItem;

pub use compute::{
    compute_discussion, compute_group, compute_initiative, compute_page, compute_project,
    compute_site, compute_template, get_deployed_template_type, model_to_entity,
};
pub use fetch::{fetch_content, fetch_hub_group, fetch_model, fetch_project, get_item_by_slug};
pub use instance::{EntityInstance, EntityState};
pub use types::{
    EntityLinks, HubDiscussion, HubEntity, HubEntityBase, HubGroup, HubInitiative, HubPage,
    HubProject, HubSite, HubTemplate, ProjectStatus,
};

/// An item and its data resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub item: PortalItem,
    #[serde(default)]
    pub data: Value,
}

use serde_json::Value;
use tracing::debug;

use super::Model;
use super::compute::{compute_group, compute_project};
use super::types::{HubGroup, HubProject};
use crate::content::{HubContent, is_slug, item_to_content, slug_keyword};
use crate::context::ArcGISContext;
use crate::error::{Error, Result};
use crate::portal::{PortalClient, PortalItem};
use crate::util::is_guid;

fn client_for(context: &ArcGISContext) -> Result<PortalClient> {
    PortalClient::from_request_options(&context.hub_request_options())
}

/// Item + data for an item id. Items without data get an empty object.
pub async fn fetch_model(client: &PortalClient, id: &str) -> Result<Model> {
    let item = client.get_item(id).await?;
    model_with_data(client, item).await
}

async fn model_with_data(client: &PortalClient, item: PortalItem) -> Result<Model> {
    let data = client
        .get_item_data(&item.id)
        .await?
        .unwrap_or_else(|| Value::Object(Default::default()));
    Ok(Model { item, data })
}

/// First item carrying the `slug|<slug>` type keyword.
pub async fn get_item_by_slug(client: &PortalClient, slug: &str) -> Result<Option<PortalItem>> {
    let params = [
        ("q", format!("typekeywords:\"{}\"", slug_keyword(slug))),
        ("num", "1".to_string()),
    ];
    let response = client.search_items(&params).await?;
    match response.results.into_iter().next() {
        Some(result) => Ok(Some(serde_json::from_value(result)?)),
        None => Ok(None),
    }
}

/// Project by item id or slug. Unknown slugs resolve to `None`.
pub async fn fetch_project(
    identifier: &str,
    context: &ArcGISContext,
) -> Result<Option<HubProject>> {
    let client = client_for(context)?;
    let model = if is_guid(identifier) {
        fetch_model(&client, identifier).await?
    } else {
        let Some(item) = get_item_by_slug(&client, identifier).await? else {
            debug!(identifier, "no project for slug");
            return Ok(None);
        };
        model_with_data(&client, item).await?
    };
    Ok(Some(compute_project(
        &model,
        &context.hub_request_options(),
        context.current_user(),
    )))
}

/// Group entity by id. A missing group is reported as `Group not found.`.
pub async fn fetch_hub_group(id: &str, context: &ArcGISContext) -> Result<HubGroup> {
    let client = client_for(context)?;
    let group = client.get_group(id).await.map_err(|e| {
        if e.to_string().to_lowercase().contains("group does not exist") {
            Error::hub("fetchHubGroup", "Group not found.")
        } else {
            e
        }
    })?;
    Ok(compute_group(
        &group,
        &context.hub_request_options(),
        context.current_user(),
    ))
}

/// Content for an item id, record id (`{id}_{layer}`) or slug.
pub async fn fetch_content(identifier: &str, context: &ArcGISContext) -> Result<HubContent> {
    let client = client_for(context)?;
    let item = if is_slug(identifier) {
        get_item_by_slug(&client, identifier).await?
    } else {
        let (item_id, _) = crate::content::parse_dataset_id(identifier);
        Some(client.get_item(item_id).await?)
    };
    item.map(|item| item_to_content(&item))
        .ok_or_else(|| Error::NotFound(identifier.to_string()))
}

//! Model → entity transforms. Every function builds a new value; the model
//! passed in is never changed.

use serde_json::Value;

use super::types::{
    EntityLinks, HubDiscussion, HubEntity, HubEntityBase, HubGroup, HubInitiative, HubPage,
    HubProject, HubSite, HubTemplate, ProjectStatus,
};
use super::Model;
use crate::content::{
    HubFamily, get_family, get_hub_relative_url, get_item_home_url, get_item_slug,
    get_item_thumbnail_url, is_page_type, normalize_item_type,
};
use crate::context::PortalUser;
use crate::permissions::features::{
    FeatureFlags, group_default_features, initiative_default_features, project_default_features,
    site_default_features,
};
use crate::permissions::{EntityPermissionPolicy, process_entity_features};
use crate::portal::{HubRequestOptions, PortalGroup};
use crate::search::{HubCatalog, upgrade_catalog_schema};
use crate::util::{get_prop, get_str, millis_to_datetime};

const DEPLOYED_TYPE_PREFIX: &str = "deployedType|";

/// Edit/delete rights derived from `itemControl`, falling back to ownership.
fn item_rights(item_control: Option<&str>, owner: &str, user: Option<&PortalUser>) -> (bool, bool) {
    match item_control {
        Some("admin") => (true, true),
        Some("update") => (true, false),
        _ => {
            let is_owner = user.is_some_and(|u| u.username == owner);
            (is_owner, is_owner)
        }
    }
}

fn entity_permissions(data: &Value) -> Vec<EntityPermissionPolicy> {
    get_prop(data, "permissions")
        .and_then(Value::as_array)
        .map(|grants| {
            grants
                .iter()
                .filter_map(|g| serde_json::from_value(g.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

fn catalog_from(data: &Value) -> Option<HubCatalog> {
    get_prop(data, "catalog").and_then(|c| upgrade_catalog_schema(c.clone()).ok())
}

/// Discussions are on unless the `cannotDiscuss` keyword is present.
fn is_discussable(type_keywords: &[String]) -> bool {
    !type_keywords.iter().any(|k| k == "cannotDiscuss")
}

/// Base record for an item-backed entity.
pub fn compute_base(
    model: &Model,
    options: &HubRequestOptions,
    user: Option<&PortalUser>,
    defaults: &FeatureFlags,
) -> HubEntityBase {
    let item = &model.item;
    let slug = get_item_slug(&item.type_keywords).map(str::to_string);
    let thumbnail_url = get_item_thumbnail_url(item, options);
    let (can_edit, can_delete) = item_rights(item.item_control.as_deref(), &item.owner, user);
    let identifier = slug.as_deref().unwrap_or(&item.id);
    let family = get_family(&normalize_item_type(&item.item_type, &item.type_keywords));

    HubEntityBase {
        id: item.id.clone(),
        name: item.title.clone(),
        summary: item.snippet.clone(),
        description: item.description.clone(),
        owner: item.owner.clone(),
        org_id: item.org_id.clone(),
        item_type: item.item_type.clone(),
        access: item.access.clone(),
        type_keywords: item.type_keywords.clone(),
        tags: item.tags.clone(),
        categories: item.categories.clone(),
        culture: item.culture.clone(),
        url: item.url.clone(),
        thumbnail: item.thumbnail.clone(),
        thumbnail_url: thumbnail_url.clone(),
        created_date: millis_to_datetime(item.created),
        created_date_source: "item.created".to_string(),
        updated_date: millis_to_datetime(item.modified),
        updated_date_source: "item.modified".to_string(),
        can_edit,
        can_delete,
        is_discussable: is_discussable(&item.type_keywords),
        features: process_entity_features(get_prop(&model.data, "settings.features"), defaults),
        links: EntityLinks {
            self_url: get_item_home_url(&item.id, options),
            site_relative: get_hub_relative_url(&item.item_type, identifier, &item.type_keywords),
            workspace_relative: workspace_path(family, &item.id),
            thumbnail: thumbnail_url,
        },
        permissions: entity_permissions(&model.data),
        location: get_prop(&model.data, "location").cloned(),
        slug,
    }
}

fn workspace_path(family: HubFamily, id: &str) -> Option<String> {
    let segment = match family {
        HubFamily::Project => "projects",
        HubFamily::Initiative => "initiatives",
        HubFamily::Site => "sites",
        HubFamily::Template => "templates",
        HubFamily::Discussion => "discussions",
        _ => return None,
    };
    Some(format!("/workspace/{}/{}", segment, id))
}

pub fn compute_project(
    model: &Model,
    options: &HubRequestOptions,
    user: Option<&PortalUser>,
) -> HubProject {
    HubProject {
        base: compute_base(model, options, user, &project_default_features()),
        status: get_prop(&model.data, "status")
            .and_then(|s| serde_json::from_value::<ProjectStatus>(s.clone()).ok())
            .unwrap_or_default(),
        catalog: catalog_from(&model.data),
    }
}

pub fn compute_initiative(
    model: &Model,
    options: &HubRequestOptions,
    user: Option<&PortalUser>,
) -> HubInitiative {
    HubInitiative {
        base: compute_base(model, options, user, &initiative_default_features()),
        catalog: catalog_from(&model.data),
        parent_id: model
            .item
            .properties
            .as_ref()
            .and_then(|p| get_str(p, "parentId"))
            .map(str::to_string),
    }
}

pub fn compute_site(
    model: &Model,
    options: &HubRequestOptions,
    user: Option<&PortalUser>,
) -> HubSite {
    let values = |path: &str| {
        get_str(&model.data, &format!("values.{}", path)).map(str::to_string)
    };
    let mut base = compute_base(model, options, user, &site_default_features());
    if let Some(url) = &model.item.url {
        base.links.site_relative = "/".to_string();
        base.links.self_url = url.clone();
    }
    HubSite {
        base,
        subdomain: values("subdomain"),
        default_hostname: values("defaultHostname"),
        custom_hostname: values("customHostname"),
        catalog: catalog_from(&model.data),
        is_umbrella: get_prop(&model.data, "values.isUmbrella")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    }
}

pub fn compute_page(
    model: &Model,
    options: &HubRequestOptions,
    user: Option<&PortalUser>,
) -> HubPage {
    let site_ids = get_prop(&model.data, "values.sites")
        .and_then(Value::as_array)
        .map(|sites| {
            sites
                .iter()
                .filter_map(|s| s.get("id").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    HubPage {
        base: compute_base(model, options, user, &FeatureFlags::new()),
        site_ids,
    }
}

/// Deployed templates record their source type as `deployedType|<type>`.
pub fn get_deployed_template_type(type_keywords: &[String]) -> Option<String> {
    type_keywords
        .iter()
        .find_map(|k| k.strip_prefix(DEPLOYED_TYPE_PREFIX))
        .map(str::to_string)
}

pub fn compute_template(
    model: &Model,
    options: &HubRequestOptions,
    user: Option<&PortalUser>,
) -> HubTemplate {
    let mut base = compute_base(model, options, user, &FeatureFlags::new());
    base.thumbnail_url = base.links.thumbnail.clone();
    HubTemplate {
        is_deployed: model.item.type_keywords.iter().any(|k| k == "Deployed"),
        deployed_type: get_deployed_template_type(&model.item.type_keywords),
        base,
    }
}

pub fn compute_discussion(
    model: &Model,
    options: &HubRequestOptions,
    user: Option<&PortalUser>,
) -> HubDiscussion {
    HubDiscussion {
        base: compute_base(model, options, user, &FeatureFlags::new()),
        prompt: get_str(&model.data, "prompt").map(str::to_string),
    }
}

/// Group entity. Admins and owners of the group may edit and delete it.
pub fn compute_group(
    group: &PortalGroup,
    options: &HubRequestOptions,
    user: Option<&PortalUser>,
) -> HubGroup {
    let member_type = group.user_membership.as_ref().map(|m| m.member_type.clone());
    let is_owner = user.is_some_and(|u| u.username == group.owner);
    let is_admin = matches!(member_type.as_deref(), Some("admin") | Some("owner"));
    let thumbnail_url = group.thumbnail.as_deref().map(|thumb| {
        format!(
            "{}/community/groups/{}/info/{}",
            options.portal.trim_end_matches('/'),
            group.id,
            thumb
        )
    });

    HubGroup {
        base: HubEntityBase {
            id: group.id.clone(),
            name: group.title.clone(),
            summary: group.snippet.clone(),
            description: group.description.clone(),
            owner: group.owner.clone(),
            org_id: None,
            item_type: "Group".to_string(),
            access: group.access.clone(),
            type_keywords: group.type_keywords.clone(),
            tags: group.tags.clone(),
            categories: Vec::new(),
            culture: None,
            slug: None,
            url: None,
            thumbnail: group.thumbnail.clone(),
            thumbnail_url: thumbnail_url.clone(),
            created_date: millis_to_datetime(group.created),
            created_date_source: "group.created".to_string(),
            updated_date: millis_to_datetime(group.modified),
            updated_date_source: "group.modified".to_string(),
            can_edit: is_owner || is_admin,
            can_delete: is_owner || is_admin,
            is_discussable: is_discussable(&group.type_keywords),
            features: process_entity_features(None, &group_default_features()),
            links: EntityLinks {
                self_url: format!("{}/home/group.html?id={}", options.portal_root(), group.id),
                site_relative: format!("/teams/{}", group.id),
                workspace_relative: Some(format!("/workspace/groups/{}", group.id)),
                thumbnail: thumbnail_url,
            },
            permissions: Vec::new(),
            location: None,
        },
        is_invitation_only: group.is_invitation_only,
        is_view_only: group.is_view_only,
        member_type,
        member_count: group.member_count,
    }
}

/// Compose the entity matching an item's normalized type.
pub fn model_to_entity(
    model: &Model,
    options: &HubRequestOptions,
    user: Option<&PortalUser>,
) -> Option<HubEntity> {
    let item_type = normalize_item_type(&model.item.item_type, &model.item.type_keywords);
    if is_page_type(&item_type) {
        return Some(HubEntity::Page(compute_page(model, options, user)));
    }
    Some(match get_family(&item_type) {
        HubFamily::Project => HubEntity::Project(compute_project(model, options, user)),
        HubFamily::Initiative => HubEntity::Initiative(compute_initiative(model, options, user)),
        HubFamily::Site => HubEntity::Site(compute_site(model, options, user)),
        HubFamily::Template | HubFamily::InitiativeTemplate => {
            HubEntity::Template(compute_template(model, options, user))
        }
        HubFamily::Discussion => HubEntity::Discussion(compute_discussion(model, options, user)),
        _ => return None,
    })
}

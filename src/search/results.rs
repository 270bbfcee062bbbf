//! Portal records → normalized search results.

use crate::content::{
    HubFamily, get_family, get_hub_relative_url, get_item_home_url, get_item_thumbnail_url,
};
use crate::context::PortalUser;
use crate::portal::{HubRequestOptions, PortalGroup, PortalItem};
use crate::util::millis_to_datetime;

use super::types::{HubSearchResult, SearchResultLinks};

pub fn item_to_search_result(item: &PortalItem, options: &HubRequestOptions) -> HubSearchResult {
    HubSearchResult {
        access: item.access.clone(),
        id: item.id.clone(),
        result_type: item.item_type.clone(),
        name: item.title.clone(),
        owner: item.owner.clone(),
        tags: item.tags.clone(),
        type_keywords: item.type_keywords.clone(),
        categories: item.categories.clone(),
        summary: item
            .snippet
            .clone()
            .filter(|s| !s.is_empty())
            .or_else(|| item.description.clone()),
        created_date: millis_to_datetime(item.created),
        created_date_source: "item.created".to_string(),
        updated_date: millis_to_datetime(item.modified),
        updated_date_source: "item.modified".to_string(),
        family: Some(get_family(&item.item_type)),
        url: item.url.clone(),
        links: SearchResultLinks {
            self_url: get_item_home_url(&item.id, options),
            site_relative: get_hub_relative_url(&item.item_type, &item.id, &item.type_keywords),
            thumbnail: get_item_thumbnail_url(item, options),
        },
    }
}

pub fn group_to_search_result(group: &PortalGroup, options: &HubRequestOptions) -> HubSearchResult {
    let thumbnail = group.thumbnail.as_deref().map(|thumb| {
        format!(
            "{}/community/groups/{}/info/{}",
            options.portal.trim_end_matches('/'),
            group.id,
            thumb
        )
    });
    HubSearchResult {
        access: group.access.clone(),
        id: group.id.clone(),
        result_type: "Group".to_string(),
        name: group.title.clone(),
        owner: group.owner.clone(),
        tags: group.tags.clone(),
        type_keywords: group.type_keywords.clone(),
        categories: Vec::new(),
        summary: group
            .snippet
            .clone()
            .filter(|s| !s.is_empty())
            .or_else(|| group.description.clone()),
        created_date: millis_to_datetime(group.created),
        created_date_source: "group.created".to_string(),
        updated_date: millis_to_datetime(group.modified),
        updated_date_source: "group.modified".to_string(),
        family: Some(HubFamily::Team),
        url: None,
        links: SearchResultLinks {
            self_url: format!("{}/home/group.html?id={}", options.portal_root(), group.id),
            site_relative: format!("/teams/{}", group.id),
            thumbnail,
        },
    }
}

pub fn user_to_search_result(user: &PortalUser, options: &HubRequestOptions) -> HubSearchResult {
    let thumbnail = user.thumbnail.as_deref().map(|thumb| {
        format!(
            "{}/community/users/{}/info/{}",
            options.portal.trim_end_matches('/'),
            user.username,
            thumb
        )
    });
    HubSearchResult {
        access: user.access.clone().unwrap_or_else(|| "private".to_string()),
        id: user.username.clone(),
        result_type: "User".to_string(),
        name: user.full_name.clone().unwrap_or_else(|| user.username.clone()),
        owner: user.username.clone(),
        tags: Vec::new(),
        type_keywords: Vec::new(),
        categories: Vec::new(),
        summary: user.description.clone(),
        created_date: millis_to_datetime(user.created.unwrap_or_default()),
        created_date_source: "user.created".to_string(),
        updated_date: millis_to_datetime(user.modified.unwrap_or_default()),
        updated_date_source: "user.modified".to_string(),
        family: Some(HubFamily::People),
        url: None,
        links: SearchResultLinks {
            self_url: format!("{}/home/user.html?user={}", options.portal_root(), user.username),
            site_relative: format!("/people/{}", user.username),
            thumbnail,
        },
    }
}

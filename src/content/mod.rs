//! Item-backed content: type normalization, family lookup and the
//! `item_to_content` transform.

mod family;
mod slugs;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub use family::{HubFamily, get_collection, get_family};
pub use slugs::{
    add_context_to_slug, get_item_slug, is_slug, parse_dataset_id, remove_context_from_slug,
    slug_keyword,
};

use crate::portal::{HubRequestOptions, PortalItem};
use crate::util::{get_bool, get_prop, get_str, millis_to_datetime};

/// Types whose data can be downloaded directly.
const DOWNLOADABLE_TYPES: &[&str] = &[
    "CSV",
    "CSV Collection",
    "Feature Collection",
    "Feature Service",
    "File Geodatabase",
    "GeoJson",
    "GeoJSON",
    "Image Collection",
    "KML",
    "KML Collection",
    "Microsoft Excel",
    "PDF",
    "Shapefile",
    "Table",
];

/// Canonical type, folding legacy and keyword-tagged types into their Hub type.
pub fn normalize_item_type(item_type: &str, type_keywords: &[String]) -> String {
    let has = |kw: &str| type_keywords.iter().any(|k| k == kw);
    let is_web_app = item_type == "Web Mapping Application";
    if item_type == "Site Application" || (is_web_app && has("hubSite")) {
        "Hub Site Application".to_string()
    } else if item_type == "Site Page" || (is_web_app && has("hubPage")) {
        "Hub Page".to_string()
    } else if item_type == "Hub Initiative" && has("hubInitiativeTemplate") {
        "Hub Initiative Template".to_string()
    } else if is_web_app && has("hubSolutionTemplate") {
        "Solution".to_string()
    } else {
        item_type.to_string()
    }
}

pub fn is_page_type(item_type: &str) -> bool {
    matches!(item_type, "Hub Page" | "Site Page")
}

/// Trailing numeric path segment of a service url (`.../FeatureServer/3` → `3`).
pub fn get_layer_id_from_url(url: &str) -> Option<&str> {
    let (_, last) = url.trim_end_matches('/').rsplit_once('/')?;
    (!last.is_empty() && last.chars().all(|c| c.is_ascii_digit())).then_some(last)
}

/// Layer id of a single layer service, from its url or the `Singlelayer` keyword.
pub fn get_item_layer_id(item: &PortalItem) -> Option<String> {
    if let Some(layer) = item.url.as_deref().and_then(get_layer_id_from_url) {
        return Some(layer.to_string());
    }
    let single_layer = item.item_type.eq_ignore_ascii_case("feature service")
        && item.type_keywords.iter().any(|k| k == "Singlelayer");
    single_layer.then(|| "0".to_string())
}

/// Hub API id. Only public items are indexed.
pub fn get_item_hub_id(item: &PortalItem) -> Option<String> {
    if item.access != "public" {
        return None;
    }
    Some(match get_item_layer_id(item) {
        Some(layer) => format!("{}_{}", item.id, layer),
        None => item.id.clone(),
    })
}

/// Split `/Categories/A/B` paths into their segments, dropping the root.
pub fn parse_item_categories(categories: &[String]) -> Vec<String> {
    categories
        .iter()
        .flat_map(|c| c.split('/'))
        .filter(|segment| !segment.is_empty() && !segment.eq_ignore_ascii_case("categories"))
        .map(str::to_string)
        .collect()
}

pub fn is_downloadable(item: &PortalItem) -> bool {
    DOWNLOADABLE_TYPES.contains(&item.item_type.as_str())
        || item.type_keywords.iter().any(|k| k == "Data")
}

/// `{portal}/content/items/{id}/info/{thumbnail}`; the token is only
/// appended for non-public items.
pub fn get_item_thumbnail_url(item: &PortalItem, options: &HubRequestOptions) -> Option<String> {
    let thumbnail = item.thumbnail.as_deref().filter(|t| !t.is_empty())?;
    let url = format!(
        "{}/content/items/{}/info/{}",
        options.portal.trim_end_matches('/'),
        item.id,
        thumbnail
    );
    Some(match options.token.as_deref() {
        Some(token) if item.access != "public" => format!("{}?token={}", url, token),
        _ => url,
    })
}

/// Portal item page.
pub fn get_item_home_url(id: &str, options: &HubRequestOptions) -> String {
    format!("{}/home/item.html?id={}", options.portal_root(), id)
}

/// Path of an item relative to a Hub site.
pub fn get_hub_relative_url(item_type: &str, id: &str, type_keywords: &[String]) -> String {
    let has = |kw: &str| type_keywords.iter().any(|k| k == kw);
    if has("hubInitiativeTemplate") {
        return format!("/initiatives/templates/{}/about", id);
    }
    if item_type == "Solution" && has("hubSolutionTemplate") {
        return format!("/templates/{}/about", id);
    }
    if is_page_type(item_type) {
        return format!("/pages/{}", id);
    }
    match get_family(item_type) {
        family @ (HubFamily::App | HubFamily::Dataset | HubFamily::Document | HubFamily::Map) => {
            format!("/{}s/{}", family, id)
        }
        HubFamily::Feedback => format!("/feedback/surveys/{}", id),
        HubFamily::Template => format!("/templates/{}/about", id),
        HubFamily::Project => format!("/projects/{}", id),
        HubFamily::Initiative => format!("/initiatives/{}", id),
        HubFamily::Discussion => format!("/discussions/{}", id),
        HubFamily::Event => format!("/events/{}", id),
        _ => format!("/content/{}", id),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Publisher {
    pub name: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPermissions {
    pub visibility: String,
    pub control: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentLicense {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Geographic boundary, an envelope in WGS84.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    pub geometry: Value,
}

impl Boundary {
    /// `[[xmin, ymin], [xmax, ymax]]` → envelope. Empty extents have no boundary.
    pub fn from_extent(extent: &[Vec<f64>]) -> Option<Self> {
        let [min, max] = extent else {
            return None;
        };
        let (&[xmin, ymin], &[xmax, ymax]) = (min.as_slice(), max.as_slice()) else {
            return None;
        };
        Some(Self {
            geometry: json!({
                "type": "extent",
                "xmin": xmin,
                "ymin": ymin,
                "xmax": xmax,
                "ymax": ymax,
                "spatialReference": {"wkid": 4326}
            }),
        })
    }
}

/// Hub view of a Portal item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubContent {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub normalized_type: String,
    pub family: HubFamily,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hub_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub categories: Vec<String>,
    pub item_categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub publisher: Publisher,
    pub permissions: ContentPermissions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_links: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hub_actions: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Value>,
    pub is_downloadable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundary: Option<Boundary>,
    pub license: ContentLicense,
    pub created_date: DateTime<Utc>,
    pub created_date_source: String,
    pub published_date: DateTime<Utc>,
    pub published_date_source: String,
    pub updated_date: DateTime<Utc>,
    pub updated_date_source: String,
    pub item: PortalItem,
}

/// Compose Hub content from a Portal item.
pub fn item_to_content(item: &PortalItem) -> HubContent {
    let normalized_type = normalize_item_type(&item.item_type, &item.type_keywords);
    let created = millis_to_datetime(item.created);
    let property = |key: &str| item.properties.as_ref().and_then(|p| p.get(key)).cloned();
    HubContent {
        id: item.id.clone(),
        name: item.title.clone(),
        item_type: item.item_type.clone(),
        family: get_family(&normalized_type),
        normalized_type,
        hub_id: get_item_hub_id(item),
        slug: get_item_slug(&item.type_keywords).map(str::to_string),
        categories: parse_item_categories(&item.categories),
        item_categories: item.categories.clone(),
        summary: item
            .snippet
            .clone()
            .filter(|s| !s.is_empty())
            .or_else(|| item.description.clone()),
        publisher: Publisher {
            name: item.owner.clone(),
            username: item.owner.clone(),
        },
        permissions: ContentPermissions {
            visibility: item.access.clone(),
            control: item.item_control.clone().unwrap_or_else(|| "view".to_string()),
        },
        action_links: property("links"),
        hub_actions: property("actions"),
        metrics: property("metrics"),
        is_downloadable: is_downloadable(item),
        boundary: Boundary::from_extent(&item.extent),
        license: ContentLicense {
            name: "Custom License".to_string(),
            description: item.access_information.clone(),
        },
        created_date: created,
        created_date_source: "item.created".to_string(),
        published_date: created,
        published_date_source: "item.created".to_string(),
        updated_date: millis_to_datetime(item.modified),
        updated_date_source: "item.modified".to_string(),
        item: item.clone(),
    }
}

/// Preferred identifier for content in urls.
///
/// Templates and feedback use the item id. Pages use the slug the site
/// assigned them, if linked, else their id. Everything else prefers the slug
/// (namespace stripped when it matches the site's org key, kept on an
/// umbrella site), then the Hub API id, then the item id.
pub fn get_content_identifier(content: &HubContent, site: Option<&Value>) -> String {
    if matches!(content.family, HubFamily::Template | HubFamily::Feedback) {
        return content.id.clone();
    }

    if is_page_type(&content.item_type) {
        let linked = site
            .and_then(|s| get_prop(s, "data.values.pages"))
            .and_then(Value::as_array)
            .and_then(|pages| {
                pages
                    .iter()
                    .find(|p| p.get("id").and_then(Value::as_str) == Some(content.id.as_str()))
            });
        return match linked {
            Some(page) => get_str(page, "slug").unwrap_or_default().to_string(),
            None => content.id.clone(),
        };
    }

    if let Some(slug) = content.slug.as_deref() {
        let umbrella = site.is_some_and(|s| get_bool(s, "data.values.isUmbrella"));
        if umbrella {
            return slug.to_string();
        }
        let org_key = site
            .and_then(|s| get_str(s, "domainInfo.orgKey"))
            .unwrap_or_default();
        return remove_context_from_slug(slug, org_key).to_string();
    }

    content.hub_id.clone().unwrap_or_else(|| content.id.clone())
}

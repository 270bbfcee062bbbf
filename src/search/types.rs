//! Backend-agnostic query model and search response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use super::backend::BackendType;
use crate::content::HubFamily;
use crate::error::Result;
use crate::portal::HubRequestOptions;

/// Entity type a query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Item,
    Group,
    User,
    Event,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityType::Item => write!(f, "item"),
            EntityType::Group => write!(f, "group"),
            EntityType::User => write!(f, "user"),
            EntityType::Event => write!(f, "event"),
        }
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "item" => Ok(EntityType::Item),
            "group" => Ok(EntityType::Group),
            "user" => Ok(EntityType::User),
            "event" => Ok(EntityType::Event),
            _ => Err(format!("Unknown entity type: {}", s)),
        }
    }
}

/// A field → value map. Values are scalars, arrays, match options
/// (`{any, all, not}`) or ranges (`{from, to}`). Field order is preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Predicate(pub Map<String, Value>);

impl Predicate {
    /// Single-field predicate.
    pub fn field(name: &str, value: impl Into<Value>) -> Self {
        let mut map = Map::new();
        map.insert(name.to_string(), value.into());
        Self(map)
    }

    /// Free text predicate.
    pub fn term(text: &str) -> Self {
        Self::field("term", text)
    }

    pub fn has_term(&self) -> bool {
        self.0.contains_key("term")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FilterOperation {
    And,
    Or,
}

/// A block of predicates, OR'd unless `operation` is `AND`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<FilterOperation>,
    pub predicates: Vec<Predicate>,
}

impl Filter {
    pub fn new(predicates: Vec<Predicate>) -> Self {
        Self {
            operation: None,
            predicates,
        }
    }

    pub fn and(predicates: Vec<Predicate>) -> Self {
        Self {
            operation: Some(FilterOperation::And),
            predicates,
        }
    }

    pub fn is_and(&self) -> bool {
        self.operation == Some(FilterOperation::And)
    }
}

/// Structured query against one entity type. Filters are AND'd together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    pub target_entity: EntityType,
    #[serde(default)]
    pub filters: Vec<Filter>,
}

impl Query {
    pub fn new(target_entity: EntityType, filters: Vec<Filter>) -> Self {
        Self {
            target_entity,
            filters,
        }
    }

    /// Free text query.
    pub fn term(target_entity: EntityType, text: &str) -> Self {
        Self::new(target_entity, vec![Filter::new(vec![Predicate::term(text)])])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

/// Which search API a request goes to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchApi {
    #[serde(rename = "type")]
    pub api_type: BackendType,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubSearchOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortDirection>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub agg_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agg_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_entity: Option<EntityType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<SearchApi>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_options: Option<HubRequestOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultLinks {
    #[serde(rename = "self")]
    pub self_url: String,
    pub site_relative: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// Normalized search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubSearchResult {
    pub access: String,
    pub id: String,
    #[serde(rename = "type")]
    pub result_type: String,
    pub name: String,
    pub owner: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub type_keywords: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub created_date: DateTime<Utc>,
    pub created_date_source: String,
    pub updated_date: DateTime<Utc>,
    pub updated_date_source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<HubFamily>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub links: SearchResultLinks,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationValue {
    pub value: String,
    pub count: u64,
}

/// Facet counts for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    pub mode: String,
    pub field: String,
    pub values: Vec<AggregationValue>,
}

impl Aggregation {
    pub fn terms(field: impl Into<String>, values: Vec<AggregationValue>) -> Self {
        Self {
            mode: "terms".to_string(),
            field: field.into(),
            values,
        }
    }
}

/// Diagnostic attached to a response instead of an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchMessage {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Cursor for the next page: the same query with only the position moved.
#[derive(Debug, Clone, PartialEq)]
pub struct NextPage {
    pub query: Query,
    pub options: HubSearchOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HubSearchResponse {
    pub total: u64,
    pub results: Vec<HubSearchResult>,
    pub has_next: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aggregations: Vec<Aggregation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<SearchMessage>,
    #[serde(skip)]
    pub(crate) next_page: Option<NextPage>,
}

impl HubSearchResponse {
    /// Well-formed response with no results.
    pub fn empty() -> Self {
        Self {
            total: 0,
            results: Vec::new(),
            has_next: false,
            aggregations: Vec::new(),
            messages: Vec::new(),
            next_page: None,
        }
    }

    pub fn next_page(&self) -> Option<&NextPage> {
        self.next_page.as_ref()
    }

    /// Fetch the next page, or `None` when there is nothing further.
    pub async fn next(&self) -> Result<Option<HubSearchResponse>> {
        match &self.next_page {
            Some(page) if self.has_next => {
                super::hub_search(&page.query, &page.options).await.map(Some)
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_json_shape() {
        let query: Query = serde_json::from_value(json!({
            "targetEntity": "item",
            "filters": [{"operation": "AND", "predicates": [{"type": "Web Map", "owner": "casey"}]}]
        }))
        .unwrap();
        assert_eq!(query.target_entity, EntityType::Item);
        assert!(query.filters[0].is_and());
        let keys: Vec<&String> = query.filters[0].predicates[0].0.keys().collect();
        assert_eq!(keys, ["type", "owner"]);
    }

    #[test]
    fn test_term_query() {
        let query = Query::term(EntityType::Group, "water");
        assert!(query.filters[0].predicates[0].has_term());
        assert_eq!(query.filters[0].operation, None);
    }

    #[tokio::test]
    async fn test_empty_response_has_no_next() {
        let response = HubSearchResponse::empty();
        assert!(!response.has_next);
        assert!(response.next().await.unwrap().is_none());
    }
}

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{BackendType, SearchBackend};
use crate::context::PortalUser;
use crate::error::{Error, Result};
use crate::portal::{PortalClient, PortalGroup, PortalItem, PortalSearchResponse};
use crate::search::filter::{get_filter_query_param, get_q_predicate};
use crate::search::results::{group_to_search_result, item_to_search_result, user_to_search_result};
use crate::search::types::{
    Aggregation, AggregationValue, EntityType, HubSearchOptions, HubSearchResponse,
    HubSearchResult, NextPage, Query,
};

const DEFAULT_AGG_LIMIT: u32 = 10;

/// Portal sharing API search for items, groups and users.
pub struct PortalSearch;

/// Combine the free text term and the boolean filter into Portal's `q`.
pub fn portal_q(query: &Query) -> Result<Option<String>> {
    let term = get_q_predicate(query)?;
    let filter = get_filter_query_param(query);
    Ok(match (term, filter) {
        (Some(term), Some(filter)) => Some(format!("{} AND {}", term, filter)),
        (Some(term), None) => Some(term),
        (None, Some(filter)) => Some(filter),
        (None, None) => None,
    })
}

/// Query string parameters for a Portal search request.
pub fn portal_search_params(
    query: &Query,
    options: &HubSearchOptions,
) -> Result<Vec<(&'static str, String)>> {
    let mut params = Vec::new();
    if let Some(q) = portal_q(query)? {
        params.push(("q", q));
    }
    if let Some(num) = options.num {
        params.push(("num", num.to_string()));
    }
    if let Some(start) = options.start {
        params.push(("start", start.to_string()));
    }
    if let Some(field) = &options.sort_field {
        params.push(("sortField", field.clone()));
    }
    if let Some(order) = options.sort_order {
        params.push(("sortOrder", order.to_string()));
    }
    if !options.agg_fields.is_empty() {
        params.push(("countFields", options.agg_fields.join(",")));
        params.push((
            "countSize",
            options.agg_limit.unwrap_or(DEFAULT_AGG_LIMIT).to_string(),
        ));
    }
    Ok(params)
}

/// `aggregations.counts[]` → terms aggregations.
fn convert_aggregations(aggregations: Option<&Value>) -> Vec<Aggregation> {
    let Some(counts) = aggregations
        .and_then(|a| a.get("counts"))
        .and_then(|c| c.as_array())
    else {
        return Vec::new();
    };
    counts
        .iter()
        .filter_map(|entry| {
            let field = entry.get("fieldName")?.as_str()?;
            let values = entry
                .get("fieldValues")?
                .as_array()?
                .iter()
                .filter_map(|v| {
                    Some(AggregationValue {
                        value: match v.get("value")? {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        },
                        count: v.get("count")?.as_u64()?,
                    })
                })
                .collect();
            Some(Aggregation::terms(field, values))
        })
        .collect()
}

fn convert_results<T: serde::de::DeserializeOwned>(
    results: Vec<Value>,
    convert: impl Fn(&T) -> HubSearchResult,
) -> Result<Vec<HubSearchResult>> {
    results
        .into_iter()
        .map(|r| serde_json::from_value::<T>(r).map(|t| convert(&t)).map_err(Error::from))
        .collect()
}

#[async_trait]
impl SearchBackend for PortalSearch {
    fn backend_type(&self) -> BackendType {
        BackendType::ArcgisPortal
    }

    fn supports(&self, entity: EntityType) -> bool {
        matches!(entity, EntityType::Item | EntityType::Group | EntityType::User)
    }

    async fn search(&self, query: &Query, options: &HubSearchOptions) -> Result<HubSearchResponse> {
        let request_options = options.request_options.as_ref().ok_or_else(|| {
            Error::hub("hubSearch", "requestOptions: IHubRequestOptions is required.")
        })?;
        let params = portal_search_params(query, options)?;
        let client = PortalClient::from_request_options(request_options)?;
        debug!(entity = %query.target_entity, portal = client.portal(), "portal search");

        let response: PortalSearchResponse = match query.target_entity {
            EntityType::Item => client.search_items(&params).await?,
            EntityType::Group => client.search_groups(&params).await?,
            EntityType::User => client.search_users(&params).await?,
            other => return Err(super::not_implemented(other, self.backend_type())),
        };

        let results = match query.target_entity {
            EntityType::Group => convert_results::<PortalGroup>(response.results, |g| {
                group_to_search_result(g, request_options)
            })?,
            EntityType::User => convert_results::<PortalUser>(response.results, |u| {
                user_to_search_result(u, request_options)
            })?,
            _ => convert_results::<PortalItem>(response.results, |i| {
                item_to_search_result(i, request_options)
            })?,
        };

        let has_next = response.next_start > -1;
        let next_page = has_next.then(|| NextPage {
            query: query.clone(),
            options: HubSearchOptions {
                start: Some(response.next_start as u32),
                ..options.clone()
            },
        });

        Ok(HubSearchResponse {
            total: response.total,
            results,
            has_next,
            aggregations: convert_aggregations(response.aggregations.as_ref()),
            messages: Vec::new(),
            next_page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::types::SortDirection;
    use serde_json::json;

    #[test]
    fn test_portal_q_combines_term_and_filters() {
        let query: Query = serde_json::from_value(json!({
            "targetEntity": "item",
            "filters": [
                {"predicates": [{"term": "water"}]},
                {"predicates": [{"type": "Web Map"}]}
            ]
        }))
        .unwrap();
        assert_eq!(portal_q(&query).unwrap().as_deref(), Some("water AND ((type='Web Map'))"));
    }

    #[test]
    fn test_params() {
        let query = Query::term(EntityType::Item, "parks");
        let options = HubSearchOptions {
            num: Some(5),
            start: Some(11),
            sort_field: Some("title".to_string()),
            sort_order: Some(SortDirection::Asc),
            agg_fields: vec!["type".to_string(), "tags".to_string()],
            ..Default::default()
        };
        let params = portal_search_params(&query, &options).unwrap();
        assert_eq!(
            params,
            vec![
                ("q", "parks".to_string()),
                ("num", "5".to_string()),
                ("start", "11".to_string()),
                ("sortField", "title".to_string()),
                ("sortOrder", "asc".to_string()),
                ("countFields", "type,tags".to_string()),
                ("countSize", "10".to_string()),
            ]
        );
    }

    #[test]
    fn test_convert_aggregations() {
        let aggs = json!({"counts": [
            {"fieldName": "type", "fieldValues": [{"value": "Web Map", "count": 3}]}
        ]});
        let converted = convert_aggregations(Some(&aggs));
        assert_eq!(converted.len(), 1);
        assert_eq!(converted[0].mode, "terms");
        assert_eq!(converted[0].field, "type");
        assert_eq!(converted[0].values[0].count, 3);
    }

    #[tokio::test]
    async fn test_requires_request_options() {
        let err = PortalSearch
            .search(&Query::term(EntityType::Item, "x"), &HubSearchOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.operation(), Some("hubSearch"));
        assert_eq!(err.to_string(), "requestOptions: IHubRequestOptions is required.");
    }
}

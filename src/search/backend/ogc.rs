use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{BackendType, SearchBackend};
use crate::error::Result;
use crate::portal::{HubRequestOptions, PortalClient, PortalItem};
use crate::search::filter::{get_filter_query_param, get_q_predicate, get_sort_by_query_param};
use crate::search::results::item_to_search_result;
use crate::search::types::{
    Aggregation, AggregationValue, EntityType, HubSearchOptions, HubSearchResponse, NextPage,
    Query,
};

/// Hub Search OGC API (`{url}/items`), items only.
pub struct OgcSearch {
    url: String,
}

impl OgcSearch {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Query parameters for `GET {url}/items`, in request order.
pub fn ogc_item_query_params(
    query: &Query,
    options: &HubSearchOptions,
) -> Result<Vec<(&'static str, String)>> {
    let mut params = Vec::new();
    if let Some(filter) = get_filter_query_param(query) {
        params.push(("filter", filter));
    }
    if let Some(token) = options.request_options.as_ref().and_then(|r| r.token.clone()) {
        params.push(("token", token));
    }
    if let Some(limit) = options.num {
        params.push(("limit", limit.to_string()));
    }
    if let Some(start) = options.start {
        params.push(("startindex", start.to_string()));
    }
    if let Some(q) = get_q_predicate(query)? {
        params.push(("q", q));
    }
    if let Some(sort_by) = get_sort_by_query_param(options) {
        params.push(("sortBy", sort_by));
    }
    Ok(params)
}

/// `startindex` of the `next` link, if the collection has one.
fn next_start_index(body: &Value) -> Option<u32> {
    let links = body.get("links")?.as_array()?;
    let href = links
        .iter()
        .find(|l| l.get("rel").and_then(Value::as_str) == Some("next"))?
        .get("href")?
        .as_str()?;
    let (_, query) = href.split_once('?')?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "startindex")
        .and_then(|(_, value)| value.parse().ok())
}

/// `aggregations.terms[{field, aggregations: [{label, value}]}]` → terms aggregations.
fn convert_aggregations(body: &Value) -> Vec<Aggregation> {
    let Some(terms) = body
        .pointer("/aggregations/terms")
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };
    terms
        .iter()
        .filter_map(|entry| {
            let field = entry.get("field")?.as_str()?;
            let values = entry
                .get("aggregations")?
                .as_array()?
                .iter()
                .filter_map(|bucket| {
                    Some(AggregationValue {
                        value: bucket.get("label")?.as_str()?.to_string(),
                        count: bucket.get("value")?.as_u64()?,
                    })
                })
                .collect();
            Some(Aggregation::terms(field, values))
        })
        .collect()
}

impl OgcSearch {
    async fn fetch_items(&self, client: &PortalClient, params: &[(&str, String)]) -> Result<Value> {
        client.get_url(&format!("{}/items", self.url), params).await
    }

    async fn fetch_aggregations(
        &self,
        client: &PortalClient,
        options: &HubSearchOptions,
    ) -> Result<Vec<Aggregation>> {
        if options.agg_fields.is_empty() {
            return Ok(Vec::new());
        }
        let mut params = vec![(
            "aggregations",
            format!("terms(fields=({}))", options.agg_fields.join(",")),
        )];
        if let Some(token) = client.token() {
            params.push(("token", token.to_string()));
        }
        let body = client
            .get_url(&format!("{}/aggregations", self.url), &params)
            .await?;
        Ok(convert_aggregations(&body))
    }
}

#[async_trait]
impl SearchBackend for OgcSearch {
    fn backend_type(&self) -> BackendType {
        BackendType::ArcgisHub
    }

    fn supports(&self, entity: EntityType) -> bool {
        entity == EntityType::Item
    }

    async fn search(&self, query: &Query, options: &HubSearchOptions) -> Result<HubSearchResponse> {
        let params = ogc_item_query_params(query, options)?;
        let request_options = options.request_options.clone().unwrap_or_default();
        let client = PortalClient::builder()
            .token(request_options.token.clone())
            .build()?;
        debug!(url = %self.url, "ogc item search");

        let (body, aggregations) = futures::future::try_join(
            self.fetch_items(&client, &params),
            self.fetch_aggregations(&client, options),
        )
        .await?;

        let link_options = result_options(&request_options);
        let results = body
            .get("features")
            .and_then(Value::as_array)
            .map(|features| features.as_slice())
            .unwrap_or_default()
            .iter()
            .map(|feature| -> Result<_> {
                let properties = feature.get("properties").cloned().unwrap_or(Value::Null);
                let item: PortalItem = serde_json::from_value(properties)?;
                Ok(item_to_search_result(&item, &link_options))
            })
            .collect::<Result<Vec<_>>>()?;

        let total = body.get("numberMatched").and_then(Value::as_u64).unwrap_or(0);
        let next_start = next_start_index(&body);
        let next_page = next_start.map(|start| NextPage {
            query: query.clone(),
            options: HubSearchOptions {
                start: Some(start),
                ..options.clone()
            },
        });

        Ok(HubSearchResponse {
            total,
            results,
            has_next: next_page.is_some(),
            aggregations,
            messages: Vec::new(),
            next_page,
        })
    }
}

/// Links on OGC hits are built against the caller's portal, or ArcGIS Online.
fn result_options(request_options: &HubRequestOptions) -> HubRequestOptions {
    if request_options.portal.is_empty() {
        HubRequestOptions {
            portal: "https://www.arcgis.com/sharing/rest".to_string(),
            ..request_options.clone()
        }
    } else {
        request_options.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::types::SortDirection;
    use serde_json::json;

    #[test]
    fn test_item_query_params_order() {
        let query: Query = serde_json::from_value(json!({
            "targetEntity": "item",
            "filters": [
                {"predicates": [{"term": "water"}]},
                {"predicates": [{"type": "typeA"}]}
            ]
        }))
        .unwrap();
        let options = HubSearchOptions {
            num: Some(10),
            start: Some(21),
            sort_field: Some("modified".to_string()),
            sort_order: Some(SortDirection::Desc),
            request_options: Some(HubRequestOptions {
                token: Some("tok".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let params = ogc_item_query_params(&query, &options).unwrap();
        let keys: Vec<&str> = params.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, ["filter", "token", "limit", "startindex", "q", "sortBy"]);
        assert_eq!(params[0].1, "((type=typeA))");
        assert_eq!(params[5].1, "-modified");
    }

    #[test]
    fn test_next_start_index() {
        let items = "https://hub.arcgis.com/api/search/v1/collections/all/items";
        let body = json!({"links": [
            {"rel": "self", "href": items},
            {"rel": "next", "href": format!("{}?limit=10&startindex=11", items)}
        ]});
        assert_eq!(next_start_index(&body), Some(11));
        assert_eq!(next_start_index(&json!({"links": []})), None);
    }

    #[test]
    fn test_convert_aggregations() {
        let body = json!({"aggregations": {"terms": [
            {"field": "type", "aggregations": [{"label": "Web Map", "value": 4}]}
        ]}});
        let aggs = convert_aggregations(&body);
        assert_eq!(aggs[0].field, "type");
        assert_eq!(aggs[0].values[0].value, "Web Map");
        assert_eq!(aggs[0].values[0].count, 4);
    }

    #[test]
    fn test_trims_url() {
        assert_eq!(
            OgcSearch::new("https://hub.arcgis.com/api/search/v1/collections/all/").url(),
            "https://hub.arcgis.com/api/search/v1/collections/all"
        );
    }

    #[test]
    fn test_rejects_users() {
        assert!(!OgcSearch::new("https://x").supports(EntityType::User));
    }
}

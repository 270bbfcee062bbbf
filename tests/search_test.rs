//! Catalog and backend search against mocked Portal and Hub Search APIs.
//!
//! Run with: cargo test --test search_test

use arcgis_hub::context::ArcGISContextOptions;
use arcgis_hub::search::{
    BackendType, Catalog, EntityType, HubSearchOptions, Query, SearchApi, hub_search,
};
use arcgis_hub::{ArcGISContext, Error};
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn context(server: &MockServer) -> ArcGISContext {
    ArcGISContext::new(ArcGISContextOptions {
        portal_url: Some(server.uri()),
        token: Some("tok".to_string()),
        ..Default::default()
    })
}

fn item(id: &str, title: &str, item_type: &str) -> Value {
    json!({
        "id": id,
        "owner": "casey",
        "title": title,
        "type": item_type,
        "typeKeywords": [],
        "tags": ["parks"],
        "access": "public",
        "created": 1_700_000_000_000_i64,
        "modified": 1_700_000_500_000_i64
    })
}

fn catalog(server: &MockServer) -> Catalog {
    Catalog::from_json(
        json!({
            "schemaVersion": 1,
            "title": "Parks",
            "scopes": {
                "item": {"targetEntity": "item", "filters": [{"predicates": [{"group": ["g1"]}]}]}
            },
            "collections": [{
                "key": "maps",
                "label": "Maps",
                "targetEntity": "item",
                "scope": {
                    "targetEntity": "item",
                    "filters": [{"predicates": [{"type": "Web Map"}]}]
                },
                "sortField": "modified",
                "sortDirection": "desc"
            }]
        }),
        context(server),
    )
    .unwrap()
}

#[tokio::test]
async fn catalog_item_search_applies_scope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sharing/rest/search"))
        .and(query_param("q", "water AND ((group IN (g1)))"))
        .and(query_param("token", "tok"))
        .and(query_param("f", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 1,
            "start": 1,
            "num": 10,
            "nextStart": -1,
            "results": [item("3ef0b5b1d7d94d1c9d6fb2c04b2b6f5e", "Water Mains", "Feature Service")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = catalog(&server)
        .search_items("water", HubSearchOptions::default())
        .await
        .unwrap();
    assert_eq!(response.total, 1);
    assert!(!response.has_next);
    let hit = &response.results[0];
    assert_eq!(hit.name, "Water Mains");
    assert_eq!(hit.created_date_source, "item.created");
    assert_eq!(
        hit.links.self_url,
        format!("{}/home/item.html?id=3ef0b5b1d7d94d1c9d6fb2c04b2b6f5e", server.uri())
    );
    assert!(response.next().await.unwrap().is_none());
}

#[tokio::test]
async fn collection_search_uses_definition_sort() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sharing/rest/search"))
        .and(query_param("q", "((type='Web Map')) AND ((group IN (g1)))"))
        .and(query_param("sortField", "modified"))
        .and(query_param("sortOrder", "desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 0,
            "start": 1,
            "num": 10,
            "nextStart": -1,
            "results": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let collection = catalog(&server).get_collection("maps").unwrap();
    let response = collection.search("", HubSearchOptions::default()).await.unwrap();
    assert_eq!(response.total, 0);
    assert!(response.results.is_empty());
}

#[tokio::test]
async fn search_collections_runs_every_collection() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sharing/rest/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 2,
            "start": 1,
            "num": 10,
            "nextStart": -1,
            "results": []
        })))
        .mount(&server)
        .await;

    let responses = catalog(&server)
        .search_collections("trees", HubSearchOptions::default())
        .await
        .unwrap();
    assert_eq!(responses.keys().collect::<Vec<_>>(), ["maps"]);
    assert_eq!(responses["maps"].total, 2);
}

fn two_scope_catalog(server: &MockServer) -> Catalog {
    Catalog::from_json(
        json!({
            "schemaVersion": 1,
            "title": "Parks",
            "scopes": {
                "item": {"targetEntity": "item", "filters": [{"predicates": [{"group": ["g1"]}]}]},
                "group": {
                    "targetEntity": "group",
                    "filters": [{"predicates": [{"owner": "casey"}]}]
                }
            },
            "collections": []
        }),
        context(server),
    )
    .unwrap()
}

fn empty_page(total: u64) -> Value {
    json!({
        "total": total,
        "start": 1,
        "num": 10,
        "nextStart": -1,
        "results": []
    })
}

#[tokio::test]
async fn search_scopes_returns_one_response_per_scope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sharing/rest/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(empty_page(4)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sharing/rest/community/groups"))
        .respond_with(ResponseTemplate::new(200).set_body_json(empty_page(7)))
        .expect(1)
        .mount(&server)
        .await;

    let responses = two_scope_catalog(&server)
        .search_scopes("parks", HubSearchOptions::default())
        .await
        .unwrap();
    assert_eq!(
        responses.keys().copied().collect::<Vec<_>>(),
        [EntityType::Item, EntityType::Group]
    );
    assert_eq!(responses[&EntityType::Item].total, 4);
    assert_eq!(responses[&EntityType::Group].total, 7);
}

#[tokio::test]
async fn search_scopes_fails_when_any_scope_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sharing/rest/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(empty_page(4)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sharing/rest/community/groups"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": {"code": 403, "message": "You do not have access to this resource."}
        })))
        .mount(&server)
        .await;

    let result = two_scope_catalog(&server)
        .search_scopes("parks", HubSearchOptions::default())
        .await;
    assert!(matches!(result, Err(Error::Portal { code: 403, .. })));
}

#[tokio::test]
async fn portal_pagination_follows_next_start() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sharing/rest/search"))
        .and(query_param("start", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 2,
            "start": 2,
            "num": 1,
            "nextStart": -1,
            "results": [item("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb", "Second", "Web Map")]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sharing/rest/search"))
        .and(query_param("num", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 2,
            "start": 1,
            "num": 1,
            "nextStart": 2,
            "results": [item("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "First", "Web Map")]
        })))
        .mount(&server)
        .await;

    let options = HubSearchOptions {
        num: Some(1),
        request_options: Some(context(&server).hub_request_options()),
        ..Default::default()
    };
    let first = hub_search(&Query::term(EntityType::Item, "parks"), &options)
        .await
        .unwrap();
    assert!(first.has_next);
    assert_eq!(first.results[0].name, "First");

    let second = first.next().await.unwrap().unwrap();
    assert_eq!(second.results[0].name, "Second");
    assert!(!second.has_next);
    assert_eq!(second.next_page(), None);
}

#[tokio::test]
async fn portal_error_body_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sharing/rest/community/groups"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": {
                "code": 403,
                "message": "You do not have permissions to access this resource."
            }
        })))
        .mount(&server)
        .await;

    let options = HubSearchOptions {
        request_options: Some(context(&server).hub_request_options()),
        ..Default::default()
    };
    let err = hub_search(&Query::term(EntityType::Group, "parks"), &options)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Portal { code: 403, .. }));
    assert_eq!(err.name(), "ArcGISRequestError");
}

#[tokio::test]
async fn ogc_search_reads_features_and_aggregations() {
    let server = MockServer::start().await;
    let collection_url = format!("{}/api/search/v1/collections/all", server.uri());
    Mock::given(method("GET"))
        .and(path("/api/search/v1/collections/all/items"))
        .and(query_param("q", "parks"))
        .and(query_param("limit", "1"))
        .and(query_param("sortBy", "-modified"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "FeatureCollection",
            "numberMatched": 12,
            "numberReturned": 1,
            "features": [{
                "type": "Feature",
                "id": "cccccccccccccccccccccccccccccccc",
                "properties": item(
                    "cccccccccccccccccccccccccccccccc",
                    "City Parks",
                    "Feature Service"
                )
            }],
            "links": [
                {"rel": "self", "href": format!("{}/items?limit=1", collection_url)},
                {"rel": "next", "href": format!("{}/items?limit=1&startindex=2", collection_url)}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/search/v1/collections/all/aggregations"))
        .and(query_param("aggregations", "terms(fields=(type))"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "aggregations": {"terms": [{
                "field": "type",
                "aggregations": [{"label": "Feature Service", "value": 12}]
            }]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let options = HubSearchOptions {
        num: Some(1),
        sort_field: Some("modified".to_string()),
        sort_order: Some(arcgis_hub::search::SortDirection::Desc),
        agg_fields: vec!["type".to_string()],
        api: Some(SearchApi {
            api_type: BackendType::ArcgisHub,
            url: collection_url.clone(),
        }),
        ..Default::default()
    };
    let response = hub_search(&Query::term(EntityType::Item, "parks"), &options)
        .await
        .unwrap();
    assert_eq!(response.total, 12);
    assert!(response.has_next);
    assert_eq!(response.results[0].name, "City Parks");
    assert_eq!(
        response.results[0].links.self_url,
        "https://www.arcgis.com/home/item.html?id=cccccccccccccccccccccccccccccccc"
    );
    assert_eq!(response.aggregations[0].field, "type");
    assert_eq!(response.aggregations[0].values[0].count, 12);
    assert_eq!(response.next_page().unwrap().options.start, Some(2));
}

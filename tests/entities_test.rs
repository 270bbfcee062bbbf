//! Entity fetch and lifecycle against a mocked Portal.
//!
//! Run with: cargo test --test entities_test

use std::sync::Arc;

use arcgis_hub::context::{ArcGISContextOptions, PortalUser};
use arcgis_hub::entities::{
    EntityInstance, EntityState, HubEntity, ProjectStatus, fetch_content, fetch_hub_group,
    fetch_model, fetch_project,
};
use arcgis_hub::portal::PortalClient;
use arcgis_hub::{ArcGISContext, Error, Permission, PolicyRegistry};
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROJECT_ID: &str = "0a1b2c3d4e5f60718293a4b5c6d7e8f9";

fn context(server: &MockServer) -> ArcGISContext {
    ArcGISContext::new(ArcGISContextOptions {
        portal_url: Some(server.uri()),
        token: Some("tok".to_string()),
        current_user: Some(PortalUser {
            username: "casey".to_string(),
            ..Default::default()
        }),
        ..Default::default()
    })
}

fn project_item() -> Value {
    json!({
        "id": PROJECT_ID,
        "owner": "casey",
        "title": "Bike Lanes",
        "type": "Hub Project",
        "typeKeywords": ["Hub Project", "slug|bike-lanes"],
        "tags": [],
        "access": "org",
        "created": 1_700_000_000_000_i64,
        "modified": 1_700_000_500_000_i64
    })
}

async fn mount_project_data(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("/sharing/rest/content/items/{}/data", PROJECT_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "inProgress",
            "settings": {"features": {"hub:project:workspace:details": false}}
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn fetch_project_by_slug() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sharing/rest/search"))
        .and(query_param("q", "typekeywords:\"slug|bike-lanes\""))
        .and(query_param("num", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 1,
            "start": 1,
            "num": 1,
            "nextStart": -1,
            "results": [project_item()]
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_project_data(&server).await;

    let project = fetch_project("bike-lanes", &context(&server))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(project.base.id, PROJECT_ID);
    assert_eq!(project.base.slug.as_deref(), Some("bike-lanes"));
    assert_eq!(project.status, ProjectStatus::InProgress);
    assert!(project.base.can_edit);
    assert!(project.base.can_delete);
    assert_eq!(project.base.links.site_relative, "/projects/bike-lanes");
}

#[tokio::test]
async fn fetch_project_unknown_slug_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sharing/rest/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 0,
            "start": 1,
            "num": 1,
            "nextStart": -1,
            "results": []
        })))
        .mount(&server)
        .await;

    let project = fetch_project("nowhere", &context(&server)).await.unwrap();
    assert!(project.is_none());
}

#[tokio::test]
async fn fetch_project_by_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/sharing/rest/content/items/{}", PROJECT_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(project_item()))
        .mount(&server)
        .await;
    mount_project_data(&server).await;

    let project = fetch_project(PROJECT_ID, &context(&server))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(project.base.name, "Bike Lanes");
}

#[tokio::test]
async fn fetch_model_without_data_gets_empty_object() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/sharing/rest/content/items/{}", PROJECT_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(project_item()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/sharing/rest/content/items/{}/data", PROJECT_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .expect(1)
        .mount(&server)
        .await;

    let client = PortalClient::builder()
        .portal(format!("{}/sharing/rest", server.uri()))
        .token(Some("tok".to_string()))
        .build()
        .unwrap();
    let model = fetch_model(&client, PROJECT_ID).await.unwrap();
    assert_eq!(model.item.title, "Bike Lanes");
    assert_eq!(model.data, json!({}));
}

#[tokio::test]
async fn fetch_missing_group_is_remapped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sharing/rest/community/groups/g404"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": {
                "code": 400,
                "messageCode": "COM_0003",
                "message": "Group does not exist or is inaccessible."
            }
        })))
        .mount(&server)
        .await;

    let err = fetch_hub_group("g404", &context(&server)).await.unwrap_err();
    assert_eq!(err.name(), "HubError");
    assert_eq!(err.operation(), Some("fetchHubGroup"));
    assert_eq!(err.to_string(), "Group not found.");
}

#[tokio::test]
async fn fetch_group_computes_rights() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sharing/rest/community/groups/g1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "g1",
            "title": "Editors",
            "owner": "jordan",
            "access": "org",
            "created": 1_700_000_000_000_i64,
            "modified": 1_700_000_000_000_i64,
            "isInvitationOnly": true,
            "userMembership": {"memberType": "admin"}
        })))
        .mount(&server)
        .await;

    let group = fetch_hub_group("g1", &context(&server)).await.unwrap();
    assert_eq!(group.base.name, "Editors");
    assert!(group.is_invitation_only);
    assert!(group.base.can_edit);
}

#[tokio::test]
async fn fetch_content_by_record_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sharing/rest/content/items/4fa1a2a3a4a5a6a7a8a9aaabacadaeaf"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "4fa1a2a3a4a5a6a7a8a9aaabacadaeaf",
            "owner": "casey",
            "title": "Hydrants",
            "type": "Feature Service",
            "url": "https://services.arcgis.com/x/arcgis/rest/services/Hydrants/FeatureServer/0",
            "access": "public",
            "created": 1_700_000_000_000_i64,
            "modified": 1_700_000_000_000_i64
        })))
        .mount(&server)
        .await;

    let content = fetch_content("4fa1a2a3a4a5a6a7a8a9aaabacadaeaf_0", &context(&server))
        .await
        .unwrap();
    assert_eq!(content.name, "Hydrants");
    assert_eq!(content.hub_id.as_deref(), Some("4fa1a2a3a4a5a6a7a8a9aaabacadaeaf_0"));
}

#[tokio::test]
async fn delete_destroys_instance() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!(
            "/sharing/rest/content/users/casey/items/{}/delete",
            PROJECT_ID
        )))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "itemId": PROJECT_ID})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let entity: HubEntity = serde_json::from_value(json!({
        "entityType": "project",
        "id": PROJECT_ID,
        "name": "Bike Lanes",
        "owner": "casey",
        "type": "Hub Project",
        "access": "org",
        "createdDate": "2024-01-01T00:00:00Z",
        "createdDateSource": "item.created",
        "updatedDate": "2024-01-01T00:00:00Z",
        "updatedDateSource": "item.modified"
    }))
    .unwrap();
    let mut instance = EntityInstance::new(
        entity,
        Arc::new(PolicyRegistry::hub_default()),
        context(&server),
    );
    instance.delete().await.unwrap();
    assert_eq!(instance.state(), EntityState::Destroyed);
    assert!(matches!(instance.to_json(), Err(Error::Destroyed)));
    assert!(matches!(
        instance.check_permission(&Permission::from("hub:project:view")),
        Err(Error::Destroyed)
    ));
    assert!(matches!(instance.delete().await, Err(Error::Destroyed)));
}

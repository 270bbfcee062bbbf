use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use tracing::debug;

use super::collection::Collection;
use super::types::{
    EntityType, HubSearchOptions, HubSearchResponse, Query, SearchMessage, SortDirection,
};
use super::upgrade::upgrade_catalog_schema;
use crate::context::ArcGISContext;
use crate::error::{Error, Result};

/// Named, scoped query inside a catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionDefinition {
    pub key: String,
    pub label: String,
    pub target_entity: EntityType,
    pub scope: Query,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_direction: Option<SortDirection>,
}

/// Catalog document: per-entity scopes plus named collections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubCatalog {
    pub schema_version: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub scopes: BTreeMap<EntityType, Query>,
    #[serde(default)]
    pub collections: Vec<CollectionDefinition>,
}

/// Either free text or a structured query.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogQuery {
    Term(String),
    Structured(Query),
}

impl CatalogQuery {
    /// Resolve to a structured query against `target`. Structured queries
    /// are retargeted.
    pub fn into_query(self, target: EntityType) -> Query {
        match self {
            CatalogQuery::Term(text) => Query::term(target, &text),
            CatalogQuery::Structured(mut query) => {
                query.target_entity = target;
                query
            }
        }
    }
}

impl From<&str> for CatalogQuery {
    fn from(text: &str) -> Self {
        CatalogQuery::Term(text.to_string())
    }
}

impl From<String> for CatalogQuery {
    fn from(text: String) -> Self {
        CatalogQuery::Term(text)
    }
}

impl From<Query> for CatalogQuery {
    fn from(query: Query) -> Self {
        CatalogQuery::Structured(query)
    }
}

/// Scope-aware search over a catalog document.
#[derive(Debug, Clone)]
pub struct Catalog {
    catalog: HubCatalog,
    context: ArcGISContext,
}

impl Catalog {
    /// Build from a catalog document, upgrading legacy schemas.
    pub fn from_json(json: Value, context: ArcGISContext) -> Result<Self> {
        Ok(Self {
            catalog: upgrade_catalog_schema(json)?,
            context,
        })
    }

    pub fn new(catalog: HubCatalog, context: ArcGISContext) -> Self {
        Self { catalog, context }
    }

    /// Copy of the backing document.
    pub fn to_json(&self) -> HubCatalog {
        self.catalog.clone()
    }

    pub fn schema_version(&self) -> u32 {
        self.catalog.schema_version
    }

    pub fn title(&self) -> &str {
        &self.catalog.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.catalog.title = title.into();
    }

    pub fn scopes(&self) -> &BTreeMap<EntityType, Query> {
        &self.catalog.scopes
    }

    pub fn available_scopes(&self) -> Vec<EntityType> {
        self.catalog.scopes.keys().copied().collect()
    }

    pub fn get_scope(&self, entity: EntityType) -> Option<&Query> {
        self.catalog.scopes.get(&entity)
    }

    pub fn set_scope(&mut self, entity: EntityType, query: Query) {
        self.catalog.scopes.insert(entity, query);
    }

    pub fn collections(&self) -> &[CollectionDefinition] {
        &self.catalog.collections
    }

    pub fn collection_names(&self) -> Vec<String> {
        self.catalog.collections.iter().map(|c| c.key.clone()).collect()
    }

    pub fn context(&self) -> &ArcGISContext {
        &self.context
    }

    /// Collection by key, with the catalog scope for its entity appended to
    /// its own scope filters.
    pub fn get_collection(&self, name: &str) -> Result<Collection> {
        let mut definition = self
            .catalog
            .collections
            .iter()
            .find(|c| c.key == name)
            .cloned()
            .ok_or_else(|| {
                Error::hub(
                    "getCollection",
                    format!("Collection \"{}\" is not present in the Catalog", name),
                )
            })?;
        if let Some(scope) = self.get_scope(definition.scope.target_entity) {
            definition.scope.filters.extend(scope.filters.iter().cloned());
        }
        Ok(Collection::new(definition, self.context.clone()))
    }

    pub async fn search_items(
        &self,
        query: impl Into<CatalogQuery>,
        options: HubSearchOptions,
    ) -> Result<HubSearchResponse> {
        self.search_entity(EntityType::Item, "items", query.into(), options).await
    }

    pub async fn search_groups(
        &self,
        query: impl Into<CatalogQuery>,
        options: HubSearchOptions,
    ) -> Result<HubSearchResponse> {
        self.search_entity(EntityType::Group, "groups", query.into(), options).await
    }

    pub async fn search_users(
        &self,
        query: impl Into<CatalogQuery>,
        options: HubSearchOptions,
    ) -> Result<HubSearchResponse> {
        self.search_entity(EntityType::User, "user", query.into(), options).await
    }

    /// Run a term search against every collection concurrently.
    pub async fn search_collections(
        &self,
        term: &str,
        options: HubSearchOptions,
    ) -> Result<BTreeMap<String, HubSearchResponse>> {
        let collections = self
            .collection_names()
            .iter()
            .map(|name| self.get_collection(name))
            .collect::<Result<Vec<_>>>()?;
        let searches = collections.iter().map(|collection| {
            let query = Query::term(collection.target_entity(), term);
            collection.search(query, options.clone())
        });
        let responses = try_join_all(searches).await?;
        Ok(self.collection_names().into_iter().zip(responses).collect())
    }

    /// Run a term search against every scope concurrently.
    pub async fn search_scopes(
        &self,
        term: &str,
        options: HubSearchOptions,
    ) -> Result<BTreeMap<EntityType, HubSearchResponse>> {
        let scopes = self.available_scopes();
        let searches = scopes.iter().map(|entity| {
            let options = HubSearchOptions {
                target_entity: Some(*entity),
                ..options.clone()
            };
            self.search(Query::term(*entity, term), options)
        });
        let responses = try_join_all(searches).await?;
        Ok(scopes.into_iter().zip(responses).collect())
    }

    async fn search_entity(
        &self,
        entity: EntityType,
        label: &str,
        query: CatalogQuery,
        options: HubSearchOptions,
    ) -> Result<HubSearchResponse> {
        if self.get_scope(entity).is_none() {
            debug!(%entity, "catalog has no scope");
            let mut response = HubSearchResponse::empty();
            response.messages.push(SearchMessage {
                code: "missingScope".to_string(),
                message: format!("Catalog does not have a scope for {}", label),
                data: Some(json!({"scope": entity})),
            });
            return Ok(response);
        }
        let options = HubSearchOptions {
            target_entity: Some(entity),
            ..options
        };
        self.search(query.into_query(entity), options).await
    }

    /// Append the catalog scope filters and search with the catalog's context.
    async fn search(
        &self,
        mut query: Query,
        options: HubSearchOptions,
    ) -> Result<HubSearchResponse> {
        if let Some(scope) = self.get_scope(query.target_entity) {
            query.filters.extend(scope.filters.iter().cloned());
        }
        let options = HubSearchOptions {
            request_options: Some(self.context.hub_request_options()),
            ..options
        };
        super::hub_search(&query, &options).await
    }
}

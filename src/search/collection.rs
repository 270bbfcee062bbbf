use serde_json::Value;

use super::catalog::{CatalogQuery, CollectionDefinition};
use super::types::{EntityType, HubSearchOptions, HubSearchResponse, Query};
use crate::context::ArcGISContext;
use crate::error::Result;

/// A named, scoped slice of a catalog.
#[derive(Debug, Clone)]
pub struct Collection {
    definition: CollectionDefinition,
    context: ArcGISContext,
}

impl Collection {
    pub fn new(definition: CollectionDefinition, context: ArcGISContext) -> Self {
        Self {
            definition,
            context,
        }
    }

    pub fn from_json(json: Value, context: ArcGISContext) -> Result<Self> {
        Ok(Self::new(serde_json::from_value(json)?, context))
    }

    pub fn to_json(&self) -> CollectionDefinition {
        self.definition.clone()
    }

    pub fn key(&self) -> &str {
        &self.definition.key
    }

    /// Alias for [`Collection::key`].
    pub fn name(&self) -> &str {
        self.key()
    }

    pub fn label(&self) -> &str {
        &self.definition.label
    }

    pub fn target_entity(&self) -> EntityType {
        self.definition.target_entity
    }

    pub fn scope(&self) -> &Query {
        &self.definition.scope
    }

    /// Search within the collection.
    ///
    /// The collection's scope filters are appended to the query's own filters.
    /// Sort and include defaults from the definition apply when the caller
    /// gives none, and the request always carries this collection's context.
    pub async fn search(
        &self,
        query: impl Into<CatalogQuery>,
        options: HubSearchOptions,
    ) -> Result<HubSearchResponse> {
        let mut query = query.into().into_query(self.target_entity());
        query
            .filters
            .extend(self.definition.scope.filters.iter().cloned());

        let mut options = options;
        if options.sort_field.is_none() {
            options.sort_field = self.definition.sort_field.clone();
            options.sort_order = options.sort_order.or(self.definition.sort_direction);
        }
        if options.include.is_empty() {
            options.include = self.definition.include.clone();
        }
        options.target_entity = Some(self.target_entity());
        options.request_options = Some(self.context.hub_request_options());

        super::hub_search(&query, &options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_accessors() {
        let collection = Collection::from_json(
            json!({
                "key": "docs",
                "label": "Documents",
                "targetEntity": "item",
                "scope": {"targetEntity": "item", "filters": [{"predicates": [{"type": "PDF"}]}]},
                "sortField": "modified",
                "sortDirection": "desc"
            }),
            ArcGISContext::default(),
        )
        .unwrap();
        assert_eq!(collection.name(), "docs");
        assert_eq!(collection.label(), "Documents");
        assert_eq!(collection.target_entity(), EntityType::Item);
        assert_eq!(collection.scope().filters.len(), 1);
        let json = serde_json::to_value(collection.to_json()).unwrap();
        assert_eq!(json["sortDirection"], "desc");
        assert!(json.get("include").is_none());
    }

    #[test]
    fn test_from_json_rejects_missing_scope() {
        let err = Collection::from_json(json!({"key": "x"}), ArcGISContext::default()).unwrap_err();
        assert_eq!(err.name(), "JsonError");
    }
}

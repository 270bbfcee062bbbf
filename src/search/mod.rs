//! Catalog/collection query composition and search dispatch.
//!
//! A [`Query`] targets one entity type and is a list of AND'd [`Filter`]s.
//! [`Catalog`] and [`Collection`] add their scope filters before the query is
//! handed to [`hub_search`], which picks a backend from `options.api`.

pub mod backend;
mod catalog;
mod collection;
pub mod filter;
pub mod results;
mod types;
mod upgrade;

use tracing::debug;

pub use backend::{BackendType, OgcSearch, PortalSearch, SearchBackend, create_backend};
pub use catalog::{Catalog, CatalogQuery, CollectionDefinition, HubCatalog};
pub use collection::Collection;
pub use types::{
    Aggregation, AggregationValue, EntityType, Filter, FilterOperation, HubSearchOptions,
    HubSearchResponse, HubSearchResult, NextPage, Predicate, Query, SearchApi, SearchMessage,
    SearchResultLinks, SortDirection,
};
pub use upgrade::upgrade_catalog_schema;

use crate::error::Result;

/// Run one page of a query against the backend selected by `options`.
pub async fn hub_search(query: &Query, options: &HubSearchOptions) -> Result<HubSearchResponse> {
    let backend = create_backend(options);
    if !backend.supports(query.target_entity) {
        return Err(backend::not_implemented(
            query.target_entity,
            backend.backend_type(),
        ));
    }
    debug!(
        entity = %query.target_entity,
        backend = %backend.backend_type(),
        filters = query.filters.len(),
        "hub search"
    );
    backend.search(query, options).await
}

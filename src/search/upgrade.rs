use serde_json::{Value, json};

use super::types::{EntityType, Filter, Predicate, Query};
use crate::error::Result;

use super::catalog::HubCatalog;

pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Bring a catalog document to the current schema.
///
/// Documents without a `schemaVersion` are legacy site catalogs of the form
/// `{groups: "id" | ["id", ...]}`; their groups become the item scope.
pub fn upgrade_catalog_schema(json: Value) -> Result<HubCatalog> {
    let version = json.get("schemaVersion").and_then(Value::as_u64).unwrap_or(0);
    if version >= u64::from(CURRENT_SCHEMA_VERSION) {
        return Ok(serde_json::from_value(json)?);
    }

    let groups: Vec<Value> = match json.get("groups") {
        Some(Value::String(id)) => vec![json!(id)],
        Some(Value::Array(ids)) => ids.clone(),
        _ => Vec::new(),
    };
    let mut item_scope = Query::new(EntityType::Item, Vec::new());
    if !groups.is_empty() {
        item_scope
            .filters
            .push(Filter::new(vec![Predicate::field("group", groups)]));
    }

    let mut catalog = HubCatalog {
        schema_version: CURRENT_SCHEMA_VERSION,
        title: "Default Catalog".to_string(),
        ..Default::default()
    };
    catalog.scopes.insert(EntityType::Item, item_scope);
    Ok(catalog)
}

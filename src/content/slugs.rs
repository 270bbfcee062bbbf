//! Hub API slugs: `{orgKey}::{title-as-slug}` or a bare `{title-as-slug}`.

use crate::util::is_guid;

const SLUG_KEYWORD_PREFIX: &str = "slug|";

/// Slug stored on an item as a `slug|<slug>` type keyword.
pub fn get_item_slug(type_keywords: &[String]) -> Option<&str> {
    type_keywords
        .iter()
        .find_map(|kw| kw.strip_prefix(SLUG_KEYWORD_PREFIX))
        .filter(|slug| !slug.is_empty())
}

/// Type keyword that stores a slug on an item.
pub fn slug_keyword(slug: &str) -> String {
    format!("{}{}", SLUG_KEYWORD_PREFIX, slug)
}

/// Item id and optional layer id of a Hub API record id
/// (`{itemId}_{layerId}` or `{itemId}`).
pub fn parse_dataset_id(dataset_id: &str) -> (&str, Option<&str>) {
    match dataset_id.split_once('_') {
        Some((item_id, layer_id)) => (item_id, Some(layer_id)),
        None => (dataset_id, None),
    }
}

/// True when an identifier is a slug rather than an item or record id.
pub fn is_slug(identifier: &str) -> bool {
    let (item_id, _) = parse_dataset_id(identifier);
    !item_id.is_empty() && !is_guid(item_id)
}

/// Prefix a slug with `context::` unless it already carries one.
pub fn add_context_to_slug(slug: &str, context: &str) -> String {
    match slug.split_once("::") {
        Some((prefix, rest)) if !prefix.is_empty() && !rest.is_empty() => slug.to_string(),
        _ => format!("{}::{}", context, slug),
    }
}

/// Strip `context::` from a slug. Slugs in another namespace are unchanged.
pub fn remove_context_from_slug<'a>(slug: &'a str, context: &str) -> &'a str {
    if context.is_empty() {
        return slug;
    }
    let prefix = format!("{}::", context);
    match slug.find(&prefix) {
        Some(at) => &slug[at + prefix.len()..],
        None => slug,
    }
}

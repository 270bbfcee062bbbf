//! Serialization of structured queries into the boolean filter syntax shared
//! by Portal search and the OGC items API.

use serde_json::Value;

use super::types::{Filter, HubSearchOptions, Predicate, Query, SortDirection};
use crate::error::{Error, Result};

/// Format a scalar, quoting strings that contain a space.
fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) if s.contains(' ') => format!("'{}'", s),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn format_list(values: &[Value]) -> String {
    values
        .iter()
        .map(format_value)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Clauses for one field, in `any`, `all`, `not` order for match options.
fn field_clauses(field: &str, value: &Value) -> Vec<String> {
    match value {
        Value::Array(values) if values.is_empty() => Vec::new(),
        Value::Array(values) => vec![format!("{} IN ({})", field, format_list(values))],
        Value::Object(options) => {
            let mut clauses = Vec::new();
            let from = options.get("from").filter(|v| !v.is_null());
            let to = options.get("to").filter(|v| !v.is_null());
            if options.contains_key("from") || options.contains_key("to") {
                match (from, to) {
                    (Some(from), Some(to)) => clauses.push(format!(
                        "{} BETWEEN {} AND {}",
                        field,
                        format_value(from),
                        format_value(to)
                    )),
                    (Some(from), None) => {
                        clauses.push(format!("{}>={}", field, format_value(from)))
                    }
                    (None, Some(to)) => clauses.push(format!("{}<={}", field, format_value(to))),
                    (None, None) => {}
                }
                return clauses;
            }
            match options.get("any") {
                Some(Value::Array(values)) if values.is_empty() => {}
                Some(Value::Array(values)) => {
                    clauses.push(format!("{} IN ({})", field, format_list(values)))
                }
                Some(v) => clauses.push(format!("{}={}", field, format_value(v))),
                None => {}
            }
            match options.get("all") {
                Some(Value::Array(values)) => {
                    clauses.extend(values.iter().map(|v| format!("{}={}", field, format_value(v))))
                }
                Some(v) => clauses.push(format!("{}={}", field, format_value(v))),
                None => {}
            }
            match options.get("not") {
                Some(Value::Array(values)) if values.is_empty() => {}
                Some(Value::Array(values)) => {
                    clauses.push(format!("{} NOT IN ({})", field, format_list(values)))
                }
                Some(v) => clauses.push(format!("{} NOT IN ({})", field, format_value(v))),
                None => {}
            }
            clauses
        }
        scalar => vec![format!("{}={}", field, format_value(scalar))],
    }
}

/// `(a=1 AND b IN (x, y))`. `term` is skipped; `None` when nothing remains.
pub fn format_predicate(predicate: &Predicate) -> Option<String> {
    let clauses: Vec<String> = predicate
        .0
        .iter()
        .filter(|(field, _)| field.as_str() != "term")
        .flat_map(|(field, value)| field_clauses(field, value))
        .collect();
    if clauses.is_empty() {
        None
    } else {
        Some(format!("({})", clauses.join(" AND ")))
    }
}

/// `((p1) OR (p2))`, or joined with `AND` when the filter says so.
pub fn format_filter_block(filter: &Filter) -> Option<String> {
    let predicates: Vec<String> = filter.predicates.iter().filter_map(format_predicate).collect();
    if predicates.is_empty() {
        return None;
    }
    let joiner = if filter.is_and() { " AND " } else { " OR " };
    Some(format!("({})", predicates.join(joiner)))
}

/// All filter blocks AND'd together; `None` when only `term` predicates exist.
pub fn get_filter_query_param(query: &Query) -> Option<String> {
    let blocks: Vec<String> = query.filters.iter().filter_map(format_filter_block).collect();
    if blocks.is_empty() {
        None
    } else {
        Some(blocks.join(" AND "))
    }
}

/// Extract and validate the single free-text `term` of a query.
pub fn get_q_predicate(query: &Query) -> Result<Option<String>> {
    let term_filters: Vec<&Filter> = query
        .filters
        .iter()
        .filter(|f| f.predicates.iter().any(Predicate::has_term))
        .collect();

    if term_filters.len() > 1 {
        return Err(Error::Query(format!(
            "IQuery can only have 1 IFilter with a 'term' predicate but {} were detected",
            term_filters.len()
        )));
    }
    let Some(filter) = term_filters.first() else {
        return Ok(None);
    };

    let term_predicates: Vec<&Predicate> =
        filter.predicates.iter().filter(|p| p.has_term()).collect();
    if term_predicates.len() > 1 {
        return Err(Error::Query(format!(
            "IQuery can only have 1 'term' predicate but {} were detected",
            term_predicates.len()
        )));
    }
    if filter.predicates.len() > 1 && !filter.is_and() {
        return Err(Error::Query(
            "'term' predicates cannot be OR'd to other predicates".to_string(),
        ));
    }

    match term_predicates[0].0.get("term") {
        Some(Value::String(term)) if term.trim().is_empty() => Ok(None),
        Some(Value::String(term)) => Ok(Some(term.clone())),
        _ => Err(Error::Query(
            "'term' predicate must have a string value, string[] and IMatchOptions are not allowed."
                .to_string(),
        )),
    }
}

/// OGC `sortBy`: the field, prefixed with `-` when descending.
pub fn get_sort_by_query_param(options: &HubSearchOptions) -> Option<String> {
    let field = options.sort_field.as_ref()?;
    match options.sort_order {
        Some(SortDirection::Desc) => Some(format!("-{}", field)),
        _ => Some(field.clone()),
    }
}

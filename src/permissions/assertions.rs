//! Property assertions used by more complex policies.
//!
//! Properties are addressed as `context:<path>` or `entity:<path>`. A string
//! `value` using either prefix is resolved the same way before comparison.

use serde_json::Value;

use super::types::{AssertionType, Permission, PolicyAssertion, PolicyCheck, PolicyResponse};
use crate::util::get_prop;

enum Lookup<'a> {
    Found(&'a Value),
    Missing,
    NoEntity,
}

fn lookup<'a>(reference: &str, context: &'a Value, entity: Option<&'a Value>) -> Lookup<'a> {
    let (root, path) = if let Some(path) = reference.strip_prefix("context:") {
        (Some(context), path)
    } else if let Some(path) = reference.strip_prefix("entity:") {
        match entity {
            Some(e) => (Some(e), path),
            None => return Lookup::NoEntity,
        }
    } else {
        (None, reference)
    };
    match root.and_then(|r| get_prop(r, path)) {
        Some(Value::Null) | None => Lookup::Missing,
        Some(v) => Lookup::Found(v),
    }
}

/// Resolve the comparison value, following `context:`/`entity:` references.
fn resolve_value<'a>(
    value: &'a Value,
    context: &'a Value,
    entity: Option<&'a Value>,
) -> Option<&'a Value> {
    match value.as_str() {
        Some(s) if s.starts_with("context:") || s.starts_with("entity:") => {
            match lookup(s, context, entity) {
                Lookup::Found(v) => Some(v),
                _ => None,
            }
        }
        _ => Some(value),
    }
}

fn as_list(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}

fn member_type<'a>(user: &'a Value, group_id: &str) -> Option<&'a str> {
    user.get("groups")?
        .as_array()?
        .iter()
        .find(|g| g.get("id").and_then(|id| id.as_str()) == Some(group_id))
        .and_then(|g| g.get("userMembership"))
        .and_then(|m| m.get("memberType"))
        .and_then(|t| t.as_str())
}

fn compare(kind: AssertionType, property: &Value, value: &Value) -> PolicyResponse {
    use AssertionType::*;
    use PolicyResponse as R;

    let pass = |ok: bool, denied: PolicyResponse| if ok { R::Granted } else { denied };

    match kind {
        Eq => pass(property == value, R::AssertionFailed),
        Neq => pass(property != value, R::AssertionFailed),
        Gt | Lt => match (property.as_f64(), value.as_f64()) {
            (Some(p), Some(v)) => pass(if kind == Gt { p > v } else { p < v }, R::AssertionFailed),
            _ => R::AssertionRequiresNumericValues,
        },
        Contains | ContainsAll | Without => {
            let Some(items) = property.as_array() else {
                return R::PropertyNotArray;
            };
            let wanted = as_list(value);
            match kind {
                Contains => pass(
                    wanted.iter().any(|w| items.contains(w)),
                    R::ArrayMissingRequiredValue,
                ),
                ContainsAll => pass(
                    wanted.iter().all(|w| items.contains(w)),
                    R::ArrayMissingRequiredValue,
                ),
                _ => pass(
                    !wanted.iter().any(|w| items.contains(w)),
                    R::ArrayContainsInvalidValue,
                ),
            }
        }
        IncludedIn => match value.as_array() {
            Some(allowed) => pass(allowed.contains(property), R::AssertionFailed),
            None => R::AssertionTypeMismatch,
        },
        IsGroupAdmin | IsGroupMember | IsGroupOwner => {
            let Some(group_id) = value.as_str() else {
                return R::AssertionTypeMismatch;
            };
            let membership = member_type(property, group_id);
            match kind {
                IsGroupOwner => pass(membership == Some("owner"), R::NotOwner),
                IsGroupAdmin => pass(
                    matches!(membership, Some("owner") | Some("admin")),
                    R::NotGroupAdmin,
                ),
                _ => pass(membership.is_some(), R::NotGroupMember),
            }
        }
        StartsWith | EndsWith | NotStartsWith | NotEndsWith => {
            let (Some(p), Some(v)) = (property.as_str(), value.as_str()) else {
                return R::AssertionTypeMismatch;
            };
            let ok = match kind {
                StartsWith => p.starts_with(v),
                EndsWith => p.ends_with(v),
                NotStartsWith => !p.starts_with(v),
                _ => !p.ends_with(v),
            };
            pass(ok, R::AssertionFailed)
        }
    }
}

/// Evaluate one assertion to a check.
pub fn evaluate_assertion(
    assertion: &PolicyAssertion,
    permission: &Permission,
    context: &Value,
    entity: Option<&Value>,
) -> PolicyCheck {
    let name = format!("assertion {}", assertion.property);
    let check = |value: String, response: PolicyResponse| {
        PolicyCheck::new(name.clone(), permission, value, response).with_data(serde_json::json!({
            "property": assertion.property,
            "assertion": assertion.assertion,
            "value": assertion.value,
        }))
    };

    let property = match lookup(&assertion.property, context, entity) {
        Lookup::Found(v) => v,
        Lookup::NoEntity => return check("no entity".to_string(), PolicyResponse::EntityRequired),
        Lookup::Missing => {
            // Nothing to exclude from an absent array.
            let response = match assertion.assertion {
                AssertionType::Without => PolicyResponse::Granted,
                AssertionType::Contains | AssertionType::ContainsAll => {
                    PolicyResponse::PropertyMissing
                }
                _ => PolicyResponse::AssertionPropertyNotFound,
            };
            return check("undefined".to_string(), response);
        }
    };
    let Some(value) = resolve_value(&assertion.value, context, entity) else {
        return check(property.to_string(), PolicyResponse::AssertionPropertyNotFound);
    };
    check(property.to_string(), compare(assertion.assertion, property, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> Value {
        json!({
            "currentUser": {
                "username": "casey",
                "orgId": "ORG1",
                "groups": [
                    {"id": "g1", "userMembership": {"memberType": "admin"}},
                    {"id": "g2", "userMembership": {"memberType": "member"}}
                ]
            }
        })
    }

    fn run(
        property: &str,
        kind: AssertionType,
        value: Value,
        entity: Option<&Value>,
    ) -> PolicyResponse {
        let assertion = PolicyAssertion::new(property, kind, value);
        evaluate_assertion(&assertion, &Permission::from("hub:test"), &ctx(), entity).response
    }

    #[test]
    fn test_eq_against_entity_reference() {
        let entity = json!({"owner": "casey", "orgId": "ORG2"});
        assert_eq!(
            run(
                "context:currentUser.username",
                AssertionType::Eq,
                json!("entity:owner"),
                Some(&entity),
            ),
            PolicyResponse::Granted
        );
        assert_eq!(
            run(
                "context:currentUser.orgId",
                AssertionType::Eq,
                json!("entity:orgId"),
                Some(&entity),
            ),
            PolicyResponse::AssertionFailed
        );
    }

    #[test]
    fn test_array_assertions() {
        let entity = json!({"typeKeywords": ["a", "cannotDiscuss"]});
        assert_eq!(
            run(
                "entity:typeKeywords",
                AssertionType::Without,
                json!("cannotDiscuss"),
                Some(&entity),
            ),
            PolicyResponse::ArrayContainsInvalidValue
        );
        assert_eq!(
            run(
                "entity:typeKeywords",
                AssertionType::ContainsAll,
                json!(["a", "b"]),
                Some(&entity),
            ),
            PolicyResponse::ArrayMissingRequiredValue
        );
        assert_eq!(
            run("entity:typeKeywords", AssertionType::Contains, json!("a"), Some(&entity)),
            PolicyResponse::Granted
        );
        assert_eq!(
            run("entity:missing", AssertionType::Without, json!("x"), Some(&entity)),
            PolicyResponse::Granted
        );
        assert_eq!(
            run("entity:missing", AssertionType::Contains, json!("x"), Some(&entity)),
            PolicyResponse::PropertyMissing
        );
    }

    #[test]
    fn test_group_membership() {
        assert_eq!(
            run("context:currentUser", AssertionType::IsGroupAdmin, json!("g1"), None),
            PolicyResponse::Granted
        );
        assert_eq!(
            run("context:currentUser", AssertionType::IsGroupAdmin, json!("g2"), None),
            PolicyResponse::NotGroupAdmin
        );
        assert_eq!(
            run("context:currentUser", AssertionType::IsGroupMember, json!("g3"), None),
            PolicyResponse::NotGroupMember
        );
    }

    #[test]
    fn test_entity_required_and_numeric() {
        assert_eq!(
            run("entity:owner", AssertionType::Eq, json!("x"), None),
            PolicyResponse::EntityRequired
        );
        assert_eq!(
            run("context:currentUser.username", AssertionType::Gt, json!(3), None),
            PolicyResponse::AssertionRequiresNumericValues
        );
        assert_eq!(
            run("context:currentUser.username", AssertionType::StartsWith, json!("ca"), None),
            PolicyResponse::Granted
        );
    }
}

//! The ordered check pipeline.
//!
//! Each check is a plain function over an [`Evaluation`] and returns zero or
//! more [`PolicyCheck`]s. Order matters: the first failing check decides the
//! response.

use serde_json::Value;
use tracing::debug;

use super::assertions::evaluate_assertion;
use super::registry::PolicyRegistry;
use super::types::{HubAvailability, Permission, PermissionPolicy, PolicyCheck, PolicyResponse};
use crate::context::{ArcGISContext, ServiceState};

/// Inputs shared by every check of one evaluation.
pub(crate) struct Evaluation<'a> {
    pub registry: &'a PolicyRegistry,
    pub policy: &'a PermissionPolicy,
    pub context: &'a ArcGISContext,
    pub entity: Option<&'a Value>,
    /// Permissions currently being evaluated above this one.
    pub chain: &'a [Permission],
}

pub(crate) type CheckFn = fn(&Evaluation<'_>) -> Vec<PolicyCheck>;

pub(crate) const PIPELINE: [CheckFn; 12] = [
    check_parents,
    check_service_status,
    check_entity_feature,
    check_authentication,
    check_environment,
    check_availability,
    check_license,
    check_privileges,
    check_owner,
    check_edit,
    check_assertions,
    check_alpha_gating,
];

pub(crate) fn check_parents(eval: &Evaluation<'_>) -> Vec<PolicyCheck> {
    eval.policy
        .dependencies
        .iter()
        .map(|dep| {
            let result = super::evaluate(eval.registry, dep, eval.context, eval.entity, eval.chain);
            debug!(
                permission = %eval.policy.permission,
                dependency = %dep,
                response = %result.response,
                "dependency checked"
            );
            PolicyCheck::new(
                format!("dependency: {}", dep),
                &eval.policy.permission,
                result.response.as_str(),
                result.response,
            )
        })
        .collect()
}

pub(crate) fn check_service_status(eval: &Evaluation<'_>) -> Vec<PolicyCheck> {
    eval.policy
        .services
        .iter()
        .map(|service| {
            let state = eval.context.service_state(*service);
            let response = match state {
                ServiceState::Online => PolicyResponse::Granted,
                ServiceState::Offline => PolicyResponse::SystemOffline,
                ServiceState::Maintenance => PolicyResponse::SystemMaintenance,
            };
            PolicyCheck::new(
                format!("service {:?} online", service).to_lowercase(),
                &eval.policy.permission,
                format!("{:?}", state).to_lowercase(),
                response,
            )
        })
        .collect()
}

/// Entities may switch individual features off through their `features` hash.
pub(crate) fn check_entity_feature(eval: &Evaluation<'_>) -> Vec<PolicyCheck> {
    let Some(enabled) = eval
        .entity
        .and_then(|e| e.get("features"))
        .and_then(|f| f.get(eval.policy.permission.as_str()))
        .and_then(|v| v.as_bool())
    else {
        return Vec::new();
    };
    vec![PolicyCheck::outcome(
        "entity feature enabled",
        &eval.policy.permission,
        enabled.to_string(),
        enabled,
        PolicyResponse::FeatureDisabled,
    )]
}

pub(crate) fn check_authentication(eval: &Evaluation<'_>) -> Vec<PolicyCheck> {
    if !eval.policy.authenticated {
        return Vec::new();
    }
    let authenticated = eval.context.is_authenticated();
    vec![PolicyCheck::outcome(
        "user authenticated",
        &eval.policy.permission,
        authenticated.to_string(),
        authenticated,
        PolicyResponse::NotAuthenticated,
    )]
}

pub(crate) fn check_environment(eval: &Evaluation<'_>) -> Vec<PolicyCheck> {
    if eval.policy.environments.is_empty() || eval.policy.flag_enabled() {
        return Vec::new();
    }
    let environment = eval.context.environment();
    vec![PolicyCheck::outcome(
        "environment",
        &eval.policy.permission,
        environment.to_string(),
        eval.policy.environments.contains(&environment),
        PolicyResponse::NotInEnvironment,
    )]
}

pub(crate) fn check_availability(eval: &Evaluation<'_>) -> Vec<PolicyCheck> {
    if eval.policy.availability.is_empty() || eval.policy.flag_enabled() {
        return Vec::new();
    }
    let alpha = eval.context.is_alpha_org();
    let beta = eval.context.is_beta_org();
    let available = eval.policy.availability.iter().any(|stage| match stage {
        HubAvailability::Alpha => alpha,
        HubAvailability::Beta => alpha || beta,
        HubAvailability::General => true,
    });
    let value = if alpha {
        "alpha"
    } else if beta {
        "beta"
    } else {
        "general"
    };
    vec![PolicyCheck::outcome(
        "availability",
        &eval.policy.permission,
        value,
        available,
        PolicyResponse::NotAvailable,
    )]
}

pub(crate) fn check_license(eval: &Evaluation<'_>) -> Vec<PolicyCheck> {
    if eval.policy.licenses.is_empty() {
        return Vec::new();
    }
    let license = eval.context.hub_license();
    vec![PolicyCheck::outcome(
        "license",
        &eval.policy.permission,
        license.to_string(),
        eval.policy.licenses.contains(&license),
        PolicyResponse::NotLicensed,
    )]
}

pub(crate) fn check_privileges(eval: &Evaluation<'_>) -> Vec<PolicyCheck> {
    let user = eval.context.current_user().filter(|_| eval.context.is_authenticated());
    eval.policy
        .privileges
        .iter()
        .map(|privilege| {
            let name = format!("privilege: {}", privilege);
            match user {
                None => PolicyCheck::new(
                    name,
                    &eval.policy.permission,
                    "not authenticated",
                    PolicyResponse::NotAuthenticated,
                ),
                Some(user) => {
                    let has = user.privileges.iter().any(|p| p == privilege);
                    PolicyCheck::outcome(
                        name,
                        &eval.policy.permission,
                        has.to_string(),
                        has,
                        PolicyResponse::PrivilegeRequired,
                    )
                }
            }
        })
        .collect()
}

fn entity_required(eval: &Evaluation<'_>, name: &str) -> PolicyCheck {
    PolicyCheck::new(name, &eval.policy.permission, "no entity", PolicyResponse::EntityRequired)
}

pub(crate) fn check_owner(eval: &Evaluation<'_>) -> Vec<PolicyCheck> {
    if !eval.policy.entity_owner {
        return Vec::new();
    }
    let Some(entity) = eval.entity else {
        return vec![entity_required(eval, "entity owner")];
    };
    let owner = entity.get("owner").and_then(|o| o.as_str()).unwrap_or_default();
    let is_owner = eval.context.is_authenticated()
        && eval
            .context
            .current_user()
            .is_some_and(|u| !owner.is_empty() && u.username == owner);
    vec![PolicyCheck::outcome(
        "entity owner",
        &eval.policy.permission,
        owner,
        is_owner,
        PolicyResponse::NotOwner,
    )]
}

pub(crate) fn check_edit(eval: &Evaluation<'_>) -> Vec<PolicyCheck> {
    if !eval.policy.entity_edit {
        return Vec::new();
    }
    let Some(entity) = eval.entity else {
        return vec![entity_required(eval, "entity edit")];
    };
    let can_edit = entity.get("canEdit").and_then(|v| v.as_bool()).unwrap_or(false);
    vec![PolicyCheck::outcome(
        "entity edit",
        &eval.policy.permission,
        can_edit.to_string(),
        can_edit,
        PolicyResponse::NoEditAccess,
    )]
}

pub(crate) fn check_assertions(eval: &Evaluation<'_>) -> Vec<PolicyCheck> {
    if eval.policy.assertions.is_empty() {
        return Vec::new();
    }
    let context = eval.context.to_value();
    eval.policy
        .assertions
        .iter()
        .map(|a| evaluate_assertion(a, &eval.policy.permission, &context, eval.entity))
        .collect()
}

/// Legacy gate: listed permissions are only available to alpha orgs.
pub(crate) fn check_alpha_gating(eval: &Evaluation<'_>) -> Vec<PolicyCheck> {
    if !eval.registry.is_alpha_gated(&eval.policy.permission) || eval.policy.flag_enabled() {
        return Vec::new();
    }
    let alpha = eval.context.is_alpha_org();
    vec![PolicyCheck::outcome(
        "alpha org",
        &eval.policy.permission,
        alpha.to_string(),
        alpha,
        PolicyResponse::NotAlphaOrg,
    )]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ArcGISContextOptions, HubEnvironment, HubLicense, HubService, PortalUser};
    use serde_json::json;
    use std::collections::HashMap;

    fn run(
        check: CheckFn,
        policy: &PermissionPolicy,
        context: &ArcGISContext,
        entity: Option<&Value>,
    ) -> Vec<PolicyCheck> {
        let registry = PolicyRegistry::hub_default();
        check(&Evaluation {
            registry: &registry,
            policy,
            context,
            entity,
            chain: &[],
        })
    }

    #[test]
    fn test_checks_skip_when_not_required() {
        let policy = PermissionPolicy::new("hub:x");
        let ctx = ArcGISContext::default();
        for check in PIPELINE {
            assert!(run(check, &policy, &ctx, None).is_empty());
        }
    }

    #[test]
    fn test_service_status() {
        let policy =
            PermissionPolicy::new("hub:x").services(&[HubService::Portal, HubService::Discussions]);
        let ctx = ArcGISContext::new(ArcGISContextOptions {
            service_status: HashMap::from([(HubService::Discussions, ServiceState::Maintenance)]),
            ..Default::default()
        });
        let checks = run(check_service_status, &policy, &ctx, None);
        assert_eq!(checks.len(), 2);
        assert_eq!(checks[0].response, PolicyResponse::Granted);
        assert_eq!(checks[1].response, PolicyResponse::SystemMaintenance);
    }

    #[test]
    fn test_environment_lifted_by_flag() {
        let mut policy = PermissionPolicy::new("hub:x").environments(&[HubEnvironment::Qaext]);
        let ctx = ArcGISContext::default();
        let checks = run(check_environment, &policy, &ctx, None);
        assert_eq!(checks[0].response, PolicyResponse::NotInEnvironment);
        policy.flag_value = Some(true);
        assert!(run(check_environment, &policy, &ctx, None).is_empty());
    }

    #[test]
    fn test_license() {
        let policy = PermissionPolicy::new("hub:x").licenses(&[HubLicense::HubPremium]);
        let checks = run(check_license, &policy, &ArcGISContext::default(), None);
        assert_eq!(checks[0].response, PolicyResponse::NotLicensed);
        assert_eq!(checks[0].value, "hub-basic");
    }

    #[test]
    fn test_privileges() {
        let policy = PermissionPolicy::new("hub:x").privileges(&["portal:user:createItem"]);
        let anon = run(check_privileges, &policy, &ArcGISContext::default(), None);
        assert_eq!(anon[0].response, PolicyResponse::NotAuthenticated);

        let ctx = ArcGISContext::new(ArcGISContextOptions {
            token: Some("t".to_string()),
            current_user: Some(PortalUser {
                username: "casey".to_string(),
                privileges: vec!["portal:user:createGroup".to_string()],
                ..Default::default()
            }),
            ..Default::default()
        });
        let checks = run(check_privileges, &policy, &ctx, None);
        assert_eq!(checks[0].response, PolicyResponse::PrivilegeRequired);
    }

    #[test]
    fn test_owner_and_edit_need_entity() {
        let policy = PermissionPolicy::new("hub:x").entity_owner().entity_edit();
        let ctx = ArcGISContext::default();
        assert_eq!(
            run(check_owner, &policy, &ctx, None)[0].response,
            PolicyResponse::EntityRequired
        );
        assert_eq!(
            run(check_edit, &policy, &ctx, None)[0].response,
            PolicyResponse::EntityRequired
        );

        let entity = json!({"owner": "casey", "canEdit": true});
        assert_eq!(
            run(check_owner, &policy, &ctx, Some(&entity))[0].response,
            PolicyResponse::NotOwner
        );
        assert_eq!(
            run(check_edit, &policy, &ctx, Some(&entity))[0].response,
            PolicyResponse::Granted
        );
    }

    #[test]
    fn test_entity_feature_toggle() {
        let policy = PermissionPolicy::new("hub:project:events");
        let entity = json!({"features": {"hub:project:events": false}});
        let checks = run(check_entity_feature, &policy, &ArcGISContext::default(), Some(&entity));
        assert_eq!(checks[0].response, PolicyResponse::FeatureDisabled);
    }
}

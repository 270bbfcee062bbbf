//! Permission policy engine.
//!
//! [`check_permission`] evaluates a [`Permission`] against the system
//! policies held in a [`PolicyRegistry`] and, when an entity is supplied, the
//! grants in that entity's `permissions` array.
//!
//! System policies are a hard gate: every check must pass and the response is
//! the first failure in pipeline order. Entity grants can only narrow an
//! otherwise granted result to `not-granted`; they never lift a system denial.

mod assertions;
mod checks;
mod entity_policy;
pub mod features;
mod registry;
mod types;

use serde_json::Value;
use tracing::{debug, info};

pub use assertions::evaluate_assertion;
pub use entity_policy::check_entity_policy;
pub use features::{FeatureFlags, process_entity_features};
pub use registry::PolicyRegistry;
pub use types::{
    AssertionType, CollaborationType, EntityPermissionPolicy, HubAvailability, Permission,
    PermissionAccessResponse, PermissionPolicy, PolicyAssertion, PolicyCheck, PolicyResponse,
};

use crate::context::ArcGISContext;
use checks::{Evaluation, PIPELINE};

/// Optional arguments to [`check_permission`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckOptions<'a> {
    /// Entity the permission is checked against (owner, `canEdit`, features, grants).
    pub entity: Option<&'a Value>,
    /// Free-form label included when a denial is logged.
    pub label: Option<&'a str>,
}

impl<'a> CheckOptions<'a> {
    pub fn entity(entity: &'a Value) -> Self {
        Self {
            entity: Some(entity),
            label: None,
        }
    }

    pub fn with_label(mut self, label: &'a str) -> Self {
        self.label = Some(label);
        self
    }
}

/// Check a permission against the system policies and, optionally, an entity.
pub fn check_permission(
    registry: &PolicyRegistry,
    permission: &Permission,
    context: &ArcGISContext,
    options: CheckOptions<'_>,
) -> PermissionAccessResponse {
    let mut response = evaluate(registry, permission, context, options.entity, &[]);

    if let Some(entity) = options.entity
        && registry.is_permission(permission)
    {
        let entity_checks: Vec<PolicyCheck> = entity_grants(entity, permission)
            .iter()
            .map(|grant| check_entity_policy(grant, context))
            .collect();
        let any_granted = entity_checks.iter().any(|c| c.response.is_granted());
        if !entity_checks.is_empty() && !any_granted {
            response.deny_once(PolicyResponse::NotGranted);
        }
        response.checks.extend(entity_checks);
    }

    if !response.access {
        info!(
            label = options.label.unwrap_or(""),
            permission = %permission,
            response = %response.response,
            checks = response.checks.len(),
            "checkPermission denied"
        );
    }
    response
}

/// Grants on the entity's `permissions` array for this permission.
fn entity_grants(entity: &Value, permission: &Permission) -> Vec<EntityPermissionPolicy> {
    entity
        .get("permissions")
        .and_then(|p| p.as_array())
        .map(|grants| {
            grants
                .iter()
                .filter_map(|g| serde_json::from_value::<EntityPermissionPolicy>(g.clone()).ok())
                .filter(|g| &g.permission == permission)
                .collect()
        })
        .unwrap_or_default()
}

/// System level evaluation, shared by the top-level call and dependency checks.
pub(crate) fn evaluate(
    registry: &PolicyRegistry,
    permission: &Permission,
    context: &ArcGISContext,
    entity: Option<&Value>,
    chain: &[Permission],
) -> PermissionAccessResponse {
    let Some(system_policy) = registry.get(permission) else {
        return PermissionAccessResponse::denied(permission, PolicyResponse::InvalidPermission);
    };

    if chain.contains(permission) {
        debug!(permission = %permission, "circular permission dependency");
        let mut response =
            PermissionAccessResponse::denied(permission, PolicyResponse::InvalidPermission);
        response.checks.push(PolicyCheck::new(
            "circular dependency",
            permission,
            chain.len().to_string(),
            PolicyResponse::InvalidPermission,
        ));
        return response;
    }

    let mut policy = system_policy.clone();
    match context.feature_flags().get(permission.as_str()) {
        Some(false) => {
            let mut response =
                PermissionAccessResponse::denied(permission, PolicyResponse::DisabledByFeatureFlag);
            response.checks.push(PolicyCheck::new(
                "feature flag",
                permission,
                "false",
                PolicyResponse::DisabledByFeatureFlag,
            ));
            return response;
        }
        Some(true) => policy.flag_value = Some(true),
        None => {}
    }

    let mut next_chain = chain.to_vec();
    next_chain.push(permission.clone());
    let eval = Evaluation {
        registry,
        policy: &policy,
        context,
        entity,
        chain: &next_chain,
    };

    let checks: Vec<PolicyCheck> = PIPELINE.iter().flat_map(|check| check(&eval)).collect();

    let mut response = PermissionAccessResponse::granted(permission);
    for check in &checks {
        response.deny_once(check.response);
    }
    response.checks = checks;
    response
}

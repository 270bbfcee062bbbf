//! Evaluation of grants attached to an entity instance.

use super::types::{CollaborationType, EntityPermissionPolicy, PolicyCheck, PolicyResponse};
use crate::context::ArcGISContext;

impl CollaborationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollaborationType::User => "user",
            CollaborationType::Group => "group",
            CollaborationType::GroupAdmin => "group-admin",
            CollaborationType::Org => "org",
            CollaborationType::OrgAdmin => "org-admin",
            CollaborationType::Authenticated => "authenticated",
            CollaborationType::Anonymous => "anonymous",
        }
    }
}

/// Check whether the current user satisfies a single entity grant.
pub fn check_entity_policy(
    policy: &EntityPermissionPolicy,
    context: &ArcGISContext,
) -> PolicyCheck {
    let name = format!("entity policy: {}", policy.collaboration_type.as_str());
    let target = policy.collaboration_id.as_str();

    if policy.collaboration_type == CollaborationType::Anonymous {
        return PolicyCheck::new(name, &policy.permission, "anonymous", PolicyResponse::Granted);
    }

    let Some(user) = context.current_user().filter(|_| context.is_authenticated()) else {
        return PolicyCheck::new(
            name,
            &policy.permission,
            "not authenticated",
            PolicyResponse::NotAuthenticated,
        );
    };

    let (value, ok, denied) = match policy.collaboration_type {
        CollaborationType::Authenticated => (
            user.username.clone(),
            true,
            PolicyResponse::NotAuthenticated,
        ),
        CollaborationType::User => (
            user.username.clone(),
            user.username == target,
            PolicyResponse::NotGranted,
        ),
        CollaborationType::Group => {
            let membership = user.membership_in(target);
            (
                membership.unwrap_or("none").to_string(),
                membership.is_some(),
                PolicyResponse::NotGroupMember,
            )
        }
        CollaborationType::GroupAdmin => {
            let membership = user.membership_in(target);
            (
                membership.unwrap_or("none").to_string(),
                matches!(membership, Some("owner") | Some("admin")),
                PolicyResponse::NotGroupAdmin,
            )
        }
        CollaborationType::Org => {
            let org = user.org_id.clone().unwrap_or_default();
            let ok = org == target;
            (org, ok, PolicyResponse::NotOrgMember)
        }
        CollaborationType::OrgAdmin => {
            let org = user.org_id.clone().unwrap_or_default();
            if org != target {
                (org, false, PolicyResponse::NotOrgMember)
            } else {
                (org, user.is_org_admin(), PolicyResponse::NotOrgAdmin)
            }
        }
        CollaborationType::Anonymous => (String::new(), true, PolicyResponse::Granted),
    };

    PolicyCheck::outcome(name, &policy.permission, value, ok, denied)
        .with_data(serde_json::json!({ "collaborationId": target }))
}

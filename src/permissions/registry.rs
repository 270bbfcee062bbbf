//! Policy tables for the Hub.
//!
//! A [`PolicyRegistry`] is built once (usually via [`PolicyRegistry::hub_default`])
//! and shared read-only, typically behind an `Arc`.

use std::collections::{HashMap, HashSet};

use super::types::{HubAvailability, Permission, PermissionPolicy};
use crate::context::HubEnvironment::{Devext, Qaext};
use crate::context::HubLicense::{EnterpriseSites, HubBasic, HubPremium};
use crate::context::HubService::{Discussions, Portal};

const ALPHA: &[HubAvailability] = &[HubAvailability::Alpha];

/// Lookup table of system policies keyed by permission.
#[derive(Debug, Clone, Default)]
pub struct PolicyRegistry {
    policies: HashMap<Permission, PermissionPolicy>,
    alpha_gated: HashSet<Permission>,
}

impl PolicyRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry populated with every Hub policy.
    pub fn hub_default() -> Self {
        let mut registry = Self::new();
        for policy in site_policies()
            .into_iter()
            .chain(project_policies())
            .chain(initiative_policies())
            .chain(discussion_policies())
            .chain(content_policies())
            .chain(group_policies())
            .chain(page_policies())
            .chain(template_policies())
            .chain(initiative_template_policies())
            .chain(platform_policies())
            .chain(temp_policies())
            .chain(system_policies())
        {
            registry.insert(policy);
        }
        registry.alpha_gated.insert(Permission::from("temp:workspace:released"));
        registry
    }

    /// Add or replace a policy.
    pub fn insert(&mut self, policy: PermissionPolicy) {
        self.policies.insert(policy.permission.clone(), policy);
    }

    /// Add permissions to the legacy alpha-org gate.
    pub fn with_alpha_gated<I, P>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Permission>,
    {
        self.alpha_gated
            .extend(permissions.into_iter().map(Into::into));
        self
    }

    pub fn get(&self, permission: &Permission) -> Option<&PermissionPolicy> {
        self.policies.get(permission)
    }

    /// A permission is valid when a policy exists for it.
    pub fn is_permission(&self, permission: &Permission) -> bool {
        self.policies.contains_key(permission)
    }

    pub fn is_alpha_gated(&self, permission: &Permission) -> bool {
        self.alpha_gated.contains(permission)
    }

    /// All known permissions, sorted.
    pub fn permissions(&self) -> Vec<&Permission> {
        let mut keys: Vec<&Permission> = self.policies.keys().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

/// Standard `:create/:view/:edit/:delete/:owner` set for an item-backed family.
fn crud(prefix: &str, create_privilege: &str) -> Vec<PermissionPolicy> {
    let create = format!("{}:create", prefix);
    let view = format!("{}:view", prefix);
    let edit = format!("{}:edit", prefix);
    let delete = format!("{}:delete", prefix);
    let owner = format!("{}:owner", prefix);
    vec![
        PermissionPolicy::new(&create)
            .dependencies(&[prefix])
            .authenticated()
            .privileges(&[create_privilege]),
        PermissionPolicy::new(&view).dependencies(&[prefix]),
        PermissionPolicy::new(&edit)
            .dependencies(&[prefix])
            .authenticated()
            .entity_edit(),
        PermissionPolicy::new(&delete)
            .dependencies(&[prefix])
            .authenticated()
            .entity_owner(),
        PermissionPolicy::new(&owner)
            .dependencies(&[prefix])
            .authenticated()
            .entity_owner(),
    ]
}

/// `:workspace` and its panes, gated on the workspace system feature.
fn workspace(prefix: &str, panes: &[(&str, &str)]) -> Vec<PermissionPolicy> {
    let ws = format!("{}:workspace", prefix);
    let mut policies = vec![
        PermissionPolicy::new(&ws)
            .dependencies(&["hub:feature:workspace"])
            .environments(&[Devext, Qaext]),
    ];
    for (pane, dependency) in panes {
        let dependency = format!("{}:{}", prefix, dependency);
        policies.push(
            PermissionPolicy::new(&format!("{}:{}", ws, pane))
                .dependencies(&[ws.as_str(), dependency.as_str()]),
        );
    }
    policies
}

const ENTITY_PANES: &[(&str, &str)] = &[
    ("overview", "view"),
    ("dashboard", "view"),
    ("details", "edit"),
    ("settings", "edit"),
    ("collaborators", "edit"),
    ("content", "edit"),
    ("metrics", "edit"),
];

fn site_policies() -> Vec<PermissionPolicy> {
    let mut policies = vec![
        PermissionPolicy::new("hub:site").services(&[Portal]),
        PermissionPolicy::new("hub:site:events").dependencies(&["hub:site:view"]),
        PermissionPolicy::new("hub:site:content").dependencies(&["hub:site:edit"]),
        PermissionPolicy::new("hub:site:discussions").dependencies(&["hub:site:view"]),
        PermissionPolicy::new("hub:site:manage").dependencies(&["hub:site:edit"]),
    ];
    policies.extend(crud("hub:site", "portal:user:createItem"));
    policies.extend(workspace("hub:site", ENTITY_PANES));
    policies
}

fn project_policies() -> Vec<PermissionPolicy> {
    let mut policies = vec![
        PermissionPolicy::new("hub:project")
            .services(&[Portal])
            .licenses(&[HubPremium, EnterpriseSites]),
        PermissionPolicy::new("hub:project:events").dependencies(&["hub:project:view"]),
        PermissionPolicy::new("hub:project:content").dependencies(&["hub:project:edit"]),
        PermissionPolicy::new("hub:project:discussions").dependencies(&["hub:project:view"]),
        PermissionPolicy::new("hub:project:manage").dependencies(&["hub:project:edit"]),
    ];
    policies.extend(crud("hub:project", "portal:user:createItem"));
    policies.extend(workspace("hub:project", ENTITY_PANES));
    policies
}

fn initiative_policies() -> Vec<PermissionPolicy> {
    let mut policies = vec![
        PermissionPolicy::new("hub:initiative")
            .services(&[Portal])
            .licenses(&[HubPremium]),
        PermissionPolicy::new("hub:initiative:create")
            .dependencies(&["hub:initiative"])
            .authenticated()
            .privileges(&["portal:user:createItem"]),
        // Viewing is not limited to premium orgs.
        PermissionPolicy::new("hub:initiative:view")
            .services(&[Portal])
            .licenses(&[HubPremium, HubBasic]),
        PermissionPolicy::new("hub:initiative:edit")
            .dependencies(&["hub:initiative"])
            .authenticated()
            .entity_edit(),
        PermissionPolicy::new("hub:initiative:delete")
            .dependencies(&["hub:initiative"])
            .authenticated()
            .entity_owner(),
        PermissionPolicy::new("hub:initiative:events").dependencies(&["hub:initiative:view"]),
        PermissionPolicy::new("hub:initiative:content").dependencies(&["hub:initiative:edit"]),
        PermissionPolicy::new("hub:initiative:discussions")
            .dependencies(&["hub:initiative:view"]),
        PermissionPolicy::new("hub:initiative:manage").dependencies(&["hub:initiative:edit"]),
    ];
    let mut ws = workspace("hub:initiative", ENTITY_PANES);
    for policy in ws.iter_mut() {
        if policy.permission.as_str() == "hub:initiative:workspace:settings" {
            policy.entity_owner = true;
        }
    }
    policies.extend(ws);
    policies
}

fn discussion_policies() -> Vec<PermissionPolicy> {
    let mut policies = vec![
        PermissionPolicy::new("hub:discussion").services(&[Portal, Discussions]),
        PermissionPolicy::new("hub:discussion:manage").dependencies(&["hub:discussion:edit"]),
    ];
    policies.extend(crud("hub:discussion", "portal:user:createItem"));
    policies.extend(workspace(
        "hub:discussion",
        &[("details", "edit"), ("settings", "edit"), ("collaborators", "edit")],
    ));
    policies
}

fn content_policies() -> Vec<PermissionPolicy> {
    let mut policies = vec![
        PermissionPolicy::new("hub:content").services(&[Portal]),
        PermissionPolicy::new("hub:content:manage").dependencies(&["hub:content:edit"]),
    ];
    policies.extend(crud("hub:content", "portal:user:createItem"));
    policies.extend(workspace(
        "hub:content",
        &[("overview", "view"), ("details", "edit"), ("settings", "edit")],
    ));
    policies
}

fn group_policies() -> Vec<PermissionPolicy> {
    let mut policies = vec![
        PermissionPolicy::new("hub:group").services(&[Portal]),
        PermissionPolicy::new("hub:group:manage").dependencies(&["hub:group:edit"]),
        PermissionPolicy::new("hub:group:discussions").dependencies(&["hub:group:view"]),
    ];
    policies.extend(crud("hub:group", "portal:user:createGroup"));
    policies.extend(workspace(
        "hub:group",
        &[
            ("overview", "view"),
            ("details", "edit"),
            ("settings", "edit"),
            ("members", "view"),
            ("content", "view"),
        ],
    ));
    policies
}

fn page_policies() -> Vec<PermissionPolicy> {
    let mut policies = vec![PermissionPolicy::new("hub:page").services(&[Portal])];
    policies.extend(crud("hub:page", "portal:user:createItem"));
    policies.extend(workspace(
        "hub:page",
        &[("details", "edit"), ("settings", "edit")],
    ));
    policies
}

fn template_policies() -> Vec<PermissionPolicy> {
    let mut policies = vec![
        PermissionPolicy::new("hub:template").services(&[Portal]),
        PermissionPolicy::new("hub:template:manage").dependencies(&["hub:template:edit"]),
    ];
    policies.extend(crud("hub:template", "portal:user:createItem"));
    policies.extend(workspace(
        "hub:template",
        &[("overview", "view"), ("details", "edit"), ("settings", "edit")],
    ));
    policies
}

fn initiative_template_policies() -> Vec<PermissionPolicy> {
    let mut policies = vec![
        PermissionPolicy::new("hub:initiativeTemplate")
            .services(&[Portal])
            .licenses(&[HubPremium]),
        PermissionPolicy::new("hub:initiativeTemplate:manage")
            .dependencies(&["hub:initiativeTemplate:edit"]),
    ];
    policies.extend(crud("hub:initiativeTemplate", "portal:user:createItem"));
    policies.extend(workspace(
        "hub:initiativeTemplate",
        &[("details", "edit"), ("settings", "edit")],
    ));
    policies
}

/// Org level capabilities backed by platform privileges.
fn platform_policies() -> Vec<PermissionPolicy> {
    [
        ("platform:portal:user:createItem", "portal:user:createItem"),
        ("platform:portal:user:createGroup", "portal:user:createGroup"),
        ("platform:portal:user:shareToGroup", "portal:user:shareToGroup"),
        ("platform:portal:user:shareToOrg", "portal:user:shareToOrg"),
        ("platform:portal:user:shareToPublic", "portal:user:shareToPublic"),
        ("platform:portal:admin:viewUsers", "portal:admin:viewUsers"),
        ("platform:portal:admin:updateItems", "portal:admin:updateItems"),
        ("platform:portal:admin:deleteItems", "portal:admin:deleteItems"),
    ]
    .into_iter()
    .map(|(permission, privilege)| {
        PermissionPolicy::new(permission)
            .authenticated()
            .privileges(&[privilege])
    })
    .collect()
}

/// Deprecated feature switches kept until callers migrate to `hub:feature:*`.
fn temp_policies() -> Vec<PermissionPolicy> {
    vec![
        PermissionPolicy::new("temp:workspace:released")
            .availability(ALPHA)
            .environments(&[Devext, Qaext]),
    ]
}

/// System wide switches other permissions depend on.
fn system_policies() -> Vec<PermissionPolicy> {
    vec![
        PermissionPolicy::new("hub:feature:privacy")
            .availability(ALPHA)
            .environments(&[Qaext]),
        PermissionPolicy::new("hub:feature:workspace")
            .availability(ALPHA)
            .environments(&[Devext, Qaext]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hub_default_contains_families() {
        let registry = PolicyRegistry::hub_default();
        for key in [
            "hub:site:create",
            "hub:project:edit",
            "hub:initiative:workspace:metrics",
            "hub:group:delete",
            "hub:template:view",
            "hub:feature:workspace",
            "platform:portal:user:createItem",
        ] {
            assert!(registry.is_permission(&Permission::from(key)), "{key}");
        }
        assert!(!registry.is_permission(&Permission::from("hub:nope")));
    }

    #[test]
    fn test_dependencies_resolve() {
        let registry = PolicyRegistry::hub_default();
        for permission in registry.permissions() {
            let policy = registry.get(permission).unwrap();
            for dep in &policy.dependencies {
                assert!(
                    registry.is_permission(dep),
                    "{permission} depends on unknown {dep}"
                );
            }
        }
    }

    #[test]
    fn test_initiative_table() {
        let registry = PolicyRegistry::hub_default();
        let settings = registry
            .get(&Permission::from("hub:initiative:workspace:settings"))
            .unwrap();
        assert!(settings.entity_owner);
        let view = registry.get(&Permission::from("hub:initiative:view")).unwrap();
        assert_eq!(view.licenses, vec![HubPremium, HubBasic]);
        assert!(view.dependencies.is_empty());
    }

    #[test]
    fn test_alpha_gating_is_configurable() {
        let registry = PolicyRegistry::hub_default().with_alpha_gated(["hub:site:create"]);
        assert!(registry.is_alpha_gated(&Permission::from("hub:site:create")));
        assert!(registry.is_alpha_gated(&Permission::from("temp:workspace:released")));
    }
}

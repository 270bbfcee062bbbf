//! Policy, check and decision types for the permission engine.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::context::{HubEnvironment, HubLicense, HubService};

/// A string-tagged capability such as `hub:initiative:edit`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(String);

impl Permission {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Permission {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Permission {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Release stage a permission is gated to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HubAvailability {
    Alpha,
    Beta,
    General,
}

/// Comparison performed by a [`PolicyAssertion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssertionType {
    Eq,
    Neq,
    Gt,
    Lt,
    Contains,
    ContainsAll,
    Without,
    IncludedIn,
    IsGroupAdmin,
    IsGroupMember,
    IsGroupOwner,
    StartsWith,
    EndsWith,
    NotStartsWith,
    NotEndsWith,
}

/// A property comparison. `property` (and a string `value`) may reference
/// `context:<path>` or `entity:<path>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyAssertion {
    pub property: String,
    #[serde(rename = "type")]
    pub assertion: AssertionType,
    pub value: Value,
}

impl PolicyAssertion {
    pub fn new(property: &str, assertion: AssertionType, value: impl Into<Value>) -> Self {
        Self {
            property: property.to_string(),
            assertion,
            value: value.into(),
        }
    }
}

/// System level policy bound to one permission. All conditions must hold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionPolicy {
    pub permission: Permission,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Permission>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<HubService>,
    #[serde(default)]
    pub authenticated: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub licenses: Vec<HubLicense>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub availability: Vec<HubAvailability>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environments: Vec<HubEnvironment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub privileges: Vec<String>,
    #[serde(default)]
    pub entity_configurable: bool,
    #[serde(default)]
    pub entity_edit: bool,
    #[serde(default)]
    pub entity_owner: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assertions: Vec<PolicyAssertion>,
    /// Set from context feature flags for the duration of one check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag_value: Option<bool>,
}

impl PermissionPolicy {
    /// A policy with no requirements.
    pub fn new(permission: &str) -> Self {
        Self {
            permission: Permission::from(permission),
            ..Default::default()
        }
    }

    pub fn dependencies(mut self, deps: &[&str]) -> Self {
        self.dependencies = deps.iter().map(|d| Permission::from(*d)).collect();
        self
    }

    pub fn services(mut self, services: &[HubService]) -> Self {
        self.services = services.to_vec();
        self
    }

    pub fn authenticated(mut self) -> Self {
        self.authenticated = true;
        self
    }

    pub fn licenses(mut self, licenses: &[HubLicense]) -> Self {
        self.licenses = licenses.to_vec();
        self
    }

    pub fn availability(mut self, availability: &[HubAvailability]) -> Self {
        self.availability = availability.to_vec();
        self
    }

    pub fn environments(mut self, environments: &[HubEnvironment]) -> Self {
        self.environments = environments.to_vec();
        self
    }

    pub fn privileges(mut self, privileges: &[&str]) -> Self {
        self.privileges = privileges.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn entity_configurable(mut self) -> Self {
        self.entity_configurable = true;
        self
    }

    pub fn entity_edit(mut self) -> Self {
        self.entity_edit = true;
        self
    }

    pub fn entity_owner(mut self) -> Self {
        self.entity_owner = true;
        self
    }

    pub fn assertions(mut self, assertions: Vec<PolicyAssertion>) -> Self {
        self.assertions = assertions;
        self
    }

    /// Feature flag forced on: availability and environment gating are lifted.
    pub fn flag_enabled(&self) -> bool {
        self.flag_value == Some(true)
    }
}

/// Who an entity grant applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollaborationType {
    User,
    Group,
    GroupAdmin,
    Org,
    OrgAdmin,
    Authenticated,
    Anonymous,
}

/// A grant attached to a specific entity instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityPermissionPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub permission: Permission,
    pub collaboration_type: CollaborationType,
    #[serde(default)]
    pub collaboration_id: String,
}

/// Outcome of a single rule fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyResponse {
    Granted,
    OrgMember,
    NotOrgMember,
    NotOrgAdmin,
    GroupMember,
    NotGroupMember,
    NotGroupAdmin,
    NotOwner,
    NotLicensed,
    NotLicensedAvailable,
    NotAvailable,
    NotGranted,
    NoEditAccess,
    NoOwner,
    InvalidPermission,
    InvalidCapability,
    PrivilegeRequired,
    SystemOffline,
    SystemMaintenance,
    NotAuthenticated,
    NotAlphaOrg,
    NotBetaOrg,
    DisabledByFeatureFlag,
    FeatureDisabled,
    AssertionPropertyNotFound,
    AssertionTypeMismatch,
    AssertionFailed,
    AssertionRequiresNumericValues,
    PropertyMissing,
    PropertyNotArray,
    ArrayContainsInvalidValue,
    ArrayMissingRequiredValue,
    NotInEnvironment,
    EntityRequired,
}

impl PolicyResponse {
    const ALL: [PolicyResponse; 34] = [
        PolicyResponse::Granted,
        PolicyResponse::OrgMember,
        PolicyResponse::NotOrgMember,
        PolicyResponse::NotOrgAdmin,
        PolicyResponse::GroupMember,
        PolicyResponse::NotGroupMember,
        PolicyResponse::NotGroupAdmin,
        PolicyResponse::NotOwner,
        PolicyResponse::NotLicensed,
        PolicyResponse::NotLicensedAvailable,
        PolicyResponse::NotAvailable,
        PolicyResponse::NotGranted,
        PolicyResponse::NoEditAccess,
        PolicyResponse::NoOwner,
        PolicyResponse::InvalidPermission,
        PolicyResponse::InvalidCapability,
        PolicyResponse::PrivilegeRequired,
        PolicyResponse::SystemOffline,
        PolicyResponse::SystemMaintenance,
        PolicyResponse::NotAuthenticated,
        PolicyResponse::NotAlphaOrg,
        PolicyResponse::NotBetaOrg,
        PolicyResponse::DisabledByFeatureFlag,
        PolicyResponse::FeatureDisabled,
        PolicyResponse::AssertionPropertyNotFound,
        PolicyResponse::AssertionTypeMismatch,
        PolicyResponse::AssertionFailed,
        PolicyResponse::AssertionRequiresNumericValues,
        PolicyResponse::PropertyMissing,
        PolicyResponse::PropertyNotArray,
        PolicyResponse::ArrayContainsInvalidValue,
        PolicyResponse::ArrayMissingRequiredValue,
        PolicyResponse::NotInEnvironment,
        PolicyResponse::EntityRequired,
    ];

    /// Stable code for the response (`PC100` for granted, sequential after).
    pub fn code(&self) -> String {
        let index = Self::ALL.iter().position(|r| r == self).unwrap_or(0);
        format!("PC{}", 100 + index)
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, PolicyResponse::Granted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyResponse::Granted => "granted",
            PolicyResponse::OrgMember => "org-member",
            PolicyResponse::NotOrgMember => "not-org-member",
            PolicyResponse::NotOrgAdmin => "not-org-admin",
            PolicyResponse::GroupMember => "group-member",
            PolicyResponse::NotGroupMember => "not-group-member",
            PolicyResponse::NotGroupAdmin => "not-group-admin",
            PolicyResponse::NotOwner => "not-owner",
            PolicyResponse::NotLicensed => "not-licensed",
            PolicyResponse::NotLicensedAvailable => "not-licensed-available",
            PolicyResponse::NotAvailable => "not-available",
            PolicyResponse::NotGranted => "not-granted",
            PolicyResponse::NoEditAccess => "no-edit-access",
            PolicyResponse::NoOwner => "no-owner",
            PolicyResponse::InvalidPermission => "invalid-permission",
            PolicyResponse::InvalidCapability => "invalid-capability",
            PolicyResponse::PrivilegeRequired => "privilege-required",
            PolicyResponse::SystemOffline => "system-offline",
            PolicyResponse::SystemMaintenance => "system-maintenance",
            PolicyResponse::NotAuthenticated => "not-authenticated",
            PolicyResponse::NotAlphaOrg => "not-alpha-org",
            PolicyResponse::NotBetaOrg => "not-beta-org",
            PolicyResponse::DisabledByFeatureFlag => "disabled-by-feature-flag",
            PolicyResponse::FeatureDisabled => "feature-disabled",
            PolicyResponse::AssertionPropertyNotFound => "assertion-property-not-found",
            PolicyResponse::AssertionTypeMismatch => "assertion-type-mismatch",
            PolicyResponse::AssertionFailed => "assertion-failed",
            PolicyResponse::AssertionRequiresNumericValues => "assertion-requires-numeric-values",
            PolicyResponse::PropertyMissing => "property-missing",
            PolicyResponse::PropertyNotArray => "property-not-array",
            PolicyResponse::ArrayContainsInvalidValue => "array-contains-invalid-value",
            PolicyResponse::ArrayMissingRequiredValue => "array-missing-required-value",
            PolicyResponse::NotInEnvironment => "not-in-environment",
            PolicyResponse::EntityRequired => "entity-required",
        }
    }
}

impl fmt::Display for PolicyResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of evaluating one rule fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyCheck {
    pub name: String,
    pub permission: Permission,
    pub value: String,
    pub code: String,
    pub response: PolicyResponse,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl PolicyCheck {
    pub fn new(
        name: impl Into<String>,
        permission: &Permission,
        value: impl Into<String>,
        response: PolicyResponse,
    ) -> Self {
        Self {
            name: name.into(),
            permission: permission.clone(),
            value: value.into(),
            code: response.code(),
            response,
            data: None,
        }
    }

    /// Build a check that is granted when `ok` holds, else carries `denied`.
    pub fn outcome(
        name: impl Into<String>,
        permission: &Permission,
        value: impl Into<String>,
        ok: bool,
        denied: PolicyResponse,
    ) -> Self {
        let response = if ok { PolicyResponse::Granted } else { denied };
        Self::new(name, permission, value, response)
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Aggregate decision for one permission check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionAccessResponse {
    pub policy: Permission,
    pub access: bool,
    pub response: PolicyResponse,
    pub code: String,
    pub checks: Vec<PolicyCheck>,
}

impl PermissionAccessResponse {
    /// Granted decision with no checks yet.
    pub fn granted(policy: &Permission) -> Self {
        Self {
            policy: policy.clone(),
            access: true,
            response: PolicyResponse::Granted,
            code: PolicyResponse::Granted.code(),
            checks: Vec::new(),
        }
    }

    /// Denied decision with the given response.
    pub fn denied(policy: &Permission, response: PolicyResponse) -> Self {
        Self {
            policy: policy.clone(),
            access: false,
            response,
            code: response.code(),
            checks: Vec::new(),
        }
    }

    /// Set the terminal response unless one is already set.
    pub(crate) fn deny_once(&mut self, response: PolicyResponse) {
        if self.response.is_granted() && !response.is_granted() {
            self.response = response;
            self.code = response.code();
            self.access = false;
        }
    }
}

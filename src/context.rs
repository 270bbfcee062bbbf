//! Ambient platform context: who is signed in, which org/portal they belong
//! to, the org's Hub license, runtime environment, feature flags and backend
//! service health.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::fmt;

use crate::portal::HubRequestOptions;
use crate::util::get_bool;

const DEFAULT_PORTAL_URL: &str = "https://www.arcgis.com";
const DEFAULT_HUB_URL: &str = "https://hub.arcgis.com";

/// Hub license tier of the current org.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HubLicense {
    HubBasic,
    HubPremium,
    EnterpriseSites,
}

impl fmt::Display for HubLicense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HubLicense::HubBasic => write!(f, "hub-basic"),
            HubLicense::HubPremium => write!(f, "hub-premium"),
            HubLicense::EnterpriseSites => write!(f, "enterprise-sites"),
        }
    }
}

/// Hub run-time environments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HubEnvironment {
    Devext,
    Qaext,
    Production,
    Enterprise,
    EnterpriseK8s,
}

impl HubEnvironment {
    /// Infer the environment from the portal URL.
    pub fn from_portal_url(url: &str) -> Self {
        let url = url.to_lowercase();
        if url.contains("devext.arcgis.com") {
            HubEnvironment::Devext
        } else if url.contains("qaext.arcgis.com") {
            HubEnvironment::Qaext
        } else if url.contains("arcgis.com") {
            HubEnvironment::Production
        } else {
            HubEnvironment::Enterprise
        }
    }
}

impl fmt::Display for HubEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HubEnvironment::Devext => write!(f, "devext"),
            HubEnvironment::Qaext => write!(f, "qaext"),
            HubEnvironment::Production => write!(f, "production"),
            HubEnvironment::Enterprise => write!(f, "enterprise"),
            HubEnvironment::EnterpriseK8s => write!(f, "enterprise-k8s"),
        }
    }
}

/// Backend services a permission may depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HubService {
    Portal,
    Discussions,
    Events,
    Metrics,
    Notifications,
    HubSearch,
    Domains,
}

/// Reported health of a backend service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    Online,
    Offline,
    Maintenance,
}

/// Group membership as reported on `user.groups[].userMembership`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMembership {
    #[serde(default)]
    pub member_type: String,
}

/// A group the current user belongs to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserGroup {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub user_membership: UserMembership,
}

/// Portal user record (subset of the sharing API `IUser`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalUser {
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub org_id: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub role_id: Option<String>,
    #[serde(default)]
    pub privileges: Vec<String>,
    #[serde(default)]
    pub groups: Vec<UserGroup>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub access: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub created: Option<i64>,
    #[serde(default)]
    pub modified: Option<i64>,
}

impl PortalUser {
    /// Membership type (`owner`, `admin`, `member`) in a group, if any.
    pub fn membership_in(&self, group_id: &str) -> Option<&str> {
        self.groups
            .iter()
            .find(|g| g.id == group_id)
            .map(|g| g.user_membership.member_type.as_str())
    }

    /// Org administrators carry the default admin role without a custom role id.
    pub fn is_org_admin(&self) -> bool {
        self.role.as_deref() == Some("org_admin") && self.role_id.is_none()
    }
}

/// Portal self record (subset of `IPortal`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalSelf {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url_key: Option<String>,
    #[serde(default)]
    pub is_portal: bool,
    #[serde(default)]
    pub portal_hostname: Option<String>,
    #[serde(default)]
    pub custom_base_url: Option<String>,
    #[serde(default)]
    pub portal_properties: Value,
}

/// Options used to construct an [`ArcGISContext`].
#[derive(Debug, Clone, Default)]
pub struct ArcGISContextOptions {
    pub id: u64,
    pub portal_url: Option<String>,
    pub hub_url: Option<String>,
    pub token: Option<String>,
    pub portal_self: Option<PortalSelf>,
    pub current_user: Option<PortalUser>,
    pub properties: Map<String, Value>,
    pub service_status: HashMap<HubService, ServiceState>,
    pub feature_flags: HashMap<String, bool>,
    pub trusted_org_ids: Vec<String>,
    pub environment: Option<HubEnvironment>,
}

/// Read-only view of the platform the caller is working against.
#[derive(Debug, Clone)]
pub struct ArcGISContext {
    pub id: u64,
    portal_url: String,
    hub_url: String,
    token: Option<String>,
    portal_self: Option<PortalSelf>,
    current_user: Option<PortalUser>,
    properties: Map<String, Value>,
    service_status: HashMap<HubService, ServiceState>,
    feature_flags: HashMap<String, bool>,
    trusted_org_ids: Vec<String>,
    environment: Option<HubEnvironment>,
}

impl Default for ArcGISContext {
    /// Anonymous context pointing at ArcGIS Online production.
    fn default() -> Self {
        Self::new(ArcGISContextOptions::default())
    }
}

impl ArcGISContext {
    pub fn new(opts: ArcGISContextOptions) -> Self {
        Self {
            id: opts.id,
            portal_url: opts
                .portal_url
                .unwrap_or_else(|| DEFAULT_PORTAL_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            hub_url: opts
                .hub_url
                .unwrap_or_else(|| DEFAULT_HUB_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            token: opts.token,
            portal_self: opts.portal_self,
            current_user: opts.current_user,
            properties: opts.properties,
            service_status: opts.service_status,
            feature_flags: opts.feature_flags,
            trusted_org_ids: opts.trusted_org_ids,
            environment: opts.environment,
        }
    }

    /// A session exists when we hold a token.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn current_user(&self) -> Option<&PortalUser> {
        self.current_user.as_ref()
    }

    pub fn portal(&self) -> Option<&PortalSelf> {
        self.portal_self.as_ref()
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    pub fn feature_flags(&self) -> &HashMap<String, bool> {
        &self.feature_flags
    }

    pub fn trusted_org_ids(&self) -> &[String] {
        &self.trusted_org_ids
    }

    /// Health of a service; services without a reported state count as online.
    pub fn service_state(&self, service: HubService) -> ServiceState {
        self.service_status
            .get(&service)
            .copied()
            .unwrap_or(ServiceState::Online)
    }

    fn org_listed(&self, key: &str) -> bool {
        let Some(org_id) = self.portal_self.as_ref().map(|p| p.id.as_str()) else {
            return false;
        };
        self.properties
            .get(key)
            .and_then(|v| v.as_array())
            .is_some_and(|orgs| orgs.iter().any(|o| o.as_str() == Some(org_id)))
    }

    /// Is the current org in the `alphaOrgs` property list?
    pub fn is_alpha_org(&self) -> bool {
        self.org_listed("alphaOrgs")
    }

    /// Is the current org in the `betaOrgs` property list?
    pub fn is_beta_org(&self) -> bool {
        self.org_listed("betaOrgs")
    }

    pub fn environment(&self) -> HubEnvironment {
        self.environment
            .unwrap_or_else(|| HubEnvironment::from_portal_url(&self.portal_url))
    }

    pub fn is_portal(&self) -> bool {
        match &self.portal_self {
            Some(p) => p.is_portal,
            None => !self.portal_url.contains("arcgis.com"),
        }
    }

    pub fn hub_enabled(&self) -> bool {
        self.portal_self
            .as_ref()
            .is_some_and(|p| get_bool(&p.portal_properties, "hub.enabled"))
    }

    pub fn hub_license(&self) -> HubLicense {
        if self.is_portal() {
            HubLicense::EnterpriseSites
        } else if self.hub_enabled() {
            HubLicense::HubPremium
        } else {
            HubLicense::HubBasic
        }
    }

    /// Org-specific portal URL when signed in, the configured URL otherwise.
    pub fn portal_url(&self) -> String {
        match (&self.portal_self, self.is_authenticated()) {
            (Some(p), true) => match (&p.url_key, &p.custom_base_url) {
                (Some(key), Some(base)) if !self.is_portal() => format!("https://{}.{}", key, base),
                _ => match &p.portal_hostname {
                    Some(host) => format!("https://{}", host),
                    None => self.portal_url.clone(),
                },
            },
            _ => self.portal_url.clone(),
        }
    }

    pub fn sharing_api_url(&self) -> String {
        format!("{}/sharing/rest", self.portal_url())
    }

    pub fn hub_url(&self) -> &str {
        &self.hub_url
    }

    /// Org-specific Hub home; `None` on Enterprise.
    pub fn hub_home_url(&self) -> Option<String> {
        if self.is_portal() {
            return None;
        }
        match (&self.portal_self, self.is_authenticated()) {
            (Some(p), true) => {
                let host = self.hub_url.trim_start_matches("https://");
                p.url_key
                    .as_ref()
                    .map(|key| format!("https://{}.{}", key, host))
            }
            _ => Some(self.hub_url.clone()),
        }
    }

    /// Request options handed to the search layer.
    pub fn hub_request_options(&self) -> HubRequestOptions {
        HubRequestOptions {
            portal: self.sharing_api_url(),
            token: self.token.clone(),
            hub_api_url: Some(self.hub_url.clone()),
            is_portal: self.is_portal(),
        }
    }

    /// JSON view of the context used when resolving `context:` assertion paths.
    pub fn to_value(&self) -> Value {
        json!({
            "id": self.id,
            "isAuthenticated": self.is_authenticated(),
            "isPortal": self.is_portal(),
            "isAlphaOrg": self.is_alpha_org(),
            "isBetaOrg": self.is_beta_org(),
            "hubLicense": self.hub_license(),
            "environment": self.environment(),
            "portalUrl": self.portal_url(),
            "hubUrl": self.hub_url,
            "currentUser": self.current_user,
            "portal": self.portal_self,
            "properties": self.properties,
            "trustedOrgIds": self.trusted_org_ids,
        })
    }
}

//! Configuration parsing for hub.toml files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::context::{ArcGISContext, ArcGISContextOptions, HubEnvironment, HubService, ServiceState};

/// Environment variable that points at an explicit config file.
pub const CONFIG_ENV: &str = "ARCGIS_HUB_CONFIG";

/// Root configuration structure matching the hub.toml schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub portal: PortalConfig,
    #[serde(default)]
    pub hub: HubConfig,
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub feature_flags: HashMap<String, bool>,
    /// Service health keyed by service name (`portal`, `discussions`, ...).
    #[serde(default)]
    pub services: HashMap<String, ServiceState>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    #[serde(default = "default_portal_url")]
    pub url: String,
    pub token: Option<String>,
    /// Path to a JSON file holding the portal self response.
    pub portal_self: Option<PathBuf>,
    /// Path to a JSON file holding the signed-in user.
    pub user: Option<PathBuf>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            url: default_portal_url(),
            token: None,
            portal_self: None,
            user: None,
        }
    }
}

fn default_portal_url() -> String {
    "https://www.arcgis.com".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    #[serde(default = "default_hub_url")]
    pub url: String,
    /// OGC collection url used by the `arcgis-hub` search backend.
    /// Defaults to the `all` collection under `{url}/api/search/v1`.
    pub search_api_url: Option<String>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            url: default_hub_url(),
            search_api_url: None,
        }
    }
}

fn default_hub_url() -> String {
    "https://hub.arcgis.com".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Force an environment instead of inferring it from the portal url.
    pub environment: Option<HubEnvironment>,
    #[serde(default)]
    pub alpha_orgs: Vec<String>,
    #[serde(default)]
    pub beta_orgs: Vec<String>,
    #[serde(default)]
    pub trusted_org_ids: Vec<String>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config = Self::from_str(&content)?;
        // Referenced JSON files are relative to the config file.
        if let Some(dir) = path.parent() {
            config.portal.portal_self = config.portal.portal_self.map(|p| dir.join(p));
            config.portal.user = config.portal.user.map(|p| dir.join(p));
        }
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// Default config location: `$ARCGIS_HUB_CONFIG` or `<config_dir>/arcgis-hub/hub.toml`.
    pub fn default_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|d| d.join("arcgis-hub").join("hub.toml"))
    }

    /// Load from an explicit path, the default location, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn search_api_url(&self) -> String {
        self.hub
            .search_api_url
            .clone()
            .unwrap_or_else(|| {
                format!(
                    "{}/api/search/v1/collections/all",
                    self.hub.url.trim_end_matches('/')
                )
            })
    }

    /// Build the runtime context described by this configuration.
    pub fn to_context(&self) -> Result<ArcGISContext> {
        let portal_self = match &self.portal.portal_self {
            Some(path) => Some(read_json(path).context("Failed to load portal self")?),
            None => None,
        };
        let current_user = match &self.portal.user {
            Some(path) => Some(read_json(path).context("Failed to load portal user")?),
            None => None,
        };

        let mut service_status = HashMap::new();
        for (name, state) in &self.services {
            let service: HubService = serde_json::from_value(Value::String(name.clone()))
                .with_context(|| format!("Unknown service in [services]: {}", name))?;
            service_status.insert(service, *state);
        }

        let mut properties = Map::new();
        properties.insert("alphaOrgs".to_string(), Value::from(self.context.alpha_orgs.clone()));
        properties.insert("betaOrgs".to_string(), Value::from(self.context.beta_orgs.clone()));

        Ok(ArcGISContext::new(ArcGISContextOptions {
            id: 0,
            portal_url: Some(self.portal.url.clone()),
            hub_url: Some(self.hub.url.clone()),
            token: self.portal.token.clone(),
            portal_self,
            current_user,
            properties,
            service_status,
            feature_flags: self.feature_flags.clone(),
            trusted_org_ids: self.context.trusted_org_ids.clone(),
            environment: self.context.environment,
        }))
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

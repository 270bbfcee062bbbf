use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::HubRequestOptions;
use super::types::{PortalGroup, PortalItem, PortalSearchResponse};
use crate::error::{Error, Result, error_from_portal_body, error_from_status};

const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_PORTAL: &str = "https://www.arcgis.com/sharing/rest";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Builder for constructing a [`PortalClient`].
pub struct PortalClientBuilder {
    portal: String,
    token: Option<String>,
    timeout: Duration,
}

impl PortalClientBuilder {
    /// Set the sharing API url (`https://org.maps.arcgis.com/sharing/rest`).
    pub fn portal(mut self, url: impl Into<String>) -> Self {
        self.portal = url.into();
        self
    }

    /// Set the token appended to every request.
    pub fn token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<PortalClient> {
        let mut headers = HeaderMap::new();
        if let Ok(agent) = HeaderValue::from_str(&format!("arcgis-hub-rust/{CLIENT_VERSION}")) {
            headers.insert(USER_AGENT, agent);
        }
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(self.timeout)
            .build()?;
        Ok(PortalClient {
            portal: self.portal.trim_end_matches('/').to_string(),
            token: self.token,
            http,
        })
    }
}

/// Thin client for the Portal sharing REST API.
#[derive(Clone)]
pub struct PortalClient {
    portal: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl PortalClient {
    /// Create a new builder with defaults resolved from env vars.
    pub fn builder() -> PortalClientBuilder {
        PortalClientBuilder {
            portal: std::env::var("ARCGIS_PORTAL_URL")
                .unwrap_or_else(|_| DEFAULT_PORTAL.to_string()),
            token: std::env::var("ARCGIS_TOKEN").ok(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Client bound to the portal and token of a set of request options.
    pub fn from_request_options(options: &HubRequestOptions) -> Result<Self> {
        Self::builder()
            .portal(options.portal.clone())
            .token(options.token.clone())
            .build()
    }

    pub fn portal(&self) -> &str {
        &self.portal
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// GET an absolute url and decode the JSON body.
    pub async fn get_url(&self, url: &str, params: &[(&str, String)]) -> Result<Value> {
        debug!(url, "GET");
        let response = self.http.get(url).query(params).send().await?;
        Self::decode(response).await
    }

    /// GET a sharing API path with `f=json` and the token applied.
    pub async fn get(&self, path: &str, params: &[(&str, String)]) -> Result<Value> {
        let url = format!("{}/{}", self.portal, path.trim_start_matches('/'));
        let params = self.with_defaults(params);
        self.get_url(&url, &params).await
    }

    /// POST a form to a sharing API path.
    pub async fn post(&self, path: &str, params: &[(&str, String)]) -> Result<Value> {
        let url = format!("{}/{}", self.portal, path.trim_start_matches('/'));
        debug!(url = %url, "POST");
        let response = self
            .http
            .post(&url)
            .form(&self.with_defaults(params))
            .send()
            .await?;
        Self::decode(response).await
    }

    fn with_defaults<'a>(&self, params: &[(&'a str, String)]) -> Vec<(&'a str, String)> {
        let mut all = params.to_vec();
        all.push(("f", "json".to_string()));
        if let Some(token) = &self.token {
            all.push(("token", token.clone()));
        }
        all
    }

    async fn decode(response: reqwest::Response) -> Result<Value> {
        let status = response.status().as_u16();
        let text = response.text().await?;
        if status >= 400 {
            return Err(error_from_status(status, &text));
        }
        let body: Value = serde_json::from_str(&text)?;
        // Sharing API failures usually arrive as 200 with an `error` object.
        if let Some(err) = error_from_portal_body(&body) {
            return Err(err);
        }
        Ok(body)
    }

    pub async fn get_item(&self, id: &str) -> Result<PortalItem> {
        let body = self.get(&format!("content/items/{id}"), &[]).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Item data resource. Items without data resolve to `None`.
    pub async fn get_item_data(&self, id: &str) -> Result<Option<Value>> {
        match self.get(&format!("content/items/{id}/data"), &[]).await {
            Ok(Value::Null) => Ok(None),
            Ok(data) => Ok(Some(data)),
            Err(Error::Json(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn get_group(&self, id: &str) -> Result<PortalGroup> {
        let body = self.get(&format!("community/groups/{id}"), &[]).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Item search (`/search`).
    pub async fn search_items(&self, params: &[(&str, String)]) -> Result<PortalSearchResponse> {
        let body = self.get("search", params).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Group search (`/community/groups`).
    pub async fn search_groups(&self, params: &[(&str, String)]) -> Result<PortalSearchResponse> {
        let body = self.get("community/groups", params).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// User search within the current org (`/portals/self/users/search`).
    pub async fn search_users(&self, params: &[(&str, String)]) -> Result<PortalSearchResponse> {
        let body = self.get("portals/self/users/search", params).await?;
        Ok(serde_json::from_value(body)?)
    }

    pub async fn remove_item(&self, id: &str, owner: &str) -> Result<()> {
        self.post(&format!("content/users/{owner}/items/{id}/delete"), &[])
            .await?;
        Ok(())
    }

    pub async fn remove_group(&self, id: &str) -> Result<()> {
        self.post(&format!("community/groups/{id}/delete"), &[]).await?;
        Ok(())
    }
}

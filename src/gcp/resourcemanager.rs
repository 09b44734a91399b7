//! Cloud Resource Manager API (v1)
//!
//! Only organization search is bound; it is the cheapest call that still
//! exercises the caller's org-level visibility.

use super::client::{parse_base_url, GcpClient};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

pub const RESOURCE_MANAGER_BASE_URL: &str = "https://cloudresourcemanager.googleapis.com/";

/// Body of `organizations:search`. All fields optional; the default
/// request searches every organization visible to the caller.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOrganizationsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

/// Organization information
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    /// Resource name, e.g. `organizations/1234`
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default = "unknown_state")]
    pub lifecycle_state: String,
    #[serde(default)]
    pub creation_time: Option<String>,
}

fn unknown_state() -> String {
    "UNKNOWN".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOrganizationsResponse {
    #[serde(default)]
    pub organizations: Vec<Organization>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Cloud Resource Manager service client
#[derive(Clone)]
pub struct ResourceManagerService {
    client: GcpClient,
    base_url: Url,
    pub user_agent: String,
}

impl ResourceManagerService {
    /// Create a client bound to `base_url` (e.g. [`RESOURCE_MANAGER_BASE_URL`])
    pub fn with_base_url(client: GcpClient, base_url: &str, user_agent: &str) -> Result<Self> {
        Ok(Self {
            client,
            base_url: parse_base_url(base_url)?,
            user_agent: user_agent.to_string(),
        })
    }

    /// Search organizations visible to the caller
    pub async fn search_organizations(
        &self,
        request: &SearchOrganizationsRequest,
    ) -> Result<SearchOrganizationsResponse> {
        let url = self
            .base_url
            .join("v1/organizations:search")
            .context("Failed to build organizations search URL")?;

        let response: SearchOrganizationsResponse =
            self.client.post(url.as_str(), &self.user_agent, request).await?;
        tracing::debug!("Found {} organizations", response.organizations.len());
        Ok(response)
    }
}

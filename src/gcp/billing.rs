//! Cloud Billing API (v1)

use super::client::{parse_base_url, GcpClient};
use anyhow::{Context, Result};
use serde::Deserialize;
use url::Url;

pub const BILLING_BASE_URL: &str = "https://cloudbilling.googleapis.com/";

/// A billing account visible to the caller
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingAccount {
    /// Resource name, e.g. `billingAccounts/012345-567890-ABCDEF`
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub open: bool,
    /// Set for subaccounts of a reseller parent
    #[serde(default)]
    pub master_billing_account: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBillingAccountsResponse {
    #[serde(default)]
    pub billing_accounts: Vec<BillingAccount>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Cloud Billing service client
#[derive(Clone)]
pub struct BillingService {
    client: GcpClient,
    base_url: Url,
    pub user_agent: String,
}

impl BillingService {
    /// Create a client bound to `base_url` (e.g. [`BILLING_BASE_URL`])
    pub fn with_base_url(client: GcpClient, base_url: &str, user_agent: &str) -> Result<Self> {
        Ok(Self {
            client,
            base_url: parse_base_url(base_url)?,
            user_agent: user_agent.to_string(),
        })
    }

    /// List the billing accounts the caller has permission to view (first page)
    pub async fn list_billing_accounts(&self) -> Result<ListBillingAccountsResponse> {
        let url = self
            .base_url
            .join("v1/billingAccounts")
            .context("Failed to build billing accounts URL")?;

        let response: ListBillingAccountsResponse =
            self.client.get(url.as_str(), &self.user_agent).await?;
        tracing::debug!(
            "Listed {} billing accounts",
            response.billing_accounts.len()
        );
        Ok(response)
    }
}

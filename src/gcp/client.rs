//! GCP Client
//!
//! Combines the resolved credentials with the HTTP client so that API
//! bindings only deal in URLs and payloads.

use super::auth::GcpCredentials;
use super::http::GcpHttpClient;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Project homepage advertised in the User-Agent
const HOMEPAGE: &str = env!("CARGO_PKG_REPOSITORY");

/// Build the User-Agent sent with every API request:
/// `gcpcheck/<build version> (+<homepage>) <crate>/<crate version>`
pub fn user_agent_string() -> String {
    let tool_version = format!("gcpcheck/{}", crate::VERSION);
    let website = format!("(+{})", HOMEPAGE);
    let crate_version = format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    format!("{} {} {}", tool_version, website, crate_version)
}

/// Authenticated GCP client
#[derive(Clone)]
pub struct GcpClient {
    pub credentials: GcpCredentials,
    pub http: GcpHttpClient,
}

impl GcpClient {
    /// Create a new client around already-resolved credentials
    pub fn new(credentials: GcpCredentials, user_agent: &str) -> Result<Self> {
        let http = GcpHttpClient::new(user_agent)?;
        Ok(Self { credentials, http })
    }

    /// Get the current access token
    pub async fn get_token(&self) -> Result<String> {
        self.credentials
            .get_token()
            .await
            .context("Failed to obtain access token")
    }

    /// Make a GET request to a GCP API
    pub async fn get<T: DeserializeOwned>(&self, url: &str, user_agent: &str) -> Result<T> {
        let token = self.get_token().await?;
        self.http.get(url, &token, user_agent).await
    }

    /// Make a POST request to a GCP API
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        user_agent: &str,
        body: &B,
    ) -> Result<T> {
        let token = self.get_token().await?;
        self.http.post(url, &token, user_agent, body).await
    }
}

/// Parse an API base URL, normalizing it to end with `/` so relative paths
/// join beneath it instead of replacing its last segment
pub(crate) fn parse_base_url(base: &str) -> Result<url::Url> {
    let normalized = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{}/", base)
    };
    url::Url::parse(&normalized).with_context(|| format!("Invalid API base URL '{}'", base))
}

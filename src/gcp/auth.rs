//! GCP Authentication
//!
//! Resolves a token source from the configured credential material: a static
//! access token, credentials JSON (service account or authorized user), or
//! Application Default Credentials discovered from the environment.

use super::pathorcontents;
use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use gcp_auth::{CustomServiceAccount, TokenProvider};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Default scopes requested when none are configured
pub const DEFAULT_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/compute",
    "https://www.googleapis.com/auth/cloud-platform",
    "https://www.googleapis.com/auth/ndev.clouddns.readwrite",
    "https://www.googleapis.com/auth/devstorage.full_control",
];

/// Google OAuth token endpoint used for refresh-token grants
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Token expiry buffer - refresh tokens this much before they actually expire
/// This prevents using tokens that are about to expire during a request
const TOKEN_EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// Default token TTL when the token endpoint omits `expires_in`
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// Upper bound on a reported token lifetime; Google issues tokens for an hour
const MAX_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Where credentials come from, in priority order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Access token, as a literal or a path to a file holding one
    StaticToken(String),
    /// Credentials JSON, as literal contents or a path to a key file
    CredentialsJson(String),
    /// Application Default Credentials
    AmbientDefault,
}

/// A resolved token issuer
#[derive(Clone)]
pub enum TokenSource {
    /// Fixed token, never refreshed
    Static(String),
    ServiceAccount(Arc<CustomServiceAccount>),
    AuthorizedUser(Arc<AuthorizedUser>),
    AmbientDefault(Arc<dyn TokenProvider>),
}

impl TokenSource {
    /// Short name of the strategy, safe to log
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Static(_) => "access_token",
            Self::ServiceAccount(_) => "service_account",
            Self::AuthorizedUser(_) => "authorized_user",
            Self::AmbientDefault(_) => "application_default",
        }
    }
}

impl fmt::Debug for TokenSource {
    // Token material stays out of debug output
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TokenSource").field(&self.kind()).finish()
    }
}

/// GCP credentials: a token source bound to the scopes it was resolved for
#[derive(Debug, Clone)]
pub struct GcpCredentials {
    source: TokenSource,
    scopes: Vec<String>,
}

impl GcpCredentials {
    /// Resolve a token source for `source`, scoped to `scopes`
    pub async fn resolve(source: &CredentialSource, scopes: &[String]) -> Result<Self> {
        let token_source = match source {
            CredentialSource::StaticToken(value) => {
                let (contents, from_file) = pathorcontents::read(value)
                    .map_err(|e| anyhow!("Error loading access token: {e:#}"))?;
                // A trailing newline from a token file is not a valid header byte
                let token = if from_file {
                    contents.trim().to_string()
                } else {
                    contents
                };

                tracing::info!("Authenticating using configured Google JSON 'access_token'...");
                tracing::info!("  -- Scopes: {:?}", scopes);
                TokenSource::Static(token)
            }
            CredentialSource::CredentialsJson(value) => {
                let (contents, _) = pathorcontents::read(value)
                    .map_err(|e| anyhow!("Error loading credentials: {e:#}"))?;
                let token_source = parse_credentials_json(&contents)
                    .map_err(|e| anyhow!("Unable to parse credentials: {e:#}"))?;

                tracing::info!("Authenticating using configured Google JSON 'credentials'...");
                tracing::info!("  -- Scopes: {:?}", scopes);
                token_source
            }
            CredentialSource::AmbientDefault => {
                tracing::info!("Authenticating using DefaultClient...");
                tracing::info!("  -- Scopes: {:?}", scopes);
                let provider = gcp_auth::provider().await.context(
                    "Failed to find default credentials. Run 'gcloud auth application-default login'",
                )?;
                TokenSource::AmbientDefault(provider)
            }
        };

        Ok(Self {
            source: token_source,
            scopes: scopes.to_vec(),
        })
    }

    pub fn token_source(&self) -> &TokenSource {
        &self.source
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Get an access token for API calls
    pub async fn get_token(&self) -> Result<String> {
        let scopes: Vec<&str> = self.scopes.iter().map(String::as_str).collect();

        match &self.source {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::ServiceAccount(account) => {
                let token = account
                    .token(&scopes)
                    .await
                    .context("Failed to get service account access token")?;
                Ok(token.as_str().to_string())
            }
            TokenSource::AuthorizedUser(user) => user.token().await,
            TokenSource::AmbientDefault(provider) => {
                let token = provider
                    .token(&scopes)
                    .await
                    .context("Failed to get access token")?;
                Ok(token.as_str().to_string())
            }
        }
    }
}

#[derive(Deserialize)]
struct CredentialsType {
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// Parse credentials JSON into a refreshing token source
fn parse_credentials_json(contents: &str) -> Result<TokenSource> {
    let header: CredentialsType =
        serde_json::from_str(contents).context("Credentials are not valid JSON")?;

    match header.kind.as_deref() {
        Some("service_account") => {
            let account = CustomServiceAccount::from_json(contents)
                .context("Invalid service account key")?;
            Ok(TokenSource::ServiceAccount(Arc::new(account)))
        }
        Some("authorized_user") => {
            let user = AuthorizedUser::from_json(contents)?;
            Ok(TokenSource::AuthorizedUser(Arc::new(user)))
        }
        Some(other) => bail!("unsupported credentials type '{}'", other),
        None => bail!("missing 'type' field"),
    }
}

#[derive(Deserialize)]
struct AuthorizedUserKey {
    client_id: String,
    client_secret: String,
    refresh_token: String,
    #[serde(default)]
    token_uri: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Token lifetime from `expires_in`, clamped so it always fits an `Instant`
fn token_ttl(expires_in: Option<u64>) -> Duration {
    expires_in
        .map_or(DEFAULT_TOKEN_TTL, Duration::from_secs)
        .min(MAX_TOKEN_TTL)
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    /// When this token expires (with buffer applied)
    expires_at: Instant,
}

impl CachedToken {
    /// Check if this cached token is still valid
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// End-user credentials (`gcloud auth application-default login` output)
/// refreshed through the OAuth refresh-token grant
pub struct AuthorizedUser {
    key: AuthorizedUserKey,
    http: reqwest::Client,
    token_cache: RwLock<Option<CachedToken>>,
}

impl AuthorizedUser {
    fn from_json(contents: &str) -> Result<Self> {
        let key: AuthorizedUserKey =
            serde_json::from_str(contents).context("Invalid authorized user credentials")?;

        let http = reqwest::Client::builder()
            .timeout(super::http::REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            key,
            http,
            token_cache: RwLock::new(None),
        })
    }

    fn token_uri(&self) -> &str {
        self.key.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI)
    }

    /// Get an access token, refreshing it when the cached one is near expiry
    pub async fn token(&self) -> Result<String> {
        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.token.clone());
                }
                tracing::debug!("Cached token expired, fetching new token");
            }
        }

        let response = self
            .http
            .post(self.token_uri())
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", self.key.client_id.as_str()),
                ("client_secret", self.key.client_secret.as_str()),
                ("refresh_token", self.key.refresh_token.as_str()),
            ])
            .send()
            .await
            .context("Failed to send token refresh request")?;

        let status = response.status();
        if !status.is_success() {
            bail!("Token refresh failed: {}", status);
        }

        let token: TokenResponse = response
            .json()
            .await
            .context("Failed to parse token response")?;

        let ttl = token_ttl(token.expires_in);
        let expires_at = Instant::now() + ttl.saturating_sub(TOKEN_EXPIRY_BUFFER);

        if let Ok(delta) = chrono::Duration::from_std(ttl) {
            tracing::debug!("Refreshed user token, expires at {}", Utc::now() + delta);
        }

        {
            let mut cache = self.token_cache.write().await;
            *cache = Some(CachedToken {
                token: token.access_token.clone(),
                expires_at,
            });
        }

        Ok(token.access_token)
    }
}

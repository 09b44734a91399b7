//! Configuration Management
//!
//! Credential settings come from the environment only. Loading never fails;
//! validation resolves credentials and builds the API clients.

use crate::gcp::auth::{CredentialSource, GcpCredentials, DEFAULT_SCOPES};
use crate::gcp::billing::{BillingService, BILLING_BASE_URL};
use crate::gcp::client::{user_agent_string, GcpClient};
use crate::gcp::resourcemanager::{ResourceManagerService, RESOURCE_MANAGER_BASE_URL};
use anyhow::Result;

/// Credential variables, highest priority first
pub const CREDENTIALS_ENV_VARS: &[&str] = &[
    "GOOGLE_CREDENTIALS",
    "GOOGLE_CLOUD_KEYFILE_JSON",
    "GOOGLE_KEYFILE_JSON",
];

pub const ACCESS_TOKEN_ENV_VAR: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// Endpoint overrides, for private access or emulators
pub const BILLING_ENDPOINT_ENV_VAR: &str = "GOOGLE_BILLING_CUSTOM_ENDPOINT";
pub const RESOURCE_MANAGER_ENDPOINT_ENV_VAR: &str = "GOOGLE_RESOURCE_MANAGER_CUSTOM_ENDPOINT";

/// Credential configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Credentials JSON, or a path to it
    pub credentials: String,
    /// OAuth access token, or a path to a file holding one
    pub access_token: String,
    /// OAuth scopes; defaults are applied during validation when empty
    pub scopes: Vec<String>,
}

/// API endpoints the clients are bound to
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub billing: String,
    pub resource_manager: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            billing: BILLING_BASE_URL.to_string(),
            resource_manager: RESOURCE_MANAGER_BASE_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// Default endpoints, overridden by the custom endpoint variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let pick = |key: &str, default: String| {
            lookup(key).filter(|v| !v.is_empty()).unwrap_or(default)
        };

        Self {
            billing: pick(BILLING_ENDPOINT_ENV_VAR, defaults.billing),
            resource_manager: pick(RESOURCE_MANAGER_ENDPOINT_ENV_VAR, defaults.resource_manager),
        }
    }
}

/// Everything built by a successful [`Config::load_and_validate`]
#[derive(Clone)]
pub struct Clients {
    pub credentials: GcpCredentials,
    pub user_agent: String,
    pub billing: BillingService,
    pub resource_manager: ResourceManagerService,
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let credentials = CREDENTIALS_ENV_VARS
            .iter()
            .find_map(|key| non_empty(*key))
            .unwrap_or_default();
        let access_token = non_empty(ACCESS_TOKEN_ENV_VAR).unwrap_or_default();

        Self {
            credentials,
            access_token,
            scopes: Vec::new(),
        }
    }

    /// Pick the credential strategy: access token, then credentials, then ADC
    pub fn credential_source(&self) -> CredentialSource {
        if !self.access_token.is_empty() {
            CredentialSource::StaticToken(self.access_token.clone())
        } else if !self.credentials.is_empty() {
            CredentialSource::CredentialsJson(self.credentials.clone())
        } else {
            CredentialSource::AmbientDefault
        }
    }

    /// Fill in the default scopes if none are configured
    pub fn apply_default_scopes(&mut self) {
        if self.scopes.is_empty() {
            self.scopes = DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect();
        }
    }

    /// Resolve credentials and build the API clients
    pub async fn load_and_validate(&mut self) -> Result<Clients> {
        self.load_and_validate_with(&Endpoints::default()).await
    }

    /// As [`Config::load_and_validate`], against explicit endpoints
    pub async fn load_and_validate_with(&mut self, endpoints: &Endpoints) -> Result<Clients> {
        self.apply_default_scopes();

        let credentials = GcpCredentials::resolve(&self.credential_source(), &self.scopes).await?;

        let user_agent = user_agent_string();
        let client = GcpClient::new(credentials.clone(), &user_agent)?;

        tracing::info!("Instantiating Google Cloud ResourceManager Client...");
        let resource_manager = ResourceManagerService::with_base_url(
            client.clone(),
            &endpoints.resource_manager,
            &user_agent,
        )?;

        tracing::info!("Instantiating Google Cloud Billing Client...");
        let billing = BillingService::with_base_url(client, &endpoints.billing, &user_agent)?;

        Ok(Clients {
            credentials,
            user_agent,
            billing,
            resource_manager,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gcp::auth::TokenSource;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_empty_environment() {
        let config = Config::from_lookup(lookup(&[]));
        assert_eq!(config.credentials, "");
        assert_eq!(config.access_token, "");
        assert!(config.scopes.is_empty());
        assert_eq!(config.credential_source(), CredentialSource::AmbientDefault);
    }

    #[test]
    fn test_google_credentials_wins() {
        let config = Config::from_lookup(lookup(&[
            ("GOOGLE_CREDENTIALS", "first"),
            ("GOOGLE_CLOUD_KEYFILE_JSON", "second"),
            ("GOOGLE_KEYFILE_JSON", "third"),
        ]));
        assert_eq!(config.credentials, "first");
    }

    #[test]
    fn test_fallback_order() {
        let config = Config::from_lookup(lookup(&[
            ("GOOGLE_CLOUD_KEYFILE_JSON", "second"),
            ("GOOGLE_KEYFILE_JSON", "third"),
        ]));
        assert_eq!(config.credentials, "second");

        let config = Config::from_lookup(lookup(&[("GOOGLE_KEYFILE_JSON", "third")]));
        assert_eq!(config.credentials, "third");
    }

    #[test]
    fn test_empty_value_falls_through() {
        let config = Config::from_lookup(lookup(&[
            ("GOOGLE_CREDENTIALS", ""),
            ("GOOGLE_CLOUD_KEYFILE_JSON", "second"),
        ]));
        assert_eq!(config.credentials, "second");
    }

    #[test]
    fn test_access_token_takes_priority() {
        let config = Config::from_lookup(lookup(&[
            ("GOOGLE_CREDENTIALS", "{}"),
            ("GOOGLE_OAUTH_ACCESS_TOKEN", "ya29.token"),
        ]));
        assert_eq!(
            config.credential_source(),
            CredentialSource::StaticToken("ya29.token".to_string())
        );
    }

    #[test]
    fn test_credentials_source() {
        let config = Config::from_lookup(lookup(&[("GOOGLE_CREDENTIALS", "{}")]));
        assert_eq!(
            config.credential_source(),
            CredentialSource::CredentialsJson("{}".to_string())
        );
    }

    #[test]
    fn test_default_endpoints() {
        let endpoints = Endpoints::from_lookup(lookup(&[]));
        assert_eq!(endpoints.billing, BILLING_BASE_URL);
        assert_eq!(endpoints.resource_manager, RESOURCE_MANAGER_BASE_URL);
    }

    #[test]
    fn test_custom_endpoints() {
        let endpoints = Endpoints::from_lookup(lookup(&[
            ("GOOGLE_BILLING_CUSTOM_ENDPOINT", "http://127.0.0.1:9000/"),
            ("GOOGLE_RESOURCE_MANAGER_CUSTOM_ENDPOINT", ""),
        ]));
        assert_eq!(endpoints.billing, "http://127.0.0.1:9000/");
        assert_eq!(endpoints.resource_manager, RESOURCE_MANAGER_BASE_URL);
    }

    #[test]
    fn test_default_scopes_applied() {
        let mut config = Config::default();
        config.apply_default_scopes();
        assert_eq!(config.scopes.len(), 4);
        assert_eq!(config.scopes[0], "https://www.googleapis.com/auth/compute");
    }

    #[test]
    fn test_configured_scopes_kept() {
        let mut config = Config {
            scopes: vec!["https://www.googleapis.com/auth/cloud-billing.readonly".to_string()],
            ..Config::default()
        };
        config.apply_default_scopes();
        assert_eq!(config.scopes.len(), 1);
    }

    #[tokio::test]
    async fn test_load_with_static_token() {
        let mut config = Config::from_lookup(lookup(&[
            ("GOOGLE_CREDENTIALS", "{not json"),
            ("GOOGLE_OAUTH_ACCESS_TOKEN", "ya29.token"),
        ]));
        let clients = config.load_and_validate().await.unwrap();

        assert_eq!(config.scopes.len(), 4);
        assert_eq!(clients.credentials.scopes(), config.scopes.as_slice());
        assert!(matches!(
            clients.credentials.token_source(),
            TokenSource::Static(t) if t == "ya29.token"
        ));
        assert_eq!(clients.billing.user_agent, clients.user_agent);
        assert_eq!(clients.resource_manager.user_agent, clients.user_agent);
    }

    #[tokio::test]
    async fn test_load_with_malformed_credentials_fails() {
        let mut config = Config::from_lookup(lookup(&[("GOOGLE_CREDENTIALS", "{not json")]));
        let err = config.load_and_validate().await.err().unwrap();
        assert!(err.to_string().starts_with("Unable to parse credentials"));
        // Scopes are applied before resolution even when it fails
        assert_eq!(config.scopes.len(), 4);
    }

    #[tokio::test]
    async fn test_load_with_bad_endpoint_fails() {
        let mut config = Config::from_lookup(lookup(&[("GOOGLE_OAUTH_ACCESS_TOKEN", "t")]));
        let endpoints = Endpoints {
            billing: "::bad::".to_string(),
            ..Endpoints::default()
        };
        assert!(config.load_and_validate_with(&endpoints).await.is_err());
    }

    #[test]
    #[serial]
    fn test_from_env() {
        for key in CREDENTIALS_ENV_VARS {
            std::env::remove_var(key);
        }
        std::env::set_var("GOOGLE_CLOUD_KEYFILE_JSON", "/tmp/key.json");
        std::env::set_var(ACCESS_TOKEN_ENV_VAR, "ya29.env");

        let config = Config::from_env();
        assert_eq!(config.credentials, "/tmp/key.json");
        assert_eq!(config.access_token, "ya29.env");

        std::env::remove_var("GOOGLE_CLOUD_KEYFILE_JSON");
        std::env::remove_var(ACCESS_TOKEN_ENV_VAR);
    }
}

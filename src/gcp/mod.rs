//! GCP API interaction module
//!
//! Credential resolution, the authenticated HTTP client, and the two REST
//! bindings used by the smoke test.
//!
//! # Module Structure
//!
//! - [`auth`] - Token source resolution (access token, credentials JSON, ADC)
//! - [`pathorcontents`] - Reads settings that hold either a path or a literal value
//! - [`http`] - HTTP utilities with request logging and a per-request timeout
//! - [`client`] - Authenticated client combining credentials and HTTP
//! - [`billing`] - Cloud Billing v1 binding
//! - [`resourcemanager`] - Cloud Resource Manager v1 binding
//!
//! # Example
//!
//! ```ignore
//! use crate::gcp::auth::{CredentialSource, GcpCredentials};
//! use crate::gcp::billing::{BillingService, BILLING_BASE_URL};
//! use crate::gcp::client::{user_agent_string, GcpClient};
//!
//! async fn example(scopes: &[String]) -> anyhow::Result<()> {
//!     let creds = GcpCredentials::resolve(&CredentialSource::AmbientDefault, scopes).await?;
//!     let ua = user_agent_string();
//!     let client = GcpClient::new(creds, &ua)?;
//!     let billing = BillingService::with_base_url(client, BILLING_BASE_URL, &ua)?;
//!     let accounts = billing.list_billing_accounts().await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod billing;
pub mod client;
pub mod http;
pub mod pathorcontents;
pub mod resourcemanager;

//! HTTP utilities for GCP REST API calls
//!
//! Every request and response passes through [`GcpHttpClient::execute`],
//! which logs method, URL, status and timing.

use anyhow::{anyhow, Context, Result};
use reqwest::header::USER_AGENT;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Per-request timeout. This bounds a single HTTP request, not a logical
/// operation that may issue several of them.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| c.is_control(), "")
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}

/// Extract `error.message` from a standard Google API error body
fn api_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .map(|b| b.error.message)
        .filter(|m| !m.is_empty())
}

/// HTTP client wrapper for GCP API calls
#[derive(Clone)]
pub struct GcpHttpClient {
    client: Client,
    timeout: Duration,
}

impl GcpHttpClient {
    /// Create a new HTTP client with the fixed per-request timeout
    pub fn new(user_agent: &str) -> Result<Self> {
        Self::with_timeout(user_agent, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, timeout })
    }

    /// Timeout applied to each request
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Make a GET request and decode the JSON response
    pub async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        token: &str,
        user_agent: &str,
    ) -> Result<T> {
        let request = self
            .client
            .get(url)
            .bearer_auth(token)
            .header(USER_AGENT, user_agent);
        self.execute("GET", url, request).await
    }

    /// Make a POST request with a JSON body and decode the JSON response
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        token: &str,
        user_agent: &str,
        body: &B,
    ) -> Result<T> {
        let request = self
            .client
            .post(url)
            .bearer_auth(token)
            .header(USER_AGENT, user_agent)
            .json(body);
        self.execute("POST", url, request).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: &str,
        url: &str,
        request: RequestBuilder,
    ) -> Result<T> {
        tracing::debug!("{} {}", method, url);
        let started = Instant::now();

        let response = request.send().await.context("Failed to send request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        tracing::debug!(
            "{} {} -> {} in {}ms",
            method,
            url,
            status,
            started.elapsed().as_millis()
        );
        tracing::trace!("Response body: {}", sanitize_for_log(&body));

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(match api_error_message(&body) {
                Some(message) => anyhow!("API request failed: {}: {}", status, message),
                None => anyhow!("API request failed: {}", status),
            });
        }

        // Empty bodies decode like an empty JSON object
        let body = if body.trim().is_empty() { "{}" } else { body.as_str() };
        serde_json::from_str(body).context("Failed to parse response JSON")
    }
}

//! Authenticated HTTP client for the PetMarket API
//!
//! Wraps reqwest::Client with automatic session-token injection and refresh.

use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::auth::TokenStore;
use crate::config::Config;

/// Client-level request timeout; the source UI had none, but unbounded
/// requests would wedge the polling loop.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Authenticated client for the PetMarket REST API.
pub struct MarketClient {
    http: reqwest::Client,
    config: Config,
}

impl MarketClient {
    /// Load config and build client. Attempts a token refresh if the stored
    /// session is expired.
    pub async fn new() -> Result<Self> {
        let mut config = Config::load()?;

        let needs_refresh = config.get_access_token().map_or(true, |t| t.is_expired());
        if needs_refresh {
            if config.get_refresh_token().is_some() {
                tracing::info!("Session missing or expired, refreshing...");
                match crate::auth::login::refresh().await {
                    Ok(true) => {
                        config = Config::load()?;
                        tracing::info!("Session refreshed");
                    }
                    Ok(false) => {
                        bail!("No refresh token available. Run 'petmarket-cli login'.");
                    }
                    Err(e) => {
                        bail!("Session refresh failed: {:#}. Run 'petmarket-cli login'.", e);
                    }
                }
            } else {
                bail!("Session expired and no refresh token. Run 'petmarket-cli login'.");
            }
        }

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { http, config })
    }

    fn session_token(&self) -> Result<String> {
        let token = self
            .config
            .get_access_token()
            .context("No session token. Run 'petmarket-cli login' first.")?;
        if token.is_expired() {
            bail!("Session token expired. Run 'petmarket-cli login'.");
        }
        Ok(token.token)
    }

    /// Id of the signed-in user. Every conversation derivation needs this.
    pub fn current_user_id(&self) -> Result<String> {
        self.config
            .user_id
            .clone()
            .context("Stored session has no user id. Run 'petmarket-cli login' again.")
    }

    /// Display name of the signed-in user, if the login recorded one.
    pub fn current_user_name(&self) -> Option<String> {
        self.config.user_name.clone()
    }

    /// Messaging poll cadence from config.
    pub fn poll_interval(&self) -> Duration {
        self.config.poll_interval()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url(), path)
    }

    /// GET request with bearer session auth.
    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        let token = self.session_token()?;
        let url = self.url(path);
        tracing::debug!("GET {}", url);

        let resp = self
            .http
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?;

        check_response(resp, &url).await
    }

    /// POST request with bearer session auth.
    pub async fn post(&self, path: &str, body: &serde_json::Value) -> Result<reqwest::Response> {
        let token = self.session_token()?;
        let url = self.url(path);
        tracing::debug!("POST {}", url);

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&token)
            .json(body)
            .send()
            .await
            .with_context(|| format!("POST {} failed", url))?;

        check_response(resp, &url).await
    }

    /// PUT request with bearer session auth.
    pub async fn put(&self, path: &str, body: &serde_json::Value) -> Result<reqwest::Response> {
        let token = self.session_token()?;
        let url = self.url(path);
        tracing::debug!("PUT {}", url);

        let resp = self
            .http
            .put(&url)
            .bearer_auth(&token)
            .json(body)
            .send()
            .await
            .with_context(|| format!("PUT {} failed", url))?;

        check_response(resp, &url).await
    }
}

/// Check HTTP response status code and return a clear error on failure.
async fn check_response(resp: reqwest::Response, url: &str) -> Result<reqwest::Response> {
    let status = resp.status();
    if status == reqwest::StatusCode::UNAUTHORIZED {
        bail!(
            "401 Unauthorized for {}. Session may be invalid -- run 'petmarket-cli login'.",
            url
        );
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        bail!("HTTP {} for {}: {}", status.as_u16(), url, body);
    }
    Ok(resp)
}

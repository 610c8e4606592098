//! Google sign-in: OAuth2 device flow, then backend token exchange.

use anyhow::{Context, Result};
use oauth2::{
    basic::BasicClient, AuthUrl, ClientId, ClientSecret, DeviceAuthorizationUrl, Scope,
    StandardDeviceAuthorizationResponse, TokenResponse, TokenUrl,
};

use super::login::{persist_session, post_auth};
use super::GoogleAuthConfig;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_DEVICE_URL: &str = "https://oauth2.googleapis.com/device/code";

/// Build the OAuth2 client for Google's device-authorization endpoints.
fn build_client(auth_config: &GoogleAuthConfig) -> Result<BasicClient> {
    let auth_url = AuthUrl::new(GOOGLE_AUTH_URL.to_string())?;
    let token_url = TokenUrl::new(GOOGLE_TOKEN_URL.to_string())?;
    let device_url = DeviceAuthorizationUrl::new(GOOGLE_DEVICE_URL.to_string())?;

    Ok(BasicClient::new(
        ClientId::new(auth_config.client_id.to_string()),
        Some(ClientSecret::new(auth_config.client_secret.to_string())),
        auth_url,
        Some(token_url),
    )
    .set_device_authorization_url(device_url))
}

/// Sign in with Google and exchange the resulting access token at the
/// backend for a PetMarket session.
pub async fn login_google() -> Result<()> {
    let client = build_client(&GoogleAuthConfig::default())?;

    let details: StandardDeviceAuthorizationResponse = client
        .exchange_device_code()
        .context("Device authorization not configured")?
        .add_scope(Scope::new("openid".to_string()))
        .add_scope(Scope::new("email".to_string()))
        .add_scope(Scope::new("profile".to_string()))
        .request_async(oauth2::reqwest::async_http_client)
        .await
        .context("Google device authorization failed")?;

    println!(
        "To sign in with Google, open {} and enter code: {}",
        details.verification_uri().as_str(),
        details.user_code().secret()
    );
    println!("Waiting for you to complete sign-in...");

    let token = client
        .exchange_device_access_token(&details)
        .request_async(oauth2::reqwest::async_http_client, tokio::time::sleep, None)
        .await
        .context("Google sign-in was not completed")?;

    let resp = post_auth(
        "/auth/google",
        serde_json::json!({ "accessToken": token.access_token().secret() }),
    )
    .await
    .context("Backend rejected the Google sign-in")?;

    persist_session(resp)?;
    println!("Logged in with Google.");
    Ok(())
}

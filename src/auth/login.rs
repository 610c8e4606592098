//! Email/password login with OTP challenge, registration, and session upkeep.

use std::io::{self, Write};
use std::time::Duration;

use anyhow::{bail, Context, Result};

use super::tokens::peek_claims;
use super::validate::{
    validate_display_name, validate_email, validate_otp_code, validate_password,
};
use super::TokenStore;
use crate::config::Config;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_FORM_ATTEMPTS: usize = 3;

/// Response shape shared by login / register / verify-otp / google / refresh.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AuthResponse {
    pub status: Option<String>,
    pub token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
    pub challenge_id: Option<String>,
    pub user: Option<AuthUser>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AuthUser {
    pub id: String,
    pub display_name: Option<String>,
}

fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")
}

/// POST an unauthenticated auth endpoint and parse the shared response.
pub(crate) async fn post_auth(path: &str, body: serde_json::Value) -> Result<AuthResponse> {
    let base = Config::load()?.api_base_url();
    let url = format!("{}{}", base, path);
    tracing::debug!("Auth POST {}", url);

    let resp = http_client()?
        .post(&url)
        .json(&body)
        .send()
        .await
        .with_context(|| format!("Auth POST {} failed", url))?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        bail!("HTTP {} for {}: {}", status.as_u16(), url, body);
    }
    resp.json().await.context("Failed to parse auth response")
}

/// Persist a session from an auth response: token, refresh token, identity.
pub(crate) fn persist_session(resp: AuthResponse) -> Result<()> {
    let token = resp.token.context("Auth response carried no session token")?;

    // Identity from the payload when present, else from the token claims.
    let (user_id, user_name) = match resp.user {
        Some(user) => (Some(user.id), user.display_name),
        None => (peek_claims(&token).and_then(|c| c.sub), None),
    };

    let mut config = Config::load()?;
    config.set_access_token(token, resp.expires_in);
    if let Some(refresh) = resp.refresh_token {
        config.set_refresh_token(refresh);
    }
    if let Some(id) = user_id {
        config.set_current_user(id, user_name);
    }
    config.save()
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("Failed to read input")?;
    Ok(line.trim().to_string())
}

/// Prompt until the validator accepts, showing the validation message
/// inline. Gives up after a few attempts.
fn prompt_validated(
    label: &str,
    validate: impl Fn(&str) -> Result<(), super::validate::ValidationError>,
) -> Result<String> {
    for _ in 0..MAX_FORM_ATTEMPTS {
        let value = prompt(label)?;
        match validate(&value) {
            Ok(()) => return Ok(value),
            Err(e) => println!("  {}", e),
        }
    }
    bail!("Too many invalid attempts")
}

fn prompt_password() -> Result<String> {
    for _ in 0..MAX_FORM_ATTEMPTS {
        let value = rpassword::prompt_password("Password: ").context("Failed to read password")?;
        match validate_password(&value) {
            Ok(()) => return Ok(value),
            Err(e) => println!("  {}", e),
        }
    }
    bail!("Too many invalid attempts")
}

/// Log in with email and password. The backend may answer with a session
/// directly or with an OTP challenge to complete first.
pub async fn login(force: bool) -> Result<()> {
    if !force {
        let config = Config::load()?;
        if let Some(token) = config.get_access_token() {
            if !token.is_expired() {
                println!("Already logged in. Use --force to re-authenticate.");
                return Ok(());
            }
        }
    }

    let email = prompt_validated("Email: ", validate_email)?;
    let password = prompt_password()?;

    let resp = post_auth(
        "/auth/login",
        serde_json::json!({ "email": email, "password": password }),
    )
    .await?;

    finish_or_challenge(resp).await
}

/// Create an account. Registration always continues into the OTP challenge
/// so the backend can verify the email address.
pub async fn register() -> Result<()> {
    let name = prompt_validated("Name: ", validate_display_name)?;
    let email = prompt_validated("Email: ", validate_email)?;
    let password = prompt_password()?;

    let resp = post_auth(
        "/auth/register",
        serde_json::json!({ "name": name, "email": email, "password": password }),
    )
    .await?;

    finish_or_challenge(resp).await
}

/// Either persist the session or run the OTP continuation, depending on the
/// response status.
async fn finish_or_challenge(resp: AuthResponse) -> Result<()> {
    if resp.status.as_deref() == Some("otpRequired") {
        let challenge_id = resp
            .challenge_id
            .context("OTP challenge response carried no challenge id")?;
        return verify_otp(&challenge_id).await;
    }
    persist_session(resp)?;
    println!("Logged in.");
    Ok(())
}

/// Prompt for the emailed one-time code and complete the challenge.
async fn verify_otp(challenge_id: &str) -> Result<()> {
    println!("A one-time code has been emailed to you.");

    for _ in 0..MAX_FORM_ATTEMPTS {
        let code = prompt("Code: ")?;
        if let Err(e) = validate_otp_code(&code) {
            println!("  {}", e);
            continue;
        }

        let resp = post_auth(
            "/auth/verify-otp",
            serde_json::json!({ "challengeId": challenge_id, "code": code }),
        )
        .await;

        match resp {
            Ok(r) if r.token.is_some() => {
                persist_session(r)?;
                println!("Logged in.");
                return Ok(());
            }
            Ok(_) => println!("  Code rejected, try again."),
            Err(e) => {
                tracing::warn!("OTP verification failed: {:#}", e);
                println!("  Code rejected, try again.");
            }
        }
    }
    bail!("Too many failed attempts. Request a new code with 'petmarket-cli login'.")
}

/// Log out: best-effort backend revoke, then clear local credentials.
pub async fn logout() -> Result<()> {
    let mut config = Config::load()?;

    if let Some(token) = config.get_access_token() {
        let url = format!("{}/auth/logout", config.api_base_url());
        if let Err(e) = http_client()?.post(&url).bearer_auth(&token.token).send().await {
            tracing::debug!("Backend logout failed (continuing): {:#}", e);
        }
    }

    config.clear_tokens();
    config.save()?;
    println!("Logged out.");
    Ok(())
}

/// Show current authentication status.
pub async fn status() -> Result<()> {
    let config = Config::load()?;

    match config.get_access_token() {
        None => println!("Not logged in. Run 'petmarket-cli login'."),
        Some(token) => {
            let who = config
                .user_name
                .as_deref()
                .or(config.user_id.as_deref())
                .unwrap_or("(unknown user)");
            if token.is_expired() {
                if config.get_refresh_token().is_some() {
                    println!("Session for {} expired; will refresh on next use.", who);
                } else {
                    println!("Session for {} expired. Run 'petmarket-cli login'.", who);
                }
            } else {
                println!("Logged in as {}.", who);
            }
        }
    }
    Ok(())
}

/// Refresh the session using the stored refresh token, then persist the new
/// session. Returns false when no refresh token is stored.
pub async fn refresh() -> Result<bool> {
    let config = Config::load()?;
    let Some(refresh_token) = config.get_refresh_token() else {
        return Ok(false);
    };

    let resp = post_auth(
        "/auth/refresh",
        serde_json::json!({ "refreshToken": refresh_token }),
    )
    .await?;
    persist_session(resp)?;
    Ok(true)
}

//! User profile endpoint (/me)

use anyhow::{Context, Result};
use serde::Deserialize;

use super::client::MarketClient;
use crate::models::User;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MeResponse {
    user: User,
}

/// Fetch the signed-in user's profile.
pub async fn whoami_data(client: &MarketClient) -> Result<User> {
    let resp = client.get("/me").await?;
    let body: MeResponse = resp.json().await.context("Failed to parse /me response")?;
    Ok(body.user)
}

/// Fetch and display current user info.
pub async fn whoami() -> Result<()> {
    let client = MarketClient::new().await?;
    let me = whoami_data(&client).await?;

    println!();
    println!("Name:  {}", me.display_name.as_deref().unwrap_or("(none)"));
    println!("Email: {}", me.email.as_deref().unwrap_or("(none)"));
    println!("ID:    {}", me.id);

    Ok(())
}

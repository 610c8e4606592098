//! Messaging endpoints and the conversation commands built on them.
//!
//! The backend only knows about a flat message list; everything grouped is
//! derived client-side in `crate::conversations`.

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use super::client::MarketClient;
use crate::conversations::{self, ConversationKey};
use crate::models::Message;

// -- Response types --

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    messages: Option<Vec<Message>>,
}

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    message: Message,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartConversationResponse {
    status: Option<String>,
    conversation_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Data-returning API functions (shared by CLI commands, poller, and TUI)
// ---------------------------------------------------------------------------

/// Fetch the authoritative flat message list.
pub async fn fetch_messages(client: &MarketClient) -> Result<Vec<Message>> {
    let resp = client.get("/messages").await?;
    let body: MessagesResponse = resp
        .json()
        .await
        .context("Failed to parse messages response")?;
    Ok(body.messages.unwrap_or_default())
}

/// Send a message about an advert. Returns the created message so callers
/// can splice it into their local list ahead of the next poll.
pub async fn send_message_with_client(
    client: &MarketClient,
    advert_id: &str,
    recipient_id: &str,
    content: &str,
) -> Result<Message> {
    let content = content.trim();
    if content.is_empty() {
        bail!("Refusing to send an empty message");
    }

    let body = serde_json::json!({
        "advertId": advert_id,
        "recipientId": recipient_id,
        "content": content,
    });
    let resp = client.post("/messages", &body).await?;
    let body: SendMessageResponse = resp
        .json()
        .await
        .context("Failed to parse send-message response")?;
    Ok(body.message)
}

/// Acknowledge one message as read. The unread count is only re-derived
/// from the flat list, never decremented in place.
pub async fn mark_message_read(client: &MarketClient, message_id: &str) -> Result<()> {
    let path = format!("/messages/{}/read", message_id);
    client.put(&path, &serde_json::json!({})).await?;
    Ok(())
}

/// Ask the backend to open a conversation with an advert's seller.
/// Returns the conversation id it minted.
pub async fn start_conversation(client: &MarketClient, advert_id: &str) -> Result<String> {
    let body = serde_json::json!({ "advertId": advert_id });
    let resp = client.post("/messages/start-conversation", &body).await?;
    let body: StartConversationResponse = resp
        .json()
        .await
        .context("Failed to parse start-conversation response")?;

    if let Some(status) = body.status.as_deref() {
        if status != "ok" {
            bail!("Could not start conversation: {}", status);
        }
    }
    body.conversation_id
        .context("start-conversation response carried no conversation id")
}

// ---------------------------------------------------------------------------
// CLI commands (print to stdout)
// ---------------------------------------------------------------------------

/// List conversations: fetch the flat feed and print the grouped summaries.
pub async fn list_conversations() -> Result<()> {
    let client = MarketClient::new().await?;
    let user_id = client.current_user_id()?;
    let messages = fetch_messages(&client).await?;
    let conversations = conversations::group_messages(&messages, &user_id);

    println!("\nConversations:");
    println!("{:-<72}", "");

    if conversations.is_empty() {
        println!("  (no conversations)");
        return Ok(());
    }

    for conv in &conversations {
        let unread = if conv.unread_count > 0 {
            format!("  [{} unread]", conv.unread_count)
        } else {
            String::new()
        };
        println!(
            "{} about \"{}\"{}",
            conv.counterpart_label(),
            conv.advert_label(),
            unread
        );
        println!("  key: {}", conv.key);
        if let Some(last) = conv.last_message() {
            println!(
                "  [{}] {}: {}",
                last.created_at.format("%Y-%m-%d %H:%M"),
                last.sender_name,
                last.content.trim()
            );
        }
        println!();
    }

    Ok(())
}

/// Print the full thread for one (counterpart, advert) pair, optionally
/// acknowledging its unread messages.
pub async fn read_conversation(
    counterpart_id: &str,
    advert_id: &str,
    mark_read: bool,
) -> Result<()> {
    let client = MarketClient::new().await?;
    let user_id = client.current_user_id()?;
    let mut messages = fetch_messages(&client).await?;

    let key = ConversationKey::new(counterpart_id, advert_id);
    let conversations = conversations::group_messages(&messages, &user_id);
    let Some(conv) = conversations::find_by_key(&conversations, &key) else {
        println!("(no conversation with {} about {})", counterpart_id, advert_id);
        return Ok(());
    };

    println!(
        "\n{} about \"{}\":",
        conv.counterpart_label(),
        conv.advert_label()
    );
    for msg in &conv.messages {
        let marker = if msg.is_unread_for(&user_id) { "*" } else { " " };
        println!(
            "{}[{}] {}: {}",
            marker,
            msg.created_at.format("%Y-%m-%d %H:%M"),
            msg.sender_name,
            msg.content.trim()
        );
    }

    if mark_read {
        let flipped = conversations::mark_read_locally(&mut messages, &key, &user_id);
        for id in &flipped {
            if let Err(e) = mark_message_read(&client, id).await {
                tracing::warn!("Failed to mark {} read: {:#}", id, e);
            }
        }
        if !flipped.is_empty() {
            println!("\nMarked {} message(s) read.", flipped.len());
        }
    }

    Ok(())
}

/// Send a message from the command line.
pub async fn send(advert_id: &str, recipient_id: &str, content: &str) -> Result<()> {
    let client = MarketClient::new().await?;
    send_message_with_client(&client, advert_id, recipient_id, content).await?;
    println!("Message sent.");
    Ok(())
}

/// Start a conversation with an advert's seller.
pub async fn contact(advert_id: &str) -> Result<()> {
    let client = MarketClient::new().await?;
    let conversation_id = start_conversation(&client, advert_id).await?;
    println!("Conversation started: {}", conversation_id);
    println!("Send a message with 'petmarket-cli send --advert {} --to <seller>'.", advert_id);
    Ok(())
}

//! Async backend: executes API calls for the TUI event loop.
//!
//! Uses an mpsc channel pair. The TUI sends `BackendCommand` values, and a
//! background tokio task executes them and sends `BackendResponse` values
//! back. Conversation snapshots arrive separately, from the poller.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;

use crate::api;
use crate::api::client::MarketClient;
use crate::models::{Message, User};

/// Commands sent from the TUI event loop to the async backend.
pub enum BackendCommand {
    SendMessage {
        advert_id: String,
        recipient_id: String,
        content: String,
    },
    /// Acknowledge a batch of messages as read against the backend. The
    /// local flags were already flipped optimistically.
    MarkRead { message_ids: Vec<String> },
    LoadUserInfo,
}

/// Responses from the async backend to the TUI.
pub enum BackendResponse {
    MessageSent(Result<Message>),
    /// How many acknowledgements failed. The next poll re-derives unread
    /// counts from the authoritative list, so failures self-heal.
    MarkReadDone { failed: usize },
    UserInfo(Result<User>),
}

/// Handle for interacting with the backend from the TUI side.
pub struct Backend {
    cmd_tx: mpsc::UnboundedSender<BackendCommand>,
    resp_rx: mpsc::UnboundedReceiver<BackendResponse>,
}

impl Backend {
    /// Start the backend. Spawns a tokio task that processes commands.
    pub fn start(client: Arc<MarketClient>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (resp_tx, resp_rx) = mpsc::unbounded_channel();

        tokio::spawn(backend_loop(client, cmd_rx, resp_tx));

        Self { cmd_tx, resp_rx }
    }

    /// A sender handle the app state can keep for issuing commands.
    pub fn sender(&self) -> mpsc::UnboundedSender<BackendCommand> {
        self.cmd_tx.clone()
    }

    /// Receive a response from the backend.
    ///
    /// Suspends until a response is available. Returns `None` only when the
    /// backend channel is permanently closed (all senders dropped).
    /// Designed to be used inside `tokio::select!`.
    pub async fn recv(&mut self) -> Option<BackendResponse> {
        self.resp_rx.recv().await
    }
}

/// Background loop that processes commands.
async fn backend_loop(
    client: Arc<MarketClient>,
    mut cmd_rx: mpsc::UnboundedReceiver<BackendCommand>,
    resp_tx: mpsc::UnboundedSender<BackendResponse>,
) {
    while let Some(cmd) = cmd_rx.recv().await {
        let client = Arc::clone(&client);
        let resp_tx = resp_tx.clone();

        // Spawn each command as a separate task so we don't block the loop.
        tokio::spawn(async move {
            match cmd {
                BackendCommand::SendMessage {
                    advert_id,
                    recipient_id,
                    content,
                } => {
                    let result = api::messages::send_message_with_client(
                        &client,
                        &advert_id,
                        &recipient_id,
                        &content,
                    )
                    .await;
                    let _ = resp_tx.send(BackendResponse::MessageSent(result));
                }
                BackendCommand::MarkRead { message_ids } => {
                    let mut failed = 0;
                    for id in &message_ids {
                        if let Err(e) = api::messages::mark_message_read(&client, id).await {
                            tracing::warn!("Failed to mark {} read: {:#}", id, e);
                            failed += 1;
                        }
                    }
                    let _ = resp_tx.send(BackendResponse::MarkReadDone { failed });
                }
                BackendCommand::LoadUserInfo => {
                    let result = api::whoami_data(&client).await;
                    let _ = resp_tx.send(BackendResponse::UserInfo(result));
                }
            }
        });
    }
}

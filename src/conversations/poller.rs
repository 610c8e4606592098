//! Fixed-interval refresh of the conversation list.
//!
//! No push channel exists; eventual consistency comes from re-fetching the
//! flat message list on a timer and rebuilding every conversation from
//! scratch. Each tick's snapshot fully replaces the previous one.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::time;

use super::{group_messages, Conversation};
use crate::api::client::MarketClient;
use crate::api::messages::fetch_messages;
use crate::models::Message;

/// One full rebuild of the conversation state.
pub struct ConversationSnapshot {
    /// Derived conversations, newest activity first.
    pub conversations: Vec<Conversation>,
    /// The authoritative flat list the conversations were derived from.
    /// Kept so the owner can run optimistic mark-read mutations against it.
    pub messages: Vec<Message>,
}

pub enum PollEvent {
    Snapshot(ConversationSnapshot),
    /// A tick failed; surfaced as a notice. The next tick retries.
    Failed(String),
}

/// Handle for the background polling task. Dropping it tears the task down:
/// the next completed tick fails to send and the loop exits, so an in-flight
/// fetch that resolves after teardown is discarded, never applied.
pub struct Poller {
    rx: mpsc::UnboundedReceiver<PollEvent>,
}

impl Poller {
    /// Start polling. The first tick fires immediately so the view gets an
    /// initial snapshot without waiting a full interval.
    pub fn start(client: Arc<MarketClient>, user_id: String, every: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            let fetch = move || {
                let client = Arc::clone(&client);
                async move { fetch_messages(&client).await }
            };
            poll_loop(fetch, &user_id, every, tx).await;
            tracing::debug!("Conversation poller stopped");
        });
        Self { rx }
    }

    /// Receive the next poll event. Designed for use inside `tokio::select!`.
    pub async fn recv(&mut self) -> Option<PollEvent> {
        self.rx.recv().await
    }
}

async fn poll_loop<F, Fut>(
    fetch: F,
    user_id: &str,
    every: Duration,
    tx: mpsc::UnboundedSender<PollEvent>,
) where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Vec<Message>>>,
{
    let mut ticker = time::interval(every);
    ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let event = match fetch().await {
            Ok(messages) => {
                let conversations = group_messages(&messages, user_id);
                PollEvent::Snapshot(ConversationSnapshot {
                    conversations,
                    messages,
                })
            }
            Err(e) => {
                tracing::warn!("Message poll failed: {:#}", e);
                PollEvent::Failed(format!("{:#}", e))
            }
        };

        // Receiver gone means the messaging view went away; discard the
        // result and stop polling.
        if tx.send(event).is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono::Utc;
    use std::sync::Mutex;
    use tokio_test::assert_ok;

    const ME: &str = "user-me";

    fn message(id: &str, read: bool) -> Message {
        Message {
            id: id.to_string(),
            sender_id: "alice".to_string(),
            sender_name: "Alice".to_string(),
            recipient_id: ME.to_string(),
            recipient_name: "Me".to_string(),
            advert_id: "ad-1".to_string(),
            advert_title: "Spaniel pups".to_string(),
            content: "hello".to_string(),
            read,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_each_tick_rebuilds_from_the_fetched_list() {
        // Scripted fetches, popped back-to-front: the first tick sees an
        // unread message, the second sees it read (as if acknowledged
        // server-side between polls).
        let script = Arc::new(Mutex::new(vec![
            vec![message("m1", true)],
            vec![message("m1", false)],
        ]));
        let fetch = {
            let script = Arc::clone(&script);
            move || {
                let script = Arc::clone(&script);
                async move {
                    let mut script = script.lock().unwrap();
                    Ok(script.pop().unwrap_or_default())
                }
            }
        };

        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(async move {
            poll_loop(fetch, ME, Duration::from_millis(1), tx).await;
        });

        let first = rx.recv().await.unwrap();
        let PollEvent::Snapshot(first) = first else {
            panic!("expected snapshot");
        };
        assert_eq!(first.conversations[0].unread_count, 1);

        let second = rx.recv().await.unwrap();
        let PollEvent::Snapshot(second) = second else {
            panic!("expected snapshot");
        };
        assert_eq!(second.conversations[0].unread_count, 0);

        drop(rx);
        assert_ok!(time::timeout(Duration::from_secs(1), handle).await);
    }

    #[tokio::test]
    async fn test_failed_tick_surfaces_notice_and_keeps_polling() {
        let calls = Arc::new(Mutex::new(0u32));
        let fetch = {
            let calls = Arc::clone(&calls);
            move || {
                let calls = Arc::clone(&calls);
                async move {
                    let mut calls = calls.lock().unwrap();
                    *calls += 1;
                    if *calls == 1 {
                        anyhow::bail!("backend down")
                    }
                    Ok(vec![message("m1", false)])
                }
            }
        };

        let (tx, mut rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            poll_loop(fetch, ME, Duration::from_millis(1), tx).await;
        });

        assert!(matches!(rx.recv().await, Some(PollEvent::Failed(_))));
        assert!(matches!(rx.recv().await, Some(PollEvent::Snapshot(_))));
    }

    #[tokio::test]
    async fn test_dropping_receiver_stops_the_loop() {
        let fetch = || async { Ok(Vec::new()) };

        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(async move {
            poll_loop(fetch, ME, Duration::from_millis(1), tx).await;
        });

        drop(rx);
        // The loop notices the closed channel on its next send and exits.
        assert_ok!(time::timeout(Duration::from_secs(1), handle).await);
    }
}

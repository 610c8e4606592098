//! TUI application state and main event loop.
//!
//! The loop multiplexes three sources: terminal key events, poller
//! snapshots, and backend responses. All mutable state lives in `App` and
//! is only touched from this loop, never concurrently.

use std::sync::Arc;

use anyhow::Result;
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::DefaultTerminal;
use tokio::sync::mpsc;

use super::backend::{Backend, BackendCommand, BackendResponse};
use super::compose::ComposeState;
use super::ui;
use crate::api::client::MarketClient;
use crate::conversations::poller::{PollEvent, Poller};
use crate::conversations::{self, Conversation, ConversationKey};
use crate::models::Message;

/// Active pane in the TUI
#[derive(Default, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    #[default]
    Sidebar,
    Thread,
    Compose,
}

/// Application state
pub struct App {
    /// Whether the app should exit
    pub should_exit: bool,
    /// Id of the signed-in user; conversation derivation hangs off this.
    pub user_id: String,
    /// Display name for the header
    pub user_name: String,
    /// Connection state description for the header
    pub connection_state: String,
    /// Active pane
    pub active_pane: Pane,
    /// Authoritative flat message list from the last poll (plus any
    /// optimistic local mutations since).
    pub messages: Vec<Message>,
    /// Conversations derived from `messages`
    pub conversations: Vec<Conversation>,
    /// Sidebar cursor (index into `conversations`)
    pub selected: usize,
    /// Key of the opened conversation. Conversations are rebuilt on every
    /// snapshot, so the open one is always re-resolved by key.
    pub open_key: Option<ConversationKey>,
    /// Thread scroll, in lines back from the latest message
    pub thread_scroll: usize,
    /// Compose box state
    pub compose: ComposeState,
    /// One-line notice for the status bar
    pub notice: Option<String>,
    /// True until the first snapshot arrives
    pub loading: bool,
    cmd_tx: mpsc::UnboundedSender<BackendCommand>,
}

impl App {
    pub fn new(
        cmd_tx: mpsc::UnboundedSender<BackendCommand>,
        user_id: String,
        user_name: String,
    ) -> Self {
        Self {
            should_exit: false,
            user_id,
            user_name,
            connection_state: "Connecting".to_string(),
            active_pane: Pane::default(),
            messages: Vec::new(),
            conversations: Vec::new(),
            selected: 0,
            open_key: None,
            thread_scroll: 0,
            compose: ComposeState::default(),
            notice: None,
            loading: true,
            cmd_tx,
        }
    }

    fn command(&self, cmd: BackendCommand) {
        if self.cmd_tx.send(cmd).is_err() {
            tracing::error!("Backend channel closed -- command dropped");
        }
    }

    /// The opened conversation, re-resolved by key against the current
    /// rebuild.
    pub fn open_conversation(&self) -> Option<&Conversation> {
        let key = self.open_key.as_ref()?;
        conversations::find_by_key(&self.conversations, key)
    }

    /// Re-derive conversations from the flat list and keep the cursor on
    /// the same conversation where possible.
    fn regroup(&mut self) {
        let cursor_key = self.conversations.get(self.selected).map(|c| c.key.clone());
        self.conversations = conversations::group_messages(&self.messages, &self.user_id);
        self.selected = cursor_key
            .and_then(|key| self.conversations.iter().position(|c| c.key == key))
            .unwrap_or(0);
        if !self.conversations.is_empty() {
            self.selected = self.selected.min(self.conversations.len() - 1);
        }
    }

    /// Apply a poll event: a snapshot fully replaces local state.
    pub fn apply_poll(&mut self, event: PollEvent) {
        match event {
            PollEvent::Snapshot(snapshot) => {
                let cursor_key = self.conversations.get(self.selected).map(|c| c.key.clone());
                self.messages = snapshot.messages;
                self.conversations = snapshot.conversations;
                self.selected = cursor_key
                    .and_then(|key| self.conversations.iter().position(|c| c.key == key))
                    .unwrap_or(0);
                self.loading = false;
                self.connection_state = "Online".to_string();
            }
            PollEvent::Failed(e) => {
                self.connection_state = "Offline".to_string();
                self.notice = Some(format!("Refresh failed: {}", e));
            }
        }
    }

    /// Apply a backend response.
    pub fn apply_response(&mut self, resp: BackendResponse) {
        match resp {
            BackendResponse::MessageSent(Ok(message)) => {
                // Splice the confirmed message in ahead of the next poll;
                // the rebuild is idempotent so the poll replacing it later
                // is harmless.
                self.messages.push(message);
                self.regroup();
                self.notice = Some("Sent.".to_string());
            }
            BackendResponse::MessageSent(Err(e)) => {
                self.notice = Some(format!("Send failed: {:#}", e));
            }
            BackendResponse::MarkReadDone { failed } => {
                if failed > 0 {
                    self.notice = Some(format!("{} read receipt(s) failed", failed));
                }
            }
            BackendResponse::UserInfo(Ok(user)) => {
                self.user_name = user.label().to_string();
            }
            BackendResponse::UserInfo(Err(e)) => {
                tracing::warn!("Failed to load profile: {:#}", e);
            }
        }
    }

    /// Open the conversation under the cursor: flip its incoming unread
    /// messages locally, queue the backend acknowledgements, and focus the
    /// thread pane.
    fn open_selected(&mut self) {
        let Some(conv) = self.conversations.get(self.selected) else {
            return;
        };
        let key = conv.key.clone();

        let flipped = conversations::mark_read_locally(&mut self.messages, &key, &self.user_id);
        if !flipped.is_empty() {
            self.command(BackendCommand::MarkRead {
                message_ids: flipped,
            });
        }

        self.open_key = Some(key);
        self.thread_scroll = 0;
        self.regroup();
        self.active_pane = Pane::Thread;
    }

    /// Send the compose box content to the open conversation.
    fn send_compose(&mut self) {
        let Some(key) = self.open_key.clone() else {
            self.notice = Some("Open a conversation first.".to_string());
            return;
        };
        let Some(content) = self.compose.send() else {
            return;
        };
        self.command(BackendCommand::SendMessage {
            advert_id: key.advert_id,
            recipient_id: key.counterpart_id,
            content,
        });
        self.notice = Some("Sending...".to_string());
    }

    fn next_pane(&mut self) {
        self.active_pane = match self.active_pane {
            Pane::Sidebar => Pane::Thread,
            Pane::Thread => Pane::Compose,
            Pane::Compose => Pane::Sidebar,
        };
    }

    /// Handle a key press.
    pub fn handle_key(&mut self, key: KeyEvent) {
        // Global bindings first.
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_exit = true;
            return;
        }
        if key.code == KeyCode::Tab {
            self.next_pane();
            return;
        }

        match self.active_pane {
            Pane::Sidebar => self.handle_sidebar_key(key),
            Pane::Thread => self.handle_thread_key(key),
            Pane::Compose => self.handle_compose_key(key),
        }
    }

    fn handle_sidebar_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_exit = true,
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if !self.conversations.is_empty() {
                    self.selected = (self.selected + 1).min(self.conversations.len() - 1);
                }
            }
            KeyCode::Enter => self.open_selected(),
            _ => {}
        }
    }

    fn handle_thread_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.active_pane = Pane::Sidebar,
            KeyCode::Up | KeyCode::Char('k') => {
                self.thread_scroll = self.thread_scroll.saturating_add(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.thread_scroll = self.thread_scroll.saturating_sub(1);
            }
            KeyCode::PageUp => {
                self.thread_scroll = self.thread_scroll.saturating_add(10);
            }
            KeyCode::PageDown => {
                self.thread_scroll = self.thread_scroll.saturating_sub(10);
            }
            KeyCode::Enter => self.active_pane = Pane::Compose,
            _ => {}
        }
    }

    fn handle_compose_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.active_pane = Pane::Thread,
            KeyCode::Enter => self.send_compose(),
            KeyCode::Backspace => self.compose.backspace(),
            KeyCode::Delete => self.compose.delete(),
            KeyCode::Left => self.compose.move_left(),
            KeyCode::Right => self.compose.move_right(),
            KeyCode::Home => self.compose.move_home(),
            KeyCode::End => self.compose.move_end(),
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.compose.clear()
            }
            KeyCode::Char(c) => self.compose.insert_char(c),
            _ => {}
        }
    }

    /// Render the UI
    pub fn render(&self, frame: &mut ratatui::Frame) {
        ui::render(frame, self);
    }
}

/// Run the TUI application.
pub async fn run() -> Result<()> {
    // Build the client before touching the terminal so login guidance
    // prints normally.
    let client = Arc::new(MarketClient::new().await?);
    let user_id = client.current_user_id()?;
    let user_name = client
        .current_user_name()
        .unwrap_or_else(|| user_id.clone());
    let every = client.poll_interval();

    let mut backend = Backend::start(Arc::clone(&client));
    let mut poller = Poller::start(client, user_id.clone(), every);

    let mut terminal = ratatui::init();
    let result = run_app(&mut terminal, &mut backend, &mut poller, user_id, user_name).await;
    ratatui::restore();
    result
}

async fn run_app(
    terminal: &mut DefaultTerminal,
    backend: &mut Backend,
    poller: &mut Poller,
    user_id: String,
    user_name: String,
) -> Result<()> {
    let mut app = App::new(backend.sender(), user_id, user_name);
    app.command(BackendCommand::LoadUserInfo);

    let mut events = EventStream::new();

    while !app.should_exit {
        terminal.draw(|frame| app.render(frame))?;

        tokio::select! {
            maybe_event = events.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        app.handle_key(key);
                    }
                    Some(Ok(_)) => {
                        // Resize and other events are handled on next draw.
                    }
                    Some(Err(e)) => return Err(e.into()),
                    None => break,
                }
            }
            Some(event) = poller.recv() => {
                app.apply_poll(event);
            }
            Some(resp) = backend.recv() => {
                app.apply_response(resp);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversations::poller::ConversationSnapshot;
    use chrono::{TimeZone, Utc};

    const ME: &str = "user-me";

    fn message(id: &str, sender: &str, advert: &str, read: bool, minute: u32) -> Message {
        let (sender_id, recipient_id) = if sender == ME {
            (ME.to_string(), "alice".to_string())
        } else {
            (sender.to_string(), ME.to_string())
        };
        Message {
            id: id.to_string(),
            sender_name: format!("{} name", sender),
            recipient_name: "someone".to_string(),
            sender_id,
            recipient_id,
            advert_id: advert.to_string(),
            advert_title: format!("{} title", advert),
            content: "hello".to_string(),
            read,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, minute, 0).unwrap(),
        }
    }

    fn snapshot(messages: Vec<Message>) -> PollEvent {
        let conversations = conversations::group_messages(&messages, ME);
        PollEvent::Snapshot(ConversationSnapshot {
            conversations,
            messages,
        })
    }

    fn test_app() -> (App, mpsc::UnboundedReceiver<BackendCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (App::new(tx, ME.to_string(), "Me".to_string()), rx)
    }

    #[test]
    fn test_snapshot_replaces_state_and_keeps_cursor_by_key() {
        let (mut app, _rx) = test_app();

        app.apply_poll(snapshot(vec![
            message("m1", "alice", "ad-1", true, 0),
            message("m2", "bob", "ad-2", true, 10),
        ]));
        assert_eq!(app.conversations.len(), 2);
        assert!(!app.loading);

        // Cursor on "alice" (second row -- bob is newer).
        app.selected = 1;
        assert_eq!(app.conversations[1].key.counterpart_id, "alice");

        // New snapshot where alice's conversation is now the newest: the
        // cursor must follow the key, not the index.
        app.apply_poll(snapshot(vec![
            message("m1", "alice", "ad-1", true, 30),
            message("m2", "bob", "ad-2", true, 10),
        ]));
        assert_eq!(app.conversations[app.selected].key.counterpart_id, "alice");
    }

    #[test]
    fn test_open_selected_marks_read_and_queues_ack() {
        let (mut app, mut rx) = test_app();
        app.apply_poll(snapshot(vec![
            message("m1", "alice", "ad-1", false, 0),
            message("m2", "alice", "ad-1", false, 1),
        ]));
        assert_eq!(app.conversations[0].unread_count, 2);

        app.open_selected();

        // Unread cleared locally without waiting for the backend.
        assert_eq!(app.conversations[0].unread_count, 0);
        assert!(app.active_pane == Pane::Thread);

        let cmd = rx.try_recv().expect("expected a MarkRead command");
        match cmd {
            BackendCommand::MarkRead { message_ids } => {
                assert_eq!(message_ids, vec!["m1".to_string(), "m2".to_string()]);
            }
            _ => panic!("expected MarkRead"),
        }
    }

    #[test]
    fn test_open_conversation_resolved_by_key_after_replace() {
        let (mut app, _rx) = test_app();
        app.apply_poll(snapshot(vec![message("m1", "alice", "ad-1", true, 0)]));
        app.open_selected();
        assert!(app.open_conversation().is_some());

        // Replacement snapshot rebuilds every conversation object; the open
        // one must still resolve through its key.
        app.apply_poll(snapshot(vec![
            message("m1", "alice", "ad-1", true, 0),
            message("m2", "alice", "ad-1", false, 5),
        ]));
        let open = app.open_conversation().expect("conversation lost");
        assert_eq!(open.messages.len(), 2);
    }

    #[test]
    fn test_sent_message_spliced_in_before_next_poll() {
        let (mut app, _rx) = test_app();
        app.apply_poll(snapshot(vec![message("m1", "alice", "ad-1", true, 0)]));
        app.open_selected();

        app.apply_response(BackendResponse::MessageSent(Ok(message(
            "m2", ME, "ad-1", false, 1,
        ))));
        assert_eq!(app.open_conversation().unwrap().messages.len(), 2);
        // Own message never counts as unread.
        assert_eq!(app.open_conversation().unwrap().unread_count, 0);
    }

    #[test]
    fn test_failed_poll_sets_notice_but_keeps_data() {
        let (mut app, _rx) = test_app();
        app.apply_poll(snapshot(vec![message("m1", "alice", "ad-1", true, 0)]));
        app.apply_poll(PollEvent::Failed("timeout".to_string()));

        assert_eq!(app.conversations.len(), 1);
        assert!(app.notice.as_deref().unwrap_or("").contains("timeout"));
    }
}

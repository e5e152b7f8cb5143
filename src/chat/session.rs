//! Chat session state
//!
//! A session is the transcript of one workspace's chat: a list of completed
//! messages plus an in-flight streaming buffer. State only changes through
//! `Action`s, so the transition rules live in one place: a chunk appends to
//! the buffer, completion promotes the buffer to an assistant message, a
//! failure discards it.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::stream::CancelHandle;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: ChatRole,
    pub content: String,
    pub at: DateTime<Utc>,
}

impl ChatMessage {
    fn new(role: ChatRole, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content,
            at: Utc::now(),
        }
    }
}

/// State transitions
#[derive(Debug, Clone)]
pub enum Action {
    /// User sent a message
    UserMessage(String),
    /// A streamed chunk of the assistant reply arrived
    StreamChunk(String),
    /// The streamed reply completed
    StreamComplete,
    /// The streamed reply failed; the partial buffer is discarded
    StreamFailed,
    /// Clear the transcript
    Reset,
}

/// One workspace's chat transcript
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChatSession {
    pub messages: Vec<ChatMessage>,
    /// In-flight assistant reply, None when no stream is active
    pub streaming: Option<String>,
}

impl ChatSession {
    pub fn apply(&mut self, action: Action) {
        match action {
            Action::UserMessage(content) => {
                self.messages.push(ChatMessage::new(ChatRole::User, content));
            }
            Action::StreamChunk(chunk) => {
                self.streaming.get_or_insert_with(String::new).push_str(&chunk);
            }
            Action::StreamComplete => {
                if let Some(buffer) = self.streaming.take() {
                    if !buffer.is_empty() {
                        self.messages.push(ChatMessage::new(ChatRole::Assistant, buffer));
                    }
                }
            }
            Action::StreamFailed => {
                self.streaming = None;
            }
            Action::Reset => {
                self.messages.clear();
                self.streaming = None;
            }
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming.is_some()
    }
}

/// In-memory registry of live chat sessions, keyed by workspace
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<Uuid, ChatSession>,
    /// Cancel handle of the active stream per workspace
    active: DashMap<Uuid, CancelHandle>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an action to a workspace's session, creating it on first use
    pub fn apply(&self, workspace_id: Uuid, action: Action) {
        self.sessions.entry(workspace_id).or_default().apply(action);
    }

    /// Snapshot of a workspace's transcript
    pub fn snapshot(&self, workspace_id: Uuid) -> ChatSession {
        self.sessions
            .get(&workspace_id)
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Register a new active stream, cancelling whatever was running.
    /// Starting a new reply tears the previous one down instead of letting
    /// a stale stream race the fresh one.
    pub fn begin_stream(&self, workspace_id: Uuid, handle: CancelHandle) {
        if let Some(previous) = self.active.insert(workspace_id, handle) {
            previous.cancel();
        }
    }

    /// Drop the active stream marker once it finishes
    pub fn end_stream(&self, workspace_id: Uuid) {
        self.active.remove(&workspace_id);
    }

    pub fn remove(&self, workspace_id: Uuid) {
        if let Some((_, handle)) = self.active.remove(&workspace_id) {
            handle.cancel();
        }
        self.sessions.remove(&workspace_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::stream::TokenStream;

    #[test]
    fn test_chunks_accumulate_then_finalize() {
        let mut session = ChatSession::default();
        session.apply(Action::UserMessage("What is ownership?".into()));
        session.apply(Action::StreamChunk("Ownership is ".into()));
        session.apply(Action::StreamChunk("Rust's memory model.".into()));

        assert!(session.is_streaming());
        assert_eq!(session.messages.len(), 1);
        assert_eq!(session.streaming.as_deref(), Some("Ownership is Rust's memory model."));

        session.apply(Action::StreamComplete);
        assert!(!session.is_streaming());
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[1].role, ChatRole::Assistant);
        assert_eq!(session.messages[1].content, "Ownership is Rust's memory model.");
    }

    #[test]
    fn test_empty_buffer_not_promoted() {
        let mut session = ChatSession::default();
        session.apply(Action::StreamComplete);
        assert!(session.messages.is_empty());
    }

    #[test]
    fn test_failure_discards_buffer() {
        let mut session = ChatSession::default();
        session.apply(Action::StreamChunk("partial".into()));
        session.apply(Action::StreamFailed);
        assert!(!session.is_streaming());
        assert!(session.messages.is_empty());
    }

    #[test]
    fn test_reset() {
        let mut session = ChatSession::default();
        session.apply(Action::UserMessage("hi".into()));
        session.apply(Action::StreamChunk("there".into()));
        session.apply(Action::Reset);
        assert!(session.messages.is_empty());
        assert!(!session.is_streaming());
    }

    #[test]
    fn test_begin_stream_cancels_previous() {
        let registry = SessionRegistry::new();
        let ws = Uuid::new_v4();

        let (_tx1, stream1) = TokenStream::channel(1);
        let first = stream1.cancel_handle();
        registry.begin_stream(ws, first.clone());
        assert!(!first.is_cancelled());

        let (_tx2, stream2) = TokenStream::channel(1);
        registry.begin_stream(ws, stream2.cancel_handle());
        assert!(first.is_cancelled());
    }

    #[test]
    fn test_registry_snapshot_is_isolated() {
        let registry = SessionRegistry::new();
        let ws = Uuid::new_v4();
        registry.apply(ws, Action::UserMessage("hello".into()));

        let snap = registry.snapshot(ws);
        assert_eq!(snap.messages.len(), 1);

        // Mutating the snapshot does not touch the registry
        let mut snap = snap;
        snap.apply(Action::Reset);
        assert_eq!(registry.snapshot(ws).messages.len(), 1);
    }
}

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::llm::ChatMessage;

/// In-memory chat history keyed by session id.
///
/// Each session keeps at most `max_messages` of its most recent messages,
/// dropped a whole exchange at a time so history always opens on a user turn.
/// Nothing is persisted; a restart starts every session empty.
pub struct SessionHistory {
    sessions: RwLock<HashMap<String, Vec<ChatMessage>>>,
    max_messages: usize,
}

impl SessionHistory {
    pub fn new(max_messages: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_messages,
        }
    }

    pub async fn messages(&self, session_id: &str) -> Vec<ChatMessage> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Records one question/answer exchange.
    pub async fn append_exchange(&self, session_id: &str, question: &str, answer: &str) {
        if self.max_messages == 0 {
            return;
        }

        let mut sessions = self.sessions.write().await;
        let history = sessions.entry(session_id.to_string()).or_default();
        history.push(ChatMessage::user(question));
        history.push(ChatMessage::assistant(answer));

        if history.len() > self.max_messages {
            let excess = history.len() - self.max_messages;
            history.drain(..excess.next_multiple_of(2));
        }
    }
}

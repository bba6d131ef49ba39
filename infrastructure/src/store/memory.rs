//! In-memory conversation store.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use switchboard_application::ConversationStorePort;
use switchboard_domain::Turn;

/// Per-caller turn history, bounded to the most recent `max_turns`.
pub struct InMemoryConversationStore {
    turns: Mutex<HashMap<String, VecDeque<Turn>>>,
    max_turns: usize,
}

impl InMemoryConversationStore {
    pub fn new(max_turns: usize) -> Self {
        Self {
            turns: Mutex::new(HashMap::new()),
            max_turns: max_turns.max(2),
        }
    }

    pub fn caller_count(&self) -> usize {
        self.turns.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Synchronous append, shared by the async port method and startup
    /// replay in the JSONL store.
    pub fn push(&self, caller_id: &str, turn: Turn) {
        let mut turns = self.turns.lock().unwrap_or_else(|e| e.into_inner());
        let history = turns.entry(caller_id.to_string()).or_default();
        history.push_back(turn);
        while history.len() > self.max_turns {
            history.pop_front();
        }
    }
}

impl Default for InMemoryConversationStore {
    fn default() -> Self {
        Self::new(50)
    }
}

#[async_trait]
impl ConversationStorePort for InMemoryConversationStore {
    async fn context(&self, caller_id: &str) -> Vec<Turn> {
        self.turns
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(caller_id)
            .map(|turns| turns.iter().cloned().collect())
            .unwrap_or_default()
    }

    async fn append(&self, caller_id: &str, turn: Turn) {
        self.push(caller_id, turn);
    }
}

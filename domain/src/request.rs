//! Request entities: the inbound request and its conversation context.

use serde::{Deserialize, Serialize};

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One prior turn of the conversation, supplied by the conversation store.
///
/// The pipeline reads turns for classification and planning context; it never
/// mutates them and never owns their lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            text: text.into(),
        }
    }
}

/// An inbound request. Immutable once created.
#[derive(Debug, Clone)]
pub struct Request {
    /// Unique id for tracing and audit.
    pub id: String,
    /// The caller this request is attributed to (per-caller admission cap).
    pub caller_id: String,
    /// Raw request text as typed by the caller.
    pub text: String,
    /// Ordered prior turns, oldest first.
    pub context: Vec<Turn>,
}

impl Request {
    pub fn new(
        id: impl Into<String>,
        caller_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            caller_id: caller_id.into(),
            text: text.into(),
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: Vec<Turn>) -> Self {
        self.context = context;
        self
    }

    /// Boundary validation: the caller id is the only field whose absence is
    /// a hard error (everything else degrades).
    pub fn has_valid_caller(&self) -> bool {
        !self.caller_id.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_constructors() {
        let turn = Turn::user("hello");
        assert_eq!(turn.role, TurnRole::User);
        assert_eq!(turn.text, "hello");
        assert_eq!(Turn::assistant("hi").role.as_str(), "assistant");
    }

    #[test]
    fn test_request_caller_validation() {
        assert!(Request::new("r-1", "alice", "hello").has_valid_caller());
        assert!(!Request::new("r-2", "", "hello").has_valid_caller());
        assert!(!Request::new("r-3", "   ", "hello").has_valid_caller());
    }

    #[test]
    fn test_request_with_context() {
        let request = Request::new("r-1", "alice", "and now?")
            .with_context(vec![Turn::user("hi"), Turn::assistant("hello")]);
        assert_eq!(request.context.len(), 2);
    }
}

//! Conversation store port
//!
//! The pipeline reads a caller's prior turns before classification and
//! appends the finalized turn pair after validation. Storage failures are an
//! adapter concern (logged there); the pipeline never fails on them.

use async_trait::async_trait;
use switchboard_domain::Turn;

/// Port for conversation history access.
#[async_trait]
pub trait ConversationStorePort: Send + Sync {
    /// Ordered prior turns for a caller, oldest first.
    async fn context(&self, caller_id: &str) -> Vec<Turn>;

    /// Append one finalized turn.
    async fn append(&self, caller_id: &str, turn: Turn);
}

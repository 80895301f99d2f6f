//! History compaction capability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CompactionError;
use crate::message::Message;

/// A history after compaction, plus the compactor's token estimate for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompactedHistory {
    pub messages: Vec<Message>,
    pub token_estimate: usize,
}

/// Shortens a message history to stay within a token budget.
///
/// Implementations must keep every retained `tool` message after the
/// assistant message that issued its request.
#[async_trait]
pub trait HistoryCompactor: Send + Sync {
    async fn compact(&self, history: Vec<Message>) -> Result<CompactedHistory, CompactionError>;
}

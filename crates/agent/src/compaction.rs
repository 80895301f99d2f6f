//! Ready-made history compactors.
//!
//! Callers can bring their own [`HistoryCompactor`] (an LLM summarizer, say);
//! these two cover the common cases without another model call.

use async_trait::async_trait;
use reactloop_core::compaction::{CompactedHistory, HistoryCompactor};
use reactloop_core::error::CompactionError;
use reactloop_core::message::{Message, Role};
use reactloop_core::token;
use tracing::debug;

/// Returns the history unchanged, with a heuristic token estimate.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughCompactor;

#[async_trait]
impl HistoryCompactor for PassthroughCompactor {
    async fn compact(&self, history: Vec<Message>) -> Result<CompactedHistory, CompactionError> {
        let token_estimate = token::estimate_messages_tokens(&history);
        Ok(CompactedHistory {
            messages: history,
            token_estimate,
        })
    }
}

/// Sliding-window compactor.
///
/// Keeps the leading system message, the latest user message, and as many of
/// the newest turns as fit in `max_tokens`. An assistant message and the tool
/// messages answering it form one turn and are kept or dropped together. The
/// newest turn is always kept, even when it alone exceeds the budget.
#[derive(Debug, Clone, Copy)]
pub struct WindowCompactor {
    max_tokens: usize,
}

impl WindowCompactor {
    pub fn new(max_tokens: usize) -> Self {
        Self { max_tokens }
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// Split `messages` into turns. Tool messages with no assistant turn in
    /// front of them are orphans and are discarded.
    fn turns(messages: Vec<Message>) -> Vec<Vec<Message>> {
        let mut turns: Vec<Vec<Message>> = Vec::new();
        for message in messages {
            if message.role == Role::Tool {
                let answers_last = turns.last().is_some_and(|turn| {
                    message
                        .tool_call_id
                        .as_deref()
                        .is_some_and(|id| turn[0].issued(id))
                });
                if let (true, Some(turn)) = (answers_last, turns.last_mut()) {
                    turn.push(message);
                } else {
                    debug!(call_id = ?message.tool_call_id, "Dropping orphan tool message");
                }
                continue;
            }
            turns.push(vec![message]);
        }
        turns
    }

    fn window(&self, history: Vec<Message>) -> Vec<Message> {
        let mut rest = history;
        let system = match rest.first() {
            Some(first) if first.role == Role::System => Some(rest.remove(0)),
            _ => None,
        };

        let turns = Self::turns(rest);
        let costs: Vec<usize> = turns
            .iter()
            .map(|t| token::estimate_messages_tokens(t))
            .collect();
        let last_user = turns.iter().rposition(|t| t[0].role == Role::User);

        let mut budget = self
            .max_tokens
            .saturating_sub(system.as_ref().map_or(0, token::estimate_message_tokens));
        if let Some(idx) = last_user {
            budget = budget.saturating_sub(costs[idx]);
        }

        // Newest-first contiguous suffix that fits; the newest turn always stays.
        let mut keep = vec![false; turns.len()];
        for idx in (0..turns.len()).rev() {
            if Some(idx) == last_user {
                keep[idx] = true;
                continue;
            }
            let newest = idx + 1 == turns.len();
            if costs[idx] <= budget || newest {
                budget = budget.saturating_sub(costs[idx]);
                keep[idx] = true;
            } else {
                break;
            }
        }
        if let Some(idx) = last_user {
            keep[idx] = true;
        }

        let dropped = keep.iter().filter(|k| !**k).count();
        if dropped > 0 {
            debug!(dropped_turns = dropped, max_tokens = self.max_tokens, "Compacted history");
        }

        system
            .into_iter()
            .chain(
                turns
                    .into_iter()
                    .zip(keep)
                    .filter_map(|(turn, kept)| kept.then_some(turn))
                    .flatten(),
            )
            .collect()
    }
}

#[async_trait]
impl HistoryCompactor for WindowCompactor {
    async fn compact(&self, history: Vec<Message>) -> Result<CompactedHistory, CompactionError> {
        let messages = if token::estimate_messages_tokens(&history) <= self.max_tokens {
            history
        } else {
            self.window(history)
        };
        let token_estimate = token::estimate_messages_tokens(&messages);
        Ok(CompactedHistory {
            messages,
            token_estimate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reactloop_core::tool::ToolRequest;

    fn tool_turn(call_id: &str, output: &str) -> Vec<Message> {
        vec![
            Message::assistant_with_requests(
                "calling",
                vec![ToolRequest::new(call_id, "search", "{}")],
            ),
            Message::tool_result(call_id, "search", output),
        ]
    }

    fn long_history() -> Vec<Message> {
        let mut history = vec![Message::system("rules"), Message::user("find X")];
        for i in 0..10 {
            history.extend(tool_turn(&format!("call_{i}"), &"r".repeat(400)));
        }
        history
    }

    #[tokio::test]
    async fn passthrough_keeps_everything() {
        let history = long_history();
        let compacted = PassthroughCompactor.compact(history.clone()).await.unwrap();
        assert_eq!(compacted.messages, history);
        assert_eq!(
            compacted.token_estimate,
            token::estimate_messages_tokens(&history)
        );
    }

    #[tokio::test]
    async fn under_budget_is_untouched() {
        let history = vec![Message::system("rules"), Message::user("hi")];
        let compacted = WindowCompactor::new(1000)
            .compact(history.clone())
            .await
            .unwrap();
        assert_eq!(compacted.messages, history);
    }

    #[tokio::test]
    async fn window_keeps_system_user_and_newest_turns() {
        let history = long_history();
        let compacted = WindowCompactor::new(400).compact(history).await.unwrap();
        let msgs = &compacted.messages;

        assert_eq!(msgs[0].role, Role::System);
        assert_eq!(msgs[1].role, Role::User);
        assert!(msgs.len() < 22);
        assert_eq!(msgs.last().unwrap().tool_call_id.as_deref(), Some("call_9"));
        assert!(compacted.token_estimate <= 400 + 200);
    }

    #[tokio::test]
    async fn tool_messages_keep_their_assistant_turn() {
        let compacted = WindowCompactor::new(300)
            .compact(long_history())
            .await
            .unwrap();
        let msgs = &compacted.messages;
        for (i, msg) in msgs.iter().enumerate() {
            if msg.role == Role::Tool {
                let id = msg.tool_call_id.as_deref().unwrap();
                assert!(msgs[..i].iter().any(|m| m.issued(id)), "orphaned {id}");
            }
        }
    }

    #[tokio::test]
    async fn newest_turn_survives_tiny_budget() {
        let compacted = WindowCompactor::new(1).compact(long_history()).await.unwrap();
        let roles: Vec<Role> = compacted.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::Tool]
        );
    }

    #[tokio::test]
    async fn orphan_tool_messages_are_dropped() {
        let mut history = vec![
            Message::system("rules"),
            Message::tool_result("ghost", "search", &"x".repeat(100)),
            Message::user("question"),
        ];
        history.extend(tool_turn("call_1", &"y".repeat(100)));
        let compacted = WindowCompactor::new(10).compact(history).await.unwrap();
        assert!(
            compacted
                .messages
                .iter()
                .all(|m| m.tool_call_id.as_deref() != Some("ghost"))
        );
    }
}

//! Token estimation utilities.
//!
//! Uses a character-based heuristic: ~4 characters per token. Good enough
//! for budget decisions; real counts come from the provider's `Usage`.

use crate::message::Message;
use crate::tool::ToolDescriptor;

/// Per-message overhead for role name, delimiters and formatting markers.
const MESSAGE_OVERHEAD: usize = 4;

/// Estimate the token count for a string.
///
/// Heuristic: 1 token ≈ 4 characters. Rounds up.
pub fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(4)
}

/// Estimate tokens for a single message including per-message overhead.
///
/// Tool requests on assistant turns are counted by their name and raw
/// argument text.
pub fn estimate_message_tokens(message: &Message) -> usize {
    let requests: usize = message
        .tool_requests
        .iter()
        .map(|r| estimate_tokens(&r.name) + estimate_tokens(&r.arguments))
        .sum();
    MESSAGE_OVERHEAD + estimate_tokens(&message.content) + requests
}

/// Estimate tokens for a slice of messages.
pub fn estimate_messages_tokens(messages: &[Message]) -> usize {
    messages.iter().map(estimate_message_tokens).sum()
}

/// Estimate tokens for a slice of tool descriptors (serialized as JSON).
pub fn estimate_tools_tokens(tools: &[ToolDescriptor]) -> usize {
    tools
        .iter()
        .map(|t| estimate_tokens(&serde_json::to_string(t).unwrap_or_default()))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::ToolRequest;

    #[test]
    fn empty_string_is_zero() {
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn five_chars_rounds_up() {
        assert_eq!(estimate_tokens("hello"), 2);
    }

    #[test]
    fn message_includes_overhead() {
        let msg = Message::user("test"); // 1 token + 4 overhead
        assert_eq!(estimate_message_tokens(&msg), 5);
    }

    #[test]
    fn tool_requests_are_counted() {
        let plain = Message::assistant("ok");
        let with_call = Message::assistant_with_requests(
            "ok",
            vec![ToolRequest::new("call_1", "search", r#"{"query":"X"}"#)],
        );
        assert!(estimate_message_tokens(&with_call) > estimate_message_tokens(&plain));
    }

    #[test]
    fn multiple_messages() {
        let msgs = vec![
            Message::user("hello"),      // 2 + 4
            Message::assistant("world"), // 2 + 4
        ];
        assert_eq!(estimate_messages_tokens(&msgs), 12);
    }

    #[test]
    fn empty_tools_is_zero() {
        assert_eq!(estimate_tools_tokens(&[]), 0);
    }
}

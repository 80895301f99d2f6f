//! Prompt construction: the system prompt and the initial history of a run.

use reactloop_core::message::{Message, Role};
use reactloop_core::tool::ToolDescriptor;
use tracing::debug;

/// Built-in instructions used when the configuration has no system prompt.
pub const DEFAULT_SYSTEM_PROMPT: &str = concat!(
    "You are a helpful assistant that solves tasks step by step. ",
    "Think about what you need, call a tool when it would help, ",
    "and read each tool result before deciding what to do next. ",
    "When you have enough information, reply with the final answer ",
    "and do not call any more tools."
);

/// Build the system prompt: the base instructions followed by a listing of
/// the available tools.
pub fn build_system_prompt(base: &str, tools: &[ToolDescriptor]) -> String {
    let mut prompt = base.trim_end().to_string();
    if tools.is_empty() {
        return prompt;
    }

    prompt.push_str("\n\n## Available Tools\n");
    for tool in tools {
        if tool.description.is_empty() {
            prompt.push_str(&format!("- **{}**\n", tool.name));
        } else {
            prompt.push_str(&format!("- **{}**: {}\n", tool.name, tool.description));
        }
    }
    prompt
}

/// Drop prior `tool` messages and strip tool requests from prior assistant
/// turns: their call IDs mean nothing in a new run.
pub fn sanitize_prior(prior: &[Message]) -> Vec<Message> {
    let mut dropped = 0usize;
    let kept: Vec<Message> = prior
        .iter()
        .filter(|m| {
            let keep = m.role != Role::Tool;
            if !keep {
                dropped += 1;
            }
            keep
        })
        .map(|m| {
            let mut m = m.clone();
            m.tool_requests.clear();
            m
        })
        .collect();

    if dropped > 0 {
        debug!(dropped, "Removed tool messages from prior history");
    }
    kept
}

/// `[system] + sanitized prior + user`.
pub fn build_initial_history(
    system_prompt: &str,
    prior: &[Message],
    user_utterance: &str,
) -> Vec<Message> {
    let mut history = Vec::with_capacity(prior.len() + 2);
    history.push(Message::system(system_prompt));
    history.extend(sanitize_prior(prior));
    history.push(Message::user(user_utterance));
    history
}

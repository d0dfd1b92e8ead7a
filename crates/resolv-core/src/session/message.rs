//! Conversation turn types.
//!
//! This module contains types for representing the turns of a dialogue with
//! the model service, including tool invocations and their results.

use crate::tool::{ToolInvocation, ToolResult};
use serde::{Deserialize, Serialize};

/// Represents the role of a turn in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageRole {
    /// Turn from the user (including tool results sent back to the model).
    User,
    /// Turn from the model.
    Assistant,
}

/// One piece of a conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TurnPart {
    Text(String),
    ToolInvocation(ToolInvocation),
    ToolResult(ToolResult),
}

/// A single turn in a conversation history.
///
/// Turns are append-only: once pushed onto a session's history they are
/// never edited or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// The role of the turn's author.
    pub role: MessageRole,
    /// Ordered content of the turn.
    pub parts: Vec<TurnPart>,
    /// Timestamp when the turn was recorded (ISO 8601 format).
    pub timestamp: String,
}

impl ConversationTurn {
    fn now(role: MessageRole, parts: Vec<TurnPart>) -> Self {
        Self {
            role,
            parts,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// A user turn carrying typed text.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self::now(MessageRole::User, vec![TurnPart::Text(text.into())])
    }

    /// A user-role turn answering every invocation of the previous round.
    pub fn tool_results(results: Vec<ToolResult>) -> Self {
        Self::now(
            MessageRole::User,
            results.into_iter().map(TurnPart::ToolResult).collect(),
        )
    }

    /// A model turn. Empty text is omitted, so a turn made only of
    /// invocations has no text part.
    pub fn assistant(text: &str, invocations: Vec<ToolInvocation>) -> Self {
        let mut parts = Vec::with_capacity(invocations.len() + 1);
        if !text.is_empty() {
            parts.push(TurnPart::Text(text.to_string()));
        }
        parts.extend(invocations.into_iter().map(TurnPart::ToolInvocation));
        Self::now(MessageRole::Assistant, parts)
    }

    /// Concatenated text parts of the turn.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                TurnPart::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    pub fn invocations(&self) -> impl Iterator<Item = &ToolInvocation> {
        self.parts.iter().filter_map(|part| match part {
            TurnPart::ToolInvocation(invocation) => Some(invocation),
            _ => None,
        })
    }

    pub fn results(&self) -> impl Iterator<Item = &ToolResult> {
        self.parts.iter().filter_map(|part| match part {
            TurnPart::ToolResult(result) => Some(result),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    #[test]
    fn test_assistant_turn_without_text_has_only_invocations() {
        let invocation = ToolInvocation::new("call-1", "saveResolution", Map::new());
        let turn = ConversationTurn::assistant("", vec![invocation.clone()]);

        assert_eq!(turn.role, MessageRole::Assistant);
        assert_eq!(turn.parts, vec![TurnPart::ToolInvocation(invocation)]);
        assert_eq!(turn.text(), "");
    }

    #[test]
    fn test_tool_results_turn_keeps_order() {
        let first = ToolResult {
            invocation_id: "a".into(),
            name: "saveResolution".into(),
            outcome: "ok".into(),
        };
        let second = ToolResult {
            invocation_id: "b".into(),
            ..first.clone()
        };
        let turn = ConversationTurn::tool_results(vec![first, second]);

        let ids: Vec<&str> = turn.results().map(|r| r.invocation_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(turn.role, MessageRole::User);
    }
}

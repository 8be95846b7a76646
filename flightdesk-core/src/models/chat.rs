// flightdesk-core/src/models/chat.rs
use super::tools::ToolCall;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Author of a chat message, serialized in the lowercase form the
/// chat-completions API expects.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    #[default]
    User,
    Assistant,
    Tool,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        };
        f.write_str(name)
    }
}

/// A message in the sequence sent to or received from the model.
/// Can represent system, user, assistant, or tool messages.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: Some(content.into()),
            ..Default::default()
        }
    }

    /// Result of executing the tool call identified by `tool_call_id`.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_call_id: Some(tool_call_id.into()),
            ..Default::default()
        }
    }

    /// Text content, or an empty string for content-less messages.
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }

    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls.as_ref().is_some_and(|calls| !calls.is_empty())
    }
}

/// One of the choices returned by the chat-completions API.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Choice {
    pub index: u32,
    pub message: ChatMessage,
    #[serde(default)]
    pub finish_reason: String,
}

/// The overall structure of a chat-completions response.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ApiResponse {
    pub id: String,
    pub choices: Vec<Choice>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tools::ToolFunction;
    use serde_json::json;

    #[test]
    fn test_tool_result_serializes_call_id() {
        let msg =
            ChatMessage::tool_result("call_1", "No flights found matching the search criteria.");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            json!({
                "role": "tool",
                "content": "No flights found matching the search criteria.",
                "tool_call_id": "call_1"
            })
        );
    }

    #[test]
    fn test_assistant_tool_call_message_omits_missing_content() {
        let msg = ChatMessage {
            role: Role::Assistant,
            content: None,
            tool_calls: Some(vec![ToolCall {
                id: "call_9".into(),
                call_type: "function".into(),
                function: ToolFunction {
                    name: "search_flights".into(),
                    arguments: r#"{"flight_number":"AA100"}"#.into(),
                },
            }]),
            tool_call_id: None,
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert!(value.get("content").is_none());
        assert_eq!(value["tool_calls"][0]["type"], "function");
        assert!(msg.has_tool_calls());
    }

    #[test]
    fn test_role_display_matches_wire_name() {
        assert_eq!(Role::Assistant.to_string(), "assistant");
        assert_eq!(serde_json::to_value(Role::Tool).unwrap(), json!("tool"));
    }
}

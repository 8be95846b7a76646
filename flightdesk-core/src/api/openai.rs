// flightdesk-core/src/api/openai.rs

//! OpenAI chat-completions wire format, as spoken by OpenRouter.

use super::ChatApiProvider;
use crate::config::DEFAULT_CHAT_ENDPOINT;
use crate::models::chat::{ApiResponse, ChatMessage, Choice, Role};
use crate::models::tools::{ToolCall, ToolDefinition, ToolFunction};
use anyhow::{Context, Result, anyhow};
use serde_json::{Value, json};
use std::collections::HashMap;
use toml::Value as TomlValue;
use tracing::warn;
use uuid::Uuid;

pub struct OpenAIProvider {
    api_key: String,
    endpoint: Option<String>,
    app_title: Option<String>,
}

impl OpenAIProvider {
    pub fn new(api_key: String, endpoint: Option<String>) -> Self {
        Self {
            api_key,
            endpoint,
            app_title: None,
        }
    }

    /// Sets the `X-Title` header OpenRouter uses for app attribution.
    pub fn with_app_title(mut self, title: Option<String>) -> Self {
        self.app_title = title;
        self
    }
}

impl ChatApiProvider for OpenAIProvider {
    fn build_payload(
        &self,
        model_name: &str,
        messages: Vec<ChatMessage>,
        tools: Option<&[ToolDefinition]>,
        parameters: Option<&TomlValue>,
    ) -> Result<Value> {
        let mut payload = json!({
            "model": model_name,
            "messages": messages
        });

        if let Some(tools) = tools.filter(|t| !t.is_empty()) {
            let tools_with_type: Vec<Value> = tools
                .iter()
                .map(|t| json!({ "type": "function", "function": t }))
                .collect();
            payload["tools"] = json!(tools_with_type);
            payload["tool_choice"] = json!("auto");
        }

        if let Some(table) = parameters.and_then(|p| p.as_table()) {
            for (key, value) in table {
                if matches!(key.as_str(), "model" | "messages" | "tools") {
                    warn!(
                        parameter = %key,
                        "Ignoring model parameter that would overwrite the request"
                    );
                    continue;
                }
                payload[key] = serde_json::to_value(value)
                    .with_context(|| format!("Failed to convert model parameter '{}'", key))?;
            }
        }

        Ok(payload)
    }

    fn parse_response(&self, response_body: &str) -> Result<ApiResponse> {
        let raw: Value = serde_json::from_str(response_body)
            .with_context(|| {
                format!("Failed to parse chat completion response: {}", response_body)
            })?;

        if let Some(error) = raw.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return Err(anyhow!("Provider returned an error: {}", message));
        }

        let id = raw
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| {
                warn!("No ID in chat completion response, generating one");
                format!("resp_{}", Uuid::new_v4())
            });

        let choices: Vec<Choice> = raw
            .get("choices")
            .and_then(Value::as_array)
            .map(|choices| {
                choices
                    .iter()
                    .enumerate()
                    .filter_map(|(index, choice)| parse_choice(index, choice))
                    .collect()
            })
            .unwrap_or_default();

        if choices.is_empty() {
            return Err(anyhow!(
                "Failed to extract choices from chat completion response: {}",
                response_body
            ));
        }

        Ok(ApiResponse { id, choices })
    }

    fn build_headers(&self) -> Result<HashMap<String, String>> {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        if !self.api_key.is_empty() {
            headers.insert(
                "Authorization".to_string(),
                format!("Bearer {}", self.api_key),
            );
        }
        if let Some(title) = &self.app_title {
            headers.insert("X-Title".to_string(), title.clone());
        }
        Ok(headers)
    }

    fn get_endpoint(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_CHAT_ENDPOINT.to_string())
    }
}

fn parse_choice(index: usize, choice: &Value) -> Option<Choice> {
    let message = choice.get("message")?;
    let role = match message.get("role").and_then(Value::as_str) {
        Some("assistant") | None => Role::Assistant,
        Some(other) => serde_json::from_value(json!(other)).ok()?,
    };
    let content = message
        .get("content")
        .and_then(Value::as_str)
        .map(str::to_string);
    let tool_calls = message
        .get("tool_calls")
        .and_then(Value::as_array)
        .map(|calls| calls.iter().filter_map(parse_tool_call).collect::<Vec<_>>())
        .filter(|calls| !calls.is_empty());
    let finish_reason = choice
        .get("finish_reason")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Some(Choice {
        index: choice
            .get("index")
            .and_then(Value::as_u64)
            .map(|i| i as u32)
            .unwrap_or(index as u32),
        message: ChatMessage {
            role,
            content,
            tool_calls,
            tool_call_id: None,
        },
        finish_reason,
    })
}

fn parse_tool_call(call: &Value) -> Option<ToolCall> {
    let function = call.get("function")?;
    let name = function.get("name")?.as_str()?;
    // Some models omit arguments entirely for parameterless calls.
    let arguments = match function.get("arguments") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "{}".to_string(),
        Some(other) => other.to_string(),
    };
    let id = call
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("call_{}", Uuid::new_v4().simple()));
    Some(ToolCall {
        id,
        call_type: "function".to_string(),
        function: ToolFunction {
            name: name.to_string(),
            arguments,
        },
    })
}

// flightdesk-core/src/api/mod.rs

//! HTTP transport for chat-completions style APIs.

use crate::models::chat::{ApiResponse, ChatMessage};
use crate::models::tools::ToolDefinition;
use crate::utils::truncate_string;
use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use std::collections::HashMap;
use toml::Value as TomlValue;
use tracing::{debug, trace, warn};

pub mod openai;

const MAX_ERROR_BODY_CHARS: usize = 500;

pub trait ChatApiProvider: Send + Sync {
    /// Builds the request payload for the specific API provider
    fn build_payload(
        &self,
        model_name: &str,
        messages: Vec<ChatMessage>,
        tools: Option<&[ToolDefinition]>,
        parameters: Option<&TomlValue>,
    ) -> Result<Value>;

    /// Parses the API response into our common ApiResponse format
    fn parse_response(&self, response_body: &str) -> Result<ApiResponse>;

    fn build_headers(&self) -> Result<HashMap<String, String>>;

    fn get_endpoint(&self) -> String;
}

/// Sends one chat-completions request. No retries: a failed call is
/// reported to the caller as an error.
pub async fn call_chat_completion_api(
    http_client: &Client,
    provider: &dyn ChatApiProvider,
    model_name: &str,
    messages: Vec<ChatMessage>,
    tools: Option<&[ToolDefinition]>,
    parameters: Option<&TomlValue>,
) -> Result<ApiResponse> {
    let endpoint = provider.get_endpoint();
    let headers = provider.build_headers()?;
    let payload = provider.build_payload(model_name, messages, tools, parameters)?;

    let mut header_map = HeaderMap::new();
    for (key, value) in headers {
        match (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            (Ok(name), Ok(val)) => {
                header_map.insert(name, val);
            }
            _ => warn!(header = %key, "Skipping header with invalid name or value"),
        }
    }

    debug!(endpoint = %endpoint, model = %model_name, "Sending chat completion request");
    trace!(payload = %payload, "Chat completion payload");

    let response = http_client
        .post(&endpoint)
        .headers(header_map)
        .json(&payload)
        .send()
        .await
        .with_context(|| format!("Failed to send request to {}", endpoint))?;

    let status = response.status();
    let response_text = response
        .text()
        .await
        .context("Failed to read chat completion response body")?;

    if !status.is_success() {
        debug!(%status, body = %response_text, "Chat completion request failed");
        return Err(anyhow!(
            "API call failed with status {}: {}",
            status,
            truncate_string(&response_text, MAX_ERROR_BODY_CHARS)
        ));
    }

    trace!(body = %response_text, "Chat completion response");
    provider.parse_response(&response_text)
}

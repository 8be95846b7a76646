// flightdesk-core/src/providers/openrouter.rs
use super::Provider;
use crate::api::{self, openai::OpenAIProvider};
use crate::config::ModelConfig;
use crate::models::chat::{ApiResponse, ChatMessage};
use crate::models::tools::ToolDefinition;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// An OpenAI-compatible chat endpoint, OpenRouter by default.
pub struct OpenRouterProvider {
    config: ModelConfig,
    http_client: Client,
    wire: OpenAIProvider,
}

impl OpenRouterProvider {
    pub fn new(config: ModelConfig, http_client: Client, api_key: String) -> Self {
        let wire = OpenAIProvider::new(api_key, Some(config.endpoint.clone()))
            .with_app_title(config.app_title.clone());
        Self {
            config,
            http_client,
            wire,
        }
    }

    /// Builds a provider with its own HTTP client using the configured timeout.
    pub fn from_config(config: ModelConfig, api_key: String) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client for chat provider")?;
        Ok(Self::new(config, http_client, api_key))
    }
}

#[async_trait]
impl Provider for OpenRouterProvider {
    fn name(&self) -> &str {
        &self.config.model_name
    }

    async fn get_completion(
        &self,
        messages: Vec<ChatMessage>,
        tools: Option<&[ToolDefinition]>,
    ) -> Result<ApiResponse> {
        debug!(
            model = %self.config.model_name,
            num_messages = messages.len(),
            "Requesting completion"
        );
        api::call_chat_completion_api(
            &self.http_client,
            &self.wire,
            &self.config.model_name,
            messages,
            tools,
            self.config.parameters.as_ref(),
        )
        .await
    }
}

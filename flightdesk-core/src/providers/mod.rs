// flightdesk-core/src/providers/mod.rs
use crate::models::chat::{ApiResponse, ChatMessage};
use crate::models::tools::ToolDefinition;
use anyhow::Result;
use async_trait::async_trait;

pub mod openrouter;

pub use openrouter::OpenRouterProvider;

/// A chat model the assistant can send conversations to.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn get_completion(
        &self,
        messages: Vec<ChatMessage>,
        tools: Option<&[ToolDefinition]>,
    ) -> Result<ApiResponse>;
    fn name(&self) -> &str;
}

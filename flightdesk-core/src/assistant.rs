// flightdesk-core/src/assistant.rs

//! The chat orchestrator: one user turn in, one assistant reply out, with
//! any tool calls the model requests resolved in between.

use crate::config::{AppConfig, Secrets};
use crate::models::chat::ChatMessage;
use crate::models::tools::ToolCall;
use crate::providers::{OpenRouterProvider, Provider};
use crate::session::Conversation;
use crate::tools::flights::AviationstackClient;
use crate::tools::{FlightToolProvider, ToolProvider};
use crate::utils::{one_line_preview, truncate_string};
use anyhow::{Context, Result, anyhow};
use chrono::Local;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

/// Reply used when the model never produced usable text.
pub const FALLBACK_REPLY: &str =
    "I apologize, but I'm having trouble processing your request. Please try again.";

const ERROR_REPLY_PREFIX: &str = "Sorry, an error occurred: ";
const MAX_ERROR_REPLY_CHARS: usize = 300;
const LOG_PREVIEW_CHARS: usize = 80;

pub struct FlightAssistant {
    config: AppConfig,
    provider: Arc<dyn Provider>,
    tool_provider: Arc<dyn ToolProvider>,
}

impl FlightAssistant {
    pub fn new(
        config: AppConfig,
        provider: Arc<dyn Provider>,
        tool_provider: Arc<dyn ToolProvider>,
    ) -> Self {
        Self {
            config,
            provider,
            tool_provider,
        }
    }

    /// Wires the OpenRouter provider and the Aviationstack tool from config.
    pub fn from_config(config: AppConfig, secrets: &Secrets) -> Result<Self> {
        let provider =
            OpenRouterProvider::from_config(config.model.clone(), secrets.llm_api_key.clone())?;
        let flights =
            AviationstackClient::from_config(&config.flights, secrets.flight_api_key.clone())?;
        info!(
            model = %config.model.model_name,
            max_tool_rounds = config.max_tool_rounds,
            "Initialized flight assistant."
        );
        Ok(Self::new(
            config,
            Arc::new(provider),
            Arc::new(FlightToolProvider::new(flights)),
        ))
    }

    pub fn model_name(&self) -> &str {
        self.provider.name()
    }

    /// Takes the session history and new input, returns the updated history
    /// and the assistant's reply.
    pub async fn chat(
        &self,
        mut history: Conversation,
        user_input: &str,
    ) -> (Conversation, String) {
        let reply = self.respond(&mut history, user_input).await;
        (history, reply)
    }

    /// Runs one turn against `conversation`, appending the user input and
    /// the reply. Never fails: LLM errors become the reply text.
    pub async fn respond(&self, conversation: &mut Conversation, user_input: &str) -> String {
        info!(
            session_id = %conversation.id(),
            input = %one_line_preview(user_input, LOG_PREVIEW_CHARS),
            "Starting turn."
        );
        conversation.push_user(user_input);

        let mut working = Vec::with_capacity(conversation.len() + 1);
        working.push(ChatMessage::system(
            self.config.system_prompt_for(Local::now().date_naive()),
        ));
        working.extend(conversation.messages().iter().cloned());

        let reply = match self.complete_turn(working).await {
            Ok(text) => text,
            Err(e) => {
                error!(session_id = %conversation.id(), error = ?e, "Turn failed.");
                format!(
                    "{}{}",
                    ERROR_REPLY_PREFIX,
                    truncate_string(&format!("{:#}", e), MAX_ERROR_REPLY_CHARS)
                )
            }
        };

        conversation.push_assistant(reply.clone());
        debug!(
            session_id = %conversation.id(),
            num_messages = conversation.len(),
            "Turn finished."
        );
        reply
    }

    async fn complete_turn(&self, mut working: Vec<ChatMessage>) -> Result<String> {
        let tool_definitions = self.tool_provider.get_tool_definitions();
        let tools = (!tool_definitions.is_empty()).then_some(tool_definitions.as_slice());
        let mut last_text: Option<String> = None;

        for round in 1..=self.config.max_tool_rounds {
            debug!(
                round,
                num_messages = working.len(),
                num_tools = tool_definitions.len(),
                "Sending request to AI model."
            );
            let response = self
                .provider
                .get_completion(working.clone(), tools)
                .await
                .context("Chat completion request failed")?;

            let message = response
                .choices
                .into_iter()
                .next()
                .map(|choice| choice.message)
                .ok_or_else(|| anyhow!("API response contained no choices"))?;
            trace!(message = ?message, "Assistant message");

            let text = message
                .content
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string);

            if !message.has_tool_calls() {
                info!(round, "Received final response from AI.");
                return Ok(text.unwrap_or_else(|| FALLBACK_REPLY.to_string()));
            }

            if text.is_some() {
                last_text = text;
            }
            let tool_calls = message.tool_calls.clone().unwrap_or_default();
            info!(
                count = tool_calls.len(),
                round,
                "AI requested {} tool call(s).",
                tool_calls.len()
            );

            working.push(message);
            for call in &tool_calls {
                let result = self.run_tool_call(call).await;
                working.push(result);
            }
        }

        warn!(
            limit = self.config.max_tool_rounds,
            "Tool round limit reached without a final answer."
        );
        Ok(last_text.unwrap_or_else(|| FALLBACK_REPLY.to_string()))
    }

    /// Executes one requested call. Errors become an `Error:` tool message
    /// so the model can recover conversationally.
    async fn run_tool_call(&self, call: &ToolCall) -> ChatMessage {
        let tool_name = &call.function.name;
        debug!(
            tool_call_id = %call.id,
            tool_name = %tool_name,
            arguments = %call.function.arguments,
            "Executing tool '{}'.", tool_name
        );

        let output = match self
            .tool_provider
            .execute_tool(tool_name, &call.function.arguments)
            .await
        {
            Ok(output) => {
                info!(
                    tool_call_id = %call.id,
                    tool_name = %tool_name,
                    output = %one_line_preview(&output, LOG_PREVIEW_CHARS),
                    "Tool '{}' finished.", tool_name
                );
                output
            }
            Err(e) => {
                warn!(
                    tool_call_id = %call.id,
                    tool_name = %tool_name,
                    error = %e,
                    "Tool call rejected."
                );
                format!("Error: {:#}", e)
            }
        };
        ChatMessage::tool_result(call.id.clone(), output)
    }
}

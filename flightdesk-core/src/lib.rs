// flightdesk-core/src/lib.rs

//! Core library for Flightdesk, a conversational flight search assistant.
//!
//! A [`FlightAssistant`] forwards the conversation to an OpenAI-compatible
//! chat-completions endpoint (OpenRouter by default) together with the
//! `search_flights` tool schema. When the model requests the tool, the
//! assistant queries the Aviationstack API and feeds the summary back to the
//! model for a final natural-language answer.
//!
//! UI front-ends own a [`Conversation`] per session and call
//! [`FlightAssistant::respond`] (or [`FlightAssistant::chat`]) once per user turn.

pub mod api;
pub mod assistant;
pub mod config;
pub mod errors;
pub mod providers;
pub mod session;
pub mod tools;
pub mod utils;

pub mod models {
    pub mod chat;
    pub mod flights;
    pub mod tools;
}

pub use assistant::FlightAssistant;
pub use config::{AppConfig, FlightApiConfig, ModelConfig, Secrets, ServerConfig};
pub use errors::{ConfigError, ToolArgumentError};
pub use models::chat::{ApiResponse, ChatMessage, Choice, Role};
pub use models::flights::{FlightResult, FlightSearchParams};
pub use models::tools::{ToolCall, ToolDefinition, ToolFunction};
pub use providers::Provider;
pub use session::Conversation;
pub use tools::ToolProvider;

pub use async_trait::async_trait;

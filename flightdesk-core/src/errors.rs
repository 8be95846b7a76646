// flightdesk-core/src/errors.rs
use thiserror::Error;

/// Errors raised while loading configuration or secrets at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required API key is absent from the environment and `.env`.
    #[error("Missing API key: environment variable '{var}' is not set")]
    MissingSecret { var: String },

    /// A configuration value failed validation.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        ConfigError::Invalid(msg.into())
    }
}

/// Errors in a tool call requested by the model. These never abort a turn;
/// they are relayed back to the model as a tool-result message.
#[derive(Error, Debug)]
pub enum ToolArgumentError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    /// The argument string is not JSON, has unknown fields, or has wrongly typed values.
    #[error("malformed arguments: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("invalid {field} '{value}': expected {expected}")]
    Invalid {
        field: &'static str,
        value: String,
        expected: &'static str,
    },
}

// flightdesk-core/src/config.rs

//! Configuration structures, `Flightdesk.toml` discovery, and API key loading.
//!
//! Every setting has a default, so the file is optional. The two API keys are
//! never stored in the file; only the names of the environment variables that
//! hold them are.

use crate::errors::ConfigError;
use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

pub const CONFIG_FILENAME: &str = "Flightdesk.toml";

pub const DEFAULT_CHAT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";
pub const DEFAULT_LLM_KEY_VAR: &str = "OPENROUTER_API_KEY";
pub const DEFAULT_FLIGHTS_ENDPOINT: &str = "https://api.aviationstack.com/v1/flights";
pub const DEFAULT_FLIGHTS_KEY_VAR: &str = "CLIENTSECRET";
pub const DEFAULT_BIND: &str = "127.0.0.1:8501";
pub const DEFAULT_SESSION_TTL_SECS: u64 = 3600;

pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a friendly and helpful AI flight booking assistant. Your primary role is to help users search for flights, check flight status, and find flight schedules using real-time flight data from the Aviationstack API.

When users ask about flights, flight schedules, or flight status, proactively use the search_flights tool to retrieve accurate, up-to-date information. You can search by:
- Flight number (e.g., "AA100")
- Departure and arrival airports (IATA codes like JFK, LAX, LHR)
- Flight date (YYYY-MM-DD format)
- Airline (IATA codes like AA, DL, UA)

Provide clear, concise, and helpful responses. When presenting flight information, format it in an easy-to-read manner. If flight information is unavailable or cannot be found, say so plainly and never invent flight numbers, times, or statuses. Always use the search_flights tool for flight-related questions rather than making assumptions."#;

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AppConfig {
    /// Overrides [`DEFAULT_SYSTEM_PROMPT`].
    pub system_prompt: Option<String>,
    /// Upper bound on LLM requests per user turn.
    pub max_tool_rounds: usize,
    pub model: ModelConfig,
    pub flights: FlightApiConfig,
    pub server: ServerConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ModelConfig {
    pub model_name: String,
    pub endpoint: String,
    pub api_key_env_var: String,
    pub timeout_secs: u64,
    /// Extra request fields such as `temperature`, copied into the payload.
    pub parameters: Option<toml::Value>,
    /// Sent as OpenRouter's `X-Title` attribution header.
    pub app_title: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct FlightApiConfig {
    pub endpoint: String,
    pub api_key_env_var: String,
    pub timeout_secs: u64,
    pub max_results: usize,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Web sessions idle for longer than this are dropped.
    pub session_ttl_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            system_prompt: None,
            max_tool_rounds: 5,
            model: ModelConfig::default(),
            flights: FlightApiConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_CHAT_ENDPOINT.to_string(),
            api_key_env_var: DEFAULT_LLM_KEY_VAR.to_string(),
            timeout_secs: 60,
            parameters: None,
            app_title: Some("Flightdesk".to_string()),
        }
    }
}

impl Default for FlightApiConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_FLIGHTS_ENDPOINT.to_string(),
            api_key_env_var: DEFAULT_FLIGHTS_KEY_VAR.to_string(),
            timeout_secs: 10,
            max_results: 5,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(config_toml_content: &str) -> Result<AppConfig> {
        let config: AppConfig = toml::from_str(config_toml_content).map_err(|e| {
            tracing::error!(error = %e, "Failed to parse TOML content");
            anyhow!(e)
        })
        .context("Failed to parse configuration TOML content. Check TOML syntax.")?;
        config.validate()?;
        tracing::debug!("Parsed and validated configuration.");
        Ok(config)
    }

    /// Loads `path` if given, otherwise the nearest `Flightdesk.toml` at or
    /// above the current directory, otherwise the defaults. Returns the file
    /// actually used.
    pub fn load(path: Option<&Path>) -> Result<(AppConfig, Option<PathBuf>)> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => {
                let cwd = std::env::current_dir().context("Failed to get current directory")?;
                find_config_file(&cwd)
            }
        };
        match path {
            Some(path) => {
                let content = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file: {:?}", path))?;
                let config = AppConfig::from_toml_str(&content)
                    .with_context(|| format!("Invalid config file: {:?}", path))?;
                Ok((config, Some(path)))
            }
            None => Ok((AppConfig::default(), None)),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(prompt) = &self.system_prompt {
            if prompt.trim().is_empty() {
                return Err(ConfigError::invalid("'system_prompt' is empty"));
            }
        }
        if self.max_tool_rounds == 0 {
            return Err(ConfigError::invalid("'max_tool_rounds' must be at least 1"));
        }
        if self.model.model_name.trim().is_empty() {
            return Err(ConfigError::invalid("'model.model_name' is empty"));
        }
        validate_endpoint("model.endpoint", &self.model.endpoint)?;
        validate_endpoint("flights.endpoint", &self.flights.endpoint)?;
        for (key, var) in [
            ("model.api_key_env_var", &self.model.api_key_env_var),
            ("flights.api_key_env_var", &self.flights.api_key_env_var),
        ] {
            if var.trim().is_empty() {
                return Err(ConfigError::invalid(format!("'{}' is empty", key)));
            }
        }
        if self.model.timeout_secs == 0 || self.flights.timeout_secs == 0 {
            return Err(ConfigError::invalid("timeouts must be at least 1 second"));
        }
        if self.server.session_ttl_secs == 0 {
            return Err(ConfigError::invalid(
                "'server.session_ttl_secs' must be at least 1",
            ));
        }
        if self.flights.max_results == 0 {
            return Err(ConfigError::invalid("'flights.max_results' must be at least 1"));
        }
        if let Some(params) = &self.model.parameters {
            if !params.is_table() {
                return Err(ConfigError::invalid(
                    "'model.parameters' must be a TOML table",
                ));
            }
        }
        Ok(())
    }

    /// The system prompt for a turn taking place on `today`.
    pub fn system_prompt_for(&self, today: NaiveDate) -> String {
        let base = self.system_prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT);
        format!("{}\n\nToday's date is {}.", base.trim_end(), today.format("%Y-%m-%d"))
    }
}

fn validate_endpoint(key: &str, endpoint: &str) -> Result<(), ConfigError> {
    let url = Url::parse(endpoint).map_err(|e| {
        ConfigError::invalid(format!(
            "'{}' ('{}') is not a valid URL: {}",
            key, endpoint, e
        ))
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::invalid(format!(
            "'{}' must use http or https, got '{}'",
            key,
            url.scheme()
        )));
    }
    Ok(())
}

/// Walks from `start` up to the filesystem root looking for `Flightdesk.toml`.
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILENAME))
        .find(|candidate| candidate.is_file())
}

/// API keys for the two external services, loaded once at startup.
#[derive(Clone)]
pub struct Secrets {
    pub llm_api_key: String,
    pub flight_api_key: String,
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("llm_api_key", &"<redacted>")
            .field("flight_api_key", &"<redacted>")
            .finish()
    }
}

impl Secrets {
    /// Reads both keys from the process environment. Call after `.env` has been loaded.
    pub fn from_env(config: &AppConfig) -> Result<Self, ConfigError> {
        Self::from_lookup(config, |var| std::env::var(var).ok())
    }

    /// Reads both keys through `lookup`; blank values count as missing.
    pub fn from_lookup<F>(config: &AppConfig, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let fetch = |var: &str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::MissingSecret {
                    var: var.to_string(),
                })
        };
        Ok(Self {
            llm_api_key: fetch(&config.model.api_key_env_var)?,
            flight_api_key: fetch(&config.flights.api_key_env_var)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_config_content() -> String {
        r#"
            system_prompt = "You only talk about flights."
            max_tool_rounds = 3

            [model]
            model_name = "anthropic/claude-3.5-haiku"
            endpoint = "https://example.com/v1/chat/completions"
            api_key_env_var = "MY_LLM_KEY"
            parameters = { temperature = 0.2 }

            [flights]
            max_results = 3
            timeout_secs = 5

            [server]
            bind = "0.0.0.0:9000"
            session_ttl_secs = 600
        "#
        .to_string()
    }

    #[test]
    fn test_config_parse_success() {
        let content = full_config_content();
        let result = AppConfig::from_toml_str(&content);
        assert!(result.is_ok(), "Parse failed: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.max_tool_rounds, 3);
        assert_eq!(config.model.model_name, "anthropic/claude-3.5-haiku");
        assert_eq!(config.model.api_key_env_var, "MY_LLM_KEY");
        assert_eq!(config.model.timeout_secs, 60);
        assert_eq!(config.flights.max_results, 3);
        assert_eq!(config.flights.endpoint, DEFAULT_FLIGHTS_ENDPOINT);
        assert_eq!(config.flights.api_key_env_var, DEFAULT_FLIGHTS_KEY_VAR);
        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(config.server.session_ttl_secs, 600);
    }

    #[test]
    fn test_empty_file_yields_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config.model.endpoint, DEFAULT_CHAT_ENDPOINT);
        assert_eq!(config.model.api_key_env_var, "OPENROUTER_API_KEY");
        assert_eq!(config.flights.api_key_env_var, "CLIENTSECRET");
        assert_eq!(config.max_tool_rounds, 5);
        assert_eq!(config.server.bind, DEFAULT_BIND);
        assert_eq!(config.server.session_ttl_secs, DEFAULT_SESSION_TTL_SECS);
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let result = AppConfig::from_toml_str(
            r#"
            [flights]
            endpoint = "not a url"
            "#,
        );
        let error_string = format!("{:#}", result.unwrap_err());
        assert!(
            error_string.contains("flights.endpoint"),
            "Unexpected error message: {}",
            error_string
        );
    }

    #[test]
    fn test_zero_session_ttl_rejected() {
        let result = AppConfig::from_toml_str("[server]\nsession_ttl_secs = 0");
        let error_string = format!("{:#}", result.unwrap_err());
        assert!(error_string.contains("session_ttl_secs"), "{}", error_string);
    }

    #[test]
    fn test_zero_rounds_rejected() {
        let result = AppConfig::from_toml_str("max_tool_rounds = 0");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_finds_file_in_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), full_config_content()).unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let found = find_config_file(&nested).unwrap();
        assert_eq!(found, dir.path().join(CONFIG_FILENAME));

        let (config, used) = AppConfig::load(Some(&found)).unwrap();
        assert_eq!(used.as_deref(), Some(found.as_path()));
        assert_eq!(config.max_tool_rounds, 3);
    }

    #[test]
    fn test_system_prompt_includes_date() {
        let config = AppConfig::default();
        let today = NaiveDate::from_ymd_opt(2026, 1, 29).unwrap();
        let prompt = config.system_prompt_for(today);
        assert!(prompt.starts_with("You are a friendly and helpful AI flight booking assistant."));
        assert!(prompt.ends_with("Today's date is 2026-01-29."));
    }

    #[test]
    fn test_secrets_missing_flight_key() {
        let config = AppConfig::default();
        let env: HashMap<&str, &str> = [("OPENROUTER_API_KEY", "sk-or-test")].into();
        let err = Secrets::from_lookup(&config, |var| env.get(var).map(|v| v.to_string()))
            .unwrap_err();
        match err {
            ConfigError::MissingSecret { var } => assert_eq!(var, "CLIENTSECRET"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_secrets_blank_value_counts_as_missing() {
        let config = AppConfig::default();
        let env: HashMap<&str, &str> =
            [("OPENROUTER_API_KEY", "   "), ("CLIENTSECRET", "abc")].into();
        let err = Secrets::from_lookup(&config, |var| env.get(var).map(|v| v.to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("OPENROUTER_API_KEY"));
    }

    #[test]
    fn test_secrets_loaded_and_redacted() {
        let config = AppConfig::default();
        let env: HashMap<&str, &str> =
            [("OPENROUTER_API_KEY", "sk-or-test"), ("CLIENTSECRET", "av-key")].into();
        let secrets =
            Secrets::from_lookup(&config, |var| env.get(var).map(|v| v.to_string())).unwrap();
        assert_eq!(secrets.llm_api_key, "sk-or-test");
        assert_eq!(secrets.flight_api_key, "av-key");
        assert!(!format!("{:?}", secrets).contains("av-key"));
    }
}

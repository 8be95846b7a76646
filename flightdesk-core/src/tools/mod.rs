// flightdesk-core/src/tools/mod.rs

//! Tools the model can call, and the [`ToolProvider`] seam the assistant
//! executes them through.

pub mod flights;
pub mod registry;

use crate::errors::ToolArgumentError;
use crate::models::flights::FlightSearchParams;
use crate::models::tools::ToolDefinition;
use anyhow::Result;
use async_trait::async_trait;
use flights::AviationstackClient;
use tracing::debug;

/// Supplies tool schemas to the model and executes the calls it requests.
#[async_trait]
pub trait ToolProvider: Send + Sync {
    fn get_tool_definitions(&self) -> Vec<ToolDefinition>;

    /// Executes `tool_name` with the model's raw JSON `arguments`.
    ///
    /// Failures that the tool can describe in words (service down, nothing
    /// found) come back as `Ok` text. `Err` is reserved for calls that could
    /// not be executed at all, such as unknown tools or malformed arguments.
    async fn execute_tool(&self, tool_name: &str, arguments: &str) -> Result<String>;
}

/// Serves `search_flights` from Aviationstack.
pub struct FlightToolProvider {
    client: AviationstackClient,
}

impl FlightToolProvider {
    pub fn new(client: AviationstackClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolProvider for FlightToolProvider {
    fn get_tool_definitions(&self) -> Vec<ToolDefinition> {
        registry::all_definitions()
    }

    async fn execute_tool(&self, tool_name: &str, arguments: &str) -> Result<String> {
        match tool_name {
            registry::SEARCH_FLIGHTS => {
                let params = FlightSearchParams::from_arguments(arguments)?.normalized()?;
                debug!(?params, "Running search_flights");
                Ok(self.client.search_flights(&params).await)
            }
            other => Err(ToolArgumentError::UnknownTool(other.to_string()).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Client;

    fn offline_provider() -> FlightToolProvider {
        FlightToolProvider::new(AviationstackClient::new(
            Client::new(),
            "http://127.0.0.1:9/v1/flights".to_string(),
            "k".to_string(),
            5,
        ))
    }

    #[tokio::test]
    async fn test_unknown_tool_is_an_error() {
        let err = offline_provider()
            .execute_tool("book_hotel", "{}")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "unknown tool 'book_hotel'");
    }

    #[tokio::test]
    async fn test_malformed_arguments_are_an_error() {
        let provider = offline_provider();
        let err = provider
            .execute_tool(registry::SEARCH_FLIGHTS, "{dep_iata: JFK")
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("malformed arguments"));

        let err = provider
            .execute_tool(registry::SEARCH_FLIGHTS, r#"{"dep_iata": 42}"#)
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<ToolArgumentError>().is_some());

        let err = provider
            .execute_tool(registry::SEARCH_FLIGHTS, r#"{"dep_iata": "NEW YORK"}"#)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("3-letter airport code"));
    }

    #[test]
    fn test_definitions_expose_search_flights() {
        let defs = offline_provider().get_tool_definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, registry::SEARCH_FLIGHTS);
    }
}

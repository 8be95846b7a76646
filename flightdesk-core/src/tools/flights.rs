// flightdesk-core/src/tools/flights.rs

//! The flight-search tool: one GET against Aviationstack, summarized as text.

use crate::config::FlightApiConfig;
use crate::models::flights::{AviationstackResponse, FlightResult, FlightSearchParams};
use crate::utils::truncate_string;
use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const NO_FLIGHTS_FOUND: &str = "No flights found matching the search criteria.";

#[derive(Error, Debug)]
pub enum FlightSearchError {
    #[error("could not reach flight data service ({0})")]
    Transport(#[source] reqwest::Error),

    #[error("could not reach flight data service (HTTP {status})")]
    Status { status: StatusCode, body: String },

    #[error("malformed response from flight data service: {0}")]
    Decode(#[source] serde_json::Error),

    /// The service answered with an `error` object.
    #[error("{0}")]
    Api(String),
}

/// Flights returned by one search, capped at the configured maximum.
#[derive(Debug, Clone, Default)]
pub struct FlightSearchOutcome {
    pub flights: Vec<FlightResult>,
    /// Total matches reported by the API's pagination block, if any.
    pub total: Option<u64>,
}

impl FlightSearchOutcome {
    /// Text handed back to the model as the tool result.
    pub fn summary(&self) -> String {
        if self.flights.is_empty() {
            return NO_FLIGHTS_FOUND.to_string();
        }
        let shown = self.flights.len();
        let mut out = match self.total {
            Some(total) if total > shown as u64 => {
                format!("Showing {} of {} matching flights:\n", shown, total)
            }
            _ if shown == 1 => "Found 1 flight:\n".to_string(),
            _ => format!("Found {} flights:\n", shown),
        };
        for (i, flight) in self.flights.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, flight));
        }
        out.truncate(out.trim_end().len());
        out
    }
}

#[derive(Clone)]
pub struct AviationstackClient {
    http_client: Client,
    endpoint: String,
    api_key: String,
    max_results: usize,
}

impl AviationstackClient {
    pub fn new(http_client: Client, endpoint: String, api_key: String, max_results: usize) -> Self {
        Self {
            http_client,
            endpoint,
            api_key,
            max_results,
        }
    }

    pub fn from_config(config: &FlightApiConfig, api_key: String) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client for flight data service")?;
        Ok(Self::new(
            http_client,
            config.endpoint.clone(),
            api_key,
            config.max_results,
        ))
    }

    /// Query string for `params`; the key goes in as `access_key`.
    fn query_params(&self, params: &FlightSearchParams) -> Vec<(&'static str, String)> {
        let mut query = vec![("access_key", self.api_key.clone())];
        let fields = [
            ("flight_iata", &params.flight_number),
            ("dep_iata", &params.dep_iata),
            ("arr_iata", &params.arr_iata),
            ("flight_date", &params.flight_date),
            ("airline_iata", &params.airline_iata),
        ];
        for (name, value) in fields {
            if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
                query.push((name, v.to_string()));
            }
        }
        query
    }

    /// Runs the search. `params` should already be normalized.
    pub async fn fetch_flights(
        &self,
        params: &FlightSearchParams,
    ) -> Result<FlightSearchOutcome, FlightSearchError> {
        debug!(?params, endpoint = %self.endpoint, "Querying flight data service");
        let response = self
            .http_client
            .get(&self.endpoint)
            .query(&self.query_params(params))
            .send()
            .await
            // The URL carries the access key.
            .map_err(|e| FlightSearchError::Transport(e.without_url()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FlightSearchError::Transport(e.without_url()))?;

        if !status.is_success() {
            // Aviationstack reports auth and quota problems as JSON with a 4xx status.
            if let Ok(AviationstackResponse {
                error: Some(error), ..
            }) = serde_json::from_str::<AviationstackResponse>(&body)
            {
                return Err(FlightSearchError::Api(error.describe().to_string()));
            }
            return Err(FlightSearchError::Status {
                status,
                body: truncate_string(&body, 200),
            });
        }

        let parsed: AviationstackResponse =
            serde_json::from_str(&body).map_err(FlightSearchError::Decode)?;
        if let Some(error) = parsed.error {
            return Err(FlightSearchError::Api(error.describe().to_string()));
        }

        let total = parsed.pagination.and_then(|p| p.total);
        let flights: Vec<FlightResult> = parsed
            .data
            .unwrap_or_default()
            .into_iter()
            .take(self.max_results)
            .map(FlightResult::from)
            .collect();
        info!(count = flights.len(), ?total, "Flight search returned results");
        Ok(FlightSearchOutcome { flights, total })
    }

    /// Runs the search and always produces text for the model: the summary,
    /// the no-match message, or an error description.
    pub async fn search_flights(&self, params: &FlightSearchParams) -> String {
        match self.fetch_flights(params).await {
            Ok(outcome) => outcome.summary(),
            Err(FlightSearchError::Api(info)) => {
                warn!(error = %info, "Flight data service returned an API error");
                format!("API Error: {}", info)
            }
            Err(e) => {
                if let FlightSearchError::Status { status, body } = &e {
                    warn!(%status, body = %body, "Flight data service returned an HTTP error");
                } else {
                    warn!(error = %e, "Flight search failed");
                }
                format!("Error: {}", e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(server: &MockServer) -> AviationstackClient {
        AviationstackClient::new(
            Client::new(),
            format!("{}/v1/flights", server.base_url()),
            "av-test-key".to_string(),
            5,
        )
    }

    fn jfk_lax_record() -> serde_json::Value {
        json!({
            "flight_date": "2026-01-29",
            "flight_status": "scheduled",
            "departure": {
                "airport": "John F Kennedy International",
                "iata": "JFK",
                "scheduled": "2026-01-29T08:00:00+00:00",
                "estimated": "2026-01-29T08:00:00+00:00"
            },
            "arrival": {
                "airport": "Los Angeles International",
                "iata": "LAX",
                "scheduled": "2026-01-29T11:25:00+00:00",
                "estimated": null
            },
            "airline": {"name": "American Airlines", "iata": "AA"},
            "flight": {"number": "1", "iata": "AA1"}
        })
    }

    fn route(dep: &str, arr: &str) -> FlightSearchParams {
        FlightSearchParams {
            dep_iata: Some(dep.to_string()),
            arr_iata: Some(arr.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_single_record_summary_mentions_airports_and_status() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v1/flights")
                    .query_param("access_key", "av-test-key")
                    .query_param("dep_iata", "JFK")
                    .query_param("arr_iata", "LAX");
                then.status(200).json_body(json!({
                    "pagination": {"limit": 100, "offset": 0, "count": 1, "total": 1},
                    "data": [jfk_lax_record()]
                }));
            })
            .await;

        let summary = client_for(&server).search_flights(&route("JFK", "LAX")).await;
        mock.assert_async().await;
        assert!(summary.starts_with("Found 1 flight:"), "{}", summary);
        assert!(summary.contains("JFK"));
        assert!(summary.contains("LAX"));
        assert!(summary.contains("status: scheduled"));
        assert!(summary.contains("AA1 (American Airlines)"));
    }

    #[tokio::test]
    async fn test_empty_result_reports_no_matches() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/flights");
                then.status(200)
                    .json_body(json!({"pagination": {"total": 0}, "data": []}));
            })
            .await;

        let summary = client_for(&server).search_flights(&route("JFK", "SYD")).await;
        assert_eq!(summary, NO_FLIGHTS_FOUND);
    }

    #[tokio::test]
    async fn test_results_capped_with_total() {
        let server = MockServer::start_async().await;
        let data: Vec<_> = (0..8).map(|_| jfk_lax_record()).collect();
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/flights");
                then.status(200)
                    .json_body(json!({"pagination": {"total": 42}, "data": data}));
            })
            .await;

        let outcome = client_for(&server)
            .fetch_flights(&route("JFK", "LAX"))
            .await
            .unwrap();
        assert_eq!(outcome.flights.len(), 5);
        assert!(outcome.summary().starts_with("Showing 5 of 42 matching flights:"));
        assert_eq!(outcome.summary().lines().count(), 6);
    }

    #[tokio::test]
    async fn test_http_500_becomes_error_string() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/flights");
                then.status(500).body("Internal Server Error");
            })
            .await;

        let summary = client_for(&server).search_flights(&route("JFK", "LAX")).await;
        assert!(
            summary.starts_with("Error: could not reach flight data service"),
            "{}",
            summary
        );
        assert!(!summary.contains("av-test-key"));
    }

    #[tokio::test]
    async fn test_api_error_object_is_reported() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/flights");
                then.status(401).json_body(json!({
                    "error": {"code": "invalid_access_key", "message": "You have not supplied a valid API Access Key."}
                }));
            })
            .await;

        let summary = client_for(&server).search_flights(&FlightSearchParams::default()).await;
        assert_eq!(
            summary,
            "API Error: You have not supplied a valid API Access Key."
        );
    }

    #[tokio::test]
    async fn test_malformed_json_becomes_error_string() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/flights");
                then.status(200).body("<html>maintenance</html>");
            })
            .await;

        let summary = client_for(&server).search_flights(&route("JFK", "LAX")).await;
        assert!(summary.starts_with("Error: malformed response"), "{}", summary);
    }

    #[tokio::test]
    async fn test_unreachable_service_does_not_leak_key() {
        // Nothing listens on port 9 (discard) in the test environment.
        let client = AviationstackClient::new(
            Client::new(),
            "http://127.0.0.1:9/v1/flights".to_string(),
            "av-secret".to_string(),
            5,
        );
        let summary = client.search_flights(&route("JFK", "LAX")).await;
        assert!(summary.starts_with("Error: could not reach flight data service"));
        assert!(!summary.contains("av-secret"));
    }

    #[test]
    fn test_query_params_map_flight_number() {
        let client = AviationstackClient::new(
            Client::new(),
            "http://unused".to_string(),
            "k".to_string(),
            5,
        );
        let params = FlightSearchParams {
            flight_number: Some("AA100".into()),
            airline_iata: Some("".into()),
            ..Default::default()
        };
        let query = client.query_params(&params);
        assert_eq!(
            query,
            vec![("access_key", "k".to_string()), ("flight_iata", "AA100".to_string())]
        );
    }
}

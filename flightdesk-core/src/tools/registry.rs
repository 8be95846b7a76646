// flightdesk-core/src/tools/registry.rs

//! Static JSON-schema descriptions of the tools offered to the model.

use crate::models::tools::{
    ToolDefinition, ToolParameter, ToolParameterType, ToolParametersDefinition,
};
use std::collections::BTreeMap;

pub const SEARCH_FLIGHTS: &str = "search_flights";

fn string_param(description: &str) -> ToolParameter {
    ToolParameter {
        param_type: ToolParameterType::String,
        description: description.to_string(),
    }
}

pub fn search_flights_definition() -> ToolDefinition {
    let properties = BTreeMap::from([
        (
            "flight_number".to_string(),
            string_param(
                "Flight number in IATA format (e.g., 'AA100', 'DL200'). Leave empty if searching by route.",
            ),
        ),
        (
            "dep_iata".to_string(),
            string_param(
                "Departure airport IATA code (e.g., 'JFK', 'LAX', 'LHR'). Use 3-letter airport codes.",
            ),
        ),
        (
            "arr_iata".to_string(),
            string_param(
                "Arrival airport IATA code (e.g., 'JFK', 'LAX', 'LHR'). Use 3-letter airport codes.",
            ),
        ),
        (
            "flight_date".to_string(),
            string_param(
                "Flight date in YYYY-MM-DD format (e.g., '2026-01-29'). Optional, defaults to today if not specified.",
            ),
        ),
        (
            "airline_iata".to_string(),
            string_param(
                "Airline IATA code (e.g., 'AA' for American Airlines, 'DL' for Delta). Optional.",
            ),
        ),
    ]);

    ToolDefinition {
        name: SEARCH_FLIGHTS.to_string(),
        description: "Search for real-time and historical flight information using the Aviationstack API. \
                      Use this when users ask about flight status, flight schedules, or want to search for flights. \
                      You can search by flight number, departure/arrival airports, flight date, or airline."
            .to_string(),
        parameters: ToolParametersDefinition {
            param_type: "object".to_string(),
            properties,
            required: Vec::new(),
            additional_properties: Some(false),
        },
    }
}

/// Every tool the assistant exposes.
pub fn all_definitions() -> Vec<ToolDefinition> {
    vec![search_flights_definition()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_flights_schema_shape() {
        let value = serde_json::to_value(search_flights_definition()).unwrap();
        assert_eq!(value["name"], "search_flights");
        assert_eq!(value["parameters"]["type"], "object");
        assert_eq!(value["parameters"]["required"], json!([]));
        assert_eq!(value["parameters"]["additionalProperties"], json!(false));
        let props = value["parameters"]["properties"].as_object().unwrap();
        let mut names: Vec<&str> = props.keys().map(String::as_str).collect();
        names.sort_unstable();
        assert_eq!(
            names,
            ["airline_iata", "arr_iata", "dep_iata", "flight_date", "flight_number"]
        );
        assert!(props.values().all(|p| p["type"] == "string"));
    }
}

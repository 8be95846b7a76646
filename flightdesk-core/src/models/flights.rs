// flightdesk-core/src/models/flights.rs

//! Flight search parameters, the Aviationstack wire format, and the flattened
//! [`FlightResult`] handed back to the model.

use crate::errors::ToolArgumentError;
use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

const NOT_AVAILABLE: &str = "N/A";

lazy_static! {
    static ref AIRPORT_CODE: Regex = Regex::new(r"^[A-Z]{3}$").unwrap();
    static ref AIRLINE_CODE: Regex = Regex::new(r"^[A-Z0-9]{2}$").unwrap();
    static ref FLIGHT_DESIGNATOR: Regex = Regex::new(r"^[A-Z0-9]{2}[0-9]{1,4}[A-Z]?$").unwrap();
    static ref ISO_DATE: Regex = Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").unwrap();
}

/// Arguments of the `search_flights` tool, decoded from the model's JSON.
///
/// Unknown fields are rejected so that a model inventing parameters gets an
/// error it can recover from rather than a silently broadened search.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FlightSearchParams {
    #[serde(default)]
    pub flight_number: Option<String>,
    #[serde(default)]
    pub dep_iata: Option<String>,
    #[serde(default)]
    pub arr_iata: Option<String>,
    #[serde(default)]
    pub flight_date: Option<String>,
    #[serde(default)]
    pub airline_iata: Option<String>,
}

impl FlightSearchParams {
    /// Decodes the raw argument string of a tool call. An empty string is
    /// treated as `{}`.
    pub fn from_arguments(arguments: &str) -> Result<Self, ToolArgumentError> {
        let arguments = arguments.trim();
        let arguments = if arguments.is_empty() { "{}" } else { arguments };
        serde_json::from_str(arguments).map_err(ToolArgumentError::Malformed)
    }

    /// Trims and uppercases codes, drops blank values, and checks each
    /// field's format.
    pub fn normalized(&self) -> Result<Self, ToolArgumentError> {
        let flight_number = clean(&self.flight_number, |s| s.replace(' ', "").to_uppercase());
        let dep_iata = clean(&self.dep_iata, |s| s.to_uppercase());
        let arr_iata = clean(&self.arr_iata, |s| s.to_uppercase());
        let airline_iata = clean(&self.airline_iata, |s| s.to_uppercase());
        let flight_date = clean(&self.flight_date, str::to_string);

        check(
            "flight_number",
            &flight_number,
            &FLIGHT_DESIGNATOR,
            "an IATA flight number such as AA100",
        )?;
        check("dep_iata", &dep_iata, &AIRPORT_CODE, "a 3-letter airport code")?;
        check("arr_iata", &arr_iata, &AIRPORT_CODE, "a 3-letter airport code")?;
        check(
            "airline_iata",
            &airline_iata,
            &AIRLINE_CODE,
            "a 2-character airline code",
        )?;
        if let Some(date) = &flight_date {
            // chrono alone accepts unpadded fields such as 2026-1-5.
            if !ISO_DATE.is_match(date) || NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
                return Err(ToolArgumentError::Invalid {
                    field: "flight_date",
                    value: date.clone(),
                    expected: "a date in YYYY-MM-DD format",
                });
            }
        }

        Ok(Self {
            flight_number,
            dep_iata,
            arr_iata,
            flight_date,
            airline_iata,
        })
    }
}

fn clean(value: &Option<String>, f: impl Fn(&str) -> String) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(f)
}

fn check(
    field: &'static str,
    value: &Option<String>,
    pattern: &Regex,
    expected: &'static str,
) -> Result<(), ToolArgumentError> {
    match value {
        Some(v) if !pattern.is_match(v) => Err(ToolArgumentError::Invalid {
            field,
            value: v.clone(),
            expected,
        }),
        _ => Ok(()),
    }
}

// --- Aviationstack wire format ---

/// Top-level body of `GET /v1/flights`.
#[derive(Deserialize, Debug, Default)]
pub struct AviationstackResponse {
    #[serde(default)]
    pub pagination: Option<Pagination>,
    #[serde(default)]
    pub data: Option<Vec<AviationFlight>>,
    #[serde(default)]
    pub error: Option<AviationError>,
}

#[derive(Deserialize, Debug, Default)]
pub struct Pagination {
    #[serde(default)]
    pub total: Option<u64>,
}

#[derive(Deserialize, Debug, Default)]
pub struct AviationError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub info: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl AviationError {
    pub fn describe(&self) -> &str {
        self.info
            .as_deref()
            .or(self.message.as_deref())
            .or(self.code.as_deref())
            .unwrap_or("Unknown error")
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct AviationFlight {
    #[serde(default)]
    pub flight_status: Option<String>,
    #[serde(default)]
    pub departure: Option<AviationEndpoint>,
    #[serde(default)]
    pub arrival: Option<AviationEndpoint>,
    #[serde(default)]
    pub airline: Option<AviationAirline>,
    #[serde(default)]
    pub flight: Option<AviationFlightIdent>,
}

#[derive(Deserialize, Debug, Default)]
pub struct AviationEndpoint {
    #[serde(default)]
    pub airport: Option<String>,
    #[serde(default)]
    pub iata: Option<String>,
    #[serde(default)]
    pub scheduled: Option<String>,
    #[serde(default)]
    pub estimated: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct AviationAirline {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct AviationFlightIdent {
    #[serde(default)]
    pub iata: Option<String>,
}

// --- Flattened result ---

/// One flight, flattened from an Aviationstack record. Missing values are `N/A`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct FlightResult {
    pub flight_number: String,
    pub airline: String,
    pub departure_airport: String,
    pub departure_iata: String,
    pub departure_scheduled: String,
    pub departure_estimated: Option<String>,
    pub arrival_airport: String,
    pub arrival_iata: String,
    pub arrival_scheduled: String,
    pub arrival_estimated: Option<String>,
    pub status: String,
}

fn or_na(value: Option<String>) -> String {
    value
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

impl From<AviationFlight> for FlightResult {
    fn from(flight: AviationFlight) -> Self {
        let departure = flight.departure.unwrap_or_default();
        let arrival = flight.arrival.unwrap_or_default();
        Self {
            flight_number: or_na(flight.flight.and_then(|f| f.iata)),
            airline: or_na(flight.airline.and_then(|a| a.name)),
            departure_airport: or_na(departure.airport),
            departure_iata: or_na(departure.iata),
            departure_scheduled: or_na(departure.scheduled),
            departure_estimated: departure.estimated,
            arrival_airport: or_na(arrival.airport),
            arrival_iata: or_na(arrival.iata),
            arrival_scheduled: or_na(arrival.scheduled),
            arrival_estimated: arrival.estimated,
            status: or_na(flight.flight_status),
        }
    }
}

fn write_time(
    f: &mut fmt::Formatter<'_>,
    scheduled: &str,
    estimated: &Option<String>,
) -> fmt::Result {
    write!(f, "{}", scheduled)?;
    match estimated {
        Some(est) if est != scheduled => write!(f, " (est. {})", est),
        _ => Ok(()),
    }
}

impl fmt::Display for FlightResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {} {} -> {} {} | departs ",
            self.flight_number,
            self.airline,
            self.departure_iata,
            self.departure_airport,
            self.arrival_iata,
            self.arrival_airport,
        )?;
        write_time(f, &self.departure_scheduled, &self.departure_estimated)?;
        write!(f, " | arrives ")?;
        write_time(f, &self.arrival_scheduled, &self.arrival_estimated)?;
        write!(f, " | status: {}", self.status)
    }
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the streetcar delay server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the dataset types so the API contract can evolve independently.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use streetcar_delay_transit_models::DelayIncident;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// A delay incident as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDelay {
    /// Date of the incident.
    pub date: NaiveDate,
    /// Time of day of the incident.
    pub time: NaiveTime,
    /// Line identifier.
    pub line: String,
    /// Location as reported.
    pub location_description: Option<String>,
    /// Delay in minutes.
    pub delay_minutes: Option<f64>,
    /// Stop at the start of the attributed segment.
    pub closest_stop_before: Option<String>,
    /// Stop at the end of the attributed segment.
    pub closest_stop_after: Option<String>,
}

impl From<&DelayIncident> for ApiDelay {
    fn from(incident: &DelayIncident) -> Self {
        Self {
            date: incident.date,
            time: incident.time,
            line: incident.line.clone(),
            location_description: incident.location.clone(),
            delay_minutes: incident.min_delay,
            closest_stop_before: incident.closest_stop_before.clone(),
            closest_stop_after: incident.closest_stop_after.clone(),
        }
    }
}

/// Date and time-of-day filters shared by the delay endpoints.
///
/// Kept as strings so malformed values can be reported as a 400 with a
/// useful message.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayQueryParams {
    /// First date to include (`YYYY-MM-DD`).
    pub date_from: Option<String>,
    /// Last date to include (`YYYY-MM-DD`).
    pub date_until: Option<String>,
    /// Earliest time of day to include (`HH:MM`).
    pub time_from: Option<String>,
    /// Latest time of day to include (`HH:MM`).
    pub time_until: Option<String>,
}

/// Query parameters for the stops endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct StopsQueryParams {
    /// Line identifier.
    pub line: String,
}

/// Query parameters for the line map endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapQueryParams {
    /// Draw stop names next to the stops.
    #[serde(default)]
    pub stop_names: bool,
}

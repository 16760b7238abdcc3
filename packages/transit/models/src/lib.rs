#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Streetcar line, stop, and delay incident types.
//!
//! Coordinates are always stored latitude-first ([`GeoPoint`]). Anything
//! that speaks another axis order (GeoJSON, map projections) converts at
//! its own boundary.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A geographic coordinate in decimal degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
}

impl GeoPoint {
    /// Creates a point from a `(latitude, longitude)` pair.
    #[must_use]
    pub const fn from_lat_lng(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Creates a point from a `(longitude, latitude)` pair, as used by
    /// `GeoJSON` and most planar projections.
    #[must_use]
    pub const fn from_lng_lat(longitude: f64, latitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns `true` when both components are finite numbers.
    #[must_use]
    pub const fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// Day of the week as recorded in the delay data's `Day` column.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

/// The ordered stops of a single streetcar line.
///
/// `stops` and `coordinates` are index-aligned and in travel order. The
/// order is meaningful and must never be changed after loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineStops {
    /// Line identifier (e.g. `"504"`).
    pub line: String,
    /// Stop names in travel order.
    pub stops: Vec<String>,
    /// Stop coordinates in travel order, if the line has been geocoded.
    pub coordinates: Option<Vec<GeoPoint>>,
}

impl LineStops {
    /// Returns the stop coordinates when they can bound at least one
    /// segment: present, aligned with the stop names, finite, and at
    /// least two of them.
    #[must_use]
    pub fn segment_coordinates(&self) -> Option<&[GeoPoint]> {
        let coords = self.coordinates.as_deref()?;
        if coords.len() < 2
            || coords.len() != self.stops.len()
            || !coords.iter().all(GeoPoint::is_finite)
        {
            return None;
        }
        Some(coords)
    }

    /// Returns the `(before, after)` stop names for a segment starting at
    /// `index`.
    #[must_use]
    pub fn segment_names(&self, index: usize) -> Option<(&str, &str)> {
        let before = self.stops.get(index)?;
        let after = self.stops.get(index + 1)?;
        Some((before.as_str(), after.as_str()))
    }
}

/// A single recorded streetcar delay incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayIncident {
    /// Date the incident occurred.
    pub date: NaiveDate,
    /// Time of day the incident occurred.
    pub time: NaiveTime,
    /// Line identifier.
    pub line: String,
    /// Day of the week, as reported.
    pub day: Option<DayOfWeek>,
    /// Free-text location description.
    pub location: Option<String>,
    /// Incident type (e.g. `"Mechanical"`).
    pub incident: Option<String>,
    /// Delay in minutes.
    pub min_delay: Option<f64>,
    /// Gap between vehicles in minutes.
    pub min_gap: Option<f64>,
    /// Direction of travel.
    pub bound: Option<String>,
    /// Vehicle number.
    pub vehicle: Option<String>,
    /// Geocoded location of the incident.
    pub coordinates: Option<GeoPoint>,
    /// Stop at the start of the segment the incident was attributed to.
    pub closest_stop_before: Option<String>,
    /// Stop at the end of the segment the incident was attributed to.
    pub closest_stop_after: Option<String>,
}

impl DelayIncident {
    /// Returns the attributed `(before, after)` stop pair, if both are set.
    #[must_use]
    pub fn stop_pair(&self) -> Option<(&str, &str)> {
        Some((
            self.closest_stop_before.as_deref()?,
            self.closest_stop_after.as_deref()?,
        ))
    }
}

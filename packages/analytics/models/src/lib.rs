#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Filter parameters and result types for delay analytics.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Default number of incident types reported per segment.
pub const DEFAULT_TOP_INCIDENT_TYPES: usize = 3;

/// Date and time-of-day bounds applied to incidents.
///
/// All bounds are inclusive and optional. When `time_from` is later than
/// `time_until` the time window wraps around midnight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayFilter {
    /// First date to include.
    pub date_from: Option<NaiveDate>,
    /// Last date to include.
    pub date_until: Option<NaiveDate>,
    /// Earliest time of day to include.
    pub time_from: Option<NaiveTime>,
    /// Latest time of day to include.
    pub time_until: Option<NaiveTime>,
}

impl DelayFilter {
    /// Returns `true` if no bound is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.date_from.is_none()
            && self.date_until.is_none()
            && self.time_from.is_none()
            && self.time_until.is_none()
    }

    /// Returns `true` if `date` is within the date bounds.
    #[must_use]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.date_from.is_none_or(|from| date >= from)
            && self.date_until.is_none_or(|until| date <= until)
    }

    /// Returns `true` if `time` is within the time-of-day window.
    #[must_use]
    pub fn contains_time(&self, time: NaiveTime) -> bool {
        match (self.time_from, self.time_until) {
            (Some(from), Some(until)) if from > until => time >= from || time <= until,
            (from, until) => {
                from.is_none_or(|from| time >= from) && until.is_none_or(|until| time <= until)
            }
        }
    }
}

/// Delay totals for one pair of consecutive stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopPairAggregate {
    /// Stop at the start of the segment.
    pub closest_stop_before: String,
    /// Stop at the end of the segment.
    pub closest_stop_after: String,
    /// Number of incidents on the segment that report a delay.
    pub total_count: u64,
    /// Sum of the reported delays in minutes.
    pub total_delay: f64,
}

/// The most frequent incident types starting at one stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateDetails {
    /// Stop at the start of the segment.
    pub closest_stop_before: String,
    /// Incident types, most frequent first.
    pub top_incident_types: Vec<String>,
}

/// Date coverage of the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayMetadata {
    /// Date of the earliest incident.
    pub earliest_date: NaiveDate,
    /// Date of the latest incident.
    pub latest_date: NaiveDate,
}

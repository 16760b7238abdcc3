#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Filtering and per-segment aggregation of delay incidents.
//!
//! All functions work on an already enriched [`DelayDataset`]; nothing
//! here touches coordinates.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use streetcar_delay_analytics_models::{
    AggregateDetails, DelayFilter, DelayMetadata, StopPairAggregate,
};
use streetcar_delay_dataset::DelayDataset;
use streetcar_delay_transit_models::DelayIncident;
use thiserror::Error;

/// Errors that can occur during analytics operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalyticsError {
    /// A filter bound could not be parsed.
    #[error("Invalid filter: {message}")]
    InvalidFilter {
        /// Description of what went wrong.
        message: String,
    },
}

/// Builds a [`DelayFilter`] from its textual bounds: dates as `YYYY-MM-DD`,
/// times as `HH:MM` (or `HH:MM:SS`). Empty strings are treated as absent.
///
/// # Errors
///
/// Returns [`AnalyticsError::InvalidFilter`] naming the first bound that
/// does not parse.
pub fn parse_filter(
    date_from: Option<&str>,
    date_until: Option<&str>,
    time_from: Option<&str>,
    time_until: Option<&str>,
) -> Result<DelayFilter, AnalyticsError> {
    Ok(DelayFilter {
        date_from: parse_bound("dateFrom", date_from, parse_date)?,
        date_until: parse_bound("dateUntil", date_until, parse_date)?,
        time_from: parse_bound("timeFrom", time_from, parse_time)?,
        time_until: parse_bound("timeUntil", time_until, parse_time)?,
    })
}

fn parse_bound<T>(
    name: &str,
    value: Option<&str>,
    parse: fn(&str) -> Option<T>,
) -> Result<Option<T>, AnalyticsError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => parse(v)
            .map(Some)
            .ok_or_else(|| AnalyticsError::InvalidFilter {
                message: format!("{name}: cannot parse {v:?}"),
            }),
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .ok()
}

/// Incidents of `line` that pass `filter`, in file order.
///
/// An unknown line yields an empty list.
#[must_use]
pub fn filter_incidents<'a>(
    dataset: &'a DelayDataset,
    line: &'a str,
    filter: &DelayFilter,
) -> Vec<&'a DelayIncident> {
    let incidents: Vec<&DelayIncident> = dataset
        .incidents_for_line(line)
        .filter(|i| filter.contains_date(i.date) && filter.contains_time(i.time))
        .collect();
    log::debug!(
        "Line {line}: {} incidents match {filter:?}",
        incidents.len()
    );
    incidents
}

/// Totals per stop pair, sorted by `(before, after)`.
///
/// Incidents without a stop pair are left out. `total_count` counts the
/// incidents that report a delay; missing delays add nothing to either
/// total.
#[must_use]
pub fn aggregate_by_stop_pair(incidents: &[&DelayIncident]) -> Vec<StopPairAggregate> {
    let mut groups: BTreeMap<(&str, &str), (u64, f64)> = BTreeMap::new();
    for incident in incidents {
        let Some(pair) = incident.stop_pair() else {
            continue;
        };
        let entry = groups.entry(pair).or_insert((0, 0.0));
        if let Some(delay) = incident.min_delay {
            entry.0 += 1;
            entry.1 += delay;
        }
    }

    log::debug!(
        "{} incidents grouped into {} stop pairs",
        incidents.len(),
        groups.len()
    );

    groups
        .into_iter()
        .map(|((before, after), (count, delay))| StopPairAggregate {
            closest_stop_before: before.to_string(),
            closest_stop_after: after.to_string(),
            total_count: count,
            total_delay: delay,
        })
        .collect()
}

/// The `limit` most frequent incident types of the incidents whose
/// segment starts at `closest_stop_before`. Equal counts are ordered by
/// incident type. Returns `None` if no incident starts at that stop.
#[must_use]
pub fn aggregate_details(
    incidents: &[&DelayIncident],
    closest_stop_before: &str,
    limit: usize,
) -> Option<AggregateDetails> {
    let matching: Vec<&DelayIncident> = incidents
        .iter()
        .copied()
        .filter(|i| i.closest_stop_before.as_deref() == Some(closest_stop_before))
        .collect();
    if matching.is_empty() {
        return None;
    }

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for incident in &matching {
        if let Some(kind) = incident.incident.as_deref() {
            *counts.entry(kind).or_default() += 1;
        }
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    // BTreeMap order is by name, and the sort is stable.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    Some(AggregateDetails {
        closest_stop_before: closest_stop_before.to_string(),
        top_incident_types: ranked
            .into_iter()
            .take(limit)
            .map(|(kind, _)| kind.to_string())
            .collect(),
    })
}

/// Earliest and latest incident date, or `None` for an empty dataset.
#[must_use]
pub fn dataset_metadata(dataset: &DelayDataset) -> Option<DelayMetadata> {
    dataset
        .date_range()
        .map(|(earliest_date, latest_date)| DelayMetadata {
            earliest_date,
            latest_date,
        })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use streetcar_delay_analytics_models::DEFAULT_TOP_INCIDENT_TYPES;

    use super::*;

    fn incident(
        date: (i32, u32, u32),
        time: (u32, u32),
        line: &str,
        pair: Option<(&str, &str)>,
        kind: &str,
        delay: Option<f64>,
    ) -> DelayIncident {
        DelayIncident {
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            time: NaiveTime::from_hms_opt(time.0, time.1, 0).unwrap(),
            line: line.to_string(),
            day: None,
            location: None,
            incident: Some(kind.to_string()),
            min_delay: delay,
            min_gap: None,
            bound: None,
            vehicle: None,
            coordinates: None,
            closest_stop_before: pair.map(|p| p.0.to_string()),
            closest_stop_after: pair.map(|p| p.1.to_string()),
        }
    }

    fn dataset() -> DelayDataset {
        let ab = Some(("King St West / Sudbury St", "King St West / Shaw St"));
        let bc = Some(("King St West / Shaw St", "King St West / Strachan Ave"));
        DelayDataset::from_parts(
            BTreeMap::new(),
            vec![
                incident((2014, 1, 2), (6, 31), "504", ab, "Mechanical", Some(4.0)),
                incident((2014, 1, 3), (12, 0), "504", ab, "Mechanical", Some(10.0)),
                incident((2014, 1, 4), (22, 30), "504", ab, "Investigation", None),
                incident((2014, 1, 5), (8, 15), "504", bc, "Held By", Some(6.0)),
                incident((2014, 1, 6), (9, 0), "504", None, "Mechanical", Some(20.0)),
                incident((2014, 1, 9), (9, 0), "504", bc, "Emergency Services", Some(3.0)),
                incident((2014, 1, 2), (7, 0), "505", ab, "Mechanical", Some(99.0)),
            ],
        )
    }

    #[test]
    fn parses_filter_bounds() {
        let filter =
            parse_filter(Some("2014-01-02"), Some("2014-01-07"), Some("06:00"), Some("23:00"))
                .unwrap();
        assert_eq!(filter.date_from, NaiveDate::from_ymd_opt(2014, 1, 2));
        assert_eq!(filter.time_until, NaiveTime::from_hms_opt(23, 0, 0));
        assert!(parse_filter(None, Some(""), None, None).unwrap().is_empty());
    }

    #[test]
    fn rejects_malformed_bounds() {
        let err = parse_filter(Some("02/01/2014"), None, None, None).unwrap_err();
        assert!(err.to_string().contains("dateFrom"));
        assert!(parse_filter(None, None, None, Some("25:00")).is_err());
    }

    #[test]
    fn filters_by_line_date_and_time() {
        let dataset = dataset();
        let filter = parse_filter(Some("2014-01-02"), Some("2014-01-07"), Some("06:00"), Some("23:00"))
            .unwrap();
        let incidents = filter_incidents(&dataset, "504", &filter);
        assert_eq!(incidents.len(), 5);
        assert!(incidents.iter().all(|i| i.line == "504"));

        let night = parse_filter(None, None, Some("22:00"), Some("07:00")).unwrap();
        assert_eq!(filter_incidents(&dataset, "504", &night).len(), 2);

        assert!(filter_incidents(&dataset, "999", &DelayFilter::default()).is_empty());
    }

    #[test]
    fn aggregates_by_stop_pair() {
        let dataset = dataset();
        let incidents = filter_incidents(&dataset, "504", &DelayFilter::default());
        let aggregates = aggregate_by_stop_pair(&incidents);

        assert_eq!(aggregates.len(), 2);
        assert_eq!(aggregates[0].closest_stop_before, "King St West / Shaw St");
        assert_eq!(aggregates[0].total_count, 2);
        assert!((aggregates[0].total_delay - 9.0).abs() < f64::EPSILON);
        assert_eq!(aggregates[1].closest_stop_before, "King St West / Sudbury St");
        assert_eq!(aggregates[1].total_count, 2);
        assert!((aggregates[1].total_delay - 14.0).abs() < f64::EPSILON);
    }

    #[test]
    fn aggregate_of_nothing_is_empty() {
        assert!(aggregate_by_stop_pair(&[]).is_empty());
    }

    #[test]
    fn details_rank_incident_types() {
        let dataset = dataset();
        let incidents = filter_incidents(&dataset, "504", &DelayFilter::default());

        let details =
            aggregate_details(&incidents, "King St West / Sudbury St", DEFAULT_TOP_INCIDENT_TYPES)
                .unwrap();
        assert_eq!(details.top_incident_types, vec!["Mechanical", "Investigation"]);

        let tied = aggregate_details(&incidents, "King St West / Shaw St", 1).unwrap();
        assert_eq!(tied.top_incident_types, vec!["Emergency Services"]);

        assert!(aggregate_details(&incidents, "Nowhere", 3).is_none());
    }

    #[test]
    fn metadata_spans_all_lines() {
        let metadata = dataset_metadata(&dataset()).unwrap();
        assert_eq!(metadata.earliest_date, NaiveDate::from_ymd_opt(2014, 1, 2).unwrap());
        assert_eq!(metadata.latest_date, NaiveDate::from_ymd_opt(2014, 1, 9).unwrap());
        assert!(dataset_metadata(&DelayDataset::default()).is_none());
    }
}

//! Cell-level parsing for the pipe-separated dataset files.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use streetcar_delay_transit_models::GeoPoint;

/// `"(lat, lng)"` as written by the geocoding step.
static COORDINATE_TUPLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\((-?[0-9]+\.[0-9]+), (-?[0-9]+\.[0-9]+)\)")
        .unwrap_or_else(|e| panic!("invalid coordinate regex: {e}"))
});

/// Date-only formats seen across the yearly delay files.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%b-%y", "%d-%b-%Y"];

/// Date-with-time formats; the time part is dropped.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

const TIME_FORMATS: &[&str] = &["%H:%M", "%H:%M:%S"];

/// Parses a `"(lat, lng)"` coordinate tuple.
///
/// Returns `None` for anything else, including `"(nan, nan)"` written for
/// descriptions the geocoder could not place.
#[must_use]
pub fn parse_coordinate_tuple(s: &str) -> Option<GeoPoint> {
    let caps = COORDINATE_TUPLE_RE.captures(s.trim())?;
    let latitude = caps[1].parse().ok()?;
    let longitude = caps[2].parse().ok()?;
    Some(GeoPoint::from_lat_lng(latitude, longitude))
}

/// Formats a point as a `"(lat, lng)"` tuple that
/// [`parse_coordinate_tuple`] reads back, with 7 decimals (about 1 cm).
#[must_use]
pub fn format_coordinate_tuple(point: GeoPoint) -> String {
    format!("({:.7}, {:.7})", point.latitude, point.longitude)
}

/// Parses a report date, ignoring any time-of-day part.
#[must_use]
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Parses a time of day (`HH:MM` or `HH:MM:SS`).
#[must_use]
pub fn parse_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
}

/// Parses an optional number of minutes. Empty cells (and `nan`) are
/// `Ok(None)`.
///
/// # Errors
///
/// Returns the offending text if the cell is not a number.
pub fn parse_minutes(s: &str) -> Result<Option<f64>, String> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    s.parse::<f64>()
        .map(Some)
        .map_err(|_| format!("invalid number of minutes: {s:?}"))
}

/// Returns `None` for empty cells, the trimmed text otherwise.
#[must_use]
pub fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("nan") {
        None
    } else {
        Some(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_coordinate_tuples() {
        let p = parse_coordinate_tuple("(43.6529, -79.4522)").unwrap();
        assert!((p.latitude - 43.6529).abs() < 1e-12);
        assert!((p.longitude + 79.4522).abs() < 1e-12);
    }

    #[test]
    fn rejects_malformed_tuples() {
        assert!(parse_coordinate_tuple("(nan, nan)").is_none());
        assert!(parse_coordinate_tuple("43.65, -79.45").is_none());
        assert!(parse_coordinate_tuple("(43, -79)").is_none());
        assert!(parse_coordinate_tuple("").is_none());
    }

    #[test]
    fn formatted_tuples_parse_back() {
        let p = GeoPoint::from_lat_lng(43.0, -79.5);
        assert_eq!(format_coordinate_tuple(p), "(43.0000000, -79.5000000)");
        assert_eq!(parse_coordinate_tuple(&format_coordinate_tuple(p)), Some(p));
    }

    #[test]
    fn tiny_magnitudes_are_not_written_in_exponent_form() {
        let p = GeoPoint::from_lat_lng(1e-9, -2.5e-8);
        let formatted = format_coordinate_tuple(p);
        assert_eq!(formatted, "(0.0000000, -0.0000000)");

        let parsed = parse_coordinate_tuple(&formatted).unwrap();
        assert!(parsed.latitude.abs() < 1e-7);
        assert!(parsed.longitude.abs() < 1e-7);
    }

    #[test]
    fn parses_report_dates() {
        let expected = NaiveDate::from_ymd_opt(2014, 1, 2);
        assert_eq!(parse_date("2014-01-02"), expected);
        assert_eq!(parse_date("2014-01-02 00:00:00"), expected);
        assert_eq!(parse_date("2-Jan-14"), expected);
        assert_eq!(parse_date("01/02/2014"), expected);
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn parses_times() {
        assert_eq!(parse_time("06:31"), NaiveTime::from_hms_opt(6, 31, 0));
        assert_eq!(parse_time("23:05:10"), NaiveTime::from_hms_opt(23, 5, 10));
        assert_eq!(parse_time("25:00"), None);
    }

    #[test]
    fn parses_minutes() {
        assert_eq!(parse_minutes("10"), Ok(Some(10.0)));
        assert_eq!(parse_minutes("4.5"), Ok(Some(4.5)));
        assert_eq!(parse_minutes(" "), Ok(None));
        assert_eq!(parse_minutes("NaN"), Ok(None));
        assert!(parse_minutes("ten").is_err());
    }
}

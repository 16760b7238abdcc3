//! Reader for the pipe-separated delay incident file.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use streetcar_delay_transit_models::{DayOfWeek, DelayIncident};

use crate::DatasetError;
use crate::parsing::{non_empty, parse_date, parse_minutes, parse_time};

/// Field delimiter of every dataset file.
pub const DELIMITER: u8 = b'|';

/// Columns the delay file is expected to have.
pub const EXPECTED_COLUMNS: &[&str] = &[
    "Date",
    "Line",
    "Time",
    "Day",
    "Location",
    "Incident",
    "Min Delay",
    "Min Gap",
    "Bound",
    "Vehicle",
];

/// Columns without which no incident can be built.
const REQUIRED_COLUMNS: &[&str] = &["Date", "Line", "Time"];

/// Reads delay incidents from `path`.
///
/// # Errors
///
/// Returns [`DatasetError`] if the file cannot be read, lacks a required
/// column, or has a row whose date, time, or minutes cannot be parsed.
pub fn read_delay_file(path: &Path) -> Result<Vec<DelayIncident>, DatasetError> {
    let file = std::fs::File::open(path)?;
    let incidents = read_delays(file, &path.display().to_string())?;
    log::info!(
        "Read {} delay incidents from {}",
        incidents.len(),
        path.display()
    );
    Ok(incidents)
}

/// Reads delay incidents from any reader. `source` names the input in
/// errors and logs.
///
/// # Errors
///
/// See [`read_delay_file`].
pub fn read_delays<R: Read>(reader: R, source: &str) -> Result<Vec<DelayIncident>, DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .flexible(true)
        .from_reader(reader);

    let columns: BTreeMap<String, usize> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_string(), i))
        .collect();

    let missing: Vec<&str> = EXPECTED_COLUMNS
        .iter()
        .copied()
        .filter(|c| !columns.contains_key(*c))
        .collect();
    if !missing.is_empty() {
        log::warn!("Missing columns in {source}: {missing:?}");
    }
    if let Some(column) = REQUIRED_COLUMNS.iter().find(|c| missing.contains(*c)) {
        return Err(DatasetError::MissingColumn {
            file: source.to_string(),
            column: (*column).to_string(),
        });
    }

    let mut incidents = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line_number = record.position().map_or(0, csv::Position::line);
        let cell = |name: &str| column_value(&record, &columns, name);

        let parse_error = |message: String| DatasetError::Parse {
            file: source.to_string(),
            line: line_number,
            message,
        };

        if record.iter().all(|c| c.trim().is_empty()) {
            continue;
        }

        let date = parse_date(cell("Date"))
            .ok_or_else(|| parse_error(format!("invalid date {:?}", cell("Date"))))?;
        let time = parse_time(cell("Time"))
            .ok_or_else(|| parse_error(format!("invalid time {:?}", cell("Time"))))?;
        let min_delay = parse_minutes(cell("Min Delay")).map_err(parse_error)?;
        let min_gap = parse_minutes(cell("Min Gap")).map_err(parse_error)?;

        let day = non_empty(cell("Day")).and_then(|d| match d.parse::<DayOfWeek>() {
            Ok(day) => Some(day),
            Err(_) => {
                log::debug!("{source}:{line_number}: unknown day {d:?}");
                None
            }
        });

        incidents.push(DelayIncident {
            date,
            time,
            line: cell("Line").trim().to_string(),
            day,
            location: non_empty(cell("Location")),
            incident: non_empty(cell("Incident")),
            min_delay,
            min_gap,
            bound: non_empty(cell("Bound")),
            vehicle: non_empty(cell("Vehicle")),
            coordinates: None,
            closest_stop_before: None,
            closest_stop_after: None,
        });
    }

    Ok(incidents)
}

/// Returns the cell of `name` in `record`, or `""` if the column is absent.
fn column_value<'r>(
    record: &'r csv::StringRecord,
    columns: &BTreeMap<String, usize>,
    name: &str,
) -> &'r str {
    columns
        .get(name)
        .and_then(|&i| record.get(i))
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::*;

    const HEADER: &str = "Date|Line|Time|Day|Location|Incident|Min Delay|Min Gap|Bound|Vehicle";

    #[test]
    fn reads_incident_rows() {
        let text = format!(
            "{HEADER}\n\
             2014-01-02|505|06:31|Thursday|Dundas and Roncesvalles|Late Leaving Garage|4|8|E|4018\n\
             2014-01-02 00:00:00|504|12:43:00|thursday|King and Shaw|Utilized Off Route||| |\n"
        );
        let incidents = read_delays(text.as_bytes(), "test").unwrap();
        assert_eq!(incidents.len(), 2);

        let first = &incidents[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2014, 1, 2).unwrap());
        assert_eq!(first.time, NaiveTime::from_hms_opt(6, 31, 0).unwrap());
        assert_eq!(first.line, "505");
        assert_eq!(first.day, Some(DayOfWeek::Thursday));
        assert_eq!(first.min_delay, Some(4.0));
        assert_eq!(first.vehicle.as_deref(), Some("4018"));

        let second = &incidents[1];
        assert_eq!(second.day, Some(DayOfWeek::Thursday));
        assert_eq!(second.min_delay, None);
        assert_eq!(second.bound, None);
        assert!(second.coordinates.is_none());
    }

    #[test]
    fn tolerates_missing_optional_columns() {
        let text = "Date|Line|Time|Location\n2014-01-02|505|06:31|Dundas West Stn\n";
        let incidents = read_delays(text.as_bytes(), "test").unwrap();
        assert_eq!(incidents.len(), 1);
        assert_eq!(incidents[0].incident, None);
        assert_eq!(incidents[0].location.as_deref(), Some("Dundas West Stn"));
    }

    #[test]
    fn rejects_missing_required_column() {
        let text = "Date|Location\n2014-01-02|Dundas West Stn\n";
        let err = read_delays(text.as_bytes(), "test").unwrap_err();
        assert!(matches!(err, DatasetError::MissingColumn { ref column, .. } if column == "Line"));
    }

    #[test]
    fn parse_errors_name_the_line() {
        let text = format!("{HEADER}\n2014-01-02|505|06:31||||||| \n2014-13-45|505|06:31|||||||\n");
        let err = read_delays(text.as_bytes(), "delays.csv").unwrap_err();
        match err {
            DatasetError::Parse { file, line, .. } => {
                assert_eq!(file, "delays.csv");
                assert_eq!(line, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn skips_blank_rows() {
        let text = format!("{HEADER}\n|||||||||\n2014-01-02|505|06:31|||||||\n");
        assert_eq!(read_delays(text.as_bytes(), "test").unwrap().len(), 1);
    }
}

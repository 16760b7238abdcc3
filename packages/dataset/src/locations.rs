//! Geocoded delay locations and their join onto incidents.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use streetcar_delay_transit_models::{DelayIncident, GeoPoint};

use crate::DatasetError;
use crate::delays::DELIMITER;
use crate::parsing::parse_coordinate_tuple;

/// Upper-cased location description to its coordinate, if it was
/// geocoded.
pub type LocationIndex = BTreeMap<String, Option<GeoPoint>>;

/// Reads the geocoded locations file.
///
/// # Errors
///
/// Returns [`DatasetError`] if the file cannot be read or lacks the
/// `delay_location` or `coordinates` column.
pub fn read_location_file(path: &Path) -> Result<LocationIndex, DatasetError> {
    let file = std::fs::File::open(path)?;
    let index = read_locations(file, &path.display().to_string())?;
    log::info!(
        "Read {} geocoded locations from {}",
        index.len(),
        path.display()
    );
    Ok(index)
}

/// Reads geocoded locations from any reader.
///
/// Descriptions are keyed upper-case. Coordinates that do not parse are
/// kept as `None`. When a description appears twice the first row wins.
///
/// # Errors
///
/// See [`read_location_file`].
pub fn read_locations<R: Read>(reader: R, source: &str) -> Result<LocationIndex, DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let position = |column: &str| {
        headers
            .iter()
            .position(|h| h.trim() == column)
            .ok_or_else(|| DatasetError::MissingColumn {
                file: source.to_string(),
                column: column.to_string(),
            })
    };
    let location_col = position("delay_location")?;
    let coordinates_col = position("coordinates")?;

    let mut index = LocationIndex::new();
    let mut unparsed = 0usize;
    for record in reader.records() {
        let record = record?;
        let Some(location) = record.get(location_col).map(str::trim) else {
            continue;
        };
        if location.is_empty() {
            continue;
        }
        let coordinates = record
            .get(coordinates_col)
            .and_then(parse_coordinate_tuple);
        if coordinates.is_none() {
            unparsed += 1;
        }
        index
            .entry(location.to_uppercase())
            .or_insert(coordinates);
    }

    if unparsed > 0 {
        log::debug!("{unparsed} locations in {source} have no usable coordinates");
    }

    Ok(index)
}

/// Sets the coordinate of every incident whose location is in `index`
/// (matched case-insensitively). Returns the number of incidents that
/// received a coordinate.
pub fn join_locations(incidents: &mut [DelayIncident], index: &LocationIndex) -> usize {
    let mut joined = 0;
    for incident in incidents {
        incident.coordinates = incident
            .location
            .as_deref()
            .and_then(|location| index.get(&location.to_uppercase()).copied().flatten());
        if incident.coordinates.is_some() {
            joined += 1;
        }
    }
    joined
}

//! Writers for geocoding results, in the formats the loaders read.

use std::collections::BTreeMap;
use std::path::Path;

use streetcar_delay_transit_models::{GeoPoint, LineStops};

use crate::DatasetError;
use crate::delays::DELIMITER;
use crate::parsing::format_coordinate_tuple;

/// Writes geocoded location descriptions as `delay_location|coordinates`.
///
/// Descriptions without a coordinate get an empty cell.
///
/// # Errors
///
/// Returns [`DatasetError`] if the file cannot be written.
pub fn write_location_coordinates(
    path: &Path,
    locations: &BTreeMap<String, Option<GeoPoint>>,
) -> Result<(), DatasetError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .from_path(path)?;
    writer.write_record(["delay_location", "coordinates"])?;
    for (location, point) in locations {
        let coordinates = point.map(format_coordinate_tuple).unwrap_or_default();
        writer.write_record([location.as_str(), coordinates.as_str()])?;
    }
    writer.flush()?;
    log::info!(
        "Wrote {} locations to {}",
        locations.len(),
        path.display()
    );
    Ok(())
}

/// Writes one line's stops as `stop|coordinates`.
///
/// `coordinates` must be aligned with `line.stops`; a stop without a
/// coordinate gets an empty cell. Without coordinates only the `stop`
/// column is written.
///
/// # Errors
///
/// Returns [`DatasetError`] if the file cannot be written.
pub fn write_stop_file(
    path: &Path,
    line: &LineStops,
    coordinates: Option<&[Option<GeoPoint>]>,
) -> Result<(), DatasetError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .from_path(path)?;

    match coordinates {
        Some(coordinates) => {
            writer.write_record(["stop", "coordinates"])?;
            for (i, stop) in line.stops.iter().enumerate() {
                let cell = coordinates
                    .get(i)
                    .copied()
                    .flatten()
                    .map(format_coordinate_tuple)
                    .unwrap_or_default();
                writer.write_record([stop.as_str(), cell.as_str()])?;
            }
        }
        None => {
            writer.write_record(["stop"])?;
            for stop in &line.stops {
                writer.write_record([stop.as_str()])?;
            }
        }
    }

    writer.flush()?;
    log::info!(
        "Wrote {} stops of line {} to {}",
        line.stops.len(),
        line.line,
        path.display()
    );
    Ok(())
}

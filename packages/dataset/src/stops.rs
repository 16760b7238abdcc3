//! Reader for the per-line stop files (`<line>_stops.csv`).

use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use streetcar_delay_transit_models::{GeoPoint, LineStops};

use crate::DatasetError;
use crate::delays::DELIMITER;
use crate::parsing::parse_coordinate_tuple;

static LINE_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{3}").unwrap_or_else(|e| panic!("invalid line id regex: {e}"))
});

/// Returns `true` for file names matching `*_stops*.csv`.
#[must_use]
pub fn is_stop_file_name(name: &str) -> bool {
    name.strip_suffix(".csv")
        .is_some_and(|stem| stem.contains("_stops"))
}

/// Extracts the line id (three leading digits) from a stop file path.
///
/// # Errors
///
/// Returns [`DatasetError::InvalidStopFile`] if the file name does not
/// start with three digits.
pub fn line_id_from_path(path: &Path) -> Result<String, DatasetError> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| LINE_ID_RE.find(stem))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| DatasetError::InvalidStopFile {
            path: path.display().to_string(),
        })
}

/// Lists the stop files in `dir`, sorted by file name.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be read.
pub fn stop_files(dir: &Path) -> Result<Vec<PathBuf>, DatasetError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file()
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(is_stop_file_name)
        {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Reads every stop file in `dir`, keyed by line id.
///
/// When two files map to the same line id, the later one (in file name
/// order) wins.
///
/// # Errors
///
/// Returns [`DatasetError`] if the directory or a file cannot be read, a
/// file has no `stop` column, or a file name carries no line id.
pub fn read_stops_dir(dir: &Path) -> Result<BTreeMap<String, LineStops>, DatasetError> {
    let mut lines = BTreeMap::new();
    for path in stop_files(dir)? {
        let line = line_id_from_path(&path)?;
        let file = std::fs::File::open(&path)?;
        let stops = read_stops(file, &line, &path.display().to_string())?;
        log::debug!(
            "Line {line}: {} stops from {}",
            stops.stops.len(),
            path.display()
        );
        lines.insert(line, stops);
    }
    log::info!("Read stops of {} lines from {}", lines.len(), dir.display());
    Ok(lines)
}

/// Reads the stops of one line from any reader.
///
/// The `coordinates` column is optional. If any of its cells does not
/// parse, the line is kept with its stop names but without coordinates.
///
/// # Errors
///
/// Returns [`DatasetError`] if the input is not valid CSV or has no `stop`
/// column.
pub fn read_stops<R: Read>(reader: R, line: &str, source: &str) -> Result<LineStops, DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let stop_col = headers
        .iter()
        .position(|h| h.trim() == "stop")
        .ok_or_else(|| DatasetError::MissingColumn {
            file: source.to_string(),
            column: "stop".to_string(),
        })?;
    let coordinates_col = headers.iter().position(|h| h.trim() == "coordinates");

    let mut stops = Vec::new();
    let mut coordinates: Option<Vec<GeoPoint>> = coordinates_col.map(|_| Vec::new());
    for record in reader.records() {
        let record = record?;
        let name = record.get(stop_col).unwrap_or("").trim();
        if name.is_empty() {
            continue;
        }
        stops.push(name.to_string());

        if let (Some(col), Some(coords)) = (coordinates_col, coordinates.as_mut()) {
            match record.get(col).and_then(parse_coordinate_tuple) {
                Some(point) => coords.push(point),
                None => {
                    log::warn!(
                        "Stop {name:?} in {source} has no usable coordinates; \
                         line {line} will not be used for stop attribution"
                    );
                    coordinates = None;
                }
            }
        }
    }

    if coordinates_col.is_none() {
        log::warn!("File {source} does not contain coordinates of streetcar stops");
    }

    Ok(LineStops {
        line: line.to_string(),
        stops,
        coordinates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_stop_file_names() {
        assert!(is_stop_file_name("505_stops.csv"));
        assert!(is_stop_file_name("504_stops_geocoded.csv"));
        assert!(!is_stop_file_name("505_stops.txt"));
        assert!(!is_stop_file_name("505.csv"));
        assert!(!is_stop_file_name("delay_locations.csv"));
    }

    #[test]
    fn extracts_line_id() {
        assert_eq!(
            line_id_from_path(Path::new("data/stops/505_stops.csv")).unwrap(),
            "505"
        );
        assert!(matches!(
            line_id_from_path(Path::new("data/stops/king_stops.csv")),
            Err(DatasetError::InvalidStopFile { .. })
        ));
    }

    #[test]
    fn reads_stops_with_coordinates() {
        let text = "stop|coordinates\n\
                    Dundas West Station|(43.6566, -79.4527)\n\
                    Dundas St West / Roncesvalles Ave|(43.6529, -79.4506)\n";
        let line = read_stops(text.as_bytes(), "505", "test").unwrap();
        assert_eq!(line.line, "505");
        assert_eq!(line.stops.len(), 2);
        assert_eq!(line.segment_coordinates().map(<[GeoPoint]>::len), Some(2));
    }

    #[test]
    fn keeps_names_without_coordinates_column() {
        let text = "stop\nA\nB\nC\n";
        let line = read_stops(text.as_bytes(), "301", "test").unwrap();
        assert_eq!(line.stops, vec!["A", "B", "C"]);
        assert!(line.coordinates.is_none());
    }

    #[test]
    fn drops_partially_geocoded_lines() {
        let text = "stop|coordinates\nA|(43.0, -79.0)\nB|(nan, nan)\nC|(43.2, -79.2)\n";
        let line = read_stops(text.as_bytes(), "504", "test").unwrap();
        assert_eq!(line.stops.len(), 3);
        assert!(line.coordinates.is_none());
        assert!(line.segment_coordinates().is_none());
    }

    #[test]
    fn reads_sorted_directory() {
        let dir = std::env::temp_dir().join(format!("streetcar_stops_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("505_stops.csv"), "stop\nA\nB\n").unwrap();
        std::fs::write(dir.join("504_stops.csv"), "stop\nC\nD\nE\n").unwrap();
        std::fs::write(dir.join("notes.txt"), "not a stop file").unwrap();

        let lines = read_stops_dir(&dir).unwrap();
        assert_eq!(lines.keys().collect::<Vec<_>>(), vec!["504", "505"]);
        assert_eq!(lines["504"].stops.len(), 3);

        std::fs::remove_dir_all(&dir).ok();
    }
}

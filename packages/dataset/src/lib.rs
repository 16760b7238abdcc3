#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! The streetcar delay dataset.
//!
//! Loads the delay incidents, joins them with their geocoded locations,
//! reads the stops of every line, and attributes each incident to the pair
//! of stops it happened between. The result is an immutable
//! [`DelayDataset`] that the server and the CLI share behind an `Arc`.

pub mod delays;
pub mod enrich;
pub mod locations;
pub mod parsing;
pub mod paths;
pub mod stops;
pub mod writer;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use streetcar_delay_transit_models::{DelayIncident, LineStops};

pub use enrich::{EnrichmentSummary, enrich_incidents};
pub use paths::DataPaths;
pub use writer::{write_location_coordinates, write_stop_file};

/// Errors that can occur while loading or writing the dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// I/O error (file read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading or writing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is missing.
    #[error("{file}: missing column {column:?}")]
    MissingColumn {
        /// File (or other input) being read.
        file: String,
        /// Name of the missing column.
        column: String,
    },

    /// A cell could not be parsed.
    #[error("{file}:{line}: {message}")]
    Parse {
        /// File (or other input) being read.
        file: String,
        /// 1-based line number of the offending row.
        line: u64,
        /// What could not be parsed.
        message: String,
    },

    /// A stop file name does not start with a line id.
    #[error("Could not extract streetcar line number from file name {path}")]
    InvalidStopFile {
        /// Path of the stop file.
        path: String,
    },
}

/// Immutable, enriched delay dataset.
#[derive(Debug, Clone, Default)]
pub struct DelayDataset {
    lines: BTreeMap<String, LineStops>,
    incidents: Vec<DelayIncident>,
}

impl DelayDataset {
    /// Loads the dataset from the files under `paths` and attributes every
    /// incident to its stop pair.
    ///
    /// The locations file and the stops directory are optional: without
    /// them incidents have no coordinates or no lines to attribute to,
    /// and a warning is logged.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if the delay file is missing or malformed,
    /// or if an existing locations or stop file is malformed.
    pub fn load(paths: &DataPaths) -> Result<Self, DatasetError> {
        let mut incidents = delays::read_delay_file(&paths.delay_data())?;

        let locations_path = paths.delay_locations();
        if locations_path.is_file() {
            let index = locations::read_location_file(&locations_path)?;
            let joined = locations::join_locations(&mut incidents, &index);
            log::info!(
                "{joined} of {} incidents have a geocoded location",
                incidents.len()
            );
        } else {
            log::warn!(
                "No geocoded locations at {}; incidents will not be attributed to stops",
                locations_path.display()
            );
        }

        let stops_dir = paths.stops_dir();
        let lines = if stops_dir.is_dir() {
            stops::read_stops_dir(&stops_dir)?
        } else {
            log::warn!("No stops directory at {}", stops_dir.display());
            BTreeMap::new()
        };

        enrich_incidents(&mut incidents, &lines);

        Ok(Self::from_parts(lines, incidents))
    }

    /// Builds a dataset from already prepared parts. Incidents are taken
    /// as they are; run [`enrich_incidents`] first if they still need
    /// their stop pairs.
    #[must_use]
    pub const fn from_parts(
        lines: BTreeMap<String, LineStops>,
        incidents: Vec<DelayIncident>,
    ) -> Self {
        Self { lines, incidents }
    }

    /// Ids of all lines with a stop file, sorted.
    #[must_use]
    pub fn lines(&self) -> Vec<&str> {
        self.lines.keys().map(String::as_str).collect()
    }

    /// Stops of a line.
    #[must_use]
    pub fn line(&self, id: &str) -> Option<&LineStops> {
        self.lines.get(id)
    }

    /// All incidents, in file order.
    #[must_use]
    pub fn incidents(&self) -> &[DelayIncident] {
        &self.incidents
    }

    /// Incidents of one line, in file order.
    pub fn incidents_for_line<'a>(
        &'a self,
        line: &'a str,
    ) -> impl Iterator<Item = &'a DelayIncident> + 'a {
        self.incidents.iter().filter(move |i| i.line == line)
    }

    /// Earliest and latest incident date.
    #[must_use]
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let earliest = self.incidents.iter().map(|i| i.date).min()?;
        let latest = self.incidents.iter().map(|i| i.date).max()?;
        Some((earliest, latest))
    }
}

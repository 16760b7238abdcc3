//! Implementations of the CLI subcommands.

use std::collections::BTreeMap;

use streetcar_delay_cli_utils::{IndicatifProgress, MultiProgress};
use streetcar_delay_dataset::paths::ensure_dir;
use streetcar_delay_dataset::{
    DataPaths, DelayDataset, delays, locations, stops, write_location_coordinates,
    write_stop_file,
};
use streetcar_delay_geocoder::{GoogleMapsGeocoder, geocode_all, service_registry};
use streetcar_delay_source::config::SourceConfig;
use streetcar_delay_source::download_delay_data;
use streetcar_delay_transit_models::{GeoPoint, LineStops};

/// One row of the `lines` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSummary {
    /// Line identifier.
    pub line: String,
    /// Number of stops in the stop file.
    pub stops: usize,
    /// Whether every stop has a coordinate.
    pub geocoded: bool,
    /// Incidents reported on the line.
    pub incidents: usize,
    /// Incidents attributed to a stop pair.
    pub attributed: usize,
}

/// Summarises every line of `dataset`, sorted by line id.
#[must_use]
pub fn line_summaries(dataset: &DelayDataset) -> Vec<LineSummary> {
    dataset
        .lines()
        .into_iter()
        .filter_map(|id| dataset.line(id))
        .map(|line| {
            let (incidents, attributed) = dataset
                .incidents_for_line(&line.line)
                .fold((0, 0), |(total, attributed), incident| {
                    (
                        total + 1,
                        attributed + usize::from(incident.stop_pair().is_some()),
                    )
                });
            LineSummary {
                line: line.line.clone(),
                stops: line.stops.len(),
                geocoded: line.coordinates.is_some(),
                incidents,
                attributed,
            }
        })
        .collect()
}

/// Loads the dataset and prints the line table.
///
/// # Errors
///
/// Returns an error if the dataset cannot be loaded.
pub fn print_lines(paths: &DataPaths) -> Result<(), Box<dyn std::error::Error>> {
    let dataset = DelayDataset::load(paths)?;
    let summaries = line_summaries(&dataset);

    println!(
        "{:<6} {:>6} {:>9} {:>10} {:>11}",
        "LINE", "STOPS", "GEOCODED", "INCIDENTS", "ATTRIBUTED"
    );
    println!("{}", "-".repeat(46));
    for s in &summaries {
        println!(
            "{:<6} {:>6} {:>9} {:>10} {:>11}",
            s.line,
            s.stops,
            if s.geocoded { "yes" } else { "no" },
            s.incidents,
            s.attributed
        );
    }

    if let Some((from, until)) = dataset.date_range() {
        println!();
        println!(
            "{} incidents from {from} to {until}",
            dataset.incidents().len()
        );
    }

    Ok(())
}

/// Downloads the delay data into the data directory.
///
/// # Errors
///
/// Returns an error if the download or writing the file fails.
pub async fn download(
    paths: &DataPaths,
    latest_only: bool,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    ensure_dir(paths.data_dir())?;
    let output = paths.delay_data();
    let config = SourceConfig::ttc_streetcar_delays();
    log::info!("Downloading {} to {}", config.name, output.display());

    let client = reqwest::Client::new();
    let progress = IndicatifProgress::download_bar(multi, "Downloading delay data");
    let summary =
        download_delay_data(&client, &config, &output, latest_only, Some(progress)).await?;

    log::info!(
        "Wrote {} rows from {} resources ({} skipped)",
        summary.rows,
        summary.downloaded.len(),
        summary.skipped.len()
    );
    Ok(())
}

/// Location descriptions that still need geocoding, keyed by their
/// upper-cased form. The first spelling of a description is kept.
#[must_use]
pub fn pending_locations<'a>(
    descriptions: impl IntoIterator<Item = &'a str>,
    known: &locations::LocationIndex,
) -> BTreeMap<String, String> {
    let mut pending = BTreeMap::new();
    for description in descriptions {
        let description = description.trim();
        if description.is_empty() {
            continue;
        }
        let key = description.to_uppercase();
        if !known.contains_key(&key) {
            pending.entry(key).or_insert_with(|| description.to_string());
        }
    }
    pending
}

/// Geocodes the distinct delay locations and writes the locations file.
///
/// Unless `all` is set, locations already present in an existing file are
/// kept and not queried again.
///
/// # Errors
///
/// Returns an error if the API key is missing or a file cannot be read or
/// written.
pub async fn geocode_locations(
    paths: &DataPaths,
    all: bool,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = service_registry::google_maps();
    let geocoder = GoogleMapsGeocoder::from_env(reqwest::Client::new(), &service)?;

    let incidents = delays::read_delay_file(&paths.delay_data())?;
    let locations_path = paths.delay_locations();
    let known = if !all && locations_path.is_file() {
        locations::read_location_file(&locations_path)?
    } else {
        locations::LocationIndex::new()
    };

    let pending = pending_locations(
        incidents.iter().filter_map(|i| i.location.as_deref()),
        &known,
    );
    log::info!(
        "{} locations to geocode, {} already known",
        pending.len(),
        known.len()
    );

    let progress = IndicatifProgress::geocode_bar(multi, "Geocoding delay locations");
    let geocoded = geocode_all(
        &geocoder,
        pending.values().cloned(),
        &service.batch,
        Some(progress),
    )
    .await;

    let mut merged: BTreeMap<String, Option<GeoPoint>> = known;
    merged.extend(geocoded);
    write_location_coordinates(&locations_path, &merged)?;

    let found = merged.values().filter(|p| p.is_some()).count();
    log::info!(
        "Wrote {} locations ({found} with coordinates) to {}",
        merged.len(),
        locations_path.display()
    );
    Ok(())
}

/// Coordinates for each stop of `line`, aligned with its stop list.
#[must_use]
pub fn stop_coordinates(
    line: &LineStops,
    geocoded: &BTreeMap<String, Option<GeoPoint>>,
) -> Vec<Option<GeoPoint>> {
    line.stops
        .iter()
        .map(|stop| geocoded.get(stop.trim()).copied().flatten())
        .collect()
}

/// Geocodes the stop names of every line (or of `only_line`) and
/// rewrites the stop files with a `coordinates` column.
///
/// # Errors
///
/// Returns an error if the API key is missing or a stop file cannot be
/// read or written.
pub async fn geocode_stops(
    paths: &DataPaths,
    only_line: Option<&str>,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = service_registry::google_maps();
    let geocoder = GoogleMapsGeocoder::from_env(reqwest::Client::new(), &service)?;

    let mut files = Vec::new();
    for path in stops::stop_files(&paths.stops_dir())? {
        let id = stops::line_id_from_path(&path)?;
        if only_line.is_some_and(|only| only != id) {
            continue;
        }
        let file = std::fs::File::open(&path)?;
        let line = stops::read_stops(file, &id, &path.display().to_string())?;
        files.push((path, line));
    }

    if files.is_empty() {
        log::warn!("No stop files to geocode in {}", paths.stops_dir().display());
        return Ok(());
    }

    let progress = IndicatifProgress::geocode_bar(multi, "Geocoding stops");
    let geocoded = geocode_all(
        &geocoder,
        files
            .iter()
            .flat_map(|(_, line)| line.stops.iter().map(|s| s.trim().to_string())),
        &service.batch,
        Some(progress),
    )
    .await;

    for (path, line) in &files {
        let coordinates = stop_coordinates(line, &geocoded);
        let missing = coordinates.iter().filter(|c| c.is_none()).count();
        if missing > 0 {
            log::warn!(
                "Line {}: {missing} of {} stops could not be geocoded",
                line.line,
                line.stops.len()
            );
        }
        write_stop_file(path, line, Some(&coordinates))?;
        log::info!("Wrote {}", path.display());
    }

    Ok(())
}

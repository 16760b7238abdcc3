//! Attribution of incidents to the stop pair they happened between.

use std::collections::BTreeMap;

use rayon::prelude::*;
use streetcar_delay_spatial::resolve_segment;
use streetcar_delay_transit_models::{DelayIncident, LineStops};

/// Counts from one enrichment pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentSummary {
    /// Incidents that received a stop pair.
    pub enriched: usize,
    /// Incidents without a geocoded location.
    pub no_coordinates: usize,
    /// Incidents on a line without stop coordinates.
    pub unknown_line: usize,
    /// Incidents the resolver rejected.
    pub failed: usize,
}

#[derive(Clone, Copy)]
enum Outcome {
    Enriched,
    NoCoordinates,
    UnknownLine,
    Failed,
}

/// Sets `closest_stop_before` / `closest_stop_after` on every incident
/// that has a coordinate and whose line has usable stop coordinates. All
/// other incidents end up with no stop pair.
///
/// Incidents are processed in parallel; the result is the same as a
/// sequential pass.
pub fn enrich_incidents(
    incidents: &mut [DelayIncident],
    lines: &BTreeMap<String, LineStops>,
) -> EnrichmentSummary {
    let outcomes: Vec<Outcome> = incidents
        .par_iter_mut()
        .map(|incident| enrich_incident(incident, lines))
        .collect();

    let mut summary = EnrichmentSummary::default();
    for outcome in outcomes {
        match outcome {
            Outcome::Enriched => summary.enriched += 1,
            Outcome::NoCoordinates => summary.no_coordinates += 1,
            Outcome::UnknownLine => summary.unknown_line += 1,
            Outcome::Failed => summary.failed += 1,
        }
    }

    log::info!(
        "Stop attribution: {} enriched, {} without coordinates, {} on lines without stops, {} failed",
        summary.enriched,
        summary.no_coordinates,
        summary.unknown_line,
        summary.failed
    );

    summary
}

fn enrich_incident(incident: &mut DelayIncident, lines: &BTreeMap<String, LineStops>) -> Outcome {
    incident.closest_stop_before = None;
    incident.closest_stop_after = None;

    let Some(query) = incident.coordinates else {
        return Outcome::NoCoordinates;
    };
    let Some((line, coords)) = lines
        .get(&incident.line)
        .and_then(|line| line.segment_coordinates().map(|coords| (line, coords)))
    else {
        log::debug!("No stop coordinates for line {}", incident.line);
        return Outcome::UnknownLine;
    };

    match resolve_segment(coords, query) {
        Ok(index) => match line.segment_names(index) {
            Some((before, after)) => {
                incident.closest_stop_before = Some(before.to_string());
                incident.closest_stop_after = Some(after.to_string());
                Outcome::Enriched
            }
            None => Outcome::Failed,
        },
        Err(e) => {
            log::warn!(
                "Could not attribute incident on line {} at {query}: {e}",
                incident.line
            );
            Outcome::Failed
        }
    }
}

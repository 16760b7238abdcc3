//! Nearest stop-pair resolution.
//!
//! Incident locations come from geocoding a free-text description, so they
//! are approximate and the single nearest stop may sit on either end of the
//! segment the incident actually happened on. The resolver picks the
//! segment with the *flanking rank* policy: among the two neighbours of the
//! nearest stop, the one that ranks closer to the query in the full
//! distance ordering is taken as the other end of the segment.
//!
//! This is an approximation, not a projection onto the line. Near a sharp
//! bend the flanking ranks do not always follow segment membership and an
//! incident can land on the adjacent segment. Changing that would change
//! the classification of existing data, so the policy is kept as is.

use streetcar_delay_transit_models::GeoPoint;

use crate::SpatialError;
use crate::distance::haversine_km;

/// Returns the index of the stop that begins the segment `query` lies on.
///
/// The result `i` always satisfies `0 <= i <= stops.len() - 2`; the
/// segment is `stops[i]..stops[i + 1]`.
///
/// Stops are ranked by ascending distance to `query`. Equal distances are
/// ranked by stop index, so identical input always yields the same segment.
///
/// # Errors
///
/// Returns [`SpatialError::InvalidInput`] if fewer than two stops are
/// given, or if the query or any stop coordinate is not finite.
pub fn resolve_segment(stops: &[GeoPoint], query: GeoPoint) -> Result<usize, SpatialError> {
    if stops.len() < 2 {
        return Err(SpatialError::InvalidInput {
            message: format!(
                "need coordinates of at least two stops, got {}",
                stops.len()
            ),
        });
    }

    if !query.is_finite() {
        return Err(SpatialError::InvalidInput {
            message: format!("query coordinate {query} is not finite"),
        });
    }

    if let Some(idx) = stops.iter().position(|p| !p.is_finite()) {
        return Err(SpatialError::InvalidInput {
            message: format!("stop {idx} has a non-finite coordinate {}", stops[idx]),
        });
    }

    let distances: Vec<f64> = stops.iter().map(|&stop| haversine_km(query, stop)).collect();

    let mut ranking: Vec<usize> = (0..stops.len()).collect();
    ranking.sort_by(|&a, &b| distances[a].total_cmp(&distances[b]).then(a.cmp(&b)));

    let nearest = ranking[0];
    let last = stops.len() - 1;

    if nearest == 0 {
        return Ok(0);
    }
    if nearest == last {
        return Ok(last - 1);
    }

    let mut rank_of = vec![0usize; stops.len()];
    for (rank, &idx) in ranking.iter().enumerate() {
        rank_of[idx] = rank;
    }

    if rank_of[nearest - 1] < rank_of[nearest + 1] {
        Ok(nearest - 1)
    } else {
        Ok(nearest)
    }
}

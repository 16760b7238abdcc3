//! Cleaning of free-text location descriptions before geocoding.
//!
//! Delay reports describe locations as intersections written in several
//! ways: `"QUEEN AND BATHURST"`, `"King St / Shaw St"`,
//! `"Queen St W @ Bathurst"`. The geocoding API reads `&` as an
//! intersection and does not understand `@`.

/// Descriptions that never resolve to a place.
static SKIP_PATTERNS: &[&str] = &["UNKNOWN", "N/A", "NA", "NONE", "NOT AVAILABLE"];

/// Rewrites a location description into a geocoding query: `/` becomes
/// `&`, `@` becomes `at`, and runs of whitespace collapse to one space.
#[must_use]
pub fn normalize_description(description: &str) -> String {
    description
        .replace('/', "&")
        .replace('@', "at")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Returns `false` for empty or placeholder descriptions that are not
/// worth a request.
#[must_use]
pub fn is_geocodable(description: &str) -> bool {
    let trimmed = description.trim();
    !trimmed.is_empty()
        && !SKIP_PATTERNS
            .iter()
            .any(|p| trimmed.eq_ignore_ascii_case(p))
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Spatial primitives for attributing delay incidents to line segments.
//!
//! Provides the haversine great-circle distance, the nearest stop-pair
//! resolver used by the dataset enrichment pass, and the Mercator
//! projection used by the line map renderer. The resolver works purely on
//! geographic coordinates and never goes through the planar projection.

pub mod distance;
pub mod projection;
pub mod segment;

pub use distance::{EARTH_RADIUS_KM, haversine_km};
pub use projection::mercator_project;
pub use segment::resolve_segment;

use thiserror::Error;

/// Errors that can occur during spatial operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpatialError {
    /// The stop sequence or query point cannot be resolved.
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Description of what was wrong with the input.
        message: String,
    },
}

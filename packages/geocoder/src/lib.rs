#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geocoding of delay location descriptions and streetcar stop names.
//!
//! Turns free-text descriptions such as `"King St West / Sudbury St"` into
//! coordinates using the Google Maps Geocoding API, configured via the TOML
//! file in `services/`. Bulk geocoding runs in batches with a cooldown
//! between them to stay under the API's rate limits.

pub mod address;
pub mod batch;
pub mod google_maps;
pub mod service_registry;

use streetcar_delay_transit_models::GeoPoint;
use thiserror::Error;

pub use batch::geocode_all;
pub use google_maps::GoogleMapsGeocoder;
pub use service_registry::BatchOptions;

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// The service rejected the request.
    #[error("Geocoding service error: {message}")]
    Status {
        /// Status reported by the service.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// No API key configured.
    #[error("Missing API key: set the {variable} environment variable")]
    MissingApiKey {
        /// Environment variable expected to hold the key.
        variable: String,
    },
}

/// Resolves a free-text location description to a coordinate.
#[async_trait::async_trait]
pub trait Geocoder: Send + Sync {
    /// Geocodes one description. `Ok(None)` means the service found no
    /// match.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the request fails or the response cannot
    /// be understood.
    async fn geocode(&self, description: &str) -> Result<Option<GeoPoint>, GeocodeError>;
}

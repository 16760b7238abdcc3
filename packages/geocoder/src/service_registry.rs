//! Compile-time geocoding service configuration.
//!
//! The Google Maps service is defined in `services/google_maps.toml` and
//! embedded into the binary at compile time.

use std::time::Duration;

use serde::Deserialize;

const GOOGLE_MAPS_TOML: &str = include_str!("../services/google_maps.toml");

/// A geocoding service configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingService {
    /// Unique identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Endpoint URL.
    pub base_url: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Viewport bias as `"sw_lat,sw_lng|ne_lat,ne_lng"`.
    pub bounds: String,
    /// Batching for bulk geocoding.
    pub batch: BatchOptions,
}

/// How bulk geocoding spreads its requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BatchOptions {
    /// Descriptions per batch.
    pub batch_size: usize,
    /// Minimum wall time of each batch except the last, in seconds.
    pub cooldown_secs: u64,
    /// Concurrent requests within a batch.
    pub concurrency: usize,
}

impl BatchOptions {
    /// Minimum wall time of each batch except the last.
    #[must_use]
    pub const fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

impl Default for BatchOptions {
    fn default() -> Self {
        google_maps().batch
    }
}

/// Returns the Google Maps service configuration.
///
/// # Panics
///
/// Panics if the embedded TOML is malformed (this is a compile-time
/// guarantee since the config is embedded).
#[must_use]
pub fn google_maps() -> GeocodingService {
    toml::de::from_str(GOOGLE_MAPS_TOML)
        .unwrap_or_else(|e| panic!("Failed to parse geocoding service 'google_maps': {e}"))
}

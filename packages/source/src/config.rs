//! Embedded configuration for the delay data source.
//!
//! The TOML file under `packages/source/config/` is baked into the binary
//! at compile time via [`include_str!`].

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::ckan::CkanResource;

const TTC_STREETCAR_DELAYS_TOML: &str = include_str!("../config/ttc_streetcar_delays.toml");

/// A CKAN-hosted delay data source.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Unique identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// CKAN `package_show` endpoint.
    pub api_url: String,
    /// CKAN package identifier.
    pub package_id: String,
    /// Resources whose name contains this (case-insensitive) are not data.
    pub skip_resource_pattern: String,
    /// Historical column names mapped to their canonical names.
    #[serde(default)]
    pub column_renames: BTreeMap<String, String>,
}

impl SourceConfig {
    /// Returns the TTC streetcar delay source.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed (this is a compile-time
    /// guarantee since the config is embedded).
    #[must_use]
    pub fn ttc_streetcar_delays() -> Self {
        toml::de::from_str(TTC_STREETCAR_DELAYS_TOML)
            .unwrap_or_else(|e| panic!("Failed to parse ttc_streetcar_delays.toml: {e}"))
    }

    /// Returns `true` if the resource holds delay records rather than
    /// documentation.
    #[must_use]
    pub fn is_data_resource(&self, resource: &CkanResource) -> bool {
        !resource
            .name
            .to_lowercase()
            .contains(&self.skip_resource_pattern.to_lowercase())
    }
}

#![allow(clippy::module_name_repetitions)]
//! Canonical file paths inside the data directory.
//!
//! The data directory defaults to `data/` under the workspace root and can
//! be moved with the `STREETCAR_DATA_DIR` environment variable.

use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "STREETCAR_DATA_DIR";

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`.
#[must_use]
pub fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Locations of the files that make up the delay dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    data_dir: PathBuf,
}

impl DataPaths {
    /// Uses `data_dir` as the data directory.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Uses `STREETCAR_DATA_DIR` if set, otherwise `data/` under the
    /// workspace root.
    #[must_use]
    pub fn from_env() -> Self {
        std::env::var_os(DATA_DIR_ENV)
            .filter(|dir| !dir.is_empty())
            .map_or_else(|| Self::new(project_root().join("data")), Self::new)
    }

    /// The data directory itself.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Pipe-separated delay incidents.
    #[must_use]
    pub fn delay_data(&self) -> PathBuf {
        self.data_dir.join("delay_data.csv")
    }

    /// Geocoded delay location descriptions.
    #[must_use]
    pub fn delay_locations(&self) -> PathBuf {
        self.data_dir.join("delay_locations.csv")
    }

    /// Directory holding one `<line>_stops.csv` file per line.
    #[must_use]
    pub fn stops_dir(&self) -> PathBuf {
        self.data_dir.join("stops")
    }
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

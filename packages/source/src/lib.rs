#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Download of the raw streetcar delay tables from the City of Toronto
//! open-data portal.
//!
//! The portal is a CKAN instance. The delay package holds one resource per
//! year, older years as Excel workbooks and newer ones as CSV;
//! [`download_delay_data`] fetches every tabular resource, renames
//! the columns that changed over the years to their canonical names, and
//! writes one pipe-separated file that the dataset loader reads.

pub mod ckan;
pub mod config;
pub mod progress;
pub mod retry;
pub mod tables;

use std::path::Path;
use std::sync::Arc;

use crate::config::SourceConfig;
use crate::progress::ProgressCallback;

/// Errors that can occur during data source operations.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV reading or writing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// An Excel workbook could not be read.
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    /// I/O error (file read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The server answered with a status that will not succeed on retry.
    #[error("HTTP status: {message}")]
    Status {
        /// Status line and context.
        message: String,
    },

    /// The CKAN package metadata was not in the expected shape.
    #[error("Package error: {message}")]
    Package {
        /// Description of what went wrong.
        message: String,
    },
}

/// Outcome of a full download.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    /// Resources that were downloaded and merged.
    pub downloaded: Vec<String>,
    /// Resources that were skipped (documentation or unsupported format).
    pub skipped: Vec<String>,
    /// Number of data rows written.
    pub rows: usize,
}

/// Downloads the tabular resources of the configured package and writes
/// the merged, column-normalized table to `output_path` (pipe-separated).
///
/// With `latest_only` only the most recently created data resource is
/// considered; otherwise every data resource is merged.
///
/// # Errors
///
/// Returns [`SourceError`] if fetching the package metadata, downloading a
/// resource, or writing the output fails.
#[allow(clippy::future_not_send)]
pub async fn download_delay_data(
    client: &reqwest::Client,
    config: &SourceConfig,
    output_path: &Path,
    latest_only: bool,
    progress: Option<Arc<dyn ProgressCallback>>,
) -> Result<DownloadSummary, SourceError> {
    log::info!("Fetching package metadata for {}", config.name);
    let resources = ckan::fetch_package_resources(client, config).await?;

    let candidates: Vec<&ckan::CkanResource> = if latest_only {
        ckan::latest_resource(&resources, config).into_iter().collect()
    } else {
        resources
            .iter()
            .filter(|r| config.is_data_resource(r))
            .collect()
    };

    let mut summary = DownloadSummary::default();
    let mut tables = Vec::new();

    let data: Vec<&ckan::CkanResource> = candidates
        .into_iter()
        .filter(|r| r.is_csv() || r.is_spreadsheet())
        .collect();

    for resource in &resources {
        if !data.iter().any(|d| d.url == resource.url) {
            log::warn!(
                "Skipping resource '{}' (format {:?})",
                resource.name,
                resource.format
            );
            summary.skipped.push(resource.name.clone());
        }
    }

    if let Some(p) = &progress {
        p.set_total(data.len() as u64);
    }

    for resource in data {
        if let Some(p) = &progress {
            p.set_message(format!("Downloading {}", resource.name));
        }
        let table = if resource.is_csv() {
            let text = retry::send_text(|| client.get(&resource.url)).await?;
            tables::parse_table(&text, &config.column_renames)?
        } else {
            let bytes = retry::send_bytes(|| client.get(&resource.url)).await?;
            tables::parse_workbook(&bytes, &config.column_renames)?
        };
        log::info!(
            "Downloaded '{}': {} rows, {} columns",
            resource.name,
            table.rows.len(),
            table.headers.len()
        );
        tables.push(table);
        summary.downloaded.push(resource.name.clone());
        if let Some(p) = &progress {
            p.inc(1);
        }
    }

    let merged = tables::merge_tables(tables);
    summary.rows = merged.rows.len();

    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    tables::write_pipe_separated(&merged, output_path)?;

    log::info!(
        "Wrote {} delay rows to {}",
        summary.rows,
        output_path.display()
    );
    if let Some(p) = &progress {
        p.finish(format!("{} rows", summary.rows));
    }

    Ok(summary)
}

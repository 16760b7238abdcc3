#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Standalone entry point for the streetcar delay API server.
//!
//! Loads the dataset from `STREETCAR_DATA_DIR` and serves it.

use std::sync::Arc;

use streetcar_delay_dataset::{DataPaths, DelayDataset};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let paths = DataPaths::from_env();
    log::info!("Loading delay data from {}...", paths.data_dir().display());
    let dataset = DelayDataset::load(&paths).map_err(|e| {
        log::error!("Failed to load delay data: {e}");
        std::io::Error::other(e)
    })?;

    streetcar_delay_server::run_server(Arc::new(dataset)).await
}

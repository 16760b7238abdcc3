#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for streetcar delay statistics.
//!
//! Serves the REST API over an in-memory [`DelayDataset`] that is loaded
//! once at startup, plus the static frontend from `app/dist`.

mod handlers;
pub mod interactive;

use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, Scope, middleware, web};
use streetcar_delay_dataset::DelayDataset;

/// Shared application state.
pub struct AppState {
    /// The enriched delay dataset, read-only after loading.
    pub dataset: Arc<DelayDataset>,
}

/// Routes of the REST API, mounted under `/api`.
#[must_use]
pub fn api_scope() -> Scope {
    web::scope("/api")
        .route("/health", web::get().to(handlers::health))
        .route("/streetcarLines", web::get().to(handlers::streetcar_lines))
        .route(
            "/streetcarLines/{line}/map",
            web::get().to(handlers::line_map),
        )
        .route("/streetcarStops", web::get().to(handlers::streetcar_stops))
        .route(
            "/streetcarDelays/{line}",
            web::get().to(handlers::streetcar_delays),
        )
        .route(
            "/streetcarDelays/{line}/aggregate",
            web::get().to(handlers::delay_aggregate),
        )
        .route(
            "/streetcarDelays/{line}/aggregate/{stop:.*}",
            web::get().to(handlers::delay_aggregate_details),
        )
        .route("/metadata", web::get().to(handlers::metadata))
        .route("/help", web::get().to(handlers::help))
}

/// Starts the streetcar delay API server over `dataset`.
///
/// Binds to `BIND_ADDR` (default `127.0.0.1`) and `PORT` (default `8080`).
/// This is a regular async function; the caller provides the async runtime
/// (e.g. via `#[actix_web::main]`) and initialises logging.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(dataset: Arc<DelayDataset>) -> std::io::Result<()> {
    log::info!(
        "Serving {} incidents on {} lines",
        dataset.incidents().len(),
        dataset.lines().len()
    );

    let state = web::Data::new(AppState { dataset });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .service(api_scope())
            // Serve frontend static files (production)
            .service(Files::new("/", "app/dist").index_file("index.html"))
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

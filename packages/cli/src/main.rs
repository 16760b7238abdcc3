#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line toolchain for streetcar delay statistics.
//!
//! Downloads the delay data, geocodes delay locations and stop names,
//! prints a per-line summary, and starts the API server. Without a
//! subcommand, an interactive menu picks one.
//!
//! Uses `indicatif-log-bridge` (via [`streetcar_delay_cli_utils::init_logger`])
//! so log lines and progress bars never fight for the terminal.

mod commands;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use dialoguer::{Confirm, Input, Select};
use streetcar_delay_cli_utils::MultiProgress;
use streetcar_delay_dataset::{DataPaths, DelayDataset};

#[derive(Parser)]
#[command(name = "streetcar_delay", about = "Streetcar delay statistics toolchain")]
struct Cli {
    /// Data directory (overrides `STREETCAR_DATA_DIR`)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the dataset and start the API server
    Serve,
    /// Print stop and incident counts per line
    Lines,
    /// Download the delay data from the open data portal
    Download {
        /// Only fetch the most recently published resource
        #[arg(long)]
        latest_only: bool,
    },
    /// Geocode the delay location descriptions
    GeocodeLocations {
        /// Geocode every location again, not only new ones
        #[arg(long)]
        all: bool,
    },
    /// Geocode stop names and rewrite the stop files
    GeocodeStops {
        /// Only geocode this line (e.g. "505")
        #[arg(long)]
        line: Option<String>,
    },
}

/// Entries of the interactive menu.
enum Tool {
    Serve,
    Lines,
    Download,
    GeocodeLocations,
    GeocodeStops,
}

impl Tool {
    const ALL: &[Self] = &[
        Self::Serve,
        Self::Lines,
        Self::Download,
        Self::GeocodeLocations,
        Self::GeocodeStops,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Serve => "Start server",
            Self::Lines => "Show line summary",
            Self::Download => "Download delay data",
            Self::GeocodeLocations => "Geocode delay locations",
            Self::GeocodeStops => "Geocode stops",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = streetcar_delay_cli_utils::init_logger();
    let cli = Cli::parse();
    let paths = cli
        .data_dir
        .map_or_else(DataPaths::from_env, DataPaths::new);

    let Some(command) = cli.command else {
        return interactive(&paths, &multi).await;
    };

    match command {
        Commands::Serve => serve(&paths).await?,
        Commands::Lines => commands::print_lines(&paths)?,
        Commands::Download { latest_only } => {
            commands::download(&paths, latest_only, &multi).await?;
        }
        Commands::GeocodeLocations { all } => {
            commands::geocode_locations(&paths, all, &multi).await?;
        }
        Commands::GeocodeStops { line } => {
            commands::geocode_stops(&paths, line.as_deref(), &multi).await?;
        }
    }

    Ok(())
}

/// Loads the dataset and runs the server until it stops.
async fn serve(paths: &DataPaths) -> Result<(), Box<dyn std::error::Error>> {
    let dataset = Arc::new(DelayDataset::load(paths)?);

    // The server uses actix-web's runtime, so it runs in a blocking task to
    // avoid nesting tokio runtimes.
    tokio::task::spawn_blocking(move || {
        actix_web::rt::System::new().block_on(streetcar_delay_server::run_server(dataset))
    })
    .await??;

    Ok(())
}

async fn interactive(
    paths: &DataPaths,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Streetcar Delay Statistics");
    println!();

    let labels: Vec<&str> = Tool::ALL.iter().map(Tool::label).collect();
    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Tool::ALL[idx] {
        Tool::Serve => {
            tokio::task::spawn_blocking(|| {
                actix_web::rt::System::new().block_on(streetcar_delay_server::interactive::run())
            })
            .await??;
        }
        Tool::Lines => commands::print_lines(paths)?,
        Tool::Download => {
            let latest_only = Confirm::new()
                .with_prompt("Only fetch the most recent resource?")
                .default(false)
                .interact()?;
            commands::download(paths, latest_only, multi).await?;
        }
        Tool::GeocodeLocations => {
            let all = Confirm::new()
                .with_prompt("Geocode every location again?")
                .default(false)
                .interact()?;
            commands::geocode_locations(paths, all, multi).await?;
        }
        Tool::GeocodeStops => {
            let line: String = Input::new()
                .with_prompt("Line (empty for all)")
                .allow_empty(true)
                .interact_text()?;
            let line = line.trim();
            commands::geocode_stops(paths, (!line.is_empty()).then_some(line), multi).await?;
        }
    }

    Ok(())
}

//! Command-line front-end for the bloomwatch prediction session.

use anyhow::{Context, Result};
use bloomwatch_client::HttpPredictor;
use bloomwatch_config::BloomwatchConfig;
use bloomwatch_core::{ClickMode, RecordField, Session, SubmitError};
use bloomwatch_protocol::UploadResponse;
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

/// Default config file looked up next to the working directory.
const DEFAULT_CONFIG: &str = "bloomwatch.json5";

/// Command-line options for the bloomwatch client.
#[derive(Parser)]
#[command(name = "bloomwatch", version)]
struct Cli {
    /// Optional path to a bloomwatch.json5 config file
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Predict chlorophyll-a for a single coordinate and date
    Predict {
        /// Latitude in decimal degrees
        #[arg(long)]
        lat: f64,
        /// Longitude in decimal degrees
        #[arg(long)]
        lon: f64,
        /// Imagery date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
    },
    /// Import a CSV batch, predict, and export the joined results
    Batch {
        /// CSV file with latitude, longitude, and date columns
        #[arg(long)]
        input: PathBuf,
        /// Output path; defaults to the configured export file name
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the marker list a CSV batch projects onto the map
    Markers {
        /// CSV file with latitude, longitude, and date columns
        #[arg(long)]
        input: PathBuf,
    },
    /// Upload a CSV file to the prediction service
    Upload {
        /// CSV file to upload
        #[arg(long)]
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => bloomwatch_config::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => bloomwatch_config::load_or_default(DEFAULT_CONFIG)?,
    };
    let predictor = Arc::new(HttpPredictor::new(&config.predictor)?);

    match cli.command {
        Command::Predict { lat, lon, date } => {
            predict_single(config, predictor, lat, lon, date).await
        }
        Command::Batch { input, output } => predict_batch(config, predictor, input, output).await,
        Command::Markers { input } => print_markers(config, predictor, input),
        Command::Upload { input } => upload(predictor, input).await,
    }
}

/// Run the degenerate n=1 batch and print the joined row.
async fn predict_single(
    config: BloomwatchConfig,
    predictor: Arc<HttpPredictor>,
    lat: f64,
    lon: f64,
    date: String,
) -> Result<()> {
    let mut session = Session::new(config, predictor);
    session.set_mode(ClickMode::Single);
    let id = session.add_row();
    session.edit(id, RecordField::Latitude, lat.to_string())?;
    session.edit(id, RecordField::Longitude, lon.to_string())?;
    session.edit(id, RecordField::Date, date)?;

    run_prediction(&mut session).await?;
    print_rows(&session);
    Ok(())
}

/// Import, predict, export.
async fn predict_batch(
    config: BloomwatchConfig,
    predictor: Arc<HttpPredictor>,
    input: PathBuf,
    output: Option<PathBuf>,
) -> Result<()> {
    let text = std::fs::read_to_string(&input)
        .with_context(|| format!("reading {}", input.display()))?;
    let mut session = Session::new(config, predictor);

    let summary = session.import_csv(&text);
    println!(
        "Imported {} row(s), rejected {}.",
        summary.accepted, summary.rejected
    );
    run_prediction(&mut session).await?;
    print_rows(&session);

    let export = session.export_csv()?;
    let path = output.unwrap_or_else(|| PathBuf::from(&export.file_name));
    std::fs::write(&path, export.text)
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Results written to {}.", path.display());
    Ok(())
}

/// Print the ordered marker list as JSON lines for the map widget.
fn print_markers(
    config: BloomwatchConfig,
    predictor: Arc<HttpPredictor>,
    input: PathBuf,
) -> Result<()> {
    let text = std::fs::read_to_string(&input)
        .with_context(|| format!("reading {}", input.display()))?;
    let mut session = Session::new(config, predictor);
    let summary = session.import_csv(&text);
    info!(
        "markers derived from import (accepted={}, rejected={})",
        summary.accepted, summary.rejected
    );
    for marker in session.view().markers {
        println!("{}", serde_json::to_string(&marker)?);
    }
    Ok(())
}

/// Upload a CSV file and print the opaque outcome.
async fn upload(predictor: Arc<HttpPredictor>, input: PathBuf) -> Result<()> {
    let text = std::fs::read_to_string(&input)
        .with_context(|| format!("reading {}", input.display()))?;
    let file_name = input
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload.csv");
    match predictor.upload_csv(file_name, text).await? {
        UploadResponse::Rows(rows) => {
            for row in rows {
                println!("{}", serde_json::to_string(&row)?);
            }
        }
        UploadResponse::Download { download_url } => {
            println!("Results available at {download_url}");
        }
    }
    Ok(())
}

/// Drive one submission, turning refusals into readable errors.
async fn run_prediction(session: &mut Session) -> Result<()> {
    match session.predict().await {
        Ok(report) => {
            info!(
                "prediction merged (attached={}, discarded={})",
                report.attached, report.discarded
            );
            Ok(())
        }
        Err(SubmitError::Validation { indices }) => {
            anyhow::bail!(
                "validation failed for row(s) {:?}; every record needs in-range coordinates and a YYYY-MM-DD date",
                indices
            )
        }
        Err(err) => Err(err.into()),
    }
}

/// Print the joined table the way the results panel renders it.
fn print_rows(session: &Session) {
    for (index, row) in session.view().rows.iter().enumerate() {
        let outcome = match (&row.chlorophyll, &row.error) {
            (Some(value), _) => format!("{value} µg/L"),
            (None, Some(error)) => error.clone(),
            (None, None) => "no result".to_string(),
        };
        let resolved = row
            .resolved_date
            .clone()
            .unwrap_or_else(|| "-".to_string());
        println!(
            "Coordinate {}: lat={} lon={} date={} -> {} (imagery {})",
            index + 1,
            row.latitude,
            row.longitude,
            row.date,
            outcome,
            resolved
        );
    }
}

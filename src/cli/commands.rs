use crate::checkpoint::{CsvCheckpointStore, LocationStore};
use crate::cli::args::{Cli, Commands};
use crate::config::PipelineConfig;
use crate::error::{ProcessingError, Result};
use crate::geocoding::NominatimClient;
use crate::pipeline::{Pipeline, PipelineReport};
use crate::utils::logging::init_logging;
use tracing::{info, warn};

pub async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;

    let overrides = cli.command.overrides();
    let config = PipelineConfig::load(cli.command.config_file().map(|p| p.as_path()), &overrides)?;

    match cli.command {
        Commands::Process { .. } => {
            let geocoder = NominatimClient::new(&config.geocoder)?;
            let pipeline = Pipeline::new(config).with_silent(cli.quiet);

            let report = tokio::select! {
                result = pipeline.run(geocoder) => result?,
                _ = tokio::signal::ctrl_c() => {
                    warn!("Interrupted; progress up to the last completed batch is checkpointed");
                    return Err(ProcessingError::Cancelled);
                }
            };

            print_report(&report);
        }

        Commands::Status { .. } => {
            show_status(&config)?;
        }
    }

    Ok(())
}

fn print_report(report: &PipelineReport) {
    println!("Rows read: {} ({} kept)", report.rows_read, report.rows_kept);
    println!("Unique locations: {}", report.unique_locations);
    println!("Geocoding requests made: {}", report.provider_calls);
    println!("Failed geocodes: {}", report.failed_geocodes);

    if report.stopped_after_geocoding {
        println!("Resume-only run: geocoding complete, no output written");
        return;
    }

    println!("Rows without a city: {}", report.unmatched_rows);
    println!("Records written: {}", report.records_written);
    for path in &report.outputs {
        println!("  {}", path.display());
    }
}

fn show_status(config: &PipelineConfig) -> Result<()> {
    let store = CsvCheckpointStore::new(config.checkpoint_dir());
    info!("Inspecting checkpoint in {}", config.checkpoint_dir().display());

    let Some(record) = store.load()? else {
        println!(
            "No geocoding checkpoint found in {}",
            config.checkpoint_dir().display()
        );
        return Ok(());
    };

    println!("Checkpoint: {}", store.checkpoint_path().display());
    println!("Locations stored: {}", record.len());
    println!("Failed lookups: {}", record.failed_count());

    match &record.progress {
        Some(progress) => {
            println!(
                "Progress: {}/{} ({:.1}%)",
                progress.completed,
                progress.total,
                progress.percent_complete()
            );
            println!("Current batch: {}", progress.current_batch);
            println!(
                "Estimated time remaining: {:.1} minutes",
                progress.estimated_time_remaining_minutes
            );
            println!("Last updated: {}", progress.last_updated.to_rfc3339());
        }
        None => println!("No progress metadata recorded"),
    }

    Ok(())
}

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::ConfigOverrides;

#[derive(Parser)]
#[command(name = "geoweather-processor")]
#[command(about = "Checkpointed reverse geocoding and cleaning of weather station data")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(
        short,
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Only log warnings and errors, hide the progress bar"
    )]
    pub quiet: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Geocode station locations and build the cleaned weather table
    Process {
        #[arg(long, help = "Raw averaged weather station CSV")]
        input_csv: Option<PathBuf>,

        #[arg(short, long, help = "Directory for the cleaned outputs")]
        output_dir: Option<PathBuf>,

        #[arg(
            long,
            help = "Directory for checkpoint and side files [default: <output-dir>/city_data]"
        )]
        checkpoint_dir: Option<PathBuf>,

        #[arg(short, long, help = "Locations geocoded between checkpoint saves")]
        batch_size: Option<usize>,

        #[arg(long, help = "Seconds between geocoding requests")]
        geocoding_delay: Option<f64>,

        #[arg(long, help = "Use the existing checkpoint without calling the geocoder")]
        skip_geocoding: bool,

        #[arg(
            long,
            conflicts_with = "skip_geocoding",
            help = "Finish pending geocoding and exit before merging"
        )]
        resume_only: bool,

        #[arg(long, help = "Geocode again locations that previously returned no city")]
        retry_failed: bool,

        #[arg(long, help = "Run data validation checks")]
        validate: bool,

        #[arg(long, help = "Skip JSON Lines output (only save CSV)")]
        no_json: bool,

        #[arg(long, help = "Also write a Parquet copy of the output")]
        parquet: bool,

        #[arg(short, long, help = "TOML configuration file [default: geoweather.toml if present]")]
        config: Option<PathBuf>,
    },

    /// Show geocoding progress stored in a checkpoint directory
    Status {
        #[arg(long, help = "Checkpoint directory to inspect")]
        checkpoint_dir: Option<PathBuf>,

        #[arg(short, long, help = "Output directory whose checkpoint to inspect")]
        output_dir: Option<PathBuf>,

        #[arg(short, long, help = "TOML configuration file")]
        config: Option<PathBuf>,
    },
}

impl Commands {
    /// Command-line values layered over file and environment settings
    pub fn overrides(&self) -> ConfigOverrides {
        match self {
            Commands::Process {
                input_csv,
                output_dir,
                checkpoint_dir,
                batch_size,
                geocoding_delay,
                skip_geocoding,
                resume_only,
                retry_failed,
                validate,
                no_json,
                parquet,
                ..
            } => ConfigOverrides {
                input_path: input_csv.clone(),
                output_dir: output_dir.clone(),
                checkpoint_dir: checkpoint_dir.clone(),
                batch_size: *batch_size,
                geocoding_delay_secs: *geocoding_delay,
                skip_geocoding: *skip_geocoding,
                resume_only: *resume_only,
                retry_failed: *retry_failed,
                run_validation: *validate,
                no_json: *no_json,
                parquet: *parquet,
            },
            Commands::Status {
                checkpoint_dir,
                output_dir,
                ..
            } => ConfigOverrides {
                output_dir: output_dir.clone(),
                checkpoint_dir: checkpoint_dir.clone(),
                ..ConfigOverrides::default()
            },
        }
    }

    pub fn config_file(&self) -> Option<&PathBuf> {
        match self {
            Commands::Process { config, .. } | Commands::Status { config, .. } => config.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_flags_become_overrides() {
        let cli = Cli::parse_from([
            "geoweather-processor",
            "process",
            "--input-csv",
            "raw.csv",
            "--batch-size",
            "25",
            "--geocoding-delay",
            "2.5",
            "--no-json",
            "--validate",
        ]);

        let overrides = cli.command.overrides();
        assert_eq!(overrides.input_path, Some(PathBuf::from("raw.csv")));
        assert_eq!(overrides.batch_size, Some(25));
        assert_eq!(overrides.geocoding_delay_secs, Some(2.5));
        assert!(overrides.no_json);
        assert!(overrides.run_validation);
        assert!(!overrides.skip_geocoding);
        assert!(cli.command.config_file().is_none());
    }

    #[test]
    fn test_skip_and_resume_only_conflict() {
        let result = Cli::try_parse_from([
            "geoweather-processor",
            "process",
            "--skip-geocoding",
            "--resume-only",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["geoweather-processor", "status", "--verbose"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Status { .. }));
    }
}

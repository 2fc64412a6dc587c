//! CLI definition using clap

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use gatelog_types::{Direction, OutputFormat};

#[derive(Parser)]
#[command(name = "gatelog")]
#[command(author = "yuuji")]
#[command(version)]
#[command(about = "Vehicle checkpoint log with internal/visitor classification")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (json, table). Uses config value if not specified.
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Verbose output (debug logging)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check whether a plate belongs to a registered vehicle
    Check {
        /// Plate number (e.g., "1กข 1234")
        plate: String,
    },

    /// Log a vehicle entering or leaving
    Log {
        /// Plate number. Read from --image when omitted.
        plate: Option<String>,

        /// Direction of travel
        #[arg(long, short = 'd', value_enum, default_value = "in")]
        direction: Direction,

        /// Photo of the vehicle / plate
        #[arg(long, short = 'i')]
        image: Option<PathBuf>,

        /// Free-text note
        #[arg(long, short = 'n')]
        note: Option<String>,
    },

    /// Read the plate from an image without logging anything
    Ocr {
        /// Path to image file
        image: PathBuf,
    },

    /// Register an internal vehicle
    Register {
        /// Plate number
        plate: String,

        /// Owner name
        owner: String,

        /// Department or unit
        #[arg(long, default_value = "")]
        department: String,
    },

    /// Remove a vehicle from the registry
    Unregister {
        /// Vehicle ID (see `gatelog vehicles`)
        id: String,
    },

    /// List registered vehicles
    Vehicles,

    /// Show the checkpoint log
    Logs {
        /// Maximum number of entries to show
        #[arg(long, short = 'l', default_value = "50")]
        limit: usize,
    },

    /// Daily summary of the log
    Report {
        /// Day to report (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Set data directory for the registry and log
        #[arg(long)]
        set_data_dir: Option<PathBuf>,

        /// Set plate reader command (image path is appended)
        #[arg(long)]
        set_plate_reader: Option<String>,

        /// Keep captured images on log entries (true/false)
        #[arg(long)]
        set_store_images: Option<bool>,

        /// Set default output format (json, table)
        #[arg(long)]
        set_output: Option<OutputFormat>,

        /// Set log level (error, warn, info, debug, trace)
        #[arg(long)]
        set_log_level: Option<String>,

        /// Reset to default configuration
        #[arg(long)]
        reset: bool,
    },
}

//! Command handlers

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use log::debug;

use crate::cli::{Cli, Commands};
use crate::output::{
    output_classification, output_log, output_log_entry, output_report, output_vehicles,
};
use gatelog_app::config::Config;
use gatelog_app::logging::init_logging;
use gatelog_app::ocr::{read_plate, PlateReading};
use gatelog_app::repository::{open_controller, open_plate_reader, FileSyncController};
use gatelog_app::LoadReport;
use gatelog_domain::service::{entries_for_day, summarize_day};
use gatelog_infra::image::{image_data_url, mime_for_path};
use gatelog_types::{Direction, Error, OutputFormat, Result};

pub async fn execute(cli: Cli) -> Result<()> {
    let config = Config::load()?;

    let level = if cli.verbose {
        "debug"
    } else {
        config.log_level.as_str()
    };
    if let Err(e) = init_logging(level, config.log_dir.as_deref()) {
        eprintln!("Warning: logging disabled: {}", e);
    }

    let format = cli.format.unwrap_or(config.output_format);

    match &cli.command {
        Commands::Check { plate } => cmd_check(&config, format, plate).await,

        Commands::Log {
            plate,
            direction,
            image,
            note,
        } => {
            cmd_log(
                &config,
                format,
                plate.clone(),
                *direction,
                image.clone(),
                note.clone(),
            )
            .await
        }

        Commands::Ocr { image } => cmd_ocr(&config, image).await,

        Commands::Register {
            plate,
            owner,
            department,
        } => cmd_register(&config, format, plate, owner, department).await,

        Commands::Unregister { id } => cmd_unregister(&config, id).await,

        Commands::Vehicles => {
            let controller = open_session(&config).await?;
            output_vehicles(format, &controller.registry())
        }

        Commands::Logs { limit } => {
            let controller = open_session(&config).await?;
            output_log(format, &controller.log(), *limit)
        }

        Commands::Report { date } => cmd_report(&config, format, *date).await,

        Commands::Config {
            show,
            set_data_dir,
            set_plate_reader,
            set_store_images,
            set_output,
            set_log_level,
            reset,
        } => cmd_config(
            *show,
            set_data_dir.clone(),
            set_plate_reader.clone(),
            *set_store_images,
            *set_output,
            set_log_level.clone(),
            *reset,
        ),
    }
}

/// Open the collections and load them. Load failures are reported and the
/// session continues with whatever did load.
async fn open_session(config: &Config) -> Result<FileSyncController> {
    let controller = open_controller(config)?;
    let report = controller.load_all().await;
    warn_incomplete(&report);
    Ok(controller)
}

/// Like [`open_session`], for commands that classify plates: a registry
/// that failed to load is an error rather than a warning.
async fn open_classifying_session(config: &Config) -> Result<FileSyncController> {
    let controller = open_controller(config)?;
    let report = controller.load_all().await.require_registry()?;
    warn_incomplete(&report);
    Ok(controller)
}

fn warn_incomplete(report: &LoadReport) {
    if let Some(ref e) = report.registry {
        eprintln!("Warning: could not load vehicle registry: {}", e);
    }
    if let Some(ref e) = report.log {
        eprintln!("Warning: could not load checkpoint log: {}", e);
    }
}

async fn cmd_check(config: &Config, format: OutputFormat, plate: &str) -> Result<()> {
    let controller = open_classifying_session(config).await?;
    let classification = controller.classify(plate);
    output_classification(format, plate, &classification)
}

async fn cmd_log(
    config: &Config,
    format: OutputFormat,
    plate: Option<String>,
    direction: Direction,
    image: Option<PathBuf>,
    note: Option<String>,
) -> Result<()> {
    let image_bytes = match image {
        Some(ref path) => Some(tokio::fs::read(path).await?),
        None => None,
    };

    let plate = match plate {
        Some(plate) => plate,
        None => {
            let bytes = image_bytes.as_deref().ok_or_else(|| {
                Error::Validation("plate number is required (or pass --image to read it)".to_string())
            })?;
            match read_plate(&open_plate_reader(config), bytes).await {
                PlateReading::Recognized(plate) => {
                    eprintln!("Plate read from image: {}", plate);
                    plate
                }
                PlateReading::NotDetected => {
                    return Err(Error::Validation(
                        "no plate detected in image; pass the plate number explicitly".to_string(),
                    ));
                }
                PlateReading::Failed(e) => {
                    eprintln!("Could not read the plate; pass the plate number explicitly.");
                    return Err(e);
                }
            }
        }
    };

    let image_url = match (&image, &image_bytes) {
        (Some(path), Some(bytes)) if config.store_images => {
            Some(image_data_url(bytes, mime_for_path(path)))
        }
        _ => None,
    };

    let controller = open_classifying_session(config).await?;
    let submitted = controller.submit_log_entry(&plate, direction, image_url, note)?;
    debug!(
        "event=log_submitted vehicle_type={}",
        submitted.classification.vehicle_type()
    );
    let entry = submitted.confirmation.await?;
    output_log_entry(format, &entry, &submitted.classification)
}

async fn cmd_ocr(config: &Config, image: &Path) -> Result<()> {
    let reader = open_plate_reader(config);
    if !reader.is_configured() {
        eprintln!(
            "Plate reader is not configured. Set one with: gatelog config --set-plate-reader <COMMAND>"
        );
    }

    let bytes = tokio::fs::read(image).await?;
    match read_plate(&reader, &bytes).await {
        PlateReading::Recognized(plate) => println!("{}", plate),
        PlateReading::NotDetected => println!("No plate detected."),
        PlateReading::Failed(e) => return Err(e),
    }
    Ok(())
}

async fn cmd_register(
    config: &Config,
    format: OutputFormat,
    plate: &str,
    owner: &str,
    department: &str,
) -> Result<()> {
    let controller = open_session(config).await?;
    let vehicle = controller.register_vehicle(plate, owner, department)?.await?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&vehicle)?);
    } else {
        println!("Registered vehicle: {}", vehicle.id);
        println!("  Plate:      {}", vehicle.plate_number);
        println!("  Owner:      {}", vehicle.owner_name);
        if let Some(ref dept) = vehicle.department {
            println!("  Department: {}", dept);
        }
    }
    Ok(())
}

async fn cmd_unregister(config: &Config, id: &str) -> Result<()> {
    let controller = open_session(config).await?;
    let vehicle = controller.registry().into_iter().find(|v| v.id == id);
    controller.unregister_vehicle(id)?.await?;

    match vehicle {
        Some(v) => println!("Removed vehicle {} ({})", v.plate_number, v.owner_name),
        None => println!("Removed vehicle {}", id),
    }
    Ok(())
}

async fn cmd_report(config: &Config, format: OutputFormat, date: Option<NaiveDate>) -> Result<()> {
    let controller = open_session(config).await?;
    let day = date.unwrap_or_else(|| Local::now().date_naive());
    let log = controller.log();

    let summary = summarize_day(&log, day, &Local);
    let entries = entries_for_day(&log, day, &Local);
    output_report(format, &summary, &entries)
}

fn cmd_config(
    show: bool,
    set_data_dir: Option<PathBuf>,
    set_plate_reader: Option<String>,
    set_store_images: Option<bool>,
    set_output: Option<OutputFormat>,
    set_log_level: Option<String>,
    reset: bool,
) -> Result<()> {
    if reset {
        let config = Config::default();
        config.save()?;
        println!("Configuration reset to defaults");
        println!("\n{}", config);
        return Ok(());
    }

    let mut config = Config::load()?;
    let mut modified = false;

    if let Some(dir) = set_data_dir {
        config.data_dir = Some(dir);
        modified = true;
    }

    if let Some(cmd) = set_plate_reader {
        config.plate_reader_command = Some(cmd).filter(|c| !c.trim().is_empty());
        modified = true;
    }

    if let Some(store_images) = set_store_images {
        config.store_images = store_images;
        modified = true;
    }

    if let Some(output_format) = set_output {
        config.output_format = output_format;
        modified = true;
    }

    if let Some(level) = set_log_level {
        config.log_level = level;
        modified = true;
    }

    if modified {
        config.save()?;
        println!("Configuration updated");
    }

    if show || !modified {
        println!("{}", config);
    }

    Ok(())
}

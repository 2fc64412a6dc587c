//! Collaborators opened from configuration

use gatelog_infra::persistence::{JsonFileRemote, LOG_FILE, REGISTRY_FILE};
use gatelog_infra::plate_reader::CommandPlateReader;
use gatelog_types::{Error, LogEntry, RegisteredVehicle, Result};

use crate::config::Config;
use crate::sync::SyncController;

/// Controller over the file-backed collections in the configured data dir
pub type FileSyncController =
    SyncController<JsonFileRemote<RegisteredVehicle>, JsonFileRemote<LogEntry>>;

/// Open the registry and log remotes
pub fn open_remotes(
    config: &Config,
) -> Result<(JsonFileRemote<RegisteredVehicle>, JsonFileRemote<LogEntry>)> {
    let data_dir = config.data_dir().ok_or_else(|| {
        Error::RemoteUnavailable(
            "no data directory configured. Set one with: gatelog config --set-data-dir <DIR>"
                .to_string(),
        )
    })?;
    let registry = JsonFileRemote::open(data_dir.clone(), REGISTRY_FILE)?;
    let log = JsonFileRemote::open(data_dir, LOG_FILE)?;
    Ok((registry, log))
}

/// Open a controller with empty collections; the caller loads them
pub fn open_controller(config: &Config) -> Result<FileSyncController> {
    let (registry, log) = open_remotes(config)?;
    Ok(SyncController::new(registry, log))
}

pub fn open_plate_reader(config: &Config) -> CommandPlateReader {
    CommandPlateReader::new(config.plate_reader_command.clone())
}

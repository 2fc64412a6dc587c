//! Configuration management for gatelog
//!
//! Config stored at: ~/.config/gatelog/config.json

use std::path::PathBuf;

use gatelog_types::{ConfigError, OutputFormat, Result};
use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory backing the registry and log collections
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// External OCR command; the image path is appended as last argument
    #[serde(default)]
    pub plate_reader_command: Option<String>,

    /// Keep the captured image on the log entry
    #[serde(default = "default_true")]
    pub store_images: bool,

    /// Default output format (json, table)
    #[serde(default = "default_output_format")]
    pub output_format: OutputFormat,

    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Write logs to rotating files here instead of stderr
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_output_format() -> OutputFormat {
    OutputFormat::Table
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            plate_reader_command: None,
            store_images: true,
            output_format: default_output_format(),
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NotFound)?
            .join("gatelog");
        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Data directory, falling back to the platform data dir
    pub fn data_dir(&self) -> Option<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Some(dir.clone());
        }
        dirs::data_dir().map(|d| d.join("gatelog"))
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            Self::from_json(&content)
        } else {
            Ok(Config::default())
        }
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()).into())
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError::SaveError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveError(e.to_string()))?;
        Ok(())
    }
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Gatelog Configuration")?;
        writeln!(f, "=====================")?;
        writeln!(f)?;
        writeln!(
            f,
            "Data dir:       {}",
            self.data_dir()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(unavailable)".to_string())
        )?;
        writeln!(
            f,
            "Plate reader:   {}",
            self.plate_reader_command.as_deref().unwrap_or("(not configured)")
        )?;
        writeln!(f, "Store images:   {}", self.store_images)?;
        writeln!(f, "Output format:  {}", self.output_format)?;
        writeln!(f, "Log level:      {}", self.log_level)?;
        writeln!(
            f,
            "Log dir:        {}",
            self.log_dir
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(stderr)".to_string())
        )?;

        if let Ok(path) = Self::config_path() {
            writeln!(f)?;
            writeln!(f, "Config file:    {}", path.display())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatelog_types::Error;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = Config::from_json(r#"{ "data_dir": "/srv/gatelog" }"#).unwrap();
        assert_eq!(config.data_dir(), Some(PathBuf::from("/srv/gatelog")));
        assert!(config.store_images);
        assert_eq!(config.output_format, OutputFormat::Table);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let err = Config::from_json("{ not json").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_roundtrip_through_json() {
        let config = Config {
            plate_reader_command: Some("thai-ocr --json".to_string()),
            output_format: OutputFormat::Json,
            ..Config::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed = Config::from_json(&json).unwrap();
        assert_eq!(parsed.plate_reader_command.as_deref(), Some("thai-ocr --json"));
        assert_eq!(parsed.output_format, OutputFormat::Json);
    }
}

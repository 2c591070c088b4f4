// src/config.rs
//! Configuration management stored as JSON under the user's config directory

use crate::{
    device::GpsSource,
    display::OutputFormat,
    error::{GpsError, Result},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Serial,
    File,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpsConfig {
    pub source_type: SourceType,
    pub serial_port: Option<String>,
    pub serial_baudrate: u32,
    pub device_path: PathBuf,
    pub output: OutputFormat,
}

impl Default for GpsConfig {
    fn default() -> Self {
        Self {
            source_type: SourceType::File,
            serial_port: None,
            serial_baudrate: 9600,
            device_path: PathBuf::from("/dev/ttyAMA0"),
            output: OutputFormat::Text,
        }
    }
}

impl GpsConfig {
    /// Load from a config file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| GpsError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| GpsError::Config(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    /// Save to a config file, creating its directory if needed
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| GpsError::Config(format!("Failed to create config directory: {}", e)))?;
        }

        let contents = serde_json::to_string_pretty(self)?;

        std::fs::write(path, contents)
            .map_err(|e| GpsError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Get the config file path
    pub fn get_config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| GpsError::Config("HOME environment variable not set".to_string()))?;

        Ok(PathBuf::from(home)
            .join(".config")
            .join("gps-fix")
            .join("config.json"))
    }

    /// Update serial port settings
    pub fn update_serial(&mut self, port: String, baudrate: Option<u32>) {
        self.source_type = SourceType::Serial;
        self.serial_port = Some(port);
        if let Some(baudrate) = baudrate {
            self.serial_baudrate = baudrate;
        }
    }

    /// Update device file settings
    pub fn update_file(&mut self, path: PathBuf) {
        self.source_type = SourceType::File;
        self.device_path = path;
    }

    /// Build the source to read from
    pub fn to_source(&self) -> Result<GpsSource> {
        match self.source_type {
            SourceType::Serial => {
                let port = self.serial_port.clone().ok_or_else(|| {
                    GpsError::Config("Serial source selected but no serial port set".to_string())
                })?;
                Ok(GpsSource::Serial {
                    port,
                    baudrate: self.serial_baudrate,
                })
            }
            SourceType::File => Ok(GpsSource::File {
                path: self.device_path.clone(),
            }),
        }
    }
}

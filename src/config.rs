use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{Result, ServiceLogError};

/// Application configuration settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory holding the stored collections
    pub data_dir: PathBuf,

    /// Whether new upcoming services get a reminder
    pub reminders_enabled: bool,

    /// Local hour (0-23) at which reminders fire on the service day
    pub reminder_hour: u32,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".servicelog"));

        Self {
            data_dir,
            reminders_enabled: true,
            reminder_hour: 9,
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "servicelog")
}

impl Config {
    /// Default location of the configuration file.
    pub fn default_path() -> PathBuf {
        project_dirs()
            .map(|dirs| dirs.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("servicelog.json"))
    }

    /// Loads the configuration at `path`, falling back to defaults when the
    /// file does not exist yet.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(
                "No configuration at {}, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let config: Config =
            serde_json::from_str(&contents).map_err(|e| ServiceLogError::ConfigError {
                message: format!("{}: {}", path.display(), e),
            })?;
        config.validate()?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Writes the configuration as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|_| ServiceLogError::DirectoryError {
                path: parent.to_path_buf(),
            })?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!("Saved configuration to {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.reminder_hour > 23 {
            return Err(ServiceLogError::ConfigError {
                message: format!("reminder_hour must be 0-23, got {}", self.reminder_hour),
            });
        }
        Ok(())
    }

    /// Applies a `key=value` setting.
    pub fn set(&mut self, assignment: &str) -> Result<()> {
        let (key, value) = assignment
            .split_once('=')
            .map(|(k, v)| (k.trim(), v.trim()))
            .ok_or_else(|| ServiceLogError::ConfigError {
                message: format!("expected key=value, got '{}'", assignment),
            })?;

        let invalid = || ServiceLogError::ConfigError {
            message: format!("invalid value '{}' for {}", value, key),
        };

        let mut updated = self.clone();
        match key {
            "data_dir" => updated.data_dir = PathBuf::from(value),
            "reminders_enabled" => {
                updated.reminders_enabled = value.parse().map_err(|_| invalid())?
            }
            "reminder_hour" => updated.reminder_hour = value.parse().map_err(|_| invalid())?,
            _ => {
                return Err(ServiceLogError::ConfigError {
                    message: format!("unknown setting '{}'", key),
                })
            }
        }
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}

//! JSON config file adapter.
//!
//! Implements [`ConfigPort`] over a single JSON file. Missing fields take
//! their defaults, so a config file only needs the values it overrides.
//! Every load and save is validated; an out-of-range field is an error,
//! never silently clamped.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::KilnConfig;

pub struct JsonConfigFile {
    path: PathBuf,
}

impl JsonConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigPort for JsonConfigFile {
    fn load(&self) -> Result<KilnConfig, ConfigError> {
        let text = fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConfigError::NotFound,
            _ => {
                warn!("Config: read {} failed: {e}", self.path.display());
                ConfigError::IoError
            }
        })?;
        let config: KilnConfig = serde_json::from_str(&text).map_err(|e| {
            warn!("Config: {} does not parse: {e}", self.path.display());
            ConfigError::Corrupted
        })?;
        config.validate()?;
        info!("Config: loaded {}", self.path.display());
        Ok(config)
    }

    fn save(&self, config: &KilnConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let text = serde_json::to_string_pretty(config).map_err(|_| ConfigError::Corrupted)?;
        fs::write(&self.path, text).map_err(|e| {
            warn!("Config: write {} failed: {e}", self.path.display());
            ConfigError::IoError
        })?;
        info!("Config: saved {}", self.path.display());
        Ok(())
    }
}

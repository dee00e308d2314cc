//! JSON-file-backed configuration adapter.
//!
//! Implements [`ConfigPort`] with a single settings document on disk.
//! Values are range-checked before persisting; a missing file yields
//! defaults, an unparseable one is reported as corrupted rather than
//! silently replaced.

use std::fs;
use std::path::PathBuf;

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::SystemConfig;

pub struct FileConfig {
    path: PathBuf,
}

impl FileConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

fn validate_config(cfg: &SystemConfig) -> Result<(), ConfigError> {
    if !(cfg.influent_threshold.is_finite() && cfg.influent_threshold >= 0.0) {
        return Err(ConfigError::ValidationFailed("influent_threshold must be >= 0"));
    }
    if !(cfg.effluent_threshold.is_finite() && cfg.effluent_threshold >= 0.0) {
        return Err(ConfigError::ValidationFailed("effluent_threshold must be >= 0"));
    }
    for minutes in [
        cfg.react_minutes,
        cfg.wait_minutes,
        cfg.dose_nutrients_minutes,
        cfg.wait_after_dose_minutes,
        cfg.cycle_time_max_minutes,
    ] {
        if !(minutes.is_finite() && minutes >= 0.0) {
            return Err(ConfigError::ValidationFailed("phase minutes must be >= 0"));
        }
    }
    if cfg.heating.off_temp < cfg.heating.on_temp {
        return Err(ConfigError::ValidationFailed(
            "heating off_temp must be >= on_temp",
        ));
    }
    if !(100..=60_000).contains(&cfg.tick_interval_ms) {
        return Err(ConfigError::ValidationFailed(
            "tick_interval_ms must be 100–60000",
        ));
    }
    if !(1..=3600).contains(&cfg.telemetry_interval_secs) {
        return Err(ConfigError::ValidationFailed(
            "telemetry_interval_secs must be 1–3600",
        ));
    }
    Ok(())
}

impl ConfigPort for FileConfig {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        if !self.path.exists() {
            info!("no settings file at {}, using defaults", self.path.display());
            return Ok(SystemConfig::default());
        }
        let text = fs::read_to_string(&self.path).map_err(|e| {
            warn!("settings read failed: {e}");
            ConfigError::IoError
        })?;
        let cfg: SystemConfig =
            serde_json::from_str(&text).map_err(|_| ConfigError::Corrupted)?;
        validate_config(&cfg)?;
        info!("settings loaded from {}", self.path.display());
        Ok(cfg)
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        validate_config(config)?;
        let text = serde_json::to_string_pretty(config).map_err(|_| ConfigError::IoError)?;
        fs::write(&self.path, text).map_err(|e| {
            warn!("settings write failed: {e}");
            ConfigError::IoError
        })?;
        Ok(())
    }
}

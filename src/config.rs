//! Application configuration.
//!
//! One TOML file selects the input source (a serial port plus the
//! protocol it speaks, or an OS controller slot) and the poll periods.
//! Missing or corrupt configuration degrades to defaults rather than
//! preventing startup; a starter file is written on first run so there
//! is something to edit.

use std::fs;
use std::path::PathBuf;

use color_eyre::eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::decode::Protocol;

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum InputSource {
    /// Sniffing microcontroller on a serial port.
    Serial {
        port: String,
        protocol: Protocol,
        #[serde(default)]
        printer_mode: bool,
    },
    /// OS game-controller API.
    XInput {
        #[serde(default)]
        slot: usize,
    },
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct AppConfig {
    // Scalar fields first so TOML serialization emits them before the
    // [input] table.
    #[serde(default = "default_monitor_poll_interval_ms")]
    pub monitor_poll_interval_ms: u64,

    #[serde(default = "default_xinput_poll_interval_ms")]
    pub xinput_poll_interval_ms: u64,

    pub input: InputSource,
}

fn default_monitor_poll_interval_ms() -> u64 {
    1
}

fn default_xinput_poll_interval_ms() -> u64 {
    30
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            monitor_poll_interval_ms: default_monitor_poll_interval_ms(),
            xinput_poll_interval_ms: default_xinput_poll_interval_ms(),
            input: InputSource::Serial {
                port: "/dev/ttyACM0".to_owned(),
                protocol: Protocol::GameCube,
                printer_mode: false,
            },
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| eyre!("No config directory on this platform"))?;
    Ok(base.join("retroprobe").join("config.toml"))
}

/// Write a starter configuration if none exists yet.
pub fn ensure_default_config() -> Result<()> {
    let path = config_path()?;
    if path.exists() {
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let contents = toml::to_string_pretty(&AppConfig::default())?;
    fs::write(&path, contents)?;
    info!("Wrote default configuration to {}", path.display());
    Ok(())
}

pub fn parse_config(contents: &str) -> Result<AppConfig> {
    Ok(toml::from_str(contents)?)
}

/// Load the configuration, falling back to defaults on any failure.
pub fn load_or_default() -> AppConfig {
    let path = match config_path() {
        Ok(path) => path,
        Err(e) => {
            warn!("Unable to resolve config path, using defaults: {}", e);
            return AppConfig::default();
        }
    };

    match fs::read_to_string(&path) {
        Ok(contents) => match parse_config(&contents) {
            Ok(config) => config,
            Err(e) => {
                warn!("Invalid config at {}, using defaults: {}", path.display(), e);
                AppConfig::default()
            }
        },
        Err(e) => {
            warn!("Unable to read {}, using defaults: {}", path.display(), e);
            AppConfig::default()
        }
    }
}

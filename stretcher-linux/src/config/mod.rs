use std::{
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};

use log::warn;
use serde::Deserialize;
use stretcher::config::DeviceConfig;
use thiserror::Error;
use tokio::{fs::read_to_string, io};
use tracing::level_filters::LevelFilter;

use crate::serial::{baud_rate_speed, DEFAULT_BAUD_RATE};

/// Serial device read when none is configured
pub const DEFAULT_PORT: &str = "/dev/ttyUSB1";

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub loglevel: LogLevel,
    #[serde(default = "default_port")]
    pub port: PathBuf,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    #[serde(default = "default_tick_rate")]
    pub tick_rate_hz: u32,
    #[serde(default = "default_min_bus_frequency")]
    pub min_bus_frequency_hz: u32,
}

fn default_port() -> PathBuf {
    PathBuf::from(DEFAULT_PORT)
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

fn default_tick_rate() -> u32 {
    DeviceConfig::default().tick_rate_hz
}

fn default_min_bus_frequency() -> u32 {
    DeviceConfig::default().min_bus_frequency_hz
}

impl Default for Config {
    fn default() -> Self {
        Self {
            loglevel: LogLevel::default(),
            port: default_port(),
            baud_rate: default_baud_rate(),
            tick_rate_hz: default_tick_rate(),
            min_bus_frequency_hz: default_min_bus_frequency(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

impl Config {
    /// Parse config from file
    pub async fn from_file(file: impl AsRef<Path>) -> Result<Config, ConfigError> {
        let meta = tokio::fs::metadata(&file).await?;
        let perm = meta.permissions();

        if perm.mode() as libc::mode_t & libc::S_IWOTH != 0 {
            warn!("Unrestricted config file permissions: Others can write.");
        }

        let contents = read_to_string(file).await?;
        Self::parse(&contents)
    }

    /// Parse config from the contents of a toml file
    pub fn parse(contents: &str) -> Result<Config, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Configuration of the device core the telemetry comes from
    pub fn device_config(&self) -> DeviceConfig {
        DeviceConfig {
            tick_rate_hz: self.tick_rate_hz,
            min_bus_frequency_hz: self.min_bus_frequency_hz,
        }
    }

    /// Check that the config is reasonable
    pub fn check(&self) -> bool {
        let mut ok = true;

        if baud_rate_speed(self.baud_rate).is_none() {
            warn!("Unsupported baud rate {} is configured.", self.baud_rate);
            ok = false;
        }

        if self.tick_rate_hz == 0 {
            warn!("A tick rate of 0 Hz is configured.");
            ok = false;
        }

        if self.min_bus_frequency_hz == 0 {
            warn!("A minimum bus frequency of 0 Hz is configured.");
            ok = false;
        }

        if self.min_bus_frequency_hz > self.tick_rate_hz / 2 {
            warn!("The minimum bus frequency cannot be resolved at the configured tick rate.");
            ok = false;
        }

        ok
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("io error while reading config: {0}")]
    Io(#[from] io::Error),
    #[error("config toml parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

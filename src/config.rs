use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use log::warn;
use serde::{Deserialize, Serialize};

pub const MIN_UPDATE_INTERVAL_SECS: f64 = 0.5;
pub const MAX_UPDATE_INTERVAL_SECS: f64 = 10.0;

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub apps: AppsConfig,
    #[serde(default)]
    pub actions: ActionsConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MonitoringConfig {
    #[serde(default = "default_update_interval_secs")]
    pub update_interval_secs: f64,
    #[serde(default)]
    pub show_background_apps: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct AppsConfig {
    /// Bundle identifiers hidden from the list.
    #[serde(default)]
    pub ignored: BTreeSet<String>,
    /// Background bundle identifiers shown alongside regular apps.
    #[serde(default)]
    pub included: BTreeSet<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ActionsConfig {
    #[serde(default)]
    pub default_action: DefaultAction,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NotificationsConfig {
    #[serde(default = "default_notifications_enabled")]
    pub enabled: bool,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum DefaultAction {
    #[default]
    GracefulQuit,
    ForceQuit,
}

impl DefaultAction {
    pub fn is_force(self) -> bool {
        self == DefaultAction::ForceQuit
    }
}

// Defaults for MonitoringConfig
fn default_update_interval_secs() -> f64 {
    2.0
}

// Defaults for NotificationsConfig
fn default_notifications_enabled() -> bool {
    true
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            update_interval_secs: default_update_interval_secs(),
            show_background_apps: false,
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: default_notifications_enabled(),
        }
    }
}

pub fn clamp_update_interval(secs: f64) -> f64 {
    secs.clamp(MIN_UPDATE_INTERVAL_SECS, MAX_UPDATE_INTERVAL_SECS)
}

pub fn get_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".easyquit.json")
}

pub fn load_or_create_config(path: &Path) -> Result<Config> {
    if path.exists() {
        load_and_validate_config(path)
    } else {
        let config = Config::default();
        save_config(path, &config)?;
        Ok(config)
    }
}

pub fn load_and_validate_config(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).context("failed to read config file")?;
    let config =
        serde_json::from_str::<Config>(&content).context("failed to parse config file")?;
    validate_config(config)
}

pub fn validate_config(mut config: Config) -> Result<Config> {
    let interval = config.monitoring.update_interval_secs;
    if !interval.is_finite() {
        bail!("update_interval_secs must be a finite number of seconds");
    }
    let clamped = clamp_update_interval(interval);
    if clamped != interval {
        warn!(
            "update_interval_secs {} out of range, using {}",
            interval, clamped
        );
        config.monitoring.update_interval_secs = clamped;
    }
    Ok(config)
}

pub fn save_config(path: &Path, config: &Config) -> Result<()> {
    let content = serde_json::to_string_pretty(config).context("failed to serialize config")?;
    fs::write(path, content).context("failed to write config file")?;
    Ok(())
}

//! Persistent settings with change notification.
//!
//! The store is the only writer of durable configuration. Every setter
//! writes the file first and only then commits and notifies, so a failed
//! write leaves the in-memory state untouched.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use anyhow::{Result, bail};
use crossbeam_channel::{Receiver, Sender};
use log::debug;

use crate::config::{
    Config, DefaultAction, clamp_update_interval, load_and_validate_config,
    load_or_create_config, save_config,
};
use crate::events::{AppEvent, EventPublisher};

/// A single observable setting that changed.
#[derive(Clone, Debug, PartialEq)]
pub enum SettingsChange {
    UpdateInterval(f64),
    IgnoredApps(BTreeSet<String>),
    IncludedApps(BTreeSet<String>),
    ShowBackgroundApps(bool),
    DefaultAction(DefaultAction),
    NotificationsEnabled(bool),
}

/// Current value of every observable setting, in a fixed order.
pub fn snapshot(config: &Config) -> Vec<SettingsChange> {
    vec![
        SettingsChange::UpdateInterval(config.monitoring.update_interval_secs),
        SettingsChange::IgnoredApps(config.apps.ignored.clone()),
        SettingsChange::IncludedApps(config.apps.included.clone()),
        SettingsChange::ShowBackgroundApps(config.monitoring.show_background_apps),
        SettingsChange::DefaultAction(config.actions.default_action),
        SettingsChange::NotificationsEnabled(config.notifications.enabled),
    ]
}

/// Settings that differ between `old` and `new`.
pub fn diff(old: &Config, new: &Config) -> Vec<SettingsChange> {
    snapshot(new)
        .into_iter()
        .zip(snapshot(old))
        .filter(|(new, old)| new != old)
        .map(|(new, _)| new)
        .collect()
}

pub struct SettingsStore {
    path: Option<PathBuf>,
    config: RwLock<Config>,
    subscribers: Mutex<Vec<Sender<SettingsChange>>>,
    events: Option<Arc<EventPublisher>>,
}

impl SettingsStore {
    /// Opens the settings file at `path`, creating it with defaults.
    pub fn open(path: PathBuf, events: Option<Arc<EventPublisher>>) -> Result<Self> {
        let config = load_or_create_config(&path)?;
        Ok(Self {
            path: Some(path),
            config: RwLock::new(config),
            subscribers: Mutex::new(Vec::new()),
            events,
        })
    }

    /// A store that never touches the disk.
    pub fn in_memory(config: Config) -> Self {
        Self {
            path: None,
            config: RwLock::new(config),
            subscribers: Mutex::new(Vec::new()),
            events: None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn config(&self) -> Config {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn update_interval(&self) -> f64 {
        self.config().monitoring.update_interval_secs
    }

    pub fn ignored_apps(&self) -> BTreeSet<String> {
        self.config().apps.ignored
    }

    pub fn included_apps(&self) -> BTreeSet<String> {
        self.config().apps.included
    }

    pub fn notifications_enabled(&self) -> bool {
        self.config().notifications.enabled
    }

    /// Returns a channel that first yields the current value of every
    /// setting and then each later change, in order.
    pub fn subscribe(&self) -> Receiver<SettingsChange> {
        let (tx, rx) = crossbeam_channel::unbounded();
        // Holding the config lock keeps writers out until the snapshot is queued.
        let config = self.config.read().unwrap_or_else(PoisonError::into_inner);
        for change in snapshot(&config) {
            let _ = tx.send(change);
        }
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    pub fn set_update_interval(&self, secs: f64) -> Result<()> {
        if !secs.is_finite() {
            bail!("update interval must be a finite number of seconds, got {}", secs);
        }
        let secs = clamp_update_interval(secs);
        self.update(|config| config.monitoring.update_interval_secs = secs)
    }

    pub fn set_ignored_apps(&self, ignored: BTreeSet<String>) -> Result<()> {
        self.update(|config| config.apps.ignored = ignored)
    }

    pub fn add_ignored_app(&self, bundle_id: &str) -> Result<()> {
        self.update(|config| {
            config.apps.ignored.insert(bundle_id.to_string());
        })
    }

    pub fn remove_ignored_app(&self, bundle_id: &str) -> Result<()> {
        self.update(|config| {
            config.apps.ignored.remove(bundle_id);
        })
    }

    pub fn set_included_apps(&self, included: BTreeSet<String>) -> Result<()> {
        self.update(|config| config.apps.included = included)
    }

    pub fn add_included_app(&self, bundle_id: &str) -> Result<()> {
        self.update(|config| {
            config.apps.included.insert(bundle_id.to_string());
        })
    }

    pub fn remove_included_app(&self, bundle_id: &str) -> Result<()> {
        self.update(|config| {
            config.apps.included.remove(bundle_id);
        })
    }

    pub fn set_show_background_apps(&self, show: bool) -> Result<()> {
        self.update(|config| config.monitoring.show_background_apps = show)
    }

    pub fn set_default_action(&self, action: DefaultAction) -> Result<()> {
        self.update(|config| config.actions.default_action = action)
    }

    pub fn set_notifications_enabled(&self, enabled: bool) -> Result<()> {
        self.update(|config| config.notifications.enabled = enabled)
    }

    /// Restores interval, default action and the ignore list. Included
    /// apps and notification preferences are kept.
    pub fn reset_to_defaults(&self) -> Result<()> {
        let defaults = Config::default();
        self.update(|config| {
            config.monitoring.update_interval_secs = defaults.monitoring.update_interval_secs;
            config.actions.default_action = defaults.actions.default_action;
            config.apps.ignored.clear();
        })
    }

    /// Re-reads the settings file and announces whatever changed on disk.
    pub fn reload(&self) -> Result<()> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        let fresh = load_and_validate_config(path)?;
        let mut config = self.config.write().unwrap_or_else(PoisonError::into_inner);
        let changes = diff(&config, &fresh);
        *config = fresh;
        self.notify(changes);
        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut Config)) -> Result<()> {
        let mut config = self.config.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = config.clone();
        apply(&mut next);
        let changes = diff(&config, &next);
        if changes.is_empty() {
            return Ok(());
        }
        if let Some(path) = self.path.as_deref() {
            save_config(path, &next)?;
        }
        *config = next;
        self.notify(changes);
        Ok(())
    }

    // Called with the config write lock held so subscribers observe
    // changes in commit order.
    fn notify(&self, changes: Vec<SettingsChange>) {
        if changes.is_empty() {
            return;
        }
        debug!("Settings changed: {:?}", changes);
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for change in changes {
            subscribers.retain(|tx| tx.send(change.clone()).is_ok());
        }
        drop(subscribers);
        if let Some(events) = &self.events {
            events.publish(AppEvent::SettingsChanged);
        }
    }
}

//! Event-loop side of the application list.
//!
//! The [`Reconciler`] owns the published list and the single-flight guard.
//! It is driven only from the event loop: OS work goes to the worker through
//! the [`Scheduler`] and comes back as [`UserEvent`]s, so the guard is a
//! plain `bool`.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, trace, warn};

use crate::config::DefaultAction;
use crate::events::{AppEvent, EventPublisher};
use crate::model::{
    ActionKind, ActionReport, ProcessRecord, RefreshRequest, UserEvent, WorkerCommand,
};
use crate::pipeline;
use crate::scheduler::Scheduler;
use crate::settings::{SettingsChange, SettingsStore};
use crate::source::ProcessSource;

/// Wait before re-reading the process table after a quit.
pub const QUIT_REFRESH_DELAY: Duration = Duration::from_millis(500);
/// Wait before re-reading the process table after a restart.
pub const RESTART_REFRESH_DELAY: Duration = Duration::from_secs(1);

pub struct Reconciler {
    source: Arc<dyn ProcessSource>,
    scheduler: Box<dyn Scheduler>,
    settings: Arc<SettingsStore>,
    events: Arc<EventPublisher>,
    protected: Arc<BTreeSet<String>>,
    apps: Vec<ProcessRecord>,
    ignored_apps: BTreeSet<String>,
    included_apps: BTreeSet<String>,
    show_background_apps: bool,
    update_interval_secs: f64,
    default_action: DefaultAction,
    search_text: String,
    refreshing: bool,
}

impl Reconciler {
    pub fn new(
        source: Arc<dyn ProcessSource>,
        scheduler: Box<dyn Scheduler>,
        settings: Arc<SettingsStore>,
        events: Arc<EventPublisher>,
        protected: BTreeSet<String>,
    ) -> Self {
        let config = settings.config();
        Self {
            source,
            scheduler,
            settings,
            events,
            protected: Arc::new(protected),
            apps: Vec::new(),
            ignored_apps: config.apps.ignored,
            included_apps: config.apps.included,
            show_background_apps: config.monitoring.show_background_apps,
            update_interval_secs: config.monitoring.update_interval_secs,
            default_action: config.actions.default_action,
            search_text: String::new(),
            refreshing: false,
        }
    }

    /// The published list, sorted and deduplicated.
    pub fn apps(&self) -> &[ProcessRecord] {
        &self.apps
    }

    /// The published list minus ignored apps, narrowed by the search text.
    pub fn filtered_apps(&self) -> Vec<&ProcessRecord> {
        pipeline::filter_apps(&self.apps, &self.ignored_apps, &self.search_text)
    }

    pub fn find(&self, pid: i32) -> Option<&ProcessRecord> {
        self.apps.iter().find(|record| record.pid == pid)
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.search_text = text.into();
    }

    pub fn ignored_apps(&self) -> &BTreeSet<String> {
        &self.ignored_apps
    }

    pub fn default_action(&self) -> DefaultAction {
        self.default_action
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    /// Starts a background refresh unless one is already in flight, in
    /// which case the request is dropped.
    pub fn refresh_apps(&mut self) {
        if self.refreshing {
            trace!("Refresh already in flight, dropping request");
            return;
        }
        self.refreshing = true;
        let request = self.refresh_request();
        if !self
            .scheduler
            .run_in_background(WorkerCommand::Refresh(request))
        {
            // Nothing will report back; let the next tick try again.
            self.refreshing = false;
        }
    }

    /// Refreshes on the calling thread. Used once at startup so the first
    /// view is populated before the event loop runs.
    pub fn refresh_now(&mut self) {
        if self.refreshing {
            return;
        }
        self.refreshing = true;
        let apps = pipeline::collect(self.source.as_ref(), &self.refresh_request());
        self.publish(apps);
    }

    fn refresh_request(&self) -> RefreshRequest {
        RefreshRequest {
            included_apps: self.included_apps.clone(),
            protected: Arc::clone(&self.protected),
            show_background_apps: self.show_background_apps,
        }
    }

    fn publish(&mut self, apps: Vec<ProcessRecord>) {
        debug!("Publishing {} apps", apps.len());
        self.apps = apps;
        self.refreshing = false;
    }

    pub fn quit_app(&mut self, record: &ProcessRecord, force: bool) {
        self.scheduler.run_in_background(WorkerCommand::Terminate {
            record: record.clone(),
            force,
        });
    }

    pub fn perform_default_action(&mut self, record: &ProcessRecord) {
        self.quit_app(record, self.default_action.is_force());
    }

    pub fn restart_app(&mut self, record: &ProcessRecord) {
        self.scheduler
            .run_in_background(WorkerCommand::Relaunch(record.clone()));
    }

    pub fn show_in_finder(&mut self, record: &ProcessRecord) {
        self.scheduler
            .run_in_background(WorkerCommand::Reveal(record.clone()));
    }

    /// Hides the app by bundle identifier. Records without one cannot be
    /// ignored.
    pub fn ignore_app(&mut self, record: &ProcessRecord) {
        let Some(bundle_id) = record.bundle_id.as_ref() else {
            return;
        };
        if self.ignored_apps.insert(bundle_id.clone()) {
            info!("Ignoring {}", bundle_id);
            self.persist_ignored_apps();
        }
    }

    pub fn unignore_all(&mut self) {
        if self.ignored_apps.is_empty() {
            return;
        }
        self.ignored_apps.clear();
        self.persist_ignored_apps();
    }

    fn persist_ignored_apps(&self) {
        if let Err(err) = self.settings.set_ignored_apps(self.ignored_apps.clone()) {
            warn!("Failed to save ignored apps: {:#}", err);
        }
    }

    /// Feeds an event from the worker, the timer or the settings store.
    /// Returns false for events the reconciler does not handle.
    pub fn handle_event(&mut self, event: UserEvent) -> bool {
        match event {
            UserEvent::Tick | UserEvent::RefreshRequested => self.refresh_apps(),
            UserEvent::AppsRefreshed(apps) => self.publish(apps),
            UserEvent::ActionFinished(report) => self.action_finished(report),
            UserEvent::SettingsChanged(change) => self.apply_setting(change),
            UserEvent::SettingsReloadFailed(_) | UserEvent::MenuAction(_) => return false,
        }
        true
    }

    fn action_finished(&mut self, report: ActionReport) {
        if report.accepted {
            if let Some(bundle_id) = report.record.bundle_id {
                self.events.publish(match report.kind {
                    ActionKind::Quit { .. } => AppEvent::ApplicationQuit(bundle_id),
                    ActionKind::Restart => AppEvent::ApplicationRestarted(bundle_id),
                });
            }
        }
        let delay = match report.kind {
            ActionKind::Quit { .. } => QUIT_REFRESH_DELAY,
            ActionKind::Restart => RESTART_REFRESH_DELAY,
        };
        // The OS catches up eventually; look again whatever the outcome.
        self.scheduler
            .post_after(delay, UserEvent::RefreshRequested);
    }

    fn apply_setting(&mut self, change: SettingsChange) {
        match change {
            SettingsChange::UpdateInterval(secs) => {
                if !secs.is_finite() {
                    warn!("Ignoring non-finite refresh interval {}", secs);
                } else if secs != self.update_interval_secs {
                    debug!("Refresh interval now {}s", secs);
                    self.update_interval_secs = secs;
                    self.scheduler.set_interval(Duration::from_secs_f64(secs));
                }
            }
            SettingsChange::IgnoredApps(ignored) => self.ignored_apps = ignored,
            SettingsChange::IncludedApps(included) => {
                if included != self.included_apps {
                    self.included_apps = included;
                    self.refresh_apps();
                }
            }
            SettingsChange::ShowBackgroundApps(show) => {
                if show != self.show_background_apps {
                    self.show_background_apps = show;
                    self.refresh_apps();
                }
            }
            SettingsChange::DefaultAction(action) => self.default_action = action,
            SettingsChange::NotificationsEnabled(_) => {}
        }
    }
}

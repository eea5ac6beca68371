use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossbeam_channel::Receiver;
use log::{debug, info, warn};
use notify::{Event as NotifyEvent, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::config::get_config_path;
use crate::events::EventPublisher;
use crate::model::{Feedback, FeedbackSeverity, MenuAction, ProcessRecord, UserEvent};
use crate::notify::spawn_notifier;
use crate::platform::{NativeProcessSource, protected_bundle_identifiers};
use crate::reconciler::Reconciler;
use crate::scheduler::{EventSink, RuntimeScheduler, Ticker};
use crate::settings::{SettingsChange, SettingsStore};
use crate::source::ProcessSource;
use crate::utils::open_in_editor;
use crate::worker::spawn_worker;

const CONFIG_DEBOUNCE_DURATION: Duration = Duration::from_millis(500);

pub fn run() -> Result<()> {
    let events = Arc::new(EventPublisher::new());
    let settings = Arc::new(
        SettingsStore::open(get_config_path(), Some(Arc::clone(&events)))
            .context("failed to load configuration")?,
    );
    let _notifier = spawn_notifier(events.subscribe(), Arc::clone(&settings));

    let core = Core {
        source: Arc::new(NativeProcessSource::new()),
        settings,
        events,
        protected: protected_bundle_identifiers(),
    };

    #[cfg(any(target_os = "macos", target_os = "windows"))]
    {
        crate::ui::tray::run(core)
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        run_headless(core)
    }
}

/// Long-lived services shared by every shell.
pub struct Core {
    pub source: Arc<dyn ProcessSource>,
    pub settings: Arc<SettingsStore>,
    pub events: Arc<EventPublisher>,
    pub protected: BTreeSet<String>,
}

/// What the front end should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// The visible list or the feedback line changed.
    Changed,
    Exit,
}

/// Event-loop state common to the tray and headless front ends.
pub struct Shell {
    reconciler: Reconciler,
    settings: Arc<SettingsStore>,
    last_feedback: Option<Feedback>,
}

impl Shell {
    /// Spawns the worker, the refresh timer and the settings plumbing, all
    /// reporting to `sink`, and populates the list once before returning.
    pub fn start<S: EventSink>(core: Core, sink: S) -> Self {
        let Core {
            source,
            settings,
            events,
            protected,
        } = core;

        let (worker_tx, worker_rx) = crossbeam_channel::unbounded();
        let _worker = spawn_worker(Arc::clone(&source), worker_rx, sink.clone());

        let interval = Duration::from_secs_f64(settings.update_interval());
        let ticker = Ticker::spawn(sink.clone(), interval);
        let _forwarder = spawn_settings_forwarder(settings.subscribe(), sink.clone());
        if settings.path().is_some() {
            let _watcher = spawn_config_watcher(sink.clone(), Arc::clone(&settings));
        }

        let scheduler = RuntimeScheduler::new(worker_tx, sink, ticker);
        let mut reconciler = Reconciler::new(
            source,
            Box::new(scheduler),
            Arc::clone(&settings),
            events,
            protected,
        );
        reconciler.refresh_now();
        info!("Tracking {} apps", reconciler.apps().len());

        Self {
            reconciler,
            settings,
            last_feedback: None,
        }
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn last_feedback(&self) -> Option<&Feedback> {
        self.last_feedback.as_ref()
    }

    pub fn visible_apps(&self) -> Vec<&ProcessRecord> {
        self.reconciler.filtered_apps()
    }

    pub fn handle(&mut self, event: UserEvent) -> Flow {
        match event {
            UserEvent::MenuAction(action) => self.handle_menu(action),
            UserEvent::SettingsReloadFailed(message) => {
                self.last_feedback = Some(Feedback::error(message));
                Flow::Changed
            }
            UserEvent::ActionFinished(report) => {
                self.last_feedback = Some(report.feedback());
                self.reconciler
                    .handle_event(UserEvent::ActionFinished(report));
                Flow::Changed
            }
            UserEvent::AppsRefreshed(apps) => {
                let before = fingerprint(&self.visible_apps());
                self.reconciler.handle_event(UserEvent::AppsRefreshed(apps));
                if before == fingerprint(&self.visible_apps()) {
                    Flow::Continue
                } else {
                    Flow::Changed
                }
            }
            UserEvent::SettingsChanged(change) => {
                let visible = matches!(
                    change,
                    SettingsChange::IgnoredApps(_) | SettingsChange::DefaultAction(_)
                );
                self.reconciler
                    .handle_event(UserEvent::SettingsChanged(change));
                if visible { Flow::Changed } else { Flow::Continue }
            }
            other => {
                self.reconciler.handle_event(other);
                Flow::Continue
            }
        }
    }

    fn handle_menu(&mut self, action: MenuAction) -> Flow {
        let pid = match action {
            MenuAction::DefaultAction { pid }
            | MenuAction::Quit { pid }
            | MenuAction::ForceQuit { pid }
            | MenuAction::Restart { pid }
            | MenuAction::Reveal { pid }
            | MenuAction::Ignore { pid } => pid,
            MenuAction::UnignoreAll => {
                self.reconciler.unignore_all();
                return Flow::Changed;
            }
            MenuAction::Refresh => {
                self.reconciler.refresh_apps();
                return Flow::Continue;
            }
            MenuAction::EditSettings => {
                return self.edit_settings();
            }
            MenuAction::Exit => return Flow::Exit,
        };

        let Some(record) = self.reconciler.find(pid).cloned() else {
            debug!("Menu action for vanished PID {}", pid);
            self.last_feedback = Some(Feedback::warning(format!(
                "PID {} is no longer running.",
                pid
            )));
            return Flow::Changed;
        };

        match action {
            MenuAction::DefaultAction { .. } => self.reconciler.perform_default_action(&record),
            MenuAction::Quit { .. } => self.reconciler.quit_app(&record, false),
            MenuAction::ForceQuit { .. } => self.reconciler.quit_app(&record, true),
            MenuAction::Restart { .. } => self.reconciler.restart_app(&record),
            MenuAction::Reveal { .. } => self.reconciler.show_in_finder(&record),
            MenuAction::Ignore { .. } => {
                self.reconciler.ignore_app(&record);
                return Flow::Changed;
            }
            _ => {}
        }
        Flow::Continue
    }

    fn edit_settings(&mut self) -> Flow {
        let Some(path) = self.settings.path() else {
            return Flow::Continue;
        };
        match open_in_editor(path) {
            Ok(()) => Flow::Continue,
            Err(err) => {
                warn!("{:#}", err);
                self.last_feedback = Some(Feedback::error(format!("{:#}", err)));
                Flow::Changed
            }
        }
    }

    pub fn needs_attention(&self) -> bool {
        self.last_feedback
            .as_ref()
            .is_some_and(|feedback| feedback.severity != FeedbackSeverity::Info)
    }
}

fn fingerprint(apps: &[&ProcessRecord]) -> Vec<(i32, String)> {
    apps.iter()
        .map(|record| (record.pid, record.name.clone()))
        .collect()
}

/// Relays settings changes into the event loop.
fn spawn_settings_forwarder<S: EventSink>(
    changes: Receiver<SettingsChange>,
    sink: S,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for change in changes.iter() {
            if !sink.post(UserEvent::SettingsChanged(change)) {
                break;
            }
        }
    })
}

fn spawn_config_watcher<S: EventSink>(
    sink: S,
    settings: Arc<SettingsStore>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let Some(config_path) = settings.path().map(|path| path.to_path_buf()) else {
            return;
        };
        let (tx, rx) = std::sync::mpsc::channel();

        let mut watcher: RecommendedWatcher = match Watcher::new(
            move |res: Result<NotifyEvent, notify::Error>| {
                let _ = tx.send(res);
            },
            notify::Config::default(),
        ) {
            Ok(w) => w,
            Err(e) => {
                log::error!("Failed to create config watcher: {}", e);
                return;
            }
        };

        if let Err(e) = watcher.watch(&config_path, RecursiveMode::NonRecursive) {
            log::error!("Failed to watch config file: {}", e);
            return;
        }

        debug!("Config watcher started for {:?}", config_path);

        let mut last_reload = Instant::now() - CONFIG_DEBOUNCE_DURATION;

        for result in rx {
            match result {
                Ok(event) => {
                    if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                        continue;
                    }
                    // Editors may write in several operations.
                    if last_reload.elapsed() < CONFIG_DEBOUNCE_DURATION {
                        continue;
                    }
                    last_reload = Instant::now();

                    debug!("Config file changed, attempting reload");
                    if let Err(e) = settings.reload() {
                        let msg = format!("Settings reload failed: {:#}", e);
                        warn!("{}", msg);
                        if !sink.post(UserEvent::SettingsReloadFailed(msg)) {
                            break;
                        }
                    }
                }
                Err(e) => {
                    log::error!("Config watch error: {}", e);
                }
            }
        }
    })
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn run_headless(core: Core) -> Result<()> {
    let (tx, rx) = crossbeam_channel::unbounded();
    let mut shell = Shell::start(core, tx);
    log_apps(&shell);

    for event in rx.iter() {
        match shell.handle(event) {
            Flow::Exit => break,
            Flow::Changed => log_apps(&shell),
            Flow::Continue => {}
        }
    }
    Ok(())
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn log_apps(shell: &Shell) {
    let apps = shell.visible_apps();
    info!("{} running apps", apps.len());
    for app in &apps {
        info!(
            "  {} (PID {}){}",
            app.name,
            app.pid,
            app.bundle_id
                .as_deref()
                .map(|id| format!(" [{}]", id))
                .unwrap_or_default()
        );
    }
    if let Some(feedback) = shell.last_feedback() {
        info!("Last action: {}", feedback.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model::{ActionKind, ActivationPolicy};
    use crate::source::memory::{MemoryProcessSource, SourceCall};

    fn safari() -> ProcessRecord {
        ProcessRecord::new(11, "Safari", ActivationPolicy::Regular)
            .with_bundle_id("com.apple.Safari")
            .with_launch_location("/Applications/Safari.app")
    }

    fn notes() -> ProcessRecord {
        ProcessRecord::new(12, "Notes", ActivationPolicy::Regular)
            .with_bundle_id("com.apple.Notes")
    }

    struct Fixture {
        source: Arc<MemoryProcessSource>,
        settings: Arc<SettingsStore>,
        events: Receiver<UserEvent>,
        shell: Shell,
    }

    fn start(records: Vec<ProcessRecord>) -> Fixture {
        let source = Arc::new(MemoryProcessSource::new(records));
        let mut config = Config::default();
        // Keep the ticker out of the way.
        config.monitoring.update_interval_secs = 10.0;
        let settings = Arc::new(SettingsStore::in_memory(config));
        let (tx, rx) = crossbeam_channel::unbounded();
        let shell = Shell::start(
            Core {
                source: source.clone(),
                settings: Arc::clone(&settings),
                events: Arc::new(EventPublisher::new()),
                protected: BTreeSet::new(),
            },
            tx,
        );
        Fixture {
            source,
            settings,
            events: rx,
            shell,
        }
    }

    /// Pumps events into the shell until `done` accepts one.
    fn pump_until(fixture: &mut Fixture, done: impl Fn(&UserEvent) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            let Ok(event) = fixture.events.recv_timeout(Duration::from_millis(100)) else {
                continue;
            };
            let stop = done(&event);
            fixture.shell.handle(event);
            if stop {
                return;
            }
        }
        panic!("expected event never arrived");
    }

    #[test]
    fn start_populates_the_list() {
        let fixture = start(vec![safari(), notes()]);
        let names: Vec<&str> = fixture
            .shell
            .visible_apps()
            .iter()
            .map(|record| record.name.as_str())
            .collect();
        assert_eq!(names, vec!["Notes", "Safari"]);
    }

    #[test]
    fn quit_from_menu_reports_feedback() {
        let mut fixture = start(vec![safari(), notes()]);
        let flow = fixture
            .shell
            .handle(UserEvent::MenuAction(MenuAction::Quit { pid: 11 }));
        assert_eq!(flow, Flow::Continue);

        pump_until(&mut fixture, |event| {
            matches!(event, UserEvent::ActionFinished(report) if report.kind == ActionKind::Quit { force: false })
        });
        let feedback = fixture.shell.last_feedback().unwrap();
        assert_eq!(feedback.message, "Quit Safari.");
        assert!(!fixture.shell.needs_attention());

        // The delayed refresh drops the terminated app.
        pump_until(&mut fixture, |event| matches!(event, UserEvent::AppsRefreshed(_)));
        let pids: Vec<i32> = fixture.shell.visible_apps().iter().map(|r| r.pid).collect();
        assert_eq!(pids, vec![12]);
        assert!(fixture
            .source
            .calls()
            .contains(&SourceCall::Terminate { pid: 11, force: false }));
    }

    #[test]
    fn menu_action_for_unknown_pid_warns() {
        let mut fixture = start(vec![safari()]);
        let flow = fixture
            .shell
            .handle(UserEvent::MenuAction(MenuAction::ForceQuit { pid: 999 }));
        assert_eq!(flow, Flow::Changed);
        assert!(fixture.shell.needs_attention());
        assert_eq!(
            fixture.shell.last_feedback().unwrap().message,
            "PID 999 is no longer running."
        );
    }

    #[test]
    fn ignore_hides_and_persists() {
        let mut fixture = start(vec![safari(), notes()]);
        let flow = fixture
            .shell
            .handle(UserEvent::MenuAction(MenuAction::Ignore { pid: 12 }));
        assert_eq!(flow, Flow::Changed);
        assert!(fixture.settings.ignored_apps().contains("com.apple.Notes"));
        let pids: Vec<i32> = fixture.shell.visible_apps().iter().map(|r| r.pid).collect();
        assert_eq!(pids, vec![11]);

        fixture
            .shell
            .handle(UserEvent::MenuAction(MenuAction::UnignoreAll));
        assert!(fixture.settings.ignored_apps().is_empty());
        assert_eq!(fixture.shell.visible_apps().len(), 2);
    }

    #[test]
    fn reload_failure_is_surfaced() {
        let mut fixture = start(vec![]);
        let flow = fixture.shell.handle(UserEvent::SettingsReloadFailed(
            "Settings reload failed: bad json".to_string(),
        ));
        assert_eq!(flow, Flow::Changed);
        assert!(fixture.shell.needs_attention());
    }

    #[test]
    fn unchanged_refresh_does_not_redraw() {
        let mut fixture = start(vec![safari()]);
        let flow = fixture
            .shell
            .handle(UserEvent::AppsRefreshed(vec![safari()]));
        assert_eq!(flow, Flow::Continue);
        let flow = fixture
            .shell
            .handle(UserEvent::AppsRefreshed(vec![safari(), notes()]));
        assert_eq!(flow, Flow::Changed);
    }

    #[test]
    fn exit_stops_the_loop() {
        let mut fixture = start(vec![]);
        assert_eq!(
            fixture.shell.handle(UserEvent::MenuAction(MenuAction::Exit)),
            Flow::Exit
        );
        assert!(fixture.source.query_count() >= 1);
    }
}

use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::settings::SettingsChange;

/// How an application presents itself to the user.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ActivationPolicy {
    /// Has a visible presence (dock icon, main window).
    Regular,
    /// Agent or helper without a regular presence.
    Background,
    /// Not allowed to present any UI.
    Prohibited,
}

/// Opaque icon reference. The shell resolves it to an image; the
/// reconciler only carries it along.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct IconHandle(PathBuf);

impl IconHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

/// One running process, as seen by a single poll.
///
/// Records are rebuilt on every poll and never updated in place. Two
/// records are the same process when their `pid` matches.
#[derive(Clone, Debug)]
pub struct ProcessRecord {
    pub pid: i32,
    pub name: String,
    pub bundle_id: Option<String>,
    pub icon: Option<IconHandle>,
    pub activation_policy: ActivationPolicy,
    /// Bundle or executable the process was started from.
    pub launch_location: Option<PathBuf>,
}

impl ProcessRecord {
    pub fn new(pid: i32, name: impl Into<String>, activation_policy: ActivationPolicy) -> Self {
        Self {
            pid,
            name: name.into(),
            bundle_id: None,
            icon: None,
            activation_policy,
            launch_location: None,
        }
    }

    pub fn with_bundle_id(mut self, bundle_id: impl Into<String>) -> Self {
        self.bundle_id = Some(bundle_id.into());
        self
    }

    pub fn with_launch_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.launch_location = Some(location.into());
        self
    }

    pub fn with_icon(mut self, icon: IconHandle) -> Self {
        self.icon = Some(icon);
        self
    }

    pub fn is_regular(&self) -> bool {
        self.activation_policy == ActivationPolicy::Regular
    }
}

impl PartialEq for ProcessRecord {
    fn eq(&self, other: &Self) -> bool {
        self.pid == other.pid
    }
}

impl Eq for ProcessRecord {}

impl Hash for ProcessRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pid.hash(state);
    }
}

/// Configuration captured when a refresh starts. A refresh never re-reads
/// settings while it is in flight.
#[derive(Clone, Debug)]
pub struct RefreshRequest {
    pub included_apps: BTreeSet<String>,
    pub protected: Arc<BTreeSet<String>>,
    pub show_background_apps: bool,
}

/// Events delivered to the event-loop context.
#[derive(Clone, Debug)]
pub enum UserEvent {
    Tick,
    RefreshRequested,
    AppsRefreshed(Vec<ProcessRecord>),
    ActionFinished(ActionReport),
    SettingsChanged(SettingsChange),
    SettingsReloadFailed(String),
    MenuAction(MenuAction),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MenuAction {
    /// Quit with the configured default action.
    DefaultAction { pid: i32 },
    Quit { pid: i32 },
    ForceQuit { pid: i32 },
    Restart { pid: i32 },
    Reveal { pid: i32 },
    Ignore { pid: i32 },
    UnignoreAll,
    Refresh,
    EditSettings,
    Exit,
}

/// Work executed off the event loop.
#[derive(Clone, Debug)]
pub enum WorkerCommand {
    Refresh(RefreshRequest),
    Terminate { record: ProcessRecord, force: bool },
    Relaunch(ProcessRecord),
    Reveal(ProcessRecord),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ActionKind {
    Quit { force: bool },
    Restart,
}

/// Outcome of a terminate or relaunch request. `accepted` only says the OS
/// took the request, not that the process is gone.
#[derive(Clone, Debug)]
pub struct ActionReport {
    pub kind: ActionKind,
    pub record: ProcessRecord,
    pub accepted: bool,
}

impl ActionReport {
    pub fn feedback(&self) -> Feedback {
        let name = &self.record.name;
        match (self.kind, self.accepted) {
            (ActionKind::Quit { force: false }, true) => Feedback::info(format!("Quit {}.", name)),
            (ActionKind::Quit { force: true }, true) => {
                Feedback::info(format!("Force quit {}.", name))
            }
            (ActionKind::Restart, true) => Feedback::info(format!("Restarting {}.", name)),
            (ActionKind::Quit { .. }, false) => Feedback::warning(format!(
                "{} (PID {}) did not accept the quit request.",
                name, self.record.pid
            )),
            (ActionKind::Restart, false) => Feedback::warning(format!(
                "Unable to restart {} (PID {}).",
                name, self.record.pid
            )),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Feedback {
    pub message: String,
    pub severity: FeedbackSeverity,
}

impl Feedback {
    pub fn new(message: String, severity: FeedbackSeverity) -> Self {
        Self { message, severity }
    }

    pub fn info(message: String) -> Self {
        Self::new(message, FeedbackSeverity::Info)
    }

    pub fn warning(message: String) -> Self {
        Self::new(message, FeedbackSeverity::Warning)
    }

    pub fn error(message: String) -> Self {
        Self::new(message, FeedbackSeverity::Error)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FeedbackSeverity {
    Info,
    Warning,
    Error,
}

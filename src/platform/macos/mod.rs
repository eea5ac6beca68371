//! macOS process source backed by `NSWorkspace`

use crate::model::ProcessRecord;
use crate::source::ProcessSource;

pub mod kill;
pub mod launch;
pub mod notify;
pub mod workspace;

#[derive(Debug, Default)]
pub struct WorkspaceProcessSource;

impl WorkspaceProcessSource {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessSource for WorkspaceProcessSource {
    fn query_all(&self) -> Vec<ProcessRecord> {
        workspace::running_applications()
    }

    fn terminate(&self, record: &ProcessRecord, force: bool) -> bool {
        kill::terminate_application(record.pid, force)
    }

    fn relaunch(&self, record: &ProcessRecord) -> bool {
        let Some(bundle) = record.launch_location.clone() else {
            return false;
        };
        if !kill::terminate_application(record.pid, false) {
            return false;
        }
        launch::open_after(bundle, launch::RELAUNCH_DELAY);
        true
    }

    fn reveal_in_file_browser(&self, record: &ProcessRecord) {
        if let Some(bundle) = record.launch_location.as_deref() {
            launch::reveal_in_finder(bundle);
        }
    }
}

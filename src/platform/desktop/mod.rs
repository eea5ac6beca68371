//! Process source backed by the `sysinfo` process table (Linux, Windows and
//! other non-macOS targets).
//!
//! There is no notion of an application bundle here: the executable's file
//! stem stands in for the bundle identifier and the executable itself is
//! the launch location.

use std::sync::{Mutex, PoisonError};

use sysinfo::System;

use crate::model::ProcessRecord;
use crate::source::ProcessSource;

pub mod launch;
pub mod notify;
pub mod table;

pub struct DesktopProcessSource {
    system: Mutex<System>,
}

impl DesktopProcessSource {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }

    #[cfg(unix)]
    fn send_termination(&self, pid: i32, force: bool) -> bool {
        crate::platform::signal::request_termination(pid, force)
    }

    #[cfg(not(unix))]
    fn send_termination(&self, pid: i32, force: bool) -> bool {
        use sysinfo::{Pid, Signal};

        let Ok(raw) = u32::try_from(pid) else {
            return false;
        };
        let system = self.system.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(process) = system.process(Pid::from_u32(raw)) else {
            return false;
        };
        if force {
            process.kill()
        } else {
            // Graceful termination is not available everywhere.
            process
                .kill_with(Signal::Term)
                .unwrap_or_else(|| process.kill())
        }
    }
}

impl Default for DesktopProcessSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessSource for DesktopProcessSource {
    fn query_all(&self) -> Vec<ProcessRecord> {
        let mut system = self.system.lock().unwrap_or_else(PoisonError::into_inner);
        table::snapshot(&mut system)
    }

    fn terminate(&self, record: &ProcessRecord, force: bool) -> bool {
        self.send_termination(record.pid, force)
    }

    fn relaunch(&self, record: &ProcessRecord) -> bool {
        let Some(location) = record.launch_location.clone() else {
            return false;
        };
        if !self.send_termination(record.pid, false) {
            return false;
        }
        launch::launch_after(location, launch::RELAUNCH_DELAY);
        true
    }

    fn reveal_in_file_browser(&self, record: &ProcessRecord) {
        if let Some(location) = record.launch_location.as_deref() {
            launch::reveal(location);
        }
    }
}

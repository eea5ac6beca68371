//! Relaunching executables and revealing them in the file browser

use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread;
use std::time::Duration;

use log::{debug, warn};

/// Pause between the termination request and the new launch.
pub const RELAUNCH_DELAY: Duration = Duration::from_millis(500);

/// Starts `location` again after `delay` on a detached thread. Failures are
/// only logged.
pub fn launch_after(location: PathBuf, delay: Duration) {
    thread::spawn(move || {
        thread::sleep(delay);
        match Command::new(&location).spawn() {
            Ok(mut child) => {
                debug!("Relaunched {} as PID {}", location.display(), child.id());
                // Reap the child so it does not linger once it exits.
                let _ = child.wait();
            }
            Err(err) => warn!("Failed to relaunch {}: {}", location.display(), err),
        }
    });
}

#[cfg(target_os = "windows")]
pub fn reveal(location: &Path) {
    let result = Command::new("explorer")
        .arg(format!("/select,{}", location.display()))
        .spawn();
    if let Err(err) = result {
        warn!("Failed to open Explorer for {}: {}", location.display(), err);
    }
}

#[cfg(not(target_os = "windows"))]
pub fn reveal(location: &Path) {
    // xdg-open cannot select a file; open its directory instead.
    let target = location.parent().unwrap_or(location);
    if let Err(err) = Command::new("xdg-open").arg(target).spawn() {
        warn!("Failed to open file browser for {}: {}", target.display(), err);
    }
}

//! Relaunching bundles and revealing them in Finder via `open`

use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread;
use std::time::Duration;

use log::{debug, warn};

/// Pause between the termination request and reopening the bundle.
pub const RELAUNCH_DELAY: Duration = Duration::from_millis(500);

pub fn open_after(bundle: PathBuf, delay: Duration) {
    thread::spawn(move || {
        thread::sleep(delay);
        match Command::new("open").arg(&bundle).status() {
            Ok(status) if status.success() => debug!("Reopened {}", bundle.display()),
            Ok(status) => warn!("open {} exited with {}", bundle.display(), status),
            Err(err) => warn!("Failed to reopen {}: {}", bundle.display(), err),
        }
    });
}

pub fn reveal_in_finder(bundle: &Path) {
    if let Err(err) = Command::new("open").arg("-R").arg(bundle).spawn() {
        warn!("Failed to reveal {} in Finder: {}", bundle.display(), err);
    }
}

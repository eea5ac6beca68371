//! macOS termination requests through `NSRunningApplication`

use log::{debug, warn};
use objc2_app_kit::NSRunningApplication;

use crate::platform::signal;

/// Asks the application owning `pid` to quit (`terminate`) or kills it
/// outright (`forceTerminate`). Processes the workspace no longer tracks
/// fall back to a POSIX signal.
pub fn terminate_application(pid: i32, force: bool) -> bool {
    if pid <= 0 {
        return false;
    }

    let result = std::panic::catch_unwind(|| unsafe {
        NSRunningApplication::runningApplicationWithProcessIdentifier(pid).map(|app| {
            if force {
                app.forceTerminate()
            } else {
                app.terminate()
            }
        })
    });

    match result {
        Ok(Some(accepted)) => {
            if !accepted {
                debug!("PID {} declined the termination request", pid);
            }
            accepted
        }
        Ok(None) => signal::request_termination(pid, force),
        Err(_) => {
            warn!("NSRunningApplication lookup panicked for PID {}", pid);
            signal::request_termination(pid, force)
        }
    }
}

//! macOS notifications using terminal-notifier

use std::path::Path;
use std::process::Command;

use crate::utils::find_command;

const BUNDLE_ID: &str = "com.easyquit.app";

pub fn notify(title: &str, body: &str) {
    // terminal-notifier only: osascript would interpret app names as script.
    let cmd = find_command("terminal-notifier");
    if !Path::new(cmd).exists() && Command::new(cmd).arg("-help").output().is_err() {
        log::debug!("terminal-notifier unavailable, skipping: {}", title);
        return;
    }

    let _ = Command::new(cmd)
        .args(["-title", title, "-message", body, "-sender", BUNDLE_ID])
        .spawn();
}

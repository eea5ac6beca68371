//! Desktop notifications through notify-send where available

#[cfg(not(target_os = "windows"))]
pub fn notify(title: &str, body: &str) {
    use std::process::Command;

    let result = Command::new("notify-send")
        .args(["--app-name", "EasyQuit", title, body])
        .spawn();
    if let Err(err) = result {
        log::debug!("notify-send unavailable ({}), skipping: {}", err, title);
    }
}

#[cfg(target_os = "windows")]
pub fn notify(title: &str, body: &str) {
    // The tray tooltip already carries action feedback on Windows.
    log::info!("{}: {}", title, body);
}

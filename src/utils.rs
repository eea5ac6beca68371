use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};

#[cfg(target_os = "macos")]
use std::sync::OnceLock;

/// Find an executable in the Homebrew prefixes, falling back to PATH.
/// Results are cached for efficiency.
#[cfg(target_os = "macos")]
pub fn find_command(name: &str) -> &'static str {
    match name {
        "terminal-notifier" => {
            static NOTIFIER: OnceLock<&'static str> = OnceLock::new();
            NOTIFIER.get_or_init(|| find_in_paths(name, HOMEBREW_PATHS))
        }
        _ => find_in_paths(name, HOMEBREW_PATHS),
    }
}

#[cfg(target_os = "macos")]
const HOMEBREW_PATHS: &[&str] = &[
    "/opt/homebrew/bin", // Apple Silicon
    "/usr/local/bin",    // Intel Mac
];

#[cfg(target_os = "macos")]
fn find_in_paths(name: &str, prefix_paths: &[&str]) -> &'static str {
    for prefix in prefix_paths {
        let full_path = format!("{}/{}", prefix, name);
        if Path::new(&full_path).exists() {
            // Leaked once per command name.
            return Box::leak(full_path.into_boxed_str());
        }
    }
    Box::leak(name.to_string().into_boxed_str())
}

/// Shortens `label` to at most `max_chars` characters, ending in "..."
/// when something was cut.
pub fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_string();
    }
    let kept: String = label.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Opens the settings file with the platform's default text editor.
pub fn open_in_editor(path: &Path) -> Result<()> {
    editor_command(path)
        .spawn()
        .with_context(|| format!("failed to open {} in an editor", path.display()))?;
    Ok(())
}

#[cfg(target_os = "macos")]
fn editor_command(path: &Path) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg("-t").arg(path);
    cmd
}

#[cfg(target_os = "windows")]
fn editor_command(path: &Path) -> Command {
    let mut cmd = Command::new("notepad");
    cmd.arg(path);
    cmd
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn editor_command(path: &Path) -> Command {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(path);
    cmd
}

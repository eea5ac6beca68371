//! Platform abstraction layer
//!
//! This module provides platform-specific implementations for:
//! - Enumerating running applications
//! - Terminating, relaunching and revealing them
//! - The bundle identifiers that must never be offered for quitting

use std::collections::BTreeSet;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(not(target_os = "macos"))]
pub mod desktop;

#[cfg(unix)]
pub mod signal;

#[cfg(target_os = "macos")]
pub use macos::WorkspaceProcessSource as NativeProcessSource;

#[cfg(not(target_os = "macos"))]
pub use desktop::DesktopProcessSource as NativeProcessSource;

#[cfg(target_os = "macos")]
pub use macos::notify::notify as show_notification;

#[cfg(not(target_os = "macos"))]
pub use desktop::notify::notify as show_notification;

#[cfg(target_os = "macos")]
const PROTECTED_BUNDLE_IDENTIFIERS: &[&str] = &[
    "com.apple.finder",
    "com.apple.dock",
    "com.apple.systemuiserver",
    "com.apple.loginwindow",
    "com.apple.WindowManager",
    "com.apple.Spotlight",
];

#[cfg(target_os = "windows")]
const PROTECTED_BUNDLE_IDENTIFIERS: &[&str] = &[
    "explorer",
    "dwm",
    "csrss",
    "winlogon",
    "sihost",
    "ShellExperienceHost",
    "StartMenuExperienceHost",
];

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const PROTECTED_BUNDLE_IDENTIFIERS: &[&str] = &[
    "systemd",
    "gnome-shell",
    "plasmashell",
    "kwin_wayland",
    "kwin_x11",
    "Xorg",
    "Xwayland",
];

/// Identifiers hidden regardless of user preference.
pub fn protected_bundle_identifiers() -> BTreeSet<String> {
    PROTECTED_BUNDLE_IDENTIFIERS
        .iter()
        .map(|id| id.to_string())
        .collect()
}

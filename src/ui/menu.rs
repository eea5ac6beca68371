use crate::config::DefaultAction;
use crate::model::{Feedback, FeedbackSeverity, MenuAction, ProcessRecord};
use crate::utils::truncate_label;

const MAX_TOOLTIP_ENTRIES: usize = 5;
const MAX_LABEL_CHARS: usize = 40;

const MENU_ID_REFRESH: &str = "refresh";
const MENU_ID_UNIGNORE_ALL: &str = "unignore_all";
const MENU_ID_EDIT_SETTINGS: &str = "edit_settings";
const MENU_ID_EXIT: &str = "exit";
#[cfg_attr(not(any(target_os = "macos", target_os = "windows")), allow(dead_code))]
const MENU_ID_EMPTY: &str = "empty";
const MENU_ID_DEFAULT_PREFIX: &str = "default_";
const MENU_ID_FORCE_QUIT_PREFIX: &str = "force_quit_";
const MENU_ID_QUIT_PREFIX: &str = "quit_";
const MENU_ID_RESTART_PREFIX: &str = "restart_";
const MENU_ID_REVEAL_PREFIX: &str = "reveal_";
const MENU_ID_IGNORE_PREFIX: &str = "ignore_";
#[cfg_attr(not(any(target_os = "macos", target_os = "windows")), allow(dead_code))]
const MENU_ID_APP_PREFIX: &str = "app_";

#[cfg(target_os = "macos")]
const REVEAL_LABEL: &str = "Show in Finder";
#[cfg(target_os = "windows")]
const REVEAL_LABEL: &str = "Show in Explorer";
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
#[allow(dead_code)]
const REVEAL_LABEL: &str = "Show in File Browser";

pub fn app_menu_id(prefix: &str, pid: i32) -> String {
    format!("{}{}", prefix, pid)
}

pub fn parse_menu_action(raw: &str) -> Option<MenuAction> {
    match raw {
        MENU_ID_REFRESH => return Some(MenuAction::Refresh),
        MENU_ID_UNIGNORE_ALL => return Some(MenuAction::UnignoreAll),
        MENU_ID_EDIT_SETTINGS => return Some(MenuAction::EditSettings),
        MENU_ID_EXIT => return Some(MenuAction::Exit),
        _ => {}
    }

    let targeted: [(&str, fn(i32) -> MenuAction); 6] = [
        (MENU_ID_DEFAULT_PREFIX, |pid| MenuAction::DefaultAction { pid }),
        (MENU_ID_FORCE_QUIT_PREFIX, |pid| MenuAction::ForceQuit { pid }),
        (MENU_ID_QUIT_PREFIX, |pid| MenuAction::Quit { pid }),
        (MENU_ID_RESTART_PREFIX, |pid| MenuAction::Restart { pid }),
        (MENU_ID_REVEAL_PREFIX, |pid| MenuAction::Reveal { pid }),
        (MENU_ID_IGNORE_PREFIX, |pid| MenuAction::Ignore { pid }),
    ];
    targeted.iter().find_map(|(prefix, action)| {
        let pid = raw.strip_prefix(prefix)?.parse::<i32>().ok()?;
        (pid > 0).then(|| action(pid))
    })
}

/// Submenu title for one application.
pub fn app_label(record: &ProcessRecord) -> String {
    let name = if record.name.is_empty() {
        "Unknown"
    } else {
        record.name.as_str()
    };
    truncate_label(name, MAX_LABEL_CHARS)
}

pub fn quit_label(force: bool) -> &'static str {
    if force { "Force Quit" } else { "Quit" }
}

pub fn default_action_label(action: DefaultAction) -> String {
    format!("{} (default)", quit_label(action.is_force()))
}

pub fn unignore_label(ignored_count: usize) -> String {
    if ignored_count == 0 {
        "Unignore All".to_string()
    } else {
        format!("Unignore All ({})", ignored_count)
    }
}

pub fn build_tooltip(apps: &[&ProcessRecord], feedback: Option<&Feedback>) -> String {
    let mut lines = Vec::new();
    if apps.is_empty() {
        lines.push("No running apps.".to_string());
    } else {
        lines.push(format!("Running apps: {}", apps.len()));
        for app in apps.iter().take(MAX_TOOLTIP_ENTRIES) {
            lines.push(format!("{} (PID {})", app_label(app), app.pid));
        }
        if apps.len() > MAX_TOOLTIP_ENTRIES {
            lines.push(format!("…and {} more", apps.len() - MAX_TOOLTIP_ENTRIES));
        }
    }

    if let Some(feedback) = feedback {
        let prefix = match feedback.severity {
            FeedbackSeverity::Info => "",
            FeedbackSeverity::Warning => "⚠️ ",
            FeedbackSeverity::Error => "⛔ ",
        };
        lines.push(format!("Last action: {}{}", prefix, feedback.message));
    }

    lines.join("\n")
}

#[cfg(any(target_os = "macos", target_os = "windows"))]
pub use tray::build_menu;

#[cfg(any(target_os = "macos", target_os = "windows"))]
mod tray {
    use anyhow::Result;
    use tray_icon::menu::{Menu, MenuItem, PredefinedMenuItem, Submenu};

    use super::*;

    pub fn build_menu(
        apps: &[&ProcessRecord],
        ignored_count: usize,
        default_action: DefaultAction,
    ) -> Result<Menu> {
        let menu = Menu::new();

        if apps.is_empty() {
            let item = MenuItem::with_id(MENU_ID_EMPTY, "No running apps", false, None);
            menu.append(&item)?;
        } else {
            for app in apps {
                menu.append(&app_submenu(app, default_action)?)?;
            }
        }

        menu.append(&PredefinedMenuItem::separator())?;
        menu.append(&MenuItem::with_id(MENU_ID_REFRESH, "Refresh", true, None))?;
        menu.append(&MenuItem::with_id(
            MENU_ID_UNIGNORE_ALL,
            unignore_label(ignored_count),
            ignored_count > 0,
            None,
        ))?;
        menu.append(&MenuItem::with_id(
            MENU_ID_EDIT_SETTINGS,
            "Edit Settings...",
            true,
            None,
        ))?;
        menu.append(&PredefinedMenuItem::separator())?;
        menu.append(&MenuItem::with_id(MENU_ID_EXIT, "Exit", true, None))?;
        Ok(menu)
    }

    fn app_submenu(app: &ProcessRecord, default_action: DefaultAction) -> Result<Submenu> {
        let pid = app.pid;
        let submenu = Submenu::with_id(app_menu_id(MENU_ID_APP_PREFIX, pid), app_label(app), true);

        // The default action comes first; the other quit flavour follows.
        let alternate_force = !default_action.is_force();
        let alternate_prefix = if alternate_force {
            MENU_ID_FORCE_QUIT_PREFIX
        } else {
            MENU_ID_QUIT_PREFIX
        };
        submenu.append(&MenuItem::with_id(
            app_menu_id(MENU_ID_DEFAULT_PREFIX, pid),
            default_action_label(default_action),
            true,
            None,
        ))?;
        submenu.append(&MenuItem::with_id(
            app_menu_id(alternate_prefix, pid),
            quit_label(alternate_force),
            true,
            None,
        ))?;
        submenu.append(&PredefinedMenuItem::separator())?;
        submenu.append(&MenuItem::with_id(
            app_menu_id(MENU_ID_RESTART_PREFIX, pid),
            "Restart",
            app.launch_location.is_some(),
            None,
        ))?;
        submenu.append(&MenuItem::with_id(
            app_menu_id(MENU_ID_REVEAL_PREFIX, pid),
            REVEAL_LABEL,
            app.launch_location.is_some(),
            None,
        ))?;
        submenu.append(&PredefinedMenuItem::separator())?;
        submenu.append(&MenuItem::with_id(
            app_menu_id(MENU_ID_IGNORE_PREFIX, pid),
            "Ignore",
            app.bundle_id.is_some(),
            None,
        ))?;
        Ok(submenu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ActivationPolicy;

    #[test]
    fn parse_simple_actions() {
        assert_eq!(parse_menu_action("refresh"), Some(MenuAction::Refresh));
        assert_eq!(parse_menu_action("unignore_all"), Some(MenuAction::UnignoreAll));
        assert_eq!(parse_menu_action("edit_settings"), Some(MenuAction::EditSettings));
        assert_eq!(parse_menu_action("exit"), Some(MenuAction::Exit));
    }

    #[test]
    fn parse_targeted_actions() {
        assert_eq!(
            parse_menu_action("default_42"),
            Some(MenuAction::DefaultAction { pid: 42 })
        );
        assert_eq!(parse_menu_action("quit_42"), Some(MenuAction::Quit { pid: 42 }));
        assert_eq!(
            parse_menu_action("force_quit_42"),
            Some(MenuAction::ForceQuit { pid: 42 })
        );
        assert_eq!(parse_menu_action("restart_7"), Some(MenuAction::Restart { pid: 7 }));
        assert_eq!(parse_menu_action("reveal_7"), Some(MenuAction::Reveal { pid: 7 }));
        assert_eq!(parse_menu_action("ignore_7"), Some(MenuAction::Ignore { pid: 7 }));
    }

    #[test]
    fn parse_rejects_malformed_ids() {
        assert_eq!(parse_menu_action("empty"), None);
        assert_eq!(parse_menu_action("app_42"), None);
        assert_eq!(parse_menu_action("quit_"), None);
        assert_eq!(parse_menu_action("quit_abc"), None);
        assert_eq!(parse_menu_action("quit_0"), None);
        assert_eq!(parse_menu_action("quit_-1"), None);
        assert_eq!(parse_menu_action(""), None);
    }

    #[test]
    fn ids_round_trip_through_parse() {
        assert_eq!(
            parse_menu_action(&app_menu_id(MENU_ID_FORCE_QUIT_PREFIX, 99)),
            Some(MenuAction::ForceQuit { pid: 99 })
        );
    }

    #[test]
    fn labels() {
        assert_eq!(quit_label(true), "Force Quit");
        assert_eq!(default_action_label(DefaultAction::GracefulQuit), "Quit (default)");
        assert_eq!(unignore_label(0), "Unignore All");
        assert_eq!(unignore_label(3), "Unignore All (3)");
        let unnamed = ProcessRecord::new(5, "", ActivationPolicy::Regular);
        assert_eq!(app_label(&unnamed), "Unknown");
    }

    #[test]
    fn tooltip_lists_apps_and_feedback() {
        let records: Vec<ProcessRecord> = (1..=7)
            .map(|pid| ProcessRecord::new(pid, format!("App {}", pid), ActivationPolicy::Regular))
            .collect();
        let apps: Vec<&ProcessRecord> = records.iter().collect();
        let feedback = Feedback::warning("Unable to restart App 1 (PID 1).".to_string());

        let tooltip = build_tooltip(&apps, Some(&feedback));
        let lines: Vec<&str> = tooltip.lines().collect();
        assert_eq!(lines[0], "Running apps: 7");
        assert_eq!(lines[1], "App 1 (PID 1)");
        assert_eq!(lines[6], "…and 2 more");
        assert_eq!(lines[7], "Last action: ⚠️ Unable to restart App 1 (PID 1).");
    }

    #[test]
    fn tooltip_for_empty_list() {
        assert_eq!(build_tooltip(&[], None), "No running apps.");
    }
}

//! Desktop notifications for quit and restart events.

use std::sync::Arc;
use std::thread;

use crossbeam_channel::Receiver;

use crate::events::AppEvent;
use crate::platform::show_notification;
use crate::settings::SettingsStore;

/// Shows a notification for each application event while notifications
/// are enabled. Exits when the publisher goes away.
pub fn spawn_notifier(
    events: Receiver<AppEvent>,
    settings: Arc<SettingsStore>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for event in events.iter() {
            if !settings.notifications_enabled() {
                continue;
            }
            if let Some((title, body)) = describe(&event) {
                show_notification(&title, &body);
            }
        }
    })
}

pub fn describe(event: &AppEvent) -> Option<(String, String)> {
    match event {
        AppEvent::ApplicationQuit(bundle_id) => {
            Some(("Application Quit".to_string(), bundle_id.clone()))
        }
        AppEvent::ApplicationRestarted(bundle_id) => {
            Some(("Application Restarted".to_string(), bundle_id.clone()))
        }
        AppEvent::SettingsChanged => None,
    }
}

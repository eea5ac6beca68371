//! Enumeration of `NSWorkspace.runningApplications`

use std::path::PathBuf;

use log::error;
use objc2_app_kit::{NSApplicationActivationPolicy, NSRunningApplication, NSWorkspace};

use crate::model::{ActivationPolicy, IconHandle, ProcessRecord};

/// Every running application known to the workspace, ordered by pid.
/// An Objective-C failure yields an empty list.
pub fn running_applications() -> Vec<ProcessRecord> {
    let result = std::panic::catch_unwind(|| unsafe {
        let workspace = NSWorkspace::sharedWorkspace();
        workspace
            .runningApplications()
            .iter()
            .map(|app| to_record(&app))
            .collect::<Vec<_>>()
    });

    match result {
        Ok(mut records) => {
            records.sort_by_key(|record| record.pid);
            records
        }
        Err(_) => {
            error!("NSWorkspace enumeration panicked");
            Vec::new()
        }
    }
}

fn to_record(app: &NSRunningApplication) -> ProcessRecord {
    unsafe {
        let bundle_path: Option<PathBuf> = app
            .bundleURL()
            .and_then(|url| url.path())
            .map(|path| PathBuf::from(path.to_string()));

        ProcessRecord {
            pid: app.processIdentifier(),
            name: app
                .localizedName()
                .map(|name| name.to_string())
                .unwrap_or_else(|| "Unknown".to_string()),
            bundle_id: app.bundleIdentifier().map(|id| id.to_string()),
            icon: bundle_path.clone().map(IconHandle::new),
            activation_policy: policy_from(app.activationPolicy()),
            launch_location: bundle_path,
        }
    }
}

fn policy_from(policy: NSApplicationActivationPolicy) -> ActivationPolicy {
    if policy == NSApplicationActivationPolicy::Regular {
        ActivationPolicy::Regular
    } else if policy == NSApplicationActivationPolicy::Accessory {
        ActivationPolicy::Background
    } else {
        ActivationPolicy::Prohibited
    }
}

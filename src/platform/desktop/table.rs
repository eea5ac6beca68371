use std::path::Path;

use sysinfo::{Process, ProcessRefreshKind, ProcessesToUpdate, System, Uid, UpdateKind};

use crate::model::{ActivationPolicy, ProcessRecord};

/// Refreshes `system` and converts every process into a record, ordered by
/// pid.
pub fn snapshot(system: &mut System) -> Vec<ProcessRecord> {
    // Drop exited processes so a quit app disappears on the next poll.
    system.refresh_processes_specifics(
        ProcessesToUpdate::All,
        true,
        ProcessRefreshKind::new()
            .with_exe(UpdateKind::OnlyIfNotSet)
            .with_user(UpdateKind::OnlyIfNotSet),
    );

    let owner: Option<Uid> = sysinfo::get_current_pid()
        .ok()
        .and_then(|pid| system.process(pid))
        .and_then(|process| process.user_id())
        .cloned();

    let mut records: Vec<ProcessRecord> = system
        .processes()
        .values()
        .map(|process| {
            let parent_exe = process
                .parent()
                .and_then(|pid| system.process(pid))
                .and_then(executable);
            let owned = match (owner.as_ref(), process.user_id()) {
                (Some(owner), Some(uid)) => owner == uid,
                _ => false,
            };
            let policy = classify(executable(process), parent_exe, owned);
            to_record(process, policy)
        })
        .collect();

    records.sort_by_key(|record| record.pid);
    records
}

fn executable(process: &Process) -> Option<&Path> {
    process.exe().filter(|path| !path.as_os_str().is_empty())
}

/// Without an executable there is nothing to relaunch or reveal. A process
/// is regular when the current user owns it and it is not a child of
/// another instance of the same executable (renderers, helpers).
pub fn classify(exe: Option<&Path>, parent_exe: Option<&Path>, owned_by_user: bool) -> ActivationPolicy {
    let Some(exe) = exe else {
        return ActivationPolicy::Prohibited;
    };
    if owned_by_user && parent_exe != Some(exe) {
        ActivationPolicy::Regular
    } else {
        ActivationPolicy::Background
    }
}

/// Identifier used in place of a bundle identifier.
pub fn bundle_id_for(exe: &Path) -> Option<String> {
    exe.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .filter(|stem| !stem.is_empty())
}

fn to_record(process: &Process, policy: ActivationPolicy) -> ProcessRecord {
    let exe = executable(process);
    let bundle_id = exe.and_then(bundle_id_for);
    let mut name = process.name().to_string_lossy().to_string();
    if name.is_empty() {
        name = bundle_id.clone().unwrap_or_else(|| "Unknown".to_string());
    }
    ProcessRecord {
        pid: process.pid().as_u32() as i32,
        name,
        bundle_id,
        icon: None,
        activation_policy: policy,
        launch_location: exe.map(Path::to_path_buf),
    }
}

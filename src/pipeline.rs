//! The refresh pipeline: query, merge, filter, dedup, sort.

use std::collections::{BTreeSet, HashSet};

use crate::model::{ProcessRecord, RefreshRequest};
use crate::source::ProcessSource;

/// Runs one full refresh against `source` using the configuration captured
/// in `request`.
pub fn collect(source: &dyn ProcessSource, request: &RefreshRequest) -> Vec<ProcessRecord> {
    let foreground = if request.show_background_apps {
        source.query_all()
    } else {
        source.query_foreground()
    };
    let background = source.query_included_background(&request.included_apps);
    reconcile(foreground, background, &request.protected)
}

/// Merges both query results into the list the user can act on.
///
/// Foreground records come first so they win any conflict in the dedup
/// pass. A record survives dedup only if neither its pid nor its bundle
/// identifier was seen earlier in the scan; both are marked as seen either
/// way.
///
/// Names are ordered by their lowercase form, which is case-insensitive
/// but not locale-aware collation.
pub fn reconcile(
    foreground: Vec<ProcessRecord>,
    background: Vec<ProcessRecord>,
    protected: &BTreeSet<String>,
) -> Vec<ProcessRecord> {
    let mut seen_pids: HashSet<i32> = HashSet::new();
    let mut seen_bundle_ids: HashSet<String> = HashSet::new();

    let mut apps: Vec<ProcessRecord> = foreground
        .into_iter()
        .chain(background)
        .filter(|record| !is_protected(record, protected))
        .filter(|record| {
            let new_pid = seen_pids.insert(record.pid);
            let new_bundle_id = match &record.bundle_id {
                Some(id) => seen_bundle_ids.insert(id.clone()),
                None => true,
            };
            new_pid && new_bundle_id
        })
        .collect();

    // Stable: equal names keep their merge order.
    apps.sort_by_cached_key(|record| record.name.to_lowercase());
    apps
}

fn is_protected(record: &ProcessRecord, protected: &BTreeSet<String>) -> bool {
    record
        .bundle_id
        .as_ref()
        .is_some_and(|id| protected.contains(id))
}

/// The published list as the user sees it: ignored apps removed, then
/// narrowed to names containing `search_text` (case-insensitive).
pub fn filter_apps<'a>(
    apps: &'a [ProcessRecord],
    ignored: &BTreeSet<String>,
    search_text: &str,
) -> Vec<&'a ProcessRecord> {
    let needle = search_text.to_lowercase();
    apps.iter()
        .filter(|record| match &record.bundle_id {
            Some(id) => !ignored.contains(id),
            None => true,
        })
        .filter(|record| search_text.is_empty() || record.name.to_lowercase().contains(&needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::model::ActivationPolicy;
    use crate::source::memory::MemoryProcessSource;

    fn app(pid: i32, name: &str, bundle_id: &str) -> ProcessRecord {
        ProcessRecord::new(pid, name, ActivationPolicy::Regular).with_bundle_id(bundle_id)
    }

    fn agent(pid: i32, name: &str, bundle_id: &str) -> ProcessRecord {
        ProcessRecord::new(pid, name, ActivationPolicy::Background).with_bundle_id(bundle_id)
    }

    fn set(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    fn names(apps: &[ProcessRecord]) -> Vec<&str> {
        apps.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn duplicate_pid_keeps_foreground_record() {
        let apps = reconcile(
            vec![app(10, "Mail", "com.apple.mail")],
            vec![agent(10, "Mail Helper", "com.apple.mail.helper")],
            &BTreeSet::new(),
        );
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].name, "Mail");
    }

    #[test]
    fn duplicate_bundle_id_keeps_first_seen() {
        let apps = reconcile(
            vec![app(1, "Code", "com.microsoft.VSCode")],
            vec![agent(2, "Code", "com.microsoft.VSCode")],
            &BTreeSet::new(),
        );
        assert_eq!(apps.iter().map(|r| r.pid).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn records_without_bundle_id_dedup_by_pid_only() {
        let apps = reconcile(
            vec![
                ProcessRecord::new(1, "tool", ActivationPolicy::Regular),
                ProcessRecord::new(2, "tool", ActivationPolicy::Regular),
            ],
            Vec::new(),
            &BTreeSet::new(),
        );
        assert_eq!(apps.len(), 2);
    }

    #[test]
    fn dropped_record_still_marks_its_pid() {
        // pid 2 first appears with an already-seen bundle id; its later
        // appearance is not its first occurrence.
        let apps = reconcile(
            vec![app(1, "A", "com.a"), app(2, "A2", "com.a")],
            vec![agent(2, "B", "com.b")],
            &BTreeSet::new(),
        );
        assert_eq!(names(&apps), vec!["A"]);
    }

    #[test]
    fn protected_apps_never_survive_even_when_included() {
        let protected = set(&["com.apple.finder"]);
        let request = RefreshRequest {
            included_apps: set(&["com.apple.finder"]),
            protected: Arc::new(protected),
            show_background_apps: false,
        };
        let source = MemoryProcessSource::new(vec![
            app(1, "Finder", "com.apple.finder"),
            app(2, "Safari", "com.apple.Safari"),
        ]);
        let apps = collect(&source, &request);
        assert_eq!(names(&apps), vec!["Safari"]);
    }

    #[test]
    fn sorts_case_insensitively() {
        let apps = reconcile(
            vec![app(1, "Zoom", "us.zoom"), app(2, "apple", "com.apple"), app(3, "Banana", "com.banana")],
            Vec::new(),
            &BTreeSet::new(),
        );
        assert_eq!(names(&apps), vec!["apple", "Banana", "Zoom"]);
    }

    #[test]
    fn equal_names_keep_merge_order() {
        let apps = reconcile(
            vec![app(30, "Terminal", "com.a.terminal")],
            vec![agent(5, "Terminal", "com.b.terminal"), agent(7, "terminal", "com.c.terminal")],
            &BTreeSet::new(),
        );
        assert_eq!(apps.iter().map(|r| r.pid).collect::<Vec<_>>(), vec![30, 5, 7]);
    }

    #[test]
    fn background_apps_only_when_included() {
        let source = MemoryProcessSource::new(vec![
            app(1, "Safari", "com.apple.Safari"),
            agent(2, "Dropbox", "com.getdropbox.dropbox"),
            agent(3, "Backup", "com.example.backup"),
        ]);
        let request = RefreshRequest {
            included_apps: set(&["com.getdropbox.dropbox"]),
            protected: Arc::new(BTreeSet::new()),
            show_background_apps: false,
        };
        assert_eq!(names(&collect(&source, &request)), vec!["Dropbox", "Safari"]);

        let everything = RefreshRequest {
            show_background_apps: true,
            ..request
        };
        assert_eq!(
            names(&collect(&source, &everything)),
            vec!["Backup", "Dropbox", "Safari"]
        );
    }

    #[test]
    fn filter_composes_ignore_and_search() {
        let apps = vec![
            app(1, "Bear", "com.a"),
            app(2, "Books", "com.b"),
            app(3, "Calendar", "com.c"),
        ];
        let filtered = filter_apps(&apps, &set(&["com.a"]), "b");
        assert_eq!(filtered.iter().map(|r| r.pid).collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn empty_search_keeps_everything_not_ignored() {
        let apps = vec![
            app(1, "Bear", "com.a"),
            ProcessRecord::new(2, "loose", ActivationPolicy::Regular),
        ];
        let filtered = filter_apps(&apps, &set(&["com.a"]), "");
        assert_eq!(filtered.iter().map(|r| r.pid).collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn search_is_case_insensitive() {
        let apps = vec![app(1, "Visual Studio Code", "com.microsoft.VSCode")];
        assert_eq!(filter_apps(&apps, &BTreeSet::new(), "STUDIO").len(), 1);
        assert!(filter_apps(&apps, &BTreeSet::new(), "xcode").is_empty());
    }
}

//! Scripted process table for tests and demos.

use std::sync::{Mutex, PoisonError};

use crate::model::ProcessRecord;
use crate::source::ProcessSource;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SourceCall {
    Query,
    Terminate { pid: i32, force: bool },
    Relaunch { pid: i32 },
    Reveal { pid: i32 },
}

#[derive(Debug)]
struct State {
    processes: Vec<ProcessRecord>,
    accept_requests: bool,
    remove_on_terminate: bool,
    calls: Vec<SourceCall>,
}

/// In-memory [`ProcessSource`].
///
/// By default every request is accepted and accepted terminations remove
/// the process from the table on the spot.
#[derive(Debug)]
pub struct MemoryProcessSource {
    state: Mutex<State>,
}

impl MemoryProcessSource {
    pub fn new(processes: Vec<ProcessRecord>) -> Self {
        Self {
            state: Mutex::new(State {
                processes,
                accept_requests: true,
                remove_on_terminate: true,
                calls: Vec::new(),
            }),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_processes(&self, processes: Vec<ProcessRecord>) {
        self.state().processes = processes;
    }

    pub fn set_accept_requests(&self, accept: bool) {
        self.state().accept_requests = accept;
    }

    /// When false, accepted terminations leave the process running, as an
    /// OS that has not caught up yet would.
    pub fn set_remove_on_terminate(&self, remove: bool) {
        self.state().remove_on_terminate = remove;
    }

    pub fn calls(&self) -> Vec<SourceCall> {
        self.state().calls.clone()
    }

    pub fn query_count(&self) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|call| **call == SourceCall::Query)
            .count()
    }
}

impl ProcessSource for MemoryProcessSource {
    fn query_all(&self) -> Vec<ProcessRecord> {
        let mut state = self.state();
        state.calls.push(SourceCall::Query);
        state.processes.clone()
    }

    fn terminate(&self, record: &ProcessRecord, force: bool) -> bool {
        let mut state = self.state();
        state.calls.push(SourceCall::Terminate {
            pid: record.pid,
            force,
        });
        if !state.accept_requests {
            return false;
        }
        if state.remove_on_terminate {
            state.processes.retain(|p| p.pid != record.pid);
        }
        true
    }

    fn relaunch(&self, record: &ProcessRecord) -> bool {
        let mut state = self.state();
        state.calls.push(SourceCall::Relaunch { pid: record.pid });
        record.launch_location.is_some() && state.accept_requests
    }

    fn reveal_in_file_browser(&self, record: &ProcessRecord) {
        self.state().calls.push(SourceCall::Reveal { pid: record.pid });
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::model::ActivationPolicy;

    fn table() -> Vec<ProcessRecord> {
        vec![
            ProcessRecord::new(1, "Safari", ActivationPolicy::Regular)
                .with_bundle_id("com.apple.Safari"),
            ProcessRecord::new(2, "Agent", ActivationPolicy::Background)
                .with_bundle_id("com.example.agent"),
            ProcessRecord::new(3, "helper", ActivationPolicy::Prohibited),
        ]
    }

    #[test]
    fn foreground_query_keeps_regular_processes() {
        let source = MemoryProcessSource::new(table());
        let pids: Vec<i32> = source.query_foreground().iter().map(|r| r.pid).collect();
        assert_eq!(pids, vec![1]);
    }

    #[test]
    fn background_query_matches_identifiers_only() {
        let source = MemoryProcessSource::new(table());
        let ids: BTreeSet<String> = ["com.example.agent".to_string()].into();
        let pids: Vec<i32> = source
            .query_included_background(&ids)
            .iter()
            .map(|r| r.pid)
            .collect();
        assert_eq!(pids, vec![2]);
        assert!(source.query_included_background(&BTreeSet::new()).is_empty());
    }

    #[test]
    fn relaunch_requires_launch_location() {
        let source = MemoryProcessSource::new(Vec::new());
        let bare = ProcessRecord::new(9, "Bare", ActivationPolicy::Regular);
        assert!(!source.relaunch(&bare));
        let located = bare.with_launch_location("/Applications/Bare.app");
        assert!(source.relaunch(&located));
    }

    #[test]
    fn rejected_termination_keeps_process() {
        let source = MemoryProcessSource::new(table());
        source.set_accept_requests(false);
        let record = source.query_all().remove(0);
        assert!(!source.terminate(&record, false));
        assert_eq!(source.query_all().len(), 3);
    }
}

//! Abstraction over the operating system's process table.

use std::collections::BTreeSet;

use crate::model::ProcessRecord;

pub mod memory;

/// Everything the reconciler needs from the OS.
///
/// Implementations never fail loudly: an unavailable process table yields
/// an empty list and a rejected request yields `false`.
pub trait ProcessSource: Send + Sync {
    /// Every process the OS reports, in a stable order.
    fn query_all(&self) -> Vec<ProcessRecord>;

    /// Processes with a regular (visible) presence.
    fn query_foreground(&self) -> Vec<ProcessRecord> {
        self.query_all()
            .into_iter()
            .filter(ProcessRecord::is_regular)
            .collect()
    }

    /// Processes whose bundle identifier is in `identifiers`, whatever
    /// their activation policy.
    fn query_included_background(&self, identifiers: &BTreeSet<String>) -> Vec<ProcessRecord> {
        if identifiers.is_empty() {
            return Vec::new();
        }
        self.query_all()
            .into_iter()
            .filter(|record| {
                record
                    .bundle_id
                    .as_ref()
                    .is_some_and(|id| identifiers.contains(id))
            })
            .collect()
    }

    /// Asks the process to quit (`force == false`) or kills it outright.
    /// Returns whether the request was accepted, not whether it exited.
    fn terminate(&self, record: &ProcessRecord, force: bool) -> bool;

    /// Terminates the process and launches it again from the same location
    /// after a short delay. The delayed launch is not awaited.
    fn relaunch(&self, record: &ProcessRecord) -> bool;

    fn reveal_in_file_browser(&self, record: &ProcessRecord);
}

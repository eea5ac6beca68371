use std::sync::Arc;
use std::thread;

use crossbeam_channel::Receiver;
use log::{info, warn};

use crate::model::{ActionKind, ActionReport, UserEvent, WorkerCommand};
use crate::pipeline;
use crate::scheduler::EventSink;
use crate::source::ProcessSource;

/// Runs OS work off the event loop. Exits when the command channel closes
/// or the event loop stops listening.
pub fn spawn_worker<S: EventSink>(
    source: Arc<dyn ProcessSource>,
    rx: Receiver<WorkerCommand>,
    sink: S,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for command in rx.iter() {
            let Some(event) = execute(source.as_ref(), command) else {
                continue;
            };
            if !sink.post(event) {
                break;
            }
        }
    })
}

/// Executes one command and returns the event to hand back, if any.
pub fn execute(source: &dyn ProcessSource, command: WorkerCommand) -> Option<UserEvent> {
    match command {
        WorkerCommand::Refresh(request) => {
            let apps = pipeline::collect(source, &request);
            Some(UserEvent::AppsRefreshed(apps))
        }
        WorkerCommand::Terminate { record, force } => {
            let accepted = source.terminate(&record, force);
            if accepted {
                info!(
                    "{} {} (PID {})",
                    if force { "Force quit" } else { "Quit" },
                    record.name,
                    record.pid
                );
            } else {
                warn!(
                    "{} (PID {}) rejected the termination request",
                    record.name, record.pid
                );
            }
            Some(UserEvent::ActionFinished(ActionReport {
                kind: ActionKind::Quit { force },
                record,
                accepted,
            }))
        }
        WorkerCommand::Relaunch(record) => {
            let accepted = source.relaunch(&record);
            if accepted {
                info!("Restarting {} (PID {})", record.name, record.pid);
            } else {
                warn!("Unable to restart {} (PID {})", record.name, record.pid);
            }
            Some(UserEvent::ActionFinished(ActionReport {
                kind: ActionKind::Restart,
                record,
                accepted,
            }))
        }
        WorkerCommand::Reveal(record) => {
            source.reveal_in_file_browser(&record);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::time::Duration;

    use super::*;
    use crate::model::{ActivationPolicy, ProcessRecord, RefreshRequest};
    use crate::source::memory::{MemoryProcessSource, SourceCall};

    fn safari() -> ProcessRecord {
        ProcessRecord::new(11, "Safari", ActivationPolicy::Regular)
            .with_bundle_id("com.apple.Safari")
            .with_launch_location("/Applications/Safari.app")
    }

    #[test]
    fn refresh_runs_the_pipeline() {
        let source = MemoryProcessSource::new(vec![safari()]);
        let request = RefreshRequest {
            included_apps: BTreeSet::new(),
            protected: Arc::new(BTreeSet::new()),
            show_background_apps: false,
        };
        match execute(&source, WorkerCommand::Refresh(request)) {
            Some(UserEvent::AppsRefreshed(apps)) => assert_eq!(apps, vec![safari()]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn terminate_reports_acceptance() {
        let source = MemoryProcessSource::new(vec![safari()]);
        source.set_accept_requests(false);
        let event = execute(
            &source,
            WorkerCommand::Terminate {
                record: safari(),
                force: true,
            },
        );
        match event {
            Some(UserEvent::ActionFinished(report)) => {
                assert_eq!(report.kind, ActionKind::Quit { force: true });
                assert!(!report.accepted);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            source.calls(),
            vec![SourceCall::Terminate { pid: 11, force: true }]
        );
    }

    #[test]
    fn reveal_produces_no_event() {
        let source = MemoryProcessSource::new(vec![safari()]);
        assert!(execute(&source, WorkerCommand::Reveal(safari())).is_none());
        assert_eq!(source.calls(), vec![SourceCall::Reveal { pid: 11 }]);
    }

    #[test]
    fn worker_thread_posts_results() {
        let source: Arc<dyn ProcessSource> = Arc::new(MemoryProcessSource::new(vec![safari()]));
        let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded();
        let (event_tx, event_rx) = crossbeam_channel::unbounded();
        let handle = spawn_worker(source, cmd_rx, event_tx);

        cmd_tx.send(WorkerCommand::Relaunch(safari())).unwrap();
        let event = event_rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(matches!(
            event,
            UserEvent::ActionFinished(ActionReport {
                kind: ActionKind::Restart,
                accepted: true,
                ..
            })
        ));

        drop(cmd_tx);
        handle.join().unwrap();
    }
}

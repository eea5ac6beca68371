//! Execution contexts: the event loop, the worker thread, timers.

use std::thread;
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, Sender};
use log::{error, trace};

use crate::model::{UserEvent, WorkerCommand};

/// Delivers events to the event-loop context. Returns false once the loop
/// is gone.
pub trait EventSink: Clone + Send + 'static {
    fn post(&self, event: UserEvent) -> bool;
}

impl EventSink for Sender<UserEvent> {
    fn post(&self, event: UserEvent) -> bool {
        self.send(event).is_ok()
    }
}

#[cfg(any(target_os = "macos", target_os = "windows"))]
impl EventSink for winit::event_loop::EventLoopProxy<UserEvent> {
    fn post(&self, event: UserEvent) -> bool {
        self.send_event(event).is_ok()
    }
}

/// What the reconciler may ask of the runtime. Every method returns
/// immediately.
pub trait Scheduler {
    /// Runs `command` on the background worker; its result comes back as
    /// a [`UserEvent`]. Returns false when the worker is gone.
    fn run_in_background(&self, command: WorkerCommand) -> bool;

    /// Delivers `event` to the event loop after `delay`.
    fn post_after(&self, delay: Duration, event: UserEvent);

    /// Replaces the refresh timer. The pending wait is cancelled and no
    /// tick is fired for the change itself.
    fn set_interval(&self, interval: Duration);
}

enum TickerControl {
    Rearm(Duration),
}

/// Posts [`UserEvent::Tick`] every interval until the event loop goes away.
pub struct Ticker {
    control: Sender<TickerControl>,
    _handle: thread::JoinHandle<()>,
}

impl Ticker {
    pub fn spawn<S: EventSink>(sink: S, interval: Duration) -> Self {
        let (control, rx) = crossbeam_channel::unbounded();
        let handle = thread::spawn(move || {
            let mut interval = interval;
            loop {
                match rx.recv_timeout(interval) {
                    Ok(TickerControl::Rearm(next)) => {
                        trace!("Refresh timer re-armed at {:?}", next);
                        interval = next;
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        if !sink.post(UserEvent::Tick) {
                            break;
                        }
                    }
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        });
        Self {
            control,
            _handle: handle,
        }
    }

    pub fn rearm(&self, interval: Duration) {
        let _ = self.control.send(TickerControl::Rearm(interval));
    }
}

/// Fire-and-forget delayed delivery.
pub fn post_after<S: EventSink>(sink: S, delay: Duration, event: UserEvent) {
    thread::spawn(move || {
        thread::sleep(delay);
        sink.post(event);
    });
}

/// The production [`Scheduler`]: a worker channel, a ticker and delayed
/// posts, all reporting back through one sink.
pub struct RuntimeScheduler<S: EventSink> {
    worker: Sender<WorkerCommand>,
    sink: S,
    ticker: Ticker,
}

impl<S: EventSink> RuntimeScheduler<S> {
    pub fn new(worker: Sender<WorkerCommand>, sink: S, ticker: Ticker) -> Self {
        Self {
            worker,
            sink,
            ticker,
        }
    }
}

impl<S: EventSink> Scheduler for RuntimeScheduler<S> {
    fn run_in_background(&self, command: WorkerCommand) -> bool {
        match self.worker.send(command) {
            Ok(()) => true,
            Err(err) => {
                error!("Worker unavailable, dropping {:?}", err.into_inner());
                false
            }
        }
    }

    fn post_after(&self, delay: Duration, event: UserEvent) {
        post_after(self.sink.clone(), delay, event);
    }

    fn set_interval(&self, interval: Duration) {
        self.ticker.rearm(interval);
    }
}

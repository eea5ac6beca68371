//! Application-wide event broadcast.

use std::sync::{Mutex, PoisonError};

use crossbeam_channel::{Receiver, Sender};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AppEvent {
    SettingsChanged,
    /// Carries the bundle identifier of the application.
    ApplicationQuit(String),
    /// Carries the bundle identifier of the application.
    ApplicationRestarted(String),
}

#[derive(Debug, Default)]
pub struct EventPublisher {
    subscribers: Mutex<Vec<Sender<AppEvent>>>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<AppEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    /// Delivers `event` to every live subscriber; dropped receivers are
    /// forgotten.
    pub fn publish(&self, event: AppEvent) {
        log::debug!("Publishing {:?}", event);
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_subscriber_receives_events_in_order() {
        let publisher = EventPublisher::new();
        let first = publisher.subscribe();
        let second = publisher.subscribe();

        publisher.publish(AppEvent::ApplicationQuit("com.x.y".into()));
        publisher.publish(AppEvent::SettingsChanged);

        for rx in [&first, &second] {
            assert_eq!(
                rx.try_recv().unwrap(),
                AppEvent::ApplicationQuit("com.x.y".into())
            );
            assert_eq!(rx.try_recv().unwrap(), AppEvent::SettingsChanged);
            assert!(rx.try_recv().is_err());
        }
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let publisher = EventPublisher::new();
        let kept = publisher.subscribe();
        drop(publisher.subscribe());
        assert_eq!(publisher.subscriber_count(), 2);

        publisher.publish(AppEvent::ApplicationRestarted("com.x.y".into()));
        assert_eq!(publisher.subscriber_count(), 1);
        assert!(kept.try_recv().is_ok());
    }
}

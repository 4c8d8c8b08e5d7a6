use std::sync::{Arc, Mutex, PoisonError};

use flotilla_beam::{Message, Sender};
use tracing::debug;

const EVENTS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::events");

/// Fan-out of `Log` and `Error` events to attached sessions.
///
/// Subscribers whose receive end has gone away are pruned on the next
/// publish.
#[derive(Debug, Clone, Default)]
pub(crate) struct EventHub {
    subscribers: Arc<Mutex<Vec<Sender>>>,
}

impl EventHub {
    pub(crate) fn subscribe(&self, subscriber: Sender) {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(subscriber);
    }

    pub(crate) fn log(&self, line: impl Into<String>) {
        let line = line.into();
        self.publish(|| Message::log(line.clone()));
    }

    pub(crate) fn error(&self, message: impl Into<String>) {
        let message = message.into();
        self.publish(|| Message::error(message.clone()));
    }

    fn publish(&self, event: impl Fn() -> Message) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let before = subscribers.len();
        subscribers.retain(|subscriber| subscriber.send(event()).is_ok());
        if subscribers.len() < before {
            debug!(
                target: EVENTS_TARGET,
                dropped = before - subscribers.len(),
                "pruned closed subscribers"
            );
        }
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flotilla_beam::{Verb, pipe};
    use std::time::Duration;

    #[test]
    fn broadcasts_to_every_subscriber() {
        let hub = EventHub::default();
        let (mut first, first_tx) = pipe();
        let (mut second, second_tx) = pipe();
        hub.subscribe(first_tx);
        hub.subscribe(second_tx);

        hub.log("hello");

        for receiver in [&mut first, &mut second] {
            let event = receiver
                .recv_timeout(Duration::from_millis(100))
                .expect("event");
            assert_eq!(event.verb, Verb::Log);
            assert_eq!(event.first_arg(), Some("hello"));
        }
    }

    #[test]
    fn prunes_closed_subscribers() {
        let hub = EventHub::default();
        let (receiver, sender) = pipe();
        hub.subscribe(sender);
        drop(receiver);

        hub.error("boom");
        assert_eq!(hub.subscriber_count(), 0);
    }
}

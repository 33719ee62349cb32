use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use parking_lot::RwLock;

/// Outcome of offering one amplitude value to the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// The subscriber's channel was full.
    Dropped,
    NoSubscriber,
}

/// Single-subscriber fan-out for amplitude values.
///
/// Publishing never blocks: values are offered with `try_send` and discarded
/// when the subscriber falls behind. Subscribing replaces the previous
/// subscriber, whose stream then ends.
pub struct AmplitudeHub {
    slot: RwLock<Option<Sender<f64>>>,
    capacity: usize,
}

impl AmplitudeHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            slot: RwLock::new(None),
            capacity: capacity.max(1),
        }
    }

    pub fn subscribe(&self) -> AmplitudeStream {
        let (tx, rx) = bounded(self.capacity);
        if self.slot.write().replace(tx).is_some() {
            log::debug!("Amplitude subscriber replaced");
        }
        AmplitudeStream { rx }
    }

    pub fn unsubscribe(&self) {
        if self.slot.write().take().is_some() {
            log::debug!("Amplitude subscriber removed");
        }
    }

    pub fn has_subscriber(&self) -> bool {
        self.slot.read().is_some()
    }

    pub fn publish(&self, value: f64) -> Delivery {
        let stale = {
            let slot = self.slot.read();
            let Some(tx) = slot.as_ref() else {
                return Delivery::NoSubscriber;
            };
            match tx.try_send(value) {
                Ok(()) => return Delivery::Delivered,
                Err(TrySendError::Full(_)) => return Delivery::Dropped,
                Err(TrySendError::Disconnected(_)) => tx.clone(),
            }
        };

        // The consumer dropped its stream; clear the slot unless it was
        // replaced in the meantime.
        let mut slot = self.slot.write();
        if slot.as_ref().is_some_and(|tx| tx.same_channel(&stale)) {
            *slot = None;
            log::debug!("Amplitude subscriber went away");
        }
        Delivery::NoSubscriber
    }
}

/// Receiving end of an amplitude subscription.
///
/// Iteration blocks for the next value and ends once the subscription is
/// replaced or cancelled.
pub struct AmplitudeStream {
    rx: Receiver<f64>,
}

impl AmplitudeStream {
    pub fn recv_timeout(&self, timeout: Duration) -> Result<f64, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    pub fn try_recv(&self) -> Option<f64> {
        self.rx.try_recv().ok()
    }

    /// Values currently queued.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

impl Iterator for AmplitudeStream {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        self.rx.recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_without_subscriber() {
        let hub = AmplitudeHub::new(4);
        assert_eq!(hub.publish(0.5), Delivery::NoSubscriber);
    }

    #[test]
    fn full_channel_drops_instead_of_blocking() {
        let hub = AmplitudeHub::new(2);
        let stream = hub.subscribe();

        assert_eq!(hub.publish(0.1), Delivery::Delivered);
        assert_eq!(hub.publish(0.2), Delivery::Delivered);
        assert_eq!(hub.publish(0.3), Delivery::Dropped);

        assert_eq!(stream.try_recv(), Some(0.1));
        assert_eq!(stream.try_recv(), Some(0.2));
        assert_eq!(stream.try_recv(), None);
    }

    #[test]
    fn resubscribe_ends_previous_stream() {
        let hub = AmplitudeHub::new(4);
        let old = hub.subscribe();
        hub.publish(0.25);

        let new = hub.subscribe();
        hub.publish(0.75);

        assert_eq!(old.collect::<Vec<_>>(), vec![0.25]);
        assert_eq!(new.try_recv(), Some(0.75));
    }

    #[test]
    fn unsubscribe_terminates_iteration() {
        let hub = AmplitudeHub::new(4);
        let mut stream = hub.subscribe();
        hub.unsubscribe();
        assert!(!hub.has_subscriber());
        assert_eq!(stream.next(), None);
        assert_eq!(
            stream.recv_timeout(Duration::from_millis(1)),
            Err(RecvTimeoutError::Disconnected)
        );
    }

    #[test]
    fn dropped_stream_clears_slot() {
        let hub = AmplitudeHub::new(4);
        drop(hub.subscribe());
        assert!(hub.has_subscriber());
        assert_eq!(hub.publish(1.0), Delivery::NoSubscriber);
        assert!(!hub.has_subscriber());
    }
}

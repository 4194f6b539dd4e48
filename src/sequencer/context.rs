// Sequencer context - Everything the playback thread and the recorder share
//
// Built once per session and handed out as an Arc; there is no global engine
// object.

use crate::error::SequencerError;
use crate::messaging::channels::NotificationProducer;
use crate::messaging::notification::{ErrorCategory, Notification};
use crate::sequencer::event::Event;
use crate::sequencer::sink::ClockSink;
use crate::sequencer::store::TrackStore;
use crate::sequencer::timeline::Tempo;
use crate::sequencer::transport::SharedTransportState;
use ringbuf::traits::Producer;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{trace, warn};

pub struct SequencerContext {
    tracks: TrackStore,
    transport: SharedTransportState,
    sink: Mutex<Option<Box<dyn ClockSink>>>,
    notifications: Mutex<Option<NotificationProducer>>,
    sink_failures: AtomicU64,
}

impl SequencerContext {
    pub fn new(tempo: Tempo, notifications: Option<NotificationProducer>) -> Self {
        Self {
            tracks: TrackStore::new(),
            transport: SharedTransportState::new(tempo),
            sink: Mutex::new(None),
            notifications: Mutex::new(notifications),
            sink_failures: AtomicU64::new(0),
        }
    }

    pub fn tracks(&self) -> &TrackStore {
        &self.tracks
    }

    pub fn transport(&self) -> &SharedTransportState {
        &self.transport
    }

    fn sink_slot(&self) -> MutexGuard<'_, Option<Box<dyn ClockSink>>> {
        self.sink.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_sink(&self, sink: Box<dyn ClockSink>) {
        *self.sink_slot() = Some(sink);
    }

    pub fn clear_sink(&self) {
        *self.sink_slot() = None;
    }

    /// Total sink failures since the context was created
    pub fn sink_failures(&self) -> u64 {
        self.sink_failures.load(Ordering::Relaxed)
    }

    /// Forward events to the sink in order, returning how many failed
    ///
    /// A failure is logged and reported on the notification channel; the
    /// remaining events are still delivered.
    pub(crate) fn deliver(&self, events: &[Event], pending: &mut Vec<Notification>) -> usize {
        if events.is_empty() {
            return 0;
        }

        let mut slot = self.sink_slot();
        let Some(sink) = slot.as_mut() else {
            trace!(count = events.len(), "No output sink, dropping due events");
            return 0;
        };

        let mut failures = 0;
        for event in events {
            if let Err(e) = sink.emit(event) {
                let error = match e {
                    SequencerError::SinkDeliveryFailure(_) => e,
                    other => SequencerError::SinkDeliveryFailure(other.to_string()),
                };
                warn!(%event, %error, "Output sink rejected event, playback continues");
                pending.push(Notification::error(ErrorCategory::Playback, error.to_string()));
                failures += 1;
            }
        }

        self.sink_failures
            .fetch_add(failures as u64, Ordering::Relaxed);
        failures
    }

    /// Push notifications, dropping any that do not fit
    pub(crate) fn notify_all(&self, notifications: impl IntoIterator<Item = Notification>) {
        let mut slot = self
            .notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(producer) = slot.as_mut() else {
            return;
        };

        let mut dropped = 0usize;
        for notification in notifications {
            if producer.try_push(notification).is_err() {
                dropped += 1;
            }
        }
        if dropped > 0 {
            trace!(dropped, "Notification channel full");
        }
    }

    pub(crate) fn notify(&self, notification: Notification) {
        self.notify_all(std::iter::once(notification));
    }
}

impl Default for SequencerContext {
    fn default() -> Self {
        Self::new(Tempo::default(), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::messaging::channels::create_notification_channel;
    use ringbuf::traits::Consumer;

    #[test]
    fn test_deliver_without_sink() {
        let context = SequencerContext::default();
        let mut pending = Vec::new();
        let failures = context.deliver(&[Event::note_on(0.0, 0, 60, 100)], &mut pending);
        assert_eq!(failures, 0);
        assert!(pending.is_empty());
    }

    #[test]
    fn test_deliver_counts_failures_and_continues() {
        let context = SequencerContext::default();
        let counter = std::sync::Arc::new(AtomicU64::new(0));
        let sink_counter = counter.clone();
        context.set_sink(Box::new(move |event: &Event| -> Result<()> {
            sink_counter.fetch_add(1, Ordering::Relaxed);
            if event.pitch() == 61 {
                Err(SequencerError::Device("port closed".into()))
            } else {
                Ok(())
            }
        }));

        let events = [
            Event::note_on(0.0, 0, 60, 100),
            Event::note_on(0.0, 0, 61, 100),
            Event::note_on(0.0, 0, 62, 100),
        ];
        let mut pending = Vec::new();
        let failures = context.deliver(&events, &mut pending);

        assert_eq!(failures, 1);
        assert_eq!(counter.load(Ordering::Relaxed), 3);
        assert_eq!(context.sink_failures(), 1);
        assert_eq!(pending.len(), 1);
        match &pending[0] {
            Notification::Error(report) => {
                assert_eq!(report.category, ErrorCategory::Playback);
                assert!(report.message.contains("port closed"));
            }
            other => panic!("Expected error notification, got {:?}", other),
        }
    }

    #[test]
    fn test_notify_drops_when_full() {
        let (tx, mut rx) = create_notification_channel(1);
        let context = SequencerContext::new(Tempo::default(), Some(tx));
        context.notify_all([
            Notification::TempoChanged { bpm: 90.0 },
            Notification::TempoChanged { bpm: 100.0 },
        ]);
        assert_eq!(rx.try_pop(), Some(Notification::TempoChanged { bpm: 90.0 }));
        assert_eq!(rx.try_pop(), None);
    }
}

// Recording ingest - Stamps incoming MIDI with the transport tick
//
// Runs on whatever thread the device delivers input on, concurrently with
// playback. Appends go through the track store's write lock, so the
// dispatcher never observes a half-written track.

use crate::error::Result;
use crate::messaging::notification::{ErrorCategory, Notification};
use crate::midi::event::MidiMessage;
use crate::sequencer::context::SequencerContext;
use crate::sequencer::event::Event;
use std::sync::Arc;
use tracing::{debug, trace};

#[derive(Clone)]
pub struct RecordingIngest {
    context: Arc<SequencerContext>,
}

impl RecordingIngest {
    pub fn new(context: Arc<SequencerContext>) -> Self {
        Self { context }
    }

    /// Handle one raw input message
    ///
    /// Returns the recorded event, or `None` when recording is off or no
    /// track is selected. A malformed message is an error and nothing is
    /// appended.
    pub fn on_message(&self, bytes: &[u8]) -> Result<Option<Event>> {
        let transport = self.context.transport();
        if !transport.is_recording() {
            return Ok(None);
        }

        let message = MidiMessage::from_bytes(bytes).inspect_err(|e| {
            debug!(?bytes, error = %e, "Discarding malformed MIDI input");
        })?;

        let mut recorded = None;
        let track = self.context.tracks().append_to_selected(|| {
            let event = message.into_event(transport.current_tick());
            recorded = Some(event);
            event
        });

        match track {
            Some(track) => {
                trace!(track, event = ?recorded, "Recorded event");
                Ok(recorded)
            }
            None => {
                trace!("No track selected, input dropped");
                Ok(None)
            }
        }
    }

    /// Like [`on_message`](Self::on_message), but failures go to the
    /// notification channel instead of the caller
    ///
    /// Intended for device callbacks, which have nowhere to return an error.
    pub fn ingest(&self, bytes: &[u8]) {
        if let Err(e) = self.on_message(bytes) {
            self.context
                .notify(Notification::error(ErrorCategory::Recording, e.to_string()));
        }
    }
}

// MIDI wire messages - raw 1-3 byte channel messages to and from typed events

use crate::error::{Result, SequencerError};
use crate::sequencer::event::{Event, EventKind};
use std::ops::Deref;

/// A classified channel-voice message, not yet placed in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiMessage {
    pub kind: EventKind,
    pub channel: u8,
    pub data1: u8,
    pub data2: u8,
}

impl MidiMessage {
    /// Parse a raw MIDI message
    ///
    /// Missing data bytes read as 0, so a truncated note-on is a note-off.
    /// Only channel-voice statuses (0x80-0xEF) are recognised; system
    /// messages and stray data bytes are rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let Some(&status) = bytes.first() else {
            return Err(SequencerError::MalformedMessage("empty message".into()));
        };

        let channel = status & 0x0F;
        let data1 = bytes.get(1).copied().unwrap_or(0) & 0x7F;
        let data2 = bytes.get(2).copied().unwrap_or(0) & 0x7F;

        let kind = match status & 0xF0 {
            // Velocity 0 = Note Off
            0x90 if data2 > 0 => EventKind::NoteOn,
            0x90 | 0x80 => EventKind::NoteOff,
            0xE0 => EventKind::PitchBend,
            0xA0 | 0xD0 => EventKind::Aftertouch,
            0xB0 | 0xC0 => EventKind::ControlChange,
            _ => {
                return Err(SequencerError::MalformedMessage(format!(
                    "unrecognised status 0x{:02X}",
                    status
                )));
            }
        };

        Ok(Self {
            kind,
            channel,
            data1,
            data2,
        })
    }

    /// Place this message on the timeline
    pub fn into_event(self, tick: f64) -> Event {
        let (pitch, velocity, value) = match self.kind {
            EventKind::NoteOn | EventKind::NoteOff => (self.data1, self.data2, 0),
            EventKind::PitchBend => (0, 0, ((self.data2 as u16) << 7) | self.data1 as u16),
            EventKind::ControlChange | EventKind::Aftertouch => {
                (self.data1, 0, self.data2 as u16)
            }
        };
        Event::new(tick, self.kind, self.channel, pitch, velocity, value)
    }

    /// Wire form of an event
    pub fn from_event(event: &Event) -> Self {
        let (data1, data2) = match event.kind() {
            EventKind::NoteOn | EventKind::NoteOff => (event.pitch(), event.velocity()),
            EventKind::PitchBend => (
                (event.value() & 0x7F) as u8,
                ((event.value() >> 7) & 0x7F) as u8,
            ),
            EventKind::ControlChange | EventKind::Aftertouch => {
                (event.pitch(), event.value().min(0x7F) as u8)
            }
        };

        Self {
            kind: event.kind(),
            channel: event.channel(),
            data1,
            data2,
        }
    }

    /// Encode as raw bytes: status (kind | channel) then two 7-bit data bytes
    pub fn to_bytes(&self) -> RawMessage {
        let status = match self.kind {
            EventKind::NoteOn => 0x90,
            EventKind::NoteOff => 0x80,
            EventKind::ControlChange => 0xB0,
            EventKind::PitchBend => 0xE0,
            EventKind::Aftertouch => 0xA0,
        };

        RawMessage([
            status | (self.channel & 0x0F),
            self.data1 & 0x7F,
            self.data2 & 0x7F,
        ])
    }
}

/// Three raw MIDI bytes ready for a device port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawMessage([u8; 3]);

impl Deref for RawMessage {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<&Event> for RawMessage {
    fn from(event: &Event) -> Self {
        MidiMessage::from_event(event).to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_on() {
        let message = MidiMessage::from_bytes(&[0x90, 60, 100]).unwrap();
        assert_eq!(message.kind, EventKind::NoteOn);
        assert_eq!(message.channel, 0);

        let event = message.into_event(12.0);
        assert_eq!(event.pitch(), 60);
        assert_eq!(event.velocity(), 100);
        assert_eq!(event.tick(), 12.0);
    }

    #[test]
    fn test_note_off_velocity_zero() {
        // Note On with velocity 0 = Note Off
        let event = MidiMessage::from_bytes(&[0x90, 60, 0]).unwrap().into_event(0.0);
        assert_eq!(event.kind(), EventKind::NoteOff);
        assert_eq!(event.channel(), 0);
        assert_eq!(event.pitch(), 60);
    }

    #[test]
    fn test_note_off_explicit() {
        let event = MidiMessage::from_bytes(&[0x80, 60, 0]).unwrap().into_event(0.0);
        assert_eq!(event.kind(), EventKind::NoteOff);
        assert_eq!(event.pitch(), 60);

        // Release velocity is kept
        let event = MidiMessage::from_bytes(&[0x85, 61, 40]).unwrap().into_event(0.0);
        assert_eq!(event.kind(), EventKind::NoteOff);
        assert_eq!(event.channel(), 5);
        assert_eq!(event.velocity(), 40);
    }

    #[test]
    fn test_channel_from_low_nibble() {
        let message = MidiMessage::from_bytes(&[0x9F, 60, 100]).unwrap();
        assert_eq!(message.channel, 15);
        let message = MidiMessage::from_bytes(&[0xB3, 7, 100]).unwrap();
        assert_eq!(message.channel, 3);
    }

    #[test]
    fn test_control_change() {
        let event = MidiMessage::from_bytes(&[0xB0, 7, 127]).unwrap().into_event(0.0);
        assert_eq!(event.kind(), EventKind::ControlChange);
        assert_eq!(event.pitch(), 7);
        assert_eq!(event.value(), 127);

        // Program change falls into the catch-all
        let message = MidiMessage::from_bytes(&[0xC2, 5]).unwrap();
        assert_eq!(message.kind, EventKind::ControlChange);
    }

    #[test]
    fn test_pitch_bend() {
        // Centre value: 0x40 << 7 | 0x00 = 8192
        let event = MidiMessage::from_bytes(&[0xE0, 0x00, 0x40]).unwrap().into_event(0.0);
        assert_eq!(event.kind(), EventKind::PitchBend);
        assert_eq!(event.value(), 8192);
    }

    #[test]
    fn test_aftertouch() {
        let poly = MidiMessage::from_bytes(&[0xA1, 60, 90]).unwrap();
        assert_eq!(poly.kind, EventKind::Aftertouch);
        let channel_pressure = MidiMessage::from_bytes(&[0xD1, 90]).unwrap();
        assert_eq!(channel_pressure.kind, EventKind::Aftertouch);
    }

    #[test]
    fn test_truncated_note_on_is_note_off() {
        let message = MidiMessage::from_bytes(&[0x90, 60]).unwrap();
        assert_eq!(message.kind, EventKind::NoteOff);
        let message = MidiMessage::from_bytes(&[0x90]).unwrap();
        assert_eq!(message.kind, EventKind::NoteOff);
        assert_eq!(message.data1, 0);
    }

    #[test]
    fn test_malformed_messages() {
        assert!(matches!(
            MidiMessage::from_bytes(&[]),
            Err(SequencerError::MalformedMessage(_))
        ));
        // System exclusive / realtime
        assert!(MidiMessage::from_bytes(&[0xF0, 0x00, 0x00]).is_err());
        assert!(MidiMessage::from_bytes(&[0xF8]).is_err());
        // Data byte in status position
        assert!(MidiMessage::from_bytes(&[0x3C, 0x64]).is_err());
    }

    #[test]
    fn test_encode_notes() {
        let on = Event::note_on(0.0, 2, 60, 100);
        assert_eq!(&*RawMessage::from(&on), &[0x92, 60, 100]);

        let off = Event::note_off(0.0, 15, 127);
        assert_eq!(&*RawMessage::from(&off), &[0x8F, 127, 0]);
    }

    #[test]
    fn test_encode_other_kinds() {
        let cc = Event::control_change(0.0, 1, 7, 99);
        assert_eq!(&*RawMessage::from(&cc), &[0xB1, 7, 99]);

        let bend = Event::pitch_bend(0.0, 0, 8192);
        assert_eq!(&*RawMessage::from(&bend), &[0xE0, 0x00, 0x40]);
    }

    #[test]
    fn test_recorded_message_encodes_back() {
        for bytes in [[0x93u8, 64, 90], [0x83, 64, 12], [0xB0, 74, 3], [0xE5, 0x12, 0x34]] {
            let event = MidiMessage::from_bytes(&bytes).unwrap().into_event(0.0);
            assert_eq!(&*RawMessage::from(&event), &bytes);
        }
    }
}

// Sequenced MIDI event - a typed message stamped with its tick

use std::fmt;

/// Kind of a sequenced event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    NoteOn,
    NoteOff,
    ControlChange,
    PitchBend,
    Aftertouch,
}

impl EventKind {
    /// Check if this is a NoteOn or NoteOff
    pub fn is_note(&self) -> bool {
        matches!(self, EventKind::NoteOn | EventKind::NoteOff)
    }
}

/// A MIDI event placed on a track
///
/// Events are plain values: once built they are never edited, and they have
/// no identity beyond their position in the owning track. Field ranges are
/// clamped at construction so nothing downstream has to re-check them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    tick: f64,
    kind: EventKind,
    channel: u8,
    pitch: u8,
    velocity: u8,
    value: u16,
}

impl Event {
    /// Largest 14-bit payload (pitch bend)
    pub const MAX_VALUE: u16 = 0x3FFF;

    /// Create an event, clamping every field into its MIDI domain
    pub fn new(
        tick: f64,
        kind: EventKind,
        channel: u8,
        pitch: u8,
        velocity: u8,
        value: u16,
    ) -> Self {
        let tick = if tick.is_finite() { tick.max(0.0) } else { 0.0 };

        Self {
            tick,
            kind,
            channel: channel.min(15),
            pitch: pitch.min(127),
            velocity: velocity.min(127),
            value: value.min(Self::MAX_VALUE),
        }
    }

    pub fn note_on(tick: f64, channel: u8, pitch: u8, velocity: u8) -> Self {
        Self::new(tick, EventKind::NoteOn, channel, pitch, velocity, 0)
    }

    pub fn note_off(tick: f64, channel: u8, pitch: u8) -> Self {
        Self::new(tick, EventKind::NoteOff, channel, pitch, 0, 0)
    }

    /// Control change: `pitch` carries the controller number
    pub fn control_change(tick: f64, channel: u8, controller: u8, value: u8) -> Self {
        Self::new(
            tick,
            EventKind::ControlChange,
            channel,
            controller,
            0,
            value as u16,
        )
    }

    /// Pitch bend with a 14-bit value (8192 = centre)
    pub fn pitch_bend(tick: f64, channel: u8, value: u16) -> Self {
        Self::new(tick, EventKind::PitchBend, channel, 0, 0, value)
    }

    pub fn tick(&self) -> f64 {
        self.tick
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn pitch(&self) -> u8 {
        self.pitch
    }

    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    pub fn value(&self) -> u16 {
        self.value
    }

    /// Check whether this event falls on the given integer tick
    ///
    /// Exact comparison: recorded ticks come from the transport's integer
    /// stepping, so they sit on the same grid the dispatcher walks.
    pub fn is_at(&self, tick: u64) -> bool {
        self.tick == tick as f64
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} @{} ch{} pitch {} vel {} value {}",
            self.kind, self.tick, self.channel, self.pitch, self.velocity, self.value
        )
    }
}

// Timeline - Musical time representation
// Tempo, tick resolution, loop windows and bar:beat:tick display

use crate::error::{Result, SequencerError};
use std::fmt;

/// Ticks per quarter note (PPQ), fixed for the lifetime of a sequencer
pub const TICKS_PER_QUARTER: u32 = 480;

/// Beats per bar used for position display (meter maps are not supported)
const DISPLAY_BEATS_PER_BAR: u64 = 4;

/// Tempo in BPM (Beats Per Minute)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tempo {
    bpm: f64,
}

impl Tempo {
    /// Creates a new tempo
    /// BPM must be finite and strictly positive
    pub fn new(bpm: f64) -> Result<Self> {
        if bpm.is_finite() && bpm > 0.0 {
            Ok(Self { bpm })
        } else {
            Err(SequencerError::InvalidTempo(bpm))
        }
    }

    /// Get BPM value
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Ticks elapsed per millisecond at this tempo
    /// ticks_per_ms = bpm * PPQ / 60000
    pub fn ticks_per_ms(&self) -> f64 {
        self.bpm * TICKS_PER_QUARTER as f64 / 60_000.0
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self { bpm: 120.0 }
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} BPM", self.bpm)
    }
}

/// Half-open tick range `[start, end)` that playback wraps within
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopWindow {
    start: u64,
    end: u64,
}

impl LoopWindow {
    /// Create a loop window, rejecting `end <= start`
    pub fn new(start: u64, end: u64) -> Result<Self> {
        if end > start {
            Ok(Self { start, end })
        } else {
            Err(SequencerError::InvalidLoopRange { start, end })
        }
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    /// Length of the window in ticks (always > 0)
    pub fn length(&self) -> u64 {
        self.end - self.start
    }
}

impl fmt::Display for LoopWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Musical time representation
/// Position shown as bars, beats and ticks (1-based bar and beat)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MusicalTime {
    pub bar: u64,
    pub beat: u8,
    pub tick: u16,
}

impl MusicalTime {
    /// Create from an absolute tick count, assuming four beats per bar
    pub fn from_ticks(total_ticks: u64) -> Self {
        let ticks_per_beat = TICKS_PER_QUARTER as u64;
        let ticks_per_bar = DISPLAY_BEATS_PER_BAR * ticks_per_beat;

        let bar = total_ticks / ticks_per_bar + 1;
        let remaining = total_ticks % ticks_per_bar;
        let beat = remaining / ticks_per_beat + 1;
        let tick = remaining % ticks_per_beat;

        Self {
            bar,
            beat: beat as u8,
            tick: tick as u16,
        }
    }

    /// Convert back to total ticks from start
    ///
    /// Bar and beat are 1-based; a 0 counts as the first.
    pub fn to_ticks(&self) -> u64 {
        let ticks_per_beat = TICKS_PER_QUARTER as u64;
        self.bar.saturating_sub(1) * DISPLAY_BEATS_PER_BAR * ticks_per_beat
            + (self.beat as u64).saturating_sub(1) * ticks_per_beat
            + self.tick as u64
    }
}

impl fmt::Display for MusicalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}:{:03}", self.bar, self.beat, self.tick)
    }
}

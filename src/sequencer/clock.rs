// Transport clock - Converts elapsed wall time into musical ticks
//
// The clock never looks at a real timer itself: callers hand it the elapsed
// time since playback (re)started, which keeps it deterministic under test.
// Each poll yields every integer tick that became due since the previous
// poll, so a late poll catches up instead of skipping ticks.

use crate::sequencer::timeline::{LoopWindow, Tempo, TICKS_PER_QUARTER};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::time::Duration;
use tracing::debug;

/// How wall time maps to ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClockMode {
    /// Tick rate follows the tempo: `bpm * PPQ / 60000` ticks per ms
    #[default]
    ElapsedTime,
    /// One tick per fixed interval, whatever the tempo (legacy mode)
    FixedStep { interval_ms: u64 },
}

/// Ticks that became due during one poll
///
/// Up to three parts, in playback order: the ticks up to the loop end, any
/// whole loop passes the poll spanned, and the ticks from the loop start up
/// to the new position.
#[derive(Debug, Clone, PartialEq)]
pub struct ClockAdvance {
    before_wrap: Range<u64>,
    /// One loop pass, `start..end` of the window (empty without a wrap)
    loop_pass: Range<u64>,
    full_passes: u64,
    after_wrap: Option<Range<u64>>,
    position: f64,
}

impl ClockAdvance {
    /// Due ticks in playback order
    pub fn ticks(&self) -> impl Iterator<Item = u64> + use<> {
        let pass = self.loop_pass.clone();
        self.before_wrap
            .clone()
            .chain((0..self.full_passes).flat_map(move |_| pass.clone()))
            .chain(self.after_wrap.clone().into_iter().flatten())
    }

    pub fn tick_count(&self) -> u64 {
        let after = self.after_wrap.as_ref().map_or(0, range_len);
        range_len(&self.before_wrap) + self.full_passes * range_len(&self.loop_pass) + after
    }

    pub fn is_empty(&self) -> bool {
        self.tick_count() == 0
    }

    /// Tick playback jumped back to, if the loop end was crossed
    pub fn wrapped_to(&self) -> Option<u64> {
        self.after_wrap.as_ref().map(|range| range.start)
    }

    /// Number of times the loop end was crossed
    pub fn wrap_count(&self) -> u64 {
        if self.after_wrap.is_some() {
            self.full_passes + 1
        } else {
            0
        }
    }

    /// Index into `ticks()` of the first tick after the first wrap
    pub fn wrap_offset(&self) -> Option<u64> {
        self.after_wrap
            .as_ref()
            .map(|_| range_len(&self.before_wrap))
    }

    /// Whether the tick at `index` in `ticks()` directly follows a wrap
    pub fn is_wrap_at(&self, index: u64) -> bool {
        let Some(first) = self.wrap_offset() else {
            return false;
        };
        let Some(since_first) = index.checked_sub(first) else {
            return false;
        };
        let pass = range_len(&self.loop_pass).max(1);
        since_first % pass == 0 && since_first / pass <= self.full_passes
    }

    /// Fractional transport position at the end of this poll
    pub fn position(&self) -> f64 {
        self.position
    }
}

fn range_len(range: &Range<u64>) -> u64 {
    range.end.saturating_sub(range.start)
}

/// Wall-time to tick converter with loop wraparound
#[derive(Debug, Clone)]
pub struct TransportClock {
    mode: ClockMode,
    tempo: Tempo,
    /// Elapsed reading the current segment is measured from
    origin_elapsed: Duration,
    /// Tick position at `origin_elapsed`
    origin_tick: f64,
    last_elapsed: Duration,
    position: f64,
    /// First integer tick not yet handed out
    next_tick: u64,
}

impl TransportClock {
    pub fn new(mode: ClockMode, tempo: Tempo) -> Self {
        Self {
            mode,
            tempo,
            origin_elapsed: Duration::ZERO,
            origin_tick: 0.0,
            last_elapsed: Duration::ZERO,
            position: 0.0,
            next_tick: 0,
        }
    }

    pub fn mode(&self) -> ClockMode {
        self.mode
    }

    /// Switch mode; the new rate applies from the last poll onwards
    pub fn set_mode(&mut self, mode: ClockMode) {
        self.rebase(self.last_elapsed);
        self.mode = mode;
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    /// Fractional tick position as of the last poll
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Next tick that will be handed out
    pub fn next_tick(&self) -> u64 {
        self.next_tick
    }

    /// Last tick handed out, if any
    pub fn last_processed(&self) -> Option<u64> {
        self.next_tick.checked_sub(1)
    }

    /// Current tick rate
    pub fn ticks_per_ms(&self) -> f64 {
        match self.mode {
            ClockMode::ElapsedTime => self.tempo.ticks_per_ms(),
            ClockMode::FixedStep { interval_ms } => 1.0 / interval_ms.max(1) as f64,
        }
    }

    /// Ticks covered by `elapsed` at the current rate
    ///
    /// Works in microseconds and divides last so that whole-tick durations
    /// come out as whole numbers.
    fn ticks_in(&self, elapsed: Duration) -> f64 {
        let micros = elapsed.as_micros() as f64;
        match self.mode {
            ClockMode::ElapsedTime => {
                micros * self.tempo.bpm() * TICKS_PER_QUARTER as f64 / 60_000_000.0
            }
            ClockMode::FixedStep { interval_ms } => {
                (micros / (interval_ms.max(1) as f64 * 1000.0)).floor()
            }
        }
    }

    fn rebase(&mut self, at: Duration) {
        self.origin_elapsed = at;
        self.origin_tick = self.position;
    }

    /// Restart wall-time measurement from `now`, keeping the position
    ///
    /// Called when the playback thread starts: its timer begins at zero again.
    pub fn resume(&mut self, now: Duration) {
        self.last_elapsed = now;
        self.rebase(now);
    }

    /// Jump back to tick 0 and restart measurement from `now`
    pub fn rewind(&mut self, now: Duration) {
        self.position = 0.0;
        self.next_tick = 0;
        self.last_elapsed = now;
        self.rebase(now);
    }

    /// Poll the clock at `now` (elapsed since the timer started)
    ///
    /// A tempo different from the previous poll takes effect from that poll
    /// onwards; ticks already handed out are never revisited.
    pub fn advance(
        &mut self,
        now: Duration,
        tempo: Tempo,
        loop_window: Option<LoopWindow>,
    ) -> ClockAdvance {
        let now = now.max(self.last_elapsed);

        if tempo != self.tempo {
            // Fixed-step ticks do not depend on tempo, so their grid stays put
            if self.mode == ClockMode::ElapsedTime {
                self.rebase(self.last_elapsed);
            }
            self.tempo = tempo;
        }
        self.last_elapsed = now;

        let ideal = self.origin_tick + self.ticks_in(now - self.origin_elapsed);

        if let Some(window) = loop_window {
            if ideal >= window.end() as f64 {
                return self.wrap(ideal, window);
            }
        }

        let due_end = ideal.floor() as u64 + 1;
        let before_wrap = self.next_tick..due_end.max(self.next_tick);
        self.next_tick = before_wrap.end;
        self.position = ideal;

        ClockAdvance {
            before_wrap,
            loop_pass: 0..0,
            full_passes: 0,
            after_wrap: None,
            position: ideal,
        }
    }

    /// Fold the position back into the loop window
    ///
    /// Whole loop lengths are taken out of the origin tick while the time
    /// origin stays where it is, so the position after the wrap is exact and
    /// a fixed-step grid keeps its phase however late the poll is.
    fn wrap(&mut self, ideal: f64, window: LoopWindow) -> ClockAdvance {
        let before_wrap = self.next_tick..window.end().max(self.next_tick);

        // Looping switched on past the loop end: jump back from here
        let crossed_at = self.position.max(window.end() as f64);
        let start = window.start() as f64;
        let length = window.length();
        let folded = |passes: u64| crossed_at - start + (passes * length) as f64;

        let mut full_passes = ((ideal - crossed_at) / length as f64).floor() as u64;
        if full_passes > 0 && ideal - folded(full_passes) < start {
            full_passes -= 1;
        }
        if full_passes > 0 {
            debug!(full_passes, loop_length = length, "Poll spanned whole loop passes");
        }

        let folded = folded(full_passes);
        let wrapped = ideal - folded;
        self.origin_tick -= folded;
        self.position = wrapped;

        let after_wrap = window.start()..wrapped.floor() as u64 + 1;
        self.next_tick = after_wrap.end;

        ClockAdvance {
            before_wrap,
            loop_pass: window.start()..window.end(),
            full_passes,
            after_wrap: Some(after_wrap),
            position: wrapped,
        }
    }
}

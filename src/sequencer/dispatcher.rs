// Playback dispatcher - Walks due ticks and forwards matching events
//
// Each cycle asks the transport clock which integer ticks fell due, then for
// every one of them, in order: publishes it as the current tick, gathers the
// events sitting on it, hands them to the sink and queues a position
// notification. The dedicated playback thread just repeats cycles until the
// transport's playing flag drops.

use crate::messaging::notification::Notification;
use crate::sequencer::clock::{ClockMode, TransportClock};
use crate::sequencer::context::SequencerContext;
use crate::sequencer::event::Event;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// Which loop model drives event matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DispatchMode {
    /// Match events against the transport tick; the transport-wide loop
    /// window applies
    #[default]
    TransportWindow,
    /// Every track walks its own cursor, wrapping on its own loop points
    PerTrack,
}

/// What one cycle did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Integer ticks advanced
    pub ticks: u64,
    /// Events forwarded to the sink
    pub events: usize,
    /// Events the sink rejected
    pub failures: usize,
}

pub struct PlaybackDispatcher {
    context: Arc<SequencerContext>,
    clock: TransportClock,
    mode: DispatchMode,
    due: Vec<Event>,
    pending: Vec<Notification>,
}

impl PlaybackDispatcher {
    pub fn new(context: Arc<SequencerContext>, clock_mode: ClockMode, mode: DispatchMode) -> Self {
        let tempo = context.transport().tempo();
        Self {
            context,
            clock: TransportClock::new(clock_mode, tempo),
            mode,
            due: Vec::new(),
            pending: Vec::new(),
        }
    }

    pub fn context(&self) -> &Arc<SequencerContext> {
        &self.context
    }

    pub fn clock(&self) -> &TransportClock {
        &self.clock
    }

    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: DispatchMode) {
        self.mode = mode;
    }

    pub fn set_clock_mode(&mut self, mode: ClockMode) {
        self.clock.set_mode(mode);
    }

    /// Restart wall-time measurement at `now` without moving the position
    pub fn resume(&mut self, now: Duration) {
        self.clock.resume(now);
    }

    /// Back to tick 0, including every per-track cursor
    pub fn rewind(&mut self, now: Duration) {
        self.clock.rewind(now);
        self.context.tracks().reset_local_ticks();
        self.context.transport().set_current_tick(0.0);
        debug!("Transport rewound");
    }

    /// Run one dispatch cycle at `now` (elapsed since the timer started)
    pub fn process_cycle(&mut self, now: Duration) -> CycleReport {
        let context = Arc::clone(&self.context);
        let transport = context.transport();
        if transport.take_rewind_request() {
            self.rewind(now);
        }

        let advance = self.clock.advance(now, transport.tempo(), transport.active_loop());
        let mut report = CycleReport::default();
        if advance.is_empty() {
            return report;
        }

        for (index, tick) in advance.ticks().enumerate() {
            // One notification per crossing, even when a late poll spans passes
            if advance.is_wrap_at(index as u64) {
                debug!(to_tick = tick, "Loop wrapped");
                self.pending.push(Notification::LoopWrapped { to_tick: tick });
            }

            transport.set_current_tick(tick as f64);

            self.due.clear();
            match self.mode {
                DispatchMode::TransportWindow => context.tracks().collect_at(tick, &mut self.due),
                DispatchMode::PerTrack => context.tracks().collect_per_track_step(&mut self.due),
            }

            if !self.due.is_empty() {
                trace!(tick, count = self.due.len(), "Dispatching events");
                report.failures += context.deliver(&self.due, &mut self.pending);
                report.events += self.due.len();
            }

            self.pending.push(Notification::PositionChanged { tick: tick as f64 });
            report.ticks += 1;
        }

        context.notify_all(self.pending.drain(..));
        report
    }
}

/// Drops the playing flag when the playback thread exits, panics included
struct PlayingGuard(Arc<SequencerContext>);

impl Drop for PlayingGuard {
    fn drop(&mut self) {
        if thread::panicking() {
            warn!("Playback thread panicked, transport stopped");
        }
        self.0.transport().swap_playing(false);
    }
}

/// Spawn the playback thread
///
/// The thread runs cycles until the transport stops playing, then hands the
/// dispatcher back through the join handle so the next start resumes from
/// the same position. Stop is observed at the top of each cycle, so joining
/// takes at most one poll interval plus one cycle.
pub(crate) fn spawn_playback(
    mut dispatcher: PlaybackDispatcher,
    poll_interval: Duration,
) -> std::io::Result<JoinHandle<PlaybackDispatcher>> {
    thread::Builder::new()
        .name("sequencer-playback".to_string())
        .spawn(move || {
            let _guard = PlayingGuard(Arc::clone(dispatcher.context()));
            let timer = Instant::now();
            dispatcher.resume(Duration::ZERO);
            debug!(?poll_interval, mode = ?dispatcher.mode(), "Playback thread started");

            while dispatcher.context().transport().is_playing() {
                dispatcher.process_cycle(timer.elapsed());
                thread::sleep(poll_interval);
            }

            debug!(
                tick = dispatcher.context().transport().current_tick(),
                "Playback thread stopped"
            );
            dispatcher
        })
}

// Transport - Playback state shared between threads
// Written by the playback thread (tick advance) and the facade (controls),
// read by the recorder (timestamps) and the front-end (position display)

use super::timeline::{LoopWindow, Tempo};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// f64 stored as bits in an AtomicU64
#[derive(Debug)]
struct AtomicF64 {
    inner: AtomicU64,
}

impl AtomicF64 {
    fn new(value: f64) -> Self {
        Self {
            inner: AtomicU64::new(value.to_bits()),
        }
    }

    fn get(&self) -> f64 {
        f64::from_bits(self.inner.load(Ordering::Acquire))
    }

    fn set(&self, value: f64) {
        self.inner.store(value.to_bits(), Ordering::Release);
    }
}

/// Shared transport state
/// Thread-safe via atomics; the loop window sits behind a short-held lock so
/// start and end are always read as a pair
#[derive(Debug)]
pub struct SharedTransportState {
    playing: AtomicBool,
    recording: AtomicBool,
    rewind_requested: AtomicBool,
    current_tick: AtomicF64,
    tempo_bpm: AtomicF64,
    loop_enabled: AtomicBool,
    loop_window: Mutex<Option<LoopWindow>>,
}

impl SharedTransportState {
    pub fn new(tempo: Tempo) -> Self {
        Self {
            playing: AtomicBool::new(false),
            recording: AtomicBool::new(false),
            rewind_requested: AtomicBool::new(false),
            current_tick: AtomicF64::new(0.0),
            tempo_bpm: AtomicF64::new(tempo.bpm()),
            loop_enabled: AtomicBool::new(false),
            loop_window: Mutex::new(None),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    /// Set the playing flag, returning the previous value
    pub(crate) fn swap_playing(&self, playing: bool) -> bool {
        self.playing.swap(playing, Ordering::AcqRel)
    }

    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::Acquire)
    }

    pub(crate) fn set_recording(&self, recording: bool) {
        self.recording.store(recording, Ordering::Release);
    }

    /// Current tick (last tick processed by the dispatcher)
    pub fn current_tick(&self) -> f64 {
        self.current_tick.get()
    }

    pub(crate) fn set_current_tick(&self, tick: f64) {
        self.current_tick.set(tick);
    }

    pub fn tempo(&self) -> Tempo {
        // Only validated tempos are ever stored
        Tempo::new(self.tempo_bpm.get()).unwrap_or_default()
    }

    pub(crate) fn set_tempo(&self, tempo: Tempo) {
        self.tempo_bpm.set(tempo.bpm());
    }

    pub fn is_looping(&self) -> bool {
        self.loop_enabled.load(Ordering::Acquire)
    }

    pub(crate) fn set_looping(&self, enabled: bool) {
        self.loop_enabled.store(enabled, Ordering::Release);
    }

    /// Configured loop window, whether or not looping is enabled
    pub fn loop_window(&self) -> Option<LoopWindow> {
        *self
            .loop_window
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set_loop_window(&self, window: LoopWindow) {
        *self
            .loop_window
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(window);
    }

    /// Loop window the playback thread should wrap within right now
    pub fn active_loop(&self) -> Option<LoopWindow> {
        if self.is_looping() {
            self.loop_window()
        } else {
            None
        }
    }

    pub(crate) fn request_rewind(&self) {
        self.rewind_requested.store(true, Ordering::Release);
    }

    /// Consume a pending rewind request
    pub(crate) fn take_rewind_request(&self) -> bool {
        self.rewind_requested.swap(false, Ordering::AcqRel)
    }
}

impl Default for SharedTransportState {
    fn default() -> Self {
        Self::new(Tempo::default())
    }
}

// Track - Named, insertion-ordered collection of sequenced events
// Also carries the legacy per-track loop cursor used by PerTrack dispatch

use crate::error::Result;
use crate::sequencer::event::Event;
use crate::sequencer::timeline::LoopWindow;

/// A sequencer track
///
/// Events are kept in insertion order, not tick order: recording appends at
/// whatever tick the transport is on, so consumers must scan rather than
/// binary-search.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    name: String,
    events: Vec<Event>,
    loop_window: Option<LoopWindow>,
    local_tick: f64,
}

impl Track {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            events: Vec::new(),
            loop_window: None,
            local_tick: 0.0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// All events, in insertion order
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn add_event(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Events falling exactly on `tick`, in insertion order
    pub fn events_at(&self, tick: u64) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(move |event| event.is_at(tick))
    }

    /// Per-track loop window (PerTrack dispatch mode only)
    pub fn loop_window(&self) -> Option<LoopWindow> {
        self.loop_window
    }

    pub fn is_looping(&self) -> bool {
        self.loop_window.is_some()
    }

    /// Set per-track loop points and enable looping for this track
    pub fn set_loop_points(&mut self, start: u64, end: u64) -> Result<()> {
        self.loop_window = Some(LoopWindow::new(start, end)?);
        Ok(())
    }

    pub fn clear_loop(&mut self) {
        self.loop_window = None;
    }

    /// Current position of this track's own cursor
    pub fn local_tick(&self) -> f64 {
        self.local_tick
    }

    pub(crate) fn reset_local_tick(&mut self) {
        self.local_tick = 0.0;
    }

    /// Step the per-track cursor by one tick
    ///
    /// Returns the tick this track is on for the current step. The cursor
    /// wraps to the loop start once it reaches the loop end.
    pub(crate) fn step_local_tick(&mut self) -> u64 {
        if let Some(window) = self.loop_window {
            if self.local_tick >= window.end() as f64 {
                self.local_tick = window.start() as f64;
            }
        }

        let tick = self.local_tick as u64;
        self.local_tick += 1.0;
        tick
    }
}

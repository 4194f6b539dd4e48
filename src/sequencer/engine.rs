// Sequencer - Public facade over tracks, transport, playback and recording
//
// Owns the playback thread. While stopped the dispatcher is parked here;
// while playing it lives on the thread and comes back through the join
// handle, so a restart resumes where playback stopped.

use crate::config::SequencerConfig;
use crate::error::{ConfigError, Result, SequencerError};
use crate::messaging::channels::{NotificationConsumer, create_notification_channel};
use crate::messaging::notification::Notification;
use crate::sequencer::clock::ClockMode;
use crate::sequencer::context::SequencerContext;
use crate::sequencer::dispatcher::{DispatchMode, PlaybackDispatcher, spawn_playback};
use crate::sequencer::event::Event;
use crate::sequencer::recorder::RecordingIngest;
use crate::sequencer::sink::ClockSink;
use crate::sequencer::timeline::{LoopWindow, MusicalTime, Tempo};
use crate::sequencer::track::Track;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct Sequencer {
    context: Arc<SequencerContext>,
    /// Parked dispatcher, `None` while the playback thread owns it
    dispatcher: Option<PlaybackDispatcher>,
    playback_thread: Option<JoinHandle<PlaybackDispatcher>>,
    clock_mode: ClockMode,
    dispatch_mode: DispatchMode,
    poll_interval: Duration,
    notifications: Option<NotificationConsumer>,
}

impl Sequencer {
    /// Build a stopped sequencer with no tracks from a validated config
    pub fn new(config: &SequencerConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let mut sequencer = Self::build(config, config.tempo()?);
        if let Some(window) = config.loop_window()? {
            sequencer.context.transport().set_loop_window(window);
        }
        sequencer.set_looping(config.looping);
        Ok(sequencer)
    }

    fn build(config: &SequencerConfig, tempo: Tempo) -> Self {
        let (tx, rx) = create_notification_channel(config.notification_capacity);
        let context = Arc::new(SequencerContext::new(tempo, Some(tx)));
        let dispatcher =
            PlaybackDispatcher::new(context.clone(), config.clock_mode, config.dispatch_mode);

        Self {
            context,
            dispatcher: Some(dispatcher),
            playback_thread: None,
            clock_mode: config.clock_mode,
            dispatch_mode: config.dispatch_mode,
            poll_interval: config.poll_interval(),
            notifications: Some(rx),
        }
    }

    /// Shared state, for wiring device ports or driving cycles by hand
    pub fn context(&self) -> &Arc<SequencerContext> {
        &self.context
    }

    // Track management

    pub fn add_track(&self, name: impl Into<String>) -> usize {
        let name = name.into();
        let index = self.context.tracks().add_track(name.clone());
        info!(index, %name, "Track added");
        index
    }

    /// Remove a track; later tracks shift down by one index
    pub fn remove_track(&self, index: usize) -> Result<Track> {
        self.context.tracks().remove_track(index)
    }

    pub fn rename_track(&self, index: usize, name: impl Into<String>) -> Result<()> {
        self.context.tracks().rename_track(index, name)
    }

    /// Select the track recording appends to
    pub fn select_track(&self, index: usize) -> Result<()> {
        self.context.tracks().select_track(index)?;
        debug!(index, "Track selected");
        Ok(())
    }

    pub fn clear_selection(&self) {
        self.context.tracks().clear_selection();
    }

    pub fn selected_track(&self) -> Option<usize> {
        self.context.tracks().selected()
    }

    pub fn track_count(&self) -> usize {
        self.context.tracks().track_count()
    }

    /// Snapshot of one track
    pub fn track(&self, index: usize) -> Result<Track> {
        self.context.tracks().track(index)
    }

    /// Track names in index order
    pub fn tracks(&self) -> Vec<String> {
        self.context.tracks().track_names()
    }

    pub fn append_event(&self, index: usize, event: Event) -> Result<()> {
        self.context.tracks().append_event(index, event)
    }

    /// Per-track loop, used by [`DispatchMode::PerTrack`]
    pub fn set_track_loop(&self, index: usize, start: u64, end: u64) -> Result<()> {
        self.context.tracks().set_track_loop(index, start, end)
    }

    pub fn clear_track_loop(&self, index: usize) -> Result<()> {
        self.context.tracks().clear_track_loop(index)
    }

    // Transport

    /// Change the tempo; ticks already played keep their timing
    pub fn set_tempo(&self, bpm: f64) -> Result<()> {
        let tempo = Tempo::new(bpm)?;
        self.context.transport().set_tempo(tempo);
        self.context.notify(Notification::TempoChanged { bpm: tempo.bpm() });
        info!(%tempo, "Tempo changed");
        Ok(())
    }

    pub fn tempo(&self) -> Tempo {
        self.context.transport().tempo()
    }

    /// Set the transport-wide loop window; looping itself is toggled
    /// separately
    pub fn set_loop(&self, start: u64, end: u64) -> Result<()> {
        let window = LoopWindow::new(start, end)?;
        self.context.transport().set_loop_window(window);
        debug!(%window, "Loop window set");
        Ok(())
    }

    pub fn set_looping(&self, enabled: bool) {
        self.context.transport().set_looping(enabled);
    }

    pub fn loop_window(&self) -> Option<LoopWindow> {
        self.context.transport().loop_window()
    }

    pub fn is_looping(&self) -> bool {
        self.context.transport().is_looping()
    }

    /// Start playback from the current position; no-op if already playing
    pub fn start(&mut self) -> Result<()> {
        // The playback thread ended on its own (sink panic): reap it first
        if self.playback_thread.is_some() && !self.is_playing() {
            self.stop();
        }
        if self.context.transport().swap_playing(true) {
            return Ok(());
        }

        let mut dispatcher = self.dispatcher.take().unwrap_or_else(|| self.new_dispatcher());
        dispatcher.set_mode(self.dispatch_mode);
        dispatcher.set_clock_mode(self.clock_mode);

        match spawn_playback(dispatcher, self.poll_interval) {
            Ok(handle) => {
                self.playback_thread = Some(handle);
                info!(tick = self.current_tick(), "Playback started");
                Ok(())
            }
            Err(e) => {
                self.context.transport().swap_playing(false);
                warn!(error = %e, "Could not start playback thread");
                Err(SequencerError::PlaybackThread(e.to_string()))
            }
        }
    }

    /// Stop playback and wait for the playback thread to finish its cycle;
    /// no-op if already stopped
    pub fn stop(&mut self) {
        self.context.transport().swap_playing(false);

        let Some(handle) = self.playback_thread.take() else {
            return;
        };
        match handle.join() {
            Ok(dispatcher) => self.dispatcher = Some(dispatcher),
            Err(_) => {
                warn!("Playback thread panicked, position restarts from 0");
                self.context.transport().request_rewind();
            }
        }
        // A rewind the thread exited before seeing
        if self.context.transport().take_rewind_request() {
            self.rewind_parked();
        }
        info!(tick = self.current_tick(), "Playback stopped");
    }

    /// Return to tick 0
    ///
    /// While playing, the playback thread rewinds at the top of its next
    /// cycle.
    pub fn rewind(&mut self) {
        if self.playback_thread.is_some() {
            self.context.transport().request_rewind();
            return;
        }

        self.rewind_parked();
    }

    fn rewind_parked(&mut self) {
        let dispatcher = self.dispatcher.get_or_insert_with(|| {
            PlaybackDispatcher::new(self.context.clone(), self.clock_mode, self.dispatch_mode)
        });
        dispatcher.rewind(Duration::ZERO);
    }

    pub fn is_playing(&self) -> bool {
        self.context.transport().is_playing()
    }

    pub fn current_tick(&self) -> f64 {
        self.context.transport().current_tick()
    }

    /// Current position as bar:beat:tick
    pub fn musical_position(&self) -> MusicalTime {
        MusicalTime::from_ticks(self.current_tick() as u64)
    }

    /// Matching model for the next start
    pub fn set_dispatch_mode(&mut self, mode: DispatchMode) {
        self.dispatch_mode = mode;
    }

    pub fn dispatch_mode(&self) -> DispatchMode {
        self.dispatch_mode
    }

    /// Clock model for the next start
    pub fn set_clock_mode(&mut self, mode: ClockMode) {
        self.clock_mode = mode;
    }

    pub fn clock_mode(&self) -> ClockMode {
        self.clock_mode
    }

    fn new_dispatcher(&self) -> PlaybackDispatcher {
        PlaybackDispatcher::new(self.context.clone(), self.clock_mode, self.dispatch_mode)
    }

    // Output

    /// Route due events to `sink`, replacing any previous one
    pub fn set_output_sink(&self, sink: impl ClockSink + 'static) {
        self.context.set_sink(Box::new(sink));
    }

    pub fn clear_output_sink(&self) {
        self.context.clear_sink();
    }

    /// Events the output sink has rejected so far
    pub fn sink_failures(&self) -> u64 {
        self.context.sink_failures()
    }

    // Recording

    pub fn is_recording(&self) -> bool {
        self.context.transport().is_recording()
    }

    pub fn start_recording(&self) {
        self.context.transport().set_recording(true);
        info!(track = ?self.selected_track(), "Recording armed");
    }

    pub fn stop_recording(&self) {
        self.context.transport().set_recording(false);
        info!("Recording stopped");
    }

    /// Handle for device input callbacks
    pub fn recording_ingest(&self) -> RecordingIngest {
        RecordingIngest::new(self.context.clone())
    }

    /// Consumer end of the notification channel; only the first call gets it
    pub fn take_notifications(&mut self) -> Option<NotificationConsumer> {
        self.notifications.take()
    }
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::build(&SequencerConfig::default(), Tempo::default())
    }
}

impl Drop for Sequencer {
    fn drop(&mut self) {
        self.stop();
    }
}

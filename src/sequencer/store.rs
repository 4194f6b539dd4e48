// Track store - Track list and selected-track index behind one lock
//
// The playback thread scans under the read lock while the recording callback
// appends under the write lock, so a scan never sees a half-pushed event and
// a structural change never lands in the middle of a scan. The selection lives
// under the same lock so removing a track and fixing up the selection is one
// step from the recorder's point of view.

use crate::error::{Result, SequencerError};
use crate::sequencer::event::Event;
use crate::sequencer::track::Track;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

#[derive(Debug, Default)]
struct TrackList {
    tracks: Vec<Track>,
    selected: Option<usize>,
}

impl TrackList {
    fn check(&self, index: usize) -> Result<()> {
        if index < self.tracks.len() {
            Ok(())
        } else {
            Err(SequencerError::InvalidTrackIndex(index))
        }
    }
}

/// Thread-safe track collection shared by playback and recording
#[derive(Debug, Default)]
pub struct TrackStore {
    inner: RwLock<TrackList>,
}

impl TrackStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, TrackList> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TrackList> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a new empty track, returning its index
    pub fn add_track(&self, name: impl Into<String>) -> usize {
        let mut list = self.write();
        list.tracks.push(Track::new(name));
        list.tracks.len() - 1
    }

    /// Remove a track, shifting later indices down by one
    ///
    /// The selection follows its track: it is cleared if the selected track
    /// is removed and decremented if an earlier track is removed.
    pub fn remove_track(&self, index: usize) -> Result<Track> {
        let mut list = self.write();
        list.check(index)?;

        let removed = list.tracks.remove(index);
        list.selected = match list.selected {
            Some(selected) if selected == index => None,
            Some(selected) if selected > index => Some(selected - 1),
            other => other,
        };

        debug!(index, name = removed.name(), selected = ?list.selected, "Track removed");
        Ok(removed)
    }

    pub fn rename_track(&self, index: usize, name: impl Into<String>) -> Result<()> {
        let mut list = self.write();
        list.check(index)?;
        list.tracks[index].set_name(name);
        Ok(())
    }

    /// Snapshot of a track
    pub fn track(&self, index: usize) -> Result<Track> {
        let list = self.read();
        list.tracks
            .get(index)
            .cloned()
            .ok_or(SequencerError::InvalidTrackIndex(index))
    }

    pub fn track_count(&self) -> usize {
        self.read().tracks.len()
    }

    pub fn track_names(&self) -> Vec<String> {
        self.read()
            .tracks
            .iter()
            .map(|track| track.name().to_string())
            .collect()
    }

    pub fn append_event(&self, index: usize, event: Event) -> Result<()> {
        let mut list = self.write();
        list.check(index)?;
        list.tracks[index].add_event(event);
        Ok(())
    }

    /// Append to the selected track, if any
    ///
    /// The event is built inside the lock so its timestamp is taken after
    /// any competing structural change has settled. Returns the index that
    /// received it.
    pub fn append_to_selected(&self, make_event: impl FnOnce() -> Event) -> Option<usize> {
        let mut list = self.write();
        let index = list.selected?;
        let event = make_event();
        list.tracks[index].add_event(event);
        Some(index)
    }

    pub fn select_track(&self, index: usize) -> Result<()> {
        let mut list = self.write();
        list.check(index)?;
        list.selected = Some(index);
        Ok(())
    }

    pub fn clear_selection(&self) {
        self.write().selected = None;
    }

    pub fn selected(&self) -> Option<usize> {
        self.read().selected
    }

    pub fn set_track_loop(&self, index: usize, start: u64, end: u64) -> Result<()> {
        let mut list = self.write();
        list.check(index)?;
        list.tracks[index].set_loop_points(start, end)
    }

    pub fn clear_track_loop(&self, index: usize) -> Result<()> {
        let mut list = self.write();
        list.check(index)?;
        list.tracks[index].clear_loop();
        Ok(())
    }

    /// Run `f` over the tracks under the read lock
    pub(crate) fn with_tracks<R>(&self, f: impl FnOnce(&[Track]) -> R) -> R {
        f(&self.read().tracks)
    }

    /// Run `f` over the tracks under the write lock
    pub(crate) fn with_tracks_mut<R>(&self, f: impl FnOnce(&mut [Track]) -> R) -> R {
        f(&mut self.write().tracks)
    }

    /// Collect every event at `tick`, in track order then insertion order
    pub(crate) fn collect_at(&self, tick: u64, out: &mut Vec<Event>) {
        self.with_tracks(|tracks| {
            for track in tracks {
                out.extend(track.events_at(tick).copied());
            }
        });
    }

    /// Step every per-track cursor once and collect the events it lands on
    pub(crate) fn collect_per_track_step(&self, out: &mut Vec<Event>) {
        self.with_tracks_mut(|tracks| {
            for track in tracks.iter_mut() {
                let local = track.step_local_tick();
                out.extend(track.events_at(local).copied());
            }
        });
    }

    pub(crate) fn reset_local_ticks(&self) {
        self.with_tracks_mut(|tracks| tracks.iter_mut().for_each(Track::reset_local_tick));
    }
}

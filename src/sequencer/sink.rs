// Clock sink - Where the playback thread delivers due events

use crate::error::Result;
use crate::sequencer::event::Event;

/// Consumer of events that fall due during playback
///
/// Called on the playback thread, once per due event per tick. An error is
/// reported and counted but never stops playback, so implementations should
/// return quickly and never block on I/O for long.
pub trait ClockSink: Send {
    fn emit(&mut self, event: &Event) -> Result<()>;
}

impl<F> ClockSink for F
where
    F: FnMut(&Event) -> Result<()> + Send,
{
    fn emit(&mut self, event: &Event) -> Result<()> {
        self(event)
    }
}

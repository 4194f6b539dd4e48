// Sequencer module
// Track model, transport clock, playback dispatch and recording

pub mod clock;
pub mod context;
pub mod dispatcher;
pub mod engine;
pub mod event;
pub mod recorder;
pub mod sink;
pub mod store;
pub mod timeline;
pub mod track;
pub mod transport;

pub use clock::{ClockAdvance, ClockMode, TransportClock};
pub use context::SequencerContext;
pub use dispatcher::{CycleReport, DispatchMode, PlaybackDispatcher};
pub use engine::Sequencer;
pub use event::{Event, EventKind};
pub use recorder::RecordingIngest;
pub use sink::ClockSink;
pub use store::TrackStore;
pub use timeline::{LoopWindow, MusicalTime, TICKS_PER_QUARTER, Tempo};
pub use track::Track;
pub use transport::SharedTransportState;

// MyMusic Sequencer - Library exports for the binary, tests and benchmarks

pub mod config;
pub mod error;
pub mod messaging;
pub mod midi;
pub mod sequencer;

// Re-export commonly used types for convenience
pub use config::{MidiPortConfig, SequencerConfig};
pub use error::{ConfigError, Result, SequencerError};
pub use messaging::channels::create_notification_channel;
pub use messaging::notification::{ErrorCategory, ErrorReport, Notification};
pub use midi::{DevicePort, DevicePortSink, MidiDeviceManager, MidiMessage};
pub use sequencer::{
    ClockMode, ClockSink, DispatchMode, Event, EventKind, LoopWindow, MusicalTime,
    PlaybackDispatcher, RecordingIngest, Sequencer, SequencerContext, TICKS_PER_QUARTER, Tempo,
    Track,
};

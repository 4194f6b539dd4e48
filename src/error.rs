// Error types for the sequencer core
//
// Nothing in here is fatal: every variant is either a rejected operation
// (state left untouched) or a skipped item (playback or ingest continues).

/// Errors reported by the sequencer core
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SequencerError {
    #[error("Invalid track index: {0}")]
    InvalidTrackIndex(usize),

    #[error("Invalid tempo: {0} BPM (must be > 0)")]
    InvalidTempo(f64),

    #[error("Invalid loop range: end {end} must be after start {start}")]
    InvalidLoopRange { start: u64, end: u64 },

    #[error("Sink delivery failed: {0}")]
    SinkDeliveryFailure(String),

    #[error("Malformed MIDI message: {0}")]
    MalformedMessage(String),

    #[error("MIDI device error: {0}")]
    Device(String),

    #[error("Failed to spawn playback thread: {0}")]
    PlaybackThread(String),
}

/// Result type for sequencer operations
pub type Result<T> = std::result::Result<T, SequencerError>;

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("RON serialization error: {0}")]
    RonWrite(#[from] ron::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// Configuration - Sequencer session settings loaded from RON

use crate::error::ConfigError;
use crate::sequencer::clock::ClockMode;
use crate::sequencer::dispatcher::DispatchMode;
use crate::sequencer::timeline::{LoopWindow, Tempo};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Which MIDI ports the demo binary opens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiPortConfig {
    pub client_name: String,
    /// Input port name; `None` picks the first available
    pub input_port: Option<String>,
    /// Output port name; `None` picks the first available
    pub output_port: Option<String>,
}

impl Default for MidiPortConfig {
    fn default() -> Self {
        Self {
            client_name: "MyMusic Sequencer".to_string(),
            input_port: None,
            output_port: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    pub tempo_bpm: f64,
    /// Sleep between playback cycles
    pub poll_interval_us: u64,
    pub clock_mode: ClockMode,
    pub dispatch_mode: DispatchMode,
    /// Transport-wide loop as (start, end) ticks
    pub loop_window: Option<(u64, u64)>,
    pub looping: bool,
    pub notification_capacity: usize,
    /// tracing filter level for the binary
    pub log_level: String,
    pub midi: MidiPortConfig,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            tempo_bpm: 120.0,
            poll_interval_us: 500,
            clock_mode: ClockMode::default(),
            dispatch_mode: DispatchMode::default(),
            loop_window: None,
            looping: false,
            notification_capacity: 4096,
            log_level: "info".to_string(),
            midi: MidiPortConfig::default(),
        }
    }
}

impl SequencerConfig {
    /// Load and validate a RON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    pub fn from_ron_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_ron_string()?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tempo()?;
        self.loop_window()?;
        self.log_level()?;

        if self.poll_interval_us == 0 {
            return Err(ConfigError::Invalid("poll_interval_us must be > 0".into()));
        }
        if let ClockMode::FixedStep { interval_ms: 0 } = self.clock_mode {
            return Err(ConfigError::Invalid(
                "fixed-step interval_ms must be > 0".into(),
            ));
        }
        if self.notification_capacity == 0 {
            return Err(ConfigError::Invalid(
                "notification_capacity must be > 0".into(),
            ));
        }
        Ok(())
    }

    pub fn tempo(&self) -> Result<Tempo, ConfigError> {
        Tempo::new(self.tempo_bpm).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn loop_window(&self) -> Result<Option<LoopWindow>, ConfigError> {
        self.loop_window
            .map(|(start, end)| LoopWindow::new(start, end))
            .transpose()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn log_level(&self) -> Result<tracing::Level, ConfigError> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("unknown log level '{}'", self.log_level)))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_micros(self.poll_interval_us)
    }
}

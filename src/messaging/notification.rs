// Notifications - Sequencer → front-end
// Position and tempo updates plus non-fatal error reports

use std::time::{SystemTime, UNIX_EPOCH};

/// Where a reported error came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Playback,
    Recording,
}

/// Non-fatal error report with a wall-clock timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorReport {
    pub category: ErrorCategory,
    pub message: String,
    pub timestamp: u64, // Unix timestamp in milliseconds
}

impl ErrorReport {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            timestamp: now_millis(),
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Message pushed to the notification channel
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// One per integer tick advanced by the playback thread
    PositionChanged { tick: f64 },
    TempoChanged { bpm: f64 },
    /// Playback crossed the loop end and jumped back
    LoopWrapped { to_tick: u64 },
    Error(ErrorReport),
}

impl Notification {
    pub fn error(category: ErrorCategory, message: impl Into<String>) -> Self {
        Notification::Error(ErrorReport::new(category, message))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notification::Error(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_report_creation() {
        let report = ErrorReport::new(ErrorCategory::Playback, "port closed");
        assert_eq!(report.category, ErrorCategory::Playback);
        assert_eq!(report.message, "port closed");
        assert!(report.timestamp > 0);
    }

    #[test]
    fn test_notification_helpers() {
        let error = Notification::error(ErrorCategory::Recording, "bad status");
        assert!(error.is_error());
        assert!(!Notification::PositionChanged { tick: 1.0 }.is_error());
        assert!(!Notification::TempoChanged { bpm: 90.0 }.is_error());
    }
}

// Messaging - Notification channel from the sequencer to its front-end

pub mod channels;
pub mod notification;

pub use channels::{NotificationConsumer, NotificationProducer, create_notification_channel};
pub use notification::{ErrorCategory, ErrorReport, Notification};
